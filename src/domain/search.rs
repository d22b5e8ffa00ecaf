use std::sync::Arc;

use futures_util::future::try_join;
use serde::Serialize;

use crate::metrics::Metrics;
use crate::store::OpContext;

use super::errors::DomainResult;
use super::fixture::{Fixture, FixtureStore};
use super::team::{Team, TeamStore};

// ============================================================================
// Search Aggregator - One query against teams and fixtures at once
// ============================================================================
//
// The two searches run concurrently. A miss on either side is an empty
// list; a real failure on either side fails the whole search. Each list
// keeps its own relevance order.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub teams: Vec<Team>,
    pub fixtures: Vec<Fixture>,
}

#[derive(Clone)]
pub struct SearchAggregator {
    teams: Arc<TeamStore>,
    fixtures: Arc<FixtureStore>,
    metrics: Option<Arc<Metrics>>,
}

impl SearchAggregator {
    pub fn new(teams: Arc<TeamStore>, fixtures: Arc<FixtureStore>) -> Self {
        Self {
            teams,
            fixtures,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn search(&self, ctx: &OpContext, query: &str) -> DomainResult<SearchResults> {
        let (teams, fixtures) = try_join(
            self.teams.search(ctx, query),
            self.fixtures.search(ctx, query),
        )
        .await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_search(teams.len(), fixtures.len());
        }
        tracing::info!(
            query = %query,
            teams = teams.len(),
            fixtures = fixtures.len(),
            "🔎 Search completed"
        );

        Ok(SearchResults {
            query: query.to_string(),
            teams,
            fixtures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::fixture::NewFixture;
    use crate::domain::schema::epl_schema;
    use crate::domain::team::NewTeam;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    async fn seeded() -> (SearchAggregator, Vec<Team>) {
        let store = Arc::new(MemoryStore::new(epl_schema()));
        let teams = Arc::new(TeamStore::new(store.clone()));
        let fixtures = Arc::new(FixtureStore::new(store, teams.clone()));
        let ctx = OpContext::background();

        let mut created = Vec::new();
        for team in [
            NewTeam::new("Manchester United", "Man Utd").abbr("MUN").city("Manchester"),
            NewTeam::new("Manchester City", "Man City").abbr("MCI").city("Manchester"),
            NewTeam::new("Liverpool", "LIV").abbr("LIV").city("Liverpool"),
        ] {
            created.push(teams.create(&ctx, team).await.unwrap());
        }

        fixtures
            .create(
                &ctx,
                NewFixture::new(&created[0].id, &created[2].id, Utc::now() + Duration::days(1)),
            )
            .await
            .unwrap();

        (SearchAggregator::new(teams, fixtures), created)
    }

    #[tokio::test]
    async fn test_search_finds_team_and_its_fixture() {
        let (search, teams) = seeded().await;

        let results = search
            .search(&OpContext::background(), "manchester united")
            .await
            .unwrap();

        assert_eq!(results.query, "manchester united");
        assert_eq!(results.teams[0].id, teams[0].id);
        assert_eq!(results.fixtures.len(), 1);
        assert_eq!(results.fixtures[0].home_team.id, teams[0].id);
    }

    #[tokio::test]
    async fn test_miss_on_one_side_is_empty_list() {
        let (search, _) = seeded().await;

        let results = search
            .search(&OpContext::background(), "arsenal")
            .await
            .unwrap();

        assert!(results.teams.is_empty());
        assert!(results.fixtures.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_fails_whole_search() {
        let (search, _) = seeded().await;
        let (ctx, handle) = OpContext::background().cancellable();
        handle.cancel();

        let result = search.search(&ctx, "liverpool").await;

        assert!(matches!(result, Err(DomainError::Cancelled)));
    }

    #[test]
    fn test_results_serialize_with_fixture_key() {
        let results = SearchResults {
            query: "q".to_string(),
            teams: Vec::new(),
            fixtures: Vec::new(),
        };
        let json = serde_json::to_value(results).unwrap();

        assert!(json.get("fixtures").is_some());
        assert!(json.get("teams").is_some());
    }
}
