use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::errors::{DomainError, DomainResult, ValidationError};
use crate::domain::lookup::Lookup;
use crate::domain::schema::FIXTURES_COLLECTION;
use crate::domain::team::{Team, TeamLookup};
use crate::metrics::Metrics;
use crate::store::core::new_id;
use crate::store::{decode, encode, DocumentStore, Filter, OpContext, Pipeline, StoreError};

use super::model::{Fixture, FixtureRecord, FixtureStatus, FixtureUpdate, NewFixture};
use super::queries::{
    find_fixture_query, list_fixtures_by_status_query, list_fixtures_query, text_search_query,
};

// ============================================================================
// Fixture Store
// ============================================================================
//
// Writes resolve both team references through TeamLookup and capture the
// teams' current names next to their IDs. Reads always go through an
// aggregation that re-joins the live team documents, so an update also
// refreshes the name copy of a side it leaves unchanged.
//
// Same-team validation differs between the two writes:
// - create rejects home == away unconditionally
// - update only compares the two IDs when the request carries both
//
// ============================================================================

#[derive(Clone)]
pub struct FixtureStore {
    store: Arc<dyn DocumentStore>,
    teams: Arc<dyn TeamLookup>,
    metrics: Option<Arc<Metrics>>,
}

impl FixtureStore {
    pub fn new(store: Arc<dyn DocumentStore>, teams: Arc<dyn TeamLookup>) -> Self {
        Self {
            store,
            teams,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn reject(&self, operation: &str, err: ValidationError) -> DomainError {
        if let Some(metrics) = &self.metrics {
            metrics.record_validation_failure(operation);
        }
        tracing::debug!(
            operation,
            message = %err.message,
            details = err.details.len(),
            "Fixture request rejected"
        );
        DomainError::Validation(err)
    }

    fn record_mutation(&self, action: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_mutation("fixture", action);
        }
    }

    pub async fn create(&self, ctx: &OpContext, request: NewFixture) -> DomainResult<Fixture> {
        if request.home_team == request.away_team {
            return Err(self.reject("create_fixture", ValidationError::same_team()));
        }

        // Both sides are resolved before deciding, so one rejection can
        // report every unknown team
        let home = self.teams.by_id(ctx, &request.home_team).await?;
        let away = self.teams.by_id(ctx, &request.away_team).await?;

        let (home_team, away_team) = match (home, away) {
            (Lookup::Found(home), Lookup::Found(away)) => (home, away),
            (home, away) => {
                let mut rejection = ValidationError::fixture_request();
                if !home.is_found() {
                    rejection.add_detail("home_team", "Unknown home team");
                }
                if !away.is_found() {
                    rejection.add_detail("away_team", "Unknown away team");
                }
                return Err(self.reject("create_fixture", rejection));
            }
        };

        let now = Utc::now();
        let record = FixtureRecord {
            id: new_id(),
            home_team: home_team.id.clone(),
            home_team_name: home_team.name.clone(),
            away_team: away_team.id.clone(),
            away_team_name: away_team.name.clone(),
            match_date: request.match_date,
            created_at: now,
            updated_at: now,
        };
        self.store
            .insert_one(ctx, FIXTURES_COLLECTION, encode(&record)?)
            .await?;

        self.record_mutation("create");
        tracing::info!(
            fixture_id = %record.id,
            home = %home_team.short_name,
            away = %away_team.short_name,
            match_date = %record.match_date,
            "✅ Fixture created"
        );

        Ok(Fixture {
            id: record.id,
            home_team,
            away_team,
            match_date: record.match_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Partial update. An omitted team field keeps the stored ID and takes
    /// that team's current name; a present `match_date` overwrites.
    pub async fn update(
        &self,
        ctx: &OpContext,
        id: &str,
        update: FixtureUpdate,
    ) -> DomainResult<Lookup<Fixture>> {
        if let (Some(home), Some(away)) = (update.home_team(), update.away_team()) {
            if home == away {
                return Err(self.reject("update_fixture", ValidationError::same_team()));
            }
        }

        let current = match self.by_id(ctx, id).await? {
            Lookup::Found(current) => current,
            Lookup::NotFound => return Ok(Lookup::NotFound),
        };

        let mut record = FixtureRecord::from_joined(&current);
        let mut rejection = ValidationError::fixture_request();

        if let Some(home_id) = update.home_team() {
            match self.teams.by_id(ctx, home_id).await? {
                Lookup::Found(team) => {
                    record.home_team = team.id;
                    record.home_team_name = team.name;
                }
                Lookup::NotFound => rejection.add_detail("home_team", "Unknown home team"),
            }
        }
        if let Some(away_id) = update.away_team() {
            match self.teams.by_id(ctx, away_id).await? {
                Lookup::Found(team) => {
                    record.away_team = team.id;
                    record.away_team_name = team.name;
                }
                Lookup::NotFound => rejection.add_detail("away_team", "Unknown away team"),
            }
        }
        if rejection.has_details() {
            return Err(self.reject("update_fixture", rejection));
        }

        if let Some(match_date) = update.match_date {
            record.match_date = match_date;
        }
        record.updated_at = Utc::now();

        let result = self
            .store
            .replace_one(ctx, FIXTURES_COLLECTION, &Filter::id(id), encode(&record)?)
            .await?;
        if result.matched == 0 {
            // Deleted between the read and the write
            return Ok(Lookup::NotFound);
        }

        self.record_mutation("update");
        tracing::info!(fixture_id = %id, "✏️ Fixture updated");

        self.by_id(ctx, id).await
    }

    pub async fn by_id(&self, ctx: &OpContext, id: &str) -> DomainResult<Lookup<Fixture>> {
        let rows = self
            .store
            .aggregate(ctx, FIXTURES_COLLECTION, &find_fixture_query(id))
            .await?;

        let first = rows.into_iter().next().map(decode::<Fixture>).transpose()?;
        Ok(Lookup::from(first))
    }

    pub async fn list(
        &self,
        ctx: &OpContext,
        status: Option<FixtureStatus>,
    ) -> DomainResult<Vec<Fixture>> {
        self.list_as_of(ctx, status, Utc::now()).await
    }

    /// `list` against an explicit clock
    pub async fn list_as_of(
        &self,
        ctx: &OpContext,
        status: Option<FixtureStatus>,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Fixture>> {
        let pipeline = match status {
            Some(status) => list_fixtures_by_status_query(status, now),
            None => list_fixtures_query(),
        };

        let fixtures = self.run(ctx, &pipeline).await?;
        tracing::debug!(
            status = status.map(|s| s.as_str()).unwrap_or("all"),
            count = fixtures.len(),
            "Listed fixtures"
        );
        Ok(fixtures)
    }

    /// Relevance-ranked search over the stored team name copies
    pub async fn search(&self, ctx: &OpContext, query: &str) -> DomainResult<Vec<Fixture>> {
        match self.run(ctx, &text_search_query(query)).await {
            Err(DomainError::Internal(StoreError::NoDocuments)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Removes the fixture; a missing ID is not an error
    pub async fn delete(&self, ctx: &OpContext, id: &str) -> DomainResult<()> {
        let result = self
            .store
            .delete_one(ctx, FIXTURES_COLLECTION, &Filter::id(id))
            .await?;

        if result.deleted > 0 {
            self.record_mutation("delete");
            tracing::info!(fixture_id = %id, "🗑️ Fixture deleted");
        }
        Ok(())
    }

    async fn run(&self, ctx: &OpContext, pipeline: &Pipeline) -> DomainResult<Vec<Fixture>> {
        let rows = self
            .store
            .aggregate(ctx, FIXTURES_COLLECTION, pipeline)
            .await?;

        rows.into_iter()
            .map(|row| Ok(decode::<Fixture>(row)?))
            .collect()
    }
}

/// Display label used for a single fixture, e.g. "LIV - Man City"
pub fn fixture_title(home: &Team, away: &Team) -> String {
    format!("{} - {}", home.short_name, away.short_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::epl_schema;
    use crate::domain::team::{NewTeam, TeamStore};
    use crate::store::MemoryStore;
    use chrono::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        teams: Arc<TeamStore>,
        fixtures: FixtureStore,
        ctx: OpContext,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new(epl_schema()));
        let teams = Arc::new(TeamStore::new(store.clone()));
        let fixtures = FixtureStore::new(store.clone(), teams.clone());
        Harness {
            store,
            teams,
            fixtures,
            ctx: OpContext::background(),
        }
    }

    impl Harness {
        async fn liverpool(&self) -> Team {
            self.teams
                .create(
                    &self.ctx,
                    NewTeam::new("Liverpool", "LIV").abbr("LIV").city("Liverpool").stadium("Anfield"),
                )
                .await
                .unwrap()
        }

        async fn man_city(&self) -> Team {
            self.teams
                .create(
                    &self.ctx,
                    NewTeam::new("Man City", "Man City")
                        .abbr("MCI")
                        .city("Manchester")
                        .stadium("Etihad"),
                )
                .await
                .unwrap()
        }

        async fn man_utd(&self) -> Team {
            self.teams
                .create(
                    &self.ctx,
                    NewTeam::new("Manchester United", "Man Utd")
                        .abbr("MUN")
                        .city("Manchester")
                        .stadium("Old Trafford"),
                )
                .await
                .unwrap()
        }

        async fn stored_names(&self, fixture_id: &str) -> (String, String) {
            let document = self
                .store
                .find_one(&self.ctx, FIXTURES_COLLECTION, &Filter::id(fixture_id))
                .await
                .unwrap();
            (
                document["home_team_name"].as_str().unwrap().to_string(),
                document["away_team_name"].as_str().unwrap().to_string(),
            )
        }
    }

    fn validation(err: DomainError) -> ValidationError {
        match err {
            DomainError::Validation(v) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_liverpool_vs_man_city_scenario() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let now = Utc::now();

        let fixture = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, now + Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(fixture.home_team.name, "Liverpool");
        assert_eq!(fixture.away_team.name, "Man City");
        assert_eq!(fixture_title(&fixture.home_team, &fixture.away_team), "LIV - Man City");
        assert_eq!(h.fixtures.list_as_of(&h.ctx, None, now).await.unwrap().len(), 1);
        assert_eq!(
            h.fixtures
                .list_as_of(&h.ctx, Some(FixtureStatus::Completed), now)
                .await
                .unwrap()
                .len(),
            0
        );
        assert_eq!(
            h.fixtures
                .list_as_of(&h.ctx, Some(FixtureStatus::Pending), now)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_created_fixture_reads_back_joined() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;

        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();
        let read = h.fixtures.by_id(&h.ctx, &created.id).await.unwrap();

        assert_eq!(read, Lookup::Found(created));
    }

    #[tokio::test]
    async fn test_create_same_team_always_fails() {
        let h = harness();
        let liverpool = h.liverpool().await;

        let known = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &liverpool.id, Utc::now()))
            .await
            .unwrap_err();
        let unknown = h
            .fixtures
            .create(&h.ctx, NewFixture::new("ghost", "ghost", Utc::now()))
            .await
            .unwrap_err();

        for err in [known, unknown] {
            let err = validation(err);
            assert_eq!(err.code, "fixtures/cannot-create-fixture");
            assert_eq!(err.message, "home team and away team must be different");
            assert!(err.details.is_empty());
        }
    }

    #[tokio::test]
    async fn test_create_with_two_unknown_teams_reports_both() {
        let h = harness();

        let err = h
            .fixtures
            .create(&h.ctx, NewFixture::new("ghost-a", "ghost-b", Utc::now()))
            .await
            .unwrap_err();
        let err = validation(err);

        assert_eq!(err.message, "Your request to create a fixture failed");
        assert_eq!(err.details.len(), 2);
        assert_eq!(err.details[0].field, "home_team");
        assert_eq!(err.details[0].message, "Unknown home team");
        assert_eq!(err.details[1].field, "away_team");
        assert_eq!(err.details[1].message, "Unknown away team");
    }

    #[tokio::test]
    async fn test_create_with_one_unknown_team_persists_nothing() {
        let h = harness();
        let liverpool = h.liverpool().await;

        let err = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, "ghost", Utc::now()))
            .await
            .unwrap_err();

        assert_eq!(validation(err).details.len(), 1);
        assert!(h.fixtures.list(&h.ctx, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_exactly_at_now_has_no_status() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let now = Utc::now();
        h.fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, now))
            .await
            .unwrap();

        let pending = h
            .fixtures
            .list_as_of(&h.ctx, Some(FixtureStatus::Pending), now)
            .await
            .unwrap();
        let completed = h
            .fixtures
            .list_as_of(&h.ctx, Some(FixtureStatus::Completed), now)
            .await
            .unwrap();
        let all = h.fixtures.list_as_of(&h.ctx, None, now).await.unwrap();

        assert!(pending.is_empty());
        assert!(completed.is_empty());
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_rename_leaves_denormalized_name_stale() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let fixture = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();

        let mut renamed = city.clone();
        renamed.name = "Sky Blues".to_string();
        h.teams.update(&h.ctx, renamed).await.unwrap();

        // Joined reads see the new name, the stored copy does not
        let read = h.fixtures.by_id(&h.ctx, &fixture.id).await.unwrap().found().unwrap();
        assert_eq!(read.away_team.name, "Sky Blues");
        assert_eq!(h.stored_names(&fixture.id).await.1, "Man City");

        let by_old_name = h.fixtures.search(&h.ctx, "man city").await.unwrap();
        let by_new_name = h.fixtures.search(&h.ctx, "sky blues").await.unwrap();
        assert_eq!(by_old_name.len(), 1);
        assert!(by_new_name.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_teams_only_changes_match_date() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();
        let names_before = h.stored_names(&created.id).await;
        let new_date = created.match_date + Duration::days(7);

        let updated = h
            .fixtures
            .update(
                &h.ctx,
                &created.id,
                FixtureUpdate {
                    match_date: Some(new_date),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .found()
            .unwrap();

        assert_eq!(updated.match_date, new_date);
        assert_eq!(updated.home_team, created.home_team);
        assert_eq!(updated.away_team, created.away_team);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(h.stored_names(&created.id).await, names_before);
    }

    #[tokio::test]
    async fn test_update_refreshes_name_copy_of_omitted_side() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let utd = h.man_utd().await;
        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();

        let mut renamed = liverpool.clone();
        renamed.name = "Liverpool FC".to_string();
        h.teams.update(&h.ctx, renamed).await.unwrap();

        h.fixtures
            .update(
                &h.ctx,
                &created.id,
                FixtureUpdate {
                    away_team: Some(utd.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (home_name, away_name) = h.stored_names(&created.id).await;
        assert_eq!(home_name, "Liverpool FC");
        assert_eq!(away_name, "Manchester United");
    }

    #[tokio::test]
    async fn test_date_only_update_makes_renamed_team_searchable() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();

        let mut renamed = city.clone();
        renamed.name = "Sky Blues".to_string();
        h.teams.update(&h.ctx, renamed).await.unwrap();
        assert!(h.fixtures.search(&h.ctx, "sky blues").await.unwrap().is_empty());

        h.fixtures
            .update(
                &h.ctx,
                &created.id,
                FixtureUpdate {
                    match_date: Some(created.match_date + Duration::days(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(h.stored_names(&created.id).await, ("Liverpool".to_string(), "Sky Blues".to_string()));
        let hits = h.fixtures.search(&h.ctx, "sky blues").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, created.id);
    }

    #[tokio::test]
    async fn test_update_unknown_teams_accumulates_details() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();

        let err = h
            .fixtures
            .update(
                &h.ctx,
                &created.id,
                FixtureUpdate {
                    home_team: Some("ghost-a".to_string()),
                    away_team: Some("ghost-b".to_string()),
                    match_date: None,
                },
            )
            .await
            .unwrap_err();

        assert_eq!(validation(err).details.len(), 2);
    }

    #[tokio::test]
    async fn test_update_same_team_checked_only_when_both_present() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();

        let both = h
            .fixtures
            .update(
                &h.ctx,
                &created.id,
                FixtureUpdate {
                    home_team: Some(city.id.clone()),
                    away_team: Some(city.id.clone()),
                    match_date: None,
                },
            )
            .await;
        assert!(matches!(both, Err(DomainError::Validation(_))));

        // Only one side present: no comparison against the stored side
        let one = h
            .fixtures
            .update(
                &h.ctx,
                &created.id,
                FixtureUpdate {
                    home_team: Some(city.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(one.home_team.id, one.away_team.id);
    }

    #[tokio::test]
    async fn test_update_missing_fixture_is_not_found() {
        let h = harness();
        let result = h
            .fixtures
            .update(&h.ctx, "missing", FixtureUpdate::default())
            .await
            .unwrap();

        assert_eq!(result, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_does_not_cascade() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();

        h.fixtures.delete(&h.ctx, "never-existed").await.unwrap();
        h.fixtures.delete(&h.ctx, &created.id).await.unwrap();
        h.fixtures.delete(&h.ctx, &created.id).await.unwrap();

        assert_eq!(h.fixtures.by_id(&h.ctx, &created.id).await.unwrap(), Lookup::NotFound);
        assert!(h.teams.by_id(&h.ctx, &liverpool.id).await.unwrap().is_found());
    }

    #[tokio::test]
    async fn test_deleted_team_drops_fixture_from_joined_reads() {
        let h = harness();
        let liverpool = h.liverpool().await;
        let city = h.man_city().await;
        let created = h
            .fixtures
            .create(&h.ctx, NewFixture::new(&liverpool.id, &city.id, Utc::now()))
            .await
            .unwrap();

        h.teams.delete(&h.ctx, &city.id).await.unwrap();

        assert!(h.fixtures.list(&h.ctx, None).await.unwrap().is_empty());
        assert_eq!(h.fixtures.by_id(&h.ctx, &created.id).await.unwrap(), Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_search_miss_is_empty() {
        let h = harness();
        assert!(h.fixtures.search(&h.ctx, "arsenal").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_context_is_not_a_domain_error() {
        let h = harness();
        let (ctx, handle) = OpContext::background().cancellable();
        handle.cancel();

        let result = h.fixtures.list(&ctx, None).await;

        assert!(matches!(result, Err(DomainError::Cancelled)));
    }
}
