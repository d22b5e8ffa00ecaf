use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::lookup::Lookup;
use crate::domain::schema::TEAMS_COLLECTION;
use crate::metrics::Metrics;
use crate::store::core::new_id;
use crate::store::{decode, encode, DocumentStore, Filter, OpContext, Pipeline, StoreError};

use super::model::{NewTeam, Team};

// ============================================================================
// Team Store
// ============================================================================
//
// Sole owner of team identity and names. Uniqueness of name/short_name is
// left to the store's unique indexes; a duplicate-key signal surfaces as
// DomainError::AlreadyExists.
//
// ============================================================================

/// Read-by-ID capability other components resolve team references through
#[async_trait]
pub trait TeamLookup: Send + Sync {
    async fn by_id(&self, ctx: &OpContext, id: &str) -> DomainResult<Lookup<Team>>;
}

#[derive(Clone)]
pub struct TeamStore {
    store: Arc<dyn DocumentStore>,
    metrics: Option<Arc<Metrics>>,
}

impl TeamStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn record_mutation(&self, action: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_mutation("team", action);
        }
    }

    pub async fn create(&self, ctx: &OpContext, request: NewTeam) -> DomainResult<Team> {
        let team = request.into_team(new_id(), Utc::now());
        let document = encode(&team)?;

        match self.store.insert_one(ctx, TEAMS_COLLECTION, document).await {
            Ok(_) => {}
            Err(e @ StoreError::DuplicateKey { .. }) => {
                tracing::info!(name = %team.name, error = %e, "Team already exists");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }

        self.record_mutation("create");
        tracing::info!(team_id = %team.id, name = %team.name, "✅ Team created");
        Ok(team)
    }

    /// Full replace by ID; `created_at` is kept as supplied
    pub async fn update(&self, ctx: &OpContext, mut team: Team) -> DomainResult<Team> {
        team.updated_at = Utc::now();
        let document = encode(&team)?;

        let result = self
            .store
            .replace_one(ctx, TEAMS_COLLECTION, &Filter::id(&team.id), document)
            .await?;
        if result.matched == 0 {
            return Err(DomainError::not_found("team", team.id));
        }

        self.record_mutation("update");
        tracing::info!(team_id = %team.id, name = %team.name, "✏️ Team updated");
        Ok(team)
    }

    pub async fn list(&self, ctx: &OpContext) -> DomainResult<Vec<Team>> {
        let documents = self
            .store
            .find_many(ctx, TEAMS_COLLECTION, &Filter::all())
            .await?;

        documents
            .into_iter()
            .map(|document| decode(document).map_err(DomainError::from))
            .collect()
    }

    pub async fn by_id(&self, ctx: &OpContext, id: &str) -> DomainResult<Lookup<Team>> {
        match self.store.find_one(ctx, TEAMS_COLLECTION, &Filter::id(id)).await {
            Ok(document) => Ok(Lookup::Found(decode(document)?)),
            Err(StoreError::NoDocuments) => Ok(Lookup::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the team; fixtures referencing it are left alone
    pub async fn delete(&self, ctx: &OpContext, id: &str) -> DomainResult<()> {
        let result = self
            .store
            .delete_one(ctx, TEAMS_COLLECTION, &Filter::id(id))
            .await?;

        if result.deleted > 0 {
            self.record_mutation("delete");
            tracing::info!(team_id = %id, "🗑️ Team deleted");
        }
        Ok(())
    }

    /// Relevance-ranked text search over name, short name and city
    pub async fn search(&self, ctx: &OpContext, query: &str) -> DomainResult<Vec<Team>> {
        let pipeline = Pipeline::new()
            .matching(Filter::text(query))
            .sort_by_text_score();

        let documents = match self.store.aggregate(ctx, TEAMS_COLLECTION, &pipeline).await {
            Ok(documents) => documents,
            Err(StoreError::NoDocuments) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        documents
            .into_iter()
            .map(|document| decode(document).map_err(DomainError::from))
            .collect()
    }
}

#[async_trait]
impl TeamLookup for TeamStore {
    async fn by_id(&self, ctx: &OpContext, id: &str) -> DomainResult<Lookup<Team>> {
        TeamStore::by_id(self, ctx, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::epl_schema;
    use crate::store::MemoryStore;

    fn team_store() -> TeamStore {
        TeamStore::new(Arc::new(MemoryStore::new(epl_schema())))
    }

    fn man_utd() -> NewTeam {
        NewTeam::new("Manchester United", "Man Utd")
            .abbr("MUN")
            .city("Manchester")
            .stadium("Old Trafford")
    }

    fn man_city() -> NewTeam {
        NewTeam::new("Manchester City", "Man City")
            .abbr("MCI")
            .city("Manchester")
            .stadium("Etihad")
    }

    fn liverpool() -> NewTeam {
        NewTeam::new("Liverpool", "Liverpool")
            .abbr("LIV")
            .city("Liverpool")
            .stadium("Anfield")
    }

    #[tokio::test]
    async fn test_create_assigns_identity_and_timestamps() {
        let teams = team_store();
        let ctx = OpContext::background();

        let team = teams.create(&ctx, man_utd()).await.unwrap();

        assert!(!team.id.is_empty());
        assert_eq!(team.created_at, team.updated_at);
        assert_eq!(teams.by_id(&ctx, &team.id).await.unwrap(), Lookup::Found(team));
    }

    #[tokio::test]
    async fn test_duplicate_name_or_short_name_already_exists() {
        let teams = team_store();
        let ctx = OpContext::background();
        teams.create(&ctx, man_utd()).await.unwrap();

        let same_name = teams.create(&ctx, NewTeam::new("Manchester United", "MU")).await;
        let same_short = teams.create(&ctx, NewTeam::new("Man United", "Man Utd")).await;

        assert!(matches!(same_name, Err(DomainError::AlreadyExists { ref field, .. }) if field == "name"));
        assert!(matches!(same_short, Err(DomainError::AlreadyExists { ref field, .. }) if field == "short_name"));
    }

    #[tokio::test]
    async fn test_update_replaces_and_preserves_created_at() {
        let teams = team_store();
        let ctx = OpContext::background();
        let team = teams.create(&ctx, liverpool()).await.unwrap();

        let mut edited = team.clone();
        edited.home_stadium = "Anfield Road".to_string();
        let updated = teams.update(&ctx, edited).await.unwrap();

        assert_eq!(updated.created_at, team.created_at);
        assert!(updated.updated_at >= team.updated_at);
        let stored = teams.by_id(&ctx, &team.id).await.unwrap().found().unwrap();
        assert_eq!(stored.home_stadium, "Anfield Road");
    }

    #[tokio::test]
    async fn test_update_unknown_team_is_not_found() {
        let teams = team_store();
        let ctx = OpContext::background();
        let ghost = man_utd().into_team("ghost".to_string(), Utc::now());

        let result = teams.update(&ctx, ghost).await;

        assert!(matches!(result, Err(DomainError::NotFound { entity: "team", .. })));
    }

    #[tokio::test]
    async fn test_by_id_missing_is_not_an_error() {
        let teams = team_store();
        let result = teams.by_id(&OpContext::background(), "nope").await.unwrap();
        assert_eq!(result, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_list_and_idempotent_delete() {
        let teams = team_store();
        let ctx = OpContext::background();
        let utd = teams.create(&ctx, man_utd()).await.unwrap();
        teams.create(&ctx, man_city()).await.unwrap();

        assert_eq!(teams.list(&ctx).await.unwrap().len(), 2);

        teams.delete(&ctx, &utd.id).await.unwrap();
        teams.delete(&ctx, &utd.id).await.unwrap();

        assert_eq!(teams.list(&ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_ranks_by_relevance() {
        let teams = team_store();
        let ctx = OpContext::background();
        teams.create(&ctx, liverpool()).await.unwrap();
        teams.create(&ctx, man_city()).await.unwrap();
        teams.create(&ctx, man_utd()).await.unwrap();

        let hits = teams.search(&ctx, "manchester united").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["Manchester United", "Manchester City"]);
        assert!(teams.search(&ctx, "arsenal").await.unwrap().is_empty());
    }
}
