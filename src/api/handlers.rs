use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpResponse;

use crate::domain::fixture::{fixture_title, Fixture, FixtureStatus, FixtureStore, FixtureUpdate, NewFixture};
use crate::domain::team::{NewTeam, Team, TeamStore, TeamUpdate};
use crate::domain::{DomainError, DomainResult, Lookup, SearchAggregator, SearchResults};
use crate::store::OpContext;

use super::responses::{search_message, DataResponse};

// ============================================================================
// Api - The operations exposed to the HTTP layer
// ============================================================================
//
// Routing, authentication and body binding live outside this crate; they
// call into these methods with an already-decoded request and render the
// returned envelope (or DomainError, via ResponseError).
//
// ============================================================================

pub type ApiResult<T> = DomainResult<DataResponse<T>>;

#[derive(Clone)]
pub struct Api {
    teams: Arc<TeamStore>,
    fixtures: Arc<FixtureStore>,
    search: SearchAggregator,
    timeout: Duration,
}

impl Api {
    pub fn new(
        teams: Arc<TeamStore>,
        fixtures: Arc<FixtureStore>,
        search: SearchAggregator,
        timeout: Duration,
    ) -> Self {
        Self {
            teams,
            fixtures,
            search,
            timeout,
        }
    }

    /// Context bounded by the configured per-request timeout
    pub fn request_context(&self) -> OpContext {
        OpContext::with_timeout(self.timeout)
    }

    // === Fixtures ===

    pub async fn create_fixture(&self, ctx: &OpContext, request: NewFixture) -> ApiResult<Fixture> {
        let fixture = self.fixtures.create(ctx, request).await?;
        Ok(DataResponse::created("Fixture", "Fixture created successfully", fixture))
    }

    pub async fn update_fixture(
        &self,
        ctx: &OpContext,
        id: &str,
        update: FixtureUpdate,
    ) -> ApiResult<Fixture> {
        match self.fixtures.update(ctx, id, update).await? {
            Lookup::Found(fixture) => Ok(DataResponse::ok(
                "Fixture",
                "Fixture updated successfully",
                fixture,
            )),
            Lookup::NotFound => Err(DomainError::not_found("fixture", id)),
        }
    }

    pub async fn view_fixture(&self, ctx: &OpContext, id: &str) -> ApiResult<Fixture> {
        match self.fixtures.by_id(ctx, id).await? {
            Lookup::Found(fixture) => {
                let title = fixture_title(&fixture.home_team, &fixture.away_team);
                Ok(DataResponse::ok("Fixture", title, fixture))
            }
            Lookup::NotFound => Err(DomainError::not_found("fixture", id)),
        }
    }

    /// `status` is the raw query parameter; unknown values list everything
    pub async fn list_fixtures(&self, ctx: &OpContext, status: &str) -> ApiResult<Vec<Fixture>> {
        let fixtures = self.fixtures.list(ctx, FixtureStatus::parse(status)).await?;
        Ok(DataResponse::ok("Fixtures", "Available EPL fixtures", fixtures))
    }

    pub async fn delete_fixture(&self, ctx: &OpContext, id: &str) -> DomainResult<HttpResponse> {
        self.fixtures.delete(ctx, id).await?;
        Ok(HttpResponse::Ok().json(serde_json::Value::Null))
    }

    // === Search ===

    pub async fn search_all(&self, ctx: &OpContext, query: &str) -> ApiResult<SearchResults> {
        let results = self.search.search(ctx, query).await?;
        Ok(DataResponse::ok("SearchResults", search_message(query), results))
    }

    // === Teams ===

    pub async fn create_team(&self, ctx: &OpContext, request: NewTeam) -> ApiResult<Team> {
        let team = self.teams.create(ctx, request).await?;
        Ok(DataResponse::created("Team", "Team created successfully", team))
    }

    /// Overlays the edit on the stored team, keeping its `created_at`
    pub async fn update_team(&self, ctx: &OpContext, id: &str, update: TeamUpdate) -> ApiResult<Team> {
        let current = match self.teams.by_id(ctx, id).await? {
            Lookup::Found(team) => team,
            Lookup::NotFound => return Err(DomainError::not_found("team", id)),
        };

        let team = self.teams.update(ctx, update.apply(current)).await?;
        Ok(DataResponse::ok("Team", "Team updated successfully", team))
    }

    pub async fn view_team(&self, ctx: &OpContext, id: &str) -> ApiResult<Team> {
        match self.teams.by_id(ctx, id).await? {
            Lookup::Found(team) => {
                let message = format!("Team: {:?}", team.name);
                Ok(DataResponse::ok("Team", message, team))
            }
            Lookup::NotFound => Err(DomainError::not_found("team", id)),
        }
    }

    pub async fn list_teams(&self, ctx: &OpContext) -> ApiResult<Vec<Team>> {
        let teams = self.teams.list(ctx).await?;
        Ok(DataResponse::ok("Teams", "Available EPL teams", teams))
    }

    pub async fn delete_team(&self, ctx: &OpContext, id: &str) -> DomainResult<HttpResponse> {
        self.teams.delete(ctx, id).await?;
        Ok(HttpResponse::Ok().json(serde_json::Value::Null))
    }
}
