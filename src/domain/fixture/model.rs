use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::team::Team;

// ============================================================================
// Fixture Records
// ============================================================================
//
// Two shapes live in the fixtures collection:
//
// - FixtureRecord is what gets written: team references as IDs plus a
//   copy of each team's name taken at write time. The copies exist only so
//   a $text index can cover them. A team rename leaves them stale until
//   the fixture is written again.
// - Fixture is what reads return: both references replaced by the joined
//   Team documents.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub home_team: Team,
    pub away_team: Team,
    pub match_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FixtureRecord {
    pub id: String,
    pub home_team: String,
    pub home_team_name: String,
    pub away_team: String,
    pub away_team_name: String,
    pub match_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FixtureRecord {
    /// Write model for a joined read, with both name copies taken from the
    /// joined teams
    pub fn from_joined(fixture: &Fixture) -> Self {
        Self {
            id: fixture.id.clone(),
            home_team: fixture.home_team.id.clone(),
            home_team_name: fixture.home_team.name.clone(),
            away_team: fixture.away_team.id.clone(),
            away_team_name: fixture.away_team.name.clone(),
            match_date: fixture.match_date,
            created_at: fixture.created_at,
            updated_at: fixture.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFixture {
    pub home_team: String,
    pub away_team: String,
    pub match_date: DateTime<Utc>,
}

impl NewFixture {
    pub fn new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        match_date: DateTime<Utc>,
    ) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            match_date,
        }
    }
}

/// Partial edit. Empty team IDs count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureUpdate {
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub match_date: Option<DateTime<Utc>>,
}

impl FixtureUpdate {
    pub fn home_team(&self) -> Option<&str> {
        self.home_team.as_deref().filter(|id| !id.is_empty())
    }

    pub fn away_team(&self) -> Option<&str> {
        self.away_team.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    Pending,
    Completed,
}

impl FixtureStatus {
    /// "pending" / "completed"; anything else means no status filter
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(FixtureStatus::Pending),
            "completed" => Some(FixtureStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureStatus::Pending => "pending",
            FixtureStatus::Completed => "completed",
        }
    }
}
