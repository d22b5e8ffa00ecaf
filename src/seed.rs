use chrono::{DateTime, Duration, Utc};

use crate::domain::fixture::{Fixture, FixtureStore, NewFixture};
use crate::domain::team::{NewTeam, Team, TeamStore};
use crate::domain::{DomainError, DomainResult};
use crate::store::OpContext;

// ============================================================================
// Seed Data - Premier League clubs and a generated fixture list
// ============================================================================

/// (name, short name, abbreviation, city, home stadium)
pub const SEED_TEAMS: &[(&str, &str, &str, &str, &str)] = &[
    ("Arsenal", "Arsenal", "ARS", "London", "Emirates Stadium"),
    ("Aston Villa", "Aston Villa", "AVL", "Birmingham", "Villa Park"),
    ("Brentford", "Brentford", "BRE", "Brentford", "Gtech Community Stadium"),
    ("Brighton and Hove Albion", "Brighton", "BHA", "Falmer", "American Express Stadium"),
    ("Chelsea", "Chelsea", "CHE", "London", "Stamford Bridge"),
    ("Crystal Palace", "Crystal Palace", "CRY", "London", "Selhurst Park"),
    ("Everton", "Everton", "EVE", "Liverpool", "Goodison Park"),
    ("Fulham", "Fulham", "FUL", "London", "Craven Cottage"),
    ("Liverpool", "Liverpool", "LIV", "Liverpool", "Anfield"),
    ("Manchester City", "Man City", "MCI", "Manchester", "Etihad Stadium"),
    ("Manchester United", "Man Utd", "MUN", "Manchester", "Old Trafford"),
    ("Newcastle United", "Newcastle", "NEW", "Newcastle", "St. James' Park"),
    ("Tottenham Hotspur", "Spurs", "TOT", "London", "Tottenham Hotspur Stadium"),
    ("West Ham United", "West Ham", "WHU", "London", "London Stadium"),
    ("Wolverhampton Wanderers", "Wolves", "WOL", "Wolverhampton", "Molineux Stadium"),
];

pub fn seed_requests() -> Vec<NewTeam> {
    SEED_TEAMS
        .iter()
        .map(|(name, short_name, abbr, city, stadium)| {
            NewTeam::new(*name, *short_name)
                .abbr(*abbr)
                .city(*city)
                .stadium(*stadium)
        })
        .collect()
}

/// Create the seed clubs, skipping any that already exist.
///
/// Returns the number of clubs created by this call.
pub async fn seed_teams(ctx: &OpContext, teams: &TeamStore) -> DomainResult<usize> {
    let mut created = 0;
    for request in seed_requests() {
        match teams.create(ctx, request).await {
            Ok(_) => created += 1,
            Err(DomainError::AlreadyExists { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    tracing::info!(created, total = SEED_TEAMS.len(), "🌱 Seeded teams");
    Ok(created)
}

/// Kick-off offset for the n-th generated fixture, spread over four days
/// either side of `now`
fn kickoff_offset(index: usize) -> Duration {
    let hours = (index * 37 % 96) as i64 - 48;
    Duration::hours(hours)
}

/// Pair each team with the next one in `teams`. Does nothing when the
/// store already holds fixtures.
pub async fn seed_fixtures(
    ctx: &OpContext,
    fixtures: &FixtureStore,
    teams: &[Team],
    now: DateTime<Utc>,
) -> DomainResult<Vec<Fixture>> {
    let existing = fixtures.list(ctx, None).await?.len();
    if existing > 0 {
        tracing::info!(existing, "🌱 Fixtures already seeded, skipping");
        return Ok(Vec::new());
    }

    let mut created = Vec::new();
    for (index, pair) in teams.windows(2).enumerate() {
        let request = NewFixture::new(&pair[0].id, &pair[1].id, now + kickoff_offset(index));
        created.push(fixtures.create(ctx, request).await?);
    }

    tracing::info!(created = created.len(), "🌱 Seeded fixtures");
    Ok(created)
}
