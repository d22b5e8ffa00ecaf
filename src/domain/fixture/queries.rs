use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::schema::TEAMS_COLLECTION;
use crate::store::{Filter, Pipeline};

use super::model::FixtureStatus;

// ============================================================================
// Fixture Aggregation Pipelines
// ============================================================================
//
// Every read has the same tail: join both team references against the
// teams collection and unwind the single-element arrays back to objects.
// Rows whose team no longer exists join to an empty array and are dropped
// by the unwind.
//
// The $text match has to be the first stage, which is why searching runs
// against the denormalized names stored on the fixture itself.
//
// ============================================================================

pub fn join_team_stages() -> Pipeline {
    Pipeline::new()
        .lookup(TEAMS_COLLECTION, "home_team", "_id", "home_team")
        .lookup(TEAMS_COLLECTION, "away_team", "_id", "away_team")
        .unwind("home_team")
        .unwind("away_team")
}

pub fn find_fixture_query(fixture_id: &str) -> Pipeline {
    Pipeline::new()
        .matching(Filter::id(fixture_id))
        .extend(join_team_stages())
}

pub fn list_fixtures_query() -> Pipeline {
    Pipeline::new()
        .matching(Filter::all())
        .extend(join_team_stages())
}

pub fn list_fixtures_by_status_query(status: FixtureStatus, now: DateTime<Utc>) -> Pipeline {
    let filter = match status {
        FixtureStatus::Pending => Filter::gt("match_date", json!(now)),
        FixtureStatus::Completed => Filter::lt("match_date", json!(now)),
    };

    Pipeline::new().matching(filter).extend(join_team_stages())
}

pub fn text_search_query(query: &str) -> Pipeline {
    Pipeline::new()
        .matching(Filter::text(query))
        .sort_by_text_score()
        .extend(join_team_stages())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_fixture_renders_native_pipeline() {
        let native = find_fixture_query("f1").to_native();

        assert_eq!(native[0], json!({ "$match": { "_id": { "$eq": "f1" } } }));
        assert_eq!(
            native[1],
            json!({ "$lookup": {
                "from": "teams",
                "localField": "home_team",
                "foreignField": "_id",
                "as": "home_team",
            } })
        );
        assert_eq!(native[4], json!({ "$unwind": { "path": "$away_team" } }));
    }

    #[test]
    fn test_status_query_uses_strict_comparisons() {
        let now = Utc::now();

        let pending = list_fixtures_by_status_query(FixtureStatus::Pending, now).to_native();
        let completed = list_fixtures_by_status_query(FixtureStatus::Completed, now).to_native();

        assert_eq!(pending[0]["$match"]["match_date"]["$gt"], json!(now));
        assert_eq!(completed[0]["$match"]["match_date"]["$lt"], json!(now));
    }

    #[test]
    fn test_text_search_matches_first_then_sorts_by_score() {
        let native = text_search_query("arsenal").to_native();

        assert_eq!(native[0], json!({ "$match": { "$text": { "$search": "arsenal" } } }));
        assert_eq!(native[1], json!({ "$sort": { "score": { "$meta": "textScore" } } }));
        assert_eq!(native.as_array().unwrap().len(), 6);
    }
}
