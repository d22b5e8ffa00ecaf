use crate::store::{CollectionSpec, Schema, TextIndex};

// ============================================================================
// Collections and indexes used by the domain
// ============================================================================

pub const TEAMS_COLLECTION: &str = "teams";
pub const FIXTURES_COLLECTION: &str = "fixtures";

/// Unique name/short_name on teams, weighted text indexes on both
pub fn epl_schema() -> Schema {
    Schema::new()
        .collection(
            CollectionSpec::new(TEAMS_COLLECTION)
                .unique("name")
                .unique("short_name")
                .text(
                    TextIndex::new("teams_text_search")
                        .field("name", 4)
                        .field("short_name", 2)
                        .field("city", 1),
                ),
        )
        .collection(
            CollectionSpec::new(FIXTURES_COLLECTION).text(
                TextIndex::new("fixtures_text_search")
                    .field("home_team_name", 1)
                    .field("away_team_name", 1),
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_text_weights() {
        let schema = epl_schema();
        let index = schema
            .get(TEAMS_COLLECTION)
            .unwrap()
            .text_index
            .clone()
            .unwrap();

        assert_eq!(
            index.fields,
            vec![
                ("name".to_string(), 4),
                ("short_name".to_string(), 2),
                ("city".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_fixtures_have_no_unique_indexes() {
        let schema = epl_schema();
        assert!(schema.get(FIXTURES_COLLECTION).unwrap().unique.is_empty());
    }
}
