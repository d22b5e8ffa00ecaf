use serde_json::{json, Value};

use super::filter::Filter;

// ============================================================================
// Aggregation Pipeline - Ordered, declarative query stages
// ============================================================================
//
// Each stage is a tagged variant so pipelines can be built and inspected
// without a driver. Backends evaluate `Stage` values directly; `to_native`
// renders the MongoDB aggregation dialect.
//
// Rules enforced at evaluation time (mirroring the MongoDB server):
// - a text match may only appear as the first stage
// - sorting by text score requires a preceding text match
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    /// Left outer join: `as_field` becomes the array of foreign matches
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// Flatten an array field into one document per element; rows whose
    /// array is empty or missing are dropped
    Unwind { path: String },
    /// Descending relevance computed by the text match stage
    SortByTextScore,
}

impl Stage {
    pub fn to_native(&self) -> Value {
        match self {
            Stage::Match(filter) => json!({ "$match": filter.to_native() }),
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                as_field,
            } => json!({
                "$lookup": {
                    "from": from,
                    "localField": local_field,
                    "foreignField": foreign_field,
                    "as": as_field,
                }
            }),
            Stage::Unwind { path } => json!({ "$unwind": { "path": format!("${}", path) } }),
            Stage::SortByTextScore => json!({ "$sort": { "score": { "$meta": "textScore" } } }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn matching(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    pub fn lookup(
        self,
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        self.stage(Stage::Lookup {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        })
    }

    pub fn unwind(self, path: impl Into<String>) -> Self {
        self.stage(Stage::Unwind { path: path.into() })
    }

    pub fn sort_by_text_score(self) -> Self {
        self.stage(Stage::SortByTextScore)
    }

    /// Append every stage of `other` after the current ones
    pub fn extend(mut self, other: Pipeline) -> Self {
        self.stages.extend(other.stages);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Collections joined by lookup stages, in first-use order
    pub fn referenced_collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for stage in &self.stages {
            if let Stage::Lookup { from, .. } = stage {
                if !names.contains(&from.as_str()) {
                    names.push(from);
                }
            }
        }
        names
    }

    pub fn to_native(&self) -> Value {
        Value::Array(self.stages.iter().map(Stage::to_native).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_stage_order() {
        let pipeline = Pipeline::new()
            .matching(Filter::all())
            .lookup("teams", "home_team", "_id", "home_team")
            .unwind("home_team");

        assert_eq!(pipeline.stages().len(), 3);
        assert!(matches!(pipeline.stages()[0], Stage::Match(Filter::All)));
        assert!(matches!(pipeline.stages()[2], Stage::Unwind { .. }));
    }

    #[test]
    fn test_lookup_and_unwind_rendering() {
        let pipeline = Pipeline::new()
            .lookup("teams", "away_team", "_id", "away_team")
            .unwind("away_team");

        assert_eq!(
            pipeline.to_native(),
            json!([
                { "$lookup": {
                    "from": "teams",
                    "localField": "away_team",
                    "foreignField": "_id",
                    "as": "away_team",
                }},
                { "$unwind": { "path": "$away_team" } },
            ])
        );
    }

    #[test]
    fn test_sort_rendering() {
        let pipeline = Pipeline::new()
            .matching(Filter::text("arsenal"))
            .sort_by_text_score();

        assert_eq!(
            pipeline.to_native(),
            json!([
                { "$match": { "$text": { "$search": "arsenal" } } },
                { "$sort": { "score": { "$meta": "textScore" } } },
            ])
        );
    }

    #[test]
    fn test_referenced_collections_are_deduplicated() {
        let pipeline = Pipeline::new()
            .lookup("teams", "home_team", "_id", "home_team")
            .lookup("teams", "away_team", "_id", "away_team")
            .lookup("venues", "venue", "_id", "venue");

        assert_eq!(pipeline.referenced_collections(), vec!["teams", "venues"]);
    }

    #[test]
    fn test_extend_appends_stages() {
        let head = Pipeline::new().matching(Filter::text("arsenal"));
        let tail = Pipeline::new().unwind("home_team");

        let combined = head.extend(tail);

        assert_eq!(combined.stages().len(), 2);
        assert!(matches!(combined.stages()[1], Stage::Unwind { .. }));
    }
}
