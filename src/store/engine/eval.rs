use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use crate::store::core::{Document, Filter, Pipeline, Schema, Stage, StoreError};

use super::text::TextQuery;
use super::values;

// ============================================================================
// Engine - Filter and pipeline evaluation over in-memory documents
// ============================================================================
//
// Shared by every bundled backend: MemoryStore evaluates against its own
// maps, RedisStore loads the collections a call needs into a Snapshot and
// evaluates client-side.
//
// ============================================================================

/// The documents a single evaluation may read, keyed by collection
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    collections: HashMap<String, Vec<Document>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: impl Into<String>, documents: Vec<Document>) {
        self.collections.insert(collection.into(), documents);
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    pub fn get(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
struct Row {
    document: Document,
    score: Option<f64>,
}

pub struct Engine<'a> {
    schema: &'a Schema,
}

impl<'a> Engine<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn matches(
        &self,
        collection: &str,
        filter: &Filter,
        document: &Document,
    ) -> Result<bool, StoreError> {
        Ok(self.evaluate(collection, filter, document)?.is_some())
    }

    /// Keep the documents matching `filter`, preserving input order
    pub fn filter<I>(
        &self,
        collection: &str,
        documents: I,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut kept = Vec::new();
        for document in documents {
            if self.matches(collection, filter, &document)? {
                kept.push(document);
            }
        }
        Ok(kept)
    }

    pub fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
        snapshot: &Snapshot,
    ) -> Result<Vec<Document>, StoreError> {
        self.schema.get(collection)?;

        let mut rows: Vec<Row> = snapshot
            .get(collection)
            .iter()
            .cloned()
            .map(|document| Row {
                document,
                score: None,
            })
            .collect();
        let mut scored = false;

        for (position, stage) in pipeline.stages().iter().enumerate() {
            rows = match stage {
                Stage::Match(filter) => {
                    let is_text = filter.is_text();
                    if is_text {
                        if position != 0 {
                            return Err(StoreError::InvalidPipeline(
                                "$text match must be the first stage".to_string(),
                            ));
                        }
                        scored = true;
                    }

                    let mut kept = Vec::with_capacity(rows.len());
                    for mut row in rows {
                        if let Some(score) = self.evaluate(collection, filter, &row.document)? {
                            if is_text {
                                row.score = Some(score);
                            }
                            kept.push(row);
                        }
                    }
                    kept
                }

                Stage::Lookup {
                    from,
                    local_field,
                    foreign_field,
                    as_field,
                } => {
                    self.schema.get(from)?;
                    let foreign = snapshot.get(from);

                    rows.into_iter()
                        .map(|mut row| {
                            let local = row.document.get(local_field).cloned();
                            let joined: Vec<Value> = foreign
                                .iter()
                                .filter(|candidate| {
                                    values::join_key_equals(
                                        local.as_ref(),
                                        candidate.get(foreign_field),
                                    )
                                })
                                .cloned()
                                .map(Value::Object)
                                .collect();
                            row.document.insert(as_field.clone(), Value::Array(joined));
                            row
                        })
                        .collect()
                }

                Stage::Unwind { path } => unwind(rows, path),

                Stage::SortByTextScore => {
                    if !scored {
                        return Err(StoreError::InvalidPipeline(
                            "text score sort requires a $text match".to_string(),
                        ));
                    }
                    rows.sort_by(|a, b| {
                        b.score
                            .partial_cmp(&a.score)
                            .unwrap_or(Ordering::Equal)
                    });
                    rows
                }
            };
        }

        Ok(rows.into_iter().map(|row| row.document).collect())
    }

    /// `None` when the document does not match, otherwise its text score
    /// (zero for non-text predicates)
    fn evaluate(
        &self,
        collection: &str,
        filter: &Filter,
        document: &Document,
    ) -> Result<Option<f64>, StoreError> {
        let matched = |hit: bool| if hit { Some(0.0) } else { None };

        let outcome = match filter {
            Filter::All => Some(0.0),
            Filter::Eq { field, value } => {
                matched(document.get(field).is_some_and(|v| values::equals(v, value)))
            }
            Filter::Gt { field, value } => matched(
                document
                    .get(field)
                    .and_then(|v| values::compare(v, value))
                    == Some(Ordering::Greater),
            ),
            Filter::Lt { field, value } => matched(
                document
                    .get(field)
                    .and_then(|v| values::compare(v, value))
                    == Some(Ordering::Less),
            ),
            Filter::Text { search } => {
                let index = self
                    .schema
                    .get(collection)?
                    .text_index
                    .as_ref()
                    .ok_or_else(|| {
                        StoreError::InvalidPipeline(format!(
                            "text index required for $text query on {}",
                            collection
                        ))
                    })?;
                let score = TextQuery::parse(search).score(document, index);
                (score > 0.0).then_some(score)
            }
        };

        Ok(outcome)
    }
}

fn unwind(rows: Vec<Row>, path: &str) -> Vec<Row> {
    let mut flattened = Vec::with_capacity(rows.len());

    for mut row in rows {
        match row.document.remove(path) {
            Some(Value::Array(items)) => {
                for item in items {
                    let mut copy = row.clone();
                    copy.document.insert(path.to_string(), item);
                    flattened.push(copy);
                }
            }
            None | Some(Value::Null) => {}
            // A scalar unwinds to itself
            Some(other) => {
                row.document.insert(path.to_string(), other);
                flattened.push(row);
            }
        }
    }

    flattened
}
