use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::core::{
    document_id, new_id, CollectionSpec, DeleteResult, Document, DocumentStore, Filter,
    OpContext, Pipeline, Schema, StoreError, UpdateResult, ID_FIELD,
};
use crate::store::engine::{Engine, Snapshot};

// ============================================================================
// MemoryStore - In-process DocumentStore
// ============================================================================
//
// Collections are ordered maps keyed by `_id`. Identities are UUIDv7, so
// iteration order follows insertion order for generated ids.
//
// Unique indexes are checked under the write lock, which makes a
// check-then-insert atomic for this backend.
//
// ============================================================================

type Collection = BTreeMap<String, Document>;

pub struct MemoryStore {
    schema: Schema,
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new(schema: Schema) -> Self {
        let collections = schema
            .names()
            .map(|name| (name.to_string(), Collection::new()))
            .collect();

        Self {
            schema,
            collections: RwLock::new(collections),
        }
    }

    fn engine(&self) -> Engine<'_> {
        Engine::new(&self.schema)
    }
}

/// First unique index `candidate` would violate, ignoring the document
/// stored under `exclude_id`
pub(crate) fn unique_violation<'a, I>(
    indexes: &CollectionSpec,
    existing: I,
    candidate: &Document,
    exclude_id: Option<&str>,
) -> Option<StoreError>
where
    I: IntoIterator<Item = &'a Document> + Clone,
{
    for field in &indexes.unique {
        let value = match candidate.get(field) {
            Some(Value::Null) | None => continue,
            Some(value) => value,
        };

        let taken = existing.clone().into_iter().any(|other| {
            document_id(other) != exclude_id && other.get(field) == Some(value)
        });
        if taken {
            return Some(StoreError::DuplicateKey {
                collection: indexes.name.clone(),
                field: field.clone(),
                value: unique_value_key(value),
            });
        }
    }
    None
}

/// String form of a unique-indexed value
pub(crate) fn unique_value_key(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        mut document: Document,
    ) -> Result<String, StoreError> {
        ctx.run(async {
            let indexes = self.schema.get(collection)?;
            let id = match document_id(&document) {
                Some(id) => id.to_string(),
                None => {
                    let id = new_id();
                    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                    id
                }
            };

            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.to_string()).or_default();

            if docs.contains_key(&id) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    field: ID_FIELD.to_string(),
                    value: id,
                });
            }
            if let Some(violation) = unique_violation(indexes, docs.values(), &document, None) {
                return Err(violation);
            }

            docs.insert(id.clone(), document);
            Ok(id)
        })
        .await
    }

    async fn find_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<Document, StoreError> {
        ctx.run(async {
            self.schema.get(collection)?;
            let collections = self.collections.read().await;
            let engine = self.engine();

            for document in collections.get(collection).into_iter().flat_map(|c| c.values()) {
                if engine.matches(collection, filter, document)? {
                    return Ok(document.clone());
                }
            }
            Err(StoreError::NoDocuments)
        })
        .await
    }

    async fn find_many(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        ctx.run(async {
            self.schema.get(collection)?;
            let collections = self.collections.read().await;
            let documents = collections
                .get(collection)
                .into_iter()
                .flat_map(|c| c.values().cloned());

            self.engine().filter(collection, documents, filter)
        })
        .await
    }

    async fn replace_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
        mut replacement: Document,
    ) -> Result<UpdateResult, StoreError> {
        ctx.run(async {
            let indexes = self.schema.get(collection)?;
            let engine = self.engine();
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.to_string()).or_default();

            let mut target = None;
            for (id, document) in docs.iter() {
                if engine.matches(collection, filter, document)? {
                    target = Some(id.clone());
                    break;
                }
            }
            let Some(id) = target else {
                return Ok(UpdateResult::default());
            };

            match document_id(&replacement) {
                Some(given) if given != id => {
                    return Err(StoreError::ImmutableField(ID_FIELD.to_string()));
                }
                Some(_) => {}
                None => {
                    replacement.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                }
            }

            if let Some(violation) = unique_violation(indexes, docs.values(), &replacement, Some(&id))
            {
                return Err(violation);
            }

            let modified = docs.get(&id) != Some(&replacement);
            docs.insert(id, replacement);

            Ok(UpdateResult {
                matched: 1,
                modified: u64::from(modified),
            })
        })
        .await
    }

    async fn delete_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError> {
        ctx.run(async {
            self.schema.get(collection)?;
            let engine = self.engine();
            let mut collections = self.collections.write().await;
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(DeleteResult::default());
            };

            let mut target = None;
            for (id, document) in docs.iter() {
                if engine.matches(collection, filter, document)? {
                    target = Some(id.clone());
                    break;
                }
            }

            let deleted = target.and_then(|id| docs.remove(&id)).is_some();
            Ok(DeleteResult {
                deleted: u64::from(deleted),
            })
        })
        .await
    }

    async fn aggregate(
        &self,
        ctx: &OpContext,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError> {
        ctx.run(async {
            let snapshot = {
                let collections = self.collections.read().await;
                let mut snapshot = Snapshot::new();
                let involved =
                    std::iter::once(collection).chain(pipeline.referenced_collections());
                for name in involved {
                    if snapshot.contains(name) {
                        continue;
                    }
                    let documents = collections
                        .get(name)
                        .map(|c| c.values().cloned().collect())
                        .unwrap_or_default();
                    snapshot.insert(name, documents);
                }
                snapshot
            };

            self.engine().aggregate(collection, pipeline, &snapshot)
        })
        .await
    }
}
