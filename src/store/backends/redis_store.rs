use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde_json::Value;

use crate::store::core::{
    document_id, new_id, CollectionSpec, DeleteResult, Document, DocumentStore, Filter, OpContext,
    Pipeline, Schema, StoreError, UpdateResult, ID_FIELD,
};
use crate::store::engine::{Engine, Snapshot};

use super::memory::unique_value_key;

// ============================================================================
// RedisStore - DocumentStore over Redis hashes
// ============================================================================
//
// Layout, for prefix `mock_epl`:
//
//     mock_epl:teams                   hash  _id   -> document JSON
//     mock_epl:teams:unique:name       hash  value -> owning _id
//     mock_epl:teams:unique:short_name hash  value -> owning _id
//
// Every write runs as one Lua script: unique claims, the document write and
// the release of values the document no longer holds either all happen or
// none do. A call dropped on cancel or timeout leaves no orphaned claim.
//
// Filters and pipelines load the collections involved and run through the
// shared engine.
//
// ============================================================================

// KEYS[1]      collection hash
// KEYS[2..]    unique hashes: ARGV[4] claims, then releases
// ARGV[1]      _id
// ARGV[2]      document JSON
// ARGV[3]      "insert" or "replace"
// ARGV[4]      claim count
// ARGV[5..]    unique values, in KEYS order
//
// Returns 0 on success, -1 if an inserted _id exists, -2 if a replaced
// document is gone, or the 1-based position of the conflicting claim.
const WRITE_SCRIPT: &str = r#"
local id = ARGV[1]
local exists = redis.call('HEXISTS', KEYS[1], id)
if ARGV[3] == 'insert' and exists == 1 then
  return -1
end
if ARGV[3] == 'replace' and exists == 0 then
  return -2
end

local claims = tonumber(ARGV[4])
for i = 1, claims do
  local owner = redis.call('HGET', KEYS[1 + i], ARGV[4 + i])
  if owner and owner ~= id then
    return i
  end
end

for i = 1, claims do
  redis.call('HSET', KEYS[1 + i], ARGV[4 + i], id)
end
for i = claims + 1, #KEYS - 1 do
  if redis.call('HGET', KEYS[1 + i], ARGV[4 + i]) == id then
    redis.call('HDEL', KEYS[1 + i], ARGV[4 + i])
  end
end

redis.call('HSET', KEYS[1], id, ARGV[2])
return 0
"#;

// KEYS[1]      collection hash
// KEYS[2..]    unique hashes to release
// ARGV[1]      _id
// ARGV[2..]    unique values, in KEYS order
//
// Returns the number of documents removed.
const DELETE_SCRIPT: &str = r#"
local id = ARGV[1]
local removed = redis.call('HDEL', KEYS[1], id)
for i = 2, #KEYS do
  if redis.call('HGET', KEYS[i], ARGV[i]) == id then
    redis.call('HDEL', KEYS[i], ARGV[i])
  end
end
return removed
"#;

const INSERTED_ID_EXISTS: i64 = -1;
const REPLACED_DOCUMENT_GONE: i64 = -2;

/// Key naming under a store prefix
#[derive(Debug, Clone)]
struct Keys {
    prefix: String,
}

impl Keys {
    fn collection(&self, collection: &str) -> String {
        format!("{}:{}", self.prefix, collection)
    }

    fn unique(&self, collection: &str, field: &str) -> String {
        format!("{}:{}:unique:{}", self.prefix, collection, field)
    }
}

/// One value of a unique index, as stored in its hash
#[derive(Debug, Clone, PartialEq)]
struct UniqueEntry {
    field: String,
    key: String,
    value: String,
}

/// Unique entries `document` needs to own
fn unique_entries(keys: &Keys, indexes: &CollectionSpec, document: &Document) -> Vec<UniqueEntry> {
    indexes
        .unique
        .iter()
        .filter_map(|field| {
            let value = document.get(field).filter(|v| !v.is_null())?;
            Some(UniqueEntry {
                field: field.clone(),
                key: keys.unique(&indexes.name, field),
                value: unique_value_key(value),
            })
        })
        .collect()
}

/// Unique entries held by `previous` that `next` no longer uses
fn stale_entries(
    keys: &Keys,
    indexes: &CollectionSpec,
    previous: &Document,
    next: Option<&Document>,
) -> Vec<UniqueEntry> {
    unique_entries(keys, indexes, previous)
        .into_iter()
        .filter(|entry| next.and_then(|n| n.get(&entry.field)) != previous.get(&entry.field))
        .collect()
}

pub struct RedisStore {
    schema: Schema,
    keys: Keys,
    connection: ConnectionManager,
    write_script: Script,
    delete_script: Script,
}

impl RedisStore {
    pub async fn connect(url: &str, prefix: &str, schema: Schema) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;

        tracing::info!(prefix = %prefix, "🔌 Connected to Redis document store");

        Ok(Self {
            schema,
            keys: Keys {
                prefix: prefix.to_string(),
            },
            connection,
            write_script: Script::new(WRITE_SCRIPT),
            delete_script: Script::new(DELETE_SCRIPT),
        })
    }

    fn engine(&self) -> Engine<'_> {
        Engine::new(&self.schema)
    }

    /// All documents of a collection, in `_id` order
    async fn load(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut connection = self.connection.clone();
        let raw: HashMap<String, String> =
            connection.hgetall(self.keys.collection(collection)).await?;

        let mut entries: Vec<(String, String)> = raw.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        entries
            .into_iter()
            .map(|(_, json)| match serde_json::from_str::<Value>(&json)? {
                Value::Object(document) => Ok(document),
                _ => Err(StoreError::NotADocument),
            })
            .collect()
    }

    async fn first_match(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let engine = self.engine();
        for document in self.load(collection).await? {
            if engine.matches(collection, filter, &document)? {
                return Ok(Some(document));
            }
        }
        Ok(None)
    }

    /// Claim `claims`, release `releases` and store `document` in one step.
    async fn write(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
        mode: &str,
        claims: &[UniqueEntry],
        releases: &[UniqueEntry],
    ) -> Result<i64, StoreError> {
        let json = serde_json::to_string(document)?;

        let mut invocation = self.write_script.prepare_invoke();
        invocation
            .key(self.keys.collection(collection))
            .arg(id)
            .arg(json)
            .arg(mode)
            .arg(claims.len());
        for entry in claims.iter().chain(releases) {
            invocation.key(&entry.key).arg(&entry.value);
        }

        let mut connection = self.connection.clone();
        let outcome: i64 = invocation.invoke_async(&mut connection).await?;

        let conflict = usize::try_from(outcome)
            .ok()
            .and_then(|position| position.checked_sub(1))
            .and_then(|index| claims.get(index));
        match conflict {
            Some(entry) => Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                field: entry.field.clone(),
                value: entry.value.clone(),
            }),
            None => Ok(outcome),
        }
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    fn backend_tag(&self) -> &'static str {
        "redis"
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

            let claims = unique_entries(&self.keys, indexes, &document);
            let outcome = self
                .write(collection, &id, &document, "insert", &claims, &[])
                .await?;
            if outcome == INSERTED_ID_EXISTS {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    field: ID_FIELD.to_string(),
                    value: id,
                });
            }

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
            self.first_match(collection, filter)
                .await?
                .ok_or(StoreError::NoDocuments)
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
            let documents = self.load(collection).await?;
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
            let Some(current) = self.first_match(collection, filter).await? else {
                return Ok(UpdateResult::default());
            };
            let id = document_id(&current)
                .ok_or(StoreError::NotADocument)?
                .to_string();

            match document_id(&replacement) {
                Some(given) if given != id => {
                    return Err(StoreError::ImmutableField(ID_FIELD.to_string()));
                }
                Some(_) => {}
                None => {
                    replacement.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                }
            }

            let claims = unique_entries(&self.keys, indexes, &replacement);
            let releases = stale_entries(&self.keys, indexes, &current, Some(&replacement));
            let outcome = self
                .write(collection, &id, &replacement, "replace", &claims, &releases)
                .await?;
            if outcome == REPLACED_DOCUMENT_GONE {
                return Ok(UpdateResult::default());
            }

            Ok(UpdateResult {
                matched: 1,
                modified: u64::from(current != replacement),
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
            let indexes = self.schema.get(collection)?;
            let Some(current) = self.first_match(collection, filter).await? else {
                return Ok(DeleteResult::default());
            };
            let Some(id) = document_id(&current) else {
                return Ok(DeleteResult::default());
            };

            let mut invocation = self.delete_script.prepare_invoke();
            invocation.key(self.keys.collection(collection)).arg(id);
            for entry in stale_entries(&self.keys, indexes, &current, None) {
                invocation.key(entry.key).arg(entry.value);
            }

            let mut connection = self.connection.clone();
            let removed: u64 = invocation.invoke_async(&mut connection).await?;

            Ok(DeleteResult { deleted: removed })
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
            self.schema.get(collection)?;

            let mut snapshot = Snapshot::new();
            let involved = std::iter::once(collection).chain(pipeline.referenced_collections());
            for name in involved {
                if snapshot.contains(name) {
                    continue;
                }
                let documents = self.load(name).await?;
                snapshot.insert(name, documents);
            }

            tracing::trace!(
                collection = %collection,
                loaded = snapshot.get(collection).len(),
                "Evaluating pipeline client-side"
            );

            self.engine().aggregate(collection, pipeline, &snapshot)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys() -> Keys {
        Keys {
            prefix: "mock_epl".to_string(),
        }
    }

    fn teams() -> CollectionSpec {
        CollectionSpec::new("teams").unique("name").unique("short_name")
    }

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_key_layout() {
        let keys = keys();

        assert_eq!(keys.collection("teams"), "mock_epl:teams");
        assert_eq!(keys.unique("teams", "name"), "mock_epl:teams:unique:name");
    }

    #[test]
    fn test_unique_entries_skip_missing_and_null_values() {
        let arsenal = document(json!({ "_id": "t1", "name": "Arsenal", "short_name": null }));

        let entries = unique_entries(&keys(), &teams(), &arsenal);

        assert_eq!(
            entries,
            vec![UniqueEntry {
                field: "name".to_string(),
                key: "mock_epl:teams:unique:name".to_string(),
                value: "Arsenal".to_string(),
            }]
        );
    }

    #[test]
    fn test_stale_entries_on_rename() {
        let before = document(json!({ "_id": "t1", "name": "Arsenal", "short_name": "ARS" }));
        let after = document(json!({ "_id": "t1", "name": "Arsenal FC", "short_name": "ARS" }));

        let stale = stale_entries(&keys(), &teams(), &before, Some(&after));

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].field, "name");
        assert_eq!(stale[0].value, "Arsenal");
    }

    #[test]
    fn test_stale_entries_on_delete_release_everything() {
        let before = document(json!({ "_id": "t1", "name": "Arsenal", "short_name": "ARS" }));

        let stale = stale_entries(&keys(), &teams(), &before, None);

        let values: Vec<&str> = stale.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["Arsenal", "ARS"]);
    }

    #[test]
    fn test_unchanged_document_has_no_stale_entries() {
        let same = document(json!({ "_id": "t1", "name": "Arsenal", "short_name": "ARS" }));

        assert!(stale_entries(&keys(), &teams(), &same, Some(&same)).is_empty());
    }
}
