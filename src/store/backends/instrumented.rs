use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::metrics::Metrics;
use crate::store::core::{
    DeleteResult, Document, DocumentStore, Filter, OpContext, Pipeline, StoreError, UpdateResult,
};

// ============================================================================
// InstrumentedStore - Metrics and tracing decorator for any DocumentStore
// ============================================================================
//
// Every call is timed and counted under the wrapped backend's tag. Filters
// and pipelines are logged in their MongoDB JSON form at debug level.
//
// ============================================================================

pub struct InstrumentedStore<S> {
    inner: S,
    metrics: Arc<Metrics>,
}

impl<S: DocumentStore> InstrumentedStore<S> {
    pub fn new(inner: S, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }

    async fn observe<T, F>(
        &self,
        operation: &'static str,
        collection: &str,
        call: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let started = Instant::now();
        let result = call.await;
        let elapsed = started.elapsed().as_secs_f64();

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.label(),
        };
        self.metrics.record_store_operation(
            self.inner.backend_tag(),
            operation,
            collection,
            outcome,
            elapsed,
        );

        match &result {
            Ok(_) => tracing::trace!(
                backend = self.inner.backend_tag(),
                operation,
                collection = %collection,
                elapsed_ms = elapsed * 1000.0,
                "Store operation completed"
            ),
            // Expected signals; the domain decides what they mean
            Err(e) if e.is_no_documents() || e.is_duplicate_key() => tracing::debug!(
                backend = self.inner.backend_tag(),
                operation,
                collection = %collection,
                outcome,
                "Store operation signalled"
            ),
            Err(e) => tracing::warn!(
                backend = self.inner.backend_tag(),
                operation,
                collection = %collection,
                error = %e,
                "⚠️ Store operation failed"
            ),
        }

        result
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for InstrumentedStore<S> {
    fn backend_tag(&self) -> &'static str {
        self.inner.backend_tag()
    }

    async fn insert_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        document: Document,
    ) -> Result<String, StoreError> {
        self.observe(
            "insert_one",
            collection,
            self.inner.insert_one(ctx, collection, document),
        )
        .await
    }

    async fn find_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<Document, StoreError> {
        tracing::debug!(collection = %collection, filter = %filter.to_native(), "find_one");
        self.observe("find_one", collection, self.inner.find_one(ctx, collection, filter))
            .await
    }

    async fn find_many(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(collection = %collection, filter = %filter.to_native(), "find_many");
        let documents = self
            .observe("find_many", collection, self.inner.find_many(ctx, collection, filter))
            .await?;
        self.metrics
            .record_documents_returned("find_many", collection, documents.len());
        Ok(documents)
    }

    async fn replace_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
        replacement: Document,
    ) -> Result<UpdateResult, StoreError> {
        self.observe(
            "replace_one",
            collection,
            self.inner.replace_one(ctx, collection, filter, replacement),
        )
        .await
    }

    async fn delete_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError> {
        self.observe(
            "delete_one",
            collection,
            self.inner.delete_one(ctx, collection, filter),
        )
        .await
    }

    async fn aggregate(
        &self,
        ctx: &OpContext,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(
            collection = %collection,
            pipeline = %pipeline.to_native(),
            "aggregate"
        );
        let documents = self
            .observe("aggregate", collection, self.inner.aggregate(ctx, collection, pipeline))
            .await?;
        self.metrics
            .record_documents_returned("aggregate", collection, documents.len());
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backends::MemoryStore;
    use crate::store::core::{CollectionSpec, Schema};
    use serde_json::{json, Value};

    fn store() -> (InstrumentedStore<MemoryStore>, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        let schema = Schema::new().collection(CollectionSpec::new("teams").unique("name"));
        (
            InstrumentedStore::new(MemoryStore::new(schema), metrics.clone()),
            metrics,
        )
    }

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn counter(metrics: &Metrics, labels: &[(&str, &str)]) -> f64 {
        metrics
            .registry()
            .gather()
            .iter()
            .filter(|family| family.name() == "store_operations_total")
            .flat_map(|family| family.metric.iter())
            .filter(|metric| {
                labels.iter().all(|(name, value)| {
                    metric
                        .label
                        .iter()
                        .any(|pair| pair.name() == *name && pair.value() == *value)
                })
            })
            .map(|metric| metric.counter.value.unwrap_or(0.0))
            .sum()
    }

    #[tokio::test]
    async fn test_outcomes_are_counted_by_label() {
        let (store, metrics) = store();
        let ctx = OpContext::background();

        store
            .insert_one(&ctx, "teams", document(json!({ "name": "Fulham" })))
            .await
            .unwrap();
        let duplicate = store
            .insert_one(&ctx, "teams", document(json!({ "name": "Fulham" })))
            .await;

        assert!(duplicate.unwrap_err().is_duplicate_key());
        assert_eq!(counter(&metrics, &[("operation", "insert_one"), ("outcome", "ok")]), 1.0);
        assert_eq!(
            counter(&metrics, &[("operation", "insert_one"), ("outcome", "duplicate_key")]),
            1.0
        );
        assert_eq!(counter(&metrics, &[("backend", "memory")]), 2.0);
    }

    #[tokio::test]
    async fn test_decorator_is_transparent() {
        let (store, _) = store();
        let ctx = OpContext::background();
        let id = store
            .insert_one(&ctx, "teams", document(json!({ "name": "Brentford" })))
            .await
            .unwrap();

        let found = store.find_one(&ctx, "teams", &Filter::id(&id)).await.unwrap();

        assert_eq!(found["name"], json!("Brentford"));
        assert_eq!(store.backend_tag(), "memory");
    }
}
