use async_trait::async_trait;

use super::context::OpContext;
use super::document::Document;
use super::errors::StoreError;
use super::filter::Filter;
use super::pipeline::Pipeline;

// ============================================================================
// DocumentStore - The persistence capability consumed by the domain
// ============================================================================
//
// Implemented by:
// - MemoryStore (in-process engine)
// - RedisStore (hash-per-collection, client-side evaluation)
// - InstrumentedStore (metrics/tracing decorator over either)
//
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short name of the backend, used in logs and metrics
    fn backend_tag(&self) -> &'static str;

    /// Insert a document, returning its `_id` (generated when absent).
    /// Fails with `DuplicateKey` when a unique index rejects it.
    async fn insert_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        document: Document,
    ) -> Result<String, StoreError>;

    /// First matching document, or `NoDocuments`
    async fn find_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<Document, StoreError>;

    async fn find_many(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError>;

    /// Replace the first matching document wholesale, keeping its `_id`
    async fn replace_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
        replacement: Document,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(
        &self,
        ctx: &OpContext,
        collection: &str,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError>;

    async fn aggregate(
        &self,
        ctx: &OpContext,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError>;
}
