// ============================================================================
// Store - Document persistence
// ============================================================================
//
// Layered leaves-first:
// - core:     documents, filters, pipelines, the DocumentStore trait
// - engine:   filter/pipeline evaluation and text scoring
// - backends: in-memory, Redis, and the instrumentation decorator
//
// ============================================================================

pub mod backends;
pub mod core;
pub mod engine;

pub use backends::{InstrumentedStore, MemoryStore, RedisStore};
pub use self::core::{
    decode, encode, CancelHandle, CollectionSpec, DeleteResult, Document, DocumentStore, Filter,
    OpContext, Pipeline, Schema, Stage, StoreError, TextIndex, UpdateResult,
};
