// ============================================================================
// Store Core - Generic Document Store Abstractions
// ============================================================================
//
// Nothing in here knows about teams or fixtures:
// - documents and identity encoding
// - filters and aggregation pipelines (typed, renderable to MongoDB JSON)
// - the DocumentStore trait and its error signals
// - operation contexts (cancellation/deadline)
// - collection schemas (unique + text indexes)
//
// ============================================================================

pub mod backend;
pub mod context;
pub mod document;
pub mod errors;
pub mod filter;
pub mod pipeline;
pub mod schema;

pub use backend::{DeleteResult, DocumentStore, UpdateResult};
pub use context::{CancelHandle, OpContext};
pub use document::{decode, document_id, encode, new_id, Document, ID_FIELD};
pub use errors::StoreError;
pub use filter::Filter;
pub use pipeline::{Pipeline, Stage};
pub use schema::{CollectionSpec, Schema, TextIndex};
