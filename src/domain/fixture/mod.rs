// ============================================================================
// Fixture Domain
// ============================================================================
//
// - model:   read model, write model, requests and the status filter
// - queries: aggregation pipelines for joined reads and text search
// - store:   FixtureStore (create/update/read/list/search/delete)
//
// ============================================================================

pub mod model;
pub mod queries;
pub mod store;

// Re-export for convenience
pub use model::{Fixture, FixtureStatus, FixtureUpdate, NewFixture};
pub use store::*;
