// ============================================================================
// Domain Layer - Teams, Fixtures and Search
// ============================================================================
//
// Each entity has its own subdirectory with:
// - Model (records and request types)
// - Store (operations over a DocumentStore)
//
// Shared across entities:
// - Errors (DomainError, ValidationError)
// - Lookup (found / not found outcome of reads by ID)
// - Schema (collection names and indexes)
// - Search (combined team + fixture text search)
//
// This layer only talks to storage through the DocumentStore trait.
//
// ============================================================================

pub mod errors;
pub mod fixture;
pub mod lookup;
pub mod schema;
pub mod search;
pub mod team;

pub use errors::{DomainError, DomainResult, ValidationDetail, ValidationError};
pub use lookup::Lookup;
pub use schema::{epl_schema, FIXTURES_COLLECTION, TEAMS_COLLECTION};
pub use search::{SearchAggregator, SearchResults};
