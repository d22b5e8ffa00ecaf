// ============================================================================
// Store Engine - Query evaluation shared by the bundled backends
// ============================================================================

pub mod eval;
pub mod text;
pub mod values;

pub use eval::{Engine, Snapshot};
pub use text::TextQuery;
