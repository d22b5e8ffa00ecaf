// ============================================================================
// Team Domain
// ============================================================================
//
// - model: Team, NewTeam, TeamUpdate
// - store: TeamStore and the TeamLookup capability it provides
//
// ============================================================================

pub mod model;
pub mod store;

// Re-export for convenience
pub use model::*;
pub use store::*;
