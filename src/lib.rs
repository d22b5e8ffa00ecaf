// ============================================================================
// epl_fixtures - Team/Fixture store, joined reads and combined text search
// ============================================================================
//
// - store:   DocumentStore trait, pipeline engine, memory/Redis backends
// - domain:  TeamStore, FixtureStore, SearchAggregator
// - api:     request-facing operations and response envelopes
// - metrics: Prometheus registry and the /metrics server
//
// ============================================================================

pub mod api;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod seed;
pub mod store;
