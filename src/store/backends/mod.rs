// ============================================================================
// Store Backends - DocumentStore implementations
// ============================================================================

pub mod instrumented;
pub mod memory;
pub mod redis_store;

pub use instrumented::InstrumentedStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
