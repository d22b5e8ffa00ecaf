// ============================================================================
// Api - Request-facing operations, envelopes and error rendering
// ============================================================================

pub mod errors;
pub mod handlers;
pub mod responses;

pub use handlers::{Api, ApiResult};
pub use responses::{search_message, DataResponse, ErrorBody};
