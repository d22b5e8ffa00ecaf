use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::DomainError;

use super::responses::ErrorBody;

// ============================================================================
// DomainError -> HTTP
// ============================================================================

const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong, please try again later";

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::AlreadyExists { .. } => StatusCode::CONFLICT,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            DomainError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());

        match self {
            DomainError::Validation(err) => response.json(err),
            DomainError::AlreadyExists { collection, .. } => {
                let message = match collection.as_str() {
                    "teams" => "This team already exists",
                    _ => "This record already exists",
                };
                response.json(ErrorBody::new(format!("{}/already-exists", collection), message))
            }
            DomainError::NotFound { entity, .. } => response.json(ErrorBody::new(
                "NotFound",
                format!("That {} does not exist", entity),
            )),
            DomainError::Timeout | DomainError::Cancelled => {
                response.json(ErrorBody::new("unavailable", self.to_string()))
            }
            DomainError::Internal(err) => {
                tracing::error!(error = %err, "❌ Internal store error");
                response.json(ErrorBody::new("internal_error", INTERNAL_ERROR_MESSAGE))
            }
        }
    }
}
