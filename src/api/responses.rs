use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder};
use serde::Serialize;

// ============================================================================
// Response Envelopes
// ============================================================================
//
// Success: {"@type": "...", "message": "...", "data": ...}
// Failure: {"code": "...", "message": "..."} (validation adds "details")
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataResponse<T> {
    #[serde(skip)]
    pub status: StatusCode,
    #[serde(rename = "@type")]
    pub kind: String,
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn ok(kind: impl Into<String>, message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            kind: kind.into(),
            message: message.into(),
            data,
        }
    }

    pub fn created(kind: impl Into<String>, message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(kind, message, data)
        }
    }
}

impl<T: Serialize> Responder for DataResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::build(self.status).json(&self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Quoted, with long queries cut to 20 characters
pub fn search_message(query: &str) -> String {
    let shown = if query.chars().count() > 20 {
        let cut: String = query.chars().take(20).collect();
        format!("{}...", cut)
    } else {
        query.to_string()
    };
    format!("Search results for {:?}", shown)
}
