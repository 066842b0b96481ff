use actix_web::{HttpResponse, http::StatusCode};
use derive_more::Display;

/// Closed error set for the workflow/reconciliation core. Everything here is
/// surfaced to the caller; nothing is retried internally.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum CoreError {
    #[display(fmt = "Invalid interval: start must be strictly before end")]
    InvalidInterval,

    /// Wrong state or wrong actor for the requested action. The report is
    /// left unchanged.
    #[display(fmt = "Invalid transition: {}", _0)]
    InvalidTransition(String),

    /// Optimistic concurrency check failed: the report changed underneath the
    /// caller. Re-fetch and retry.
    #[display(fmt = "Stale state: report was modified by someone else, re-fetch and retry")]
    StaleState,

    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "Forbidden: {}", _0)]
    Forbidden(String),
}

impl actix_web::ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            CoreError::InvalidInterval => StatusCode::BAD_REQUEST,
            CoreError::InvalidTransition(_) | CoreError::StaleState => StatusCode::CONFLICT,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}
