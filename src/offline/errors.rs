use actix_web::error::BlockingError;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum OfflineError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Invalid(String),
    NotFound(&'static str),
}

impl fmt::Display for OfflineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfflineError::Io(e) => write!(f, "I/O error: {e}"),
            OfflineError::Json(e) => write!(f, "JSON error: {e}"),
            OfflineError::Csv(e) => write!(f, "CSV error: {e}"),
            OfflineError::Invalid(msg) => write!(f, "Invalid document: {msg}"),
            OfflineError::NotFound(what) => write!(f, "{what} not found"),
        }
    }
}

impl std::error::Error for OfflineError {}

impl ResponseError for OfflineError {
    fn status_code(&self) -> StatusCode {
        match self {
            OfflineError::Json(_) | OfflineError::Invalid(_) => StatusCode::BAD_REQUEST,
            OfflineError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}

impl From<std::io::Error> for OfflineError {
    fn from(e: std::io::Error) -> Self {
        OfflineError::Io(e)
    }
}

impl From<serde_json::Error> for OfflineError {
    fn from(e: serde_json::Error) -> Self {
        OfflineError::Json(e)
    }
}

impl From<BlockingError> for OfflineError {
    fn from(e: BlockingError) -> Self {
        OfflineError::Io(std::io::Error::other(e.to_string()))
    }
}

impl From<csv::Error> for OfflineError {
    fn from(e: csv::Error) -> Self {
        OfflineError::Csv(e)
    }
}
