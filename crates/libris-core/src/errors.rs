//! Application error taxonomy.
//!
//! Every layer returns [`AppError`]: a kind, a client-facing message and an optional
//! server-side detail. The value is only translated into an HTTP response at the axum
//! boundary through [`IntoResponse`], so no layer ever inspects message strings.
//!
//! | Kind | Status | Message sent to the client |
//! |------|--------|----------------------------|
//! | [`ErrorKind::Validation`] | 400 | the violated field rule |
//! | [`ErrorKind::Conflict`] | 409 | which identity already exists |
//! | [`ErrorKind::Authentication`] | 401 | a generic message |
//! | [`ErrorKind::Authorization`] | 403 | a generic message |
//! | [`ErrorKind::NotFound`] | 404 | the missing entity |
//! | [`ErrorKind::Internal`] | 500 | always `Internal server error` |

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::ValidationErrors;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authentication,
    Authorization,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    /// Server-side only. Never serialized into a response.
    pub detail: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Storage, hashing or signing failure. `detail` is logged when the error is
    /// turned into a response and replaced by a generic message for the client.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, INTERNAL_MESSAGE).with_detail(detail)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.message, detail),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::validation(format_validation_errors(&errors))
    }
}

/// Flattens field errors into `field: message` pairs, sorted by field name so the
/// output is stable across runs.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{} is invalid", field),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.kind == ErrorKind::Internal {
            tracing::error!(
                detail = self.detail.as_deref().unwrap_or("none"),
                "Internal error"
            );
        } else if let Some(detail) = &self.detail {
            tracing::debug!(kind = ?self.kind, detail = %detail, "Request rejected");
        }

        let body = Json(json!({
            "error": self.message
        }));

        (status, body).into_response()
    }
}
