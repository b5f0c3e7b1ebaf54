//!
//! # Error Handling
//!
//! Two error families live here:
//!
//! * [`AppError`] covers everything that can go wrong while serving a single
//!   request. It implements `actix_web::error::ResponseError`, so handlers can
//!   return it directly and the client receives a JSON body of the form
//!   `{"detail": "..."}`.
//! * [`BootstrapError`] covers failures while assembling and starting the
//!   server. None of these are recoverable; the process entry point returns
//!   them from `main`, which exits non-zero.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all request-level errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized(String),
    /// Malformed or semantically invalid request (HTTP 400).
    BadRequest(String),
    /// Requested resource does not exist or is not visible to the caller (HTTP 404).
    NotFound(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Input validation failure (HTTP 422 Unprocessable Entity).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl AppError {
    fn detail(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => msg,
            // Internals are logged, never echoed to the client.
            AppError::InternalServerError(_) => "Internal server error",
            AppError::DatabaseError(_) => "Database error",
        }
    }
}

/// Converts `AppError` variants into JSON `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status).json(json!({ "detail": self.detail() }))
    }
}

/// `RowNotFound` becomes a 404; every other database failure is a 500.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(error: actix_web::error::BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Fatal errors raised while assembling or starting the server.
#[derive(Debug)]
pub enum BootstrapError {
    /// Settings could not be loaded or failed validation.
    ConfigurationUnavailable(String),
    /// The startup hook failed to create the database schema.
    SchemaInitializationFailure(sqlx::Error),
    /// Two route groups (or a route group and a bootstrap-owned path) claim
    /// overlapping prefixes.
    RouterMountConflict {
        prefix: String,
        existing: String,
    },
    /// The listener could not be bound.
    Bind(std::io::Error),
    /// The running server stopped with an I/O error.
    Server(std::io::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BootstrapError::ConfigurationUnavailable(msg) => {
                write!(f, "Configuration unavailable: {}", msg)
            }
            BootstrapError::SchemaInitializationFailure(err) => {
                write!(f, "Schema initialization failed: {}", err)
            }
            BootstrapError::RouterMountConflict { prefix, existing } => write!(
                f,
                "Router mount conflict: '{}' overlaps already mounted '{}'",
                prefix, existing
            ),
            BootstrapError::Bind(err) => write!(f, "Failed to bind listener: {}", err),
            BootstrapError::Server(err) => write!(f, "Server error: {}", err),
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::SchemaInitializationFailure(err) => Some(err),
            BootstrapError::Bind(err) | BootstrapError::Server(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(error: std::io::Error) -> BootstrapError {
        BootstrapError::Server(error)
    }
}
