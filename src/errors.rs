use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use async_graphql::ErrorExtensions;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated(_) => "NOT_AUTHENTICATED",
            AppError::NotAuthorized(_) => "NOT_AUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyInitialized(_) => "ALREADY_INITIALIZED",
            AppError::InvalidToken(_) => "INVALID_TOKEN",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::RemoteUnavailable(_) => "REMOTE_UNAVAILABLE",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::NotAuthenticated(m)
            | AppError::NotAuthorized(m)
            | AppError::NotFound(m)
            | AppError::AlreadyInitialized(m)
            | AppError::InvalidToken(m)
            | AppError::ValidationError(m)
            | AppError::RemoteUnavailable(m)
            | AppError::DatabaseError(m)
            | AppError::InternalError(m) => m,
        }
    }

    /// Rebuilds an error from the code a remote service attached to it.
    /// Unknown codes become `InternalError`.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "NOT_AUTHENTICATED" => AppError::NotAuthenticated(message),
            "NOT_AUTHORIZED" => AppError::NotAuthorized(message),
            "NOT_FOUND" => AppError::NotFound(message),
            "ALREADY_INITIALIZED" => AppError::AlreadyInitialized(message),
            "INVALID_TOKEN" => AppError::InvalidToken(message),
            "VALIDATION_ERROR" => AppError::ValidationError(message),
            "REMOTE_UNAVAILABLE" => AppError::RemoteUnavailable(message),
            "DATABASE_ERROR" => AppError::DatabaseError(message),
            _ => AppError::InternalError(message),
        }
    }

    /// Message suitable for showing to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotAuthenticated(_) => "You must be logged in to do that.".to_string(),
            AppError::NotAuthorized(_) => {
                "You do not have permission to perform this action.".to_string()
            }
            AppError::NotFound(what) => format!("Not found: {}", what),
            AppError::AlreadyInitialized(_) => {
                "Admin initialization is already complete. Another user has claimed the admin role."
                    .to_string()
            }
            AppError::InvalidToken(_) => {
                "Invalid tokens provided. Please check your tokens and try again.".to_string()
            }
            AppError::ValidationError(msg) => msg.clone(),
            AppError::RemoteUnavailable(_) => {
                "The service is not reachable right now. Please try again.".to_string()
            }
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated(_) | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyInitialized(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::RemoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.status_code().as_u16(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<async_graphql::Error> for AppError {
    fn from(err: async_graphql::Error) -> Self {
        AppError::InternalError(err.message)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::RemoteUnavailable(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::RemoteUnavailable("request timed out".to_string())
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.message()).extend_with(|_err, e| {
            e.set("code", self.error_code());
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;
