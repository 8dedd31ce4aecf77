use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use diesel::result::Error as DieselError;
use std::error::Error as StdError;
use thiserror::Error;

use crate::logging::NoteEvent;
use crate::models::ValidationErrors;
use crate::views;

/// Centralized application error type shared by the store, the extractors
/// and the request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    // Validation errors
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    // Resource errors
    #[error("note not found")]
    NotFound,

    // Request parsing errors
    #[error("invalid form submission: {0}")]
    InvalidForm(String),

    #[error("unsupported media type: expected application/x-www-form-urlencoded")]
    UnsupportedMediaType,

    #[error("unsupported method override: {0}")]
    UnsupportedMethod(String),

    // Database errors
    #[error("database error")]
    Database(#[source] DieselError),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("migration error: {0}")]
    Migration(String),
}

impl AppError {
    /// Maps a Diesel error to an appropriate AppError variant
    pub fn from_diesel(error: DieselError) -> Self {
        match error {
            DieselError::NotFound => AppError::NotFound,
            other => AppError::Database(other),
        }
    }

    /// Determines the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client errors
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,

            // 5xx Server errors
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// In release builds only client errors carry their own message
    fn should_expose_details(&self) -> bool {
        cfg!(debug_assertions) || self.status_code().is_client_error()
    }

    /// Gets the user-facing error message
    fn user_message(&self) -> String {
        if self.should_expose_details() {
            return match self {
                AppError::NotFound => "The note you were looking for doesn't exist.".to_string(),
                other => other.to_string(),
            };
        }

        match self {
            AppError::Pool(_) => "service temporarily unavailable".to_string(),
            _ => "something went wrong on our side".to_string(),
        }
    }

    fn error_details(&self) -> Option<String> {
        if !self.should_expose_details() {
            return None;
        }

        match self {
            AppError::Database(err) => Some(format!("database: {err}")),
            AppError::Pool(err) => Some(format!("connection pool: {err}")),
            AppError::Migration(err) => Some(format!("migration: {err}")),
            _ => None,
        }
    }

    /// Internal errors are logged in full even when the page hides them
    fn log_error(&self) {
        match self.status_code() {
            code if code.is_client_error() => match self {
                AppError::NotFound => {
                    crate::log_note_event!(
                        NoteEvent::NotFound,
                        status_code = %code,
                        "Note not found"
                    );
                }
                AppError::Validation(errors) => {
                    crate::log_note_event!(
                        NoteEvent::ValidationFailed,
                        errors = %errors,
                        status_code = %code,
                        "Note validation failed"
                    );
                }
                _ => {
                    tracing::warn!(
                        error = %self,
                        status_code = %code,
                        "Client error"
                    );
                }
            },
            code if code.is_server_error() => {
                tracing::error!(
                    error = %self,
                    status_code = %code,
                    source = ?self.source(),
                    "Server error"
                );
            }
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log_error();

        let status = self.status_code();
        let page = views::error_page(
            status,
            &self.user_message(),
            self.error_details().as_deref(),
        );

        (status, Html(page)).into_response()
    }
}

impl From<DieselError> for AppError {
    fn from(error: DieselError) -> Self {
        AppError::from_diesel(error)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}
