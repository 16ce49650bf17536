//! Application error types and handling.
//!
//! One error enum covers storage, the remote API, wallet flows and the local
//! control API. Control endpoints render it as a structured JSON body.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// Control API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No signed-in user, or the remote API rejected our token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No wallet provider is available to sign with.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// A wallet transaction was rejected or failed to confirm.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// The remote API answered with a non-success status.
    #[error("Remote API error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// HTTP transport error talking to the remote API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::WalletUnavailable(_) => "WALLET_UNAVAILABLE",
            Self::Transaction(_) => "TRANSACTION_FAILED",
            Self::Remote { .. } => "REMOTE_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Url(_) => "URL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Create an unauthorized error for a missing session.
    pub fn not_signed_in() -> Self {
        Self::Unauthorized("No user is signed in".to_string())
    }

    /// Create a wallet-unavailable error for a missing provider.
    pub fn no_wallet() -> Self {
        Self::WalletUnavailable("No wallet provider found. Install a Solana wallet.".to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::WalletUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Transaction(_) | Self::Remote { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Url(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut error_response = ErrorResponse::new(self.error_code(), self.to_string());
        if let Self::Remote { status, .. } = self {
            error_response = error_response.with_details(serde_json::json!({ "upstreamStatus": status }));
        }

        tracing::error!(
            error_code = %self.error_code(),
            status = %status.as_u16(),
            message = %self.to_string(),
            "Control API error"
        );

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
