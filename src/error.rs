//! Error types for GoodData API operations.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during GoodData API operations.
///
/// The type is `Clone` so a deferred result can hand out its cached
/// failure on every call. Non-cloneable causes are kept behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum GoodDataError {
    /// Configuration is missing or incomplete.
    #[error("GoodData configuration required: {0}")]
    ConfigMissing(String),

    /// An argument failed validation before any request was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity not found.
    #[error("{entity_type} '{id}' not found")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// API request failed with a 4xx or 5xx status.
    #[error("GoodData API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
        request_id: Option<String>,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[source] Arc<reqwest::Error>),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[source] Arc<serde_json::Error>),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// An asynchronous operation did not finish within the poll ceiling.
    #[error("Polling {uri} timed out after {elapsed:?}")]
    PollTimeout { uri: String, elapsed: Duration },

    /// Polling was cancelled by the caller.
    #[error("Polling {uri} was cancelled")]
    PollCancelled { uri: String },

    /// A platform operation failed.
    #[error("{message}")]
    Operation {
        operation: &'static str,
        message: String,
        #[source]
        source: Option<Box<GoodDataError>>,
    },
}

impl GoodDataError {
    /// Build an operation failure with no underlying cause.
    pub fn operation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Operation {
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// Build an operation failure wrapping a lower-level error.
    pub fn operation_caused_by(
        operation: &'static str,
        message: impl Into<String>,
        cause: GoodDataError,
    ) -> Self {
        Self::Operation {
            operation,
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => *status_code,
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            Self::RateLimited { .. } => Some(429),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Whether this is a 4xx API error.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_some_and(|c| (400..500).contains(&c))
    }

    /// Whether this is a 5xx API error.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_some_and(|c| (500..600).contains(&c))
    }

    /// Map a 404 API error to [`GoodDataError::NotFound`].
    pub(crate) fn not_found_as(self, entity_type: &'static str, id: &str) -> Self {
        match self {
            Self::ApiError {
                status_code: Some(404),
                ..
            } => Self::NotFound {
                entity_type,
                id: id.to_string(),
            },
            other => other,
        }
    }

    /// The innermost cause of a chain of operation errors.
    pub fn root_cause(&self) -> &GoodDataError {
        let mut current = self;
        while let Self::Operation {
            source: Some(inner),
            ..
        } = current
        {
            current = inner;
        }
        current
    }
}

impl From<reqwest::Error> for GoodDataError {
    fn from(e: reqwest::Error) -> Self {
        Self::HttpError(Arc::new(e))
    }
}

impl From<serde_json::Error> for GoodDataError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(Arc::new(e))
    }
}

/// Result type alias for GoodData operations.
pub type Result<T> = core::result::Result<T, GoodDataError>;
