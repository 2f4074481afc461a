use thiserror::Error;

/// Error type covering every failure mode of the hub client
#[derive(Error, Debug)]
pub enum HubError {
    /// Transport-level failure (DNS, connect, timeout, body read)
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The hub answered with a non-success status other than 401
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// 401 that survived a refresh-and-retry cycle
    #[error("request was not authorized")]
    Unauthorized,

    /// The refresh endpoint itself rejected us
    #[error("failed to refresh authentication token: {reason}")]
    RefreshFailed { reason: String },

    /// A refresh was needed but no refresh token is stored
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The access token could not be decoded
    #[error("authentication token is invalid: {reason}")]
    InvalidToken { reason: String },

    /// A request body could not be serialized to JSON
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the persistent token store failed
    #[error("token store error: {reason}")]
    Storage { reason: String },

    /// A configuration value is missing or unusable
    #[error("invalid configuration value for '{key}': {reason}")]
    Config { key: String, reason: String },
}

/// Error categories for retry policies and handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Temporary network issues, timeouts - usually retryable
    Network,
    /// Authentication failures that might be fixed by token refresh
    Authentication,
    /// Permission/access denied - not retryable without reconfiguration
    Permission,
    /// Resource not found - generally not retryable
    NotFound,
    /// Validation errors - not retryable without input changes
    Validation,
    /// API service unavailable - retryable with backoff
    ServiceUnavailable,
    /// Configuration errors - not retryable without reconfiguration
    Configuration,
    /// Internal errors in our code - generally not retryable
    Internal,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Authentication | Self::ServiceUnavailable => true,

            Self::Permission
            | Self::NotFound
            | Self::Validation
            | Self::Configuration
            | Self::Internal => false,
        }
    }
}

impl HubError {
    /// Classify the error for retry decisions and logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            HubError::Http(_) => ErrorCategory::Network,
            HubError::Api { status, .. } => match status {
                401 => ErrorCategory::Authentication,
                403 => ErrorCategory::Permission,
                404 => ErrorCategory::NotFound,
                400 | 422 => ErrorCategory::Validation,
                500..=599 => ErrorCategory::ServiceUnavailable,
                _ => ErrorCategory::Internal,
            },
            HubError::Unauthorized
            | HubError::RefreshFailed { .. }
            | HubError::NoRefreshToken
            | HubError::InvalidToken { .. } => ErrorCategory::Authentication,
            HubError::Json(_) | HubError::Storage { .. } => ErrorCategory::Internal,
            HubError::Config { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Result type for hub client operations
pub type HubResult<T> = Result<T, HubError>;
