use std::fmt;

use thiserror::Error;

use crate::api::types::{Counters, Cursor, ResumePoint, User};

#[derive(Debug, Error)]
pub enum FollowbackError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("API error: {0}")]
    ApiError(#[from] ApiError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    TomlDeserializeError(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Follow run aborted")]
    RunAborted,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,
    #[error("Failed to read config file '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to write config file '{path}': {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file format: {source}")]
    InvalidFormat { source: toml::de::Error },
    #[error("Missing required field in config: {field}")]
    MissingField { field: String },
    #[error("Failed to open editor '{editor}': {source}")]
    EditorFailed {
        editor: String,
        source: std::io::Error,
    },
}

/// Failures of the Twitter transport.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API credentials")]
    InvalidCredentials,
    #[error("Rate limited by Twitter API")]
    RateLimited,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid API response (status {status}): {body}")]
    InvalidResponse { status: u16, body: String },
    #[error("Could not decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A malformed acquisition request. Raised before any network access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("target count must not be negative (got {0})")]
    NegativeTarget(i64),
    #[error("skip count must not be negative (got {0})")]
    NegativeSkip(i64),
    #[error("page size must be between 1 and {max} (got {got})")]
    PageSize { got: i64, max: i64 },
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("cursor {0} marks an exhausted follower stream")]
    ExhaustedCursor(Cursor),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotaError {
    #[error("followers/list quota exhausted ({remaining} remaining, resets at {reset})")]
    Exhausted { remaining: i64, reset: i64 },
    #[error("rate limit status has no entry for {resource}")]
    StatusUnavailable { resource: String },
}

/// What can go wrong while asking the gate for permission to fetch.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Quota(#[from] QuotaError),
    #[error(transparent)]
    Transport(#[from] ApiError),
}

#[derive(Debug)]
pub enum AcquireError<E> {
    Validation(ValidationError),
    Quota(QuotaError),
    Transport(ApiError),
    Callback(E),
}

impl<E: fmt::Display> fmt::Display for AcquireError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Validation(e) => write!(f, "Invalid request: {e}"),
            AcquireError::Quota(e) => write!(f, "Quota error: {e}"),
            AcquireError::Transport(e) => write!(f, "Transport error: {e}"),
            AcquireError::Callback(e) => write!(f, "Eligible-user callback failed: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for AcquireError<E> {}

impl<E> From<ValidationError> for AcquireError<E> {
    fn from(err: ValidationError) -> Self {
        AcquireError::Validation(err)
    }
}

impl<E> From<QuotaError> for AcquireError<E> {
    fn from(err: QuotaError) -> Self {
        AcquireError::Quota(err)
    }
}

impl<E> From<ApiError> for AcquireError<E> {
    fn from(err: ApiError) -> Self {
        AcquireError::Transport(err)
    }
}

impl<E> From<GateError> for AcquireError<E> {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Quota(e) => AcquireError::Quota(e),
            GateError::Transport(e) => AcquireError::Transport(e),
        }
    }
}

/// A failed run together with everything it achieved before failing.
#[derive(Debug)]
pub struct AcquireFailure<E> {
    pub error: AcquireError<E>,
    pub collected: Vec<User>,
    pub counters: Counters,
    /// `None` only when the request never passed validation.
    pub resume: Option<ResumePoint>,
}

impl<E: fmt::Display> fmt::Display for AcquireFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for AcquireFailure<E> {}

pub type Result<T> = std::result::Result<T, FollowbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::HomeDirNotFound;
        assert_eq!(format!("{error}"), "Home directory not found");

        let error = ConfigError::MissingField {
            field: "test_field".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "Missing required field in config: test_field"
        );
    }

    #[test]
    fn test_api_error_display() {
        let error = ApiError::InvalidCredentials;
        assert_eq!(format!("{error}"), "Invalid API credentials");

        let error = ApiError::InvalidResponse {
            status: 403,
            body: "nope".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "Invalid API response (status 403): nope"
        );
    }

    #[test]
    fn test_followback_error_display() {
        let error = FollowbackError::ConfigError(ConfigError::HomeDirNotFound);
        assert_eq!(
            format!("{error}"),
            "Configuration error: Home directory not found"
        );

        let error = FollowbackError::ApiError(ApiError::RateLimited);
        assert_eq!(format!("{error}"), "API error: Rate limited by Twitter API");
    }

    #[test]
    fn test_gate_error_converts_into_acquire_error() {
        let err: AcquireError<std::io::Error> = GateError::Quota(QuotaError::Exhausted {
            remaining: 0,
            reset: 1_700_000_000,
        })
        .into();
        assert!(matches!(
            err,
            AcquireError::Quota(QuotaError::Exhausted { remaining: 0, .. })
        ));

        let err: AcquireError<std::io::Error> =
            GateError::Transport(ApiError::InvalidCredentials).into();
        assert!(matches!(
            err,
            AcquireError::Transport(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_acquire_failure_displays_inner_error() {
        let failure: AcquireFailure<String> = AcquireFailure {
            error: AcquireError::Callback("boom".to_string()),
            collected: vec![],
            counters: Counters::default(),
            resume: None,
        };
        assert_eq!(format!("{failure}"), "Eligible-user callback failed: boom");
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let error: FollowbackError = io_error.into();
        assert!(matches!(error, FollowbackError::IoError(_)));

        let config_error = ConfigError::HomeDirNotFound;
        let error: FollowbackError = config_error.into();
        assert!(matches!(error, FollowbackError::ConfigError(_)));
    }
}
