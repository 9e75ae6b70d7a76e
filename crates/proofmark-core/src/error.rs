//! Error types for proofmark-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,

    /// A configured word list could not be read.
    #[error("failed to read word list {path}: {source}")]
    WordList {
        /// The path that was configured.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors returned by external collaborator services.
///
/// None of these are fatal to an evaluation: the pipeline turns them into
/// [`SourceNote`](crate::evaluate::SourceNote)s and carries on.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        /// Which service answered.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("{service} returned an unexpected payload: {message}")]
    Decode {
        /// Which service answered.
        service: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The API key environment variable for the correction service is unset.
    #[error("environment variable {var} is not set")]
    MissingApiKey {
        /// Name of the variable that was looked up.
        var: String,
    },
}

/// Result type alias using [`ServiceError`].
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors that abort an evaluation outright.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The input exceeds the configured size limit.
    #[error("input too large: {size} bytes (limit: {limit} bytes)")]
    InputTooLarge {
        /// Size of the rejected input in bytes.
        size: usize,
        /// The configured limit.
        limit: usize,
    },
}

/// Result type alias using [`EvalError`].
pub type EvalResult<T> = Result<T, EvalError>;
