//! Error types and handling for Formentor
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Formentor operations
pub type Result<T> = std::result::Result<T, FormentorError>;

/// Main error type for Formentor
#[derive(Debug, Error)]
pub enum FormentorError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Authentication/authorization errors against the cloud account
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// We Connect API errors (unexpected status, malformed payload)
    #[error("API error: {message}")]
    Api { message: String },

    /// Network-related errors (DNS, TLS, connection refused)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// The account holds no vehicles, so there is nothing to bridge
    #[error("No vehicles found in this account")]
    NoVehicles,

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl FormentorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        FormentorError::Config {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        FormentorError::Auth {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        FormentorError::Api {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        FormentorError::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        FormentorError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        FormentorError::Web {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        FormentorError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        FormentorError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        FormentorError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for FormentorError {
    fn from(err: std::io::Error) -> Self {
        FormentorError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for FormentorError {
    fn from(err: serde_yaml::Error) -> Self {
        FormentorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FormentorError {
    fn from(err: serde_json::Error) -> Self {
        FormentorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for FormentorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FormentorError::timeout(err.to_string())
        } else if err.is_connect() {
            FormentorError::network(err.to_string())
        } else {
            FormentorError::api(err.to_string())
        }
    }
}

impl From<chrono::ParseError> for FormentorError {
    fn from(err: chrono::ParseError) -> Self {
        FormentorError::validation("datetime", &err.to_string())
    }
}
