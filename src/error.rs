//! CDC Protocol error types

use thiserror::Error;

/// CDC Protocol error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialized bundle carries an unexpected format tag
    #[error("Format error: expected '{expected}', found '{found}'")]
    Format { expected: String, found: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML configuration parse error
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for CDC Protocol operations
pub type Result<T> = std::result::Result<T, Error>;
