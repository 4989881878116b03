//! Error types for the plan graph
//!
//! Only data-unavailable conditions ever reach the host as a visible state.
//! Everything here is either logged and degraded, or collected into a
//! build report.

use thiserror::Error;

/// Failures talking to the document store, the content probe endpoint,
/// or the detail-view endpoint.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("no authenticated user scope")]
    Unauthenticated,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A record that cannot become a node. Counted, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("{collection} record '{record_id}' is missing required field '{field}'")]
    MissingField {
        collection: &'static str,
        record_id: String,
        field: &'static str,
    },

    #[error("{collection} element {index} does not decode: {reason}")]
    Malformed {
        collection: &'static str,
        index: usize,
        reason: String,
    },
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type SourceResult<T> = Result<T, SourceError>;
