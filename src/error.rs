use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while setting up an ingredient pipeline
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// The ingredient parser could not be constructed
    #[error("Parser error: {0}")]
    ParserError(#[from] ParserError),
}

/// Errors reported by an ingredient parser for a single line.
///
/// The pipeline never surfaces these to callers of the list API; every
/// variant ends up as a fallback record with zero confidence.
#[derive(Error, Debug)]
pub enum ParserError {
    /// The parser did not answer within the configured timeout
    #[error("Parser timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP transport failure talking to a remote parser
    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Remote parser answered with a non-success status
    #[error("Parser returned HTTP status {0}")]
    StatusError(u16),

    /// Parser answered, but not with a usable ingredient shape
    #[error("Malformed parser response: {0}")]
    MalformedResponse(String),

    /// Any other parser failure
    #[error("Parsing failed: {0}")]
    Failed(String),

    /// Parser configuration is unusable
    #[error("Invalid parser configuration: {0}")]
    InvalidConfig(String),
}
