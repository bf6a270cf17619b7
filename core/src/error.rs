//! Error types for the core crate
//!
//! This module provides a consolidated error type for the core crate,
//! wrapping errors from configuration loading, file parsing and model
//! validation.

use ethers::types::Address;
use std::io;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// The user has no credential, so nothing can be signed on their behalf
    #[error("Missing credential for account {0:?}")]
    MissingCredential(Address),

    /// Malformed query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Malformed metadata
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Malformed network address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed decentralized identifier
    #[error("Invalid DID: {0}")]
    InvalidDid(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General error
    #[error("General error: {0}")]
    General(String),
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, CoreError>;

/// Convert a displayable error to an InvalidQuery error
pub fn to_query_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::InvalidQuery(err.to_string())
}

/// Convert a displayable error to a Config error
pub fn to_config_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::Config(err.to_string())
}
