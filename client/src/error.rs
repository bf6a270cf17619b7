//! Error types for the client library

use mantaray_core::CoreError;
use thiserror::Error;

/// Error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Model, query or configuration error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The metadata store rejected an asset
    #[error("Registration error: {0}")]
    Registration(String),

    /// The ledger rejected or failed a transaction
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// No metadata record for the identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ledger node provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Timed out waiting on a remote confirmation
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Convert a provider error to a ClientError
pub fn to_provider_error<E: std::fmt::Display>(err: E) -> ClientError {
    ClientError::Provider(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mantaray_core::Address;

    #[test]
    fn test_core_errors_pass_through() {
        let err: ClientError = CoreError::MissingCredential(Address::zero()).into();
        assert!(matches!(err, ClientError::Core(CoreError::MissingCredential(_))));
        assert_eq!(
            err.to_string(),
            "Missing credential for account 0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_error_display() {
        let not_found = ClientError::NotFound("did:op:1".to_string());
        assert_eq!(not_found.to_string(), "Not found: did:op:1");

        let ledger = ClientError::Ledger("reverted".to_string());
        assert_eq!(ledger.to_string(), "Ledger error: reverted");
    }
}
