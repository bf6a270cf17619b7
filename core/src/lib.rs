//! # Mantaray Core
//!
//! Core data structures for Mantaray: simulated users of a data exchange,
//! the asset records they publish, the queries used to search them and the
//! configuration shared by every client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod registry;

/// Re-export common types for ease of use
pub use config::{DeploymentType, MantarayConfig};
pub use error::{CoreError, Result};
pub use models::{
    AssetRecord, Balance, Credential, Ddo, Did, Metadata, MetadataBase, Role, ServiceDescriptor,
    User,
};
pub use query::{AssetQuery, FilterKind, QueryFilter, Sort, SortDirection};
pub use registry::{
    build_users, filter_unlocked, CredentialSource, NameGenerator, PasswordMap, UserRegistry,
};

/// Ethereum address type used for every network account
pub use ethers::types::Address;

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse an address string, accepting any hex case with or without `0x`
pub fn parse_address(value: &str) -> Result<Address> {
    let trimmed = value.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(hex_part)
        .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", value, e)))?;
    if bytes.len() != 20 {
        return Err(CoreError::InvalidAddress(format!(
            "{}: expected 20 bytes, got {}",
            value,
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}
