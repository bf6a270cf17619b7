//! Data models for Mantaray
//!
//! This module provides data structures for the simulated actors of the
//! network and for the assets they publish.

mod asset;
mod balance;
mod ddo;
mod user;

pub use asset::{AssetRecord, Did, Metadata, MetadataBase, ServiceDescriptor, ServiceType};
pub use balance::{format_tokens, Balance, TOKEN_DECIMALS};
pub use ddo::{Ddo, DdoService, PublicKey, DDO_CONTEXT};
pub use user::{Credential, Role, User};
