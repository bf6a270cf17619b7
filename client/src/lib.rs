//! Client library for Mantaray
//!
//! This library talks to the two external collaborators of the data
//! exchange: the ledger node (accounts, balances, faucet, DID registry) and
//! the metadata store (asset documents and search). The account and asset
//! services build the user registry and the asset query façade on top of
//! them.

pub mod accounts;
pub mod aquarius;
pub mod assets;
pub mod brizo;
pub mod error;
pub mod keeper;
pub mod ledger;
pub mod memory;
pub mod ocean;
pub mod store;

pub use accounts::{AccountService, FundingOutcome};
pub use aquarius::AquariusClient;
pub use assets::AssetService;
pub use brizo::BrizoEndpoints;
pub use error::{ClientError, Result};
pub use keeper::KeeperClient;
pub use ledger::{LedgerClient, TxHash};
pub use memory::InMemoryMetadataStore;
pub use ocean::Ocean;
pub use store::MetadataStore;
