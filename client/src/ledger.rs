//! Ledger client interface
//!
//! Everything this crate needs from the ledger node: the account list,
//! balances, the test faucet, DID anchoring and waiting on confirmations.

use async_trait::async_trait;
use ethers::types::H256;
use mantaray_core::{Address, Balance, Did, User};

use crate::error::Result;

/// Transaction hash
pub type TxHash = H256;

/// Wallet and contract operations on the ledger node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Addresses known to the node
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Current balance, always read fresh
    async fn balance(&self, address: Address) -> Result<Balance>;

    /// Ask the faucet for `amount` whole tokens on behalf of the user
    async fn request_tokens(&self, user: &User, amount: u64) -> Result<TxHash>;

    /// Block until the transaction is mined; `true` when it succeeded
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<bool>;

    /// Register the DID on chain with the metadata checksum and its location
    async fn anchor_did(
        &self,
        owner: &User,
        did: &Did,
        checksum: [u8; 32],
        value: &str,
    ) -> Result<TxHash>;
}
