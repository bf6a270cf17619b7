//! Ledger client for the keeper node
//!
//! Talks JSON-RPC to the node through an ethers `Provider<Http>`. Accounts
//! are node-managed: transactions are sent with `eth_sendTransaction` from
//! an account unlocked with its password, so nothing is signed locally.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::U256;
use log::{debug, info, warn};
use mantaray_core::{parse_address, Address, Balance, CoreError, Did, MantarayConfig, User};
use serde::Deserialize;
use tokio::time::{sleep, Instant};

use crate::error::{to_provider_error, ClientError, Result};
use crate::ledger::{LedgerClient, TxHash};

abigen!(
    Dispenser,
    r#"[
        function requestTokens(uint256 amount) external returns (bool)
    ]"#
);

abigen!(
    OceanToken,
    r#"[
        function balanceOf(address owner) external view returns (uint256)
    ]"#
);

abigen!(
    DidRegistry,
    r#"[
        function registerAttribute(bytes32 did, bytes32 checksum, string value) external
    ]"#
);

/// Network name used in artifact file names
pub fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        8995 => "nile",
        8996 => "spree",
        846353 => "pacific",
        _ => "development",
    }
}

#[derive(Debug, Deserialize)]
struct Artifact {
    address: String,
}

/// Deployed contract addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Test token faucet
    pub dispenser: Address,

    /// Asset token
    pub token: Address,

    /// DID registry
    pub did_registry: Address,
}

impl ContractAddresses {
    /// Read `{Contract}.{network}.json` artifacts from `dir`
    pub fn from_artifacts(dir: &Path, network: &str) -> Result<Self> {
        Ok(Self {
            dispenser: read_artifact(dir, "Dispenser", network)?,
            token: read_artifact(dir, "OceanToken", network)?,
            did_registry: read_artifact(dir, "DIDRegistry", network)?,
        })
    }
}

fn read_artifact(dir: &Path, contract: &str, network: &str) -> Result<Address> {
    let path = dir.join(format!("{}.{}.json", contract, network));
    let text = std::fs::read_to_string(&path)
        .map_err(|e| CoreError::Config(format!("Cannot read artifact {}: {}", path.display(), e)))?;
    let artifact: Artifact = serde_json::from_str(&text)?;
    debug!("{} deployed at {} on {}", contract, artifact.address, network);
    Ok(parse_address(&artifact.address)?)
}

/// Ledger client backed by a JSON-RPC node
#[derive(Debug, Clone)]
pub struct KeeperClient {
    /// Node provider
    provider: Arc<Provider<Http>>,

    /// Contract addresses
    contracts: ContractAddresses,

    /// Time between receipt polls
    poll_interval: Duration,

    /// Longest wait for a receipt
    confirmation_timeout: Duration,
}

impl KeeperClient {
    /// Create a client over an existing provider
    pub fn new(
        provider: Provider<Http>,
        contracts: ContractAddresses,
        poll_interval: Duration,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            contracts,
            poll_interval,
            confirmation_timeout,
        }
    }

    /// Connect to the configured node and load the contract artifacts for its network
    pub async fn connect(config: &MantarayConfig) -> Result<Self> {
        let provider =
            Provider::<Http>::try_from(config.keeper.url.as_str()).map_err(to_provider_error)?;
        let chain_id = provider.get_chainid().await.map_err(to_provider_error)?;
        let network = network_name(chain_id.as_u64());
        info!(
            "Connected to keeper node {} (chain {}, network {})",
            config.keeper.url, chain_id, network
        );

        let contracts = ContractAddresses::from_artifacts(&config.keeper.artifacts_path, network)?;
        Ok(Self::new(provider, contracts, config.poll_interval(), config.confirmation_timeout()))
    }

    /// Contract addresses in use
    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    /// Check that every contract address from the artifacts holds code
    ///
    /// A stale artifacts folder points at addresses with nothing deployed.
    pub async fn verify_contracts(&self) -> Result<()> {
        let contracts = [
            ("Dispenser", self.contracts.dispenser),
            ("OceanToken", self.contracts.token),
            ("DIDRegistry", self.contracts.did_registry),
        ];
        for (name, address) in contracts {
            let code = self
                .provider
                .get_code(address, None)
                .await
                .map_err(to_provider_error)?;
            if code.is_empty() {
                return Err(ClientError::Ledger(format!(
                    "No {} contract deployed at {:?}",
                    name, address
                )));
            }
            debug!("{} at {:?} has {} bytes of code", name, address, code.len());
        }
        Ok(())
    }

    /// Unlock a node-managed account with the user's credential
    async fn unlock(&self, user: &User) -> Result<()> {
        let credential = user.require_credential()?;
        let unlocked: bool = self
            .provider
            .request(
                "personal_unlockAccount",
                (user.address(), credential.expose(), Option::<u64>::None),
            )
            .await
            .map_err(to_provider_error)?;

        if !unlocked {
            return Err(ClientError::Ledger(format!("Node refused to unlock {:?}", user.address())));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for KeeperClient {
    async fn accounts(&self) -> Result<Vec<Address>> {
        let accounts = self.provider.get_accounts().await.map_err(to_provider_error)?;
        debug!("Node lists {} accounts", accounts.len());
        Ok(accounts)
    }

    async fn balance(&self, address: Address) -> Result<Balance> {
        let eth = self
            .provider
            .get_balance(address, None)
            .await
            .map_err(to_provider_error)?;

        let token = OceanToken::new(self.contracts.token, self.provider.clone());
        let ocn = token
            .balance_of(address)
            .call()
            .await
            .map_err(to_provider_error)?;

        Ok(Balance::new(eth, ocn))
    }

    async fn request_tokens(&self, user: &User, amount: u64) -> Result<TxHash> {
        self.unlock(user).await?;

        let dispenser = Dispenser::new(self.contracts.dispenser, self.provider.clone());
        let call = dispenser
            .request_tokens(U256::from(amount))
            .from(user.address());
        let pending = call
            .send()
            .await
            .map_err(|e| ClientError::Ledger(format!("Faucet request failed: {}", e)))?;

        let tx_hash = pending.tx_hash();
        info!("Requested {} tokens for {:?} (tx {:?})", amount, user.address(), tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<bool> {
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(to_provider_error)?;

            if let Some(receipt) = receipt {
                // Pre-Byzantium receipts carry no status
                let succeeded = receipt.status.map(|s| s.as_u64() == 1).unwrap_or(true);
                if !succeeded {
                    warn!("Transaction {:?} reverted", tx_hash);
                }
                return Ok(succeeded);
            }

            if Instant::now() >= deadline {
                return Err(ClientError::Timeout(format!(
                    "No receipt for {:?} after {:?}",
                    tx_hash, self.confirmation_timeout
                )));
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn anchor_did(
        &self,
        owner: &User,
        did: &Did,
        checksum: [u8; 32],
        value: &str,
    ) -> Result<TxHash> {
        self.unlock(owner).await?;

        let registry = DidRegistry::new(self.contracts.did_registry, self.provider.clone());
        let call = registry
            .register_attribute(did.to_bytes32(), checksum, value.to_string())
            .from(owner.address());
        let pending = call
            .send()
            .await
            .map_err(|e| ClientError::Ledger(format!("Cannot anchor {}: {}", did, e)))?;

        let tx_hash = pending.tx_hash();
        info!("Anchoring {} (tx {:?})", did, tx_hash);
        Ok(tx_hash)
    }
}
