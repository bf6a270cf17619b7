//! Account operations
//!
//! Builds the session's users from the ledger's account list and moves
//! test tokens to them through the faucet.

use std::sync::Arc;
use log::{debug, info, warn};
use mantaray_core::{Address, Balance, CredentialSource, NameGenerator, User, UserRegistry};
use rand::Rng;

use crate::error::Result;
use crate::ledger::LedgerClient;

/// Result of funding one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingOutcome {
    /// Funded address
    pub address: Address,

    /// Display name of the user
    pub name: String,

    /// Tokens requested, `None` when the user already held tokens
    pub requested: Option<u64>,

    /// Whether the faucet transaction succeeded
    pub confirmed: bool,
}

/// Account operations over a ledger client
#[derive(Debug)]
pub struct AccountService<L: ?Sized> {
    ledger: Arc<L>,
}

impl<L: ?Sized> Clone for AccountService<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<L: LedgerClient + ?Sized> AccountService<L> {
    /// Create a service over the ledger
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Build the registry from every account the ledger knows
    pub async fn load_users(
        &self,
        credentials: &dyn CredentialSource,
        names: &mut NameGenerator,
    ) -> Result<UserRegistry> {
        let addresses = self.ledger.accounts().await?;
        let registry = UserRegistry::from_addresses(&addresses, credentials, names);
        info!(
            "Loaded {} users, {} with credentials",
            registry.len(),
            registry.unlocked().len()
        );
        Ok(registry)
    }

    /// Current balance, read from the ledger
    pub async fn balance(&self, address: Address) -> Result<Balance> {
        self.ledger.balance(address).await
    }

    /// Request faucet tokens for the user and wait for the transaction
    ///
    /// Returns the receipt's success flag. The balance is not refreshed.
    pub async fn request_tokens(&self, user: &User, amount: u64) -> Result<bool> {
        user.require_credential()?;

        let tx_hash = self.ledger.request_tokens(user, amount).await?;
        let confirmed = self.ledger.wait_for_receipt(tx_hash).await?;
        if confirmed {
            debug!("{} received {} tokens", user.name(), amount);
        } else {
            warn!("Token request for {} was not confirmed", user.name());
        }
        Ok(confirmed)
    }

    /// Give every unlocked user without tokens a random amount up to `max_amount`
    pub async fn fund_users<R: Rng + ?Sized>(
        &self,
        users: &[User],
        max_amount: u64,
        rng: &mut R,
    ) -> Result<Vec<FundingOutcome>> {
        let mut outcomes = Vec::new();

        for user in users.iter().filter(|u| u.is_unlocked()) {
            let balance = self.ledger.balance(user.address()).await?;
            if !balance.has_no_tokens() {
                debug!("{} already holds {}", user.name(), balance);
                outcomes.push(FundingOutcome {
                    address: user.address(),
                    name: user.name().to_string(),
                    requested: None,
                    confirmed: false,
                });
                continue;
            }

            let amount = rng.gen_range(0..=max_amount);
            let confirmed = self.request_tokens(user, amount).await?;
            outcomes.push(FundingOutcome {
                address: user.address(),
                name: user.name().to_string(),
                requested: Some(amount),
                confirmed,
            });
        }

        Ok(outcomes)
    }
}
