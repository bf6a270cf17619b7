//! Simulated users of the network
//!
//! A user pairs a ledger address with a display name, a role and, when one
//! is known, the credential that unlocks the account on the node.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Role a simulated user plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Consumer of data assets
    #[serde(rename = "Data Scientist")]
    DataScientist,

    /// Provider of data assets
    #[serde(rename = "Data Owner")]
    DataOwner,
}

impl Role {
    /// Role for the account at `index` in the ledger's account list
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Role::DataScientist
        } else {
            Role::DataOwner
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Role::DataScientist => "Data Scientist",
            Role::DataOwner => "Data Owner",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

/// Password that unlocks an account on the node
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a password; blank passwords are treated as absent
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        if password.trim().is_empty() {
            None
        } else {
            Some(Credential(password))
        }
    }

    /// The password itself, for handing to the node
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Credential(***)")
    }
}

/// A simulated actor on the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
    role: Role,
    address: Address,
    credential: Option<Credential>,
}

impl User {
    /// Create a user with every field set
    pub fn new(
        name: impl Into<String>,
        role: Role,
        address: Address,
        credential: Option<Credential>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            address,
            credential,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Ledger address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Credential, if one is known
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Whether the account can be unlocked
    pub fn is_unlocked(&self) -> bool {
        self.credential.is_some()
    }

    /// Credential, or `MissingCredential` for locked users
    pub fn require_credential(&self) -> Result<&Credential> {
        self.credential
            .as_ref()
            .ok_or(CoreError::MissingCredential(self.address))
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let lock = if self.is_unlocked() { "unlocked" } else { "locked" };
        write!(f, "{:<20} {:<15} {:?} ({})", self.name, self.role, self.address, lock)
    }
}
