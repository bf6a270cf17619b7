//! Account balances

use std::fmt::{Display, Formatter, Result as FmtResult};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Decimals of both the native currency and the asset token
pub const TOKEN_DECIMALS: u32 = 18;

/// Balance of one address, in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Network-native currency
    pub eth: U256,

    /// Asset token
    pub ocn: U256,
}

impl Balance {
    /// Create a balance from base units
    pub fn new(eth: U256, ocn: U256) -> Self {
        Self { eth, ocn }
    }

    /// Whether the address holds no asset token at all
    pub fn has_no_tokens(&self) -> bool {
        self.ocn.is_zero()
    }

    /// Whole asset tokens, rounded down
    pub fn whole_tokens(&self) -> U256 {
        self.ocn / U256::exp10(TOKEN_DECIMALS as usize)
    }

    /// Whole native currency units, rounded down
    pub fn whole_eth(&self) -> U256 {
        self.eth / U256::exp10(TOKEN_DECIMALS as usize)
    }
}

impl Display for Balance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} OCN / {} ETH", format_tokens(self.ocn), format_tokens(self.eth))
    }
}

/// Format base units as a decimal token amount with two fraction digits
pub fn format_tokens(amount: U256) -> String {
    let unit = U256::exp10(TOKEN_DECIMALS as usize);
    let whole = amount / unit;
    let cents = (amount % unit) / U256::exp10(TOKEN_DECIMALS as usize - 2);
    format!("{}.{:02}", whole, cents.as_u64())
}
