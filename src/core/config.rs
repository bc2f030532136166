use crate::core::address::Address;
use crate::core::domain::Account;
use crate::core::error::VaultError;
use serde::{Deserialize, Serialize};

/// Largest offset for which `10^offset` still fits in a u128.
pub const MAX_DECIMALS_OFFSET: u8 = 38;

/// One-time deposit performed at vault construction.
///
/// The shares it mints go to the pool itself and can never be redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialDeposit {
    pub depositor: Account,
    pub assets: u128,
}

/// Deployment-time vault configuration.
///
/// Validated once by [`crate::vault::ledger::Vault::new`] and immutable
/// afterwards.
///
/// # Examples
///
/// ```
/// use vault_engine::core::config::VaultConfig;
/// use vault_engine::core::domain::Account;
///
/// let config = VaultConfig::new("pool", "USDC")
///     .with_decimals_offset(3)
///     .with_initial_deposit(Account::disclosed("deployer"), 1_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Address of the vault pool. Holds pooled assets and locked shares.
    pub pool: Address,
    /// Identity of the accepted asset token.
    pub asset: String,
    /// Sizes the virtual share term `10^decimals_offset`.
    #[serde(default)]
    pub decimals_offset: u8,
    #[serde(default)]
    pub initial_deposit: Option<InitialDeposit>,
    #[serde(default)]
    pub upgrade_authority: Option<Address>,
    /// Upper bound on `total_assets` reported through `max_deposit`.
    #[serde(default)]
    pub deposit_cap: Option<u128>,
    /// When false the `max_*` hooks are advisory only.
    #[serde(default)]
    pub enforce_limits: bool,
}

impl VaultConfig {
    pub fn new(pool: impl Into<Address>, asset: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            asset: asset.into(),
            decimals_offset: 0,
            initial_deposit: None,
            upgrade_authority: None,
            deposit_cap: None,
            enforce_limits: false,
        }
    }

    pub fn with_decimals_offset(mut self, offset: u8) -> Self {
        self.decimals_offset = offset;
        self
    }

    pub fn with_initial_deposit(mut self, depositor: Account, assets: u128) -> Self {
        self.initial_deposit = Some(InitialDeposit { depositor, assets });
        self
    }

    pub fn with_upgrade_authority(mut self, authority: impl Into<Address>) -> Self {
        self.upgrade_authority = Some(authority.into());
        self
    }

    pub fn with_deposit_cap(mut self, cap: u128, enforce: bool) -> Self {
        self.deposit_cap = Some(cap);
        self.enforce_limits = enforce;
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, VaultError> {
        serde_json::from_str(json).map_err(|e| VaultError::InvalidConfig(e.to_string()))
    }

    /// `10^decimals_offset`, the virtual share term.
    pub fn virtual_shares(&self) -> Option<u128> {
        10u128.checked_pow(u32::from(self.decimals_offset))
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.decimals_offset > MAX_DECIMALS_OFFSET {
            return Err(VaultError::InvalidConfig(format!(
                "decimals offset {} exceeds {}",
                self.decimals_offset, MAX_DECIMALS_OFFSET
            )));
        }
        if let Some(initial) = &self.initial_deposit {
            if initial.assets == 0 {
                return Err(VaultError::InvalidConfig(
                    "initial deposit must be non-zero".into(),
                ));
            }
            if initial.depositor.owner == self.pool {
                return Err(VaultError::InvalidConfig(
                    "initial depositor cannot be the pool".into(),
                ));
            }
        }
        if self.deposit_cap == Some(0) {
            return Err(VaultError::InvalidConfig("deposit cap must be non-zero".into()));
        }
        Ok(())
    }
}
