//! # vault-engine
//!
//! Tokenized vault accounting engine over dual-domain token balances.
//!
//! Holders deposit an asset token into a pool and receive shares
//! representing a proportional claim on it. Conversions use a
//! virtual-liquidity offset and always round in the pool's favor, and an
//! optional locked initial deposit blunts donation-based price inflation.
//! Operations that cross into the confidential domain, where the rate
//! cannot be read, can settle in two phases through explicit commitments.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: addresses, domains, accounts, config, errors
//! - **token** — Balance store interface and the in-memory token ledger
//! - **auth** — Access guard and single-use delegations
//! - **vault** — Conversion math, the vault ledger, two-phase settlement
//! - **simulation** — Inflation-attack runs, JSON scenarios, random workloads

pub mod auth;
pub mod core;
pub mod simulation;
pub mod token;
pub mod vault;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::auth::guard::{AccessGuard, DelegationRegistry, IntentAction, OperationIntent};
    pub use crate::core::address::Address;
    pub use crate::core::config::VaultConfig;
    pub use crate::core::domain::{Account, Domain};
    pub use crate::core::error::VaultError;
    pub use crate::core::operation::OperationKind;
    pub use crate::token::balance_store::BalanceStore;
    pub use crate::token::ledger::TokenLedger;
    pub use crate::vault::conversion::{PoolSnapshot, Rounding};
    pub use crate::vault::ledger::Vault;
    pub use crate::vault::request::{Receipt, Request};
    pub use crate::vault::settlement::{CommitmentId, Settlement};
}
