use crate::core::address::Address;
use crate::core::domain::{Account, Domain};
use thiserror::Error;

/// Errors raised by a balance store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: Account,
        available: u128,
        requested: u128,
    },
    #[error("supply overflow: minting {amount} would exceed u128::MAX")]
    SupplyOverflow { amount: u128 },
}

/// Dual-domain fungible balance store.
///
/// The vault consumes both its share token and its asset token through
/// this interface. A transfer whose accounts sit in different domains is
/// how value crosses between disclosed and confidential balances.
pub trait BalanceStore {
    fn balance_of(&self, account: &Account) -> u128;

    fn total_supply(&self) -> u128;

    fn transfer(&mut self, from: &Account, to: &Account, amount: u128) -> Result<(), TokenError>;

    fn mint(&mut self, to: &Account, amount: u128) -> Result<(), TokenError>;

    fn burn(&mut self, from: &Account, amount: u128) -> Result<(), TokenError>;

    /// Combined balance of an owner across both domains.
    fn total_balance_of(&self, owner: &Address) -> u128 {
        [Domain::Disclosed, Domain::Confidential]
            .into_iter()
            .map(|domain| self.balance_of(&Account::new(owner.clone(), domain)))
            .fold(0u128, u128::saturating_add)
    }
}
