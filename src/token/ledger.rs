use crate::core::address::Address;
use crate::core::domain::{Account, Domain};
use crate::token::balance_store::{BalanceStore, TokenError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory fungible token with disclosed and confidential balances.
///
/// Confidentiality itself is out of scope here: the confidential domain
/// is tracked as a separate balance slot per owner so that the vault can
/// reason about which domain a value sits in.
///
/// # Examples
///
/// ```
/// use vault_engine::core::domain::Account;
/// use vault_engine::token::balance_store::BalanceStore;
/// use vault_engine::token::ledger::TokenLedger;
///
/// let mut token = TokenLedger::new("USDC");
/// token.mint(&Account::disclosed("alice"), 100).unwrap();
/// token
///     .transfer(&Account::disclosed("alice"), &Account::confidential("alice"), 40)
///     .unwrap();
/// assert_eq!(token.balance_of(&Account::confidential("alice")), 40);
/// assert_eq!(token.total_supply(), 100);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    symbol: String,
    total_supply: u128,
    /// (owner, domain) -> balance
    #[serde(with = "balances_serde")]
    balances: HashMap<(Address, Domain), u128>,
}

mod balances_serde {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        balances: &HashMap<(Address, Domain), u128>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(balances.len()))?;
        for ((owner, domain), amount) in balances {
            map.serialize_entry(&format!("{}:{}", owner, domain), amount)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<(Address, Domain), u128>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = HashMap<(Address, Domain), u128>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map with \"owner:domain\" keys")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut map = HashMap::new();
                while let Some((key, value)) = access.next_entry::<String, u128>()? {
                    let (owner, domain) = key
                        .rsplit_once(':')
                        .ok_or_else(|| de::Error::custom(format!("invalid key: {key}")))?;
                    let domain = Domain::parse(domain)
                        .ok_or_else(|| de::Error::custom(format!("invalid domain in key: {key}")))?;
                    map.insert((Address::new(owner), domain), value);
                }
                Ok(map)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl TokenLedger {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All non-zero balances.
    pub fn all_balances(&self) -> impl Iterator<Item = (Account, u128)> + '_ {
        self.balances
            .iter()
            .filter(|(_, v)| **v > 0)
            .map(|((owner, domain), v)| (Account::new(owner.clone(), *domain), *v))
    }

    /// Sum of balances held in one domain.
    pub fn domain_total(&self, domain: Domain) -> u128 {
        self.balances
            .iter()
            .filter(|((_, d), _)| *d == domain)
            .map(|(_, v)| *v)
            .sum()
    }

    /// Verify that total supply equals the sum of all balances in both domains.
    pub fn supply_matches_balances(&self) -> bool {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v));
        sum == Some(self.total_supply)
    }

    fn key(account: &Account) -> (Address, Domain) {
        (account.owner.clone(), account.domain)
    }

    fn debit(&mut self, account: &Account, amount: u128) -> Result<(), TokenError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: account.clone(),
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(&Self::key(account));
        } else {
            self.balances.insert(Self::key(account), remaining);
        }
        Ok(())
    }

    fn credit(&mut self, account: &Account, amount: u128) {
        if amount == 0 {
            return;
        }
        // Bounded by total supply, which is checked on mint.
        *self.balances.entry(Self::key(account)).or_insert(0) += amount;
    }
}

impl BalanceStore for TokenLedger {
    fn balance_of(&self, account: &Account) -> u128 {
        self.balances
            .get(&Self::key(account))
            .copied()
            .unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn transfer(&mut self, from: &Account, to: &Account, amount: u128) -> Result<(), TokenError> {
        self.debit(from, amount)?;
        self.credit(to, amount);
        log::trace!("{}: transfer {} {} -> {}", self.symbol, amount, from, to);
        Ok(())
    }

    fn mint(&mut self, to: &Account, amount: u128) -> Result<(), TokenError> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;
        self.credit(to, amount);
        log::trace!("{}: mint {} -> {}", self.symbol, amount, to);
        Ok(())
    }

    fn burn(&mut self, from: &Account, amount: u128) -> Result<(), TokenError> {
        self.debit(from, amount)?;
        self.total_supply -= amount;
        log::trace!("{}: burn {} from {}", self.symbol, amount, from);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_transfer_across_domains() {
        let mut token = TokenLedger::new("USDC");
        let alice = Account::disclosed("alice");
        let alice_conf = Account::confidential("alice");
        let bob = Account::confidential("bob");

        token.mint(&alice, 100).unwrap();
        token.transfer(&alice, &alice_conf, 30).unwrap();
        token.transfer(&alice_conf, &bob, 10).unwrap();

        assert_eq!(token.balance_of(&alice), 70);
        assert_eq!(token.balance_of(&alice_conf), 20);
        assert_eq!(token.balance_of(&bob), 10);
        assert_eq!(token.domain_total(Domain::Confidential), 30);
        assert_eq!(token.total_balance_of(&Address::new("alice")), 90);
        assert!(token.supply_matches_balances());
    }

    #[test]
    fn test_insufficient_balance_leaves_state_untouched() {
        let mut token = TokenLedger::new("USDC");
        let alice = Account::disclosed("alice");
        token.mint(&alice, 5).unwrap();

        let err = token
            .transfer(&alice, &Account::disclosed("bob"), 6)
            .unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientBalance {
                account: alice.clone(),
                available: 5,
                requested: 6,
            }
        );
        assert_eq!(token.balance_of(&alice), 5);
        assert_eq!(token.balance_of(&Account::disclosed("bob")), 0);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let mut token = TokenLedger::new("vUSDC");
        let alice = Account::confidential("alice");
        token.mint(&alice, 50).unwrap();
        token.burn(&alice, 20).unwrap();
        assert_eq!(token.total_supply(), 30);
        assert!(token.burn(&alice, 31).is_err());
        assert!(token.supply_matches_balances());
    }

    #[test]
    fn test_mint_overflow() {
        let mut token = TokenLedger::new("USDC");
        token.mint(&Account::disclosed("a"), u128::MAX).unwrap();
        let err = token.mint(&Account::disclosed("b"), 1).unwrap_err();
        assert_eq!(err, TokenError::SupplyOverflow { amount: 1 });
        assert_eq!(token.total_supply(), u128::MAX);
    }

    #[test]
    fn test_serde_round_trip_keys() {
        let mut token = TokenLedger::new("USDC");
        token.mint(&Account::disclosed("alice"), 7).unwrap();
        token.mint(&Account::confidential("bob"), 3).unwrap();

        let json = serde_json::to_string(&token).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["balances"]["alice:disclosed"], 7);

        let restored: TokenLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.balance_of(&Account::confidential("bob")), 3);
        assert_eq!(restored.total_supply(), 10);
    }
}
