//! Caller authorization for vault operations.
//!
//! A nonce of zero means the caller acts on its own funds. Any other nonce
//! must match a delegation the owner approved for exactly that operation,
//! and each `(owner, nonce)` pair can be spent once.

use crate::core::address::Address;
use crate::core::domain::Account;
use crate::core::operation::OperationKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a delegation authorizes: a standard operation or a phase-1 exact call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentAction {
    Standard(OperationKind),
    Exact(OperationKind),
}

/// The exact operation a delegation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationIntent {
    pub action: IntentAction,
    pub from: Account,
    pub to: Account,
    pub amount: u128,
    pub quote: Option<u128>,
    pub limit: Option<u128>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Authorized,
    Denied,
}

impl Verdict {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Verdict::Authorized)
    }
}

/// Validates that `caller` may move funds belonging to `owner`.
///
/// `authorize` must not change state; the vault calls `consume` only after
/// every other precondition of the operation has passed.
pub trait AccessGuard {
    fn authorize(
        &self,
        caller: &Address,
        owner: &Address,
        intent: &OperationIntent,
        nonce: u64,
    ) -> Verdict;

    fn consume(&mut self, caller: &Address, owner: &Address, intent: &OperationIntent, nonce: u64);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Delegation {
    owner: Address,
    caller: Address,
    intent: OperationIntent,
    nonce: u64,
}

/// In-memory registry of single-use delegations.
///
/// # Examples
///
/// ```
/// use vault_engine::auth::guard::{AccessGuard, DelegationRegistry, IntentAction, OperationIntent, Verdict};
/// use vault_engine::core::address::Address;
/// use vault_engine::core::domain::Account;
/// use vault_engine::core::operation::OperationKind;
///
/// let alice = Address::new("alice");
/// let relayer = Address::new("relayer");
/// let intent = OperationIntent {
///     action: IntentAction::Standard(OperationKind::Deposit),
///     from: Account::disclosed("alice"),
///     to: Account::disclosed("alice"),
///     amount: 100,
///     quote: None,
///     limit: None,
/// };
///
/// let mut registry = DelegationRegistry::new();
/// registry.approve(&alice, &relayer, intent.clone(), 7);
/// assert_eq!(registry.authorize(&relayer, &alice, &intent, 7), Verdict::Authorized);
///
/// registry.consume(&relayer, &alice, &intent, 7);
/// assert_eq!(registry.authorize(&relayer, &alice, &intent, 7), Verdict::Denied);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DelegationRegistry {
    approved: HashSet<Delegation>,
    spent: HashSet<(Address, u64)>,
}

impl DelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` lets `caller` perform `intent` once under `nonce`.
    pub fn approve(&mut self, owner: &Address, caller: &Address, intent: OperationIntent, nonce: u64) {
        self.approved.insert(Delegation {
            owner: owner.clone(),
            caller: caller.clone(),
            intent,
            nonce,
        });
    }

    /// Withdraw an unspent delegation. Returns false if none was pending.
    pub fn revoke(&mut self, owner: &Address, caller: &Address, intent: &OperationIntent, nonce: u64) -> bool {
        self.approved.remove(&Delegation {
            owner: owner.clone(),
            caller: caller.clone(),
            intent: intent.clone(),
            nonce,
        })
    }

    pub fn is_spent(&self, owner: &Address, nonce: u64) -> bool {
        self.spent.contains(&(owner.clone(), nonce))
    }

    pub fn pending_count(&self) -> usize {
        self.approved.len()
    }
}

impl AccessGuard for DelegationRegistry {
    fn authorize(
        &self,
        caller: &Address,
        owner: &Address,
        intent: &OperationIntent,
        nonce: u64,
    ) -> Verdict {
        if nonce == 0 {
            return if caller == owner {
                Verdict::Authorized
            } else {
                Verdict::Denied
            };
        }
        if self.is_spent(owner, nonce) {
            return Verdict::Denied;
        }
        let delegation = Delegation {
            owner: owner.clone(),
            caller: caller.clone(),
            intent: intent.clone(),
            nonce,
        };
        if self.approved.contains(&delegation) {
            Verdict::Authorized
        } else {
            Verdict::Denied
        }
    }

    fn consume(&mut self, caller: &Address, owner: &Address, intent: &OperationIntent, nonce: u64) {
        if nonce == 0 {
            return;
        }
        self.revoke(owner, caller, intent, nonce);
        self.spent.insert((owner.clone(), nonce));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(amount: u128) -> OperationIntent {
        OperationIntent {
            action: IntentAction::Standard(OperationKind::Redeem),
            from: Account::disclosed("alice"),
            to: Account::confidential("alice"),
            amount,
            quote: None,
            limit: Some(1),
        }
    }

    #[test]
    fn test_self_authorization() {
        let registry = DelegationRegistry::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        assert!(registry.authorize(&alice, &alice, &intent(5), 0).is_authorized());
        assert!(!registry.authorize(&bob, &alice, &intent(5), 0).is_authorized());
    }

    #[test]
    fn test_delegation_scoped_to_exact_intent() {
        let mut registry = DelegationRegistry::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        registry.approve(&alice, &bob, intent(5), 1);

        assert!(registry.authorize(&bob, &alice, &intent(5), 1).is_authorized());
        // Different amount, nonce, or caller is not covered.
        assert!(!registry.authorize(&bob, &alice, &intent(6), 1).is_authorized());
        assert!(!registry.authorize(&bob, &alice, &intent(5), 2).is_authorized());
        assert!(!registry.authorize(&Address::new("eve"), &alice, &intent(5), 1).is_authorized());
    }

    #[test]
    fn test_replay_denied_even_if_reapproved() {
        let mut registry = DelegationRegistry::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        registry.approve(&alice, &bob, intent(5), 1);
        registry.consume(&bob, &alice, &intent(5), 1);

        assert!(registry.is_spent(&alice, 1));
        assert_eq!(registry.pending_count(), 0);

        registry.approve(&alice, &bob, intent(5), 1);
        assert_eq!(registry.authorize(&bob, &alice, &intent(5), 1), Verdict::Denied);
    }

    #[test]
    fn test_authorize_is_read_only() {
        let mut registry = DelegationRegistry::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        registry.approve(&alice, &bob, intent(5), 3);
        for _ in 0..3 {
            assert!(registry.authorize(&bob, &alice, &intent(5), 3).is_authorized());
        }
    }

    #[test]
    fn test_revoke() {
        let mut registry = DelegationRegistry::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        registry.approve(&alice, &bob, intent(5), 4);
        assert!(registry.revoke(&alice, &bob, &intent(5), 4));
        assert!(!registry.authorize(&bob, &alice, &intent(5), 4).is_authorized());
        assert!(!registry.revoke(&alice, &bob, &intent(5), 4));
    }
}
