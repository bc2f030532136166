//! Two-phase settlement for operations that cross into the domain where
//! the exchange rate cannot be read.
//!
//! Phase 1 moves an immediately usable amount and opens a [`Commitment`].
//! Phase 2 resolves the commitment against the true rate, checks the
//! caller's bound, and settles the difference. Open commitments live in a
//! keyed table until finalized; there is no timeout and no cancellation.

use crate::core::address::Address;
use crate::core::domain::Account;
use crate::core::error::VaultError;
use crate::core::operation::OperationKind;
use crate::vault::conversion::PoolSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitmentId(Uuid);

impl CommitmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CommitmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CommitmentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for CommitmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitmentStatus {
    Open,
    Finalized,
}

/// A pending cross-domain settlement.
///
/// `asset_amount` and `share_amount` record what phase 1 moved:
///
/// | kind     | asset_amount           | share_amount              | bound       |
/// |----------|------------------------|---------------------------|-------------|
/// | deposit  | assets escrowed        | provisional shares minted | min shares  |
/// | issue    | max assets escrowed    | shares minted             | max assets  |
/// | withdraw | assets paid out        | max shares escrowed       | max shares  |
/// | redeem   | provisional assets paid| shares escrowed           | min assets  |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub id: CommitmentId,
    pub initiator: Address,
    /// Account that receives the settled counter-amount.
    pub counterparty_hint: Account,
    /// Account that receives unused escrow.
    pub refund_to: Account,
    pub kind: OperationKind,
    pub asset_amount: u128,
    pub share_amount: u128,
    pub bound: u128,
    pub status: CommitmentStatus,
    pub opened_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Commitment {
    pub fn is_open(&self) -> bool {
        self.status == CommitmentStatus::Open
    }

    /// Shares minted in phase 1 that are not yet part of `total_supply`.
    pub fn provisional_shares(&self) -> u128 {
        match self.kind {
            OperationKind::Deposit | OperationKind::Issue => self.share_amount,
            OperationKind::Withdraw | OperationKind::Redeem => 0,
        }
    }

    /// Assets paid out of the pool in phase 1 that still count as pooled.
    pub fn outstanding_payout(&self) -> u128 {
        match self.kind {
            OperationKind::Withdraw | OperationKind::Redeem => self.asset_amount,
            OperationKind::Deposit | OperationKind::Issue => 0,
        }
    }
}

/// Outcome of resolving a commitment against the current pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: CommitmentId,
    pub kind: OperationKind,
    /// Exact counter-amount at the resolved rate.
    pub exact: u128,
    /// Extra value owed to the recipient beyond phase 1.
    pub surplus: u128,
    /// Unused escrow returned to `refund_to`.
    pub refund: u128,
}

fn difference(larger: u128, smaller: u128) -> Result<u128, VaultError> {
    larger.checked_sub(smaller).ok_or_else(|| {
        VaultError::InvariantViolation(format!("commitment amounts out of order: {larger} < {smaller}"))
    })
}

/// Keyed table of commitments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementCoordinator {
    commitments: HashMap<CommitmentId, Commitment>,
}

impl SettlementCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        initiator: Address,
        counterparty_hint: Account,
        refund_to: Account,
        kind: OperationKind,
        asset_amount: u128,
        share_amount: u128,
        bound: u128,
    ) -> CommitmentId {
        let id = CommitmentId::new();
        self.commitments.insert(
            id,
            Commitment {
                id,
                initiator,
                counterparty_hint,
                refund_to,
                kind,
                asset_amount,
                share_amount,
                bound,
                status: CommitmentStatus::Open,
                opened_at: Utc::now(),
                finalized_at: None,
            },
        );
        log::debug!("opened {} commitment {}", kind, id);
        id
    }

    pub fn get(&self, id: &CommitmentId) -> Option<&Commitment> {
        self.commitments.get(id)
    }

    fn open_entry(&self, id: &CommitmentId) -> Result<&Commitment, VaultError> {
        self.commitments
            .get(id)
            .filter(|c| c.is_open())
            .ok_or(VaultError::UnknownOrAlreadyFinalizedCommitment(*id))
    }

    /// Compute the settlement of an open commitment. Does not change state.
    pub fn resolve(&self, id: &CommitmentId, pool: &PoolSnapshot) -> Result<Settlement, VaultError> {
        let c = self.open_entry(id)?;
        let rounding = c.kind.rounding();
        let (exact, surplus, refund) = match c.kind {
            OperationKind::Deposit => {
                let exact = pool.shares_for(c.asset_amount, rounding)?;
                if exact < c.bound {
                    return Err(VaultError::SlippageExceeded { computed: exact, bound: c.bound });
                }
                (exact, difference(exact, c.share_amount)?, 0)
            }
            OperationKind::Issue => {
                let exact = pool.assets_for(c.share_amount, rounding)?;
                if exact > c.bound {
                    return Err(VaultError::SlippageExceeded { computed: exact, bound: c.bound });
                }
                (exact, 0, difference(c.asset_amount, exact)?)
            }
            OperationKind::Withdraw => {
                let exact = pool.shares_for(c.asset_amount, rounding)?;
                if exact > c.bound {
                    return Err(VaultError::SlippageExceeded { computed: exact, bound: c.bound });
                }
                (exact, 0, difference(c.share_amount, exact)?)
            }
            OperationKind::Redeem => {
                let exact = pool.assets_for(c.share_amount, rounding)?;
                if exact < c.bound {
                    return Err(VaultError::SlippageExceeded { computed: exact, bound: c.bound });
                }
                (exact, difference(exact, c.asset_amount)?, 0)
            }
        };
        Ok(Settlement {
            id: *id,
            kind: c.kind,
            exact,
            surplus,
            refund,
        })
    }

    /// Mark an open commitment finalized. Single use per id.
    pub fn mark_finalized(&mut self, id: &CommitmentId) -> Result<(), VaultError> {
        let entry = self
            .commitments
            .get_mut(id)
            .filter(|c| c.is_open())
            .ok_or(VaultError::UnknownOrAlreadyFinalizedCommitment(*id))?;
        entry.status = CommitmentStatus::Finalized;
        entry.finalized_at = Some(Utc::now());
        Ok(())
    }

    pub fn open_commitments(&self) -> impl Iterator<Item = &Commitment> {
        self.commitments.values().filter(|c| c.is_open())
    }

    pub fn all_commitments(&self) -> impl Iterator<Item = &Commitment> {
        self.commitments.values()
    }

    pub fn provisional_shares(&self) -> u128 {
        self.open_commitments()
            .map(Commitment::provisional_shares)
            .sum()
    }

    pub fn outstanding_payouts(&self) -> u128 {
        self.open_commitments()
            .map(Commitment::outstanding_payout)
            .sum()
    }

    /// Provisional shares sitting in `account`. They stay locked there
    /// until their commitment is finalized.
    pub fn provisional_held_by(&self, account: &Account) -> u128 {
        self.open_commitments()
            .filter(|c| &c.counterparty_hint == account)
            .map(Commitment::provisional_shares)
            .sum()
    }

    /// Provisional shares per holding account.
    pub fn provisional_holdings(&self) -> HashMap<Account, u128> {
        let mut holdings = HashMap::new();
        for c in self.open_commitments() {
            let shares = c.provisional_shares();
            if shares > 0 {
                *holdings.entry(c.counterparty_hint.clone()).or_insert(0u128) += shares;
            }
        }
        holdings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(
        coord: &mut SettlementCoordinator,
        kind: OperationKind,
        assets: u128,
        shares: u128,
        bound: u128,
    ) -> CommitmentId {
        coord.open(
            Address::new("alice"),
            Account::confidential("alice"),
            Account::confidential("alice"),
            kind,
            assets,
            shares,
            bound,
        )
    }

    #[test]
    fn test_deposit_resolution_pays_surplus() {
        let mut coord = SettlementCoordinator::new();
        let id = open(&mut coord, OperationKind::Deposit, 100, 40, 50);
        // 100 * (100 + 1) / (100 + 1) = 100 shares
        let pool = PoolSnapshot::new(100, 100, 0);
        let s = coord.resolve(&id, &pool).unwrap();
        assert_eq!(s.exact, 100);
        assert_eq!(s.surplus, 60);
        assert_eq!(s.refund, 0);
    }

    #[test]
    fn test_redeem_below_minimum_fails_and_stays_open() {
        let mut coord = SettlementCoordinator::new();
        let id = open(&mut coord, OperationKind::Redeem, 5, 10, 20);
        let pool = PoolSnapshot::new(14, 9, 0);
        let err = coord.resolve(&id, &pool).unwrap_err();
        assert_eq!(err, VaultError::SlippageExceeded { computed: 15, bound: 20 });
        assert!(coord.get(&id).unwrap().is_open());
    }

    #[test]
    fn test_issue_refunds_unused_escrow() {
        let mut coord = SettlementCoordinator::new();
        let id = open(&mut coord, OperationKind::Issue, 20, 10, 20);
        let pool = PoolSnapshot::new(14, 9, 0);
        let s = coord.resolve(&id, &pool).unwrap();
        assert_eq!(s.exact, 15);
        assert_eq!(s.refund, 5);
    }

    #[test]
    fn test_finalize_is_single_use() {
        let mut coord = SettlementCoordinator::new();
        let id = open(&mut coord, OperationKind::Withdraw, 13, 10, 10);
        coord.mark_finalized(&id).unwrap();
        assert_eq!(
            coord.mark_finalized(&id),
            Err(VaultError::UnknownOrAlreadyFinalizedCommitment(id))
        );
        assert!(coord.resolve(&id, &PoolSnapshot::new(1, 1, 0)).is_err());
        assert!(coord.get(&id).unwrap().finalized_at.is_some());
    }

    #[test]
    fn test_unknown_commitment() {
        let coord = SettlementCoordinator::new();
        let id = CommitmentId::new();
        assert_eq!(
            coord.resolve(&id, &PoolSnapshot::new(0, 0, 0)),
            Err(VaultError::UnknownOrAlreadyFinalizedCommitment(id))
        );
    }

    #[test]
    fn test_provisional_holdings_follow_recipient() {
        let mut coord = SettlementCoordinator::new();
        let dep = open(&mut coord, OperationKind::Deposit, 50, 30, 40);
        open(&mut coord, OperationKind::Issue, 20, 10, 20);
        open(&mut coord, OperationKind::Redeem, 5, 8, 6);

        let alice = Account::confidential("alice");
        assert_eq!(coord.provisional_held_by(&alice), 40);
        assert_eq!(coord.provisional_held_by(&Account::disclosed("alice")), 0);
        assert_eq!(coord.provisional_holdings().get(&alice), Some(&40));

        coord.mark_finalized(&dep).unwrap();
        assert_eq!(coord.provisional_held_by(&alice), 10);
    }

    #[test]
    fn test_open_totals() {
        let mut coord = SettlementCoordinator::new();
        open(&mut coord, OperationKind::Deposit, 100, 40, 50);
        open(&mut coord, OperationKind::Issue, 20, 10, 20);
        let redeem = open(&mut coord, OperationKind::Redeem, 5, 10, 5);
        open(&mut coord, OperationKind::Withdraw, 7, 9, 9);

        assert_eq!(coord.provisional_shares(), 50);
        assert_eq!(coord.outstanding_payouts(), 12);

        coord.mark_finalized(&redeem).unwrap();
        assert_eq!(coord.outstanding_payouts(), 7);
        assert_eq!(coord.open_commitments().count(), 3);
    }
}
