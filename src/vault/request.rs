use crate::auth::guard::{IntentAction, OperationIntent};
use crate::core::address::Address;
use crate::core::domain::Account;
use crate::core::operation::OperationKind;
use crate::vault::settlement::CommitmentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arguments of a vault operation.
///
/// `amount` is denominated in assets for deposit and withdraw, and in
/// shares for issue and redeem. `quote` is the counter-amount the caller
/// expects (or, for exact-pattern calls, the amount delivered immediately).
/// `limit` is the slippage bound on the counter-amount.
///
/// # Examples
///
/// ```
/// use vault_engine::core::domain::Account;
/// use vault_engine::vault::request::Request;
///
/// let req = Request::own(Account::disclosed("alice"), Account::confidential("alice"), 100)
///     .with_limit(95);
/// assert_eq!(req.caller.as_str(), "alice");
/// assert_eq!(req.nonce, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub caller: Address,
    pub from: Account,
    pub to: Account,
    pub amount: u128,
    #[serde(default)]
    pub quote: Option<u128>,
    #[serde(default)]
    pub limit: Option<u128>,
    /// Zero for self-authorization, otherwise a delegation nonce.
    #[serde(default)]
    pub nonce: u64,
}

impl Request {
    pub fn new(caller: impl Into<Address>, from: Account, to: Account, amount: u128) -> Self {
        Self {
            caller: caller.into(),
            from,
            to,
            amount,
            quote: None,
            limit: None,
            nonce: 0,
        }
    }

    /// A request made by the owner of `from`.
    pub fn own(from: Account, to: Account, amount: u128) -> Self {
        Self::new(from.owner.clone(), from, to, amount)
    }

    pub fn with_quote(mut self, quote: u128) -> Self {
        self.quote = Some(quote);
        self
    }

    pub fn with_limit(mut self, limit: u128) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// The intent a delegation must match to authorize this request.
    pub fn intent(&self, action: IntentAction) -> OperationIntent {
        OperationIntent {
            action,
            from: self.from.clone(),
            to: self.to.clone(),
            amount: self.amount,
            quote: self.quote,
            limit: self.limit,
        }
    }
}

/// Result of a completed operation or phase-1 exact call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub kind: OperationKind,
    pub from: Account,
    pub to: Account,
    pub assets: u128,
    pub shares: u128,
    /// Set for exact-pattern calls awaiting finalization.
    pub commitment: Option<CommitmentId>,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}: {} assets, {} shares",
            self.kind, self.from, self.to, self.assets, self.shares
        )?;
        if let Some(id) = &self.commitment {
            write!(f, " (pending {})", id)?;
        }
        Ok(())
    }
}

/// Lifecycle of a single operation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationPhase {
    Requested,
    Authorized,
    Computed,
    Mutated,
    Completed,
    Reverted,
}

/// Tracks and logs the phase a call has reached.
#[derive(Debug)]
pub struct Execution {
    label: &'static str,
    phase: OperationPhase,
}

impl Execution {
    pub fn begin(label: &'static str) -> Self {
        log::debug!("{label}: requested");
        Self {
            label,
            phase: OperationPhase::Requested,
        }
    }

    pub fn advance(&mut self, next: OperationPhase) {
        log::debug!("{}: {:?} -> {:?}", self.label, self.phase, next);
        self.phase = next;
    }

    pub fn phase(&self) -> OperationPhase {
        self.phase
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}
