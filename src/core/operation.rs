use crate::vault::conversion::Rounding;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four value-moving vault operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Caller supplies assets, receives shares.
    Deposit,
    /// Caller requests an exact share amount and pays assets.
    Issue,
    /// Caller requests an exact asset amount and burns shares.
    Withdraw,
    /// Caller supplies shares, receives assets.
    Redeem,
}

impl OperationKind {
    /// Rounding direction mandated for this operation. Always favors the pool.
    ///
    /// | Operation | Converts        | Round |
    /// |-----------|-----------------|-------|
    /// | deposit   | assets → shares | down  |
    /// | issue     | shares → assets | up    |
    /// | withdraw  | assets → shares | up    |
    /// | redeem    | shares → assets | down  |
    pub fn rounding(&self) -> Rounding {
        match self {
            OperationKind::Deposit | OperationKind::Redeem => Rounding::Down,
            OperationKind::Issue | OperationKind::Withdraw => Rounding::Up,
        }
    }

    /// True when the computed counter-amount is paid by the caller
    /// (issue pays assets, withdraw burns shares) rather than received.
    pub fn caller_pays_counter(&self) -> bool {
        matches!(self, OperationKind::Issue | OperationKind::Withdraw)
    }

    /// True when the caller-specified amount is denominated in assets.
    pub fn input_is_assets(&self) -> bool {
        matches!(self, OperationKind::Deposit | OperationKind::Withdraw)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Issue => "issue",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Redeem => "redeem",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_table() {
        assert_eq!(OperationKind::Deposit.rounding(), Rounding::Down);
        assert_eq!(OperationKind::Issue.rounding(), Rounding::Up);
        assert_eq!(OperationKind::Withdraw.rounding(), Rounding::Up);
        assert_eq!(OperationKind::Redeem.rounding(), Rounding::Down);
    }

    #[test]
    fn test_input_denomination() {
        assert!(OperationKind::Deposit.input_is_assets());
        assert!(OperationKind::Withdraw.input_is_assets());
        assert!(!OperationKind::Issue.input_is_assets());
        assert!(!OperationKind::Redeem.input_is_assets());
    }

    #[test]
    fn test_counter_direction_matches_rounding() {
        // Whatever the caller pays is rounded up, whatever it receives down.
        for kind in [
            OperationKind::Deposit,
            OperationKind::Issue,
            OperationKind::Withdraw,
            OperationKind::Redeem,
        ] {
            let expected = if kind.caller_pays_counter() {
                Rounding::Up
            } else {
                Rounding::Down
            };
            assert_eq!(kind.rounding(), expected);
        }
    }
}
