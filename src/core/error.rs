use crate::core::address::Address;
use crate::core::domain::Account;
use crate::token::balance_store::TokenError;
use crate::vault::settlement::CommitmentId;
use thiserror::Error;

/// Errors raised by vault operations.
///
/// Every check runs before any balance mutation, so an `Err` always means
/// the call had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: Account,
        available: u128,
        requested: u128,
    },

    /// Missing, invalid, or replayed delegation.
    #[error("{caller} is not authorized to act for {owner}")]
    InsufficientAuthorization { caller: Address, owner: Address },

    #[error("slippage exceeded: computed {computed}, bound {bound}")]
    SlippageExceeded { computed: u128, bound: u128 },

    #[error("zero amount rejected")]
    ZeroAmountRejected,

    #[error("commitment {0} is unknown or already finalized")]
    UnknownOrAlreadyFinalizedCommitment(CommitmentId),

    #[error("arithmetic overflow in conversion")]
    ArithmeticOverflow,

    /// A confidential source cannot read the rate and must quote the counter-amount.
    #[error("operation from a confidential account requires an expected counter-amount")]
    QuoteRequired,

    #[error("limit exceeded: maximum {limit}, requested {requested}")]
    LimitExceeded { limit: u128, requested: u128 },

    #[error("the pool's own shares are locked")]
    LockedShares,

    #[error("invalid vault configuration: {0}")]
    InvalidConfig(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<TokenError> for VaultError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance {
                account,
                available,
                requested,
            } => VaultError::InsufficientBalance {
                account,
                available,
                requested,
            },
            TokenError::SupplyOverflow { .. } => VaultError::ArithmeticOverflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_maps_to_taxonomy() {
        let err: VaultError = TokenError::InsufficientBalance {
            account: Account::disclosed("alice"),
            available: 3,
            requested: 5,
        }
        .into();
        assert!(matches!(
            err,
            VaultError::InsufficientBalance { available: 3, requested: 5, .. }
        ));

        let err: VaultError = TokenError::SupplyOverflow { amount: 1 }.into();
        assert_eq!(err, VaultError::ArithmeticOverflow);
    }

    #[test]
    fn test_error_messages() {
        let err = VaultError::SlippageExceeded {
            computed: 14,
            bound: 15,
        };
        assert_eq!(err.to_string(), "slippage exceeded: computed 14, bound 15");
    }
}
