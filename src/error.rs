//! Error taxonomy for the swap engine.
//!
//! Every failure is a tagged variant returned from the operation that hit
//! it. All errors are terminal and transactional: the operation rolls back
//! completely, emits no event, and is never retried internally.

use thiserror::Error;

use crate::types::{Amount, AssetTag, LockId, Principal, Token};

/// Result alias used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;

/// The single failure type of every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A positive amount was required but zero was given.
    #[error("operation requires a positive amount")]
    ZeroValue,

    /// Lock creation hit an occupied key.
    #[error("lock {0} already exists")]
    LockAlreadyExists(LockId),

    /// A claim path targeted an absent lock.
    #[error("lock {0} not found")]
    LockNotFound(LockId),

    /// An unlock was attempted at or after the lock's timeout.
    #[error("lock {0} has timed out")]
    LockTimedOut(LockId),

    /// A timeout refund was attempted before the lock's timeout.
    #[error("lock {0} has not timed out yet")]
    LockNotTimedOut(LockId),

    /// A withdraw/move/sell asked for more than the stash holds.
    #[error("stash of {owner} for asset {asset} cannot cover {requested}")]
    StashNotBigEnough {
        owner: Principal,
        asset: AssetTag,
        requested: Amount,
    },

    /// The external ledger reported failure; the operation was rolled back.
    #[error("ledger transfer of {amount} ({token}) from {from} to {to} failed")]
    TokenTransferFailed {
        token: Token,
        from: Principal,
        to: Principal,
        amount: Amount,
    },

    /// A proxy variant was invoked by a principal the directory does not
    /// authorise for the account.
    #[error("{caller} is not the registered proxy of {account}")]
    InvalidProxy {
        account: Principal,
        caller: Principal,
    },
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn test_error_display_names_the_lock() {
        let id = LockId(B256::repeat_byte(0xcd));
        let msg = EngineError::LockNotFound(id).to_string();

        assert!(msg.contains(&id.to_string()));
    }
}
