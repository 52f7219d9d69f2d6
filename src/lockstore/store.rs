//! Lock store implementation.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::types::{Amount, LockId};

/// Map from lock-id to escrowed amount.
///
/// ## Example
///
/// ```
/// use swapvault::lockstore::LockStore;
/// use swapvault::types::LockId;
/// use alloy_primitives::{B256, U256};
///
/// let mut store = LockStore::new();
/// let id = LockId(B256::repeat_byte(0x01));
///
/// store.create(id, U256::from(100u64)).unwrap();
/// assert_eq!(store.peek(id), U256::from(100u64));
///
/// let amount = store.claim(id).unwrap();
/// assert_eq!(amount, U256::from(100u64));
/// assert_eq!(store.peek(id), U256::ZERO);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LockStore {
    locks: HashMap<LockId, Amount>,
}

impl LockStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new lock.
    ///
    /// Fails with `ZeroValue` for a zero amount and `LockAlreadyExists`
    /// for an occupied key; the occupied entry is never overwritten.
    pub fn create(&mut self, id: LockId, amount: Amount) -> EngineResult<()> {
        if amount.is_zero() {
            return Err(EngineError::ZeroValue);
        }
        if self.locks.contains_key(&id) {
            return Err(EngineError::LockAlreadyExists(id));
        }
        self.locks.insert(id, amount);
        Ok(())
    }

    /// Remove a lock and return its amount.
    ///
    /// Shared by every terminal transition; the engine performs the
    /// preimage/timeout gating before calling this.
    pub fn claim(&mut self, id: LockId) -> EngineResult<Amount> {
        self.locks.remove(&id).ok_or(EngineError::LockNotFound(id))
    }

    /// Amount held under `id`, zero when absent.
    #[inline]
    pub fn peek(&self, id: LockId) -> Amount {
        self.locks.get(&id).copied().unwrap_or(Amount::ZERO)
    }

    /// Whether `id` is live.
    #[inline]
    pub fn contains(&self, id: LockId) -> bool {
        self.locks.contains_key(&id)
    }

    /// Number of live locks.
    #[inline]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether the store holds no locks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Sum of all live lock amounts, across every denomination.
    ///
    /// The token of a lock is folded into its id, so this is only useful
    /// for whole-store conservation checks.
    pub fn total(&self) -> Amount {
        self.locks.values().fold(Amount::ZERO, |acc, v| {
            acc.checked_add(*v).expect("lock total overflow")
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
