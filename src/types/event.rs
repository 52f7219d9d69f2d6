//! Events emitted by the engine for off-chain indexing.
//!
//! Every successful operation appends exactly one event set to the engine's
//! log; failed operations emit nothing. Each event carries enough data to
//! reconstruct the affected lock-id, so an indexer can follow a swap from
//! `BuyLock`/`SellLock` through its terminal transition without any other
//! state access. Unlock events reveal the preimage; that is the point of
//! the protocol, not a leak.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, AssetTag, Digest, LockId, Principal, Timestamp, Token};

/// One engine event. Serialized with `serde` for indexers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A buyer locked value under a secret-hash commitment.
    BuyLock {
        token: Token,
        sender: Principal,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        amount: Amount,
        lock_id: LockId,
        /// Counter-asset the buyer wants in return.
        sell_asset: AssetTag,
        /// Advertised price for the counter-asset, opaque to the engine.
        sell_price: Amount,
    },
    /// A seller locked value, either from a stash or from direct funds.
    SellLock {
        token: Token,
        sender: Principal,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        amount: Amount,
        lock_id: LockId,
        /// Asset tag of the stash side of the pairing.
        buy_asset: AssetTag,
        /// The buy-side lock this sell answers.
        buy_lock_id: LockId,
    },
    /// The declared recipient cancelled the lock; value returned to sender.
    DeclineByRecipient {
        token: Token,
        sender: Principal,
        recipient: Principal,
        lock_id: LockId,
    },
    /// The sender settled the lock by revealing the preimage.
    UnlockBySender {
        token: Token,
        sender: Principal,
        recipient: Principal,
        lock_id: LockId,
        secret: Vec<u8>,
    },
    /// The recipient settled the lock by revealing the preimage.
    UnlockByRecipient {
        token: Token,
        sender: Principal,
        recipient: Principal,
        lock_id: LockId,
        secret: Vec<u8>,
    },
    /// The lock expired and its value was refunded.
    Timeout {
        token: Token,
        sender: Principal,
        recipient: Principal,
        lock_id: LockId,
    },
    /// Value entered a stash.
    StashAdd {
        token: Token,
        account: Principal,
        asset: AssetTag,
        amount: Amount,
    },
    /// Value left a stash.
    StashRemove {
        token: Token,
        account: Principal,
        asset: AssetTag,
        amount: Amount,
    },
}

impl Event {
    /// Short kind label, used for logging and test assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::BuyLock { .. } => "BuyLock",
            Event::SellLock { .. } => "SellLock",
            Event::DeclineByRecipient { .. } => "DeclineByRecipient",
            Event::UnlockBySender { .. } => "UnlockBySender",
            Event::UnlockByRecipient { .. } => "UnlockByRecipient",
            Event::Timeout { .. } => "Timeout",
            Event::StashAdd { .. } => "StashAdd",
            Event::StashRemove { .. } => "StashRemove",
        }
    }

    /// The lock-id an event refers to, if it refers to one.
    pub fn lock_id(&self) -> Option<LockId> {
        match self {
            Event::BuyLock { lock_id, .. }
            | Event::SellLock { lock_id, .. }
            | Event::DeclineByRecipient { lock_id, .. }
            | Event::UnlockBySender { lock_id, .. }
            | Event::UnlockByRecipient { lock_id, .. }
            | Event::Timeout { lock_id, .. } => Some(*lock_id),
            Event::StashAdd { .. } | Event::StashRemove { .. } => None,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
