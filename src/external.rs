//! External collaborators of the engine.
//!
//! ## Design
//!
//! The engine never reaches for ambient authority: the clock, the hash
//! primitive, the token ledger, native-value egress, and proxy lookups are
//! all trait seams supplied at construction. Each operation reads the
//! clock at most once and uses that value for every comparison it makes.
//!
//! Reference implementations live here too: [`SystemClock`]/[`ManualClock`],
//! [`Sha256Hasher`], [`InMemoryLedger`], and [`NoProxies`]/[`ProxyTable`].
//! The in-memory ledger backs the demo binary and the test suites; a real
//! deployment implements [`TokenLedger`] and [`NativeLedger`] against its
//! actual settlement layer.

use std::cell::Cell;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::types::{Amount, Digest, Principal, Timestamp};

// ============================================================================
// Traits
// ============================================================================

/// Monotonic wall-clock seconds provided by the host.
pub trait Clock {
    /// Current time in whole seconds.
    fn now(&self) -> Timestamp;
}

/// Deterministic 32-byte digest of a byte string.
///
/// Used both for the secret commitment `hashed_secret = hash(secret)` and
/// for lock-id derivation `lock_id = hash(encode(params))`.
pub trait Hasher {
    fn hash(&self, data: &[u8]) -> Digest;
}

/// External token ledger, `transferFrom`/`transfer` style.
///
/// A `false` return means the transfer did not happen; the engine treats
/// faulted calls the same way and rolls the whole operation back. The
/// native asset is never routed through this trait.
pub trait TokenLedger {
    /// Move `amount` of `token` from `from` to `to`.
    fn transfer_from(
        &mut self,
        token: Address,
        from: Principal,
        to: Principal,
        amount: Amount,
    ) -> bool;

    /// Move `amount` of `token` out of the engine's own holding to `to`.
    fn transfer(&mut self, token: Address, to: Principal, amount: Amount) -> bool;
}

/// Host hook for native-value egress.
///
/// Native ingress arrives with the operation envelope (the host collected
/// the attached value before invoking the engine), so only the outbound
/// direction needs a collaborator.
pub trait NativeLedger {
    /// Pay `amount` of the native asset to `to`.
    fn pay(&mut self, to: Principal, amount: Amount) -> bool;
}

/// Answers "which principal may act on behalf of this account?".
pub trait AccountDirectory {
    /// The registered proxy of `account`, or `None` for the null principal.
    fn proxy_of(&self, account: Principal) -> Option<Principal>;
}

// ============================================================================
// Clocks
// ============================================================================

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Settable clock for tests and the demo binary.
///
/// Interior mutability lets a test advance time through the engine's shared
/// clock reference without tearing the engine down.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Cell::new(start) }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    /// Move forward by `seconds`.
    pub fn advance(&self, seconds: u64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// SHA-256 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> Digest {
        B256::from_slice(Sha256::digest(data).as_slice())
    }
}

// ============================================================================
// Account directories
// ============================================================================

/// Directory with no registrations; every proxy call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxies;

impl AccountDirectory for NoProxies {
    fn proxy_of(&self, _account: Principal) -> Option<Principal> {
        None
    }
}

/// Directory backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct ProxyTable {
    proxies: HashMap<Principal, Principal>,
}

impl ProxyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `proxy` as the principal authorised to act for `account`.
    pub fn grant(&mut self, account: Principal, proxy: Principal) {
        self.proxies.insert(account, proxy);
    }

    /// Drop any registration for `account`.
    pub fn revoke(&mut self, account: Principal) {
        self.proxies.remove(&account);
    }
}

impl AccountDirectory for ProxyTable {
    fn proxy_of(&self, account: Principal) -> Option<Principal> {
        self.proxies.get(&account).copied()
    }
}

// ============================================================================
// In-memory ledger
// ============================================================================

/// Reference ledger tracking token balances and native payouts in memory.
///
/// `transfer` debits the configured vault account, mirroring the engine's
/// own holding on a real ledger. `fail_all` turns every call into a
/// reported failure, which is how the rollback paths are exercised.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    vault: Principal,
    balances: HashMap<(Address, Principal), Amount>,
    native: HashMap<Principal, Amount>,
    fail_all: bool,
}

impl InMemoryLedger {
    /// `vault` is the account the engine escrows into; `transfer` pays out
    /// of it.
    pub fn new(vault: Principal) -> Self {
        Self {
            vault,
            balances: HashMap::new(),
            native: HashMap::new(),
            fail_all: false,
        }
    }

    /// Credit `owner` with `amount` of `token` out of thin air.
    pub fn mint(&mut self, token: Address, owner: Principal, amount: Amount) {
        let balance = self.balances.entry((token, owner)).or_insert(Amount::ZERO);
        *balance = balance.checked_add(amount).expect("mint overflow");
    }

    /// Current token balance of `owner`.
    pub fn balance_of(&self, token: Address, owner: Principal) -> Amount {
        self.balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Total native value paid out to `owner` so far.
    pub fn native_paid(&self, owner: Principal) -> Amount {
        self.native.get(&owner).copied().unwrap_or(Amount::ZERO)
    }

    /// Force every subsequent call to report failure.
    pub fn set_fail_all(&mut self, fail: bool) {
        self.fail_all = fail;
    }

    fn shift(&mut self, token: Address, from: Principal, to: Principal, amount: Amount) -> bool {
        let available = self.balance_of(token, from);
        if available < amount {
            return false;
        }
        self.balances.insert((token, from), available - amount);
        let credit = self.balances.entry((token, to)).or_insert(Amount::ZERO);
        *credit = credit.checked_add(amount).expect("balance overflow");
        true
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer_from(
        &mut self,
        token: Address,
        from: Principal,
        to: Principal,
        amount: Amount,
    ) -> bool {
        !self.fail_all && self.shift(token, from, to, amount)
    }

    fn transfer(&mut self, token: Address, to: Principal, amount: Amount) -> bool {
        let vault = self.vault;
        !self.fail_all && self.shift(token, vault, to, amount)
    }
}

impl NativeLedger for InMemoryLedger {
    fn pay(&mut self, to: Principal, amount: Amount) -> bool {
        if self.fail_all {
            return false;
        }
        let credit = self.native.entry(to).or_insert(Amount::ZERO);
        *credit = credit.checked_add(amount).expect("native overflow");
        true
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
