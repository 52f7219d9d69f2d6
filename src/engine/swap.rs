//! Swap engine implementation.
//!
//! ## Responsibilities
//!
//! For each public operation the engine (1) validates amounts, (2) derives
//! the lock-id from the canonical parameter encoding, (3) coordinates
//! ledger ingress/egress, stash mutations and lock transitions as one
//! atomic unit, (4) emits an event, and (5) rolls everything back on any
//! failure.
//!
//! ## Reentrancy
//!
//! Escrow state is finalised before any outbound ledger call. A ledger
//! implementation that calls back into the engine therefore observes the
//! lock as already absent; in this synchronous setting the borrow rules
//! reduce such reentrancy to a sequential second call, which fails with
//! `LockNotFound`. A failed ledger call restores the claimed state and
//! aborts with `TokenTransferFailed`.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::external::{AccountDirectory, Clock, Hasher, NativeLedger, TokenLedger};
use crate::lockstore::LockStore;
use crate::stashbook::{BookKey, StashBook};
use crate::types::{
    Amount, AssetTag, Digest, Event, LockId, LockParams, Principal, Timestamp, Token,
};

/// Hash-timelock escrow engine over a lock store and a stash book.
///
/// Generic over its external collaborators: the clock, the hash primitive,
/// a combined token/native ledger, and the proxy directory. The engine's
/// own `account` is the receiving side of every token ingress.
#[derive(Debug)]
pub struct SwapEngine<C, H, L, D> {
    /// The engine's holding account on the token ledger.
    account: Principal,
    clock: C,
    hasher: H,
    ledger: L,
    directory: D,
    locks: LockStore,
    stashes: StashBook,
    /// Events of successful operations, in emission order.
    events: Vec<Event>,
}

impl<C, H, L, D> SwapEngine<C, H, L, D>
where
    C: Clock,
    H: Hasher,
    L: TokenLedger + NativeLedger,
    D: AccountDirectory,
{
    /// Create an engine with empty stores.
    pub fn new(account: Principal, clock: C, hasher: H, ledger: L, directory: D) -> Self {
        Self {
            account,
            clock,
            hasher,
            ledger,
            directory,
            locks: LockStore::new(),
            stashes: StashBook::new(),
            events: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The engine's holding account.
    #[inline]
    pub fn account(&self) -> Principal {
        self.account
    }

    /// Shared access to the clock collaborator.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Shared access to the ledger collaborator.
    #[inline]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the ledger collaborator (test setup).
    #[inline]
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Mutable access to the proxy directory (test setup).
    #[inline]
    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    /// The lock store, read-only.
    #[inline]
    pub fn locks(&self) -> &LockStore {
        &self.locks
    }

    /// The stash book, read-only.
    #[inline]
    pub fn stash_book(&self) -> &StashBook {
        &self.stashes
    }

    /// Events emitted so far.
    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    /// Amount held under a lock-id, zero when absent.
    #[inline]
    pub fn lock_value(&self, id: LockId) -> Amount {
        self.locks.peek(id)
    }

    /// Amount held under the lock these parameters name, zero when absent.
    pub fn lock_value_of(&self, params: &LockParams) -> Amount {
        self.locks.peek(params.lock_id(&self.hasher))
    }

    /// Derive the lock-id for a parameter tuple without touching state.
    pub fn lock_id_of(&self, params: &LockParams) -> LockId {
        params.lock_id(&self.hasher)
    }

    /// Stashed amount of `owner` for `(token, asset)`.
    pub fn stash_value(&self, token: Token, asset: AssetTag, owner: Principal) -> Amount {
        self.stashes.value_of(BookKey::new(token, asset), owner)
    }

    /// Page through the `(token, asset)` stash list, largest seller first.
    pub fn stash_page(
        &self,
        token: Token,
        asset: AssetTag,
        offset: usize,
        limit: usize,
    ) -> Vec<(Principal, Amount)> {
        self.stashes.list(BookKey::new(token, asset), offset, limit)
    }

    // ========================================================================
    // Lock creation
    // ========================================================================

    /// Lock `amount` from the caller's external balance for `recipient`,
    /// advertising `sell_asset` at `sell_price` as the wanted counter-leg.
    ///
    /// Token value is pulled via `transferFrom`; native value must have
    /// arrived with the operation envelope.
    #[allow(clippy::too_many_arguments)]
    pub fn lock_buy(
        &mut self,
        caller: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        sell_asset: AssetTag,
        sell_price: Amount,
        amount: Amount,
    ) -> EngineResult<LockId> {
        require_positive(amount)?;
        let params = LockParams {
            token,
            sender: caller,
            recipient,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        if self.locks.contains(lock_id) {
            return Err(EngineError::LockAlreadyExists(lock_id));
        }

        self.collect(token, caller, amount)?;
        self.locks.create(lock_id, amount)?;
        debug!(%lock_id, %amount, "buy lock created");
        self.emit(Event::BuyLock {
            token,
            sender: caller,
            recipient,
            hashed_secret,
            timeout,
            amount,
            lock_id,
            sell_asset,
            sell_price,
        });
        Ok(lock_id)
    }

    /// Lock `amount` for `recipient`, drawing the value out of the
    /// caller's `(token, stash_asset)` stash. `buy_lock_id` names the
    /// buy-side lock this sell answers; the engine only echoes it.
    #[allow(clippy::too_many_arguments)]
    pub fn lock_sell(
        &mut self,
        caller: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        stash_asset: AssetTag,
        amount: Amount,
        buy_lock_id: LockId,
    ) -> EngineResult<LockId> {
        self.lock_sell_for(
            caller,
            token,
            recipient,
            hashed_secret,
            timeout,
            stash_asset,
            amount,
            buy_lock_id,
        )
    }

    /// [`lock_sell`](Self::lock_sell) on behalf of `account`; the caller
    /// must be its registered proxy.
    #[allow(clippy::too_many_arguments)]
    pub fn lock_sell_proxy(
        &mut self,
        caller: Principal,
        account: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        stash_asset: AssetTag,
        amount: Amount,
        buy_lock_id: LockId,
    ) -> EngineResult<LockId> {
        self.require_proxy(account, caller)?;
        self.lock_sell_for(
            account,
            token,
            recipient,
            hashed_secret,
            timeout,
            stash_asset,
            amount,
            buy_lock_id,
        )
    }

    /// Sell-side lock funded directly from the caller's balance instead of
    /// a stash.
    #[allow(clippy::too_many_arguments)]
    pub fn lock_sell_direct(
        &mut self,
        caller: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        buy_asset: AssetTag,
        amount: Amount,
        buy_lock_id: LockId,
    ) -> EngineResult<LockId> {
        require_positive(amount)?;
        let params = LockParams {
            token,
            sender: caller,
            recipient,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        if self.locks.contains(lock_id) {
            return Err(EngineError::LockAlreadyExists(lock_id));
        }

        self.collect(token, caller, amount)?;
        self.locks.create(lock_id, amount)?;
        debug!(%lock_id, %amount, "direct sell lock created");
        self.emit(Event::SellLock {
            token,
            sender: caller,
            recipient,
            hashed_secret,
            timeout,
            amount,
            lock_id,
            buy_asset,
            buy_lock_id,
        });
        Ok(lock_id)
    }

    #[allow(clippy::too_many_arguments)]
    fn lock_sell_for(
        &mut self,
        seller: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        stash_asset: AssetTag,
        amount: Amount,
        buy_lock_id: LockId,
    ) -> EngineResult<LockId> {
        require_positive(amount)?;
        let params = LockParams {
            token,
            sender: seller,
            recipient,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        if self.locks.contains(lock_id) {
            return Err(EngineError::LockAlreadyExists(lock_id));
        }

        let book = BookKey::new(token, stash_asset);
        if self.stashes.value_of(book, seller) < amount {
            return Err(EngineError::StashNotBigEnough {
                owner: seller,
                asset: stash_asset,
                requested: amount,
            });
        }

        // Value moves stash -> lock entirely inside the engine.
        self.stashes.remove(book, seller, amount);
        self.locks.create(lock_id, amount)?;
        debug!(%lock_id, %amount, "sell lock created from stash");
        self.emit(Event::SellLock {
            token,
            sender: seller,
            recipient,
            hashed_secret,
            timeout,
            amount,
            lock_id,
            buy_asset: stash_asset,
            buy_lock_id,
        });
        Ok(lock_id)
    }

    // ========================================================================
    // Lock resolution
    // ========================================================================

    /// Counterparty-initiated cancellation: the declared recipient returns
    /// the lock to its sender. No preimage, no timeout gate.
    pub fn decline_by_recipient(
        &mut self,
        caller: Principal,
        token: Token,
        sender: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
    ) -> EngineResult<()> {
        let params = LockParams {
            token,
            sender,
            recipient: caller,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        let amount = self.locks.claim(lock_id)?;

        if !self.payout(token, sender, amount) {
            self.locks.create(lock_id, amount)?;
            return Err(self.transfer_failed(token, sender, amount));
        }
        debug!(%lock_id, %amount, "lock declined");
        self.emit(Event::DeclineByRecipient {
            token,
            sender,
            recipient: caller,
            lock_id,
        });
        Ok(())
    }

    /// Settle a lock as its sender by revealing the preimage; the value
    /// routes to the declared recipient.
    ///
    /// A wrong preimage derives a different lock-id and surfaces as
    /// `LockNotFound`.
    pub fn unlock_by_sender(
        &mut self,
        caller: Principal,
        token: Token,
        recipient: Principal,
        secret: &[u8],
        timeout: Timestamp,
    ) -> EngineResult<()> {
        let now = self.clock.now();
        let hashed_secret = self.hasher.hash(secret);
        let params = LockParams {
            token,
            sender: caller,
            recipient,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        if !self.locks.contains(lock_id) {
            return Err(EngineError::LockNotFound(lock_id));
        }
        if now >= timeout {
            return Err(EngineError::LockTimedOut(lock_id));
        }

        let amount = self.locks.claim(lock_id)?;
        if !self.payout(token, recipient, amount) {
            self.locks.create(lock_id, amount)?;
            return Err(self.transfer_failed(token, recipient, amount));
        }
        debug!(%lock_id, %amount, "unlocked by sender");
        self.emit(Event::UnlockBySender {
            token,
            sender: caller,
            recipient,
            lock_id,
            secret: secret.to_vec(),
        });
        Ok(())
    }

    /// Settle a lock as its recipient by revealing the preimage; the value
    /// routes to the caller.
    pub fn unlock_by_recipient(
        &mut self,
        caller: Principal,
        token: Token,
        sender: Principal,
        secret: &[u8],
        timeout: Timestamp,
    ) -> EngineResult<()> {
        self.unlock_by_recipient_for(caller, token, sender, secret, timeout)
    }

    /// [`unlock_by_recipient`](Self::unlock_by_recipient) on behalf of
    /// `account`; the payout goes to `account`, not the caller.
    pub fn unlock_by_recipient_proxy(
        &mut self,
        caller: Principal,
        account: Principal,
        token: Token,
        sender: Principal,
        secret: &[u8],
        timeout: Timestamp,
    ) -> EngineResult<()> {
        self.require_proxy(account, caller)?;
        self.unlock_by_recipient_for(account, token, sender, secret, timeout)
    }

    fn unlock_by_recipient_for(
        &mut self,
        recipient: Principal,
        token: Token,
        sender: Principal,
        secret: &[u8],
        timeout: Timestamp,
    ) -> EngineResult<()> {
        let now = self.clock.now();
        let hashed_secret = self.hasher.hash(secret);
        let params = LockParams {
            token,
            sender,
            recipient,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        if !self.locks.contains(lock_id) {
            return Err(EngineError::LockNotFound(lock_id));
        }
        if now >= timeout {
            return Err(EngineError::LockTimedOut(lock_id));
        }

        let amount = self.locks.claim(lock_id)?;
        if !self.payout(token, recipient, amount) {
            self.locks.create(lock_id, amount)?;
            return Err(self.transfer_failed(token, recipient, amount));
        }
        debug!(%lock_id, %amount, "unlocked by recipient");
        self.emit(Event::UnlockByRecipient {
            token,
            sender,
            recipient,
            lock_id,
            secret: secret.to_vec(),
        });
        Ok(())
    }

    /// Refund an expired lock to its sender's external balance.
    pub fn timeout_value(
        &mut self,
        caller: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
    ) -> EngineResult<()> {
        self.timeout_value_for(caller, token, recipient, hashed_secret, timeout)
    }

    /// [`timeout_value`](Self::timeout_value) on behalf of `account`; the
    /// refund goes to `account`.
    pub fn timeout_value_proxy(
        &mut self,
        caller: Principal,
        account: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
    ) -> EngineResult<()> {
        self.require_proxy(account, caller)?;
        self.timeout_value_for(account, token, recipient, hashed_secret, timeout)
    }

    fn timeout_value_for(
        &mut self,
        sender: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
    ) -> EngineResult<()> {
        let now = self.clock.now();
        let params = LockParams {
            token,
            sender,
            recipient,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        if !self.locks.contains(lock_id) {
            return Err(EngineError::LockNotFound(lock_id));
        }
        if now < timeout {
            return Err(EngineError::LockNotTimedOut(lock_id));
        }

        let amount = self.locks.claim(lock_id)?;
        if !self.payout(token, sender, amount) {
            self.locks.create(lock_id, amount)?;
            return Err(self.transfer_failed(token, sender, amount));
        }
        debug!(%lock_id, %amount, "lock timed out to sender");
        self.emit(Event::Timeout {
            token,
            sender,
            recipient,
            lock_id,
        });
        Ok(())
    }

    /// Refund an expired lock into the sender's `(token, stash_asset)`
    /// stash instead of their external balance. No ledger call is made.
    pub fn timeout_stash(
        &mut self,
        caller: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        stash_asset: AssetTag,
    ) -> EngineResult<()> {
        self.timeout_stash_for(caller, token, recipient, hashed_secret, timeout, stash_asset)
    }

    /// [`timeout_stash`](Self::timeout_stash) on behalf of `account`; the
    /// refund lands in `account`'s stash.
    #[allow(clippy::too_many_arguments)]
    pub fn timeout_stash_proxy(
        &mut self,
        caller: Principal,
        account: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        stash_asset: AssetTag,
    ) -> EngineResult<()> {
        self.require_proxy(account, caller)?;
        self.timeout_stash_for(account, token, recipient, hashed_secret, timeout, stash_asset)
    }

    fn timeout_stash_for(
        &mut self,
        sender: Principal,
        token: Token,
        recipient: Principal,
        hashed_secret: Digest,
        timeout: Timestamp,
        stash_asset: AssetTag,
    ) -> EngineResult<()> {
        let now = self.clock.now();
        let params = LockParams {
            token,
            sender,
            recipient,
            hashed_secret,
            timeout,
        };
        let lock_id = params.lock_id(&self.hasher);
        if !self.locks.contains(lock_id) {
            return Err(EngineError::LockNotFound(lock_id));
        }
        if now < timeout {
            return Err(EngineError::LockNotTimedOut(lock_id));
        }

        let amount = self.locks.claim(lock_id)?;
        self.stashes
            .add(BookKey::new(token, stash_asset), sender, amount);
        debug!(%lock_id, %amount, "lock timed out into stash");
        self.emit(Event::Timeout {
            token,
            sender,
            recipient,
            lock_id,
        });
        Ok(())
    }

    // ========================================================================
    // Stash operations
    // ========================================================================

    /// Advertise liquidity: move `amount` from the caller's external
    /// balance into their `(token, asset)` stash.
    pub fn deposit_stash(
        &mut self,
        caller: Principal,
        token: Token,
        asset: AssetTag,
        amount: Amount,
    ) -> EngineResult<()> {
        require_positive(amount)?;
        self.collect(token, caller, amount)?;
        self.stashes.add(BookKey::new(token, asset), caller, amount);
        self.emit(Event::StashAdd {
            token,
            account: caller,
            asset,
            amount,
        });
        Ok(())
    }

    /// Withdraw `amount` (the full balance when `None`) from the caller's
    /// stash back to their external balance.
    pub fn withdraw_stash(
        &mut self,
        caller: Principal,
        token: Token,
        asset: AssetTag,
        amount: Option<Amount>,
    ) -> EngineResult<()> {
        let book = BookKey::new(token, asset);
        let held = self.stashes.value_of(book, caller);
        let amount = amount.unwrap_or(held);
        require_positive(amount)?;
        if amount > held {
            return Err(EngineError::StashNotBigEnough {
                owner: caller,
                asset,
                requested: amount,
            });
        }

        self.stashes.remove(book, caller, amount);
        if !self.payout(token, caller, amount) {
            self.stashes.add(book, caller, amount);
            return Err(self.transfer_failed(token, caller, amount));
        }
        self.emit(Event::StashRemove {
            token,
            account: caller,
            asset,
            amount,
        });
        Ok(())
    }

    /// Re-advertise `amount` of stashed value under a different
    /// counter-asset tag. Value never leaves the engine.
    pub fn move_stash(
        &mut self,
        caller: Principal,
        token: Token,
        from_asset: AssetTag,
        to_asset: AssetTag,
        amount: Amount,
    ) -> EngineResult<()> {
        require_positive(amount)?;
        let from = BookKey::new(token, from_asset);
        if self.stashes.value_of(from, caller) < amount {
            return Err(EngineError::StashNotBigEnough {
                owner: caller,
                asset: from_asset,
                requested: amount,
            });
        }

        self.stashes.remove(from, caller, amount);
        self.stashes.add(BookKey::new(token, to_asset), caller, amount);
        self.emit(Event::StashRemove {
            token,
            account: caller,
            asset: from_asset,
            amount,
        });
        self.emit(Event::StashAdd {
            token,
            account: caller,
            asset: to_asset,
            amount,
        });
        Ok(())
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Proxy gate: the directory must name `caller` for `account`.
    fn require_proxy(&self, account: Principal, caller: Principal) -> EngineResult<()> {
        match self.directory.proxy_of(account) {
            Some(proxy) if proxy == caller => Ok(()),
            _ => Err(EngineError::InvalidProxy { account, caller }),
        }
    }

    /// Ingress: pull token value from `from` into the engine's holding.
    /// Native value travels with the operation envelope instead.
    fn collect(&mut self, token: Token, from: Principal, amount: Amount) -> EngineResult<()> {
        match token {
            Token::Native => Ok(()),
            Token::External(addr) => {
                if self.ledger.transfer_from(addr, from, self.account, amount) {
                    Ok(())
                } else {
                    Err(EngineError::TokenTransferFailed {
                        token,
                        from,
                        to: self.account,
                        amount,
                    })
                }
            }
        }
    }

    /// Egress: push value out of the engine to `to`.
    fn payout(&mut self, token: Token, to: Principal, amount: Amount) -> bool {
        match token {
            Token::Native => self.ledger.pay(to, amount),
            Token::External(addr) => self.ledger.transfer(addr, to, amount),
        }
    }

    fn transfer_failed(&self, token: Token, to: Principal, amount: Amount) -> EngineError {
        EngineError::TokenTransferFailed {
            token,
            from: self.account,
            to,
            amount,
        }
    }

    fn emit(&mut self, event: Event) {
        debug!(kind = event.kind(), "event emitted");
        self.events.push(event);
    }
}

/// Positive-amount gate shared by every value-bearing operation.
#[inline]
fn require_positive(amount: Amount) -> EngineResult<()> {
    if amount.is_zero() {
        Err(EngineError::ZeroValue)
    } else {
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{InMemoryLedger, ManualClock, ProxyTable, Sha256Hasher};
    use alloy_primitives::{Address, B256, U256};

    const VAULT: Address = Address::repeat_byte(0xee);
    const ALICE: Address = Address::repeat_byte(0xaa);
    const BOB: Address = Address::repeat_byte(0xbb);
    const CAROL: Address = Address::repeat_byte(0xcc);
    const TOKEN_ADDR: Address = Address::repeat_byte(0x42);

    const ASSET: B256 = B256::repeat_byte(0xa1);
    const SECRET: &[u8] = b"swap secret preimage";

    type TestEngine = SwapEngine<ManualClock, Sha256Hasher, InMemoryLedger, ProxyTable>;

    fn engine() -> TestEngine {
        SwapEngine::new(
            VAULT,
            ManualClock::new(0),
            Sha256Hasher,
            InMemoryLedger::new(VAULT),
            ProxyTable::new(),
        )
    }

    fn hs() -> Digest {
        Sha256Hasher.hash(SECRET)
    }

    fn amt(v: u64) -> Amount {
        U256::from(v)
    }

    fn buy_lock(engine: &mut TestEngine, token: Token, amount: u64, timeout: u64) -> LockId {
        engine
            .lock_buy(ALICE, token, BOB, hs(), timeout, ASSET, amt(1), amt(amount))
            .expect("buy lock")
    }

    #[test]
    fn test_lock_buy_zero_amount_rejected() {
        let mut engine = engine();

        let result = engine.lock_buy(ALICE, Token::Native, BOB, hs(), 1_000, ASSET, amt(1), amt(0));
        assert_eq!(result, Err(EngineError::ZeroValue));
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_lock_buy_records_lock_and_event() {
        let mut engine = engine();

        let id = buy_lock(&mut engine, Token::Native, 100, 1_000);

        assert_eq!(engine.lock_value(id), amt(100));
        assert_eq!(engine.events().len(), 1);
        assert_eq!(engine.events()[0].kind(), "BuyLock");
        assert_eq!(engine.events()[0].lock_id(), Some(id));
    }

    #[test]
    fn test_duplicate_lock_rejected() {
        let mut engine = engine();
        let id = buy_lock(&mut engine, Token::Native, 100, 1_000);

        let again = engine.lock_buy(
            ALICE,
            Token::Native,
            BOB,
            hs(),
            1_000,
            ASSET,
            amt(1),
            amt(100),
        );
        assert_eq!(again, Err(EngineError::LockAlreadyExists(id)));
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn test_timeout_only_difference_yields_distinct_lock() {
        let mut engine = engine();
        let first = buy_lock(&mut engine, Token::Native, 100, 1_000);
        let second = buy_lock(&mut engine, Token::Native, 100, 1_001);

        assert_ne!(first, second);
        assert_eq!(engine.locks().len(), 2);
    }

    #[test]
    fn test_token_lock_buy_pulls_via_ledger() {
        let mut engine = engine();
        engine.ledger_mut().mint(TOKEN_ADDR, ALICE, amt(500));

        buy_lock(&mut engine, Token::External(TOKEN_ADDR), 100, 1_000);

        assert_eq!(engine.ledger().balance_of(TOKEN_ADDR, ALICE), amt(400));
        assert_eq!(engine.ledger().balance_of(TOKEN_ADDR, VAULT), amt(100));
    }

    #[test]
    fn test_token_lock_buy_ingress_failure_aborts_clean() {
        let mut engine = engine();
        // No balance minted: transferFrom reports failure.
        let result = engine.lock_buy(
            ALICE,
            Token::External(TOKEN_ADDR),
            BOB,
            hs(),
            1_000,
            ASSET,
            amt(1),
            amt(100),
        );

        assert!(matches!(
            result,
            Err(EngineError::TokenTransferFailed { .. })
        ));
        assert!(engine.locks().is_empty());
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_unlock_by_recipient_routes_to_caller() {
        let mut engine = engine();
        buy_lock(&mut engine, Token::Native, 100, 1_000);

        engine
            .unlock_by_recipient(BOB, Token::Native, ALICE, SECRET, 1_000)
            .unwrap();

        assert!(engine.locks().is_empty());
        assert_eq!(engine.ledger().native_paid(BOB), amt(100));
        assert_eq!(engine.events()[1].kind(), "UnlockByRecipient");
    }

    #[test]
    fn test_unlock_by_sender_routes_to_recipient() {
        let mut engine = engine();
        buy_lock(&mut engine, Token::Native, 100, 1_000);

        engine
            .unlock_by_sender(ALICE, Token::Native, BOB, SECRET, 1_000)
            .unwrap();

        assert_eq!(engine.ledger().native_paid(BOB), amt(100));
        assert_eq!(engine.events()[1].kind(), "UnlockBySender");
    }

    #[test]
    fn test_unlock_with_wrong_secret_is_not_found() {
        let mut engine = engine();
        buy_lock(&mut engine, Token::Native, 100, 1_000);

        let result = engine.unlock_by_recipient(BOB, Token::Native, ALICE, b"wrong", 1_000);

        assert!(matches!(result, Err(EngineError::LockNotFound(_))));
        assert_eq!(engine.locks().len(), 1);
    }

    #[test]
    fn test_unlock_boundary_at_timeout() {
        let mut engine = engine();
        let id = buy_lock(&mut engine, Token::Native, 100, 1_000);

        engine.clock().set(1_000);
        let late = engine.unlock_by_recipient(BOB, Token::Native, ALICE, SECRET, 1_000);
        assert_eq!(late, Err(EngineError::LockTimedOut(id)));

        engine.clock().set(999);
        engine
            .unlock_by_recipient(BOB, Token::Native, ALICE, SECRET, 1_000)
            .unwrap();
    }

    #[test]
    fn test_timeout_boundary() {
        let mut engine = engine();
        let id = buy_lock(&mut engine, Token::Native, 100, 1_000);

        engine.clock().set(999);
        let early = engine.timeout_value(ALICE, Token::Native, BOB, hs(), 1_000);
        assert_eq!(early, Err(EngineError::LockNotTimedOut(id)));

        engine.clock().set(1_000);
        engine
            .timeout_value(ALICE, Token::Native, BOB, hs(), 1_000)
            .unwrap();
        assert_eq!(engine.ledger().native_paid(ALICE), amt(100));
    }

    #[test]
    fn test_decline_works_at_any_time() {
        let mut engine = engine();
        engine.ledger_mut().mint(TOKEN_ADDR, ALICE, amt(70));
        buy_lock(&mut engine, Token::External(TOKEN_ADDR), 70, 1_000);

        // Way past timeout, no preimage.
        engine.clock().set(1_000_000);
        engine
            .decline_by_recipient(BOB, Token::External(TOKEN_ADDR), ALICE, hs(), 1_000)
            .unwrap();

        assert_eq!(engine.ledger().balance_of(TOKEN_ADDR, ALICE), amt(70));
        assert!(engine.locks().is_empty());
        assert_eq!(engine.events()[1].kind(), "DeclineByRecipient");
    }

    #[test]
    fn test_decline_of_absent_lock_is_not_found() {
        let mut engine = engine();

        let result = engine.decline_by_recipient(BOB, Token::Native, ALICE, hs(), 1_000);
        assert!(matches!(result, Err(EngineError::LockNotFound(_))));
    }

    #[test]
    fn test_egress_failure_restores_lock() {
        let mut engine = engine();
        let id = buy_lock(&mut engine, Token::Native, 100, 1_000);

        engine.ledger_mut().set_fail_all(true);
        let result = engine.unlock_by_recipient(BOB, Token::Native, ALICE, SECRET, 1_000);

        assert!(matches!(
            result,
            Err(EngineError::TokenTransferFailed { .. })
        ));
        // Rolled back: lock intact, no unlock event.
        assert_eq!(engine.lock_value(id), amt(100));
        assert_eq!(engine.events().len(), 1);

        engine.ledger_mut().set_fail_all(false);
        engine
            .unlock_by_recipient(BOB, Token::Native, ALICE, SECRET, 1_000)
            .unwrap();
    }

    #[test]
    fn test_second_claim_observes_absent_lock() {
        // The sequential shape of a reentrant claim: state is finalised
        // before egress, so a re-entered call finds nothing.
        let mut engine = engine();
        buy_lock(&mut engine, Token::Native, 100, 1_000);

        engine
            .unlock_by_recipient(BOB, Token::Native, ALICE, SECRET, 1_000)
            .unwrap();
        let again = engine.unlock_by_recipient(BOB, Token::Native, ALICE, SECRET, 1_000);

        assert!(matches!(again, Err(EngineError::LockNotFound(_))));
        assert_eq!(engine.ledger().native_paid(BOB), amt(100));
    }

    #[test]
    fn test_deposit_withdraw_round_trip() {
        let mut engine = engine();
        engine.ledger_mut().mint(TOKEN_ADDR, BOB, amt(80));
        let token = Token::External(TOKEN_ADDR);

        engine.deposit_stash(BOB, token, ASSET, amt(80)).unwrap();
        assert_eq!(engine.ledger().balance_of(TOKEN_ADDR, BOB), amt(0));
        assert_eq!(engine.stash_value(token, ASSET, BOB), amt(80));

        engine.withdraw_stash(BOB, token, ASSET, Some(amt(80))).unwrap();
        assert_eq!(engine.ledger().balance_of(TOKEN_ADDR, BOB), amt(80));
        assert_eq!(engine.stash_value(token, ASSET, BOB), amt(0));

        let kinds: Vec<_> = engine.events().iter().map(Event::kind).collect();
        assert_eq!(kinds, vec!["StashAdd", "StashRemove"]);
    }

    #[test]
    fn test_withdraw_defaults_to_full_balance() {
        let mut engine = engine();
        engine
            .deposit_stash(BOB, Token::Native, ASSET, amt(80))
            .unwrap();

        engine.withdraw_stash(BOB, Token::Native, ASSET, None).unwrap();

        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(0));
        assert_eq!(engine.ledger().native_paid(BOB), amt(80));
    }

    #[test]
    fn test_withdraw_empty_stash_is_zero_value() {
        let mut engine = engine();

        let result = engine.withdraw_stash(BOB, Token::Native, ASSET, None);
        assert_eq!(result, Err(EngineError::ZeroValue));
    }

    #[test]
    fn test_withdraw_too_much_is_stash_not_big_enough() {
        let mut engine = engine();
        engine
            .deposit_stash(BOB, Token::Native, ASSET, amt(10))
            .unwrap();

        let result = engine.withdraw_stash(BOB, Token::Native, ASSET, Some(amt(11)));
        assert!(matches!(
            result,
            Err(EngineError::StashNotBigEnough { .. })
        ));
        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(10));
    }

    #[test]
    fn test_withdraw_egress_failure_restores_stash() {
        let mut engine = engine();
        engine
            .deposit_stash(BOB, Token::Native, ASSET, amt(50))
            .unwrap();

        engine.ledger_mut().set_fail_all(true);
        let result = engine.withdraw_stash(BOB, Token::Native, ASSET, None);

        assert!(matches!(
            result,
            Err(EngineError::TokenTransferFailed { .. })
        ));
        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(50));
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn test_move_stash_reassigns_asset_tag() {
        let mut engine = engine();
        let other: B256 = B256::repeat_byte(0xa2);
        engine
            .deposit_stash(BOB, Token::Native, ASSET, amt(50))
            .unwrap();

        engine
            .move_stash(BOB, Token::Native, ASSET, other, amt(20))
            .unwrap();

        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(30));
        assert_eq!(engine.stash_value(Token::Native, other, BOB), amt(20));

        let kinds: Vec<_> = engine.events().iter().map(Event::kind).collect();
        assert_eq!(kinds, vec!["StashAdd", "StashRemove", "StashAdd"]);
    }

    #[test]
    fn test_lock_sell_draws_from_stash() {
        let mut engine = engine();
        engine
            .deposit_stash(BOB, Token::Native, ASSET, amt(200))
            .unwrap();

        let buy_id = LockId(B256::repeat_byte(0x99));
        let id = engine
            .lock_sell(BOB, Token::Native, ALICE, hs(), 900, ASSET, amt(50), buy_id)
            .unwrap();

        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(150));
        assert_eq!(engine.lock_value(id), amt(50));
        match &engine.events()[1] {
            Event::SellLock { buy_lock_id, buy_asset, .. } => {
                assert_eq!(*buy_lock_id, buy_id);
                assert_eq!(*buy_asset, ASSET);
            }
            other => panic!("expected SellLock, got {}", other.kind()),
        }
    }

    #[test]
    fn test_lock_sell_without_stash_rejected() {
        let mut engine = engine();

        let result = engine.lock_sell(
            BOB,
            Token::Native,
            ALICE,
            hs(),
            900,
            ASSET,
            amt(50),
            LockId::default(),
        );

        assert!(matches!(
            result,
            Err(EngineError::StashNotBigEnough { .. })
        ));
    }

    #[test]
    fn test_lock_sell_direct_takes_direct_funds() {
        let mut engine = engine();
        engine.ledger_mut().mint(TOKEN_ADDR, BOB, amt(50));

        let id = engine
            .lock_sell_direct(
                BOB,
                Token::External(TOKEN_ADDR),
                ALICE,
                hs(),
                900,
                ASSET,
                amt(50),
                LockId::default(),
            )
            .unwrap();

        assert_eq!(engine.lock_value(id), amt(50));
        assert_eq!(engine.ledger().balance_of(TOKEN_ADDR, BOB), amt(0));
        assert_eq!(engine.events()[0].kind(), "SellLock");
    }

    #[test]
    fn test_timeout_stash_returns_value_to_stash() {
        let mut engine = engine();
        engine
            .deposit_stash(BOB, Token::Native, ASSET, amt(80))
            .unwrap();
        engine
            .lock_sell(BOB, Token::Native, CAROL, hs(), 200, ASSET, amt(30), LockId::default())
            .unwrap();
        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(50));

        engine.clock().set(201);
        engine
            .timeout_stash(BOB, Token::Native, CAROL, hs(), 200, ASSET)
            .unwrap();

        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(80));
        assert!(engine.locks().is_empty());
        assert_eq!(engine.events().last().map(Event::kind), Some("Timeout"));
    }

    #[test]
    fn test_timeout_stash_absent_lock_is_not_found() {
        let mut engine = engine();
        engine.clock().set(500);

        let result = engine.timeout_stash(BOB, Token::Native, CAROL, hs(), 200, ASSET);
        assert!(matches!(result, Err(EngineError::LockNotFound(_))));
        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(0));
    }

    #[test]
    fn test_proxy_rejected_without_grant() {
        let mut engine = engine();
        buy_lock(&mut engine, Token::Native, 100, 1_000);
        engine.clock().set(1_000);

        let result = engine.timeout_value_proxy(CAROL, ALICE, Token::Native, BOB, hs(), 1_000);
        assert_eq!(
            result,
            Err(EngineError::InvalidProxy {
                account: ALICE,
                caller: CAROL,
            })
        );
        assert_eq!(engine.locks().len(), 1);
    }

    #[test]
    fn test_proxy_acts_for_account() {
        let mut engine = engine();
        buy_lock(&mut engine, Token::Native, 100, 1_000);
        engine.directory_mut().grant(ALICE, CAROL);
        engine.clock().set(1_000);

        engine
            .timeout_value_proxy(CAROL, ALICE, Token::Native, BOB, hs(), 1_000)
            .unwrap();

        // The refund goes to the account, not the proxy.
        assert_eq!(engine.ledger().native_paid(ALICE), amt(100));
        assert_eq!(engine.ledger().native_paid(CAROL), amt(0));
    }

    #[test]
    fn test_proxy_sell_draws_from_account_stash() {
        let mut engine = engine();
        engine
            .deposit_stash(BOB, Token::Native, ASSET, amt(200))
            .unwrap();
        engine.directory_mut().grant(BOB, CAROL);

        engine
            .lock_sell_proxy(
                CAROL,
                BOB,
                Token::Native,
                ALICE,
                hs(),
                900,
                ASSET,
                amt(50),
                LockId::default(),
            )
            .unwrap();

        assert_eq!(engine.stash_value(Token::Native, ASSET, BOB), amt(150));
        // Sender role belongs to the account: Alice unlocks against BOB.
        engine
            .unlock_by_recipient(ALICE, Token::Native, BOB, SECRET, 900)
            .unwrap();
        assert_eq!(engine.ledger().native_paid(ALICE), amt(50));
    }

    #[test]
    fn test_unlock_by_recipient_proxy_pays_account() {
        let mut engine = engine();
        buy_lock(&mut engine, Token::Native, 100, 1_000);
        engine.directory_mut().grant(BOB, CAROL);

        engine
            .unlock_by_recipient_proxy(CAROL, BOB, Token::Native, ALICE, SECRET, 1_000)
            .unwrap();

        assert_eq!(engine.ledger().native_paid(BOB), amt(100));
        assert_eq!(engine.ledger().native_paid(CAROL), amt(0));
    }
}
