//! # Swapvault
//!
//! Hash-timelock atomic-swap escrow engine.
//!
//! ## Architecture
//!
//! The engine custodies fungible value for two counterparties exchanging
//! assets across independent ledgers, without a trusted coordinator:
//!
//! - **Types**: principals, asset tags, lock parameters, events
//! - **LockStore**: content-addressed escrow cells, resolved by preimage
//!   revelation or wall-clock timeout
//! - **StashBook**: per-(token, asset-tag) advertised liquidity, kept as a
//!   descending intrusive ordered list so callers can page largest-first
//! - **SwapEngine**: the public operation surface tying it all together
//! - **External**: trait seams for the clock, hasher, ledgers and the
//!   account-proxy directory
//!
//! ## Design Principles
//!
//! 1. **Determinism**: lock-ids are digests of a fixed-width canonical
//!    encoding; identical parameters always name the identical lock
//! 2. **Atomicity**: every operation commits or rolls back in full, and
//!    emits events only on commit
//! 3. **Effects before interactions**: escrow state is finalised before
//!    any external ledger call
//! 4. **Checked arithmetic**: amounts are 256-bit and never wrap
//!
//! ## Example
//!
//! ```
//! use swapvault::{SwapEngine, Token};
//! use swapvault::external::{Hasher, InMemoryLedger, ManualClock, NoProxies, Sha256Hasher};
//! use alloy_primitives::{Address, B256, U256};
//!
//! let vault = Address::repeat_byte(0xee);
//! let mut engine = SwapEngine::new(
//!     vault,
//!     ManualClock::new(0),
//!     Sha256Hasher,
//!     InMemoryLedger::new(vault),
//!     NoProxies,
//! );
//!
//! let alice = Address::repeat_byte(0xaa);
//! let bob = Address::repeat_byte(0xbb);
//! let secret = b"preimage only alice knows";
//! let hashed = Sha256Hasher.hash(secret);
//!
//! // Alice escrows 100 native units for Bob, refundable from t=1000.
//! let lock_id = engine
//!     .lock_buy(
//!         alice,
//!         Token::Native,
//!         bob,
//!         hashed,
//!         1_000,
//!         B256::repeat_byte(0xa1),
//!         U256::from(1u64),
//!         U256::from(100u64),
//!     )
//!     .unwrap();
//! assert_eq!(engine.lock_value(lock_id), U256::from(100u64));
//!
//! // Bob settles with the revealed preimage before the timeout.
//! engine
//!     .unlock_by_recipient(bob, Token::Native, alice, secret, 1_000)
//!     .unwrap();
//! assert_eq!(engine.lock_value(lock_id), U256::ZERO);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: principals, tokens, lock parameters, events
pub mod types;

/// Error taxonomy shared by every operation
pub mod error;

/// External collaborator traits and reference implementations
pub mod external;

/// Lock store: escrow cells under the hash-timelock state machine
pub mod lockstore;

/// Stash book: descending ordered liquidity per (token, asset-tag)
pub mod stashbook;

/// Swap engine: the public operation surface
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use engine::SwapEngine;
pub use error::{EngineError, EngineResult};
pub use lockstore::LockStore;
pub use stashbook::{BookKey, StashBook};
pub use types::{Amount, AssetTag, Digest, Event, LockId, LockParams, Principal, Timestamp, Token};
