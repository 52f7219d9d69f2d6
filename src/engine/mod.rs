//! Swap engine module: the public operation surface.
//!
//! ## Design Principles
//!
//! 1. **Atomicity**: every operation commits or aborts in its entirety;
//!    a failed operation leaves no partial state and emits no event
//! 2. **Effects before interactions**: lock and stash state is finalised
//!    before any outbound ledger call, and restored if that call fails
//! 3. **One clock read**: each operation samples the clock at most once
//!    and uses that value for all of its comparisons
//! 4. **Synchronous execution**: no async, single writer, operations on
//!    the same engine linearize trivially
//!
//! ## Example
//!
//! ```
//! use swapvault::engine::SwapEngine;
//! use swapvault::external::{InMemoryLedger, ManualClock, NoProxies, Sha256Hasher};
//! use swapvault::types::Token;
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
//! let bob = Address::repeat_byte(0xbb);
//! engine
//!     .deposit_stash(bob, Token::Native, B256::repeat_byte(0xa1), U256::from(80u64))
//!     .unwrap();
//!
//! assert_eq!(
//!     engine.stash_value(Token::Native, B256::repeat_byte(0xa1), bob),
//!     U256::from(80u64),
//! );
//! ```

mod swap;

pub use swap::SwapEngine;
