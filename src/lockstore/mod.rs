//! Escrow cell store: custody of active hash-timelocks.
//!
//! ## State machine (per lock-id)
//!
//! ```text
//!            create(amount > 0, id absent)
//!    absent ───────────────────────────────▶ EXISTS
//!                                              │ claim (unlock / decline / timeout)
//!                                              ▼
//!                                            absent
//! ```
//!
//! The store holds only `lock-id → amount`. Sender, recipient, secret hash
//! and timeout are not recorded: they are folded into the id itself, so a
//! successful lookup proves the caller supplied the exact original
//! parameters. Every terminal transition deletes the entry: a lock-id is
//! either absent or maps to a strictly positive amount.
//!
//! Which transition is allowed (preimage gates, timeout gates, caller
//! roles) is the engine's business; the store only enforces existence and
//! positivity.

mod store;

pub use store::LockStore;
