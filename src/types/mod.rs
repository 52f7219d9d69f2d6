//! Core data types for the swap engine.
//!
//! ## Types
//!
//! - [`Principal`], [`AssetTag`], [`Digest`], [`Amount`], [`Timestamp`]:
//!   primitive aliases over `alloy-primitives` fixed-width types
//! - [`Token`]: native-or-external asset denomination
//! - [`LockId`]: content-derived escrow cell key
//! - [`LockParams`]: the parameter tuple a lock-id is derived from
//! - [`Event`]: emitted on every successful operation
//!
//! All wire-visible types derive `serde` traits for off-chain indexing.

mod event;
mod params;
mod primitives;

// Re-export all types at module level
pub use event::Event;
pub use params::{LockParams, ENCODED_LEN};
pub use primitives::{Amount, AssetTag, Digest, LockId, Principal, Timestamp, Token};
