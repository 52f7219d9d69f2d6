//! Stash book: per-(token, asset-tag) advertised liquidity, ordered.
//!
//! ## Architecture
//!
//! Every `(token, asset-tag)` pair owns an intrusive singly-linked list of
//! stash entries in non-increasing order of amount, so external parties can
//! page through the largest sellers first without a sort:
//!
//! - **Slab**: one arena holds every node across all lists
//! - **Head map**: `(token, asset) → slab key` of the largest entry
//! - **Owner index**: `(token, asset, owner) → slab key` for O(1) lookups
//!
//! The links are slab keys, not pointers, so there is no cyclic ownership
//! to fight the borrow checker over.
//!
//! ## Ordering
//!
//! Strictly by amount descending. On ties, the most recently updated entry
//! sits last in its tie band (FIFO within ties); an update that does not
//! change an entry's position relative to its neighbours leaves the list
//! order untouched.
//!
//! ## Complexity
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | value_of  | O(1) |
//! | add       | O(k) |
//! | remove    | O(k) |
//! | list      | O(offset + limit) |
//!
//! where k is the length of the affected list. Lists are expected to stay
//! short (a handful of active sellers per asset pair), so no balanced tree
//! is used.

mod book;
mod node;

pub use book::{BookKey, StashBook};
pub use node::StashNode;
