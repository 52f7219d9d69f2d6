//! Stash book implementation.

use std::collections::HashMap;

use slab::Slab;

use crate::stashbook::StashNode;
use crate::types::{Amount, AssetTag, Principal, Token};

/// Identity of one ordered list: a (token, counter-asset) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookKey {
    pub token: Token,
    pub asset: AssetTag,
}

impl BookKey {
    #[inline]
    pub fn new(token: Token, asset: AssetTag) -> Self {
        Self { token, asset }
    }
}

/// Ordered per-(token, asset-tag) stash balances.
///
/// Callers must uphold `delta > 0` on [`add`](StashBook::add) and
/// `delta <= value_of(..)` on [`remove`](StashBook::remove); the engine
/// checks both before calling in and surfaces the user-facing errors.
///
/// ## Example
///
/// ```
/// use swapvault::stashbook::{BookKey, StashBook};
/// use swapvault::types::Token;
/// use alloy_primitives::{Address, B256, U256};
///
/// let mut book = StashBook::new();
/// let key = BookKey::new(Token::Native, B256::repeat_byte(0xa1));
/// let alice = Address::repeat_byte(0xaa);
/// let bob = Address::repeat_byte(0xbb);
///
/// book.add(key, alice, U256::from(30u64));
/// book.add(key, bob, U256::from(50u64));
///
/// // Largest seller first.
/// let page = book.list(key, 0, 10);
/// assert_eq!(page[0], (bob, U256::from(50u64)));
/// assert_eq!(page[1], (alice, U256::from(30u64)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StashBook {
    /// Arena shared by every list.
    nodes: Slab<StashNode>,

    /// Largest entry of each non-empty list.
    heads: HashMap<BookKey, usize>,

    /// O(1) owner lookup. An owner appears at most once per book key.
    index: HashMap<(BookKey, Principal), usize>,
}

impl StashBook {
    /// Create a new empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book with pre-allocated node capacity.
    pub fn with_capacity(entries: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(entries),
            heads: HashMap::new(),
            index: HashMap::with_capacity(entries),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Stashed amount of `owner` under `key`, zero when absent.
    #[inline]
    pub fn value_of(&self, key: BookKey, owner: Principal) -> Amount {
        self.index
            .get(&(key, owner))
            .map(|&k| self.nodes[k].value)
            .unwrap_or(Amount::ZERO)
    }

    /// Page through the list in descending order of amount.
    ///
    /// Skips `offset` entries, then collects up to `limit`. A short or
    /// empty page means the list ended.
    pub fn list(&self, key: BookKey, offset: usize, limit: usize) -> Vec<(Principal, Amount)> {
        let mut cursor = self.heads.get(&key).copied();
        for _ in 0..offset {
            match cursor {
                Some(k) => cursor = self.nodes[k].next,
                None => return Vec::new(),
            }
        }

        let mut page = Vec::with_capacity(limit.min(16));
        while let Some(k) = cursor {
            if page.len() == limit {
                break;
            }
            let node = &self.nodes[k];
            page.push((node.owner, node.value));
            cursor = node.next;
        }
        page
    }

    /// Number of entries in one list.
    pub fn len(&self, key: BookKey) -> usize {
        let mut count = 0;
        let mut cursor = self.heads.get(&key).copied();
        while let Some(k) = cursor {
            count += 1;
            cursor = self.nodes[k].next;
        }
        count
    }

    /// Whether the list for `key` has no entries.
    #[inline]
    pub fn is_empty(&self, key: BookKey) -> bool {
        !self.heads.contains_key(&key)
    }

    /// Sum of all entries in one list.
    pub fn total(&self, key: BookKey) -> Amount {
        let mut sum = Amount::ZERO;
        let mut cursor = self.heads.get(&key).copied();
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            sum = sum.checked_add(node.value).expect("stash total overflow");
            cursor = node.next;
        }
        sum
    }

    /// Total number of nodes across all lists.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Grow (or create) `owner`'s entry by `delta`, relocating it so the
    /// list stays sorted. Returns the new total.
    ///
    /// # Panics
    ///
    /// Panics if `delta` is zero or the new total overflows.
    pub fn add(&mut self, key: BookKey, owner: Principal, delta: Amount) -> Amount {
        assert!(!delta.is_zero(), "stash add of zero");

        match self.index.get(&(key, owner)).copied() {
            Some(node_key) => {
                self.unlink(key, node_key);
                let node = &mut self.nodes[node_key];
                node.value = node.value.checked_add(delta).expect("stash overflow");
                let total = node.value;
                self.link_sorted(key, node_key);
                total
            }
            None => {
                let node_key = self.nodes.insert(StashNode::new(owner, delta));
                self.index.insert((key, owner), node_key);
                self.link_sorted(key, node_key);
                delta
            }
        }
    }

    /// Shrink `owner`'s entry by `delta`, relocating or destroying it.
    /// Returns the new total (zero when the entry was drained).
    ///
    /// # Panics
    ///
    /// Panics if `owner` has no entry or `delta` exceeds its value. The
    /// engine validates both and raises `StashNotBigEnough` first.
    pub fn remove(&mut self, key: BookKey, owner: Principal, delta: Amount) -> Amount {
        let node_key = *self
            .index
            .get(&(key, owner))
            .expect("stash remove of absent owner");

        self.unlink(key, node_key);

        let remaining = self.nodes[node_key]
            .value
            .checked_sub(delta)
            .expect("stash remove underflow");

        if remaining.is_zero() {
            self.nodes.remove(node_key);
            self.index.remove(&(key, owner));
        } else {
            self.nodes[node_key].value = remaining;
            self.link_sorted(key, node_key);
        }
        remaining
    }

    // ========================================================================
    // List surgery
    // ========================================================================

    /// Detach `node_key` from its list, fixing the head or its
    /// predecessor's link. The node stays in the slab.
    fn unlink(&mut self, key: BookKey, node_key: usize) {
        let head = *self.heads.get(&key).expect("unlink from empty list");
        let next = self.nodes[node_key].next;

        if head == node_key {
            match next {
                Some(n) => {
                    self.heads.insert(key, n);
                }
                None => {
                    self.heads.remove(&key);
                }
            }
        } else {
            let mut cursor = head;
            loop {
                let succ = self.nodes[cursor].next.expect("unlinked node not in list");
                if succ == node_key {
                    break;
                }
                cursor = succ;
            }
            self.nodes[cursor].next = next;
        }
        self.nodes[node_key].next = None;
    }

    /// Splice a detached node back in, after every entry whose amount is
    /// greater than or equal to its own. Ties therefore keep their
    /// first-come order.
    fn link_sorted(&mut self, key: BookKey, node_key: usize) {
        let value = self.nodes[node_key].value;

        match self.heads.get(&key).copied() {
            None => {
                self.nodes[node_key].next = None;
                self.heads.insert(key, node_key);
            }
            Some(head) if self.nodes[head].value < value => {
                self.nodes[node_key].next = Some(head);
                self.heads.insert(key, node_key);
            }
            Some(head) => {
                let mut cursor = head;
                while let Some(succ) = self.nodes[cursor].next {
                    if self.nodes[succ].value < value {
                        break;
                    }
                    cursor = succ;
                }
                self.nodes[node_key].next = self.nodes[cursor].next;
                self.nodes[cursor].next = Some(node_key);
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
