//! Primitive identifier and value types for the escrow engine.
//!
//! ## Representation
//!
//! All identifiers reuse the fixed-width byte types from `alloy-primitives`:
//!
//! - [`Principal`]: 20-byte account identifier (`Address`)
//! - [`AssetTag`]: 32-byte opaque counter-asset label (`B256`)
//! - [`Digest`]: 32-byte hasher output (`B256`)
//! - [`Amount`]: unsigned 256-bit value (`U256`), checked arithmetic only
//! - [`Timestamp`]: unsigned seconds since the epoch
//!
//! ## Why U256?
//!
//! Escrowed amounts aggregate external token balances whose supplies are
//! 256-bit on the ledgers this engine fronts. Checked arithmetic everywhere;
//! wraparound is never a valid outcome.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Account identifier, authenticated by the host environment.
pub type Principal = Address;

/// Opaque 32-byte label naming the counter-asset a stash or lock is
/// advertising for. The engine assigns no semantics beyond equality.
pub type AssetTag = B256;

/// 32-byte output of the [`Hasher`](crate::external::Hasher).
pub type Digest = B256;

/// Escrowed value. All arithmetic on amounts is checked.
pub type Amount = U256;

/// Wall-clock seconds supplied by the [`Clock`](crate::external::Clock).
pub type Timestamp = u64;

// ============================================================================
// Token
// ============================================================================

/// The asset denomination of a lock or stash.
///
/// `Native` is the distinguished sentinel for the chain's own asset: it is
/// never routed through the [`TokenLedger`](crate::external::TokenLedger),
/// and its ingress amount is carried by the operation envelope. External
/// tokens are identified by their 20-byte ledger address.
///
/// ## Example
///
/// ```
/// use swapvault::types::Token;
/// use alloy_primitives::Address;
///
/// let native = Token::Native;
/// let token = Token::External(Address::repeat_byte(0x42));
///
/// assert!(native.is_native());
/// assert!(!token.is_native());
/// assert_ne!(native.tag_byte(), token.tag_byte());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// The chain's native asset. No TokenLedger involvement.
    Native,
    /// An external token, moved via `transferFrom`/`transfer`.
    External(Address),
}

impl Token {
    /// Whether this is the native sentinel.
    #[inline]
    pub fn is_native(self) -> bool {
        matches!(self, Token::Native)
    }

    /// Domain-separation tag used in the canonical lock-id encoding:
    /// 0 for native, 1 for external tokens.
    #[inline]
    pub fn tag_byte(self) -> u8 {
        match self {
            Token::Native => 0,
            Token::External(_) => 1,
        }
    }

    /// The token address, zero-filled for the native sentinel.
    ///
    /// Only meaningful together with [`Token::tag_byte`]: an external token
    /// at the zero address and the native sentinel still encode differently.
    #[inline]
    pub fn address_or_zero(self) -> Address {
        match self {
            Token::Native => Address::ZERO,
            Token::External(addr) => addr,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Native => write!(f, "native"),
            Token::External(addr) => write!(f, "{addr}"),
        }
    }
}

// ============================================================================
// LockId
// ============================================================================

/// Content-derived key of an escrow cell.
///
/// A `LockId` is the hasher digest of the canonical encoding of the lock
/// parameters (see [`LockParams`](crate::types::LockParams)); it is only
/// ever produced by that derivation or carried verbatim from an event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct LockId(pub B256);

impl LockId {
    /// Raw digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl From<B256> for LockId {
    fn from(digest: B256) -> Self {
        LockId(digest)
    }
}

impl std::fmt::Display for LockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
