//! Lock parameter tuple and its canonical encoding.
//!
//! ## Canonical encoding
//!
//! A lock is keyed by the hasher digest of a fixed-width concatenation of
//! its parameters. Every field occupies a fixed number of bytes, so no two
//! distinct parameter tuples can share an encoding, and the leading tag
//! byte keeps native and token lock-ids in disjoint domains:
//!
//! ```text
//! byte  0        token tag (0 = native, 1 = external)
//! bytes 1..21    token address (all-zero for native)
//! bytes 21..41   sender
//! bytes 41..61   recipient
//! bytes 61..93   hashed secret
//! bytes 93..101  timeout, big-endian u64
//! ```
//!
//! The store never records these fields: given the caller-supplied
//! parameters the key is re-derived, and a lookup hit proves the caller
//! named the lock exactly.

use serde::{Deserialize, Serialize};

use crate::external::Hasher;
use crate::types::{Digest, LockId, Principal, Timestamp, Token};

/// Size of the canonical encoding: 1 + 20 + 20 + 20 + 32 + 8.
pub const ENCODED_LEN: usize = 101;

/// The full parameter tuple identifying one escrow cell.
///
/// ## Example
///
/// ```
/// use swapvault::types::{LockParams, Token};
/// use swapvault::external::Sha256Hasher;
/// use alloy_primitives::{Address, B256};
///
/// let params = LockParams {
///     token: Token::Native,
///     sender: Address::repeat_byte(0xaa),
///     recipient: Address::repeat_byte(0xbb),
///     hashed_secret: B256::repeat_byte(0x01),
///     timeout: 1_000,
/// };
///
/// let id = params.lock_id(&Sha256Hasher);
/// assert_eq!(id, params.lock_id(&Sha256Hasher)); // deterministic
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockParams {
    /// Asset denomination of the locked value.
    pub token: Token,
    /// The principal whose value is escrowed; refunds route here.
    pub sender: Principal,
    /// The principal a successful unlock pays out to.
    pub recipient: Principal,
    /// `Hasher(secret)` commitment.
    pub hashed_secret: Digest,
    /// Wall-clock second at which the lock becomes refundable.
    pub timeout: Timestamp,
}

impl LockParams {
    /// Canonical fixed-width encoding of the parameter tuple.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut buf = [0u8; ENCODED_LEN];
        buf[0] = self.token.tag_byte();
        buf[1..21].copy_from_slice(self.token.address_or_zero().as_slice());
        buf[21..41].copy_from_slice(self.sender.as_slice());
        buf[41..61].copy_from_slice(self.recipient.as_slice());
        buf[61..93].copy_from_slice(self.hashed_secret.as_slice());
        buf[93..101].copy_from_slice(&self.timeout.to_be_bytes());
        buf
    }

    /// Derive the lock-id: the hasher digest of the canonical encoding.
    pub fn lock_id<H: Hasher>(&self, hasher: &H) -> LockId {
        LockId(hasher.hash(&self.encode()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::Sha256Hasher;
    use alloy_primitives::{Address, B256};

    fn base_params() -> LockParams {
        LockParams {
            token: Token::Native,
            sender: Address::repeat_byte(0xaa),
            recipient: Address::repeat_byte(0xbb),
            hashed_secret: B256::repeat_byte(0x01),
            timeout: 1_000,
        }
    }

    #[test]
    fn test_encoding_is_fixed_width() {
        assert_eq!(base_params().encode().len(), ENCODED_LEN);
    }

    #[test]
    fn test_encoding_layout() {
        let params = base_params();
        let buf = params.encode();

        assert_eq!(buf[0], 0); // native tag
        assert_eq!(&buf[1..21], Address::ZERO.as_slice());
        assert_eq!(&buf[21..41], params.sender.as_slice());
        assert_eq!(&buf[41..61], params.recipient.as_slice());
        assert_eq!(&buf[61..93], params.hashed_secret.as_slice());
        assert_eq!(&buf[93..101], &1_000u64.to_be_bytes());
    }

    #[test]
    fn test_timeout_changes_lock_id() {
        let a = base_params();
        let mut b = a;
        b.timeout += 1;

        assert_ne!(a.lock_id(&Sha256Hasher), b.lock_id(&Sha256Hasher));
    }

    #[test]
    fn test_native_and_token_ids_disjoint() {
        // Same everything, different denomination domain.
        let native = base_params();
        let mut token = native;
        token.token = Token::External(Address::ZERO);

        assert_ne!(native.lock_id(&Sha256Hasher), token.lock_id(&Sha256Hasher));
    }

    #[test]
    fn test_every_field_feeds_the_id() {
        let base = base_params();
        let base_id = base.lock_id(&Sha256Hasher);

        let variants = [
            LockParams { sender: Address::repeat_byte(0xac), ..base },
            LockParams { recipient: Address::repeat_byte(0xad), ..base },
            LockParams { hashed_secret: B256::repeat_byte(0x02), ..base },
            LockParams { timeout: 999, ..base },
            LockParams {
                token: Token::External(Address::repeat_byte(0x10)),
                ..base
            },
        ];

        for variant in variants {
            assert_ne!(variant.lock_id(&Sha256Hasher), base_id);
        }
    }
}
