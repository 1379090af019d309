//! State Hashing for Verification
//!
//! Provides deterministic hashing of duel state for:
//! - Convergence checks between the two peers
//! - Replay validation in tests
//!
//! Only replicated state is hashed. Animation progress, positions and the
//! face orientation of hand cards are local rendering concerns and never
//! enter a digest.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for duel state.
///
/// Wraps SHA-256 with helpers for the primitive types duel state is built
/// from. Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for a player's replicated state.
    pub fn for_duel_state() -> Self {
        Self::new(b"DUEL_SYNC_STATE_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    ///
    /// The prefix keeps `("ab", "c")` and `("a", "bc")` distinct.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute a duel state hash.
///
/// The seat number is not hashed: seats are perspective-relative, and a
/// player's local digest must equal the digest of its mirror on the peer.
pub fn compute_state_hash<F>(add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_duel_state();
    add_state(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_determinism() {
        let h1 = compute_state_hash(|h| h.update_str("deck"));
        let h2 = compute_state_hash(|h| h.update_str("deck"));
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_order_changes_hash() {
        let h1 = compute_state_hash(|h| {
            h.update_str("1001");
            h.update_str("1002");
        });
        let h2 = compute_state_hash(|h| {
            h.update_str("1002");
            h.update_str("1001");
        });
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_string_boundaries_matter() {
        let h1 = compute_state_hash(|h| {
            h.update_str("ab");
            h.update_str("c");
        });
        let h2 = compute_state_hash(|h| {
            h.update_str("a");
            h.update_str("bc");
        });
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_domain_separation() {
        let mut a = StateHasher::new(b"DOMAIN_A");
        let mut b = StateHasher::new(b"DOMAIN_B");
        a.update_bytes(b"same data");
        b.update_bytes(b"same data");
        assert_ne!(a.finalize(), b.finalize());
    }
}
