//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ algorithm for fast, high-quality, deterministic randomness.
//! Given the same seed, produces identical sequence on all platforms.
//!
//! Each seat owns an independent stream. Both peers seed the stream of a
//! given physical player from the same handshake string, so card ids and
//! shuffles computed on either side agree as long as the call sequence does.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use super::seat::Seat;

/// Alphabet for card instance ids.
pub const ID_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG will produce the exact same sequence
/// of random numbers on any platform.
///
/// # Example
///
/// ```
/// use duel_sync::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::from_seed_str("abc123");
/// let mut b = DeterministicRng::from_seed_str("abc123");
/// assert_eq!(a.card_id(15), b.card_id(15));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create RNG from a handshake seed string.
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(derive_seed(seed))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a card instance id of `len` alphanumeric characters.
    pub fn card_id(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| ID_ALPHABET[self.next_int(ID_ALPHABET.len() as u32) as usize] as char)
            .collect()
    }

    /// Shuffle a slice in place using Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_int((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a 64-bit stream seed from a handshake seed string.
///
/// Both peers hash the exact bytes transmitted in the `SEED` field, so
/// any string (including an empty one) maps to the same stream everywhere.
pub fn derive_seed(seed: &str) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"DUEL_SYNC_SEED_V1");
    hasher.update(seed.as_bytes());

    let hash = hasher.finalize();

    let mut first = [0u8; 8];
    first.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(first)
}

// =============================================================================
// RNG CONTEXT
// =============================================================================

/// All randomness of one duel process.
///
/// Owns one deterministic stream per seat plus an entropy-seeded generator
/// that only ever produces handshake seeds.
#[derive(Debug)]
pub struct RngContext {
    streams: [DeterministicRng; 2],
    seeds: [Option<String>; 2],
    handshake: StdRng,
}

impl Default for RngContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RngContext {
    /// Create a context with default (unsynchronized) seat streams.
    pub fn new() -> Self {
        Self {
            streams: [DeterministicRng::default(), DeterministicRng::default()],
            seeds: [None, None],
            handshake: StdRng::from_entropy(),
        }
    }

    /// Create a context whose seat streams are already seeded.
    pub fn seeded(seat_one: &str, seat_two: &str) -> Self {
        let mut ctx = Self::new();
        ctx.reseed(Seat::One, seat_one);
        ctx.reseed(Seat::Two, seat_two);
        ctx
    }

    /// Re-seed the stream bound to `seat`.
    pub fn reseed(&mut self, seat: Seat, seed: &str) {
        let idx = Self::index(seat);
        self.streams[idx] = DeterministicRng::from_seed_str(seed);
        self.seeds[idx] = Some(seed.to_string());
    }

    /// The seed string last applied to `seat`, if any.
    pub fn seed(&self, seat: Seat) -> Option<&str> {
        self.seeds[Self::index(seat)].as_deref()
    }

    /// Mutable access to the stream bound to `seat`.
    pub fn stream(&mut self, seat: Seat) -> &mut DeterministicRng {
        &mut self.streams[Self::index(seat)]
    }

    /// Produce a fresh handshake seed from the entropy-seeded generator.
    ///
    /// Never used for anything that affects replicated state.
    pub fn handshake_seed(&mut self, len: usize) -> String {
        (&mut self.handshake)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    #[inline]
    fn index(seat: Seat) -> usize {
        match seat {
            Seat::One => 0,
            Seat::Two => 1,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        // Same seed must produce same sequence
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_known_values() {
        // These values must never change!
        // If they do, peers on different builds stop agreeing.
        let mut rng = DeterministicRng::new(42);
        assert_eq!(rng.next_u64(), 16629283624882167704);
        assert_eq!(rng.next_u64(), 1420492921613871959);
        assert_eq!(rng.next_u64(), 9768315062676884790);
    }

    #[test]
    fn test_next_int() {
        let mut rng = DeterministicRng::new(1234);

        for _ in 0..1000 {
            assert!(rng.next_int(62) < 62);
        }

        // Edge cases
        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_seed_string_determinism() {
        let mut a = DeterministicRng::from_seed_str("abc123");
        let mut b = DeterministicRng::from_seed_str("abc123");

        let ids_a: Vec<String> = (0..40).map(|_| a.card_id(15)).collect();
        let ids_b: Vec<String> = (0..40).map(|_| b.card_id(15)).collect();
        assert_eq!(ids_a, ids_b);

        let mut deck_a: Vec<u32> = (0..40).collect();
        let mut deck_b = deck_a.clone();
        a.shuffle(&mut deck_a);
        b.shuffle(&mut deck_b);
        assert_eq!(deck_a, deck_b);
    }

    #[test]
    fn test_different_seed_strings_diverge() {
        let mut a = DeterministicRng::from_seed_str("abc123");
        let mut b = DeterministicRng::from_seed_str("abc124");
        assert_ne!(a.card_id(15), b.card_id(15));
    }

    #[test]
    fn test_card_id_shape() {
        let mut rng = DeterministicRng::from_seed_str("XY9Z");
        let id = rng.card_id(15);
        assert_eq!(id.len(), 15);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = DeterministicRng::new(1111);
        let mut arr: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut arr);

        let mut sorted = arr.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
        assert_ne!(arr, sorted);
    }

    #[test]
    fn test_state_checkpoint() {
        let mut rng = DeterministicRng::new(5555);
        for _ in 0..50 {
            rng.next_u64();
        }

        let saved_state = rng.state();
        let next_values: Vec<u64> = (0..10).map(|_| rng.next_u64()).collect();
        rng.set_state(saved_state);

        for expected in next_values {
            assert_eq!(rng.next_u64(), expected);
        }
    }

    #[test]
    fn test_context_streams_are_independent() {
        let mut ctx = RngContext::seeded("seat-one", "seat-two");
        let mut reference = DeterministicRng::from_seed_str("seat-two");

        // Draining seat one must not disturb seat two.
        for _ in 0..100 {
            ctx.stream(Seat::One).next_u64();
        }
        assert_eq!(ctx.stream(Seat::Two).next_u64(), reference.next_u64());
        assert_eq!(ctx.seed(Seat::One), Some("seat-one"));
    }

    #[test]
    fn test_handshake_seed_shape() {
        let mut ctx = RngContext::new();
        let seed = ctx.handshake_seed(8);
        assert_eq!(seed.len(), 8);
        assert!(seed.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(ctx.seed(Seat::One), None);
    }
}
