//! Core deterministic primitives.
//!
//! Randomness and hashing in this module are designed for perfect
//! cross-platform determinism: both peers must derive identical card ids,
//! shuffles and digests from the same seeds and the same call sequence.
//! Geometry and layout only feed animation and pointer hit-testing.

pub mod seat;
pub mod vec2;
pub mod rng;
pub mod hash;
pub mod layout;

// Re-export core types
pub use seat::Seat;
pub use vec2::{Vec2, Rect};
pub use rng::{DeterministicRng, RngContext};
pub use hash::{compute_state_hash, StateHash, StateHasher};
