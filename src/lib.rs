//! # Duel Sync
//!
//! Replicated state core for a two-player trading card duel played
//! peer-to-peer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         DUEL SYNC                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Seeded per-seat streams, seed derivation  │
//! │  ├── hash.rs     - State digests for convergence checks      │
//! │  ├── vec2.rs     - Board geometry                            │
//! │  ├── layout.rs   - Coordinates, card sizes, speeds           │
//! │  └── seat.rs     - Seat identifiers                          │
//! │                                                              │
//! │  duel/           - Replicated duel state (deterministic)     │
//! │  ├── card.rs     - Card orientation state machine            │
//! │  ├── stack.rs    - Decks, hand, graveyard, banish            │
//! │  ├── slot.rs     - Single-occupancy field slots              │
//! │  ├── field.rs    - Slot topology per seat                    │
//! │  ├── player.rs   - Legality-gated player actions             │
//! │  ├── action.rs   - Action vocabulary and key codes           │
//! │  ├── card_info.rs- Card definition lookup                    │
//! │  └── deck_list.rs- Deck file parsing                         │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── protocol.rs - Command grammar                           │
//! │  ├── transport.rs- Length-prefixed framing, FIFO             │
//! │  └── session.rs  - Handshake and tick loop                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Each peer holds its own player and a mirror of the opponent. Both are
//! driven only by actions and by per-seat streams seeded during the
//! handshake:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time in duel logic
//! - All replicated randomness from seeded Xorshift128+
//!
//! Replaying the same commands in the same order produces the same
//! digest for a player on both peers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod duel;
pub mod network;

// Re-export commonly used types
pub use core::rng::{DeterministicRng, RngContext};
pub use core::seat::Seat;
pub use core::vec2::Vec2;
pub use duel::{
    ActionOutcome, Card, CardDatabase, CardId, DeckList, DuelAction, DuelError,
    MemoryCardDatabase, PileAction, PileTarget, Player,
};
pub use network::{DuelMessage, DuelSession, LocalInput, SessionConfig, SessionError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default TCP port
pub const DEFAULT_PORT: u16 = 6969;

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Length of generated card ids
pub const CARD_ID_LEN: usize = 15;

/// Length of handshake seeds
pub const SEED_LEN: usize = 8;
