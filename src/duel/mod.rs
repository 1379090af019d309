//! Replicated duel state.
//!
//! Cards, zones and the per-player action vocabulary. Everything here is
//! driven only by actions and seeded streams, so two peers replaying the
//! same actions in the same order reach the same state.

pub mod card;
pub mod card_info;
pub mod slot;
pub mod stack;
pub mod field;
pub mod player;
pub mod action;
pub mod deck_list;

pub use card::{Card, CardId, Location, Stance};
pub use card_info::{CardDatabase, CardInfo, CardKind, MemoryCardDatabase};
pub use slot::{SingleSlot, SlotKind};
pub use stack::{Stack, StackPolicy, ZoneError};
pub use field::Field;
pub use player::{ActionOutcome, DuelError, Player};
pub use action::{DuelAction, PileAction, PileTarget};
pub use deck_list::DeckList;
