//! Field Slots
//!
//! Single-occupancy board positions with a display counter.

use serde::{Serialize, Deserialize};

use crate::core::layout::{self, FIELD_CARD_SIZE, GROWTH_SPEED};
use crate::core::seat::Seat;
use crate::core::vec2::{Rect, Vec2};
use super::card::{Card, CardId, Location};

/// Highest counter value.
pub const MAX_COUNTER: u8 = 9;

/// Slot kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// Monster zone (slots 1-5)
    Monster,
    /// Spell/trap zone (slots 6-10)
    SpellTrap,
    /// Field spell zone (slot 11)
    FieldSpell,
}

/// One board position.
#[derive(Clone, Debug)]
pub struct SingleSlot {
    id: u8,
    kind: SlotKind,
    owner: Seat,
    coord: Vec2,
    card: Option<Card>,
    counter: u8,
}

impl SingleSlot {
    /// Create an empty slot.
    pub fn new(id: u8, kind: SlotKind, owner: Seat, coord: Vec2) -> Self {
        Self {
            id,
            kind,
            owner,
            coord,
            card: None,
            counter: 0,
        }
    }

    /// Slot number (1-11).
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Slot kind.
    #[inline]
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Owning seat.
    #[inline]
    pub fn owner(&self) -> Seat {
        self.owner
    }

    /// Board coordinate.
    #[inline]
    pub fn coord(&self) -> Vec2 {
        self.coord
    }

    /// Occupant.
    #[inline]
    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    /// Occupant, mutably.
    #[inline]
    pub fn card_mut(&mut self) -> Option<&mut Card> {
        self.card.as_mut()
    }

    /// Is a card here?
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.card.is_some()
    }

    /// Does the occupant have this id?
    #[inline]
    pub fn holds(&self, id: &CardId) -> bool {
        self.card.as_ref().is_some_and(|c| c.id() == id)
    }

    /// Counter value (0-9).
    #[inline]
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Bump the counter, saturating at 9.
    pub fn increment_counter(&mut self) {
        if self.counter < MAX_COUNTER {
            self.counter += 1;
        }
    }

    /// Lower the counter, saturating at 0.
    pub fn decrement_counter(&mut self) {
        self.counter = self.counter.saturating_sub(1);
    }

    /// Place a card, sending it to the slot coordinate.
    ///
    /// The caller must check the slot is free.
    pub(crate) fn occupy(&mut self, mut card: Card, dt: f32) {
        debug_assert!(self.card.is_none(), "slot {} already occupied", self.id);
        card.finish_turn();
        card.set_location(Location::Field);
        card.set_visible(true);
        card.move_to(self.coord, layout::SLOT_MOVE_TIME, dt);
        card.resize_to(FIELD_CARD_SIZE, GROWTH_SPEED, dt);
        self.card = Some(card);
    }

    /// Empty the slot, returning the occupant.
    pub(crate) fn clear(&mut self) -> Option<Card> {
        self.card.take()
    }

    /// Occupant under `point`, hit-testing the slot rectangle.
    pub fn active_card(&self, point: Vec2) -> Option<&CardId> {
        if !Rect::new(self.coord, FIELD_CARD_SIZE).contains(point) {
            return None;
        }
        self.card.as_ref().map(|c| c.id())
    }

    /// Advance the occupant's animations.
    pub fn update(&mut self, dt: f32) {
        if let Some(card) = &mut self.card {
            card.update(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duel::card::Turn;
    use crate::duel::card_info::CardInfo;

    fn card() -> Card {
        Card::new(CardId::from("slotcard0000000"), CardInfo::unknown("1001"), Seat::One, Location::Hand)
    }

    #[test]
    fn test_counter_saturates() {
        let mut slot = SingleSlot::new(1, SlotKind::Monster, Seat::One, Vec2::ZERO);
        slot.decrement_counter();
        assert_eq!(slot.counter(), 0);

        for _ in 0..20 {
            slot.increment_counter();
        }
        assert_eq!(slot.counter(), MAX_COUNTER);
        slot.decrement_counter();
        assert_eq!(slot.counter(), 8);
    }

    #[test]
    fn test_occupy_and_clear() {
        let mut slot = SingleSlot::new(3, SlotKind::Monster, Seat::One, Vec2::new(757.0, 502.0));
        slot.occupy(card(), 0.0);

        assert!(slot.is_occupied());
        assert!(slot.holds(&CardId::from("slotcard0000000")));
        let placed = slot.card().unwrap();
        assert_eq!(placed.location(), Location::Field);
        assert_eq!(placed.position(), slot.coord());

        let removed = slot.clear().unwrap();
        assert_eq!(removed.id().as_str(), "slotcard0000000");
        assert!(!slot.is_occupied());
    }

    #[test]
    fn test_occupy_commits_turn_in_flight() {
        let mut turning = card();
        assert!(turning.flip(layout::FLIP_SPEED, 1.0 / 60.0));

        let mut slot = SingleSlot::new(6, SlotKind::SpellTrap, Seat::One, Vec2::new(495.0, 631.0));
        slot.occupy(turning, 1.0 / 60.0);

        let placed = slot.card().unwrap();
        assert!(placed.is_face_up());
        assert_eq!(placed.turn(), Turn::Idle);
    }

    #[test]
    fn test_hit_uses_slot_rect() {
        let mut slot = SingleSlot::new(1, SlotKind::Monster, Seat::One, Vec2::new(495.0, 502.0));
        let inside = Vec2::new(500.0, 510.0);
        assert_eq!(slot.active_card(inside), None);

        slot.occupy(card(), 0.0);
        assert!(slot.active_card(inside).is_some());
        assert_eq!(slot.active_card(Vec2::new(10.0, 10.0)), None);
    }
}
