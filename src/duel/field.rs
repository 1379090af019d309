//! Field
//!
//! One seat's slot topology: monster slots 1-5, spell/trap slots 6-10 and
//! the field spell slot 11. Lookups scan monster slots before spell/trap
//! slots.

use crate::core::layout::SeatLayout;
use crate::core::seat::Seat;
use crate::core::vec2::Vec2;
use super::card::{Card, CardId};
use super::slot::{SingleSlot, SlotKind};

/// Number of monster slots.
pub const MONSTER_SLOTS: usize = 5;

/// Number of spell/trap slots (excluding the field spell slot).
pub const SPELL_TRAP_SLOTS: usize = 5;

/// Slot topology of one seat.
#[derive(Clone, Debug)]
pub struct Field {
    monsters: [SingleSlot; MONSTER_SLOTS],
    /// Spell/trap slots followed by the field spell slot.
    spell_traps: [SingleSlot; SPELL_TRAP_SLOTS + 1],
}

impl Field {
    /// Build the field of a seat from its layout.
    pub fn new(seat: Seat) -> Self {
        let layout = SeatLayout::for_seat(seat);
        let monsters = std::array::from_fn(|i| {
            SingleSlot::new(i as u8 + 1, SlotKind::Monster, seat, layout.monster[i])
        });
        let spell_traps = std::array::from_fn(|i| {
            if i < SPELL_TRAP_SLOTS {
                SingleSlot::new(i as u8 + 6, SlotKind::SpellTrap, seat, layout.spell_trap[i])
            } else {
                SingleSlot::new(11, SlotKind::FieldSpell, seat, layout.field_spell)
            }
        });
        Self { monsters, spell_traps }
    }

    /// All slots, monsters first.
    pub fn slots(&self) -> impl Iterator<Item = &SingleSlot> {
        self.monsters.iter().chain(self.spell_traps.iter())
    }

    fn slots_mut(&mut self) -> impl Iterator<Item = &mut SingleSlot> {
        self.monsters.iter_mut().chain(self.spell_traps.iter_mut())
    }

    /// First free monster slot.
    pub fn free_monster_slot(&mut self) -> Option<&mut SingleSlot> {
        self.monsters.iter_mut().find(|s| !s.is_occupied())
    }

    /// First free spell/trap slot; never the field spell slot.
    pub fn free_spell_trap_slot(&mut self) -> Option<&mut SingleSlot> {
        self.spell_traps
            .iter_mut()
            .find(|s| s.kind() == SlotKind::SpellTrap && !s.is_occupied())
    }

    /// Is there a free monster slot?
    pub fn has_free_monster_slot(&self) -> bool {
        self.monsters.iter().any(|s| !s.is_occupied())
    }

    /// Is there a free spell/trap slot?
    pub fn has_free_spell_trap_slot(&self) -> bool {
        self.spell_traps
            .iter()
            .any(|s| s.kind() == SlotKind::SpellTrap && !s.is_occupied())
    }

    /// Slot holding a card.
    pub fn occupied_slot(&self, id: &CardId) -> Option<&SingleSlot> {
        self.slots().find(|s| s.holds(id))
    }

    /// Slot holding a card, mutably.
    pub fn occupied_slot_mut(&mut self, id: &CardId) -> Option<&mut SingleSlot> {
        self.slots_mut().find(|s| s.holds(id))
    }

    /// Card by id.
    pub fn find(&self, id: &CardId) -> Option<&Card> {
        self.occupied_slot(id).and_then(|s| s.card())
    }

    /// Card by id, mutably.
    pub fn find_mut(&mut self, id: &CardId) -> Option<&mut Card> {
        self.occupied_slot_mut(id).and_then(|s| s.card_mut())
    }

    /// Remove a card from whichever slot holds it.
    pub fn take(&mut self, id: &CardId) -> Option<Card> {
        self.occupied_slot_mut(id).and_then(|s| s.clear())
    }

    /// Occupant under `point`.
    pub fn active_card(&self, point: Vec2) -> Option<&CardId> {
        self.slots().find_map(|s| s.active_card(point))
    }

    /// Advance every occupant's animations.
    pub fn update(&mut self, dt: f32) {
        for slot in self.slots_mut() {
            slot.update(dt);
        }
    }
}
