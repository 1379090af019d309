//! Stacks
//!
//! Ordered card collections with a top: main deck, fusion deck, graveyard,
//! banish pile and hand. One concrete [`Stack`] type serves them all; the
//! per-zone differences live in a [`StackPolicy`] value.
//!
//! Piles support spreading: the top `exposed` cards slide left in
//! half-card steps so cards beneath the top become selectable. A collapsed
//! pile exposes only its top card.

use thiserror::Error;
use tracing::debug;

use crate::core::layout::{self, FIELD_CARD_SIZE, GROWTH_SPEED, HAND_CARD_SIZE};
use crate::core::rng::DeterministicRng;
use crate::core::seat::Seat;
use crate::core::vec2::Vec2;
use super::card::{Card, CardId, Location, Stance};
use super::card_info::CardDatabase;

/// Cards kept visible beneath an animating top card.
pub const SETTLE_VISIBLE_DEPTH: usize = 5;

/// Stack errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    /// Popped an empty stack
    #[error("pop from empty {}", .0.label())]
    EmptyStack(Location),
}

// =============================================================================
// POLICY
// =============================================================================

/// Orientation a card takes on entering a stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Snap to face-down attack.
    FaceDown,
    /// Turn toward face-up attack.
    Reveal,
    /// Straighten to attack; the owning seat turns up fresh draws.
    Hand,
}

/// How a stack lays its cards out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrangement {
    /// All cards on one anchor, spreadable.
    Pile,
    /// Cards fanned out side by side.
    Fan,
}

/// Per-zone stack behaviour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackPolicy {
    /// Location assigned to inserted cards
    pub location: Location,
    /// Orientation on entry
    pub entry: Entry,
    /// Layout
    pub arrangement: Arrangement,
    /// Only answer pointer queries while spread
    pub spread_gated: bool,
    /// Size cards take on entry
    pub card_size: Vec2,
}

impl StackPolicy {
    /// Main deck: face-down, selectable only while spread.
    pub fn main_deck() -> Self {
        Self {
            location: Location::MainDeck,
            entry: Entry::FaceDown,
            arrangement: Arrangement::Pile,
            spread_gated: true,
            card_size: FIELD_CARD_SIZE,
        }
    }

    /// Fusion deck: face-down, selectable only while spread.
    pub fn fusion_deck() -> Self {
        Self {
            location: Location::FusionDeck,
            ..Self::main_deck()
        }
    }

    /// Graveyard: face-up.
    pub fn graveyard() -> Self {
        Self {
            location: Location::Graveyard,
            entry: Entry::Reveal,
            arrangement: Arrangement::Pile,
            spread_gated: false,
            card_size: FIELD_CARD_SIZE,
        }
    }

    /// Banish pile: face-up.
    pub fn banish() -> Self {
        Self {
            location: Location::Banish,
            ..Self::graveyard()
        }
    }

    /// Hand: draws are revealed to their owner, concealed on the mirrored
    /// seat.
    pub fn hand() -> Self {
        Self {
            location: Location::Hand,
            entry: Entry::Hand,
            arrangement: Arrangement::Fan,
            spread_gated: false,
            card_size: HAND_CARD_SIZE,
        }
    }
}

// =============================================================================
// STACK
// =============================================================================

/// Ordered card collection; index 0 is the bottom.
#[derive(Clone, Debug)]
pub struct Stack {
    owner: Seat,
    coord: Vec2,
    policy: StackPolicy,
    cards: Vec<Card>,
    exposed: usize,
    displacement: f32,
    relayout_pending: bool,
}

impl Stack {
    /// Create an empty stack anchored at `coord`.
    pub fn new(owner: Seat, coord: Vec2, policy: StackPolicy) -> Self {
        Self {
            owner,
            coord,
            policy,
            cards: Vec::new(),
            exposed: 1,
            displacement: 0.0,
            relayout_pending: false,
        }
    }

    /// Create cards for `codes` (ids drawn from `rng`) and insert them in order.
    pub fn load(
        &mut self,
        codes: &[String],
        db: &dyn CardDatabase,
        rng: &mut DeterministicRng,
        id_len: usize,
    ) {
        for code in codes {
            let id = CardId::generate(rng, id_len);
            let card = Card::new(id, db.lookup(code), self.owner, self.policy.location);
            self.insert(card, 0.0);
        }
        debug!(
            seat = %self.owner,
            zone = self.policy.location.label(),
            cards = self.cards.len(),
            "Loaded stack"
        );
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Zone kind of this stack.
    #[inline]
    pub fn location(&self) -> Location {
        self.policy.location
    }

    /// Anchor coordinate.
    #[inline]
    pub fn coord(&self) -> Vec2 {
        self.coord
    }

    /// Cards bottom to top.
    #[inline]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards.
    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Is the stack empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Top card.
    #[inline]
    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    /// Cards in the spread window.
    #[inline]
    pub fn exposed_count(&self) -> usize {
        self.exposed
    }

    /// Partial slide of the spread window.
    #[inline]
    pub fn displacement(&self) -> f32 {
        self.displacement
    }

    /// Is the stack spread at all?
    #[inline]
    pub fn is_spread(&self) -> bool {
        self.exposed != 1 || self.displacement != 0.0
    }

    /// Find a card by id.
    pub fn find(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id() == id)
    }

    /// Find a card by id, mutably.
    pub fn find_mut(&mut self, id: &CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id() == id)
    }

    /// Topmost card under `point`.
    ///
    /// Spread-gated stacks answer only while spread.
    pub fn active_card(&self, point: Vec2) -> Option<&CardId> {
        if self.policy.spread_gated && !self.is_spread() {
            return None;
        }
        self.cards
            .iter()
            .rev()
            .find(|c| c.hit(point))
            .map(|c| c.id())
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Put a card on top.
    pub fn insert(&mut self, mut card: Card, dt: f32) {
        self.collapse_fully();
        card.finish_turn();
        let from = card.location();

        card.resize_to(self.policy.card_size, GROWTH_SPEED, dt);
        match self.policy.entry {
            Entry::FaceDown => card.force_face_down_attack(),
            Entry::Reveal => {
                card.switch_to_face_up_attack(dt);
            }
            Entry::Hand => self.enter_hand(&mut card, from, dt),
        }
        card.set_location(self.policy.location);
        card.set_visible(true);

        match self.policy.arrangement {
            Arrangement::Pile => {
                card.move_to(self.coord, layout::STACK_MOVE_TIME, dt);
                self.cards.push(card);
            }
            Arrangement::Fan => {
                self.cards.push(card);
                self.fan_out(dt);
            }
        }
    }

    fn enter_hand(&self, card: &mut Card, from: Location, dt: f32) {
        if from == Location::Field && card.stance() == Stance::Defense {
            match (self.owner, card.is_face_up()) {
                (Seat::One, false) => card.tsuk(dt),
                _ => card.change_stance(dt),
            };
        }
        if self.owner == Seat::One && from == Location::MainDeck && !card.is_face_up() {
            card.flip(layout::FLIP_SPEED, dt);
        }
    }

    /// Remove and return the top card.
    pub fn pop_top(&mut self) -> Result<Card, ZoneError> {
        self.cards
            .pop()
            .ok_or(ZoneError::EmptyStack(self.policy.location))
    }

    /// Remove a card by id from anywhere in the stack.
    ///
    /// A fanned stack re-lays itself out on the next update.
    pub fn take(&mut self, id: &CardId) -> Option<Card> {
        let index = self.cards.iter().position(|c| c.id() == id)?;
        let card = self.cards.remove(index);
        if self.policy.arrangement == Arrangement::Fan {
            self.relayout_pending = true;
        }
        Some(card)
    }

    /// Reorder with the owner's stream.
    pub fn shuffle(&mut self, rng: &mut DeterministicRng, dt: f32) {
        if self.cards.is_empty() {
            return;
        }
        rng.shuffle(&mut self.cards);
        if self.policy.arrangement == Arrangement::Fan {
            self.relayout(layout::HAND_RELAYOUT_MOVE_TIME, dt);
        }
    }

    /// Widen the spread window by half a card.
    ///
    /// Returns `false` if there is nothing left to expose.
    pub fn spread(&mut self) -> bool {
        if self.cards.is_empty() || self.exposed >= self.cards.len() {
            return false;
        }

        let dx = FIELD_CARD_SIZE.x / 2.0;
        self.displacement += dx;

        let len = self.cards.len();
        for i in 0..self.exposed {
            self.cards[len - 1 - i].set_visible(true);
            self.cards[len - 2 - i].set_visible(true);
            let card = &mut self.cards[len - 1 - i];
            let dest = card.position() - Vec2::new(dx, 0.0);
            card.move_to(dest, 0.0, 0.0);
        }

        if self.displacement >= FIELD_CARD_SIZE.x {
            self.displacement = 0.0;
            self.exposed += 1;
        }
        true
    }

    /// Narrow the spread window by half a card; the inverse of [`Stack::spread`].
    ///
    /// Returns `false` if already collapsed.
    pub fn collapse(&mut self) -> bool {
        if self.cards.is_empty() || !self.is_spread() {
            return false;
        }

        let dx = FIELD_CARD_SIZE.x / 2.0;
        if self.displacement == 0.0 {
            self.displacement = FIELD_CARD_SIZE.x;
            self.exposed -= 1;
        }
        self.displacement -= dx;

        let len = self.cards.len();
        for i in 0..self.exposed {
            let card = &mut self.cards[len - 1 - i];
            let dest = card.position() + Vec2::new(dx, 0.0);
            card.move_to(dest, 0.0, 0.0);
        }

        // Cards under the window are no longer peeking out
        let peeking = if self.displacement > 0.0 { self.exposed + 1 } else { self.exposed };
        for i in peeking..len {
            self.cards[len - 1 - i].set_visible(false);
        }
        true
    }

    /// Drop the spread window entirely, snapping settled cards home.
    pub fn collapse_fully(&mut self) {
        if self.policy.arrangement == Arrangement::Fan {
            return;
        }
        self.exposed = 1;
        self.displacement = 0.0;
        let coord = self.coord;
        for card in self.cards.iter_mut().filter(|c| !c.animation_in_progress()) {
            card.move_to(coord, 0.0, 0.0);
        }
    }

    /// Advance animations and refresh visibility.
    pub fn update(&mut self, dt: f32) {
        for card in &mut self.cards {
            card.update(dt);
        }

        match self.policy.arrangement {
            Arrangement::Fan => {
                if self.relayout_pending {
                    self.relayout_pending = false;
                    self.relayout(layout::HAND_RELAYOUT_MOVE_TIME, dt);
                }
            }
            Arrangement::Pile => self.refresh_visibility(),
        }
    }

    fn refresh_visibility(&mut self) {
        let spread = self.is_spread();
        let Some(top_animating) = self.cards.last().map(|c| c.animation_in_progress()) else {
            return;
        };

        if !spread {
            for card in &mut self.cards {
                card.set_visible(false);
            }
        }

        let len = self.cards.len();
        if top_animating {
            let depth = (len - 1).min(SETTLE_VISIBLE_DEPTH);
            for card in &mut self.cards[len - 1 - depth..] {
                card.set_visible(true);
            }
        }

        // Top card is always visible
        self.cards[len - 1].set_visible(true);
    }

    /// Lay a fan out after an insertion: the new card travels slower.
    fn fan_out(&mut self, dt: f32) {
        let count = self.cards.len();
        if count > layout::HAND_OVERLAP_THRESHOLD {
            for card in &mut self.cards {
                card.stop_moving();
            }
        }
        for (index, card) in self.cards.iter_mut().enumerate() {
            let dest = layout::hand_slot(self.owner, index, count);
            let time = if index + 1 == count {
                layout::HAND_ADD_MOVE_TIME
            } else {
                layout::HAND_SHIFT_MOVE_TIME
            };
            card.move_to(dest, time, dt);
        }
    }

    fn relayout(&mut self, time: f32, dt: f32) {
        let count = self.cards.len();
        for (index, card) in self.cards.iter_mut().enumerate() {
            card.move_to(layout::hand_slot(self.owner, index, count), time, dt);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
