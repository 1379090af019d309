//! Player
//!
//! One seat's zones and the legality-gated action vocabulary.
//!
//! # Legality
//!
//! Every action checks its preconditions first. An unmet precondition is a
//! silent no-op reported as [`ActionOutcome::Ignored`]; no zone is touched.
//! `Err` is reserved for fatal conditions (removing a card from a pile
//! through the generic path, unknown card ids), which callers must not
//! survive.

use thiserror::Error;
use tracing::{debug, error};

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::layout::{self, FIELD_CARD_SIZE, SeatLayout};
use crate::core::rng::DeterministicRng;
use crate::core::seat::Seat;
use crate::core::vec2::{Rect, Vec2};
use super::action::{DuelAction, PileAction, PileTarget};
use super::card::{Card, CardId, Location, Stance};
use super::card_info::CardDatabase;
use super::deck_list::DeckList;
use super::field::Field;
use super::stack::{Stack, StackPolicy, ZoneError};

// =============================================================================
// OUTCOMES & ERRORS
// =============================================================================

/// Result of a legality-gated action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Preconditions held and state changed
    Applied,
    /// Preconditions failed; nothing changed
    Ignored(&'static str),
}

impl ActionOutcome {
    /// Did the action change state?
    #[inline]
    pub fn is_applied(self) -> bool {
        self == ActionOutcome::Applied
    }
}

/// Fatal duel errors.
#[derive(Debug, Error)]
pub enum DuelError {
    /// Stack misuse
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Generic removal from a pile
    #[error("cannot remove card {id} from {} through the generic path", .location.label())]
    UnsupportedRemoval {
        /// Card
        id: CardId,
        /// Pile it sits in
        location: Location,
    },

    /// No card with this id belongs to the player
    #[error("unknown card id: {0}")]
    UnknownCard(CardId),

    /// Zone bookkeeping broke
    #[error("zone invariant violated: {0}")]
    Invariant(String),
}

// =============================================================================
// PLAYER
// =============================================================================

/// One seat's complete duel state.
#[derive(Clone, Debug)]
pub struct Player {
    seat: Seat,
    hand: Stack,
    main_deck: Stack,
    fusion_deck: Stack,
    graveyard: Stack,
    banish: Stack,
    field: Field,
}

impl Player {
    /// Build a player from a deck list.
    ///
    /// Main deck ids are drawn first, then the main deck is shuffled, then
    /// fusion deck ids are drawn, all from `rng`. Both peers must follow this
    /// order to agree.
    pub fn new(
        seat: Seat,
        deck: &DeckList,
        db: &dyn CardDatabase,
        rng: &mut DeterministicRng,
        id_len: usize,
    ) -> Self {
        let layout = SeatLayout::for_seat(seat);

        let mut main_deck = Stack::new(seat, layout.main_deck, StackPolicy::main_deck());
        main_deck.load(&deck.main, db, rng, id_len);
        main_deck.shuffle(rng, 0.0);

        let mut fusion_deck = Stack::new(seat, layout.fusion_deck, StackPolicy::fusion_deck());
        fusion_deck.load(&deck.fusion, db, rng, id_len);

        debug!(
            seat = %seat,
            main = main_deck.len(),
            fusion = fusion_deck.len(),
            "Player created"
        );

        Self {
            seat,
            hand: Stack::new(seat, layout.hand, StackPolicy::hand()),
            main_deck,
            fusion_deck,
            graveyard: Stack::new(seat, layout.graveyard, StackPolicy::graveyard()),
            banish: Stack::new(seat, layout.banish, StackPolicy::banish()),
            field: Field::new(seat),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Seat.
    #[inline]
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Hand.
    pub fn hand(&self) -> &Stack {
        &self.hand
    }

    /// Main deck.
    pub fn main_deck(&self) -> &Stack {
        &self.main_deck
    }

    /// Fusion deck.
    pub fn fusion_deck(&self) -> &Stack {
        &self.fusion_deck
    }

    /// Graveyard.
    pub fn graveyard(&self) -> &Stack {
        &self.graveyard
    }

    /// Banish pile.
    pub fn banish(&self) -> &Stack {
        &self.banish
    }

    /// Field.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Pile by target.
    pub fn pile(&self, target: PileTarget) -> &Stack {
        match target {
            PileTarget::MainDeck => &self.main_deck,
            PileTarget::Graveyard => &self.graveyard,
            PileTarget::Banish => &self.banish,
        }
    }

    fn pile_mut(&mut self, target: PileTarget) -> &mut Stack {
        match target {
            PileTarget::MainDeck => &mut self.main_deck,
            PileTarget::Graveyard => &mut self.graveyard,
            PileTarget::Banish => &mut self.banish,
        }
    }

    fn stacks(&self) -> [&Stack; 5] {
        [
            &self.hand,
            &self.main_deck,
            &self.fusion_deck,
            &self.graveyard,
            &self.banish,
        ]
    }

    /// Find a card anywhere: hand, decks, graveyard, banish, then field.
    pub fn find(&self, id: &CardId) -> Option<&Card> {
        self.stacks()
            .into_iter()
            .find_map(|s| s.find(id))
            .or_else(|| self.field.find(id))
    }

    fn find_mut(&mut self, id: &CardId) -> Option<&mut Card> {
        if self.hand.find(id).is_some() {
            return self.hand.find_mut(id);
        }
        if self.main_deck.find(id).is_some() {
            return self.main_deck.find_mut(id);
        }
        if self.fusion_deck.find(id).is_some() {
            return self.fusion_deck.find_mut(id);
        }
        if self.graveyard.find(id).is_some() {
            return self.graveyard.find_mut(id);
        }
        if self.banish.find(id).is_some() {
            return self.banish.find_mut(id);
        }
        self.field.find_mut(id)
    }

    fn card(&self, id: &CardId) -> Result<&Card, DuelError> {
        self.find(id).ok_or_else(|| DuelError::UnknownCard(id.clone()))
    }

    /// Total number of cards owned.
    pub fn card_count(&self) -> usize {
        self.stacks().iter().map(|s| s.len()).sum::<usize>()
            + self.field.slots().filter(|s| s.is_occupied()).count()
    }

    /// Card under the pointer: main deck (only while spread), graveyard,
    /// banish, field, then hand.
    pub fn active_card(&self, pointer: Vec2) -> Option<&CardId> {
        self.main_deck
            .active_card(pointer)
            .or_else(|| self.graveyard.active_card(pointer))
            .or_else(|| self.banish.active_card(pointer))
            .or_else(|| self.field.active_card(pointer))
            .or_else(|| self.hand.active_card(pointer))
    }

    /// Pile whose horizontal band contains the pointer: main deck, then
    /// graveyard, then banish.
    pub fn pile_at(&self, pointer: Vec2) -> Option<PileTarget> {
        [PileTarget::MainDeck, PileTarget::Graveyard, PileTarget::Banish]
            .into_iter()
            .find(|t| Rect::new(self.pile(*t).coord(), FIELD_CARD_SIZE).spans_row(pointer.y))
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Run a key action against an optional target card.
    ///
    /// `rng` must be this player's own stream.
    pub fn perform(
        &mut self,
        action: DuelAction,
        target: Option<&CardId>,
        rng: &mut DeterministicRng,
        dt: f32,
    ) -> Result<ActionOutcome, DuelError> {
        let outcome = match (action, target) {
            (DuelAction::Draw, _) => self.draw(dt)?,
            (DuelAction::Mill, _) => self.mill(dt)?,
            (DuelAction::ShuffleHand, _) => self.shuffle_hand(rng, dt),
            (_, None) => ActionOutcome::Ignored("no target card"),
            (DuelAction::Activate, Some(id)) => self.activate(id, dt)?,
            (DuelAction::NormalSummon, Some(id)) => self.normal_summon(id, dt)?,
            (DuelAction::SendToGraveyard, Some(id)) => self.send_to_graveyard(id, dt)?,
            (DuelAction::Banish, Some(id)) => self.banish_card(id, dt)?,
            (DuelAction::Flip, Some(id)) => self.flip(id, dt)?,
            (DuelAction::ChangeStance, Some(id)) => self.change_stance(id, dt)?,
            (DuelAction::Tsuk, Some(id)) => self.tsuk(id, dt)?,
            (DuelAction::ReturnToHand, Some(id)) => self.return_to_hand(id, dt)?,
            (DuelAction::Set, Some(id)) => self.set_card(id, dt)?,
        };

        match outcome {
            ActionOutcome::Applied => {
                debug!(seat = %self.seat, %action, target = ?target, "Action applied");
            }
            ActionOutcome::Ignored(reason) => {
                debug!(seat = %self.seat, %action, target = ?target, reason, "Action ignored");
            }
        }
        Ok(outcome)
    }

    /// Spread or collapse a pile.
    pub fn pile_action(&mut self, action: PileAction, target: PileTarget) -> ActionOutcome {
        let pile = self.pile_mut(target);
        let changed = match action {
            PileAction::Spread => pile.spread(),
            PileAction::Collapse => pile.collapse(),
        };
        if changed {
            ActionOutcome::Applied
        } else {
            debug!(seat = %self.seat, ?action, ?target, "Pile action ignored");
            ActionOutcome::Ignored("pile cannot move further")
        }
    }

    /// Spread the pile aligned with the pointer.
    pub fn spread(&mut self, pointer: Vec2) -> ActionOutcome {
        match self.pile_at(pointer) {
            Some(target) => self.pile_action(PileAction::Spread, target),
            None => ActionOutcome::Ignored("pointer not aligned with a pile"),
        }
    }

    /// Collapse the pile aligned with the pointer.
    pub fn collapse(&mut self, pointer: Vec2) -> ActionOutcome {
        match self.pile_at(pointer) {
            Some(target) => self.pile_action(PileAction::Collapse, target),
            None => ActionOutcome::Ignored("pointer not aligned with a pile"),
        }
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Main deck top to hand.
    pub fn draw(&mut self, dt: f32) -> Result<ActionOutcome, DuelError> {
        self.main_deck.collapse_fully();
        if self.main_deck.is_empty() {
            return Ok(ActionOutcome::Ignored("main deck empty"));
        }
        let mut card = self.main_deck.pop_top()?;
        card.force_face_down_attack();
        self.hand.insert(card, dt);
        Ok(ActionOutcome::Applied)
    }

    /// Main deck top to graveyard.
    pub fn mill(&mut self, dt: f32) -> Result<ActionOutcome, DuelError> {
        if self.main_deck.is_empty() {
            return Ok(ActionOutcome::Ignored("main deck empty"));
        }
        self.main_deck.collapse_fully();
        self.graveyard.collapse_fully();
        let mut card = self.main_deck.pop_top()?;
        card.force_face_down_attack();
        self.graveyard.insert(card, dt);
        Ok(ActionOutcome::Applied)
    }

    /// Play a spell/trap from hand to a free slot, or flip one on the field.
    pub fn activate(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if !card.is_spell_or_trap() {
            return Ok(ActionOutcome::Ignored("not a spell or trap"));
        }
        match card.location() {
            Location::Hand => {
                if !self.field.has_free_spell_trap_slot() {
                    return Ok(ActionOutcome::Ignored("no free spell/trap slot"));
                }
                let mut card = self.remove_card(id)?;
                card.force_face_up_attack();
                self.place_spell_trap(card, dt);
                Ok(ActionOutcome::Applied)
            }
            Location::Field => Ok(self.flip_in_place(id, dt)),
            _ => Ok(ActionOutcome::Ignored("not in hand or on field")),
        }
    }

    /// Summon a monster face-up attack to the first free monster slot.
    ///
    /// The mirrored seat skips the face-up check: its hand is concealed.
    pub fn normal_summon(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if !card.is_monster() {
            return Ok(ActionOutcome::Ignored("not a monster"));
        }
        if card.location() == Location::Field {
            return Ok(ActionOutcome::Ignored("already on field"));
        }
        if !card.is_face_up() && self.seat == Seat::One {
            return Ok(ActionOutcome::Ignored("not face-up"));
        }
        if !self.field.has_free_monster_slot() {
            return Ok(ActionOutcome::Ignored("no free monster slot"));
        }

        let fusion = card.is_fusion();
        let mut card = self.remove_card(id)?;
        if fusion {
            self.fusion_deck.collapse_fully();
        }
        card.force_face_up_attack();
        self.place_monster(card, dt);
        Ok(ActionOutcome::Applied)
    }

    /// Send a card to the graveyard. Tokens vanish instead.
    pub fn send_to_graveyard(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if card.location() == Location::Graveyard {
            return Ok(ActionOutcome::Ignored("already in graveyard"));
        }
        let token = card.is_token();
        let card = self.remove_card(id)?;
        if !token {
            self.graveyard.insert(card, dt);
        }
        Ok(ActionOutcome::Applied)
    }

    /// Banish a card. Tokens vanish instead.
    pub fn banish_card(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if card.location() == Location::Banish {
            return Ok(ActionOutcome::Ignored("already banished"));
        }
        let token = card.is_token();
        let card = self.remove_card(id)?;
        if !token {
            self.banish.insert(card, dt);
        }
        Ok(ActionOutcome::Applied)
    }

    /// Toggle face orientation of a card in hand or on the field.
    pub fn flip(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if card.is_token() {
            return Ok(ActionOutcome::Ignored("tokens cannot flip"));
        }
        match card.location() {
            Location::Hand => {}
            Location::Field => {
                if card.is_monster() && card.is_face_up() && card.stance() == Stance::Attack {
                    return Ok(ActionOutcome::Ignored("face-up attack monster"));
                }
            }
            _ => return Ok(ActionOutcome::Ignored("not in hand or on field")),
        }
        Ok(self.flip_in_place(id, dt))
    }

    /// Toggle battle stance of a face-up monster or token on the field.
    pub fn change_stance(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if card.location() != Location::Field || !card.is_face_up() {
            return Ok(ActionOutcome::Ignored("not face-up on field"));
        }
        if !card.is_monster() && !card.is_token() {
            return Ok(ActionOutcome::Ignored("not a monster or token"));
        }
        Ok(self.turn_card(id, |c| c.change_stance(dt)))
    }

    /// Composite flip and stance change of a monster on the field.
    pub fn tsuk(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if card.is_token() || !card.is_monster() {
            return Ok(ActionOutcome::Ignored("not a monster"));
        }
        if card.location() != Location::Field {
            return Ok(ActionOutcome::Ignored("not on field"));
        }
        if card.is_face_up_defense() {
            return Ok(ActionOutcome::Ignored("already face-up defense"));
        }
        Ok(self.turn_card(id, |c| c.tsuk(dt)))
    }

    /// Return a card to hand.
    pub fn return_to_hand(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if card.is_token() {
            return Ok(ActionOutcome::Ignored("tokens cannot return to hand"));
        }
        if card.location() == Location::Hand {
            return Ok(ActionOutcome::Ignored("already in hand"));
        }
        if card.is_fusion() && card.location() == Location::FusionDeck {
            return Ok(ActionOutcome::Ignored("fusion card in fusion deck"));
        }
        let card = self.remove_card(id)?;
        self.hand.insert(card, dt);
        Ok(ActionOutcome::Applied)
    }

    /// Set a card from hand face-down: monsters in defense, spells/traps in
    /// attack.
    ///
    /// The mirrored seat skips the face-up check: its hand is concealed.
    pub fn set_card(&mut self, id: &CardId, dt: f32) -> Result<ActionOutcome, DuelError> {
        let card = self.card(id)?;
        if card.location() != Location::Hand {
            return Ok(ActionOutcome::Ignored("not in hand"));
        }
        if !card.is_face_up() && self.seat == Seat::One {
            return Ok(ActionOutcome::Ignored("not face-up"));
        }

        if card.is_monster() {
            if !self.field.has_free_monster_slot() {
                return Ok(ActionOutcome::Ignored("no free monster slot"));
            }
            let mut card = self.remove_card(id)?;
            card.force_face_down_defense();
            self.place_monster(card, dt);
        } else if card.is_spell_or_trap() {
            if !self.field.has_free_spell_trap_slot() {
                return Ok(ActionOutcome::Ignored("no free spell/trap slot"));
            }
            let mut card = self.remove_card(id)?;
            card.force_face_down_attack();
            self.place_spell_trap(card, dt);
        } else {
            return Ok(ActionOutcome::Ignored("cannot be set"));
        }
        Ok(ActionOutcome::Applied)
    }

    /// Shuffle the hand with this player's stream.
    pub fn shuffle_hand(&mut self, rng: &mut DeterministicRng, dt: f32) -> ActionOutcome {
        self.hand.shuffle(rng, dt);
        ActionOutcome::Applied
    }

    // -------------------------------------------------------------------------
    // Zone plumbing
    // -------------------------------------------------------------------------

    /// Remove a card from the hand or the field.
    ///
    /// Piles only give cards up through their top; asking for any other
    /// removal is fatal.
    pub fn remove_card(&mut self, id: &CardId) -> Result<Card, DuelError> {
        let location = self.card(id)?.location();
        let removed = match location {
            Location::Hand => self.hand.take(id),
            Location::Field => self.field.take(id),
            Location::MainDeck | Location::FusionDeck | Location::Graveyard | Location::Banish => {
                error!(seat = %self.seat, %id, zone = location.label(), "Generic removal from pile");
                return Err(DuelError::UnsupportedRemoval { id: id.clone(), location });
            }
        };
        removed.ok_or_else(|| {
            DuelError::Invariant(format!("{} claims {} but zone lacks it", id, location.label()))
        })
    }

    fn place_monster(&mut self, card: Card, dt: f32) {
        if let Some(slot) = self.field.free_monster_slot() {
            slot.occupy(card, dt);
        }
    }

    fn place_spell_trap(&mut self, card: Card, dt: f32) {
        if let Some(slot) = self.field.free_spell_trap_slot() {
            slot.occupy(card, dt);
        }
    }

    fn flip_in_place(&mut self, id: &CardId, dt: f32) -> ActionOutcome {
        self.turn_card(id, |c| c.flip(layout::FLIP_SPEED, dt))
    }

    fn turn_card(&mut self, id: &CardId, turn: impl FnOnce(&mut Card) -> bool) -> ActionOutcome {
        match self.find_mut(id).map(turn) {
            Some(true) => ActionOutcome::Applied,
            Some(false) => ActionOutcome::Ignored("another transition in flight"),
            None => ActionOutcome::Ignored("card vanished"),
        }
    }

    /// Commit whatever turn the card has in flight.
    ///
    /// Replayed commands call this first: the sender only transmits an
    /// orientation change it started from a resting card.
    pub fn finish_turn(&mut self, id: &CardId) {
        if let Some(card) = self.find_mut(id) {
            card.finish_turn();
        }
    }

    // -------------------------------------------------------------------------
    // Tick & verification
    // -------------------------------------------------------------------------

    /// Advance every zone's animations.
    pub fn update(&mut self, dt: f32) {
        self.main_deck.update(dt);
        self.fusion_deck.update(dt);
        self.hand.update(dt);
        self.field.update(dt);
        self.graveyard.update(dt);
        self.banish.update(dt);
    }

    /// Is anything still animating?
    pub fn animating(&self) -> bool {
        self.stacks()
            .iter()
            .flat_map(|s| s.cards())
            .chain(self.field.slots().filter_map(|s| s.card()))
            .any(|c| c.animation_in_progress())
    }

    /// Digest of the replicated state.
    ///
    /// Covers zone contents in order, ids, codes, locations and stances, and
    /// face orientation outside the hand. Hand orientation is perspective
    /// dependent and positions are cosmetic, so neither is hashed.
    pub fn digest(&self) -> StateHash {
        compute_state_hash(|h| {
            for stack in self.stacks() {
                h.update_u8(stack.location() as u8);
                h.update_u32(stack.len() as u32);
                for card in stack.cards() {
                    hash_card(h, card);
                }
            }
            for slot in self.field.slots() {
                h.update_u8(slot.id());
                h.update_bool(slot.is_occupied());
                if let Some(card) = slot.card() {
                    hash_card(h, card);
                }
            }
        })
    }

    /// Check that every card sits in exactly one zone matching its location.
    pub fn check_invariants(&self) -> Result<(), DuelError> {
        let mut seen = std::collections::BTreeSet::new();

        for stack in self.stacks() {
            for card in stack.cards() {
                if card.location() != stack.location() {
                    return Err(DuelError::Invariant(format!(
                        "{} in {} reports {}",
                        card.id(),
                        stack.location().label(),
                        card.location().label()
                    )));
                }
                if !seen.insert(card.id().clone()) {
                    return Err(DuelError::Invariant(format!("{} held twice", card.id())));
                }
            }
        }
        for card in self.field.slots().filter_map(|s| s.card()) {
            if card.location() != Location::Field {
                return Err(DuelError::Invariant(format!(
                    "{} on field reports {}",
                    card.id(),
                    card.location().label()
                )));
            }
            if !seen.insert(card.id().clone()) {
                return Err(DuelError::Invariant(format!("{} held twice", card.id())));
            }
        }
        Ok(())
    }
}

fn hash_card(h: &mut StateHasher, card: &Card) {
    h.update_str(card.id().as_str());
    h.update_str(card.code());
    h.update_u8(card.location() as u8);
    h.update_u8(card.stance() as u8);
    if card.location() != Location::Hand {
        h.update_bool(card.is_face_up());
    }
}

// =============================================================================
// TESTS
// =============================================================================
