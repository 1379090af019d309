//! Card State Machine
//!
//! A single physical card: identity, location, face orientation, battle
//! stance, and the timed transitions that move between orientations.
//!
//! # Transitions
//!
//! Orientation changes (flip, stance change, tsuk) are mutually exclusive:
//! a card holds at most one [`Turn`] at a time and a request for a different
//! turn while one is in flight is ignored. The committed `face_up` / `stance`
//! only change when a turn reaches its bound. Moves and resizes are
//! independent and may overlap any turn.
//!
//! Rotations are stored relative to the owner's seat; seat two's cards are
//! yawed by 180 degrees only when reported through [`Card::world_rotation`].

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::layout::{self, FIELD_CARD_SIZE, SeatLayout};
use crate::core::rng::DeterministicRng;
use crate::core::seat::Seat;
use crate::core::vec2::{Rect, Vec2};
use super::card_info::CardInfo;

// =============================================================================
// IDENTITY
// =============================================================================

/// Card instance id, unique within a duel.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(String);

impl CardId {
    /// Wrap an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Draw a fresh id from a seat's stream.
    pub fn generate(rng: &mut DeterministicRng, len: usize) -> Self {
        Self(rng.card_id(len))
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardId({})", self.0)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// STATE ENUMS
// =============================================================================

/// Where a card is. Exactly one at any instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Location {
    /// Main deck
    MainDeck = 0,
    /// Fusion deck
    FusionDeck = 1,
    /// A field slot
    Field = 2,
    /// Hand
    Hand = 3,
    /// Graveyard
    Graveyard = 4,
    /// Banish pile
    Banish = 5,
}

impl Location {
    /// Short label for logs.
    pub fn label(self) -> &'static str {
        match self {
            Location::MainDeck => "main_deck",
            Location::FusionDeck => "fusion_deck",
            Location::Field => "field",
            Location::Hand => "hand",
            Location::Graveyard => "graveyard",
            Location::Banish => "banish",
        }
    }
}

/// Battle stance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum Stance {
    /// Upright (0 degrees)
    #[default]
    Attack = 0,
    /// Sideways (-90 degrees)
    Defense = 1,
}

/// Card rotation in degrees around each axis.
///
/// `y` carries the flip while in attack stance, `x` carries the flip while in
/// defense stance, `z` carries the stance.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Flip axis in defense stance
    pub x: f32,
    /// Flip axis in attack stance
    pub y: f32,
    /// Stance axis
    pub z: f32,
}

impl Rotation {
    const FACE_UP_ATTACK: Rotation = Rotation { x: 0.0, y: 0.0, z: 0.0 };
    const FACE_DOWN_ATTACK: Rotation = Rotation { x: 0.0, y: 180.0, z: 0.0 };
    const FACE_DOWN_DEFENSE: Rotation = Rotation { x: 180.0, y: 0.0, z: -90.0 };
}

/// In-flight orientation transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Turn {
    /// No orientation change in flight
    Idle,
    /// Flipping toward `to_face_up` at `speed` degrees per second
    Flipping { speed: f32, to_face_up: bool },
    /// Rotating along the stance axis
    ChangingStance,
    /// Composite flip and stance change
    Tsuk,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Motion {
    dest: Vec2,
    velocity: Vec2,
    remaining: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Resize {
    target: Vec2,
    velocity: Vec2,
    remaining: Vec2,
}

// =============================================================================
// CARD
// =============================================================================

/// A physical card instance.
#[derive(Clone, Debug)]
pub struct Card {
    id: CardId,
    info: CardInfo,
    owner: Seat,
    location: Location,
    face_up: bool,
    stance: Stance,
    rotation: Rotation,
    turn: Turn,
    motion: Option<Motion>,
    resize: Option<Resize>,
    position: Vec2,
    size: Vec2,
    visible: bool,
}

impl Card {
    /// Create a face-down attack card resting on its owner's deck pile.
    pub fn new(id: CardId, info: CardInfo, owner: Seat, location: Location) -> Self {
        let layout = SeatLayout::for_seat(owner);
        let position = if info.fusion {
            layout.fusion_deck
        } else {
            layout.main_deck
        };

        Self {
            id,
            info,
            owner,
            location,
            face_up: false,
            stance: Stance::Attack,
            rotation: Rotation::FACE_DOWN_ATTACK,
            turn: Turn::Idle,
            motion: None,
            resize: None,
            position,
            size: FIELD_CARD_SIZE,
            visible: true,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Instance id.
    #[inline]
    pub fn id(&self) -> &CardId {
        &self.id
    }

    /// Definition code.
    #[inline]
    pub fn code(&self) -> &str {
        &self.info.code
    }

    /// Definition data.
    #[inline]
    pub fn info(&self) -> &CardInfo {
        &self.info
    }

    /// Owning seat.
    #[inline]
    pub fn owner(&self) -> Seat {
        self.owner
    }

    /// Current location.
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Committed face orientation.
    #[inline]
    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    /// Committed battle stance.
    #[inline]
    pub fn stance(&self) -> Stance {
        self.stance
    }

    /// Face-up and in defense stance.
    #[inline]
    pub fn is_face_up_defense(&self) -> bool {
        self.face_up && self.stance == Stance::Defense
    }

    /// Seat-relative rotation.
    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Rotation including the owner's seat yaw.
    pub fn world_rotation(&self) -> Rotation {
        Rotation {
            z: self.rotation.z + layout::seat_yaw(self.owner),
            ..self.rotation
        }
    }

    /// Current orientation transition.
    #[inline]
    pub fn turn(&self) -> Turn {
        self.turn
    }

    /// Board position (top-left).
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Rendered size.
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Should the card be drawn?
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Is a move in flight?
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// Is any transition, move or resize in flight?
    #[inline]
    pub fn animation_in_progress(&self) -> bool {
        self.turn != Turn::Idle || self.motion.is_some() || self.resize.is_some()
    }

    /// Inclusive hit test against the card's rectangle.
    #[inline]
    pub fn hit(&self, point: Vec2) -> bool {
        Rect::new(self.position, self.size).contains(point)
    }

    /// Is this a monster?
    #[inline]
    pub fn is_monster(&self) -> bool {
        self.info.is_monster()
    }

    /// Is this a spell or trap?
    #[inline]
    pub fn is_spell_or_trap(&self) -> bool {
        self.info.is_spell_or_trap()
    }

    /// Is this a token?
    #[inline]
    pub fn is_token(&self) -> bool {
        self.info.is_token()
    }

    /// Is this a fusion card?
    #[inline]
    pub fn is_fusion(&self) -> bool {
        self.info.fusion
    }

    // -------------------------------------------------------------------------
    // Orientation transitions
    // -------------------------------------------------------------------------

    /// Start a flip.
    ///
    /// Returns `false` if any turn is already in flight; [`Card::update`]
    /// carries a started turn to its bound.
    pub fn flip(&mut self, speed: f32, dt: f32) -> bool {
        self.start_turn(Turn::Flipping { speed, to_face_up: !self.face_up }, dt)
    }

    /// Start a battle stance change.
    ///
    /// Returns `false` if any turn is already in flight.
    pub fn change_stance(&mut self, dt: f32) -> bool {
        self.start_turn(Turn::ChangingStance, dt)
    }

    /// Start a tsuk.
    ///
    /// From attack the card ends face-down in defense; from defense it ends
    /// face-up in attack. Both attributes commit together.
    pub fn tsuk(&mut self, dt: f32) -> bool {
        self.start_turn(Turn::Tsuk, dt)
    }

    fn start_turn(&mut self, turn: Turn, dt: f32) -> bool {
        if self.turn != Turn::Idle {
            return false;
        }
        self.turn = turn;
        self.advance_turn(dt);
        true
    }

    /// Run the turn in flight to its bound right away.
    ///
    /// Leaves the card in the orientation it would settle in, independent
    /// of how far the turn had got.
    pub fn finish_turn(&mut self) {
        while self.turn != Turn::Idle {
            self.advance_turn(1.0);
        }
    }

    /// Head for face-up attack with whichever single transition gets there.
    pub fn switch_to_face_up_attack(&mut self, dt: f32) -> bool {
        match (self.face_up, self.stance) {
            (false, Stance::Defense) => self.tsuk(dt),
            (true, Stance::Defense) => self.change_stance(dt),
            (false, Stance::Attack) => self.flip(layout::FLIP_SPEED, dt),
            (true, Stance::Attack) => true,
        }
    }

    /// Instantly face-up attack; cancels any turn.
    pub fn force_face_up_attack(&mut self) {
        self.force(Rotation::FACE_UP_ATTACK, true, Stance::Attack);
    }

    /// Instantly face-down attack; cancels any turn.
    pub fn force_face_down_attack(&mut self) {
        self.force(Rotation::FACE_DOWN_ATTACK, false, Stance::Attack);
    }

    /// Instantly face-down defense; cancels any turn.
    pub fn force_face_down_defense(&mut self) {
        self.force(Rotation::FACE_DOWN_DEFENSE, false, Stance::Defense);
    }

    fn force(&mut self, rotation: Rotation, face_up: bool, stance: Stance) {
        self.rotation = rotation;
        self.face_up = face_up;
        self.stance = stance;
        self.turn = Turn::Idle;
    }

    fn advance_turn(&mut self, dt: f32) {
        match self.turn {
            Turn::Idle => {}
            Turn::Flipping { speed, to_face_up } => self.advance_flip(speed, to_face_up, dt),
            Turn::ChangingStance => self.advance_stance(dt),
            Turn::Tsuk => self.advance_tsuk(dt),
        }
    }

    fn advance_flip(&mut self, speed: f32, to_face_up: bool, dt: f32) {
        let step = speed * dt;
        let axis = match self.stance {
            Stance::Attack => &mut self.rotation.y,
            Stance::Defense => &mut self.rotation.x,
        };

        let done = if to_face_up {
            *axis -= step;
            if *axis <= 0.0 {
                *axis = 0.0;
                true
            } else {
                false
            }
        } else {
            *axis += step;
            if *axis >= 180.0 {
                *axis = 180.0;
                true
            } else {
                false
            }
        };

        if done {
            self.face_up = to_face_up;
            self.turn = Turn::Idle;
        }
    }

    fn advance_stance(&mut self, dt: f32) {
        let step = layout::STANCE_SPEED * dt;
        match self.stance {
            Stance::Attack => {
                self.rotation.z -= step;
                if self.rotation.z <= -90.0 {
                    self.rotation.z = -90.0;
                    self.stance = Stance::Defense;
                    self.turn = Turn::Idle;
                }
            }
            Stance::Defense => {
                self.rotation.z += step;
                if self.rotation.z >= 0.0 {
                    self.rotation.z = 0.0;
                    self.stance = Stance::Attack;
                    self.turn = Turn::Idle;
                }
            }
        }
    }

    fn advance_tsuk(&mut self, dt: f32) {
        let dx = layout::TSUK_SPEED_X * dt;
        let dz = layout::TSUK_SPEED_Z * dt;
        match self.stance {
            Stance::Attack => {
                self.rotation.x += dx;
                self.rotation.z -= dz;
                if self.rotation.z <= -90.0 {
                    self.force(Rotation::FACE_DOWN_DEFENSE, false, Stance::Defense);
                }
            }
            Stance::Defense => {
                self.rotation.x -= dx;
                self.rotation.z += dz;
                if self.rotation.z >= 0.0 {
                    self.force(Rotation::FACE_UP_ATTACK, true, Stance::Attack);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Motion
    // -------------------------------------------------------------------------

    /// Travel to `dest` over `duration` seconds.
    ///
    /// A zero `dt` or duration snaps immediately. A new move replaces any
    /// move in flight.
    pub fn move_to(&mut self, dest: Vec2, duration: f32, dt: f32) {
        if dt <= 0.0 || duration <= 0.0 {
            self.position = dest;
            self.motion = None;
            return;
        }
        self.motion = Some(Motion {
            dest,
            velocity: (dest - self.position).scale(1.0 / duration),
            remaining: duration,
        });
        self.advance_motion(dt);
    }

    /// Stop any move in flight where it is.
    pub fn stop_moving(&mut self) {
        self.motion = None;
    }

    /// Grow or shrink to `target` at `speed` pixels per second per axis.
    ///
    /// A zero `dt` snaps immediately.
    pub fn resize_to(&mut self, target: Vec2, speed: Vec2, dt: f32) {
        if dt <= 0.0 || self.size == target {
            self.size = target;
            self.resize = None;
            return;
        }
        let delta = target - self.size;
        let signed = |d: f32, s: f32| if d < 0.0 { -s.abs() } else { s.abs() };
        self.resize = Some(Resize {
            target,
            velocity: Vec2::new(signed(delta.x, speed.x), signed(delta.y, speed.y)),
            remaining: delta.abs(),
        });
        self.advance_resize(dt);
    }

    fn advance_motion(&mut self, dt: f32) {
        let Some(mut motion) = self.motion else {
            return;
        };
        if motion.remaining <= dt || self.position == motion.dest {
            self.position = motion.dest;
            self.motion = None;
            return;
        }
        self.position = self.position + motion.velocity * dt;
        motion.remaining -= dt;
        self.motion = Some(motion);
    }

    fn advance_resize(&mut self, dt: f32) {
        let Some(mut resize) = self.resize else {
            return;
        };
        let step = resize.velocity * dt;

        if resize.remaining.x - step.x.abs() <= 0.0 {
            self.size.x = resize.target.x;
            resize.remaining.x = 0.0;
        } else {
            self.size.x += step.x;
            resize.remaining.x -= step.x.abs();
        }

        if resize.remaining.y - step.y.abs() <= 0.0 {
            self.size.y = resize.target.y;
            resize.remaining.y = 0.0;
        } else {
            self.size.y += step.y;
            resize.remaining.y -= step.y.abs();
        }

        if resize.remaining.x <= 0.0 && resize.remaining.y <= 0.0 {
            self.size = resize.target;
            self.resize = None;
        } else {
            self.resize = Some(resize);
        }
    }

    /// Advance every in-flight transition by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.advance_turn(dt);
        self.advance_motion(dt);
        self.advance_resize(dt);
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Card {}

// =============================================================================
// TESTS
// =============================================================================
