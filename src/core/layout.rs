//! Board Layout
//!
//! Fixed board coordinates, card sizes and animation speeds.
//!
//! Seat two's board is the rotated mirror of seat one's: its slots are
//! listed in reverse so slot N of either seat faces the same way from the
//! player's point of view.

use super::seat::Seat;
use super::vec2::Vec2;

// =============================================================================
// SIZES
// =============================================================================

/// Logical screen size.
pub const SCREEN_SIZE: Vec2 = Vec2::new(1600.0, 900.0);

/// Size of a card lying in any board zone.
pub const FIELD_CARD_SIZE: Vec2 = Vec2::new(86.0, 123.0);

/// Size of a card held in hand.
pub const HAND_CARD_SIZE: Vec2 = Vec2::new(105.0, 153.0);

/// Width of the magnified preview card docked on the right edge.
pub const MAG_CARD_WIDTH: f32 = 500.0 / 1.4576271186;

/// Hand size from which cards start to overlap.
pub const HAND_OVERLAP_THRESHOLD: usize = 6;

// =============================================================================
// ANIMATION SPEEDS
// =============================================================================

/// Flip rotation speed (degrees / second).
pub const FLIP_SPEED: f32 = 800.0;

/// Battle stance rotation speed (degrees / second).
pub const STANCE_SPEED: f32 = 500.0;

/// Tsuk speed around the x axis (degrees / second).
pub const TSUK_SPEED_X: f32 = 700.0;

/// Tsuk speed around the z axis (degrees / second).
pub const TSUK_SPEED_Z: f32 = 400.0;

/// Resize speed (pixels / second per axis).
pub const GROWTH_SPEED: Vec2 = Vec2::new(210.0, 306.0);

/// Travel time into a stack.
pub const STACK_MOVE_TIME: f32 = 0.2;

/// Travel time into a field slot.
pub const SLOT_MOVE_TIME: f32 = 0.1;

/// Travel time of a card newly added to the hand.
pub const HAND_ADD_MOVE_TIME: f32 = 0.3;

/// Travel time of cards shifting to make room in the hand.
pub const HAND_SHIFT_MOVE_TIME: f32 = 0.15;

/// Travel time of a compacting hand relayout.
pub const HAND_RELAYOUT_MOVE_TIME: f32 = 0.1;

// =============================================================================
// COORDINATES
// =============================================================================

/// Anchor coordinates of every zone of one seat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeatLayout {
    /// Monster slots 1..=5 in slot order.
    pub monster: [Vec2; 5],
    /// Spell/trap slots 6..=10 in slot order.
    pub spell_trap: [Vec2; 5],
    /// Field spell slot 11.
    pub field_spell: Vec2,
    /// Main deck pile.
    pub main_deck: Vec2,
    /// Fusion deck pile.
    pub fusion_deck: Vec2,
    /// Graveyard pile.
    pub graveyard: Vec2,
    /// Banish pile.
    pub banish: Vec2,
    /// Hand anchor.
    pub hand: Vec2,
}

const SEAT_ONE: SeatLayout = SeatLayout {
    monster: [
        Vec2::new(495.0, 502.0),
        Vec2::new(626.0, 502.0),
        Vec2::new(757.0, 502.0),
        Vec2::new(888.0, 502.0),
        Vec2::new(1019.0, 502.0),
    ],
    spell_trap: [
        Vec2::new(495.0, 631.0),
        Vec2::new(626.0, 631.0),
        Vec2::new(757.0, 631.0),
        Vec2::new(888.0, 631.0),
        Vec2::new(1019.0, 631.0),
    ],
    field_spell: Vec2::new(14.0, 502.0),
    main_deck: Vec2::new(1143.0, 631.0),
    fusion_deck: Vec2::new(371.0, 631.0),
    graveyard: Vec2::new(1143.0, 502.0),
    banish: Vec2::new(1143.0, 373.0),
    hand: Vec2::new(430.0, 760.0),
};

// Slots run right-to-left from the local player's point of view.
const SEAT_TWO: SeatLayout = SeatLayout {
    monster: [
        Vec2::new(645.0, 237.0),
        Vec2::new(516.0, 237.0),
        Vec2::new(387.0, 237.0),
        Vec2::new(259.0, 237.0),
        Vec2::new(130.0, 237.0),
    ],
    spell_trap: [
        Vec2::new(645.0, 108.0),
        Vec2::new(516.0, 108.0),
        Vec2::new(387.0, 108.0),
        Vec2::new(259.0, 108.0),
        Vec2::new(130.0, 108.0),
    ],
    field_spell: Vec2::new(761.0, 108.0),
    main_deck: Vec2::new(14.0, 108.0),
    fusion_deck: Vec2::new(761.0, 108.0),
    graveyard: Vec2::new(14.0, 237.0),
    banish: Vec2::new(14.0, 237.0),
    hand: Vec2::new(0.0, -50.0),
};

impl SeatLayout {
    /// Layout for a seat.
    pub fn for_seat(seat: Seat) -> &'static SeatLayout {
        match seat {
            Seat::One => &SEAT_ONE,
            Seat::Two => &SEAT_TWO,
        }
    }
}

/// Card yaw of a seat: seat two's cards are drawn upside down.
#[inline]
pub fn seat_yaw(seat: Seat) -> f32 {
    match seat {
        Seat::One => 0.0,
        Seat::Two => 180.0,
    }
}

/// Horizontal overlap between neighbouring hand cards.
pub fn hand_overlap(count: usize) -> f32 {
    if count >= HAND_OVERLAP_THRESHOLD {
        (HAND_CARD_SIZE.x / count as f32) * (count - HAND_OVERLAP_THRESHOLD) as f32
    } else {
        0.0
    }
}

/// Position of the `index`-th of `count` hand cards.
///
/// Seat one fans out left-to-right from its anchor; seat two fans out
/// right-to-left from the far edge, left of the preview card.
pub fn hand_slot(seat: Seat, index: usize, count: usize) -> Vec2 {
    let layout = SeatLayout::for_seat(seat);
    let step = HAND_CARD_SIZE.x - hand_overlap(count);
    let offset = match seat {
        Seat::One => index as f32 * step,
        Seat::Two => (SCREEN_SIZE.x - HAND_CARD_SIZE.x - MAG_CARD_WIDTH) - index as f32 * step,
    };
    Vec2::new(layout.hand.x + offset, layout.hand.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_two_is_reversed() {
        let one = SeatLayout::for_seat(Seat::One);
        let two = SeatLayout::for_seat(Seat::Two);
        assert!(one.monster[0].x < one.monster[4].x);
        assert!(two.monster[0].x > two.monster[4].x);
    }

    #[test]
    fn test_hand_overlap() {
        assert_eq!(hand_overlap(5), 0.0);
        assert_eq!(hand_overlap(6), 0.0);
        assert!((hand_overlap(7) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_hand_slots() {
        assert_eq!(hand_slot(Seat::One, 0, 3), Vec2::new(430.0, 760.0));
        assert_eq!(hand_slot(Seat::One, 2, 3), Vec2::new(640.0, 760.0));

        let first = hand_slot(Seat::Two, 0, 3);
        let second = hand_slot(Seat::Two, 1, 3);
        assert!(second.x < first.x);
        assert_eq!(first.y, -50.0);
    }
}
