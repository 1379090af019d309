//! Seat numbering.
//!
//! Seats are perspective-relative: on every peer the local player sits in
//! seat one and the mirrored opponent in seat two.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Player seat (1 or 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Seat {
    /// The player driven by local input.
    One = 1,
    /// The mirrored player driven by replayed peer commands.
    Two = 2,
}

impl Seat {
    /// Both seats, in order.
    pub const ALL: [Seat; 2] = [Seat::One, Seat::Two];

    /// Seat number (1 or 2).
    #[inline]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Seat from its number.
    pub fn from_number(number: u8) -> Option<Seat> {
        match number {
            1 => Some(Seat::One),
            2 => Some(Seat::Two),
            _ => None,
        }
    }

    /// The other seat.
    #[inline]
    pub fn opposite(self) -> Seat {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_numbers() {
        assert_eq!(Seat::One.number(), 1);
        assert_eq!(Seat::from_number(2), Some(Seat::Two));
        assert_eq!(Seat::from_number(3), None);
        assert_eq!(Seat::One.opposite(), Seat::Two);
    }
}
