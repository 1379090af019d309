//! Action Vocabulary
//!
//! Every replicated player action, with the key code it travels under on
//! the wire.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

/// Key-driven player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuelAction {
    /// Top of main deck to hand
    Draw,
    /// Top of main deck to graveyard
    Mill,
    /// Play a spell/trap from hand, or flip one on the field
    Activate,
    /// Summon a monster to a free monster slot
    NormalSummon,
    /// Send a card to the graveyard
    SendToGraveyard,
    /// Banish a card
    Banish,
    /// Toggle face orientation
    Flip,
    /// Toggle battle stance
    ChangeStance,
    /// Composite flip and stance change
    Tsuk,
    /// Return a card to hand
    ReturnToHand,
    /// Set a card face-down from hand
    Set,
    /// Shuffle the hand
    ShuffleHand,
}

impl DuelAction {
    /// Every action.
    pub const ALL: [DuelAction; 12] = [
        DuelAction::Draw,
        DuelAction::Mill,
        DuelAction::Activate,
        DuelAction::NormalSummon,
        DuelAction::SendToGraveyard,
        DuelAction::Banish,
        DuelAction::Flip,
        DuelAction::ChangeStance,
        DuelAction::Tsuk,
        DuelAction::ReturnToHand,
        DuelAction::Set,
        DuelAction::ShuffleHand,
    ];

    /// Key code carried in a key command.
    pub fn key_code(self) -> u32 {
        match self {
            DuelAction::Activate => 65,        // A
            DuelAction::Banish => 66,          // B
            DuelAction::ChangeStance => 67,    // C
            DuelAction::Draw => 68,            // D
            DuelAction::Flip => 70,            // F
            DuelAction::SendToGraveyard => 71, // G
            DuelAction::ReturnToHand => 72,    // H
            DuelAction::Mill => 77,            // M
            DuelAction::NormalSummon => 78,    // N
            DuelAction::Set => 83,             // S
            DuelAction::Tsuk => 88,            // X
            DuelAction::ShuffleHand => 90,     // Z
        }
    }

    /// Action for a key code.
    pub fn from_key_code(code: u32) -> Option<DuelAction> {
        Self::ALL.into_iter().find(|a| a.key_code() == code)
    }

    /// Does the action operate on a specific card?
    pub fn requires_target(self) -> bool {
        !matches!(
            self,
            DuelAction::Draw | DuelAction::Mill | DuelAction::ShuffleHand
        )
    }

    /// Command word used by the headless driver.
    pub fn name(self) -> &'static str {
        match self {
            DuelAction::Draw => "draw",
            DuelAction::Mill => "mill",
            DuelAction::Activate => "activate",
            DuelAction::NormalSummon => "summon",
            DuelAction::SendToGraveyard => "gy",
            DuelAction::Banish => "banish",
            DuelAction::Flip => "flip",
            DuelAction::ChangeStance => "stance",
            DuelAction::Tsuk => "tsuk",
            DuelAction::ReturnToHand => "hand",
            DuelAction::Set => "set",
            DuelAction::ShuffleHand => "shuffle",
        }
    }
}

impl fmt::Display for DuelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DuelAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown action: {}", s))
    }
}

// =============================================================================
// PILE ACTIONS
// =============================================================================

/// Spread or collapse a pile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PileAction {
    /// Widen the spread window
    Spread,
    /// Narrow the spread window
    Collapse,
}

impl PileAction {
    /// Wire name.
    pub fn wire_name(self) -> &'static str {
        match self {
            PileAction::Spread => "SPREAD",
            PileAction::Collapse => "COLLAPSE",
        }
    }

    /// Parse a wire name.
    pub fn from_wire_name(s: &str) -> Option<PileAction> {
        match s {
            "SPREAD" => Some(PileAction::Spread),
            "COLLAPSE" => Some(PileAction::Collapse),
            _ => None,
        }
    }
}

/// Spreadable pile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PileTarget {
    /// Main deck
    MainDeck,
    /// Graveyard
    Graveyard,
    /// Banish pile
    Banish,
}

impl PileTarget {
    /// Wire name.
    pub fn wire_name(self) -> &'static str {
        match self {
            PileTarget::MainDeck => "MAIN_DECK",
            PileTarget::Graveyard => "GRAVEYARD",
            PileTarget::Banish => "BANISH",
        }
    }

    /// Parse a wire name.
    pub fn from_wire_name(s: &str) -> Option<PileTarget> {
        match s {
            "MAIN_DECK" => Some(PileTarget::MainDeck),
            "GRAVEYARD" => Some(PileTarget::Graveyard),
            "BANISH" => Some(PileTarget::Banish),
            _ => None,
        }
    }
}

impl FromStr for PileTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deck" | "main" => Ok(PileTarget::MainDeck),
            "gy" | "graveyard" => Ok(PileTarget::Graveyard),
            "banish" => Ok(PileTarget::Banish),
            other => Err(format!("unknown pile: {}", other)),
        }
    }
}
