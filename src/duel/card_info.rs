//! Card Definitions
//!
//! Static card data keyed by definition code. The duel only needs the card
//! kind and the fusion flag; names are kept for logs and the headless driver.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

/// Broad card category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum CardKind {
    /// Monster card
    Monster,
    /// Spell card
    Spell,
    /// Trap card
    Trap,
    /// Token (never persisted to graveyard or banish)
    Token,
    /// Code missing from the database
    #[default]
    Unknown,
}

impl CardKind {
    /// Parse a database type string ("Monster", "Spell", ...).
    pub fn from_type_name(name: &str) -> CardKind {
        match name {
            "Monster" => CardKind::Monster,
            "Spell" => CardKind::Spell,
            "Trap" => CardKind::Trap,
            "Token" => CardKind::Token,
            _ => CardKind::Unknown,
        }
    }
}

/// Definition data for one card code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    /// Definition code (passcode)
    pub code: String,
    /// Display name
    pub name: String,
    /// Category
    pub kind: CardKind,
    /// Belongs in the fusion deck
    pub fusion: bool,
}

impl CardInfo {
    /// Info for a code the database does not know.
    pub fn unknown(code: &str) -> Self {
        Self {
            code: code.to_string(),
            name: String::new(),
            kind: CardKind::Unknown,
            fusion: false,
        }
    }

    /// Is this a monster?
    #[inline]
    pub fn is_monster(&self) -> bool {
        self.kind == CardKind::Monster
    }

    /// Is this a spell or a trap?
    #[inline]
    pub fn is_spell_or_trap(&self) -> bool {
        matches!(self.kind, CardKind::Spell | CardKind::Trap)
    }

    /// Is this a token?
    #[inline]
    pub fn is_token(&self) -> bool {
        self.kind == CardKind::Token
    }
}

// =============================================================================
// DATABASE
// =============================================================================

/// Card lookup service.
pub trait CardDatabase: Send + Sync {
    /// Resolve a definition code. Unknown codes yield `CardKind::Unknown`.
    fn lookup(&self, code: &str) -> CardInfo;
}

/// Errors while loading a card database.
#[derive(Debug, Error)]
pub enum CardDbError {
    /// File could not be read
    #[error("failed to read card database: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a valid record list
    #[error("invalid card database: {0}")]
    Parse(#[from] serde_json::Error),

    /// Same code listed twice
    #[error("duplicate card code: {0}")]
    DuplicateCode(String),
}

/// One record of the JSON card list.
#[derive(Debug, Deserialize)]
struct CardRecord {
    code: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    card_type: String,
    #[serde(default)]
    subtype: String,
}

/// In-memory card database.
#[derive(Clone, Debug, Default)]
pub struct MemoryCardDatabase {
    cards: BTreeMap<String, CardInfo>,
}

impl MemoryCardDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a card.
    pub fn insert(&mut self, info: CardInfo) {
        self.cards.insert(info.code.clone(), info);
    }

    /// Builder-style insert.
    pub fn with(mut self, code: &str, name: &str, kind: CardKind, fusion: bool) -> Self {
        self.insert(CardInfo {
            code: code.to_string(),
            name: name.to_string(),
            kind,
            fusion,
        });
        self
    }

    /// Number of known cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Is the database empty?
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Parse a JSON array of `{ "code", "name", "type", "subtype" }` records.
    pub fn from_json(json: &str) -> Result<Self, CardDbError> {
        let records: Vec<CardRecord> = serde_json::from_str(json)?;
        let mut db = Self::new();

        for record in records {
            if db.cards.contains_key(&record.code) {
                return Err(CardDbError::DuplicateCode(record.code));
            }
            db.insert(CardInfo {
                fusion: record.subtype == "Fusion",
                kind: CardKind::from_type_name(&record.card_type),
                code: record.code,
                name: record.name,
            });
        }

        debug!(cards = db.len(), "Parsed card database");
        Ok(db)
    }

    /// Load a JSON card list from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CardDbError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let db = Self::from_json(&json)?;
        info!(path = %path.display(), cards = db.len(), "Loaded card database");
        Ok(db)
    }
}

impl CardDatabase for MemoryCardDatabase {
    fn lookup(&self, code: &str) -> CardInfo {
        self.cards
            .get(code)
            .cloned()
            .unwrap_or_else(|| CardInfo::unknown(code))
    }
}
