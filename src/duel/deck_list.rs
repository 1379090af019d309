//! Deck Lists
//!
//! Parser for the plain-text deck format: sections headed by the marker
//! lines `#main`, `#extra` and `!side`, one card code per line.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;

/// Errors while loading a deck file.
#[derive(Debug, Error)]
pub enum DeckListError {
    /// File could not be read
    #[error("failed to read deck file: {0}")]
    Io(#[from] std::io::Error),
}

/// Card codes per deck section, in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    /// Main deck codes
    pub main: Vec<String>,
    /// Fusion ("extra") deck codes
    pub fusion: Vec<String>,
    /// Side deck codes
    pub side: Vec<String>,
}

#[derive(Clone, Copy)]
enum Section {
    Main,
    Fusion,
    Side,
}

impl DeckList {
    /// Build a deck list from main and fusion codes.
    pub fn new(main: Vec<String>, fusion: Vec<String>) -> Self {
        Self {
            main,
            fusion,
            side: Vec::new(),
        }
    }

    /// Parse deck file contents.
    ///
    /// Lines before any marker belong to the main deck. Blank lines and
    /// other `#` comment lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut deck = DeckList::default();
        let mut section = Section::Main;

        for line in text.lines() {
            let line = line.trim();
            match line {
                "#main" => section = Section::Main,
                "#extra" => section = Section::Fusion,
                "!side" => section = Section::Side,
                "" => {}
                comment if comment.starts_with('#') => {}
                code => {
                    let target = match section {
                        Section::Main => &mut deck.main,
                        Section::Fusion => &mut deck.fusion,
                        Section::Side => &mut deck.side,
                    };
                    target.push(code.to_string());
                }
            }
        }

        deck
    }

    /// Load and parse a deck file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeckListError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let deck = Self::parse(&text);
        info!(
            path = %path.display(),
            main = deck.main.len(),
            fusion = deck.fusion.len(),
            side = deck.side.len(),
            "Loaded deck"
        );
        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let text = "#created by someone\n#main\n1001\n1002\n\n1003\n#extra\n4001\n!side\n5001\n";
        let deck = DeckList::parse(text);

        assert_eq!(deck.main, vec!["1001", "1002", "1003"]);
        assert_eq!(deck.fusion, vec!["4001"]);
        assert_eq!(deck.side, vec!["5001"]);
    }

    #[test]
    fn test_lines_before_marker_are_main() {
        let deck = DeckList::parse("1001\r\n1002\r\n");
        assert_eq!(deck.main, vec!["1001", "1002"]);
        assert!(deck.fusion.is_empty());
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(DeckList::parse(""), DeckList::default());
    }
}
