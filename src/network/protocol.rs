//! Protocol Messages
//!
//! Wire grammar for peer-to-peer duel replication.
//!
//! Every message is a flat ASCII record:
//!
//! ```text
//! COMMAND_TYPE;<n>;KEY;VALUE;KEY;VALUE;...;
//! ```
//!
//! `;` separates every token and terminates the record. `COMMAND_TYPE` is
//! always the first pair. Passcode lists are carried as a single value with
//! `,` after every entry. Framing (the length prefix) lives in `transport`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::duel::action::{DuelAction, PileAction, PileTarget};
use crate::duel::card::CardId;

/// Token separator and record terminator.
pub const FIELD_SEPARATOR: char = ';';

/// Passcode list separator.
pub const PASSCODE_SEPARATOR: char = ',';

/// Mandatory leading key.
pub const COMMAND_TYPE_KEY: &str = "COMMAND_TYPE";

/// Handshake seed field.
pub const SEED_KEY: &str = "SEED";

/// Deck list field.
pub const PASSCODES_KEY: &str = "PASSCODES";

/// Key code field.
pub const KEY_KEY: &str = "KEY";

/// Target card field.
pub const ACTIVE_CARD_ID_KEY: &str = "ACTIVE_CARD_ID";

/// Pile action field.
pub const ACTION_KEY: &str = "ACTION";

/// Pile selector field.
pub const PILE_KEY: &str = "PILE";

// =============================================================================
// ERRORS
// =============================================================================

/// Malformed or unexpected wire data. Always fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Payload contains non-ASCII bytes.
    #[error("payload is not ASCII")]
    NonAscii,

    /// Record does not end with the separator.
    #[error("record is not terminated by ';'")]
    MissingTerminator,

    /// Tokens do not pair up into keys and values.
    #[error("odd token count ({0})")]
    OddTokenCount(usize),

    /// First pair is not COMMAND_TYPE.
    #[error("record does not start with COMMAND_TYPE")]
    MissingCommandType,

    /// COMMAND_TYPE value is not a known type.
    #[error("unknown command type: {0}")]
    UnknownCommandType(String),

    /// Empty or reserved key.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// Same key twice in one record.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Key or value contains a separator.
    #[error("field {key} contains a separator")]
    IllegalSeparator {
        /// Offending key
        key: String,
    },

    /// Passcode entry is empty or contains a separator.
    #[error("invalid passcode: {0:?}")]
    InvalidPasscode(String),

    /// Required field absent.
    #[error("{kind} command is missing field {field}")]
    MissingField {
        /// Command type
        kind: CommandType,
        /// Field name
        field: &'static str,
    },

    /// KEY value is not a known key code.
    #[error("unknown key code: {0}")]
    UnknownKeyCode(String),

    /// A targeted key command arrived without a card id.
    #[error("key command {0} requires ACTIVE_CARD_ID")]
    MissingTarget(DuelAction),

    /// ACTION value is not a pile action.
    #[error("unknown pile action: {0}")]
    UnknownPileAction(String),

    /// PILE value is not a spreadable pile.
    #[error("unknown pile: {0}")]
    UnknownPile(String),
}

// =============================================================================
// COMMAND TYPES
// =============================================================================

/// Command type integers. Both peers must agree on these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandType {
    /// Main deck passcodes
    MainDeckData = 0,
    /// Fusion deck passcodes
    FusionDeckData = 1,
    /// Key-driven player action
    KeyCommand = 2,
    /// Pile spread/collapse
    MouseCommand = 3,
    /// Handshake RNG seed
    RngSeed = 4,
}

impl CommandType {
    /// Every command type.
    pub const ALL: [CommandType; 5] = [
        CommandType::MainDeckData,
        CommandType::FusionDeckData,
        CommandType::KeyCommand,
        CommandType::MouseCommand,
        CommandType::RngSeed,
    ];

    /// Wire integer.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Command type for a wire integer.
    pub fn from_code(code: u8) -> Option<CommandType> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandType::MainDeckData => "MAIN_DECK_DATA",
            CommandType::FusionDeckData => "FUSION_DECK_DATA",
            CommandType::KeyCommand => "KEY_COMMAND",
            CommandType::MouseCommand => "MOUSE_COMMAND",
            CommandType::RngSeed => "RNG_SEED",
        };
        f.write_str(name)
    }
}

// =============================================================================
// FLAT COMMAND RECORD
// =============================================================================

/// A typed key/value record, exactly as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandType,
    fields: BTreeMap<String, String>,
}

impl Command {
    /// Empty record of a type.
    pub fn new(kind: CommandType) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Command type.
    #[inline]
    pub fn kind(&self) -> CommandType {
        self.kind
    }

    /// Field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// All fields, sorted by key.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    fn require(&self, field: &'static str) -> Result<&str, ProtocolError> {
        self.get(field).ok_or(ProtocolError::MissingField {
            kind: self.kind,
            field,
        })
    }

    /// Serialize to the wire grammar. Fields are written in key order.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let mut out = String::with_capacity(16 + self.fields.len() * 16);
        out.push_str(COMMAND_TYPE_KEY);
        out.push(FIELD_SEPARATOR);
        out.push_str(&self.kind.code().to_string());
        out.push(FIELD_SEPARATOR);

        for (key, value) in &self.fields {
            validate_key(key)?;
            if value.contains(FIELD_SEPARATOR) {
                return Err(ProtocolError::IllegalSeparator { key: key.clone() });
            }
            if !value.is_ascii() {
                return Err(ProtocolError::NonAscii);
            }
            out.push_str(key);
            out.push(FIELD_SEPARATOR);
            out.push_str(value);
            out.push(FIELD_SEPARATOR);
        }

        Ok(out)
    }

    /// Parse a record. Any deviation from the grammar is an error.
    pub fn decode(payload: &str) -> Result<Command, ProtocolError> {
        if !payload.is_ascii() {
            return Err(ProtocolError::NonAscii);
        }
        let body = payload
            .strip_suffix(FIELD_SEPARATOR)
            .ok_or(ProtocolError::MissingTerminator)?;

        let tokens: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
        if tokens.len() % 2 != 0 {
            return Err(ProtocolError::OddTokenCount(tokens.len()));
        }
        if tokens[0] != COMMAND_TYPE_KEY {
            return Err(ProtocolError::MissingCommandType);
        }

        let kind = tokens[1]
            .parse::<u8>()
            .ok()
            .and_then(CommandType::from_code)
            .ok_or_else(|| ProtocolError::UnknownCommandType(tokens[1].to_string()))?;

        let mut fields = BTreeMap::new();
        for pair in tokens[2..].chunks_exact(2) {
            let (key, value) = (pair[0], pair[1]);
            validate_key(key)?;
            if fields.insert(key.to_string(), value.to_string()).is_some() {
                return Err(ProtocolError::DuplicateKey(key.to_string()));
            }
        }

        Ok(Command { kind, fields })
    }
}

fn validate_key(key: &str) -> Result<(), ProtocolError> {
    if key.is_empty() || key == COMMAND_TYPE_KEY {
        return Err(ProtocolError::InvalidKey(key.to_string()));
    }
    if key.contains(FIELD_SEPARATOR) {
        return Err(ProtocolError::IllegalSeparator { key: key.to_string() });
    }
    if !key.is_ascii() {
        return Err(ProtocolError::NonAscii);
    }
    Ok(())
}

/// Join passcodes with a separator after every entry.
pub fn encode_passcodes<S: AsRef<str>>(codes: &[S]) -> Result<String, ProtocolError> {
    let mut out = String::new();
    for code in codes {
        let code = code.as_ref();
        if code.is_empty() || code.contains(PASSCODE_SEPARATOR) || code.contains(FIELD_SEPARATOR) {
            return Err(ProtocolError::InvalidPasscode(code.to_string()));
        }
        out.push_str(code);
        out.push(PASSCODE_SEPARATOR);
    }
    Ok(out)
}

/// Split a passcode list. Every entry must be followed by the separator.
pub fn parse_passcodes(list: &str) -> Result<Vec<String>, ProtocolError> {
    if list.is_empty() {
        return Ok(Vec::new());
    }
    let body = list
        .strip_suffix(PASSCODE_SEPARATOR)
        .ok_or_else(|| ProtocolError::InvalidPasscode(list.to_string()))?;
    body.split(PASSCODE_SEPARATOR)
        .map(|code| {
            if code.is_empty() {
                Err(ProtocolError::InvalidPasscode(code.to_string()))
            } else {
                Ok(code.to_string())
            }
        })
        .collect()
}

// =============================================================================
// TYPED MESSAGES
// =============================================================================

/// Decoded duel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuelMessage {
    /// Handshake seed for the sender's stream.
    RngSeed(String),
    /// Sender's main deck passcodes, in file order.
    MainDeck(Vec<String>),
    /// Sender's fusion deck passcodes, in file order.
    FusionDeck(Vec<String>),
    /// Player action, with its target card for targeted actions.
    Key {
        /// Action
        action: DuelAction,
        /// Target card id
        target: Option<CardId>,
    },
    /// Pile spread/collapse, resolved against the sender's board.
    Mouse {
        /// Spread or collapse
        action: PileAction,
        /// Pile
        pile: PileTarget,
    },
}

impl DuelMessage {
    /// Command type this message travels as.
    pub fn kind(&self) -> CommandType {
        match self {
            DuelMessage::RngSeed(_) => CommandType::RngSeed,
            DuelMessage::MainDeck(_) => CommandType::MainDeckData,
            DuelMessage::FusionDeck(_) => CommandType::FusionDeckData,
            DuelMessage::Key { .. } => CommandType::KeyCommand,
            DuelMessage::Mouse { .. } => CommandType::MouseCommand,
        }
    }

    /// Flatten into a wire record.
    pub fn to_command(&self) -> Result<Command, ProtocolError> {
        let command = Command::new(self.kind());
        let command = match self {
            DuelMessage::RngSeed(seed) => command.with(SEED_KEY, seed.as_str()),
            DuelMessage::MainDeck(codes) | DuelMessage::FusionDeck(codes) => {
                command.with(PASSCODES_KEY, encode_passcodes(codes)?)
            }
            DuelMessage::Key { action, target } => {
                let command = command.with(KEY_KEY, action.key_code().to_string());
                match target {
                    Some(id) => command.with(ACTIVE_CARD_ID_KEY, id.as_str()),
                    None => command,
                }
            }
            DuelMessage::Mouse { action, pile } => command
                .with(ACTION_KEY, action.wire_name())
                .with(PILE_KEY, pile.wire_name()),
        };
        Ok(command)
    }

    /// Interpret a wire record.
    pub fn from_command(command: &Command) -> Result<DuelMessage, ProtocolError> {
        let message = match command.kind() {
            CommandType::RngSeed => DuelMessage::RngSeed(command.require(SEED_KEY)?.to_string()),
            CommandType::MainDeckData => {
                DuelMessage::MainDeck(parse_passcodes(command.require(PASSCODES_KEY)?)?)
            }
            CommandType::FusionDeckData => {
                DuelMessage::FusionDeck(parse_passcodes(command.require(PASSCODES_KEY)?)?)
            }
            CommandType::KeyCommand => {
                let raw = command.require(KEY_KEY)?;
                let action = raw
                    .parse::<u32>()
                    .ok()
                    .and_then(DuelAction::from_key_code)
                    .ok_or_else(|| ProtocolError::UnknownKeyCode(raw.to_string()))?;
                let target = command.get(ACTIVE_CARD_ID_KEY).map(CardId::from);
                if action.requires_target() && target.is_none() {
                    return Err(ProtocolError::MissingTarget(action));
                }
                DuelMessage::Key { action, target }
            }
            CommandType::MouseCommand => {
                let raw_action = command.require(ACTION_KEY)?;
                let action = PileAction::from_wire_name(raw_action)
                    .ok_or_else(|| ProtocolError::UnknownPileAction(raw_action.to_string()))?;
                let raw_pile = command.require(PILE_KEY)?;
                let pile = PileTarget::from_wire_name(raw_pile)
                    .ok_or_else(|| ProtocolError::UnknownPile(raw_pile.to_string()))?;
                DuelMessage::Mouse { action, pile }
            }
        };
        Ok(message)
    }

    /// Serialize straight to the wire grammar.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        self.to_command()?.encode()
    }

    /// Parse straight from the wire grammar.
    pub fn decode(payload: &str) -> Result<DuelMessage, ProtocolError> {
        Self::from_command(&Command::decode(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_seed_wire_format() {
        let wire = DuelMessage::RngSeed("aB3dE6gH".into()).encode().unwrap();
        assert_eq!(wire, "COMMAND_TYPE;4;SEED;aB3dE6gH;");
    }

    #[test]
    fn test_deck_wire_format() {
        let codes = vec!["1001".to_string(), "1002".into(), "1003".into()];
        let wire = DuelMessage::MainDeck(codes.clone()).encode().unwrap();
        assert_eq!(wire, "COMMAND_TYPE;0;PASSCODES;1001,1002,1003,;");
        assert_eq!(DuelMessage::decode(&wire), Ok(DuelMessage::MainDeck(codes)));

        let empty = DuelMessage::FusionDeck(Vec::new()).encode().unwrap();
        assert_eq!(empty, "COMMAND_TYPE;1;PASSCODES;;");
        assert_eq!(DuelMessage::decode(&empty), Ok(DuelMessage::FusionDeck(Vec::new())));
    }

    #[test]
    fn test_key_wire_format() {
        let message = DuelMessage::Key {
            action: DuelAction::NormalSummon,
            target: Some(CardId::from("abcDEF123456789")),
        };
        let wire = message.encode().unwrap();
        assert_eq!(wire, "COMMAND_TYPE;2;ACTIVE_CARD_ID;abcDEF123456789;KEY;78;");
        assert_eq!(DuelMessage::decode(&wire), Ok(message));

        let draw = DuelMessage::Key { action: DuelAction::Draw, target: None };
        assert_eq!(draw.encode().unwrap(), "COMMAND_TYPE;2;KEY;68;");
    }

    #[test]
    fn test_mouse_wire_format() {
        let message = DuelMessage::Mouse {
            action: PileAction::Spread,
            pile: PileTarget::Graveyard,
        };
        let wire = message.encode().unwrap();
        assert_eq!(wire, "COMMAND_TYPE;3;ACTION;SPREAD;PILE;GRAVEYARD;");
        assert_eq!(DuelMessage::decode(&wire), Ok(message));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(Command::decode("COMMAND_TYPE;4;SEED;abc"), Err(ProtocolError::MissingTerminator));
        assert_eq!(Command::decode("COMMAND_TYPE;4;SEED;"), Err(ProtocolError::OddTokenCount(3)));
        assert_eq!(Command::decode("SEED;abc;COMMAND_TYPE;4;"), Err(ProtocolError::MissingCommandType));
        assert_eq!(
            Command::decode("COMMAND_TYPE;9;"),
            Err(ProtocolError::UnknownCommandType("9".into()))
        );
        assert_eq!(
            Command::decode("COMMAND_TYPE;4;SEED;a;SEED;b;"),
            Err(ProtocolError::DuplicateKey("SEED".into()))
        );
        assert_eq!(
            Command::decode("COMMAND_TYPE;4;;a;"),
            Err(ProtocolError::InvalidKey(String::new()))
        );
        assert_eq!(Command::decode("COMMAND_TYPE;4;SEED;\u{e9};"), Err(ProtocolError::NonAscii));
        assert_eq!(Command::decode(""), Err(ProtocolError::MissingTerminator));
    }

    #[test]
    fn test_decode_rejects_bad_fields() {
        assert!(matches!(
            DuelMessage::decode("COMMAND_TYPE;4;"),
            Err(ProtocolError::MissingField { field: SEED_KEY, .. })
        ));
        assert_eq!(
            DuelMessage::decode("COMMAND_TYPE;2;KEY;69;"),
            Err(ProtocolError::UnknownKeyCode("69".into()))
        );
        assert_eq!(
            DuelMessage::decode("COMMAND_TYPE;2;KEY;70;"),
            Err(ProtocolError::MissingTarget(DuelAction::Flip))
        );
        assert_eq!(
            DuelMessage::decode("COMMAND_TYPE;3;ACTION;SPREAD;PILE;HAND;"),
            Err(ProtocolError::UnknownPile("HAND".into()))
        );
        assert!(matches!(
            DuelMessage::decode("COMMAND_TYPE;0;PASSCODES;1001,1002;"),
            Err(ProtocolError::InvalidPasscode(_))
        ));
    }

    #[test]
    fn test_encode_rejects_separators() {
        let command = Command::new(CommandType::RngSeed).with(SEED_KEY, "a;b");
        assert_eq!(
            command.encode(),
            Err(ProtocolError::IllegalSeparator { key: SEED_KEY.into() })
        );
        let reserved = Command::new(CommandType::RngSeed).with(COMMAND_TYPE_KEY, "4");
        assert!(matches!(reserved.encode(), Err(ProtocolError::InvalidKey(_))));
        assert!(DuelMessage::MainDeck(vec!["10,01".into()]).encode().is_err());
    }

    #[test]
    fn test_command_type_codes_are_stable() {
        assert_eq!(CommandType::MainDeckData.code(), 0);
        assert_eq!(CommandType::FusionDeckData.code(), 1);
        assert_eq!(CommandType::KeyCommand.code(), 2);
        assert_eq!(CommandType::MouseCommand.code(), 3);
        assert_eq!(CommandType::RngSeed.code(), 4);
        assert_eq!(CommandType::from_code(5), None);
    }

    fn passcode() -> impl Strategy<Value = String> {
        "[0-9]{1,8}"
    }

    fn card_id() -> impl Strategy<Value = CardId> {
        "[a-zA-Z0-9]{15}".prop_map(CardId::new)
    }

    fn message() -> impl Strategy<Value = DuelMessage> {
        prop_oneof![
            "[a-zA-Z0-9]{1,16}".prop_map(DuelMessage::RngSeed),
            prop::collection::vec(passcode(), 0..60).prop_map(DuelMessage::MainDeck),
            prop::collection::vec(passcode(), 0..15).prop_map(DuelMessage::FusionDeck),
            (prop::sample::select(DuelAction::ALL.to_vec()), card_id()).prop_map(|(action, id)| {
                DuelMessage::Key {
                    action,
                    target: action.requires_target().then_some(id),
                }
            }),
            (
                prop::sample::select(vec![PileAction::Spread, PileAction::Collapse]),
                prop::sample::select(vec![PileTarget::MainDeck, PileTarget::Graveyard, PileTarget::Banish]),
            )
                .prop_map(|(action, pile)| DuelMessage::Mouse { action, pile }),
        ]
    }

    proptest! {
        #[test]
        fn test_message_round_trip(message in message()) {
            let wire = message.encode().unwrap();
            prop_assert!(wire.ends_with(FIELD_SEPARATOR));
            prop_assert_eq!(DuelMessage::decode(&wire).unwrap(), message);
        }

        #[test]
        fn test_command_round_trip(
            kind in prop::sample::select(CommandType::ALL.to_vec()),
            fields in prop::collection::btree_map("[A-Z_]{1,12}", "[ -:<-~]{0,20}", 0..6),
        ) {
            let mut command = Command::new(kind);
            for (key, value) in fields.into_iter().filter(|(k, _)| k != COMMAND_TYPE_KEY) {
                command.insert(key, value);
            }
            let wire = command.encode().unwrap();
            prop_assert_eq!(Command::decode(&wire).unwrap(), command);
        }
    }
}
