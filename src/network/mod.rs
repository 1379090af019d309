//! Network Layer
//!
//! Peer-to-peer replication over a single TCP stream.
//! This layer is **non-deterministic**: it only moves commands between
//! peers. All duel state changes run through `duel/`.

pub mod protocol;
pub mod transport;
pub mod session;

pub use protocol::{Command, CommandType, DuelMessage, ProtocolError};
pub use transport::{Transport, TransportError};
pub use session::{DuelSession, LocalInput, Role, SessionConfig, SessionError, TickSummary};
