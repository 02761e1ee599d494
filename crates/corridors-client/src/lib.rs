//! Corridors client core.
//!
//! The server is authoritative for a two-player Corridors game and streams
//! its state as path-addressed patches. This crate keeps the local mirror
//! of that state in sync and turns user clicks into commands the server can
//! verify, without knowing any game rules itself.
//!
//! Module map:
//! - [`protocol`]: wire frames in both directions
//! - [`game`]: typed views of the records in the state tree
//! - [`selection`]: which kind of move the user is choosing
//! - [`dispatch`]: sends selections and moves to the server
//! - [`transport`]: the seam to the message channel
//! - [`session`]: ties the above to the client's event loop
//! - [`config`], [`logging`], [`replay`]: ambient support

pub mod config;
pub mod dispatch;
pub mod game;
pub mod logging;
pub mod protocol;
pub mod replay;
pub mod selection;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use dispatch::{CommandDispatcher, DispatchError};
pub use game::{Candidate, Cell, Color, GameRecord, GameSummary, TreeView};
pub use protocol::{decode_inbound, Opponent, OutboundMessage, ProtocolError, SelectKind};
pub use selection::{
    ContractViolation, SelectRejected, SelectionMachine, SelectionMode, SelectionState, Transition,
};
pub use session::{ClientSession, SessionError, SyncOutcome, SyncWarning};
pub use transport::{ConnectionState, Outbox, Transport, TransportError};
