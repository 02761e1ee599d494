//! Wire codec for the client's message channel.
//!
//! Every frame is a JSON array whose first element names the message.
//! Inbound frames are patches (`["set", path, value]`,
//! `["push", path, value]`); outbound frames are commands followed by
//! their arguments (`["game.select", "piece"]`).

use corridors_state::{path_from_json, Patch, PathError};
use serde_json::{json, Value};
use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed frame: {0}")]
    Malformed(&'static str),
    #[error("bad path in `{kind}` frame: {source}")]
    Path {
        kind: String,
        #[source]
        source: PathError,
    },
    #[error("unknown message kind `{0}`")]
    UnknownKind(String),
}

// ── Inbound ───────────────────────────────────────────────────────────────

/// Decode one inbound text frame into a patch.
///
/// # Example
///
/// ```
/// use corridors_client::protocol::decode_inbound;
/// use corridors_state::{parse_keypath, Patch};
/// use serde_json::json;
///
/// let patch = decode_inbound(r#"["set", "current_game.board.turn", "blue"]"#).unwrap();
/// assert_eq!(patch, Patch::assign(parse_keypath("current_game.board.turn"), json!("blue")));
/// ```
pub fn decode_inbound(text: &str) -> Result<Patch, ProtocolError> {
    let frame: Value = serde_json::from_str(text)?;
    decode_inbound_value(frame)
}

/// Decode an already parsed inbound frame.
///
/// A missing value element reads as `null`.
pub fn decode_inbound_value(frame: Value) -> Result<Patch, ProtocolError> {
    let Value::Array(items) = frame else {
        return Err(ProtocolError::Malformed("frame is not an array"));
    };
    let mut items = items.into_iter();
    let kind = match items.next() {
        Some(Value::String(kind)) => kind,
        Some(_) => return Err(ProtocolError::Malformed("message kind is not a string")),
        None => return Err(ProtocolError::Malformed("empty frame")),
    };
    if kind != "set" && kind != "push" {
        return Err(ProtocolError::UnknownKind(kind));
    }

    let raw_path = items
        .next()
        .ok_or(ProtocolError::Malformed("patch frame without a path"))?;
    let path = path_from_json(&raw_path).map_err(|source| ProtocolError::Path {
        kind: kind.clone(),
        source,
    })?;
    let value = items.next().unwrap_or(Value::Null);
    if items.next().is_some() {
        return Err(ProtocolError::Malformed("patch frame has trailing elements"));
    }

    Ok(if kind == "set" {
        Patch::Assign { path, value }
    } else {
        Patch::Append { path, value }
    })
}

// ── Outbound ──────────────────────────────────────────────────────────────

/// Which selection the server should compute destinations for.
///
/// The server tells horizontal and vertical walls apart itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectKind {
    Piece,
    Wall,
}

impl SelectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectKind::Piece => "piece",
            SelectKind::Wall => "wall",
        }
    }
}

/// Who fills the second seat of a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opponent {
    Human,
    Bot,
}

impl Opponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Opponent::Human => "human",
            Opponent::Bot => "bot",
        }
    }
}

/// A message sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Select(SelectKind),
    /// A command taken verbatim from the server's `commands` list.
    Command(Value),
    NewGame(Opponent),
    JoinGame(String),
}

impl OutboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundMessage::Select(_) => "game.select",
            OutboundMessage::Command(_) => "game.command",
            OutboundMessage::NewGame(_) => "new_game",
            OutboundMessage::JoinGame(_) => "join_game",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            OutboundMessage::Select(kind) => json!([self.name(), kind.as_str()]),
            OutboundMessage::Command(command) => json!([self.name(), command]),
            OutboundMessage::NewGame(opponent) => json!([self.name(), opponent.as_str()]),
            OutboundMessage::JoinGame(id) => json!([self.name(), id]),
        }
    }

    /// Encode as a compact text frame.
    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
