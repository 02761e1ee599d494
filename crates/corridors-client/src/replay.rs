//! Transcript replay.
//!
//! Drives a [`ClientSession`] from a text transcript, one entry per line,
//! and reports the resulting state. Used by the `corridors-replay` binary
//! to reproduce synchronization problems from captured traffic.
//!
//! Transcript lines:
//! - `["set", path, value]`, `["push", path, value]`: inbound frames
//! - `> piece`, `> hwall`, `> vwall`, `> cancel`, `> destination N`,
//!   `> new_game human|bot`, `> join ID`: user intents
//! - `@ open`, `@ closing`, `@ closed`, `@ connecting`: connection changes
//! - blank lines and `#` comments are skipped
//!
//! The session starts with the connection open.

use serde_json::Value;
use thiserror::Error;

use crate::config::{ClientConfig, ConfigError};
use crate::protocol::{Opponent, OutboundMessage};
use crate::selection::{SelectionMode, SelectionState};
use crate::session::ClientSession;
use crate::transport::{ConnectionState, Outbox};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: {message}")]
    Directive { line: usize, message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// ── Report ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub tree: Value,
    pub revision: u64,
    pub epoch: u64,
    pub selection: SelectionState,
    pub sent: Vec<OutboundMessage>,
    /// One entry per line that was skipped or refused, prefixed with its
    /// line number.
    pub warnings: Vec<String>,
}

impl ReplayReport {
    /// The report as a JSON document.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "tree": self.tree,
            "revision": self.revision,
            "epoch": self.epoch,
            "selection": match self.selection {
                SelectionState::Idle => Value::Null,
                SelectionState::AwaitingDestination(mode) => Value::from(mode.as_selected()),
            },
            "sent": self.sent.iter().map(OutboundMessage::to_json).collect::<Vec<_>>(),
            "warnings": self.warnings,
        })
    }
}

// ── Replay ────────────────────────────────────────────────────────────────

enum Entry<'a> {
    Frame(&'a str),
    Intent(&'a str),
    Connection(&'a str),
}

fn classify(line: &str) -> Option<Entry<'_>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        None
    } else if let Some(rest) = line.strip_prefix('>') {
        Some(Entry::Intent(rest.trim()))
    } else if let Some(rest) = line.strip_prefix('@') {
        Some(Entry::Connection(rest.trim()))
    } else {
        Some(Entry::Frame(line))
    }
}

fn directive_error(line: usize, message: impl Into<String>) -> ReplayError {
    ReplayError::Directive {
        line,
        message: message.into(),
    }
}

fn run_intent(
    session: &mut ClientSession<Outbox>,
    line: usize,
    intent: &str,
) -> Result<Option<String>, ReplayError> {
    let mut words = intent.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let arg = words.next();
    let outcome = match (verb, arg) {
        ("piece", None) => session.choose_mode(SelectionMode::Piece).map(drop),
        ("hwall", None) => session.choose_mode(SelectionMode::HorizontalWall).map(drop),
        ("vwall", None) => session.choose_mode(SelectionMode::VerticalWall).map(drop),
        ("cancel", None) => session.cancel().map(drop),
        ("destination", Some(index)) => {
            let index: usize = index
                .parse()
                .map_err(|_| directive_error(line, format!("bad destination index `{index}`")))?;
            session.choose_destination(index).map(drop)
        }
        ("new_game", Some("human")) => session.new_game(Opponent::Human),
        ("new_game", Some("bot")) => session.new_game(Opponent::Bot),
        ("join", Some(id)) => session.join_game(id),
        _ => return Err(directive_error(line, format!("unknown intent `{intent}`"))),
    };
    Ok(outcome.err().map(|e| format!("line {line}: {e}")))
}

fn parse_connection(line: usize, name: &str) -> Result<ConnectionState, ReplayError> {
    match name {
        "connecting" => Ok(ConnectionState::Connecting),
        "open" => Ok(ConnectionState::Open),
        "closing" => Ok(ConnectionState::Closing),
        "closed" => Ok(ConnectionState::Closed),
        other => Err(directive_error(line, format!("unknown connection state `{other}`"))),
    }
}

/// Replay a transcript against a fresh session.
///
/// # Example
///
/// ```
/// use corridors_client::config::ClientConfig;
/// use corridors_client::replay::replay_transcript;
/// use serde_json::json;
///
/// let report = replay_transcript(
///     r#"
///     ["set", ["board", "turn"], "red"]
///     ["set", ["board", "red", "walls"], 10]
///     "#,
///     ClientConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(report.tree, json!({"board": {"turn": "red", "red": {"walls": 10}}}));
/// ```
pub fn replay_transcript(text: &str, config: ClientConfig) -> Result<ReplayReport, ReplayError> {
    let mut session = ClientSession::new(config, Outbox::new());
    session.on_connection_state(ConnectionState::Open);
    let mut sent = Vec::new();
    let mut warnings = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        match classify(raw) {
            None => {}
            Some(Entry::Frame(frame)) => {
                if let Err(e) = session.on_text(frame) {
                    warnings.push(format!("line {line}: {e}"));
                }
            }
            Some(Entry::Intent(intent)) => {
                if let Some(warning) = run_intent(&mut session, line, intent)? {
                    warnings.push(warning);
                }
            }
            Some(Entry::Connection(name)) => {
                session.on_connection_state(parse_connection(line, name)?);
            }
        }
        sent.extend(session.transport_mut().drain());
    }

    Ok(ReplayReport {
        tree: session.tree().root().clone(),
        revision: session.tree().revision(),
        epoch: session.epoch(),
        selection: session.selection(),
        sent,
        warnings,
    })
}
