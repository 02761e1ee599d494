//! Typed, read-only views of the records the server keeps in the state tree.
//!
//! The tree itself stays schema-free; these types are read out of it on
//! demand. Every field is defaulted, so a record that is still being filled
//! in by patches reads fine. A record whose fields have the wrong JSON type
//! does not read at all and is logged.

use corridors_state::StateTree;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::TreeKeys;

// ── Leaf types ────────────────────────────────────────────────────────────

/// A player seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
        }
    }

    pub fn parse(s: &str) -> Option<Color> {
        match s {
            "red" => Some(Color::Red),
            "blue" => Some(Color::Blue),
            _ => None,
        }
    }
}

/// A board square, written on the wire as `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "(u8, u8)")]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl From<(u8, u8)> for Cell {
    fn from((row, col): (u8, u8)) -> Self {
        Cell { row, col }
    }
}

/// One slot of the wall grid: `0`, `1` (horizontal) or `-1` (vertical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "i64")]
pub enum WallCell {
    #[default]
    Empty,
    Horizontal,
    Vertical,
}

impl TryFrom<i64> for WallCell {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WallCell::Empty),
            1 => Ok(WallCell::Horizontal),
            -1 => Ok(WallCell::Vertical),
            other => Err(format!("invalid wall cell {other}")),
        }
    }
}

/// A seated player: a user (`name`, `uuid`) or a bot (`type`, `name`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PlayerInfo {
    pub name: Option<String>,
    pub uuid: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl PlayerInfo {
    pub fn is_bot(&self) -> bool {
        self.uuid.is_none() && self.kind.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Players {
    pub red: Option<PlayerInfo>,
    pub blue: Option<PlayerInfo>,
}

impl Players {
    pub fn get(&self, color: Color) -> Option<&PlayerInfo> {
        match color {
            Color::Red => self.red.as_ref(),
            Color::Blue => self.blue.as_ref(),
        }
    }

    /// The seat held by the user with this uuid.
    pub fn seat_of(&self, uuid: &str) -> Option<Color> {
        [Color::Red, Color::Blue]
            .into_iter()
            .find(|&color| self.get(color).and_then(|p| p.uuid.as_deref()) == Some(uuid))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PieceState {
    pub location: Option<Cell>,
    pub walls: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    #[serde(rename = "N")]
    pub size: u8,
    pub walls_per_piece: u32,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            size: 9,
            walls_per_piece: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Board {
    pub turn: Option<Color>,
    pub red: PieceState,
    pub blue: PieceState,
    /// Wall slots at the intersections of squares, `size - 1` per side.
    pub walls: Vec<Vec<WallCell>>,
    pub settings: BoardSettings,
}

impl Board {
    pub fn piece(&self, color: Color) -> &PieceState {
        match color {
            Color::Red => &self.red,
            Color::Blue => &self.blue,
        }
    }

    pub fn wall_at(&self, row: usize, col: usize) -> WallCell {
        self.walls
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or_default()
    }
}

/// A destination the user may click, paired with the command it sends.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub location: Cell,
    pub command: Value,
}

// ── Records ───────────────────────────────────────────────────────────────

/// The game being shown.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct GameRecord {
    pub uuid: Option<String>,
    pub players: Players,
    pub board: Board,
    /// Server-side selection: `"piece"`, `"hwall"`, `"vwall"` or null.
    pub selected: Option<String>,
    pub locations: Vec<Cell>,
    /// Opaque commands, index-aligned with `locations`.
    pub commands: Vec<Value>,
    pub over: bool,
    pub winner: Option<Color>,
}

impl GameRecord {
    pub fn read(value: &Value) -> Result<Self, serde_json::Error> {
        GameRecord::deserialize(value)
    }

    pub fn is_turn_of(&self, color: Color) -> bool {
        !self.over && self.board.turn == Some(color)
    }

    pub fn walls_left(&self, color: Color) -> u32 {
        self.board.piece(color).walls
    }

    /// Destinations paired with their commands.
    ///
    /// `None` while `locations` and `commands` differ in length: the server
    /// writes them in separate patches, so the pair is not yet in sync.
    pub fn candidates(&self) -> Option<Vec<Candidate>> {
        if self.locations.len() != self.commands.len() {
            return None;
        }
        Some(
            self.locations
                .iter()
                .zip(&self.commands)
                .enumerate()
                .map(|(index, (location, command))| Candidate {
                    index,
                    location: *location,
                    command: command.clone(),
                })
                .collect(),
        )
    }
}

/// An entry of the joinable games list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct GameSummary {
    pub uuid: String,
    pub players: Players,
    pub turn: Option<Color>,
}

impl GameSummary {
    pub fn is_joinable(&self) -> bool {
        self.players.blue.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct UserIdentity {
    pub name: String,
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Success,
    Warning,
    Danger,
    #[serde(other)]
    Other,
}

/// A server message for the user, e.g. a rejected command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub text: String,
    pub level: NotificationLevel,
}

// ── Tree view ─────────────────────────────────────────────────────────────

/// Reads typed records out of a [`StateTree`].
#[derive(Debug, Clone, Copy)]
pub struct TreeView<'a> {
    tree: &'a StateTree,
    keys: &'a TreeKeys,
}

impl<'a> TreeView<'a> {
    pub fn new(tree: &'a StateTree, keys: &'a TreeKeys) -> Self {
        Self { tree, keys }
    }

    fn read<T: DeserializeOwned>(&self, keypath: &str) -> Option<T> {
        let value = self.tree.get_keypath(keypath)?;
        if value.is_null() {
            return None;
        }
        match T::deserialize(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(keypath, error = %e, "record does not match its expected shape");
                None
            }
        }
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.read(&self.keys.user)
    }

    pub fn current_game(&self) -> Option<GameRecord> {
        self.read(&self.keys.game)
    }

    /// The local user's seat in the current game.
    ///
    /// Taken from the server's color assignment when present, otherwise
    /// found by matching the user's uuid against the seated players.
    pub fn local_color(&self) -> Option<Color> {
        let assigned = self
            .tree
            .get_keypath(&self.keys.color)
            .and_then(Value::as_str)
            .and_then(Color::parse);
        if assigned.is_some() {
            return assigned;
        }
        let user = self.user()?;
        self.current_game()?.players.seat_of(&user.uuid)
    }

    pub fn games(&self) -> Vec<GameSummary> {
        self.read(&self.keys.games).unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.read(&self.keys.notifications).unwrap_or_default()
    }
}
