//! Selection state machine.
//!
//! Tracks which kind of move the local user is picking a destination for.
//! The machine never decides legality: the server pushes the legal
//! destinations into the game record's `locations`/`commands` pair, and a
//! destination click maps to a command purely by index.
//!
//! ```text
//!            choose_mode (gated)
//!   Idle ─────────────────────────▶ AwaitingDestination(mode)
//!    ▲                                 │
//!    └─────────────────────────────────┘
//!     command sent, same mode re-chosen, cancel,
//!     turn moved on, game over
//! ```

use thiserror::Error;

use crate::game::{Candidate, Color, GameRecord};
use crate::protocol::SelectKind;

// ── Modes and states ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    Piece,
    HorizontalWall,
    VerticalWall,
}

impl SelectionMode {
    /// The select message that asks the server for this mode's destinations.
    pub fn select_kind(self) -> SelectKind {
        match self {
            SelectionMode::Piece => SelectKind::Piece,
            SelectionMode::HorizontalWall | SelectionMode::VerticalWall => SelectKind::Wall,
        }
    }

    pub fn is_wall(self) -> bool {
        self != SelectionMode::Piece
    }

    /// Parse the game record's `selected` field.
    pub fn from_selected(selected: &str) -> Option<SelectionMode> {
        match selected {
            "piece" => Some(SelectionMode::Piece),
            "hwall" => Some(SelectionMode::HorizontalWall),
            "vwall" => Some(SelectionMode::VerticalWall),
            _ => None,
        }
    }

    pub fn as_selected(self) -> &'static str {
        match self {
            SelectionMode::Piece => "piece",
            SelectionMode::HorizontalWall => "hwall",
            SelectionMode::VerticalWall => "vwall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    AwaitingDestination(SelectionMode),
}

impl SelectionState {
    pub fn mode(self) -> Option<SelectionMode> {
        match self {
            SelectionState::Idle => None,
            SelectionState::AwaitingDestination(mode) => Some(mode),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Why a mode could not be selected right now. Not an error of the caller:
/// the state simply does not allow it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectRejected {
    #[error("no game is being shown")]
    NoGame,
    #[error("the local user has no seat in this game")]
    NoSeat,
    #[error("the game is over")]
    GameOver,
    #[error("it is not the local user's turn")]
    NotYourTurn,
    #[error("no walls left to place")]
    NoWallsLeft,
}

/// A caller asked for something the current state never offers.
///
/// These point at a bug in the rendering layer, never at a network
/// condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("destination {index} is out of range for {len} candidates")]
    DestinationOutOfRange { index: usize, len: usize },
    #[error("locations ({locations}) and commands ({commands}) differ in length")]
    LengthMismatch { locations: usize, commands: usize },
    #[error("destinations for {mode:?} have not arrived yet")]
    CandidatesPending { mode: SelectionMode },
    #[error("no selection to cancel")]
    NothingToCancel,
}

// ── Inputs and outputs ────────────────────────────────────────────────────

/// What the machine needs to know about authoritative state.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub local_color: Option<Color>,
    pub record: Option<&'a GameRecord>,
}

impl TurnContext<'_> {
    pub fn is_local_turn(&self) -> bool {
        match (self.record, self.local_color) {
            (Some(record), Some(color)) => record.is_turn_of(color),
            _ => false,
        }
    }

    /// Check whether `mode` may be selected now.
    pub fn gate(&self, mode: SelectionMode) -> Result<(), SelectRejected> {
        let record = self.record.ok_or(SelectRejected::NoGame)?;
        let color = self.local_color.ok_or(SelectRejected::NoSeat)?;
        if record.over {
            return Err(SelectRejected::GameOver);
        }
        if !record.is_turn_of(color) {
            return Err(SelectRejected::NotYourTurn);
        }
        if mode.is_wall() && record.walls_left(color) == 0 {
            return Err(SelectRejected::NoWallsLeft);
        }
        Ok(())
    }
}

/// Result of choosing a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered(SelectionMode),
    /// The previous mode was dropped in favour of a new one.
    Switched { from: SelectionMode, to: SelectionMode },
    /// The active mode was chosen again.
    Cancelled(SelectionMode),
}

impl Transition {
    pub fn target(self) -> SelectionState {
        match self {
            Transition::Entered(mode) | Transition::Switched { to: mode, .. } => {
                SelectionState::AwaitingDestination(mode)
            }
            Transition::Cancelled(_) => SelectionState::Idle,
        }
    }
}

/// Which fields of the game record a patch wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordUpdate {
    pub selected: bool,
    pub locations: bool,
    pub commands: bool,
}

/// Result of reconciling with authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Selection dropped because the turn moved on or the game ended.
    Reset(SelectionMode),
    /// The server's `selected` value replaced the local one.
    Adopted(SelectionState),
}

// ── Machine ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    state: SelectionState,
    /// The server's `selected` mode when `locations` was last written.
    locations_under: Option<SelectionMode>,
    /// The server's `selected` mode when `commands` was last written.
    commands_under: Option<SelectionMode>,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SelectionState::Idle
    }

    /// True while awaiting a destination and neither destination list was
    /// written for a different mode than the active one.
    ///
    /// Lists written while the server had nothing selected belong to no
    /// mode and are taken as they are.
    pub fn candidates_ready(&self) -> bool {
        let Some(mode) = self.state.mode() else {
            return false;
        };
        let belongs = |under: Option<SelectionMode>| under.map_or(true, |m| m == mode);
        belongs(self.locations_under) && belongs(self.commands_under)
    }

    /// Work out what choosing `mode` would do, without doing it.
    pub fn plan(&self, mode: SelectionMode, ctx: &TurnContext<'_>) -> Result<Transition, SelectRejected> {
        ctx.gate(mode)?;
        Ok(match self.state {
            SelectionState::Idle => Transition::Entered(mode),
            SelectionState::AwaitingDestination(active) if active == mode => {
                Transition::Cancelled(mode)
            }
            SelectionState::AwaitingDestination(active) => Transition::Switched {
                from: active,
                to: mode,
            },
        })
    }

    /// Move to the state a planned transition leads to.
    pub fn commit(&mut self, transition: Transition) {
        self.state = transition.target();
    }

    pub fn choose_mode(
        &mut self,
        mode: SelectionMode,
        ctx: &TurnContext<'_>,
    ) -> Result<Transition, SelectRejected> {
        let transition = self.plan(mode, ctx)?;
        self.commit(transition);
        Ok(transition)
    }

    pub fn cancel(&mut self) -> Result<SelectionMode, ContractViolation> {
        let mode = self.state.mode().ok_or(ContractViolation::NothingToCancel)?;
        self.state = SelectionState::Idle;
        Ok(mode)
    }

    /// Back to `Idle` after a command went out.
    pub fn complete(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Forget the selection and where the destination lists came from.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Look up the destination at `index`.
    ///
    /// `Ok(None)` while idle: there is nothing to choose from.
    pub fn destination(
        &self,
        record: Option<&GameRecord>,
        index: usize,
    ) -> Result<Option<Candidate>, ContractViolation> {
        let SelectionState::AwaitingDestination(mode) = self.state else {
            return Ok(None);
        };
        if !self.candidates_ready() {
            return Err(ContractViolation::CandidatesPending { mode });
        }
        let Some(record) = record else {
            return Err(ContractViolation::DestinationOutOfRange { index, len: 0 });
        };
        let candidates = record.candidates().ok_or(ContractViolation::LengthMismatch {
            locations: record.locations.len(),
            commands: record.commands.len(),
        })?;
        let len = candidates.len();
        candidates
            .into_iter()
            .nth(index)
            .map(Some)
            .ok_or(ContractViolation::DestinationOutOfRange { index, len })
    }

    /// Destinations to highlight: only while awaiting one, and only when
    /// the server's lists belong to the current mode.
    pub fn highlighted(&self, record: Option<&GameRecord>) -> Vec<Candidate> {
        if !self.candidates_ready() {
            return Vec::new();
        }
        record.and_then(GameRecord::candidates).unwrap_or_default()
    }

    /// Bring the machine in line with authoritative state after a patch.
    ///
    /// Never leaves `Idle`: only a user's choice does that.
    pub fn reconcile(&mut self, ctx: &TurnContext<'_>, update: RecordUpdate) -> Option<Reconciled> {
        let server = ctx
            .record
            .and_then(|r| r.selected.as_deref())
            .and_then(SelectionMode::from_selected);
        if update.locations {
            self.locations_under = server;
        }
        if update.commands {
            self.commands_under = server;
        }

        let active = self.state.mode()?;
        if !ctx.is_local_turn() {
            self.state = SelectionState::Idle;
            return Some(Reconciled::Reset(active));
        }
        if !update.selected {
            return None;
        }
        let adopted = server.map_or(SelectionState::Idle, SelectionState::AwaitingDestination);
        if adopted == self.state {
            return None;
        }
        self.state = adopted;
        Some(Reconciled::Adopted(adopted))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
