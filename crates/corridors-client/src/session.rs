//! Client session: the state owned by the client's event loop.
//!
//! Inbound frames are decoded and applied to the [`StateTree`], then the
//! selection machine is reconciled against the new authoritative state.
//! User intents go through the [`CommandDispatcher`]. Everything runs on
//! one thread; no call blocks.
//!
//! A reconnect starts a new epoch. Nothing says how many patches were
//! missed while disconnected, so the tree is dropped and the server's
//! snapshot for the new epoch rebuilds it.

use corridors_state::{is_prefix, parse_keypath, Patch, PatchError, Path, PathStep, StateTree};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::dispatch::{CommandDispatcher, DispatchError};
use crate::game::{Candidate, Color, GameRecord, GameSummary, Notification, TreeView, UserIdentity};
use crate::protocol::{decode_inbound, Opponent, ProtocolError};
use crate::selection::{
    Reconciled, RecordUpdate, SelectionMachine, SelectionMode, SelectionState, Transition,
    TurnContext,
};
use crate::transport::{ConnectionState, Transport};

/// A frame that could not be applied. The session carries on.
#[derive(Debug, Error)]
pub enum SyncWarning {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not connected ({0:?})")]
    NotConnected(ConnectionState),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// What applying one inbound frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub revision: u64,
    pub reconciled: Option<Reconciled>,
}

/// Paths of the game record fields the selection machine watches.
#[derive(Debug, Clone)]
struct WatchedPaths {
    selected: Path,
    locations: Path,
    commands: Path,
}

impl WatchedPaths {
    fn new(game_keypath: &str) -> Self {
        let field = |name: &str| {
            let mut path = parse_keypath(game_keypath);
            path.push(PathStep::from(name));
            path
        };
        Self {
            selected: field("selected"),
            locations: field("locations"),
            commands: field("commands"),
        }
    }

    /// A patch touches a field if it writes the field, something inside
    /// it, or one of its ancestors.
    fn update_for(&self, patch_path: &[PathStep]) -> RecordUpdate {
        let touches =
            |field: &Path| is_prefix(patch_path, field) || is_prefix(field, patch_path);
        RecordUpdate {
            selected: touches(&self.selected),
            locations: touches(&self.locations),
            commands: touches(&self.commands),
        }
    }
}

pub struct ClientSession<T> {
    config: ClientConfig,
    watched: WatchedPaths,
    tree: StateTree,
    selection: SelectionMachine,
    dispatcher: CommandDispatcher<T>,
    connection: ConnectionState,
    epoch: u64,
}

impl<T: Transport> ClientSession<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            watched: WatchedPaths::new(&config.keys.game),
            config,
            tree: StateTree::new(),
            selection: SelectionMachine::new(),
            dispatcher: CommandDispatcher::new(transport),
            connection: ConnectionState::Connecting,
            epoch: 0,
        }
    }

    // ── Connection ────────────────────────────────────────────────────────

    /// Record a connection state change reported by the transport.
    pub fn on_connection_state(&mut self, state: ConnectionState) {
        if state == self.connection {
            return;
        }
        if state == ConnectionState::Open {
            self.epoch += 1;
            if self.epoch > 1 {
                self.tree.reset();
                self.selection.reset();
                info!(epoch = self.epoch, "reconnected; state dropped until resynchronized");
            } else {
                info!(epoch = self.epoch, "connected");
            }
        } else {
            debug!(?state, "connection state changed");
        }
        self.connection = state;
    }

    // ── Inbound ───────────────────────────────────────────────────────────

    /// Handle one inbound text frame.
    pub fn on_text(&mut self, text: &str) -> Result<SyncOutcome, SyncWarning> {
        let patch = decode_inbound(text).inspect_err(|e| {
            warn!(error = %e, frame = text, "inbound frame ignored");
        })?;
        self.apply(&patch)
    }

    /// Apply one patch and reconcile the selection with it.
    pub fn apply(&mut self, patch: &Patch) -> Result<SyncOutcome, SyncWarning> {
        let revision = self.tree.apply(patch).inspect_err(|e| {
            warn!(error = %e, kind = patch.kind().as_str(), "patch skipped");
        })?;
        debug!(
            kind = patch.kind().as_str(),
            path = %corridors_state::format_keypath(patch.path()),
            revision,
            "patch applied"
        );

        let update = self.watched.update_for(patch.path());
        let view = TreeView::new(&self.tree, &self.config.keys);
        let record = view.current_game();
        let ctx = TurnContext {
            local_color: view.local_color(),
            record: record.as_ref(),
        };
        let reconciled = self.selection.reconcile(&ctx, update);
        if let Some(reconciled) = reconciled {
            debug!(?reconciled, "selection reconciled with server state");
        }
        Ok(SyncOutcome { revision, reconciled })
    }

    // ── User intents ──────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.connection.is_interactive() {
            Ok(())
        } else {
            Err(SessionError::NotConnected(self.connection))
        }
    }

    pub fn choose_mode(&mut self, mode: SelectionMode) -> Result<Transition, SessionError> {
        self.ensure_open()?;
        let view = TreeView::new(&self.tree, &self.config.keys);
        let record = view.current_game();
        let ctx = TurnContext {
            local_color: view.local_color(),
            record: record.as_ref(),
        };
        Ok(self.dispatcher.choose_mode(&mut self.selection, mode, &ctx)?)
    }

    pub fn cancel(&mut self) -> Result<SelectionMode, SessionError> {
        self.ensure_open()?;
        Ok(self.dispatcher.cancel(&mut self.selection)?)
    }

    /// Send the command for destination `index`; `None` while idle.
    pub fn choose_destination(&mut self, index: usize) -> Result<Option<Value>, SessionError> {
        self.ensure_open()?;
        let record = TreeView::new(&self.tree, &self.config.keys).current_game();
        Ok(self
            .dispatcher
            .choose_destination(&mut self.selection, record.as_ref(), index)?)
    }

    pub fn new_game(&mut self, opponent: Opponent) -> Result<(), SessionError> {
        self.ensure_open()?;
        Ok(self.dispatcher.new_game(opponent)?)
    }

    pub fn join_game(&mut self, game_id: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        Ok(self.dispatcher.join_game(game_id)?)
    }

    // ── Reads for the rendering layer ─────────────────────────────────────

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.dispatcher.transport_mut()
    }

    fn view(&self) -> TreeView<'_> {
        TreeView::new(&self.tree, &self.config.keys)
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.view().user()
    }

    pub fn local_color(&self) -> Option<Color> {
        self.view().local_color()
    }

    pub fn current_game(&self) -> Option<GameRecord> {
        self.view().current_game()
    }

    pub fn your_turn(&self) -> bool {
        match (self.current_game(), self.local_color()) {
            (Some(game), Some(color)) => game.is_turn_of(color),
            _ => false,
        }
    }

    pub fn games(&self) -> Vec<GameSummary> {
        self.view().games()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.view().notifications()
    }

    /// Destinations to draw as clickable.
    pub fn highlighted(&self) -> Vec<Candidate> {
        self.selection.highlighted(self.current_game().as_ref())
    }
}
