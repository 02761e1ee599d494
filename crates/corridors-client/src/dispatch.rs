//! Command dispatcher: turns completed selections into outbound messages.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::game::GameRecord;
use crate::protocol::{Opponent, OutboundMessage};
use crate::selection::{
    ContractViolation, SelectRejected, SelectionMachine, SelectionMode, Transition, TurnContext,
};
use crate::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("selection rejected: {0}")]
    Rejected(#[from] SelectRejected),
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct CommandDispatcher<T> {
    transport: T,
}

impl<T: Transport> CommandDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Choose (or re-choose) a selection mode and ask the server for its
    /// destinations.
    ///
    /// Re-choosing the active wall mode cancels locally without a message:
    /// a repeated wall select would make the server flip orientation.
    pub fn choose_mode(
        &mut self,
        selection: &mut SelectionMachine,
        mode: SelectionMode,
        ctx: &TurnContext<'_>,
    ) -> Result<Transition, DispatchError> {
        let transition = selection.plan(mode, ctx).inspect_err(|reason| {
            debug!(?mode, %reason, "mode selection rejected");
        })?;
        let announce = match transition {
            Transition::Entered(_) | Transition::Switched { .. } => true,
            Transition::Cancelled(mode) => mode == SelectionMode::Piece,
        };
        if announce {
            self.transport
                .send(&OutboundMessage::Select(mode.select_kind()))?;
        }
        selection.commit(transition);
        debug!(?transition, "selection changed");
        Ok(transition)
    }

    /// Drop the active selection.
    pub fn cancel(&mut self, selection: &mut SelectionMachine) -> Result<SelectionMode, DispatchError> {
        let Some(mode) = selection.state().mode() else {
            error!("cancel requested while idle");
            return Err(ContractViolation::NothingToCancel.into());
        };
        if mode == SelectionMode::Piece {
            self.transport
                .send(&OutboundMessage::Select(mode.select_kind()))?;
        }
        selection.cancel()?;
        Ok(mode)
    }

    /// Send the command paired with destination `index`.
    ///
    /// Returns the command sent, or `None` when there was no active
    /// selection. The selection returns to idle only once the command is
    /// out.
    pub fn choose_destination(
        &mut self,
        selection: &mut SelectionMachine,
        record: Option<&GameRecord>,
        index: usize,
    ) -> Result<Option<Value>, DispatchError> {
        let candidate = match selection.destination(record, index) {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                debug!(index, "destination chosen while idle; ignored");
                return Ok(None);
            }
            Err(violation) => {
                error!(index, %violation, "invalid destination choice");
                return Err(violation.into());
            }
        };
        self.transport
            .send(&OutboundMessage::Command(candidate.command.clone()))?;
        selection.complete();
        debug!(index, command = %candidate.command, "command sent");
        Ok(Some(candidate.command))
    }

    pub fn new_game(&mut self, opponent: Opponent) -> Result<(), DispatchError> {
        self.transport.send(&OutboundMessage::NewGame(opponent))?;
        Ok(())
    }

    pub fn join_game(&mut self, game_id: &str) -> Result<(), DispatchError> {
        self.transport
            .send(&OutboundMessage::JoinGame(game_id.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Color;
    use crate::protocol::SelectKind;
    use crate::selection::{RecordUpdate, SelectionState};
    use crate::transport::Outbox;
    use serde_json::json;

    fn red_to_move() -> GameRecord {
        GameRecord::read(&json!({
            "board": {"turn": "red", "red": {"walls": 3}},
            "locations": [[7, 4]],
            "commands": [["move", "up"]],
        }))
        .unwrap()
    }

    fn ctx(record: &GameRecord) -> TurnContext<'_> {
        TurnContext { local_color: Some(Color::Red), record: Some(record) }
    }

    #[test]
    fn test_choose_mode_announces_select() {
        let game = red_to_move();
        let mut selection = SelectionMachine::new();
        let mut dispatcher = CommandDispatcher::new(Outbox::new());

        dispatcher
            .choose_mode(&mut selection, SelectionMode::HorizontalWall, &ctx(&game))
            .unwrap();

        assert_eq!(
            dispatcher.transport_mut().drain(),
            vec![OutboundMessage::Select(SelectKind::Wall)]
        );
    }

    #[test]
    fn test_rejected_mode_sends_nothing() {
        let mut game = red_to_move();
        game.board.turn = Some(Color::Blue);
        let mut selection = SelectionMachine::new();
        let mut dispatcher = CommandDispatcher::new(Outbox::new());

        let err = dispatcher
            .choose_mode(&mut selection, SelectionMode::Piece, &ctx(&game))
            .unwrap_err();

        assert!(matches!(err, DispatchError::Rejected(SelectRejected::NotYourTurn)));
        assert!(dispatcher.transport().is_empty());
        assert!(selection.is_idle());
    }

    #[test]
    fn test_wall_recancel_is_local() {
        let game = red_to_move();
        let mut selection = SelectionMachine::new();
        let mut dispatcher = CommandDispatcher::new(Outbox::new());
        dispatcher
            .choose_mode(&mut selection, SelectionMode::VerticalWall, &ctx(&game))
            .unwrap();
        dispatcher.transport_mut().drain();

        let transition = dispatcher
            .choose_mode(&mut selection, SelectionMode::VerticalWall, &ctx(&game))
            .unwrap();

        assert_eq!(transition, Transition::Cancelled(SelectionMode::VerticalWall));
        assert!(dispatcher.transport().is_empty());
        assert!(selection.is_idle());
    }

    #[test]
    fn test_piece_cancel_tells_server() {
        let game = red_to_move();
        let mut selection = SelectionMachine::new();
        let mut dispatcher = CommandDispatcher::new(Outbox::new());
        dispatcher
            .choose_mode(&mut selection, SelectionMode::Piece, &ctx(&game))
            .unwrap();
        dispatcher.transport_mut().drain();

        assert_eq!(dispatcher.cancel(&mut selection).unwrap(), SelectionMode::Piece);
        assert_eq!(
            dispatcher.transport_mut().drain(),
            vec![OutboundMessage::Select(SelectKind::Piece)]
        );
        assert!(matches!(
            dispatcher.cancel(&mut selection),
            Err(DispatchError::Contract(ContractViolation::NothingToCancel))
        ));
    }

    #[test]
    fn test_destination_sends_command_and_resets() {
        let game = red_to_move();
        let mut selection = SelectionMachine::new();
        let mut dispatcher = CommandDispatcher::new(Outbox::new());
        dispatcher
            .choose_mode(&mut selection, SelectionMode::Piece, &ctx(&game))
            .unwrap();
        selection.reconcile(
            &ctx(&game),
            RecordUpdate { selected: false, locations: true, commands: true },
        );
        dispatcher.transport_mut().drain();

        let sent = dispatcher
            .choose_destination(&mut selection, Some(&game), 0)
            .unwrap();

        assert_eq!(sent, Some(json!(["move", "up"])));
        assert_eq!(
            dispatcher.transport_mut().drain(),
            vec![OutboundMessage::Command(json!(["move", "up"]))]
        );
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_failed_send_keeps_selection() {
        let game = red_to_move();
        let mut selection = SelectionMachine::new();
        let mut dispatcher = CommandDispatcher::new(Outbox::new());
        dispatcher
            .choose_mode(&mut selection, SelectionMode::Piece, &ctx(&game))
            .unwrap();
        selection.reconcile(
            &ctx(&game),
            RecordUpdate { selected: false, locations: true, commands: true },
        );
        dispatcher.transport_mut().close();

        let err = dispatcher
            .choose_destination(&mut selection, Some(&game), 0)
            .unwrap_err();

        assert!(matches!(err, DispatchError::Transport(TransportError::Closed)));
        assert_eq!(
            selection.state(),
            SelectionState::AwaitingDestination(SelectionMode::Piece)
        );
    }

    #[test]
    fn test_lobby_messages() {
        let mut dispatcher = CommandDispatcher::new(Outbox::new());
        dispatcher.new_game(Opponent::Bot).unwrap();
        dispatcher.join_game("g-7").unwrap();
        assert_eq!(
            dispatcher.into_transport().drain(),
            vec![
                OutboundMessage::NewGame(Opponent::Bot),
                OutboundMessage::JoinGame("g-7".to_string())
            ]
        );
    }
}
