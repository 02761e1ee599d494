mod common;

use common::fixtures::{feed, fresh_game, open_session, piece_reply, push, seated_session, set};
use corridors_client::selection::Reconciled;
use corridors_client::{
    Cell, Color, ConnectionState, ContractViolation, DispatchError, OutboundMessage, SelectKind,
    SelectRejected, SelectionMode, SelectionState, SessionError,
};
use proptest::prelude::*;
use serde_json::{json, Value};

#[test]
fn piece_move_round_trip() {
    let mut session = seated_session("red", "red");
    assert_eq!(session.local_color(), Some(Color::Red));
    assert!(session.your_turn());

    session.choose_mode(SelectionMode::Piece).unwrap();
    assert_eq!(
        session.selection(),
        SelectionState::AwaitingDestination(SelectionMode::Piece)
    );
    assert_eq!(
        session.transport_mut().drain(),
        vec![OutboundMessage::Select(SelectKind::Piece)]
    );

    feed(&mut session, &piece_reply());
    let highlighted = session.highlighted();
    assert_eq!(highlighted.len(), 3);
    assert_eq!(highlighted[0].location, Cell { row: 7, col: 4 });

    let sent = session.choose_destination(0).unwrap();
    assert_eq!(sent, Some(json!(["move", "up"])));
    assert_eq!(session.selection(), SelectionState::Idle);

    let wire: Vec<Value> = session
        .transport_mut()
        .drain()
        .iter()
        .map(OutboundMessage::to_json)
        .collect();
    assert_eq!(wire, vec![json!(["game.command", ["move", "up"]])]);
}

#[test]
fn destination_index_selects_matching_command() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::Piece).unwrap();
    feed(&mut session, &piece_reply());
    session.transport_mut().drain();

    assert_eq!(session.choose_destination(2).unwrap(), Some(json!(["move", "right"])));
    assert_eq!(
        session.transport_mut().drain(),
        vec![OutboundMessage::Command(json!(["move", "right"]))]
    );
}

#[test]
fn not_your_turn_changes_nothing() {
    let mut session = seated_session("red", "blue");
    let before = session.tree().revision();

    let err = session.choose_mode(SelectionMode::Piece).unwrap_err();

    assert!(matches!(
        err,
        SessionError::Dispatch(DispatchError::Rejected(SelectRejected::NotYourTurn))
    ));
    assert_eq!(session.selection(), SelectionState::Idle);
    assert!(session.transport().is_empty());
    assert_eq!(session.tree().revision(), before);
}

#[test]
fn spectator_cannot_select() {
    let mut session = open_session();
    feed(
        &mut session,
        &[
            set("user", json!({"name": "watcher", "uuid": "someone-else"})),
            set("current_game", fresh_game("red")),
        ],
    );

    assert!(matches!(
        session.choose_mode(SelectionMode::Piece),
        Err(SessionError::Dispatch(DispatchError::Rejected(SelectRejected::NoSeat)))
    ));
    assert!(session.transport().is_empty());
}

#[test]
fn turn_change_resets_selection() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::Piece).unwrap();
    feed(&mut session, &piece_reply());

    let outcome = session
        .on_text(&set("current_game.board.turn", json!("blue")))
        .unwrap();

    assert_eq!(outcome.reconciled, Some(Reconciled::Reset(SelectionMode::Piece)));
    assert_eq!(session.selection(), SelectionState::Idle);
    assert!(session.highlighted().is_empty());
    assert_eq!(session.choose_destination(0).unwrap(), None);
}

#[test]
fn game_over_resets_selection() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::HorizontalWall).unwrap();

    session.on_text(&set("current_game.over", json!(true))).unwrap();

    assert_eq!(session.selection(), SelectionState::Idle);
    assert!(matches!(
        session.choose_mode(SelectionMode::Piece),
        Err(SessionError::Dispatch(DispatchError::Rejected(SelectRejected::GameOver)))
    ));
}

#[test]
fn scenario_c() {
    let mut game = fresh_game("red");
    game["locations"] = json!([[7, 4], [8, 3]]);
    game["commands"] = json!([["move", "up"], ["move", "left"]]);
    let mut session = seated_session("red", "red");
    session.on_text(&set("current_game", game)).unwrap();

    session.choose_mode(SelectionMode::Piece).unwrap();
    assert_eq!(
        session.selection(),
        SelectionState::AwaitingDestination(SelectionMode::Piece)
    );
    session.transport_mut().drain();

    assert_eq!(session.choose_destination(0).unwrap(), Some(json!(["move", "up"])));
    assert_eq!(
        session.transport_mut().drain(),
        vec![OutboundMessage::Command(json!(["move", "up"]))]
    );
    assert_eq!(session.selection(), SelectionState::Idle);
}

#[test]
fn wall_destinations_are_not_offered_for_a_piece_move() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::HorizontalWall).unwrap();
    feed(
        &mut session,
        &[
            set("current_game.selected", json!("hwall")),
            set("current_game.locations", json!([[3, 3]])),
            set("current_game.commands", json!([["wall", [3, 3], "h"]])),
        ],
    );
    session.choose_mode(SelectionMode::Piece).unwrap();
    session.transport_mut().drain();

    assert!(session.highlighted().is_empty());
    assert!(matches!(
        session.choose_destination(0),
        Err(SessionError::Dispatch(DispatchError::Contract(
            ContractViolation::CandidatesPending { mode: SelectionMode::Piece }
        )))
    ));
    assert!(session.transport().is_empty());

    feed(&mut session, &piece_reply());
    assert_eq!(session.highlighted().len(), 3);
}

#[test]
fn wall_cancelled_before_reply_stays_cancelled() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::HorizontalWall).unwrap();
    session.choose_mode(SelectionMode::HorizontalWall).unwrap();
    assert_eq!(
        session.transport_mut().drain(),
        vec![OutboundMessage::Select(SelectKind::Wall)]
    );

    feed(
        &mut session,
        &[
            set("current_game.selected", json!("hwall")),
            set("current_game.locations", json!([[3, 3]])),
            set("current_game.commands", json!([["wall", [3, 3], "h"]])),
        ],
    );

    assert_eq!(session.selection(), SelectionState::Idle);
    assert!(session.highlighted().is_empty());
}

#[test]
fn server_selection_alone_does_not_select() {
    let mut session = seated_session("red", "red");

    let outcome = session
        .on_text(&set("current_game.selected", json!("piece")))
        .unwrap();

    assert_eq!(outcome.reconciled, None);
    assert_eq!(session.selection(), SelectionState::Idle);
}

#[test]
fn half_written_lists_are_not_offered() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::Piece).unwrap();
    let reply = piece_reply();
    feed(&mut session, &reply[..2]);

    assert!(session.highlighted().is_empty());

    feed(&mut session, &reply[2..]);
    assert_eq!(session.highlighted().len(), 3);
}

#[test]
fn wall_orientation_follows_server() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::HorizontalWall).unwrap();
    feed(&mut session, &[set("current_game.selected", json!("hwall"))]);

    session.choose_mode(SelectionMode::VerticalWall).unwrap();
    assert_eq!(
        session.transport_mut().drain(),
        vec![
            OutboundMessage::Select(SelectKind::Wall),
            OutboundMessage::Select(SelectKind::Wall)
        ]
    );
    feed(&mut session, &[set("current_game.selected", json!("vwall"))]);

    assert_eq!(
        session.selection(),
        SelectionState::AwaitingDestination(SelectionMode::VerticalWall)
    );
}

#[test]
fn unknown_frame_kind_is_ignored() {
    let mut session = seated_session("red", "red");
    let before = session.tree().root().clone();
    let revision = session.tree().revision();

    assert!(session.on_text(r#"["splice", "games", 0]"#).is_err());
    assert!(session.on_text("not json").is_err());

    assert_eq!(session.tree().root(), &before);
    assert_eq!(session.tree().revision(), revision);
}

#[test]
fn notifications_append_in_order() {
    let mut session = open_session();
    feed(
        &mut session,
        &[
            push("notifications", json!({"text": "Game created", "level": "info"})),
            push("notifications", json!({"text": "Not your turn", "level": "danger"})),
        ],
    );

    let texts: Vec<String> = session
        .notifications()
        .into_iter()
        .map(|n| n.text)
        .collect();
    assert_eq!(texts, vec!["Game created", "Not your turn"]);
}

#[test]
fn reconnect_starts_clean_epoch() {
    let mut session = seated_session("red", "red");
    session.choose_mode(SelectionMode::Piece).unwrap();
    assert_eq!(session.epoch(), 1);

    session.on_connection_state(ConnectionState::Closed);
    assert!(matches!(
        session.choose_destination(0),
        Err(SessionError::NotConnected(ConnectionState::Closed))
    ));

    session.on_connection_state(ConnectionState::Connecting);
    session.on_connection_state(ConnectionState::Open);

    assert_eq!(session.epoch(), 2);
    assert!(session.tree().is_empty());
    assert_eq!(session.selection(), SelectionState::Idle);
    assert!(session.current_game().is_none());
}

proptest! {
    #[test]
    fn chosen_index_emits_that_command(len in 1usize..12, pick in 0usize..12) {
        let index = pick % len;
        let locations: Vec<Value> = (0..len).map(|i| json!([i % 9, (i * 5) % 9])).collect();
        let commands: Vec<Value> = (0..len).map(|i| json!(["move", format!("step-{i}")])).collect();

        let mut session = seated_session("blue", "blue");
        session.choose_mode(SelectionMode::Piece).unwrap();
        feed(&mut session, &[
            set("current_game.locations", Value::Array(locations)),
            set("current_game.commands", Value::Array(commands.clone())),
        ]);
        session.transport_mut().drain();

        let sent = session.choose_destination(index).unwrap();

        prop_assert_eq!(sent.as_ref(), Some(&commands[index]));
        prop_assert_eq!(
            session.transport_mut().drain(),
            vec![OutboundMessage::Command(commands[index].clone())]
        );
        prop_assert_eq!(session.selection(), SelectionState::Idle);
    }
}
