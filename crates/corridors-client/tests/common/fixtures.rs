use corridors_client::{ClientConfig, ClientSession, ConnectionState, Outbox};
use serde_json::{json, Value};

pub const RED_UUID: &str = "5b1f0c4e-red";
pub const BLUE_UUID: &str = "9d2a7e31-blue";

/// An inbound `set` frame.
pub fn set(path: &str, value: Value) -> String {
    json!(["set", path, value]).to_string()
}

/// An inbound `push` frame.
pub fn push(path: &str, value: Value) -> String {
    json!(["push", path, value]).to_string()
}

/// A game record the way the server serializes it right after both seats
/// are filled.
pub fn fresh_game(turn: &str) -> Value {
    json!({
        "uuid": "0e6c-game",
        "players": {
            "red": {"name": "User 2", "uuid": RED_UUID},
            "blue": {"name": "User 3", "uuid": BLUE_UUID}
        },
        "board": {
            "red": {"color": "red", "location": [8, 4], "walls": 10},
            "blue": {"color": "blue", "location": [0, 4], "walls": 10},
            "walls": vec![vec![0; 8]; 8],
            "turn": turn,
            "settings": {"N": 9, "walls_per_piece": 10}
        },
        "over": false,
        "winner": null,
        "selected": null
    })
}

pub fn open_session() -> ClientSession<Outbox> {
    let mut session = ClientSession::new(ClientConfig::default(), Outbox::new());
    session.on_connection_state(ConnectionState::Open);
    session
}

/// An open session seated as `color`, showing a fresh game.
pub fn seated_session(color: &str, turn: &str) -> ClientSession<Outbox> {
    let mut session = open_session();
    let uuid = if color == "red" { RED_UUID } else { BLUE_UUID };
    for frame in [
        set("user", json!({"name": "me", "uuid": uuid})),
        set("current_color", json!(color)),
        set("current_game", fresh_game(turn)),
    ] {
        session.on_text(&frame).unwrap();
    }
    session
}

/// What the server sends back after a piece selection from the start
/// square of red.
pub fn piece_reply() -> Vec<String> {
    vec![
        set("current_game.selected", json!("piece")),
        set("current_game.locations", json!([[7, 4], [8, 3], [8, 5]])),
        set(
            "current_game.commands",
            json!([["move", "up"], ["move", "left"], ["move", "right"]]),
        ),
    ]
}

pub fn feed(session: &mut ClientSession<Outbox>, frames: &[String]) {
    for frame in frames {
        session.on_text(frame).unwrap();
    }
}
