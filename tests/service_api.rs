#![cfg(not(target_arch = "wasm32"))]

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use tetress::api::{GameStateResponse, NewGameResponse};
use tetress::board::Player;
use tetress::opponent::OpponentKind;
use tetress::service::{GameStore, ServerConfig};

fn store(now: Instant) -> GameStore {
    let config = ServerConfig {
        seed: Some(2024),
        opponent: OpponentKind::Greedy,
        ..ServerConfig::default()
    };
    GameStore::new(&config, now)
}

fn call(
    store: &mut GameStore,
    method: &str,
    path: &str,
    body: Value,
    now: Instant,
) -> (u16, Value) {
    let reply = store
        .handle(method, path, &body.to_string(), now)
        .expect("api route");
    (reply.status, serde_json::from_str(&reply.body).unwrap())
}

fn new_game(store: &mut GameStore, now: Instant) -> String {
    let (status, body) = call(store, "POST", "/api/new-game", Value::Null, now);
    assert_eq!(status, 200);
    let resp: NewGameResponse = serde_json::from_value(body).unwrap();
    assert_eq!(resp.board.len(), 121);
    assert_eq!(resp.current_player, Player::Red);
    resp.game_id
}

#[test]
fn a_full_exchange() {
    let now = Instant::now();
    let mut s = store(now);
    let id = new_game(&mut s, now);

    let (status, body) = call(
        &mut s,
        "POST",
        "/api/player-move",
        json!({"game_id": id, "shape": "O", "anchor_row": 0, "anchor_col": 0, "rotation": 0}),
        now,
    );
    assert_eq!(status, 200);
    let after_red: GameStateResponse = serde_json::from_value(body).unwrap();
    assert!(after_red.valid);
    assert_eq!(after_red.current_player, Player::Blue);
    assert_eq!((after_red.red_count, after_red.turn_count), (4, 2));
    assert_eq!(after_red.board["1,1"], Some(Player::Red));

    let (status, body) = call(&mut s, "POST", "/api/ai-move", json!({"game_id": id}), now);
    assert_eq!(status, 200);
    let after_blue: GameStateResponse = serde_json::from_value(body).unwrap();
    assert!(after_blue.valid);
    assert_eq!(after_blue.current_player, Player::Red);
    assert_eq!(after_blue.blue_count, 4);
    // Opening book: horizontal bar on row 2.
    assert_eq!(after_blue.board["2,3"], Some(Player::Blue));

    let (status, body) = call(&mut s, "GET", &format!("/api/game/{id}"), Value::Null, now);
    assert_eq!(status, 200);
    assert_eq!(body["turn_count"], 3);
}

#[test]
fn invalid_moves_come_back_unapplied() {
    let now = Instant::now();
    let mut s = store(now);
    let id = new_game(&mut s, now);
    let mv = |r: i32, c: i32| json!({"game_id": id, "piece": "O", "r": r, "c": c});

    call(&mut s, "POST", "/api/player-move", mv(0, 0), now);
    // Blue's turn now.
    let (status, body) = call(&mut s, "POST", "/api/player-move", mv(5, 5), now);
    assert_eq!(status, 200);
    assert_eq!(body["valid"], false);
    assert_eq!(body["red_count"], 4);

    call(&mut s, "POST", "/api/ai-move", json!({"game_id": id}), now);
    let (_, body) = call(&mut s, "POST", "/api/player-move", mv(1, 1), now);
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Invalid move: cell 1,1 is already occupied");

    let (_, body) = call(&mut s, "POST", "/api/player-move", mv(7, 7), now);
    assert_eq!(body["valid"], false);
    assert_eq!(body["turn_count"], 3);
}

#[test]
fn ai_move_out_of_turn_is_refused() {
    let now = Instant::now();
    let mut s = store(now);
    let id = new_game(&mut s, now);
    let (status, body) = call(&mut s, "POST", "/api/ai-move", json!({"game_id": id}), now);
    assert_eq!(status, 200);
    assert_eq!(body["valid"], false);
    assert_eq!(body["blue_count"], 0);
}

#[test]
fn unknown_games_and_bad_bodies() {
    let now = Instant::now();
    let mut s = store(now);
    let (status, body) = call(&mut s, "GET", "/api/game/nope", Value::Null, now);
    assert_eq!((status, body), (404, json!({"detail": "Game not found"})));

    let (status, _) = call(&mut s, "POST", "/api/ai-move", json!({"game_id": "nope"}), now);
    assert_eq!(status, 404);

    let (status, body) = call(&mut s, "POST", "/api/player-move", json!({"game_id": "x"}), now);
    assert_eq!(status, 422);
    assert!(body["detail"].as_str().unwrap().contains("shape"));

    let (status, _) = call(
        &mut s,
        "POST",
        "/api/player-move",
        json!({"game_id": "x", "shape": "Q", "anchor_row": 0, "anchor_col": 0}),
        now,
    );
    assert_eq!(status, 422);

    assert!(s.handle("GET", "/astar_replays/Easy A.json", "", now).is_none());
}

#[test]
fn delete_health_and_idle_cleanup() {
    let t0 = Instant::now();
    let mut s = store(t0);
    let a = new_game(&mut s, t0);
    let b = new_game(&mut s, t0);
    let (_, body) = call(&mut s, "GET", "/api/health", Value::Null, t0);
    assert_eq!(body, json!({"status": "healthy", "active_games": 2}));

    let (status, body) = call(&mut s, "DELETE", &format!("/api/game/{a}"), Value::Null, t0);
    assert_eq!(status, 200);
    assert_eq!(body, json!({"message": "Game deleted"}));
    assert_eq!(s.active_games(), 1);

    // Two hours later the next request sweeps the idle game away.
    let later = t0 + Duration::from_secs(7200);
    let (status, _) = call(&mut s, "GET", &format!("/api/game/{b}"), Value::Null, later);
    assert_eq!(status, 404);
    assert_eq!(s.active_games(), 0);
}
