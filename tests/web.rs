//! Browser-facing bindings, run with `wasm-pack test --node`.
#![cfg(target_arch = "wasm32")]

use serde_wasm_bindgen::{from_value, to_value};
use tictactoe_core::{
    board_full, check_outcome, compute_ai_move, AppliedMove, Board, GameEngine, GameSession,
    GameStatus, MoveResult, Player,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

fn js_board(board: &Board) -> JsValue {
    to_value(board).expect("board converts to JsValue")
}

#[wasm_bindgen_test]
fn outcome_and_fullness_from_js() {
    let board = Board::new()
        .with_move(0, Player::A)
        .with_move(1, Player::B)
        .with_move(4, Player::A)
        .with_move(3, Player::B)
        .with_move(8, Player::A);

    let outcome: MoveResult =
        from_value(check_outcome(js_board(&board)).expect("outcome")).expect("decode outcome");
    assert_eq!(outcome, MoveResult::won(Player::A, [0, 4, 8]));
    assert_eq!(board_full(js_board(&board)), Ok(false));
}

#[wasm_bindgen_test]
fn ai_move_sentinel_on_full_board() {
    let mut board = Board::new();
    for (index, player) in [
        (0, Player::A),
        (1, Player::B),
        (2, Player::A),
        (4, Player::B),
        (3, Player::A),
        (5, Player::B),
        (7, Player::A),
        (6, Player::B),
        (8, Player::A),
    ] {
        board.place(index, player);
    }
    let cell = compute_ai_move(js_board(&board), Some("hard".into()), None).expect("call succeeds");
    assert_eq!(cell, -1);

    let cell = compute_ai_move(js_board(&Board::new()), Some("medium".into()), None)
        .expect("call succeeds");
    assert_eq!(cell, 4);
}

#[wasm_bindgen_test]
fn engine_plays_a_turn_against_the_ai() {
    let mut engine = GameEngine::new(Some("ai".into()), Some("hard".into()));
    let applied: AppliedMove =
        serde_json::from_str(&engine.play(0).expect("human move")).expect("decode move");
    assert_eq!(applied.status, GameStatus::InProgress);
    assert!(engine.is_ai_turn());

    let ai: AppliedMove =
        serde_json::from_str(&engine.apply_ai_move().expect("ai move")).expect("decode move");
    assert_eq!(ai.player, Player::B);
    assert!(!engine.is_ai_turn());
}

#[wasm_bindgen_test]
async fn reset_cancels_a_pending_ai_move() {
    let mut engine = GameEngine::new(Some("ai".into()), Some("medium".into()));
    engine.play(0).expect("human move");

    let pending = engine.think_ai(Some(10));
    engine.reset();

    let result = JsFuture::from(pending).await.expect("promise resolves");
    assert!(result.is_null());

    let session: GameSession =
        serde_json::from_str(&engine.state_json().expect("state")).expect("decode state");
    assert_eq!(session.board(), &Board::new());
}

#[wasm_bindgen_test]
async fn think_ai_applies_after_the_delay() {
    let mut engine = GameEngine::new(Some("ai".into()), Some("medium".into()));
    engine.play(0).expect("human move");

    let result = JsFuture::from(engine.think_ai(Some(1))).await.expect("promise resolves");
    let json = result.as_string().expect("applied move json");
    let applied: AppliedMove = serde_json::from_str(&json).expect("decode move");
    assert_eq!(applied.cell, 4);
}
