pub mod ai;
pub mod game;
pub mod utils;

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{select_move, AiAgent, AiConfig, AiDecision, AiDifficulty, MoveStrategy};
pub use game::{
    classify, determine_outcome, is_full, AiTicket, AppliedMove, Board, Cell, GameMode,
    GameSession, GameStatus, MoveError, MoveResult, Player, WinPattern, AI_PLAYER, WIN_PATTERNS,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::console_log("tic-tac-toe core ready");
}

fn to_js_error(error: MoveError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn applied_json(applied: &AppliedMove) -> Result<String, JsValue> {
    serde_json::to_string(applied).map_err(serde_to_js_error)
}

fn parse_difficulty(value: Option<&str>) -> AiDifficulty {
    value
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or_default()
}

fn parse_mode(value: Option<&str>) -> GameMode {
    value
        .and_then(|value| GameMode::from_str(value).ok())
        .unwrap_or_default()
}

/// 浏览器端持有的一局游戏。
///
/// 会话通过 `Rc<RefCell<_>>` 与 `think_ai` 返回的 Promise 共享；
/// 等待期间若局面发生变化，该 Promise 以 `null` 结束且不落子。
#[wasm_bindgen]
pub struct GameEngine {
    session: Rc<RefCell<GameSession>>,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(mode: Option<String>, difficulty: Option<String>) -> GameEngine {
        let session = GameSession::new(
            parse_mode(mode.as_deref()),
            parse_difficulty(difficulty.as_deref()),
        );
        GameEngine {
            session: Rc::new(RefCell::new(session)),
        }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&*self.session.borrow()).map_err(serde_to_js_error)
    }

    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        let applied = self.session.borrow_mut().play(index).map_err(to_js_error)?;
        applied_json(&applied)
    }

    pub fn reset(&mut self) {
        self.session.borrow_mut().reset();
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = GameMode::from_str(mode)
            .map_err(|_| JsValue::from_str(&format!("unknown game mode: {mode}")))?;
        self.session.borrow_mut().set_mode(mode);
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<(), JsValue> {
        let difficulty = AiDifficulty::from_str(difficulty)
            .map_err(|_| JsValue::from_str(&format!("unknown difficulty: {difficulty}")))?;
        self.session.borrow_mut().set_difficulty(difficulty);
        Ok(())
    }

    pub fn is_ai_turn(&self) -> bool {
        self.session.borrow().is_ai_turn()
    }

    /// 立即执行 AI 回合，不做停顿。
    pub fn apply_ai_move(&mut self) -> Result<String, JsValue> {
        let mut session = self.session.borrow_mut();
        let ticket = session
            .begin_ai_turn()
            .ok_or_else(|| to_js_error(MoveError::NotAiTurn))?;
        let mut agent = AiAgent::new(session.ai_config());
        match session
            .complete_ai_turn(ticket, &mut agent)
            .map_err(to_js_error)?
        {
            Some(applied) => applied_json(&applied),
            None => Err(to_js_error(MoveError::NotAiTurn)),
        }
    }

    /// 停顿 `delay_ms`（默认取难度配置）后执行 AI 回合。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        let session = Rc::clone(&self.session);
        let (ticket, config) = {
            let current = session.borrow();
            (current.begin_ai_turn(), current.ai_config())
        };
        let delay = delay_ms
            .unwrap_or_else(|| u32::try_from(config.think_delay.as_millis()).unwrap_or(u32::MAX));

        future_to_promise(async move {
            let Some(ticket) = ticket else {
                return Ok(JsValue::NULL);
            };
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(config);
            let applied = session
                .borrow_mut()
                .complete_ai_turn(ticket, &mut agent)
                .map_err(to_js_error)?;
            match applied {
                Some(applied) => Ok(JsValue::from_str(&applied_json(&applied)?)),
                None => Ok(JsValue::NULL),
            }
        })
    }
}

/// 判定胜负，返回 `{ winner, winning_line }`。
#[wasm_bindgen(js_name = "determineOutcome")]
pub fn check_outcome(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&determine_outcome(&board)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "isFull")]
pub fn board_full(board: JsValue) -> Result<bool, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    Ok(is_full(&board))
}

#[wasm_bindgen(js_name = "classifyBoard")]
pub fn classify_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&classify(&board)).map_err(JsValue::from)
}

/// 为 `player`（默认 B）选择下一步；无子可走时返回 -1。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    board: JsValue,
    difficulty: Option<String>,
    player: Option<String>,
) -> Result<i32, JsValue> {
    let decision = decide(board, difficulty, player)?;
    Ok(decision
        .cell
        .and_then(|cell| i32::try_from(cell).ok())
        .unwrap_or(-1))
}

#[wasm_bindgen(js_name = "explainAiMove")]
pub fn explain_ai_move(
    board: JsValue,
    difficulty: Option<String>,
    player: Option<String>,
) -> Result<JsValue, JsValue> {
    let decision = decide(board, difficulty, player)?;
    to_value(&decision).map_err(JsValue::from)
}

fn decide(
    board: JsValue,
    difficulty: Option<String>,
    player: Option<String>,
) -> Result<AiDecision, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let player = player
        .as_deref()
        .and_then(|value| Player::from_str(value).ok())
        .unwrap_or(AI_PLAYER);
    let mut agent = AiAgent::new(AiConfig::from_difficulty(parse_difficulty(
        difficulty.as_deref(),
    )));
    Ok(agent.decide(&board, player))
}
