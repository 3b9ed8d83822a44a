use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::rules::{classify, determine_outcome};
use super::state::{Board, GameStatus, MoveResult, Player, BOARD_SIZE};
use crate::ai::{AiAgent, AiConfig, AiDecision, AiDifficulty};

/// 人机模式下 AI 执后手。
pub const AI_PLAYER: Player = Player::B;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Pvp,
    Ai,
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pvp" | "human" | "local" => Ok(GameMode::Pvp),
            "ai" | "cpu" | "computer" => Ok(GameMode::Ai),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MoveError {
    GameFinished,
    OutOfBounds { index: usize },
    CellOccupied { index: usize },
    AwaitingAi,
    NotAiTurn,
    NoMoveAvailable,
}

/// AI 回合的凭据，记录发放时的局面代数。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiTicket {
    generation: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedMove {
    pub cell: usize,
    pub player: Player,
    pub result: MoveResult,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<AiDecision>,
}

/// 一局游戏的完整状态。
///
/// 局面的任何变化（落子、重开、修改设置）都会推进 `generation`，
/// 之前发放的 [`AiTicket`] 随之失效，延迟到达的 AI 落子会被丢弃。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSession {
    board: Board,
    current_player: Player,
    status: GameStatus,
    last_result: MoveResult,
    mode: GameMode,
    difficulty: AiDifficulty,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    history: Vec<usize>,
    #[serde(default)]
    generation: u64,
}

impl GameSession {
    pub fn new(mode: GameMode, difficulty: AiDifficulty) -> Self {
        Self {
            board: Board::new(),
            current_player: Player::A,
            status: GameStatus::InProgress,
            last_result: MoveResult::none(),
            mode,
            difficulty,
            history: Vec::new(),
            generation: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn last_result(&self) -> MoveResult {
        self.last_result
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn difficulty(&self) -> AiDifficulty {
        self.difficulty
    }

    pub fn history(&self) -> &[usize] {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ai_config(&self) -> AiConfig {
        AiConfig::from_difficulty(self.difficulty)
    }

    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current_player = Player::A;
        self.status = GameStatus::InProgress;
        self.last_result = MoveResult::none();
        self.history.clear();
        self.generation += 1;
        info!(generation = self.generation, "game reset");
    }

    /// 切换模式会重开棋局。
    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
        self.reset();
    }

    /// 切换难度会重开棋局。
    pub fn set_difficulty(&mut self, difficulty: AiDifficulty) {
        self.difficulty = difficulty;
        self.reset();
    }

    pub fn is_ai_turn(&self) -> bool {
        self.mode == GameMode::Ai && self.current_player == AI_PLAYER && !self.status.is_finished()
    }

    /// 人类玩家落子。
    pub fn play(&mut self, index: usize) -> Result<AppliedMove, MoveError> {
        if self.is_ai_turn() {
            return Err(MoveError::AwaitingAi);
        }
        self.apply_move(index)
    }

    pub fn begin_ai_turn(&self) -> Option<AiTicket> {
        self.is_ai_turn().then_some(AiTicket {
            generation: self.generation,
        })
    }

    /// 兑现 AI 回合。凭据过期时返回 `Ok(None)`，棋盘保持不变。
    pub fn complete_ai_turn(
        &mut self,
        ticket: AiTicket,
        agent: &mut AiAgent,
    ) -> Result<Option<AppliedMove>, MoveError> {
        if ticket.generation != self.generation {
            warn!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale ai move"
            );
            return Ok(None);
        }
        if !self.is_ai_turn() {
            return Err(MoveError::NotAiTurn);
        }

        let decision = agent.decide(&self.board, AI_PLAYER);
        let cell = decision.cell.ok_or(MoveError::NoMoveAvailable)?;
        let mut applied = self.apply_move(cell)?;
        applied.decision = Some(decision);
        Ok(Some(applied))
    }

    fn apply_move(&mut self, index: usize) -> Result<AppliedMove, MoveError> {
        if self.status.is_finished() {
            return Err(MoveError::GameFinished);
        }
        if index >= BOARD_SIZE {
            return Err(MoveError::OutOfBounds { index });
        }

        let player = self.current_player;
        if !self.board.place(index, player) {
            return Err(MoveError::CellOccupied { index });
        }
        self.history.push(index);
        self.generation += 1;

        self.last_result = determine_outcome(&self.board);
        self.status = classify(&self.board);
        if !self.status.is_finished() {
            self.current_player = player.opponent();
        }
        debug!(cell = index, ?player, status = ?self.status, "move applied");

        Ok(AppliedMove {
            cell: index,
            player,
            result: self.last_result,
            status: self.status,
            decision: None,
        })
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(GameMode::default(), AiDifficulty::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(difficulty: AiDifficulty) -> AiAgent {
        AiAgent::with_seed(AiConfig::from_difficulty(difficulty), 17)
    }

    #[test]
    fn scripted_game_ends_with_diagonal_win() {
        let mut session = GameSession::new(GameMode::Pvp, AiDifficulty::Medium);
        for index in [0, 1, 4, 3] {
            let applied = session.play(index).expect("legal move");
            assert_eq!(applied.status, GameStatus::InProgress);
        }

        let applied = session.play(8).expect("winning move");
        assert_eq!(applied.player, Player::A);
        assert_eq!(applied.result.winner, Some(Player::A));
        assert_eq!(applied.result.winning_line, Some([0, 4, 8]));
        assert_eq!(
            session.status(),
            GameStatus::Won {
                winner: Player::A,
                line: [0, 4, 8]
            }
        );
        assert_eq!(session.history(), &[0, 1, 4, 3, 8]);
        assert_eq!(session.play(2), Err(MoveError::GameFinished));
    }

    #[test]
    fn rejects_illegal_moves_without_changing_turn() {
        let mut session = GameSession::default();
        session.play(4).expect("legal move");
        let generation = session.generation();

        assert_eq!(session.play(4), Err(MoveError::CellOccupied { index: 4 }));
        assert_eq!(session.play(9), Err(MoveError::OutOfBounds { index: 9 }));
        assert_eq!(session.current_player(), Player::B);
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn full_board_without_winner_is_drawn() {
        let mut session = GameSession::default();
        for index in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
            session.play(index).expect("legal move");
        }
        assert_eq!(session.status(), GameStatus::Drawn);
        assert_eq!(session.last_result(), MoveResult::none());
    }

    #[test]
    fn settings_changes_reset_the_board() {
        let mut session = GameSession::default();
        session.play(0).expect("legal move");

        session.set_difficulty(AiDifficulty::Hard);
        assert_eq!(session.board(), &Board::new());
        assert_eq!(session.current_player(), Player::A);

        session.play(0).expect("legal move");
        session.set_mode(GameMode::Ai);
        assert_eq!(session.mode(), GameMode::Ai);
        assert!(session.history().is_empty());
        assert_eq!(session.status(), GameStatus::InProgress);
    }

    #[test]
    fn human_cannot_move_for_the_ai() {
        let mut session = GameSession::new(GameMode::Ai, AiDifficulty::Medium);
        assert!(session.begin_ai_turn().is_none());

        session.play(0).expect("human move");
        assert!(session.is_ai_turn());
        assert_eq!(session.play(1), Err(MoveError::AwaitingAi));
    }

    #[test]
    fn ai_turn_applies_the_selected_move() {
        let mut session = GameSession::new(GameMode::Ai, AiDifficulty::Medium);
        session.play(0).expect("human move");

        let ticket = session.begin_ai_turn().expect("ai to move");
        let applied = session
            .complete_ai_turn(ticket, &mut agent(AiDifficulty::Medium))
            .expect("ai move should apply")
            .expect("ticket is fresh");

        assert_eq!(applied.cell, 4);
        assert_eq!(applied.player, AI_PLAYER);
        assert!(applied.decision.is_some());
        assert_eq!(session.current_player(), Player::A);
        assert!(!session.is_ai_turn());
    }

    #[test]
    fn stale_ticket_is_discarded_after_reset() {
        let mut session = GameSession::new(GameMode::Ai, AiDifficulty::Hard);
        session.play(4).expect("human move");
        let ticket = session.begin_ai_turn().expect("ai to move");

        session.reset();
        session.play(0).expect("human move after reset");

        let outcome = session
            .complete_ai_turn(ticket, &mut agent(AiDifficulty::Hard))
            .expect("stale ticket is not an error");
        assert!(outcome.is_none());
        assert_eq!(session.history(), &[0]);
        assert!(session.is_ai_turn());
    }

    #[test]
    fn hard_ai_never_loses_a_session() {
        let mut session = GameSession::new(GameMode::Ai, AiDifficulty::Hard);
        let mut hard = agent(AiDifficulty::Hard);
        // 人类一方总是走最小的空格。
        while !session.status().is_finished() {
            if let Some(ticket) = session.begin_ai_turn() {
                session
                    .complete_ai_turn(ticket, &mut hard)
                    .expect("ai move")
                    .expect("fresh ticket");
            } else {
                let index = session.board().empty_cells()[0];
                session.play(index).expect("human move");
            }
        }
        assert!(!matches!(
            session.status(),
            GameStatus::Won {
                winner: Player::A,
                ..
            }
        ));
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut session = GameSession::new(GameMode::Ai, AiDifficulty::Easy);
        session.play(2).expect("human move");
        let json = serde_json::to_string(&session).expect("serialize");
        assert!(json.contains(r#""mode":"ai""#));
        let restored: GameSession = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, session);
    }

    #[test]
    fn mode_parses_common_names() {
        assert_eq!("AI".parse::<GameMode>(), Ok(GameMode::Ai));
        assert_eq!("pvp".parse::<GameMode>(), Ok(GameMode::Pvp));
        assert!("online".parse::<GameMode>().is_err());
    }
}
