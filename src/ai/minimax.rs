use std::str::FromStr;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::game::{determine_outcome, is_full, Board, Player, CENTER, CORNERS, WIN_PATTERNS};

/// 胜局基础分；越早获胜得分越高，越晚失败扣分越少。
const WIN_SCORE: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            _ => Err(()),
        }
    }
}

/// 产生这一步棋的规则。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoveStrategy {
    Random,
    Win,
    Block,
    Center,
    Corner,
    Fallback,
    Minimax,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub difficulty: AiDifficulty,
    /// 每次决策前掷一次硬币，命中则直接随机落子。
    pub random_move_chance: f64,
    /// 前端在 AI 落子前的停顿，仅影响节奏。
    pub think_delay: Duration,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        let random_move_chance = match difficulty {
            AiDifficulty::Easy => 0.6,
            AiDifficulty::Medium | AiDifficulty::Hard => 0.0,
        };
        Self {
            difficulty,
            random_move_chance,
            think_delay: Duration::from_millis(500),
        }
    }

    pub fn with_random_move_chance(mut self, chance: f64) -> Self {
        self.random_move_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn with_think_delay(mut self, delay: Duration) -> Self {
        self.think_delay = delay;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Medium)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MoveStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<i32>,
    pub nodes: u64,
    pub difficulty: AiDifficulty,
}

#[derive(Debug, Default)]
struct SearchStats {
    nodes: u64,
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 为 `me` 选择下一步。棋盘已满或已分出胜负时不落子。
    pub fn decide(&mut self, board: &Board, me: Player) -> AiDecision {
        let mut stats = SearchStats::default();
        let choice = choose_move(board, me, &self.config, &mut self.rng, &mut stats);
        let decision = AiDecision {
            cell: choice.map(|choice| choice.cell),
            strategy: choice.map(|choice| choice.strategy),
            evaluation: choice.and_then(|choice| choice.evaluation),
            nodes: stats.nodes,
            difficulty: self.config.difficulty,
        };
        debug!(?decision, player = ?me, "ai decision");
        decision
    }
}

/// 按难度为 `me` 选择一个空格；没有可走的格子时返回 `None`。
pub fn select_move<R: Rng + ?Sized>(
    board: &Board,
    me: Player,
    difficulty: AiDifficulty,
    rng: &mut R,
) -> Option<usize> {
    let config = AiConfig::from_difficulty(difficulty);
    let mut stats = SearchStats::default();
    choose_move(board, me, &config, rng, &mut stats).map(|choice| choice.cell)
}

#[derive(Debug, Clone, Copy)]
struct Choice {
    cell: usize,
    strategy: MoveStrategy,
    evaluation: Option<i32>,
}

impl Choice {
    fn by(strategy: MoveStrategy, cell: usize) -> Self {
        Self {
            cell,
            strategy,
            evaluation: None,
        }
    }
}

fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    me: Player,
    config: &AiConfig,
    rng: &mut R,
    stats: &mut SearchStats,
) -> Option<Choice> {
    if is_full(board) || determine_outcome(board).winner.is_some() {
        warn!(%board, "move requested for a finished board");
        return None;
    }

    if config.random_move_chance > 0.0 && rng.gen_bool(config.random_move_chance.min(1.0)) {
        return random_move(board, rng).map(|cell| Choice::by(MoveStrategy::Random, cell));
    }

    match config.difficulty {
        AiDifficulty::Easy | AiDifficulty::Medium => heuristic_move(board, me, rng),
        AiDifficulty::Hard => best_move(board, me, stats).map(|(cell, score)| Choice {
            cell,
            strategy: MoveStrategy::Minimax,
            evaluation: Some(score),
        }),
    }
}

fn random_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<usize> {
    board.empty_cells().choose(rng).copied()
}

fn heuristic_move<R: Rng + ?Sized>(board: &Board, me: Player, rng: &mut R) -> Option<Choice> {
    if let Some(cell) = find_winning_move(board, me) {
        return Some(Choice::by(MoveStrategy::Win, cell));
    }
    if let Some(cell) = find_winning_move(board, me.opponent()) {
        return Some(Choice::by(MoveStrategy::Block, cell));
    }
    if board.is_empty_at(CENTER) {
        return Some(Choice::by(MoveStrategy::Center, CENTER));
    }

    let corners: Vec<usize> = CORNERS
        .into_iter()
        .filter(|&corner| board.is_empty_at(corner))
        .collect();
    if let Some(&corner) = corners.choose(rng) {
        return Some(Choice::by(MoveStrategy::Corner, corner));
    }

    random_move(board, rng).map(|cell| Choice::by(MoveStrategy::Fallback, cell))
}

/// 找到 `player` 只差一子即可连成的线，返回那个空格。
fn find_winning_move(board: &Board, player: Player) -> Option<usize> {
    let owned = |index: usize| board.get(index).and_then(|cell| cell.owner()) == Some(player);
    let open = |index: usize| board.is_empty_at(index);

    WIN_PATTERNS.iter().find_map(|&[a, b, c]| {
        if owned(a) && owned(b) && open(c) {
            Some(c)
        } else if owned(a) && open(b) && owned(c) {
            Some(b)
        } else if open(a) && owned(b) && owned(c) {
            Some(a)
        } else {
            None
        }
    })
}

/// 根节点：保留第一个严格优于当前最佳分的着法，同分取索引较小者。
fn best_move(board: &Board, me: Player, stats: &mut SearchStats) -> Option<(usize, i32)> {
    let mut best: Option<(usize, i32)> = None;
    for cell in board.empty_cells() {
        let child = board.with_move(cell, me);
        let score = minimax(&child, 0, false, me, stats);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((cell, score));
        }
    }
    best
}

fn minimax(board: &Board, depth: i32, maximizing: bool, me: Player, stats: &mut SearchStats) -> i32 {
    stats.nodes += 1;

    match determine_outcome(board).winner {
        Some(winner) if winner == me => return WIN_SCORE - depth,
        Some(_) => return depth - WIN_SCORE,
        None => {}
    }
    if is_full(board) {
        return 0;
    }

    let actor = if maximizing { me } else { me.opponent() };
    let scores = board
        .empty_cells()
        .into_iter()
        .map(|cell| minimax(&board.with_move(cell, actor), depth + 1, !maximizing, me, stats));

    if maximizing {
        scores.max().unwrap_or(0)
    } else {
        scores.min().unwrap_or(0)
    }
}
