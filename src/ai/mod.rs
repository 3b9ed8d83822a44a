//! AI 落子算法模块（随机、启发式与完整 Minimax 搜索）。

pub mod minimax;

pub use minimax::{select_move, AiAgent, AiConfig, AiDecision, AiDifficulty, MoveStrategy};
