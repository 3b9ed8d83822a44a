//! 游戏核心逻辑模块（棋盘、胜负判定、对局状态机）。

pub mod rules;
pub mod session;
pub mod state;

pub use rules::{classify, determine_outcome, is_full};
pub use session::{AiTicket, AppliedMove, GameMode, GameSession, MoveError, AI_PLAYER};
pub use state::{
    Board,
    Cell,
    GameStatus,
    MoveResult,
    Player,
    WinPattern,
    BOARD_SIDE,
    BOARD_SIZE,
    CENTER,
    CORNERS,
    WIN_PATTERNS,
};
