use tracing::instrument;

use super::state::{Board, Cell, GameStatus, MoveResult, WIN_PATTERNS};

/// 按固定顺序扫描胜利连线，返回第一条三格相同且非空的连线。
#[instrument(level = "trace")]
pub fn determine_outcome(board: &Board) -> MoveResult {
    let cells = board.cells();
    for line @ [a, b, c] in WIN_PATTERNS {
        if let Cell::Taken(player) = cells[a] {
            if cells[b] == cells[a] && cells[c] == cells[a] {
                return MoveResult::won(player, line);
            }
        }
    }
    MoveResult::none()
}

#[instrument(level = "trace")]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|cell| !cell.is_empty())
}

/// 胜负优先于满盘：同时满足时视为胜局。
pub fn classify(board: &Board) -> GameStatus {
    let outcome = determine_outcome(board);
    match (outcome.winner, outcome.winning_line) {
        (Some(winner), Some(line)) => GameStatus::Won { winner, line },
        _ if is_full(board) => GameStatus::Drawn,
        _ => GameStatus::InProgress,
    }
}
