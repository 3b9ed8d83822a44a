use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 棋盘边长与格子数量（固定 3×3）。
pub const BOARD_SIDE: usize = 3;
pub const BOARD_SIZE: usize = BOARD_SIDE * BOARD_SIDE;

/// 三个格子索引组成的一条连线。
pub type WinPattern = [usize; 3];

/// 全部 8 条胜利连线：三行、三列、两条对角线。扫描顺序即判定顺序。
pub const WIN_PATTERNS: [WinPattern; 8] = [
    // rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // diagonals
    [0, 4, 8],
    [2, 4, 6],
];

pub const CENTER: usize = 4;
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Player {
    /// 先手（○）。人机模式下由人类执子。
    A,
    /// 后手（×）。人机模式下由 AI 执子。
    B,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::A => '○',
            Player::B => '×',
        }
    }
}

impl FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "o" | "○" => Ok(Player::A),
            "b" | "x" | "×" => Ok(Player::B),
            _ => Err(()),
        }
    }
}

/// 单个格子的占用状态。
///
/// 与前端保持一致，序列化为 `null`、`"A"` 或 `"B"`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "Option<Player>", into = "Option<Player>")]
pub enum Cell {
    #[default]
    Empty,
    Taken(Player),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Taken(player) => Some(player),
        }
    }
}

impl From<Option<Player>> for Cell {
    fn from(value: Option<Player>) -> Self {
        value.map_or(Cell::Empty, Cell::Taken)
    }
}

impl From<Cell> for Option<Player> {
    fn from(cell: Cell) -> Self {
        cell.owner()
    }
}

/// 3×3 棋盘，按行优先存储（index = row * 3 + col）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// 落子。只允许写入空格，返回是否成功。
    pub fn place(&mut self, index: usize, player: Player) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) if cell.is_empty() => {
                *cell = Cell::Taken(player);
                true
            }
            _ => false,
        }
    }

    /// 返回一个落子后的新棋盘，原棋盘不变。
    pub fn with_move(&self, index: usize, player: Player) -> Self {
        let mut next = *self;
        next.place(index, player);
        next
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIDE {
            for col in 0..BOARD_SIDE {
                let symbol = match self.cells[row * BOARD_SIDE + col] {
                    Cell::Empty => '.',
                    Cell::Taken(player) => player.symbol(),
                };
                write!(f, "{symbol}")?;
            }
            if row + 1 < BOARD_SIDE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// 一次胜负判定的结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MoveResult {
    pub winner: Option<Player>,
    pub winning_line: Option<WinPattern>,
}

impl MoveResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn won(winner: Player, line: WinPattern) -> Self {
        Self {
            winner: Some(winner),
            winning_line: Some(line),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameStatus {
    InProgress,
    Won { winner: Player, line: WinPattern },
    Drawn,
}

impl GameStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::InProgress
    }
}
