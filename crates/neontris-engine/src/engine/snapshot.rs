use serde::Serialize;

use crate::core::{
    board::Board,
    piece::{Piece, PieceKind},
    position::CellPos,
};

use super::session::SessionState;

/// One occupied cell of the settled grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    pub pos: CellPos,
    pub kind: PieceKind,
    pub flash: f32,
}

/// The falling piece as a renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivePieceSnapshot {
    pub kind: PieceKind,
    pub cells: [CellPos; 4],
    pub rotation: u8,
}

impl From<&Piece> for ActivePieceSnapshot {
    fn from(piece: &Piece) -> Self {
        Self {
            kind: piece.kind(),
            cells: piece.cells(),
            rotation: piece.rotation().index(),
        }
    }
}

/// Settled cells in row-major order.
pub(crate) fn grid_cells(board: &Board) -> Vec<GridCell> {
    board
        .settled_blocks()
        .map(|(pos, block)| GridCell {
            pos,
            kind: block.kind(),
            flash: block.flash(),
        })
        .collect()
}

/// Everything a presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub grid: Vec<GridCell>,
    pub active: Option<ActivePieceSnapshot>,
    pub next: PieceKind,
    pub state: SessionState,
    pub score: u32,
    pub level: u32,
    pub combo: u32,
    pub lines: usize,
    pub high_score: u32,
    pub gravity_interval_ms: u32,
    pub danger: bool,
    pub hard_mode: bool,
}

impl GameSnapshot {
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    /// Renders the snapshot as text, one line per row.
    ///
    /// `.` is an empty cell, settled blocks show their kind letter and the
    /// active piece shows in lowercase. Active cells above the board are omitted.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut lines = vec![vec!['.'; self.cols]; self.rows];
        let mut put = |pos: CellPos, c: char| {
            if let (Ok(row), Ok(col)) = (usize::try_from(pos.row()), usize::try_from(pos.col()))
                && let Some(slot) = lines.get_mut(row).and_then(|line| line.get_mut(col))
            {
                *slot = c;
            }
        };
        for cell in &self.grid {
            put(cell.pos, cell.kind.as_char());
        }
        if let Some(active) = &self.active {
            for pos in active.cells {
                put(pos, active.kind.as_char().to_ascii_lowercase());
            }
        }
        let mut text = String::with_capacity(self.rows * (self.cols + 1));
        for line in lines {
            text.extend(line);
            text.push('\n');
        }
        text
    }
}
