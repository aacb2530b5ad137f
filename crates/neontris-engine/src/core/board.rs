use std::{collections::BTreeMap, mem};

use serde::Serialize;

use super::{
    piece::{Piece, PieceKind},
    position::CellPos,
};

/// Flash intensity given to blocks the moment they land.
pub const LANDING_FLASH: f32 = 0.8;

/// A settled block: the kind it came from and its landing flash.
///
/// `flash` is a presentation hint in `[0, 1]`; the simulation never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SettledBlock {
    kind: PieceKind,
    flash: f32,
}

impl SettledBlock {
    #[must_use]
    pub const fn new(kind: PieceKind) -> Self {
        Self { kind, flash: 0.0 }
    }

    #[must_use]
    pub const fn kind(self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn flash(self) -> f32 {
        self.flash
    }
}

/// Rows removed by [`Board::clear_full_rows`].
///
/// Indices refer to the board as it was before the clear, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearedRows {
    rows: Vec<usize>,
}

impl ClearedRows {
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<usize> {
        self.rows
    }
}

/// The store of settled blocks.
///
/// Cells live in one flat row-major arena of `rows × cols` slots; a slot is
/// either empty or holds a [`SettledBlock`]. Blocks locked above the visible
/// board (negative rows) are kept in a small ordered side store until a line
/// clear shifts them down into the arena. Both stores are keyed by
/// coordinate, so two settled blocks can never share one.
///
/// # Bounds
///
/// Only the floor and the side walls are enforced. Rows above the board
/// (negative rows) are always in bounds, so pieces can spawn and rotate
/// partially above the visible area.
///
/// # Example
///
/// ```
/// use neontris_engine::{Board, CellPos, Piece, PieceKind};
///
/// let mut board = Board::new(16, 10);
/// let mut piece = Piece::spawn(PieceKind::O, CellPos::new(0, 4));
/// while board.can_place(&piece.falling_positions()) {
///     piece.fall();
/// }
/// board.lock(&piece);
///
/// assert!(!board.is_unoccupied(&[CellPos::new(15, 4)]));
/// assert!(board.clear_full_rows().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Option<SettledBlock>>,
    hidden: BTreeMap<CellPos, SettledBlock>,
}

impl Board {
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
            hidden: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Arena slot of an on-board coordinate.
    fn index(&self, pos: CellPos) -> Option<usize> {
        let row = usize::try_from(pos.row()).ok()?;
        let col = usize::try_from(pos.col()).ok()?;
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    fn is_within_bounds_one(&self, pos: CellPos) -> bool {
        let col_ok = usize::try_from(pos.col()).is_ok_and(|col| col < self.cols);
        let row_ok = usize::try_from(pos.row()).map_or(true, |row| row < self.rows);
        col_ok && row_ok
    }

    /// Every coordinate is above the floor and between the walls.
    #[must_use]
    pub fn is_within_bounds(&self, positions: &[CellPos]) -> bool {
        positions.iter().all(|&pos| self.is_within_bounds_one(pos))
    }

    /// No settled block sits on any of the coordinates.
    #[must_use]
    pub fn is_unoccupied(&self, positions: &[CellPos]) -> bool {
        positions
            .iter()
            .all(|&pos| self.block_at(pos).is_none())
    }

    /// The legality predicate for every movement, rotation and spawn.
    #[must_use]
    pub fn can_place(&self, positions: &[CellPos]) -> bool {
        self.is_within_bounds(positions) && self.is_unoccupied(positions)
    }

    #[must_use]
    pub fn block_at(&self, pos: CellPos) -> Option<SettledBlock> {
        if pos.row() < 0 {
            return self.hidden.get(&pos).copied();
        }
        self.index(pos).and_then(|i| self.cells[i])
    }

    fn store(&mut self, pos: CellPos, block: SettledBlock) -> bool {
        if let Some(i) = self.index(pos) {
            self.cells[i] = Some(block);
            true
        } else if pos.row() < 0 && self.is_within_bounds_one(pos) {
            self.hidden.insert(pos, block);
            true
        } else {
            false
        }
    }

    /// Places a single settled block, replacing whatever was there.
    ///
    /// Returns `false` (and stores nothing) if `pos` is below the floor or
    /// outside the walls.
    pub fn fill_block_at(&mut self, pos: CellPos, kind: PieceKind) -> bool {
        self.store(pos, SettledBlock::new(kind))
    }

    /// Transfers the piece's blocks into the settled set with the landing flash.
    ///
    /// Returns the number of blocks stored, which is 4 for any piece the
    /// board could place.
    pub fn lock(&mut self, piece: &Piece) -> usize {
        let block = SettledBlock {
            kind: piece.kind(),
            flash: LANDING_FLASH,
        };
        piece
            .cells()
            .into_iter()
            .filter(|&pos| self.store(pos, block))
            .count()
    }

    fn row_slots(&self, row: usize) -> &[Option<SettledBlock>] {
        &self.cells[row * self.cols..][..self.cols]
    }

    fn is_row_full(&self, row: usize) -> bool {
        self.row_slots(row).iter().all(Option::is_some)
    }

    /// Removes every full row and compacts the rows above it.
    ///
    /// All full rows are found in one pass; a surviving block moves down by
    /// the number of cleared rows beneath it, so non-adjacent clears never
    /// shift a block twice.
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let mut cleared = Vec::new();
        for row in (0..self.rows).rev() {
            if self.is_row_full(row) {
                cleared.push(row);
                continue;
            }
            let shift = cleared.len();
            if shift > 0 {
                let src = row * self.cols;
                self.cells
                    .copy_within(src..src + self.cols, src + shift * self.cols);
            }
        }
        self.cells[..cleared.len() * self.cols].fill(None);

        // Every cleared row lies below the hidden blocks, so they all shift by
        // the full count, landing in the freshly emptied top rows if they reach row 0.
        if !cleared.is_empty() && !self.hidden.is_empty() {
            #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let shift = cleared.len() as i32;
            for (pos, block) in mem::take(&mut self.hidden) {
                self.store(pos.offset(shift, 0), block);
            }
        }
        cleared.reverse();
        ClearedRows { rows: cleared }
    }

    /// Settled blocks in row-major order, those above the board first.
    pub fn settled_blocks(&self) -> impl Iterator<Item = (CellPos, SettledBlock)> + '_ {
        let hidden = self.hidden.iter().map(|(&pos, &block)| (pos, block));
        let visible = self.cells.iter().enumerate().filter_map(|(i, slot)| {
            let block = (*slot)?;
            #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let pos = CellPos::new((i / self.cols) as i32, (i % self.cols) as i32);
            Some((pos, block))
        });
        hidden.chain(visible)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hidden.len() + self.cells.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty() && self.cells.iter().all(Option::is_none)
    }

    /// Some settled block sits above the visible board.
    #[must_use]
    pub fn has_hidden_blocks(&self) -> bool {
        !self.hidden.is_empty()
    }

    /// Index of the highest visible row holding any settled block.
    #[must_use]
    pub fn highest_row(&self) -> Option<usize> {
        (0..self.rows).find(|&row| self.row_slots(row).iter().any(Option::is_some))
    }

    /// Lowers every block's flash by `amount`, clamping at zero.
    pub fn decay_flash(&mut self, amount: f32) {
        for block in self.cells.iter_mut().flatten().chain(self.hidden.values_mut()) {
            block.flash = (block.flash - amount).max(0.0);
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
        self.hidden.clear();
    }
}
