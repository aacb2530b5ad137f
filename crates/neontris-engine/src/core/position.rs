use serde::{Deserialize, Serialize};

/// A cell coordinate on the board.
///
/// # Coordinate System
///
/// - `row` increases downward; row `0` is the top visible row
/// - `col` increases rightward; column `0` is the left wall side
/// - Rows may be negative: pieces spawn partially above the visible board
///
/// Ordering is row-major (row first, then column), which is the order
/// board snapshots are produced in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellPos {
    row: i32,
    col: i32,
}

impl CellPos {
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[must_use]
    pub const fn row(self) -> i32 {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> i32 {
        self.col
    }

    /// Returns the coordinate translated by `(d_row, d_col)`.
    #[must_use]
    pub const fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    #[must_use]
    pub const fn down(self) -> Self {
        self.offset(1, 0)
    }

    #[must_use]
    pub const fn left(self) -> Self {
        self.offset(0, -1)
    }

    #[must_use]
    pub const fn right(self) -> Self {
        self.offset(0, 1)
    }
}

impl From<(i32, i32)> for CellPos {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbours() {
        let pos = CellPos::new(3, 5);
        assert_eq!(pos.down(), CellPos::new(4, 5));
        assert_eq!(pos.left(), CellPos::new(3, 4));
        assert_eq!(pos.right(), CellPos::new(3, 6));
        assert_eq!(pos.offset(-2, 1), CellPos::new(1, 6));
    }

    #[test]
    fn test_row_major_ordering() {
        let mut cells = vec![
            CellPos::new(2, 0),
            CellPos::new(0, 9),
            CellPos::new(2, -1),
            CellPos::new(-1, 4),
        ];
        cells.sort();
        assert_eq!(
            cells,
            [
                CellPos::new(-1, 4),
                CellPos::new(0, 9),
                CellPos::new(2, -1),
                CellPos::new(2, 0),
            ]
        );
    }

    #[test]
    fn test_serialization_format() {
        let json = serde_json::to_string(&CellPos::new(-1, 4)).unwrap();
        assert_eq!(json, r#"{"row":-1,"col":4}"#);
    }
}
