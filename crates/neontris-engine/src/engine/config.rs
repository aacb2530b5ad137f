use serde::{Deserialize, Serialize};

use crate::{ConfigError, core::position::CellPos};

/// Smallest board a piece can spawn into: four rows, four columns.
pub const MIN_BOARD_ROWS: usize = 4;
pub const MIN_BOARD_COLS: usize = 4;

/// Upper limit on `rows * cols`, the size of the board's cell arena.
pub const MAX_BOARD_CELLS: usize = 1 << 20;

/// Tunable rules of a game.
///
/// Every field has a default matching the reference game, and deserialization
/// fills missing fields from [`GameConfig::default`], so a partial JSON
/// document overrides only what it names:
///
/// ```
/// use neontris_engine::GameConfig;
///
/// let config: GameConfig = serde_json::from_str(r#"{ "cols": 12 }"#).unwrap();
/// assert_eq!(config.cols, 12);
/// assert_eq!(config.rows, 16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Board height in rows.
    pub rows: usize,
    /// Board width in columns.
    pub cols: usize,
    /// Gravity interval at level 1.
    pub base_interval_ms: u32,
    /// Gravity interval while soft drop is held.
    pub soft_drop_interval_ms: u32,
    /// Floor of the level speed curve.
    pub min_interval_ms: u32,
    /// Points per cleared row.
    pub score_per_line: u32,
    /// Extra points for clearing exactly four rows at once.
    pub tetris_bonus: u32,
    /// Points per row descended by a hard drop.
    pub hard_drop_per_cell: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 16,
            cols: 10,
            base_interval_ms: 1000,
            soft_drop_interval_ms: 50,
            min_interval_ms: 150,
            score_per_line: 10,
            tetris_bonus: 40,
            hard_drop_per_cell: 2,
        }
    }
}

impl GameConfig {
    /// Checks that the configuration describes a playable game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < MIN_BOARD_ROWS || self.cols < MIN_BOARD_COLS {
            return Err(ConfigError::BoardTooSmall {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let cells = self.rows.checked_mul(self.cols);
        if i32::try_from(self.rows).is_err()
            || i32::try_from(self.cols).is_err()
            || cells.is_none_or(|cells| cells > MAX_BOARD_CELLS)
        {
            return Err(ConfigError::BoardTooLarge {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for (field, value) in [
            ("base_interval_ms", self.base_interval_ms),
            ("soft_drop_interval_ms", self.soft_drop_interval_ms),
            ("min_interval_ms", self.min_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { field });
            }
        }
        if self.min_interval_ms > self.base_interval_ms {
            return Err(ConfigError::FloorAboveBase {
                min_interval_ms: self.min_interval_ms,
                base_interval_ms: self.base_interval_ms,
            });
        }
        Ok(())
    }

    /// Where new pieces put their pivot: the top row, just left of centre.
    #[must_use]
    pub fn spawn_origin(&self) -> CellPos {
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let col = (self.cols / 2).saturating_sub(1) as i32;
        CellPos::new(0, col)
    }
}
