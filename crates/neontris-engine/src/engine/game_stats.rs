use serde::Serialize;

use super::config::GameConfig;

/// Points needed per level.
const SCORE_PER_LEVEL: u32 = 100;

/// Interval reduction per level for levels 2 through 4.
const EARLY_LEVEL_STEP_MS: u32 = 60;
/// Interval reduction per level beyond level 4.
const LATE_LEVEL_STEP_MS: u32 = 80;
/// Last level of the gentle part of the speed curve.
const EARLY_LEVEL_LIMIT: u32 = 4;

/// Every level divisible by this is a milestone.
pub const MILESTONE_EVERY: u32 = 10;

/// Level reached at `score`: one level per 100 points, starting at 1.
#[must_use]
pub const fn level_for_score(score: u32) -> u32 {
    score / SCORE_PER_LEVEL + 1
}

#[must_use]
pub const fn is_milestone_level(level: u32) -> bool {
    level % MILESTONE_EVERY == 0
}

/// Base gravity interval at `level`.
///
/// Piecewise curve: 60 ms faster per level up to level 4, then 80 ms faster
/// per level, never below `config.min_interval_ms`.
///
/// ```
/// use neontris_engine::{GameConfig, gravity_interval_ms};
///
/// let config = GameConfig::default();
/// assert_eq!(gravity_interval_ms(&config, 1), 1000);
/// assert_eq!(gravity_interval_ms(&config, 4), 820);
/// assert_eq!(gravity_interval_ms(&config, 5), 740);
/// assert_eq!(gravity_interval_ms(&config, 20), 150);
/// ```
#[must_use]
pub fn gravity_interval_ms(config: &GameConfig, level: u32) -> u32 {
    let level = level.max(1);
    let reduction = if level <= EARLY_LEVEL_LIMIT {
        (level - 1) * EARLY_LEVEL_STEP_MS
    } else {
        ((EARLY_LEVEL_LIMIT - 1) * EARLY_LEVEL_STEP_MS)
            .saturating_add((level - EARLY_LEVEL_LIMIT).saturating_mul(LATE_LEVEL_STEP_MS))
    };
    config
        .base_interval_ms
        .saturating_sub(reduction)
        .max(config.min_interval_ms)
}

/// What a single lock did to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockScore {
    /// Points awarded for cleared rows, tetris bonus included.
    pub points: u32,
    /// Exactly four rows were cleared.
    pub tetris: bool,
    /// The new level, if this lock changed it.
    pub new_level: Option<u32>,
}

/// Score, level, combo and line statistics of one game.
///
/// # Scoring
///
/// - Clearing `n` rows in one lock: `n * score_per_line`
/// - Clearing exactly 4 rows: an additional `tetris_bonus`
/// - Hard drop: `hard_drop_per_cell` for every row descended
///
/// The level is derived from the score and is re-evaluated at every lock.
///
/// # Example
///
/// ```
/// use neontris_engine::{GameConfig, GameStats};
///
/// let config = GameConfig::default();
/// let mut stats = GameStats::new();
/// stats.complete_piece_drop(4, &config); // Tetris (4 lines)
///
/// assert_eq!(stats.score(), 80);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStats {
    score: u32,
    level: u32,
    combo: u32,
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; 5],
}

impl Default for GameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStats {
    /// Creates statistics for a fresh game: score 0, level 1, no combo.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            combo: 0,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Consecutive locks that cleared at least one row.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Returns the total number of pieces that have been locked into place.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Returns a histogram of locks by rows cleared.
    ///
    /// Array indices represent:
    /// - `[0]`: Number of locks with 0 lines cleared
    /// - `[1]`: Number of singles (1 line)
    /// - `[2]`: Number of doubles (2 lines)
    /// - `[3]`: Number of triples (3 lines)
    /// - `[4]`: Number of tetrises (4 lines)
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Awards hard-drop points for `cells` rows descended. Returns the points.
    pub fn add_hard_drop(&mut self, cells: u32, config: &GameConfig) -> u32 {
        let points = cells.saturating_mul(config.hard_drop_per_cell);
        self.score = self.score.saturating_add(points);
        points
    }

    /// Updates statistics after a piece locks and `cleared_lines` rows are removed.
    pub fn complete_piece_drop(&mut self, cleared_lines: usize, config: &GameConfig) -> LockScore {
        self.completed_pieces += 1;
        self.total_cleared_lines += cleared_lines;
        if cleared_lines < self.line_cleared_counter.len() {
            self.line_cleared_counter[cleared_lines] += 1;
        }

        let lines = u32::try_from(cleared_lines).unwrap_or(u32::MAX);
        let tetris = cleared_lines == 4;
        let mut points = lines.saturating_mul(config.score_per_line);
        if tetris {
            points = points.saturating_add(config.tetris_bonus);
        }
        self.score = self.score.saturating_add(points);
        self.combo = if cleared_lines > 0 { self.combo + 1 } else { 0 };

        let level = level_for_score(self.score);
        let new_level = (level != self.level).then_some(level);
        self.level = level;

        LockScore {
            points,
            tetris,
            new_level,
        }
    }
}
