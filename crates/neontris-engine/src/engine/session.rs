use serde::Serialize;

use crate::{
    ConfigError,
    core::{
        board::Board,
        piece::{Piece, PieceKind},
        position::CellPos,
    },
};

use super::{
    config::GameConfig,
    events::GameEvent,
    game_stats::{GameStats, gravity_interval_ms, is_milestone_level},
    piece_generator::{PieceGenerator, PieceSeed},
    snapshot::{self, ActivePieceSnapshot, GameSnapshot, GridCell},
};

/// Flash lost by every settled block per presentation refresh.
pub const FLASH_DECAY_PER_REFRESH: f32 = 0.1;

/// Highest settled row (inclusive) that puts the board in danger.
const DANGER_ROW: usize = 4;

/// Levels above this one are "hard mode".
const HARD_MODE_AFTER_LEVEL: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No game has been started yet.
    Idle,
    Running,
    /// The last game ended; waiting for [`Session::new_game`].
    GameOver,
}

/// One game driver's worth of state: board, falling piece, score and timing.
///
/// # Driving a session
///
/// The external loop calls [`tick`](Self::tick) with the elapsed time of
/// every frame and forwards input as discrete commands
/// ([`move_left`](Self::move_left), [`rotate`](Self::rotate),
/// [`hard_drop`](Self::hard_drop), ...). Illegal moves are ignored without
/// error. After each frame the loop reads [`snapshot`](Self::snapshot) for
/// rendering and [`drain_events`](Self::drain_events) for audio, effects and
/// score reporting.
///
/// # Reentrancy
///
/// A session is not reentrant: every operation takes `&mut self` and must be
/// called from one logical thread at a time, with commands never overlapping
/// a tick. Nothing in a session blocks or performs I/O.
///
/// # Example
///
/// ```
/// use neontris_engine::{GameConfig, GameEvent, Session};
///
/// let mut session = Session::new(GameConfig::default())?;
/// session.new_game();
/// assert!(session.state().is_running());
///
/// session.move_left();
/// session.rotate();
/// session.hard_drop();
///
/// let events: Vec<_> = session.drain_events().collect();
/// assert_eq!(events.first(), Some(&GameEvent::Land));
/// # Ok::<(), neontris_engine::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    config: GameConfig,
    board: Board,
    active: Option<Piece>,
    next_kind: PieceKind,
    generator: PieceGenerator,
    stats: GameStats,
    state: SessionState,
    soft_drop: bool,
    accumulator_ms: u64,
    high_score: u32,
    events: Vec<GameEvent>,
}

impl Session {
    /// Creates an idle session with a random piece seed.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_generator(config, PieceGenerator::new())
    }

    /// Like [`Self::new`], but every game of this session draws pieces from `seed`.
    pub fn with_seed(config: GameConfig, seed: PieceSeed) -> Result<Self, ConfigError> {
        Self::with_generator(config, PieceGenerator::with_seed(seed))
    }

    fn with_generator(
        config: GameConfig,
        mut generator: PieceGenerator,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let next_kind = generator.roll();
        Ok(Self {
            board: Board::new(config.rows, config.cols),
            config,
            active: None,
            next_kind,
            generator,
            stats: GameStats::new(),
            state: SessionState::Idle,
            soft_drop: false,
            accumulator_ms: 0,
            high_score: 0,
            events: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    /// Kind of the piece that spawns after the current one.
    #[must_use]
    pub fn next_kind(&self) -> PieceKind {
        self.next_kind
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.stats.score()
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.stats.level()
    }

    #[must_use]
    pub fn combo(&self) -> u32 {
        self.stats.combo()
    }

    /// Best final score of the games played in this session.
    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score.max(self.stats.score())
    }

    #[must_use]
    pub fn is_soft_dropping(&self) -> bool {
        self.soft_drop
    }

    /// The interval the driver should currently advance gravity at.
    #[must_use]
    pub fn gravity_interval_ms(&self) -> u32 {
        if self.soft_drop {
            self.config.soft_drop_interval_ms
        } else {
            gravity_interval_ms(&self.config, self.stats.level())
        }
    }

    /// The stack has reached the top rows, or the level is a milestone.
    #[must_use]
    pub fn is_in_danger(&self) -> bool {
        self.board.has_hidden_blocks()
            || self
                .board
                .highest_row()
                .is_some_and(|row| row <= DANGER_ROW)
            || is_milestone_level(self.stats.level())
    }

    #[must_use]
    pub fn is_hard_mode(&self) -> bool {
        self.stats.level() > HARD_MODE_AFTER_LEVEL
    }

    /// Starts a new game, discarding the board and the falling piece.
    ///
    /// Does nothing while a game is running.
    pub fn new_game(&mut self) {
        if self.state.is_running() {
            return;
        }
        self.high_score = self.high_score();
        self.board.clear();
        self.active = None;
        self.stats = GameStats::new();
        self.soft_drop = false;
        self.accumulator_ms = 0;
        self.next_kind = self.generator.roll();
        self.state = SessionState::Running;
        self.spawn_next();
    }

    /// Ends a running game without a top-out, e.g. when a driver's time limit runs out.
    ///
    /// The score still counts towards [`high_score`](Self::high_score), and the
    /// piece sequence continues in the next game. No [`GameEvent::GameOver`] is
    /// queued, since no piece failed to spawn. Does nothing unless Running.
    pub fn abandon_game(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.state = SessionState::GameOver;
        self.active = None;
        self.soft_drop = false;
        self.accumulator_ms = 0;
        self.high_score = self.high_score();
    }

    /// Advances the fixed-timestep gravity clock by `elapsed_ms`.
    ///
    /// Runs one gravity step each time the accumulated time exceeds the
    /// current interval, keeping the remainder. The interval is re-read after
    /// each step, since locks, level-ups and soft drop change it.
    pub fn tick(&mut self, elapsed_ms: u32) {
        if !self.state.is_running() {
            return;
        }
        self.accumulator_ms += u64::from(elapsed_ms);
        loop {
            let interval = u64::from(self.gravity_interval_ms());
            if self.accumulator_ms <= interval {
                break;
            }
            self.accumulator_ms -= interval;
            self.step();
            if !self.state.is_running() {
                self.accumulator_ms = 0;
                break;
            }
        }
    }

    /// One gravity step: fall by a row, or lock and bring in the next piece.
    pub fn step(&mut self) {
        if !self.state.is_running() {
            return;
        }
        let Some(piece) = &mut self.active else {
            return;
        };
        if self.board.can_place(&piece.falling_positions()) {
            piece.fall();
        } else {
            self.lock_and_respawn();
        }
    }

    /// Moves the piece one column left if the target cells are free.
    pub fn move_left(&mut self) -> bool {
        self.try_update(Piece::left_positions, Piece::move_left)
    }

    /// Moves the piece one column right if the target cells are free.
    pub fn move_right(&mut self) -> bool {
        self.try_update(Piece::right_positions, Piece::move_right)
    }

    /// Rotates the piece to its next state if the target cells are free.
    ///
    /// There are no wall kicks: a blocked rotation leaves the piece as it was.
    pub fn rotate(&mut self) -> bool {
        self.try_update(Piece::rotate_positions, Piece::apply_rotation)
    }

    fn try_update(
        &mut self,
        positions: impl FnOnce(&Piece) -> [CellPos; 4],
        apply: impl FnOnce(&mut Piece),
    ) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let Some(piece) = &mut self.active else {
            return false;
        };
        if !self.board.can_place(&positions(piece)) {
            return false;
        }
        apply(piece);
        true
    }

    /// Switches gravity to the soft-drop interval until released or the piece locks.
    pub fn begin_soft_drop(&mut self) {
        if self.state.is_running() {
            self.soft_drop = true;
        }
    }

    pub fn end_soft_drop(&mut self) {
        self.soft_drop = false;
    }

    /// Drops the piece as far as it goes and locks it immediately.
    ///
    /// Awards the hard-drop points for every row descended, then clears rows
    /// and spawns the next piece without waiting for a tick. Returns the number
    /// of rows descended.
    pub fn hard_drop(&mut self) -> u32 {
        if !self.state.is_running() {
            return 0;
        }
        let Some(piece) = &mut self.active else {
            return 0;
        };
        let mut cells = 0;
        while self.board.can_place(&piece.falling_positions()) {
            piece.fall();
            cells += 1;
        }
        self.stats.add_hard_drop(cells, &self.config);
        self.lock_and_respawn();
        cells
    }

    /// Lock, clear, score, and spawn the next piece.
    fn lock_and_respawn(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.board.lock(&piece);
        self.events.push(GameEvent::Land);

        let cleared = self.board.clear_full_rows();
        let result = self.stats.complete_piece_drop(cleared.count(), &self.config);
        if !cleared.is_empty() {
            self.events.push(GameEvent::LinesCleared {
                count: cleared.count(),
                rows: cleared.into_rows(),
            });
        }
        if result.tetris {
            self.events.push(GameEvent::Tetris);
        }
        if let Some(level) = result.new_level {
            self.events.push(GameEvent::LevelUp { level });
            if is_milestone_level(level) {
                self.events.push(GameEvent::MilestoneLevel { level });
            }
        }

        self.soft_drop = false;
        self.spawn_next();
    }

    /// Spawns the pre-rolled piece, or ends the game if its cells are blocked.
    fn spawn_next(&mut self) -> bool {
        let piece = Piece::spawn(self.next_kind, self.config.spawn_origin());
        if !self.board.can_place(&piece.cells()) {
            self.end_game();
            return false;
        }
        self.active = Some(piece);
        self.next_kind = self.generator.roll();
        true
    }

    fn end_game(&mut self) {
        self.state = SessionState::GameOver;
        self.active = None;
        self.soft_drop = false;
        self.high_score = self.high_score();
        self.events.push(GameEvent::GameOver {
            score: self.stats.score(),
            level: self.stats.level(),
        });
    }

    /// Fades the landing flash of every settled block by one refresh.
    pub fn decay_flash(&mut self) {
        self.board.decay_flash(FLASH_DECAY_PER_REFRESH);
    }

    /// Events raised since the last drain, oldest first.
    #[must_use]
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Removes and returns the queued events, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Settled cells in row-major order.
    #[must_use]
    pub fn snapshot_grid(&self) -> Vec<GridCell> {
        snapshot::grid_cells(&self.board)
    }

    #[must_use]
    pub fn snapshot_active_piece(&self) -> Option<ActivePieceSnapshot> {
        self.active.as_ref().map(ActivePieceSnapshot::from)
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            rows: self.board.rows(),
            cols: self.board.cols(),
            grid: self.snapshot_grid(),
            active: self.snapshot_active_piece(),
            next: self.next_kind,
            state: self.state,
            score: self.stats.score(),
            level: self.stats.level(),
            combo: self.stats.combo(),
            lines: self.stats.total_cleared_lines(),
            high_score: self.high_score(),
            gravity_interval_ms: self.gravity_interval_ms(),
            danger: self.is_in_danger(),
            hard_mode: self.is_hard_mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const SEED: PieceSeed = PieceSeed::from_bytes([7; 16]);

    fn running_session() -> Session {
        let mut session = Session::with_seed(GameConfig::default(), SEED).unwrap();
        session.new_game();
        session
    }

    /// Replaces the falling piece with `kind` at `origin`.
    fn place_piece(session: &mut Session, kind: PieceKind, origin: CellPos) {
        session.active = Some(Piece::spawn(kind, origin));
    }

    fn fill_row_except(session: &mut Session, row: i32, gaps: &[i32]) {
        for col in 0..10 {
            if !gaps.contains(&col) {
                session
                    .board
                    .fill_block_at(CellPos::new(row, col), PieceKind::O);
            }
        }
    }

    fn assert_board_invariants(session: &Session) {
        let rows = i32::try_from(session.board.rows()).unwrap();
        let cols = i32::try_from(session.board.cols()).unwrap();
        let mut seen = HashSet::new();
        for (pos, _) in session.board.settled_blocks() {
            assert!(seen.insert(pos), "duplicate settled block at {pos:?}");
            assert!((0..cols).contains(&pos.col()) && pos.row() < rows);
        }
        if let Some(piece) = session.active_piece() {
            for pos in piece.cells() {
                assert!((0..cols).contains(&pos.col()) && pos.row() < rows);
                assert!(!seen.contains(&pos), "active piece overlaps {pos:?}");
            }
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GameConfig {
            base_interval_ms: 0,
            ..GameConfig::default()
        };
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn test_new_game_lifecycle() {
        let mut session = Session::with_seed(GameConfig::default(), SEED).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.active_piece().is_none());
        session.tick(10_000);
        assert!(session.active_piece().is_none());

        let expected_first = {
            let mut generator = PieceGenerator::with_seed(SEED);
            generator.roll();
            generator.roll()
        };
        session.new_game();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 1);
        assert_eq!(session.combo(), 0);
        let piece = *session.active_piece().unwrap();
        assert_eq!(piece.kind(), expected_first);
        assert_eq!(piece.pivot(), CellPos::new(0, 4));

        // Ignored while running
        session.move_right();
        let moved = *session.active_piece().unwrap();
        session.new_game();
        assert_eq!(session.active_piece(), Some(&moved));
    }

    #[test]
    fn test_tick_applies_gravity_per_interval() {
        let mut session = running_session();
        let start = session.active_piece().unwrap().pivot();

        session.tick(999);
        assert_eq!(session.active_piece().unwrap().pivot(), start);
        // A full interval is not enough; it has to be exceeded
        session.tick(1);
        assert_eq!(session.active_piece().unwrap().pivot(), start);
        session.tick(1);
        assert_eq!(session.active_piece().unwrap().pivot(), start.down());
        session.tick(2499);
        assert_eq!(
            session.active_piece().unwrap().pivot(),
            start.offset(3, 0)
        );
        session.tick(501);
        assert_eq!(
            session.active_piece().unwrap().pivot(),
            start.offset(4, 0)
        );
    }

    #[test]
    fn test_tick_exactly_one_interval_waits() {
        let mut session = running_session();
        let start = session.active_piece().unwrap().pivot();
        session.tick(1000);
        assert_eq!(session.active_piece().unwrap().pivot(), start);
        session.tick(1000);
        assert_eq!(session.active_piece().unwrap().pivot(), start.down());
    }

    #[test]
    fn test_abandon_game_keeps_high_score() {
        let mut session = running_session();
        place_piece(&mut session, PieceKind::O, CellPos::new(0, 4));
        session.hard_drop();
        assert_eq!(session.score(), 28);
        session.drain_events().for_each(drop);

        session.abandon_game();
        assert!(session.is_game_over());
        assert!(session.active_piece().is_none());
        assert!(session.pending_events().is_empty());
        assert_eq!(session.high_score(), 28);

        session.new_game();
        assert!(session.state().is_running());
        assert_eq!(session.score(), 0);
        assert!(session.board().is_empty());
        assert_eq!(session.high_score(), 28);
        assert!(session.active_piece().is_some());

        session.abandon_game();
        assert!(session.is_game_over());
        // Ignored outside a running game
        session.abandon_game();
        assert!(session.is_game_over());
        assert_eq!(session.high_score(), 28);
    }

    #[test]
    fn test_hidden_cells_count_as_danger() {
        let mut session = running_session();
        assert!(!session.is_in_danger());
        session
            .board
            .fill_block_at(CellPos::new(-1, 0), PieceKind::I);
        assert!(session.is_in_danger());
        assert_eq!(session.snapshot_grid()[0].pos, CellPos::new(-1, 0));
        assert!(session.snapshot().to_text().lines().all(|line| !line.contains('I')));
    }

    #[test]
    fn test_soft_drop_speeds_up_until_lock() {
        let mut session = running_session();
        assert_eq!(session.gravity_interval_ms(), 1000);
        session.begin_soft_drop();
        assert_eq!(session.gravity_interval_ms(), 50);

        let start = session.active_piece().unwrap().pivot();
        session.tick(101);
        assert_eq!(
            session.active_piece().unwrap().pivot(),
            start.offset(2, 0)
        );

        session.end_soft_drop();
        assert_eq!(session.gravity_interval_ms(), 1000);

        session.begin_soft_drop();
        session.hard_drop();
        assert!(!session.is_soft_dropping());
        assert_eq!(session.gravity_interval_ms(), 1000);
    }

    #[test]
    fn test_move_left_rejected_at_wall() {
        let mut session = running_session();
        place_piece(&mut session, PieceKind::I, CellPos::new(5, 0));
        let before = *session.active_piece().unwrap();
        assert!(!session.move_left());
        assert_eq!(session.active_piece(), Some(&before));

        assert!(session.move_right());
        assert_eq!(
            session.active_piece().unwrap().pivot(),
            CellPos::new(5, 1)
        );
    }

    #[test]
    fn test_move_right_rejected_by_settled_block() {
        let mut session = running_session();
        place_piece(&mut session, PieceKind::O, CellPos::new(5, 2));
        session
            .board
            .fill_block_at(CellPos::new(6, 4), PieceKind::T);
        let before = *session.active_piece().unwrap();
        assert!(!session.move_right());
        assert_eq!(session.active_piece(), Some(&before));
    }

    #[test]
    fn test_rotate_rejected_at_wall() {
        let mut session = running_session();
        // Vertical I against the right wall cannot turn horizontal.
        place_piece(&mut session, PieceKind::I, CellPos::new(5, 9));
        let before = *session.active_piece().unwrap();
        assert!(!session.rotate());
        assert_eq!(session.active_piece(), Some(&before));

        session.move_left();
        session.move_left();
        assert!(session.rotate());
        let piece = session.active_piece().unwrap();
        assert_eq!(piece.rotation().index(), 1);
        assert_eq!(
            piece.cells(),
            [(5, 7), (5, 6), (5, 8), (5, 9)].map(CellPos::from)
        );
    }

    #[test]
    fn test_rotate_twice_restores_i_piece() {
        let mut session = running_session();
        place_piece(&mut session, PieceKind::I, CellPos::new(5, 4));
        let start = session.active_piece().unwrap().cells();
        assert!(session.rotate());
        assert!(session.rotate());
        assert_eq!(session.active_piece().unwrap().cells(), start);
    }

    #[test]
    fn test_hard_drop_scores_and_locks() {
        let mut session = running_session();
        place_piece(&mut session, PieceKind::O, CellPos::new(0, 4));
        let next = session.next_kind();

        let rows = session.hard_drop();
        assert_eq!(rows, 14);
        assert_eq!(session.score(), 28);
        assert_eq!(session.board().len(), 4);
        for pos in [(14, 4), (14, 5), (15, 4), (15, 5)] {
            assert!(session.board().block_at(CellPos::from(pos)).is_some());
        }
        assert_eq!(session.active_piece().unwrap().kind(), next);
        assert_eq!(session.stats().completed_pieces(), 1);
        assert_eq!(session.drain_events().collect::<Vec<_>>(), [GameEvent::Land]);
    }

    #[test]
    fn test_gravity_lock_clears_single_line() {
        let mut session = running_session();
        fill_row_except(&mut session, 15, &[4, 5]);
        place_piece(&mut session, PieceKind::O, CellPos::new(14, 4));

        session.step();
        assert_eq!(session.score(), 10);
        assert_eq!(session.combo(), 1);
        assert_eq!(session.board().len(), 2);
        // The O's upper half dropped into the cleared row
        assert!(session.board().block_at(CellPos::new(15, 4)).is_some());
        assert!(session.board().block_at(CellPos::new(15, 5)).is_some());
        assert_eq!(
            session.drain_events().collect::<Vec<_>>(),
            [
                GameEvent::Land,
                GameEvent::LinesCleared {
                    count: 1,
                    rows: vec![15]
                },
            ]
        );
        assert_board_invariants(&session);
    }

    #[test]
    fn test_tetris_clear_awards_bonus() {
        let mut session = running_session();
        for row in 12..16 {
            fill_row_except(&mut session, row, &[0]);
        }
        session.board.fill_block_at(CellPos::new(11, 3), PieceKind::S);
        place_piece(&mut session, PieceKind::I, CellPos::new(1, 0));

        session.hard_drop();
        // 12 rows descended by the hard drop, then 4 lines plus the bonus
        assert_eq!(session.score(), 24 + 80);
        assert_eq!(session.level(), 2);
        assert_eq!(session.board().len(), 1);
        assert!(session.board().block_at(CellPos::new(15, 3)).is_some());
        assert_eq!(
            session.drain_events().collect::<Vec<_>>(),
            [
                GameEvent::Land,
                GameEvent::LinesCleared {
                    count: 4,
                    rows: vec![12, 13, 14, 15]
                },
                GameEvent::Tetris,
                GameEvent::LevelUp { level: 2 },
            ]
        );
    }

    #[test]
    fn test_level_up_speeds_gravity() {
        let mut session = running_session();
        session.stats.add_hard_drop(150, &session.config);
        fill_row_except(&mut session, 15, &[4, 5]);
        place_piece(&mut session, PieceKind::O, CellPos::new(14, 4));
        session.step();

        assert_eq!(session.score(), 310);
        assert_eq!(session.level(), 4);
        assert_eq!(session.gravity_interval_ms(), 820);
        assert!(
            session
                .pending_events()
                .contains(&GameEvent::LevelUp { level: 4 })
        );
    }

    #[test]
    fn test_milestone_level_event() {
        let mut session = running_session();
        session.stats.add_hard_drop(445, &session.config);
        fill_row_except(&mut session, 15, &[4, 5]);
        place_piece(&mut session, PieceKind::O, CellPos::new(14, 4));
        session.step();

        assert_eq!(session.level(), 10);
        assert!(session.is_in_danger());
        assert!(!session.is_hard_mode());
        let events: Vec<_> = session.drain_events().collect();
        assert!(events.ends_with(&[
            GameEvent::LevelUp { level: 10 },
            GameEvent::MilestoneLevel { level: 10 },
        ]));
    }

    #[test]
    fn test_spawn_into_blocked_region_ends_game() {
        let mut session = running_session();
        session.active = None;
        for row in 0..2 {
            for col in 3..7 {
                session
                    .board
                    .fill_block_at(CellPos::new(row, col), PieceKind::Z);
            }
        }

        assert!(!session.spawn_next());
        assert_eq!(session.state(), SessionState::GameOver);
        assert!(session.is_game_over());
        assert!(session.active_piece().is_none());
        assert_eq!(
            session.drain_events().collect::<Vec<_>>(),
            [GameEvent::GameOver { score: 0, level: 1 }]
        );

        // Commands are ignored after game over
        assert!(!session.move_left());
        assert_eq!(session.hard_drop(), 0);
        session.tick(5000);
        assert!(session.pending_events().is_empty());
    }

    #[test]
    fn test_lock_that_blocks_spawn_ends_game() {
        let mut session = running_session();
        // Stack up to row 2 below the spawn point, leaving the spawn cells free
        for row in 3..16 {
            session
                .board
                .fill_block_at(CellPos::new(row, 4), PieceKind::J);
        }
        place_piece(&mut session, PieceKind::O, CellPos::new(1, 4));

        session.step();
        assert!(session.is_game_over());
        let events: Vec<_> = session.drain_events().collect();
        assert_eq!(events.first(), Some(&GameEvent::Land));
        assert!(events.last().unwrap().is_game_over());
    }

    #[test]
    fn test_new_game_after_game_over_resets() {
        let mut session = running_session();
        session.stats.add_hard_drop(60, &session.config);
        session.active = None;
        session
            .board
            .fill_block_at(CellPos::new(0, 4), PieceKind::T);
        session.spawn_next();
        assert!(session.is_game_over());
        assert_eq!(session.high_score(), 120);

        session.new_game();
        assert!(session.state().is_running());
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 1);
        assert!(session.board().is_empty());
        assert!(session.active_piece().is_some());
        assert_eq!(session.high_score(), 120);
    }

    #[test]
    fn test_flash_decays() {
        let mut session = running_session();
        place_piece(&mut session, PieceKind::O, CellPos::new(14, 0));
        session.step();
        let flash = session.snapshot_grid()[0].flash;
        assert!((flash - 0.8).abs() < 1e-5);

        for _ in 0..3 {
            session.decay_flash();
        }
        let flash = session.snapshot_grid()[0].flash;
        assert!((flash - 0.5).abs() < 1e-5);

        for _ in 0..10 {
            session.decay_flash();
        }
        assert!(session.snapshot_grid().iter().all(|c| c.flash == 0.0));
    }

    #[test]
    fn test_snapshots() {
        let mut session = running_session();
        place_piece(&mut session, PieceKind::T, CellPos::new(3, 4));
        session
            .board
            .fill_block_at(CellPos::new(15, 0), PieceKind::L);

        let active = session.snapshot_active_piece().unwrap();
        assert_eq!(active.kind, PieceKind::T);
        assert_eq!(active.rotation, 0);
        assert_eq!(active.cells, [(3, 4), (3, 3), (4, 4), (3, 5)].map(CellPos::from));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.grid.len(), 1);
        assert_eq!(snapshot.grid[0].kind, PieceKind::L);
        assert!(!snapshot.is_game_over());
        let text = snapshot.to_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[3], "...ttt....");
        assert_eq!(lines[4], "....t.....");
        assert_eq!(lines[15], "L.........");
    }

    #[test]
    fn test_random_play_keeps_invariants() {
        let mut session = running_session();
        let mut commands = PieceGenerator::with_seed(PieceSeed::from_bytes([3; 16]));
        for frame in 0..20_000 {
            match commands.roll() {
                PieceKind::I => {
                    session.move_left();
                }
                PieceKind::O => {
                    session.move_right();
                }
                PieceKind::L => {
                    session.rotate();
                }
                PieceKind::J => session.begin_soft_drop(),
                PieceKind::S => session.end_soft_drop(),
                PieceKind::Z if frame % 5 == 0 => {
                    session.hard_drop();
                }
                PieceKind::Z | PieceKind::T => {}
            }
            session.tick(16);
            assert_board_invariants(&session);
            if session.is_game_over() {
                assert!(session.active_piece().is_none());
                session.new_game();
            } else {
                let piece = session.active_piece().unwrap();
                assert_eq!(piece.cells().len(), 4);
            }
        }
    }
}
