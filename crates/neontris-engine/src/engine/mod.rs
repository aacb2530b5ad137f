//! Game rules on top of the core data structures.
//!
//! - [`Session`] - One game driver: board, falling piece, timing and commands
//! - [`GameConfig`] - Board size, timings and scoring constants
//! - [`GameStats`] - Score, level, combo and line statistics
//! - [`GameEvent`] - Notifications queued for the driver
//! - [`GameSnapshot`] - Read-only view of a session for rendering
//! - [`PieceGenerator`] / [`PieceSeed`] - Seeded uniform piece rolls
//!
//! # Game Flow
//!
//! 1. Create a [`Session`] and call [`Session::new_game`]
//! 2. Feed elapsed time to [`Session::tick`] and input to the command methods
//! 3. A piece that can no longer fall locks, full rows clear and the next piece spawns
//! 4. The game ends when a new piece collides at the spawn point
//!
//! # Example
//!
//! ```
//! use neontris_engine::{GameConfig, PieceSeed, Session};
//!
//! let seed = PieceSeed::from_bytes([1; 16]);
//! let mut session = Session::with_seed(GameConfig::default(), seed)?;
//! session.new_game();
//!
//! while !session.is_game_over() {
//!     session.hard_drop();
//! }
//! assert!(session.active_piece().is_none());
//! # Ok::<(), neontris_engine::ConfigError>(())
//! ```

pub use self::{
    config::*, events::*, game_stats::*, piece_generator::*, session::*, snapshot::*,
};

mod config;
mod events;
mod game_stats;
mod piece_generator;
mod session;
mod snapshot;
