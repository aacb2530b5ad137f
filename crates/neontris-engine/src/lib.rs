//! Simulation core of a falling-block puzzle game.
//!
//! - [`core`] holds the geometry, the seven piece kinds with their rotation
//!   tables, and the board of settled blocks.
//! - [`engine`] drives a game: configuration, piece generation, scoring and
//!   levels, and the [`Session`] state machine that exposes commands, queries
//!   and events to the outside world.
//!
//! Nothing here renders, plays audio, reads input or talks to a network.
//! Those collaborators call the [`Session`] commands, read its snapshots, and
//! drain its [`GameEvent`]s.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// A [`GameConfig`] that cannot describe a playable game.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("board of {rows}x{cols} is too small (needs at least 4x4)")]
    BoardTooSmall { rows: usize, cols: usize },
    #[display("board of {rows}x{cols} is too large")]
    BoardTooLarge { rows: usize, cols: usize },
    #[display("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },
    #[display(
        "min_interval_ms ({min_interval_ms}) exceeds base_interval_ms ({base_interval_ms})"
    )]
    FloorAboveBase {
        min_interval_ms: u32,
        base_interval_ms: u32,
    },
}

/// A piece seed string that is not 32 hexadecimal digits.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed '{input}': expected 32 hexadecimal characters")]
pub struct ParseSeedError {
    input: String,
}

impl ParseSeedError {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}
