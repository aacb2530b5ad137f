use serde::Serialize;

/// Something that happened inside a [`Session`](super::Session).
///
/// Events are queued as they happen and drained by the driver, which forwards
/// them to audio, effects or score reporting. The session never waits on
/// whoever consumes them.
///
/// Serialized with an `event` tag, e.g.
/// `{"event":"lines_cleared","count":2,"rows":[14,15]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A piece locked into the board.
    Land,
    /// Rows were removed by the lock that preceded this event.
    LinesCleared { count: usize, rows: Vec<usize> },
    /// Exactly four rows were cleared at once.
    Tetris,
    /// The level went up.
    LevelUp { level: u32 },
    /// The new level is a multiple of ten.
    MilestoneLevel { level: u32 },
    /// The next piece could not spawn.
    GameOver { score: u32, level: u32 },
}
