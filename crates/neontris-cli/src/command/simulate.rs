use std::path::PathBuf;

use neontris_engine::{GameEvent, PieceSeed, Session};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::util::{self, Output};

/// Simulated frame length, roughly 60 frames per second.
const FRAME_MS: u32 = 16;

const DEFAULT_GAMES: usize = 1;
const DEFAULT_MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Piece seed as 32 hexadecimal digits (random if omitted)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Seed of the random input policy
    #[arg(long, default_value_t = 0)]
    policy_seed: u64,
    /// Number of games to play
    #[arg(long, default_value_t = DEFAULT_GAMES)]
    games: usize,
    /// Frames after which an unfinished game is abandoned
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,
    /// Game configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also print every game event as a JSON line
    #[arg(long)]
    events: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Default for SimulateArg {
    fn default() -> Self {
        Self {
            seed: None,
            policy_seed: 0,
            games: DEFAULT_GAMES,
            max_steps: DEFAULT_MAX_STEPS,
            config: None,
            events: false,
            output: None,
        }
    }
}

/// One command the input policy can issue in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Left,
    Right,
    Rotate,
    HardDrop,
    SoftDropOn,
    SoftDropOff,
    Idle,
}

impl Input {
    /// Draws the input for one frame.
    ///
    /// Most frames do nothing, so pieces mostly fall under gravity with the
    /// occasional shuffle, spin or drop.
    fn sample<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        match rng.random_range(0..100) {
            0..6 => Input::Left,
            6..12 => Input::Right,
            12..17 => Input::Rotate,
            17..19 => Input::HardDrop,
            19..22 => Input::SoftDropOn,
            22..25 => Input::SoftDropOff,
            _ => Input::Idle,
        }
    }

    fn apply(self, session: &mut Session) {
        match self {
            Input::Left => {
                session.move_left();
            }
            Input::Right => {
                session.move_right();
            }
            Input::Rotate => {
                session.rotate();
            }
            Input::HardDrop => {
                session.hard_drop();
            }
            Input::SoftDropOn => session.begin_soft_drop(),
            Input::SoftDropOff => session.end_soft_drop(),
            Input::Idle => {}
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GameSummary {
    game: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<PieceSeed>,
    score: u32,
    level: u32,
    high_score: u32,
    lines: usize,
    pieces: usize,
    line_cleared_counter: [usize; 5],
    steps: usize,
    game_over: bool,
}

#[derive(Debug, Clone, Serialize)]
struct EventRecord {
    game: usize,
    step: usize,
    #[serde(flatten)]
    event: GameEvent,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        seed,
        policy_seed,
        games,
        max_steps,
        config,
        events,
        output,
    } = arg;

    let config = util::read_config_file(config.as_ref())?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut session = Session::with_seed(config, seed)?;
    let mut policy = Pcg32::seed_from_u64(*policy_seed);
    let mut output = Output::from_output_path(output.clone())?;

    eprintln!("Simulating {games} game(s) with seed {seed}");
    for game in 1..=*games {
        let summary = play_game(&mut session, &mut policy, game, *max_steps, |event| {
            if *events {
                output.write_json_line(event)?;
            }
            Ok(())
        })?;
        eprintln!(
            "Game #{game}: score {} (level {}, {} lines, {} pieces) after {} steps",
            summary.score, summary.level, summary.lines, summary.pieces, summary.steps
        );
        if !summary.game_over {
            eprintln!("Game #{game} reached --max-steps and was abandoned");
        }
        output.write_json_line(GameSummary {
            seed: Some(seed),
            ..summary
        })?;
    }
    eprintln!("High score: {}", session.high_score());

    Ok(())
}

/// Plays one game of `session` to the end or for at most `max_steps` frames.
///
/// An unfinished game is abandoned, so the session is ready for the next
/// game with its high score and piece sequence intact.
fn play_game<R, F>(
    session: &mut Session,
    policy: &mut R,
    game: usize,
    max_steps: usize,
    mut on_event: F,
) -> anyhow::Result<GameSummary>
where
    R: Rng + ?Sized,
    F: FnMut(EventRecord) -> anyhow::Result<()>,
{
    session.new_game();
    let mut steps = 0;
    while !session.is_game_over() && steps < max_steps {
        Input::sample(policy).apply(session);
        session.tick(FRAME_MS);
        session.decay_flash();
        steps += 1;

        for event in session.drain_events() {
            on_event(EventRecord {
                game,
                step: steps,
                event,
            })?;
        }
    }
    let game_over = session.is_game_over();
    session.abandon_game();

    let stats = session.stats();
    Ok(GameSummary {
        game,
        seed: None,
        score: stats.score(),
        level: stats.level(),
        high_score: session.high_score(),
        lines: stats.total_cleared_lines(),
        pieces: stats.completed_pieces(),
        line_cleared_counter: *stats.line_cleared_counter(),
        steps,
        game_over,
    })
}
