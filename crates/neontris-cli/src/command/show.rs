use std::path::PathBuf;

use neontris_engine::{PieceSeed, Session};
use rand::Rng as _;

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ShowArg {
    /// Piece seed as 32 hexadecimal digits (random if omitted)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Number of pieces to hard-drop before printing
    #[arg(long, default_value_t = 10)]
    drops: usize,
    /// Game configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the full snapshot as JSON instead of the text grid
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(arg: &ShowArg) -> anyhow::Result<()> {
    let ShowArg {
        seed,
        drops,
        config,
        json,
    } = arg;

    let config = util::read_config_file(config.as_ref())?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut session = Session::with_seed(config, seed)?;
    session.new_game();

    let mut dropped = 0;
    while dropped < *drops && !session.is_game_over() {
        session.hard_drop();
        dropped += 1;
    }

    let snapshot = session.snapshot();
    let mut output = Output::stdout();
    if *json {
        output.write_json(&snapshot)?;
    } else {
        output.write_text(&snapshot.to_text())?;
        output.write_text(&format!(
            "seed: {seed}\nscore: {}  level: {}  lines: {}  next: {}{}\n",
            snapshot.score,
            snapshot.level,
            snapshot.lines,
            snapshot.next.as_char(),
            if snapshot.is_game_over() {
                "  (game over)"
            } else {
                ""
            },
        ))?;
    }
    eprintln!("Dropped {dropped} piece(s)");

    Ok(())
}
