use clap::{Parser, Subcommand};

use self::{config::ConfigArg, show::ShowArg, simulate::SimulateArg};

mod config;
mod show;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play games with a random input policy and report the results
    Simulate(#[clap(flatten)] SimulateArg),
    /// Print the effective game configuration
    Config(#[clap(flatten)] ConfigArg),
    /// Hard-drop pieces and print the resulting board
    Show(#[clap(flatten)] ShowArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Simulate(SimulateArg::default())) {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Config(arg) => config::run(&arg)?,
        Mode::Show(arg) => show::run(&arg)?,
    }
    Ok(())
}
