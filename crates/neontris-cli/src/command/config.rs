use std::path::PathBuf;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Game configuration JSON file (defaults are printed if omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    let ConfigArg { config, output } = arg;
    let config = util::read_config_file(config.as_ref())?;
    let mut output = Output::from_output_path(output.clone())?;
    output.write_json(&config)?;
    Ok(())
}
