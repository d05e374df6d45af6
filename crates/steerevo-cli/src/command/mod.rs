use std::path::PathBuf;

use clap::{Parser, Subcommand};

use self::{replay::ReplayArg, train::TrainArg};
use crate::{config::TrainingConfig, util::Output};

mod replay;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a steering network, checkpointing the best one periodically
    Train(#[clap(flatten)] TrainArg),
    /// Play a checkpointed network headlessly and print its score
    Replay(#[clap(flatten)] ReplayArg),
    /// Print the default training configuration as JSON
    DefaultConfig {
        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
        Mode::DefaultConfig { output } => Output::save_json(&TrainingConfig::default(), output)?,
    }
    Ok(())
}
