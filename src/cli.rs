mod estimate;
mod profile;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use self::{estimate::EstimateArgs, profile::ProfileArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: classify the inverters and estimate the power lost to downtime.
    #[clap(name = "estimate")]
    Estimate(Box<EstimateArgs>),

    /// Build a typical production profile from the meter readings of a batch.
    #[clap(name = "profile")]
    Profile(ProfileArgs),
}

#[derive(Parser)]
pub struct BatchArgs {
    /// JSON file with the aligned inverter, meter, expected power, and daylight readings.
    #[clap(long = "batch", env = "BATCH_PATH")]
    pub path: PathBuf,
}
