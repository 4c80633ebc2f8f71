use std::path::PathBuf;

use clap::Parser;

use crate::cli::BatchArgs;

#[derive(Parser)]
pub struct EstimateArgs {
    #[clap(flatten)]
    pub batch: BatchArgs,

    /// TOML file with the typical production profile, used when nothing else is available.
    #[clap(long = "profile", env = "PRODUCTION_PROFILE_PATH")]
    pub profile_path: PathBuf,

    /// Power below which an inverter is not clearly producing, the same for all inverters.
    ///
    /// By default, 1% of each inverter's 99th percentile power.
    #[clap(long = "low-limit-watts", env = "LOW_LIMIT_WATTS")]
    pub low_limit: Option<f64>,

    /// Sitewide ceiling on the produced plus the lost power.
    #[clap(long = "system-limit-watts", env = "SYSTEM_LIMIT_WATTS")]
    pub system_limit: Option<f64>,

    /// Write the lost power series to this JSON file.
    #[clap(long = "output", env = "LOST_POWER_PATH")]
    pub output_path: Option<PathBuf>,
}
