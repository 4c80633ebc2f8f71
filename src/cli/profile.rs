use std::path::PathBuf;

use clap::Parser;

use crate::cli::BatchArgs;

#[derive(Parser)]
pub struct ProfileArgs {
    #[clap(flatten)]
    pub batch: BatchArgs,

    #[clap(long = "output", env = "PRODUCTION_PROFILE_PATH", default_value = "profile.toml")]
    pub output_path: PathBuf,
}
