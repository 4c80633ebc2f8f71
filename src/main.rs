mod cli;

use std::fs;

use clap::{Parser, crate_version};
use pv_downtime::{
    LowLimit,
    ProductionProfile,
    batch::Batch,
    downtime_loss,
    is_online,
    prelude::*,
    signal_to_profile,
    statistics::LossSummary,
    tables::build_loss_summary_table,
};

use crate::cli::{Args, Command, EstimateArgs, ProfileArgs};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Estimate(args) => estimate(&args)?,
        Command::Profile(args) => profile(&args)?,
    }

    info!("done!");
    Ok(())
}

#[instrument(skip_all)]
fn estimate(args: &EstimateArgs) -> Result {
    let inputs = Batch::read_from(&args.batch.path)?.try_into_inputs()?;
    info!(
        n_timestamps = inputs.inverters.len(),
        n_inverters = inputs.inverters.n_columns(),
        "loaded the batch",
    );
    let profile_text = fs::read_to_string(&args.profile_path)
        .with_context(|| format!("failed to read `{}`", args.profile_path.display()))?;
    let production_profile: ProductionProfile = toml::from_str(&profile_text)
        .with_context(|| format!("failed to parse `{}`", args.profile_path.display()))?;

    let low_limit = args.low_limit.map(LowLimit::from);
    let online_mask = is_online(&inputs.inverters, &inputs.meter, low_limit.as_ref())?;
    let lost_power = downtime_loss(
        &inputs.inverters,
        &inputs.meter,
        &online_mask,
        &inputs.expected_power,
        &production_profile,
        &inputs.is_daylight,
        args.system_limit,
    )?;

    if let Some(output_path) = &args.output_path {
        fs::write(output_path, serde_json::to_string_pretty(&lost_power.to_points())?)
            .with_context(|| format!("failed to write `{}`", output_path.display()))?;
        info!(path = %output_path.display(), "saved the lost power");
    }

    let summary = LossSummary::try_new(&inputs.meter, &lost_power)?;
    println!("{}", build_loss_summary_table(&summary));
    Ok(())
}

#[instrument(skip_all)]
fn profile(args: &ProfileArgs) -> Result {
    let inputs = Batch::read_from(&args.batch.path)?.try_into_inputs()?;
    let profile = signal_to_profile(&inputs.meter);
    fs::write(&args.output_path, toml::to_string(&profile)?)
        .with_context(|| format!("failed to write `{}`", args.output_path.display()))?;
    info!(n_slots = profile.len(), path = %args.output_path.display(), "saved the profile");
    Ok(())
}
