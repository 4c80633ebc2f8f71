//! Power lost to inverter downtime.
//!
//! # Limitations
//!
//! Each inverter is assumed to produce independently of the others. This does not hold for
//! plants with a plant controller that curtails or redistributes power between inverters:
//! the estimate is not corrected for that.

use bon::Builder;

use crate::{
    core::{
        frame::{
            DaylightMask,
            ExpectedPowerSeries,
            InverterPowerTable,
            LostPowerSeries,
            MeterSeries,
            OnlineMask,
        },
        profile::{ProductionProfile, profile_to_signal},
        series::Aggregate,
    },
    prelude::*,
};

/// Inputs of the downtime loss estimation. They must all share the inverter table's time axis.
#[must_use]
#[derive(Builder)]
pub struct DowntimeLoss<'a> {
    /// Per-inverter power.
    inverters: &'a InverterPowerTable,

    /// Plant meter power.
    meter: &'a MeterSeries,

    /// Classification of the same inverters and meter, see [`crate::is_online`].
    online_mask: &'a OnlineMask,

    /// Modelled sitewide power assuming full availability.
    /// Used when no inverter is online; zero or missing where unavailable.
    expected_power: &'a ExpectedPowerSeries,

    /// Typical production, used when `expected_power` is unavailable.
    production_profile: &'a ProductionProfile,

    /// Timestamps where downtime inference is trusted.
    is_daylight: &'a DaylightMask,

    /// Ceiling on the meter power plus the lost power.
    system_limit: Option<f64>,
}

impl DowntimeLoss<'_> {
    /// Estimate the lost power at every timestamp.
    ///
    /// The result is never negative, and with a system limit the meter power plus the lost power
    /// never exceeds it.
    #[instrument(
        skip_all,
        fields(n_timestamps = self.inverters.len(), n_inverters = self.inverters.n_columns()),
    )]
    pub fn estimate(&self) -> Result<LostPowerSeries> {
        let index = self.inverters.index();
        self.meter.ensure_aligned(index, "meter")?;
        self.expected_power.ensure_aligned(index, "expected power")?;
        self.is_daylight.ensure_aligned(index, "daylight mask")?;
        let online_mask = self.online_mask.try_reindex_columns(self.inverters.columns())?;
        online_mask.ensure_aligned(index, "online mask")?;
        if let Some(system_limit) = self.system_limit {
            ensure!(system_limit >= 0.0, "the system limit must be non-negative: {system_limit}");
        }

        let powers = self.inverters.zero_filled();
        let meter = self.meter.zero_filled();
        let expected_power = self.expected_power.zero_filled();
        let typical_power = profile_to_signal(self.production_profile, index);
        let shares = inverter_shares(&powers, online_mask.rows(), &meter);

        let mut n_fallbacks = 0_usize;
        let mut n_missing_profile = 0_usize;
        let lost_power = powers
            .iter()
            .zip(online_mask.rows())
            .zip(&meter)
            .zip(self.is_daylight.values())
            .zip(expected_power.iter().zip(typical_power.values()))
            .map(|((((row, online), meter), is_daylight), (expected_power, typical_power))| {
                if !is_daylight {
                    return 0.0;
                }
                let online_fraction = online_fraction(online, &shares);
                let lost_power = if online_fraction == 0.0 {
                    // No usable inverter signal: total outage or total communication loss.
                    n_fallbacks += 1;
                    if *expected_power > 0.0 {
                        *expected_power
                    } else {
                        typical_power.unwrap_or_else(|| {
                            n_missing_profile += 1;
                            0.0
                        })
                    }
                } else {
                    let inverter_sum: f64 = row.iter().sum();
                    estimate_from_online_fraction(online_fraction, *meter, inverter_sum)
                };
                self.system_limit.map_or(lost_power, |system_limit| {
                    limit_lost_power(lost_power, *meter, system_limit)
                })
            })
            .collect();

        debug!(n_fallbacks, "estimated");
        if n_missing_profile != 0 {
            warn!(n_missing_profile, "the production profile misses some slots, assuming zero");
        }
        LostPowerSeries::try_new(index.to_vec(), lost_power)
    }
}

/// Estimate lost power from the inputs given positionally.
///
/// Shorthand for [`DowntimeLoss::builder`].
pub fn downtime_loss(
    inverters: &InverterPowerTable,
    meter: &MeterSeries,
    online_mask: &OnlineMask,
    expected_power: &ExpectedPowerSeries,
    production_profile: &ProductionProfile,
    is_daylight: &DaylightMask,
    system_limit: Option<f64>,
) -> Result<LostPowerSeries> {
    DowntimeLoss::builder()
        .inverters(inverters)
        .meter(meter)
        .online_mask(online_mask)
        .expected_power(expected_power)
        .production_profile(production_profile)
        .is_daylight(is_daylight)
        .maybe_system_limit(system_limit)
        .build()
        .estimate()
}

/// Each inverter's typical share of the meter power while it is online,
/// normalized to sum up to one.
fn inverter_shares(
    powers: &[Vec<f64>],
    online_mask: &[Vec<bool>],
    meter: &[f64],
) -> Vec<Option<f64>> {
    let n_inverters = online_mask.first().map_or(0, Vec::len);
    let shares: Vec<Option<f64>> = (0..n_inverters)
        .map(|column| {
            powers
                .iter()
                .zip(online_mask)
                .zip(meter)
                .filter(|((_, online), _)| online[column])
                .map(|((row, _), meter)| row[column] / meter)
                .median()
        })
        .collect();
    let total: f64 = shares.iter().flatten().sum();
    shares.into_iter().map(|share| share.map(|share| share / total)).collect()
}

/// Capacity fraction of the online inverters.
fn online_fraction(online: &[bool], shares: &[Option<f64>]) -> f64 {
    online
        .iter()
        .zip(shares)
        .filter(|(online, _)| **online)
        .filter_map(|(_, share)| share.filter(|share| !share.is_nan()))
        .sum()
}

/// Scale the meter power up to the full plant and return the difference.
///
/// Inverters producing but not reporting look offline in the mask. Then the meter exceeds
/// the reported inverter power, and the online fraction is scaled up by that ratio.
fn estimate_from_online_fraction(online_fraction: f64, meter: f64, inverter_sum: f64) -> f64 {
    // `NaN` for `0 / 0` turns into `1.0` here:
    let communications_factor = (meter / inverter_sum).max(1.0);
    let online_fraction = (online_fraction * communications_factor).min(1.0);
    let estimated_full_power = meter / online_fraction;
    (estimated_full_power - meter).max(0.0)
}

fn limit_lost_power(lost_power: f64, meter: f64, system_limit: f64) -> f64 {
    let total_power = (meter + lost_power).min(system_limit);
    (total_power - meter).max(0.0).min(system_limit)
}
