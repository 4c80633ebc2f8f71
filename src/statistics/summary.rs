use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{
        frame::{LostPowerSeries, MeterSeries},
        series::Deltas,
    },
    prelude::*,
    quantity::{energy::WattHours, power::Watts},
};

/// Produced and lost energy over a period.
#[must_use]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
)]
pub struct EnergyBalance {
    pub actual: WattHours,
    pub lost: WattHours,
}

impl EnergyBalance {
    /// Share of the potential energy that was actually produced.
    #[must_use]
    pub fn availability(self) -> Option<f64> {
        let potential = self.actual + self.lost;
        (potential != WattHours::ZERO).then(|| self.actual / potential)
    }
}

/// Energy lost to downtime over the whole time axis and per calendar day.
#[must_use]
#[derive(Clone, Debug, Default, Serialize)]
pub struct LossSummary {
    pub total: EnergyBalance,
    pub daily: BTreeMap<NaiveDate, EnergyBalance>,
}

impl LossSummary {
    /// Integrate the meter and lost power with the trapezoidal rule.
    ///
    /// Each interval between consecutive timestamps counts towards the date it starts at.
    #[instrument(skip_all, fields(n_points = lost_power.len()))]
    pub fn try_new(meter: &MeterSeries, lost_power: &LostPowerSeries) -> Result<Self> {
        meter.ensure_aligned(lost_power.index(), "meter")?;
        let daily: BTreeMap<NaiveDate, EnergyBalance> = lost_power
            .index()
            .iter()
            .copied()
            .zip(meter.zero_filled().into_iter().zip(lost_power.values().iter().copied()))
            .pairwise()
            .map(|(interval, ((start_meter, start_lost), (end_meter, end_lost)))| {
                let duration = interval.end - interval.start;
                let balance = EnergyBalance {
                    actual: Watts(0.5 * (start_meter + end_meter)) * duration,
                    lost: Watts(0.5 * (start_lost + end_lost)) * duration,
                };
                (interval.start.date_naive(), balance)
            })
            .into_group_map()
            .into_iter()
            .map(|(date, balances)| {
                (date, balances.into_iter().fold(EnergyBalance::default(), |sum, it| sum + it))
            })
            .collect();
        let mut total = EnergyBalance::default();
        for balance in daily.values() {
            total += *balance;
        }
        info!(actual = %total.actual, lost = %total.lost, "summarized");
        Ok(Self { total, daily })
    }
}
