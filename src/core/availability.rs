//! Inverter availability inferred from inverter and meter power together.
//!
//! An inverter reporting near-zero power is either offline or merely not communicating. The meter
//! tells the two apart: an outage shows up as a shortfall of the plant power against what the
//! reporting inverters suggest, while a communication gap does not.

use ordered_float::OrderedFloat;

use crate::{
    core::{
        frame::{InverterPowerTable, MeterSeries, OnlineMask},
        series::Aggregate,
        threshold::{LowLimit, derive_default_threshold},
    },
    prelude::*,
};

/// Share of the expected meter shortfall that is enough to corroborate an outage.
///
/// The slack absorbs measurement noise. Empirical constant.
pub const SHORTFALL_TOLERANCE: f64 = 0.75;

/// Classify every inverter at every timestamp as online (`true`) or possibly offline (`false`).
///
/// An inverter below its threshold stays online unless the meter corroborates the outage.
/// When both the inverters and the meter read below their thresholds, the whole site is offline.
///
/// Without `low_limit`, the thresholds are [derived][derive_default_threshold] from the data.
#[instrument(
    skip_all,
    fields(n_timestamps = inverters.len(), n_inverters = inverters.n_columns()),
)]
pub fn is_online(
    inverters: &InverterPowerTable,
    meter: &MeterSeries,
    low_limit: Option<&LowLimit>,
) -> Result<OnlineMask> {
    ensure!(inverters.n_columns() != 0, "at least one inverter is required");
    meter.ensure_aligned(inverters.index(), "meter")?;

    let limits = match low_limit {
        Some(low_limit) => low_limit.try_resolve(inverters.columns())?,
        None => derive_default_threshold(inverters).try_resolve(inverters.columns())?,
    };
    let classifier = Classifier::new(inverters.zero_filled(), limits);
    let meter = meter.zero_filled();

    let verdicts: Vec<Verdict> = classifier
        .powers
        .iter()
        .zip(&classifier.mean_inverter_power(&meter))
        .zip(&meter)
        .map(|((row, mean_power), meter)| classifier.classify(row, *mean_power, *meter))
        .collect();
    let count = |expected| verdicts.iter().filter(|verdict| **verdict == expected).count();
    debug!(
        n_site_offline = count(Verdict::SiteOffline),
        n_corroborated = count(Verdict::Corroborated),
        "classified",
    );

    let rows = classifier
        .powers
        .iter()
        .zip(verdicts)
        .map(|(row, verdict)| match verdict {
            Verdict::Online => vec![true; row.len()],
            Verdict::Corroborated => classifier.above(row).collect(),
            Verdict::SiteOffline => vec![false; row.len()],
        })
        .collect();
    Ok(OnlineMask::from_parts(inverters.index().to_vec(), inverters.columns().to_vec(), rows))
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Verdict {
    /// Nothing corroborates an outage: every inverter is online.
    Online,

    /// The meter confirms the shortfall: inverters below their thresholds are offline.
    Corroborated,

    /// Both the inverters and the meter read nothing: every inverter is offline.
    SiteOffline,
}

struct Classifier {
    /// Zero-filled inverter power, row per timestamp.
    powers: Vec<Vec<f64>>,

    /// Per-inverter thresholds in the column order.
    limits: Vec<f64>,

    /// Typical ratio of an inverter's power to the mean inverter power.
    /// `None` for inverters that never exceed their threshold.
    relative_sizing: Vec<Option<f64>>,
}

impl Classifier {
    fn new(powers: Vec<Vec<f64>>, limits: Vec<f64>) -> Self {
        let mut this = Self { powers, limits, relative_sizing: Vec::new() };
        this.relative_sizing = this.estimate_relative_sizing();
        this
    }

    fn above<'a>(&'a self, row: &'a [f64]) -> impl Iterator<Item = bool> + 'a {
        row.iter().zip(&self.limits).map(|(power, limit)| power > limit)
    }

    fn all_below(&self, row: &[f64]) -> bool {
        row.iter().zip(&self.limits).all(|(power, limit)| power < limit)
    }

    /// Mean power of the inverters above their thresholds, ignoring their sizes.
    fn naive_mean(&self, row: &[f64]) -> Option<f64> {
        row.iter()
            .zip(&self.limits)
            .filter(|(power, limit)| power > limit)
            .map(|(power, _)| *power)
            .mean()
    }

    /// Median over time of each inverter's power relative to the naive mean,
    /// taken only where the inverter is above its threshold.
    fn estimate_relative_sizing(&self) -> Vec<Option<f64>> {
        let naive_means: Vec<Option<f64>> =
            self.powers.iter().map(|row| self.naive_mean(row)).collect();
        self.limits
            .iter()
            .enumerate()
            .map(|(column, limit)| {
                self.powers
                    .iter()
                    .zip(&naive_means)
                    .filter(|(row, _)| row[column] > *limit)
                    .filter_map(|(row, mean)| mean.map(|mean| row[column] / mean))
                    .median()
            })
            .collect()
    }

    /// Relative sizing normalized to sum up to one.
    fn inverter_fractions(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        let total: f64 = self.relative_sizing.iter().flatten().sum();
        self.relative_sizing.iter().map(move |sizing| sizing.map(|sizing| sizing / total))
    }

    /// Size-corrected mean single-inverter power per timestamp.
    ///
    /// Falls back to the meter power split evenly when every inverter is below its threshold.
    #[allow(clippy::cast_precision_loss)]
    fn mean_inverter_power(&self, meter: &[f64]) -> Vec<Option<f64>> {
        let n_inverters = self.limits.len() as f64;
        self.powers
            .iter()
            .zip(meter)
            .map(|(row, meter)| {
                if self.all_below(row) {
                    return Some(meter / n_inverters);
                }
                row.iter()
                    .zip(&self.limits)
                    .zip(&self.relative_sizing)
                    .filter(|((power, limit), _)| power > limit)
                    .filter_map(|((power, _), sizing)| sizing.map(|sizing| power / sizing))
                    .mean()
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn classify(&self, row: &[f64], mean_power: Option<f64>, meter: f64) -> Verdict {
        let n_inverters = self.limits.len() as f64;
        let limit_sum: f64 = self.limits.iter().sum();

        if self.all_below(row) && meter < limit_sum {
            return Verdict::SiteOffline;
        }
        if self.above(row).all(|is_above| is_above) {
            return Verdict::Online;
        }

        // Fractional shortfall of the meter against all inverters producing the mean power:
        let meter_delta = mean_power
            .filter(|mean_power| *mean_power != 0.0)
            .map(|mean_power| 1.0 - meter / (n_inverters * mean_power));

        // Expected shortfall if only the smallest of the low inverters were offline:
        let smallest_delta = row
            .iter()
            .zip(&self.limits)
            .zip(self.inverter_fractions())
            .filter(|((power, limit), _)| power <= limit)
            .filter_map(|(_, fraction)| fraction.filter(|fraction| !fraction.is_nan()))
            .map(OrderedFloat)
            .min()
            .map_or(1.0, |fraction| fraction.0);

        let meter_appears_low =
            meter_delta.is_some_and(|delta| delta > SHORTFALL_TOLERANCE * smallest_delta);
        if meter_appears_low {
            Verdict::Corroborated
        } else {
            Verdict::Online
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::core::frame::{
        Frame,
        TimeSeries,
        tests::{hourly_index, ids},
    };

    fn inputs<const N: usize>(rows: &[([f64; N], f64)]) -> (InverterPowerTable, MeterSeries) {
        let index = hourly_index(rows.len());
        let names = ["a", "b", "c", "d", "e"];
        let inverters = Frame::try_new(
            index.clone(),
            ids(&names[..N]),
            rows.iter().map(|(powers, _)| powers.iter().copied().map(Some).collect()).collect(),
        )
        .unwrap();
        let meter = rows.iter().map(|(_, meter)| Some(*meter)).collect();
        let meter = TimeSeries::try_new(index, meter).unwrap();
        (inverters, meter)
    }

    fn classify<const N: usize>(rows: &[([f64; N], f64)]) -> Vec<Vec<bool>> {
        let (inverters, meter) = inputs(rows);
        is_online(&inverters, &meter, Some(&LowLimit::from(10.0))).unwrap().rows().to_vec()
    }

    #[test]
    fn test_all_producing() {
        let mask = classify(&[([100.0, 100.0, 100.0], 300.0)]);
        assert_eq!(mask, [[true, true, true]]);
    }

    #[test]
    fn test_mask_has_the_table_shape() {
        let (inverters, meter) =
            inputs(&[([100.0, 0.0], 100.0), ([0.0, 0.0], 0.0), ([50.0, 50.0], 100.0)]);
        let mask = is_online(&inverters, &meter, Some(&LowLimit::from(10.0))).unwrap();
        assert_eq!(mask.index(), inverters.index());
        assert_eq!(mask.columns(), inverters.columns());
        assert!(mask.rows().iter().all(|row| row.len() == inverters.n_columns()));
    }

    #[test]
    fn test_communication_outage_stays_online() {
        let mask = classify(&[
            ([100.0, 100.0, 100.0], 300.0),
            ([0.0, 0.0, 0.0], 300.0),
        ]);
        assert_eq!(mask, [[true, true, true], [true, true, true]]);
    }

    #[test]
    fn test_communication_outage_without_history() {
        let mask = classify(&[([0.0, 0.0, 0.0], 300.0)]);
        assert_eq!(mask, [[true, true, true]]);
    }

    #[test]
    fn test_single_inverter_down() {
        let mask = classify(&[
            ([100.0, 100.0, 100.0], 300.0),
            ([100.0, 100.0, 100.0], 300.0),
            ([100.0, 100.0, 0.0], 200.0),
        ]);
        assert_eq!(mask[2], [true, true, false]);
        assert_eq!(mask[..2], [[true, true, true], [true, true, true]]);
    }

    #[test]
    fn test_single_inverter_not_reporting() {
        let mask = classify(&[
            ([100.0, 100.0, 100.0], 300.0),
            ([100.0, 100.0, 0.0], 300.0),
        ]);
        assert_eq!(mask[1], [true, true, true]);
    }

    #[test]
    fn test_site_offline() {
        let mask = classify(&[
            ([100.0, 100.0, 100.0], 300.0),
            ([0.0, 0.0, 0.0], 0.0),
        ]);
        assert_eq!(mask[1], [false, false, false]);
    }

    #[test]
    fn test_unequal_sizes_not_reporting() {
        // The large inverter stops reporting while the meter still sees its power:
        let mask = classify(&[
            ([200.0, 100.0, 100.0], 400.0),
            ([200.0, 100.0, 100.0], 400.0),
            ([0.0, 100.0, 100.0], 400.0),
        ]);
        assert_eq!(mask[2], [true, true, true]);
    }

    #[test]
    fn test_unequal_sizes_down() {
        let mask = classify(&[
            ([200.0, 100.0, 100.0], 400.0),
            ([200.0, 100.0, 100.0], 400.0),
            ([0.0, 100.0, 100.0], 200.0),
        ]);
        assert_eq!(mask[2], [false, true, true]);
    }

    #[test]
    fn test_default_threshold() {
        let (inverters, meter) = inputs(&[
            ([1000.0, 1000.0], 2000.0),
            ([1000.0, 0.0], 1000.0),
            ([0.0, 0.0], 0.0),
        ]);
        let mask = is_online(&inverters, &meter, None).unwrap();
        assert_eq!(mask.rows(), [vec![true, true], vec![true, false], vec![false, false]]);
    }

    #[test]
    fn test_per_inverter_threshold() {
        let (inverters, meter) = inputs(&[([100.0, 100.0], 200.0), ([100.0, 30.0], 100.0)]);
        let low_limit =
            LowLimit::PerInverter(HashMap::from([("a".into(), 10.0), ("b".into(), 50.0)]));
        let mask = is_online(&inverters, &meter, Some(&low_limit)).unwrap();
        assert_eq!(mask.rows()[1], [true, false]);
    }

    #[test]
    fn test_misaligned_meter() {
        let (inverters, _) = inputs(&[([100.0], 100.0), ([100.0], 100.0)]);
        let meter = TimeSeries::try_new(hourly_index(1), vec![Some(100.0)]).unwrap();
        assert!(is_online(&inverters, &meter, None).is_err());
    }

    #[test]
    fn test_no_inverters() {
        let (inverters, meter) = inputs::<0>(&[([], 0.0)]);
        assert!(is_online(&inverters, &meter, None).is_err());
    }

    #[test]
    fn test_missing_readings_are_zero() {
        let index = hourly_index(2);
        let inverters = Frame::try_new(
            index.clone(),
            ids(&["a", "b"]),
            vec![vec![Some(100.0), Some(100.0)], vec![None, None]],
        )
        .unwrap();
        let meter = TimeSeries::try_new(index, vec![Some(200.0), None]).unwrap();
        let mask = is_online(&inverters, &meter, Some(&LowLimit::from(10.0))).unwrap();
        assert_eq!(mask.rows()[1], [false, false]);
    }
}
