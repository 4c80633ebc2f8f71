use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        frame::{InverterId, InverterPowerTable},
        series::Aggregate,
    },
    prelude::*,
};

/// Share of the high quantile an inverter must exceed to count as clearly producing.
pub const DEFAULT_THRESHOLD_FACTOR: f64 = 0.01;

/// Quantile of an inverter's power used as its nameplate proxy.
pub const DEFAULT_THRESHOLD_QUANTILE: f64 = 0.99;

/// Power level below which an inverter is «not clearly producing».
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LowLimit {
    /// The same threshold for every inverter.
    Scalar(f64),

    /// Individual threshold per inverter. Every inverter of the table must be present.
    PerInverter(HashMap<InverterId, f64>),
}

impl From<f64> for LowLimit {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl LowLimit {
    /// Resolve the thresholds in the column order of `columns`.
    pub fn try_resolve(&self, columns: &[InverterId]) -> Result<Vec<f64>> {
        match self {
            Self::Scalar(value) => Ok(vec![*value; columns.len()]),
            Self::PerInverter(limits) => columns
                .iter()
                .map(|id| {
                    limits
                        .get(id)
                        .copied()
                        .with_context(|| format!("no low limit is given for inverter `{id}`"))
                })
                .collect(),
        }
    }
}

/// Default thresholds: 1% of each inverter's 99th percentile power.
///
/// Missing readings count as zero, the same way the classifier sees them.
#[instrument(skip_all, fields(n_inverters = inverters.n_columns()))]
pub fn derive_default_threshold(inverters: &InverterPowerTable) -> LowLimit {
    let limits = inverters
        .columns()
        .iter()
        .enumerate()
        .map(|(column, id)| {
            let quantile = inverters
                .column(column)
                .map(|value| value.unwrap_or(0.0))
                .quantile(DEFAULT_THRESHOLD_QUANTILE)
                .unwrap_or(0.0);
            trace!(inverter = %id, quantile, "derived the threshold");
            (id.clone(), DEFAULT_THRESHOLD_FACTOR * quantile)
        })
        .collect();
    LowLimit::PerInverter(limits)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::frame::{
        Frame,
        tests::{hourly_index, ids},
    };

    #[test]
    fn test_scalar_resolves_for_every_inverter() {
        let limits = LowLimit::from(10.0).try_resolve(&ids(&["a", "b", "c"])).unwrap();
        assert_eq!(limits, [10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_mapping_follows_column_order() {
        let limit = LowLimit::PerInverter(HashMap::from([("a".into(), 1.0), ("b".into(), 2.0)]));
        assert_eq!(limit.try_resolve(&ids(&["b", "a"])).unwrap(), [2.0, 1.0]);
    }

    #[test]
    fn test_missing_mapping_entry_is_an_error() {
        let limit = LowLimit::PerInverter(HashMap::from([("a".into(), 1.0)]));
        assert!(limit.try_resolve(&ids(&["a", "b"])).is_err());
    }

    #[test]
    fn test_derive_default_threshold() {
        let rows = (0..101).map(|i| vec![Some(f64::from(i) * 10.0), None]).collect();
        let inverters = Frame::try_new(hourly_index(101), ids(&["a", "b"]), rows).unwrap();
        let limits = derive_default_threshold(&inverters).try_resolve(inverters.columns()).unwrap();
        assert_abs_diff_eq!(limits[0], 9.9, epsilon = 1e-9);
        assert_abs_diff_eq!(limits[1], 0.0);
    }
}
