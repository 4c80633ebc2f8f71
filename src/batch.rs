//! Aligned batch of plant telemetry as stored in JSON.

use std::{fs::File, io::BufReader, path::Path};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    core::frame::{
        DaylightMask,
        ExpectedPowerSeries,
        Frame,
        InverterId,
        InverterPowerTable,
        LostPowerSeries,
        MeterSeries,
        TimeSeries,
        Timestamp,
    },
    prelude::*,
};

#[must_use]
#[derive(Serialize, Deserialize)]
pub struct Batch {
    /// Inverter identifiers, in the order of [`Reading::inverters`].
    pub inverters: Vec<InverterId>,

    pub readings: Vec<Reading>,
}

#[must_use]
#[derive(Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: Timestamp,

    /// Per-inverter power, `null` when not reported.
    pub inverters: Vec<Option<f64>>,

    pub meter: Option<f64>,

    /// Modelled sitewide power, `null` when unavailable.
    pub expected_power: Option<f64>,

    pub is_daylight: bool,
}

/// Batch split into the aligned inputs of the estimation.
#[must_use]
pub struct Inputs {
    pub inverters: InverterPowerTable,
    pub meter: MeterSeries,
    pub expected_power: ExpectedPowerSeries,
    pub is_daylight: DaylightMask,
}

impl Batch {
    pub fn read_from(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse `{}`", path.display()))
    }

    pub fn try_into_inputs(self) -> Result<Inputs> {
        if let Some((position, (previous, next))) = self
            .readings
            .iter()
            .map(|reading| reading.timestamp)
            .tuple_windows()
            .find_position(|(previous, next)| previous >= next)
        {
            let row = position + 1;
            bail!("timestamps must increase, but row #{row} at {next} follows {previous}");
        }

        let index = self.readings.iter().map(|reading| reading.timestamp).collect_vec();
        let meter = self.readings.iter().map(|reading| reading.meter).collect();
        let expected_power = self.readings.iter().map(|reading| reading.expected_power).collect();
        let is_daylight = self.readings.iter().map(|reading| reading.is_daylight).collect();
        let rows = self.readings.into_iter().map(|reading| reading.inverters).collect();
        Ok(Inputs {
            inverters: Frame::try_new(index.clone(), self.inverters, rows)?,
            meter: TimeSeries::try_new(index.clone(), meter)?,
            expected_power: TimeSeries::try_new(index.clone(), expected_power)?,
            is_daylight: TimeSeries::try_new(index, is_daylight)?,
        })
    }
}

/// Lost power at a single timestamp, as written out.
#[derive(Serialize, Deserialize)]
pub struct LostPowerPoint {
    pub timestamp: Timestamp,
    pub lost_power: f64,
}

impl LostPowerSeries {
    pub fn to_points(&self) -> Vec<LostPowerPoint> {
        self.iter()
            .map(|(timestamp, lost_power)| LostPowerPoint { timestamp, lost_power: *lost_power })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"{
        "inverters": ["north", "south"],
        "readings": [
            {
                "timestamp": "2024-06-01T12:00:00+02:00",
                "inverters": [100.0, null],
                "meter": 200.0,
                "expected_power": null,
                "is_daylight": true
            },
            {
                "timestamp": "2024-06-01T12:15:00+02:00",
                "inverters": [90.0, 95.0],
                "meter": null,
                "expected_power": 190.0,
                "is_daylight": true
            }
        ]
    }"#;

    #[test]
    fn test_try_into_inputs() {
        let batch: Batch = serde_json::from_str(BATCH).unwrap();
        let inputs = batch.try_into_inputs().unwrap();
        assert_eq!(inputs.inverters.columns(), [InverterId::from("north"), "south".into()]);
        assert_eq!(inputs.inverters.rows()[0], [Some(100.0), None]);
        assert_eq!(inputs.meter.values(), [Some(200.0), None]);
        assert_eq!(inputs.expected_power.values(), [None, Some(190.0)]);
        assert_eq!(inputs.is_daylight.values(), [true, true]);
    }

    #[test]
    fn test_unordered_timestamps() {
        let mut batch: Batch = serde_json::from_str(BATCH).unwrap();
        batch.readings.reverse();
        assert!(batch.try_into_inputs().is_err());
    }

    #[test]
    fn test_ragged_reading() {
        let mut batch: Batch = serde_json::from_str(BATCH).unwrap();
        batch.readings[1].inverters.pop();
        assert!(batch.try_into_inputs().is_err());
    }
}
