use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        frame::{TimeSeries, Timestamp},
        series::Aggregate,
    },
    prelude::*,
};

/// Calendar slot of the typical production profile.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ProfileKey {
    /// Hour of day, `0..=23`.
    pub hour: u32,

    /// Calendar month, `1..=12`.
    pub month: u32,
}

impl ProfileKey {
    pub fn of(timestamp: &Timestamp) -> Self {
        Self { hour: timestamp.hour(), month: timestamp.month() }
    }
}

/// Typical production by hour of day and month.
///
/// Stored as an explicit `(hour, month) → value` lookup, so that a sparse profile
/// simply has no entry for the slots it has never observed.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileFile", into = "ProfileFile")]
pub struct ProductionProfile(BTreeMap<ProfileKey, f64>);

impl ProductionProfile {
    /// Build the complete profile from a 24-row (hour) by 12-column (month) matrix.
    pub fn from_matrix(matrix: &[[f64; 12]; 24]) -> Self {
        let slots = (0_u32..)
            .zip(matrix)
            .flat_map(|(hour, row)| {
                (1_u32..).zip(row).map(move |(month, value)| (ProfileKey { hour, month }, *value))
            })
            .collect();
        Self(slots)
    }

    pub fn get(&self, key: ProfileKey) -> Option<f64> {
        self.0.get(&key).copied()
    }

    pub fn insert(&mut self, key: ProfileKey, value: f64) -> Result {
        ensure!(key.hour < 24, "hour must be within `0..=23`, got {}", key.hour);
        ensure!((1..=12).contains(&key.month), "month must be within `1..=12`, got {}", key.month);
        self.0.insert(key, value);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProfileKey, f64)> + '_ {
        self.0.iter().map(|(key, value)| (*key, *value))
    }
}

/// Broadcast the profile onto the time axis.
///
/// Every timestamp gets the value of its `(hour, month)` slot, or `None` when the profile
/// has no such slot.
pub fn profile_to_signal(
    profile: &ProductionProfile,
    index: &[Timestamp],
) -> TimeSeries<Option<f64>> {
    index.iter().map(|timestamp| (*timestamp, profile.get(ProfileKey::of(timestamp)))).collect()
}

/// Reduce the series to the mean value of each `(hour, month)` slot present in it.
///
/// Missing values are skipped; slots without any value are left out.
#[instrument(skip_all, fields(n_points = signal.len()))]
pub fn signal_to_profile(signal: &TimeSeries<Option<f64>>) -> ProductionProfile {
    let slots: BTreeMap<ProfileKey, f64> = signal
        .iter()
        .filter_map(|(timestamp, value)| value.map(|value| (ProfileKey::of(&timestamp), value)))
        .into_group_map()
        .into_iter()
        .filter_map(|(key, values)| values.mean().map(|mean| (key, mean)))
        .collect();
    debug!(n_slots = slots.len(), "aggregated");
    ProductionProfile(slots)
}

/// On-disk representation: a flat list of slots.
#[derive(Serialize, Deserialize)]
struct ProfileFile {
    #[serde(rename = "slot", default)]
    slots: Vec<ProfileSlot>,
}

#[derive(Serialize, Deserialize)]
struct ProfileSlot {
    hour: u32,
    month: u32,
    value: f64,
}

impl TryFrom<ProfileFile> for ProductionProfile {
    type Error = Error;

    fn try_from(file: ProfileFile) -> Result<Self> {
        let mut this = Self::default();
        for slot in file.slots {
            this.insert(ProfileKey { hour: slot.hour, month: slot.month }, slot.value)?;
        }
        Ok(this)
    }
}

impl From<ProductionProfile> for ProfileFile {
    fn from(profile: ProductionProfile) -> Self {
        let slots = profile
            .iter()
            .map(|(key, value)| ProfileSlot { hour: key.hour, month: key.month, value })
            .collect();
        Self { slots }
    }
}
