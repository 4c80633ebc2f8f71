use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Timestamps keep their offset: hour of day and month are read in it.
pub type Timestamp = DateTime<FixedOffset>;

pub type InverterPowerTable = Frame<Option<f64>>;
pub type OnlineMask = Frame<bool>;
pub type MeterSeries = TimeSeries<Option<f64>>;
pub type ExpectedPowerSeries = TimeSeries<Option<f64>>;
pub type DaylightMask = TimeSeries<bool>;
pub type LostPowerSeries = TimeSeries<f64>;

#[derive(
    Clone,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct InverterId(String);

impl From<&str> for InverterId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// One-dimensional series over the time axis.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries<V> {
    index: Vec<Timestamp>,
    values: Vec<V>,
}

impl<V> TimeSeries<V> {
    pub fn try_new(index: Vec<Timestamp>, values: Vec<V>) -> Result<Self> {
        ensure!(
            index.len() == values.len(),
            "the series has {} timestamps but {} values",
            index.len(),
            values.len(),
        );
        Ok(Self { index, values })
    }

    #[must_use]
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    #[must_use]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &V)> {
        self.index.iter().copied().zip(&self.values)
    }

    pub fn map<U>(&self, f: impl FnMut(&V) -> U) -> TimeSeries<U> {
        TimeSeries { index: self.index.clone(), values: self.values.iter().map(f).collect() }
    }

    pub fn ensure_aligned(&self, index: &[Timestamp], name: &str) -> Result {
        ensure_same_index(&self.index, index, name)
    }
}

impl TimeSeries<Option<f64>> {
    /// Missing readings count as zero production.
    #[must_use]
    pub fn zero_filled(&self) -> Vec<f64> {
        self.values.iter().map(|value| value.unwrap_or(0.0)).collect()
    }
}

impl<V> FromIterator<(Timestamp, V)> for TimeSeries<V> {
    fn from_iter<T: IntoIterator<Item = (Timestamp, V)>>(iterator: T) -> Self {
        let (index, values) = iterator.into_iter().unzip();
        Self { index, values }
    }
}

/// Two-dimensional table: rows follow the time axis, columns are the inverters.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<V> {
    index: Vec<Timestamp>,
    columns: Vec<InverterId>,
    rows: Vec<Vec<V>>,
}

impl<V> Frame<V> {
    pub fn try_new(
        index: Vec<Timestamp>,
        columns: Vec<InverterId>,
        rows: Vec<Vec<V>>,
    ) -> Result<Self> {
        ensure!(
            index.len() == rows.len(),
            "the table has {} timestamps but {} rows",
            index.len(),
            rows.len(),
        );
        if let Some((position, row)) = rows.iter().find_position(|row| row.len() != columns.len()) {
            bail!(
                "row #{position} at {} has {} values but there are {} inverters",
                index[position],
                row.len(),
                columns.len(),
            );
        }
        if let Some(duplicate) = columns.iter().duplicates().next() {
            bail!("inverter `{duplicate}` is listed more than once");
        }
        Ok(Self { index, columns, rows })
    }

    /// Build a frame whose shape is guaranteed by the caller.
    pub(crate) const fn from_parts(
        index: Vec<Timestamp>,
        columns: Vec<InverterId>,
        rows: Vec<Vec<V>>,
    ) -> Self {
        Self { index, columns, rows }
    }

    #[must_use]
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    #[must_use]
    pub fn columns(&self) -> &[InverterId] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<V>] {
        &self.rows
    }

    #[must_use]
    pub const fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a single inverter over the time axis.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &V> {
        self.rows.iter().map(move |row| &row[column])
    }

    pub fn ensure_aligned(&self, index: &[Timestamp], name: &str) -> Result {
        ensure_same_index(&self.index, index, name)
    }
}

impl<V: Clone> Frame<V> {
    /// Reorder the columns to match `columns`, which must be the same set of inverters.
    pub fn try_reindex_columns(&self, columns: &[InverterId]) -> Result<Self> {
        let positions: HashMap<&InverterId, usize> =
            self.columns.iter().enumerate().map(|(position, id)| (id, position)).collect();
        let expected: HashSet<&InverterId> = columns.iter().collect();
        if let Some(extra) = self.columns.iter().find(|id| !expected.contains(id)) {
            bail!("inverter `{extra}` is not expected here");
        }
        let order = columns
            .iter()
            .map(|id| {
                positions.get(id).copied().with_context(|| format!("inverter `{id}` is missing"))
            })
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| order.iter().map(|position| row[*position].clone()).collect())
            .collect();
        Ok(Self { index: self.index.clone(), columns: columns.to_vec(), rows })
    }
}

impl Frame<Option<f64>> {
    /// Missing readings count as zero production.
    #[must_use]
    pub fn zero_filled(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|value| value.unwrap_or(0.0)).collect())
            .collect()
    }
}

fn ensure_same_index(actual: &[Timestamp], expected: &[Timestamp], name: &str) -> Result {
    ensure!(
        actual.len() == expected.len(),
        "`{name}` has {} timestamps but the inverter table has {}",
        actual.len(),
        expected.len(),
    );
    if let Some((position, (lhs, rhs))) =
        actual.iter().zip(expected).find_position(|(lhs, rhs)| lhs != rhs)
    {
        bail!("`{name}` is misaligned at row #{position}: {lhs} vs. {rhs}");
    }
    Ok(())
}
