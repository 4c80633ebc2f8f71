#![allow(clippy::doc_markdown)]

//! Photovoltaic plant downtime detection and lost production estimation.
//!
//! The pipeline has two steps sharing one time axis:
//!
//! 1. [`is_online`] infers, per timestamp and per inverter, whether the inverter is actually
//!    producing, telling real outages apart from communication gaps with help of the plant meter.
//! 2. [`downtime_loss`] turns that mask into the power lost to downtime, falling back to the
//!    expected power or a [`ProductionProfile`] when no inverter signal is usable.

pub mod batch;
pub mod core;
pub mod fmt;
pub mod prelude;
pub mod quantity;
pub mod statistics;
pub mod tables;

pub use crate::core::{
    availability::is_online,
    frame::{Frame, InverterId, InverterPowerTable, OnlineMask, TimeSeries, Timestamp},
    loss::{DowntimeLoss, downtime_loss},
    profile::{ProductionProfile, ProfileKey, profile_to_signal, signal_to_profile},
    threshold::{LowLimit, derive_default_threshold},
};
