/*
Copyright 2022 Jakub Lewandowski

This file is part of quickdrop.

quickdrop is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

quickdrop is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with quickdrop. If not, see https://www.gnu.org/licenses/.
*/

//! Module with in-memory representations of sonde profiles
//! at each processing stage.
//!
//! Missing values are stored as `NaN` in all float arrays.
//! Variables are kept in ordered maps so that every run
//! writes them in the same order.

use crate::Float;
use chrono::NaiveDateTime;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Format used for writing launch times.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Formats accepted when reading launch times.
const ACCEPTED_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%dT%H%M%S",
];

/// Measurements of one sonde as read from its Level-1 file.
///
/// All variables have shape `(obs, time)`. The `obs` axis is
/// redundant in Level-1 files and usually has length 1.
#[derive(Clone, Debug)]
pub struct SondeProfile {
    pub sonde_id: String,

    /// Elapsed time of each record, `NaN` when missing.
    pub time: Array1<Float>,

    /// Launch time for each observation.
    pub launch_time: Vec<Option<NaiveDateTime>>,

    /// Auxiliary coordinates (eg. position) attached to the time axis.
    pub coords: BTreeMap<String, Array2<Float>>,

    pub variables: BTreeMap<String, Array2<Float>>,
}

impl SondeProfile {
    /// Looks up a variable first among data variables
    /// and then among coordinates.
    pub fn get(&self, name: &str) -> Option<&Array2<Float>> {
        self.variables.get(name).or_else(|| self.coords.get(name))
    }
}

/// Sonde profile interpolated onto the common altitude grid.
#[derive(Clone, Debug)]
pub struct GriddedSonde {
    pub sonde_id: String,
    pub launch_time: Option<NaiveDateTime>,
    pub alt: Array1<Float>,
    pub variables: BTreeMap<String, Array1<Float>>,
}

/// All sondes of a flight on the common altitude grid,
/// stacked along the launch time dimension.
#[derive(Clone, Debug, Default)]
pub struct FlightDataset {
    pub launch_time: Vec<Option<NaiveDateTime>>,
    pub sonde_id: Vec<String>,
    pub alt: Array1<Float>,

    /// Variables of shape `(launch_time, alt)`.
    pub profiles: BTreeMap<String, Array2<Float>>,

    /// Variables with one value per launch.
    pub launch_vars: BTreeMap<String, Array1<Float>>,
}

impl FlightDataset {
    pub fn launch_count(&self) -> usize {
        self.launch_time.len()
    }

    pub fn profile(&self, name: &str) -> Option<&Array2<Float>> {
        self.profiles.get(name)
    }

    pub fn launch_var(&self, name: &str) -> Option<&Array1<Float>> {
        self.launch_vars.get(name)
    }

    /// Returns the dataset with a `(launch_time, alt)` variable added or replaced.
    pub fn with_profile(mut self, name: &str, values: Array2<Float>) -> Self {
        debug_assert_eq!(values.dim(), (self.launch_count(), self.alt.len()));
        self.profiles.insert(name.to_string(), values);
        self
    }

    /// Returns the dataset with a per-launch variable added or replaced.
    pub fn with_launch_var(mut self, name: &str, values: Array1<Float>) -> Self {
        debug_assert_eq!(values.len(), self.launch_count());
        self.launch_vars.insert(name.to_string(), values);
        self
    }
}

pub fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    match timestamp {
        Some(t) => t.format(TIMESTAMP_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Parses launch time, empty string means missing value.
pub fn parse_timestamp(value: &str) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    let value = value.trim().trim_end_matches('Z');

    if value.is_empty() || value.eq_ignore_ascii_case("nat") {
        return Ok(None);
    }

    match NaiveDateTime::parse_from_str(value, ACCEPTED_TIMESTAMP_FORMATS[0]) {
        Ok(t) => Ok(Some(t)),
        Err(err) => ACCEPTED_TIMESTAMP_FORMATS[1..]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .map(Some)
            .ok_or(err),
    }
}
