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

//! Regridding of a single sonde from time records
//! onto the fixed altitude grid.
//!
//! GPS altitude is used as the vertical coordinate as it is
//! available for the whole descent and does not depend on
//! the pressure sensor.

use super::interpolation::interp_linear;
use crate::{
    constants::{ALT, CHECK_VARS, GPS_ALT, TIME},
    dataset::{GriddedSonde, SondeProfile},
    Float,
};
use log::debug;
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;

/// Interpolates an admitted sonde onto `levels`.
///
/// Records without time or altitude, and records where any of the
/// checked variables is missing are dropped before interpolation.
/// Levels outside of the remaining altitude range are filled with `NaN`.
pub fn grid(profile: SondeProfile, levels: &Array1<Float>) -> GriddedSonde {
    let SondeProfile {
        sonde_id,
        time,
        launch_time,
        coords,
        mut variables,
    } = profile;

    debug!("Gridding sonde {}", sonde_id);

    // barometric altitude is replaced by GPS altitude
    variables.remove(ALT);

    let mut coords = coords;
    coords.remove(ALT);

    let timed_records: Vec<usize> = time
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_nan())
        .map(|(i, _)| i)
        .collect();

    let first_obs = |values: &Array2<Float>| -> Array1<Float> {
        match values.outer_iter().next() {
            Some(row) => row.select(Axis(0), &timed_records),
            None => Array1::from_elem(timed_records.len(), Float::NAN),
        }
    };

    let mut records: BTreeMap<String, Array1<Float>> = variables
        .iter()
        .chain(coords.iter())
        .map(|(name, values)| (name.clone(), first_obs(values)))
        .collect();

    records.insert(TIME.to_string(), time.select(Axis(0), &timed_records));

    let altitude = records
        .remove(GPS_ALT)
        .unwrap_or_else(|| Array1::from_elem(timed_records.len(), Float::NAN));

    let mut complete_levels: Vec<usize> = (0..altitude.len())
        .filter(|&i| {
            !altitude[i].is_nan()
                && CHECK_VARS
                    .iter()
                    .all(|var| records.get(*var).map_or(false, |v| !v[i].is_nan()))
        })
        .collect();

    // sondes are falling so records usually come with decreasing altitude
    complete_levels.sort_by(|&a, &b| altitude[a].total_cmp(&altitude[b]));

    let knots = altitude.select(Axis(0), &complete_levels);

    let variables = records
        .into_iter()
        .map(|(name, values)| {
            let values = values.select(Axis(0), &complete_levels);
            let gridded = interp_linear(knots.view(), values.view(), levels.view());
            (name, gridded)
        })
        .collect();

    GriddedSonde {
        sonde_id,
        launch_time: launch_time.first().copied().flatten(),
        alt: levels.clone(),
        variables,
    }
}
