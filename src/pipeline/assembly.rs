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

//! Concatenation of gridded sondes into the flight dataset.

use crate::{
    dataset::{FlightDataset, GriddedSonde},
    errors::AssemblyError,
    Float,
};
use log::warn;
use ndarray::Array2;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Stacks gridded sondes along a new launch time dimension,
/// keeping the order in which they are provided.
///
/// Variables present only in some of the sondes are kept
/// and filled with `NaN` for the remaining ones.
pub fn assemble(sondes: Vec<GriddedSonde>) -> Result<FlightDataset, AssemblyError> {
    let alt = match sondes.first() {
        Some(first) => first.alt.clone(),
        None => return Err(AssemblyError::NoSondes),
    };

    if let Some(odd) = sondes.iter().find(|s| s.alt != alt) {
        return Err(AssemblyError::AltitudeMismatch(odd.sonde_id.clone()));
    }

    let names: FxHashSet<&String> = sondes.iter().flat_map(|s| s.variables.keys()).collect();

    let mut profiles = BTreeMap::new();

    for name in names {
        let mut stacked = Array2::from_elem((sondes.len(), alt.len()), Float::NAN);

        for (mut row, sonde) in stacked.outer_iter_mut().zip(&sondes) {
            match sonde.variables.get(name) {
                Some(values) => row.assign(values),
                None => warn!(
                    "Variable {} is missing in sonde {}, filling with NaN",
                    name, sonde.sonde_id
                ),
            }
        }

        profiles.insert(name.clone(), stacked);
    }

    Ok(FlightDataset {
        launch_time: sondes.iter().map(|s| s.launch_time).collect(),
        sonde_id: sondes.iter().map(|s| s.sonde_id.clone()).collect(),
        alt,
        profiles,
        launch_vars: BTreeMap::new(),
    })
}
