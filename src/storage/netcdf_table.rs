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

//! netCDF rendition of sonde and flight files.
//!
//! Times are stored as floating point seconds with the reference
//! epoch given in `units` attribute. Sonde identifiers of the flight
//! are kept in a global attribute, separated by commas.

use super::mixing_ratio_factor;
use crate::{
    constants::{ALT, LAUNCH_TIME, MIXING_RATIO, TIME},
    dataset::{parse_timestamp, FlightDataset, SondeProfile},
    errors::{InputError, OutputError},
    Float,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use ndarray::{Array1, Array2};
use netcdf::AttributeValue;
use std::{collections::BTreeMap, path::Path};

const OBS_DIM: &str = "obs";
const SONDE_IDS_ATTR: &str = "sonde_ids";
const EPOCH_UNITS: &str = "seconds since 1970-01-01 00:00:00";

fn epoch() -> NaiveDateTime {
    NaiveDateTime::from_timestamp_opt(0, 0).unwrap_or_default()
}

/// Reference time from CF units like `seconds since 2022-03-12 10:00:00`.
fn reference_time(units: &str) -> Option<NaiveDateTime> {
    let reference = units.trim().strip_prefix("seconds since")?.trim();

    match parse_timestamp(reference) {
        Ok(Some(t)) => Some(t),
        _ => NaiveDate::parse_from_str(reference, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
    }
}

fn to_timestamp(reference: NaiveDateTime, seconds: Float) -> Option<NaiveDateTime> {
    if seconds.is_finite() {
        Some(reference + Duration::microseconds((seconds * 1e6).round() as i64))
    } else {
        None
    }
}

fn to_seconds(timestamp: Option<NaiveDateTime>) -> Float {
    match timestamp {
        Some(t) => (t - epoch()).num_microseconds().unwrap_or(i64::MAX) as Float / 1e6,
        None => Float::NAN,
    }
}

fn float_attribute(var: &netcdf::Variable, name: &str) -> Option<Float> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(v as Float),
        AttributeValue::Int(v) => Some(v as Float),
        AttributeValue::Short(v) => Some(v as Float),
        _ => None,
    }
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Reads all values as floats with fill values replaced by `NaN`.
fn masked_values(var: &netcdf::Variable) -> Result<Vec<Float>, netcdf::Error> {
    let fill = float_attribute(var, "_FillValue");
    let missing = float_attribute(var, "missing_value");

    let mut values = var.get_values::<Float, _>(..)?;

    for v in values.iter_mut() {
        if Some(*v) == fill || Some(*v) == missing {
            *v = Float::NAN;
        }
    }

    Ok(values)
}

pub(super) fn read_sonde(path: &Path, sonde_id: &str) -> Result<SondeProfile, InputError> {
    let file = path.display().to_string();
    let nc = netcdf::open(path)?;

    let time_var = nc.variable(TIME).ok_or_else(|| InputError::MissingVariable {
        file: file.clone(),
        variable: TIME,
    })?;
    let time = Array1::from_vec(masked_values(&time_var)?);

    let launch_time = match nc.variable(LAUNCH_TIME) {
        Some(var) => {
            let units = string_attribute(&var, "units").unwrap_or_default();
            let reference = reference_time(&units).ok_or_else(|| InputError::BadTimestamp {
                file: file.clone(),
                value: units.clone(),
            })?;

            masked_values(&var)?
                .into_iter()
                .map(|s| to_timestamp(reference, s))
                .collect()
        }
        None => vec![None],
    };

    let obs_count = launch_time.len();
    let records_count = time.len();

    let mut coord_names = vec![];
    let mut coords = BTreeMap::new();
    let mut variables = BTreeMap::new();

    for var in nc.variables() {
        let name = var.name();

        if name == TIME || name == LAUNCH_TIME {
            continue;
        }

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let dims: Vec<&str> = dims.iter().map(String::as_str).collect();

        let shape_err = || InputError::IncorrectShape {
            file: file.clone(),
            variable: name.clone(),
        };

        let mut values = match dims.as_slice() {
            [TIME] => Array2::from_shape_vec((1, records_count), masked_values(&var)?)
                .map_err(|_| shape_err())?,
            [OBS_DIM, TIME] => {
                Array2::from_shape_vec((obs_count, records_count), masked_values(&var)?)
                    .map_err(|_| shape_err())?
            }
            [TIME, OBS_DIM] => {
                Array2::from_shape_vec((records_count, obs_count), masked_values(&var)?)
                    .map_err(|_| shape_err())?
                    .reversed_axes()
            }
            [OBS_DIM] => {
                warn!("Skipping per-launch variable {} in {}", name, file);
                continue;
            }
            _ => {
                debug!("Skipping variable {} with dimensions {:?}", name, dims);
                continue;
            }
        };

        if name == MIXING_RATIO {
            if let Some(units) = string_attribute(&var, "units") {
                match mixing_ratio_factor(&units) {
                    Some(factor) => values.mapv_inplace(|w| w * factor),
                    None => warn!(
                        "Unrecognised units {:?} of {} in {}, assuming kg/kg",
                        units, name, file
                    ),
                }
            }
        }

        if let Some(listed) = string_attribute(&var, "coordinates") {
            coord_names.extend(listed.split_whitespace().map(str::to_string));
        }

        variables.insert(name, values);
    }

    for name in coord_names {
        if let Some(values) = variables.remove(&name) {
            coords.insert(name, values);
        }
    }

    Ok(SondeProfile {
        sonde_id: sonde_id.to_string(),
        time,
        launch_time,
        coords,
        variables,
    })
}

pub(super) fn write_flight(flight: &FlightDataset, path: &Path) -> Result<(), OutputError> {
    let mut nc = netcdf::create(path)?;

    nc.add_dimension(LAUNCH_TIME, flight.launch_count())?;
    nc.add_dimension(ALT, flight.alt.len())?;

    nc.add_attribute(SONDE_IDS_ATTR, flight.sonde_id.join(",").as_str())?;

    let launch_seconds: Vec<Float> = flight.launch_time.iter().map(|&t| to_seconds(t)).collect();

    let mut var = nc.add_variable::<Float>(LAUNCH_TIME, &[LAUNCH_TIME])?;
    var.put_attribute("units", EPOCH_UNITS)?;
    var.put_values(&launch_seconds, ..)?;

    let mut var = nc.add_variable::<Float>(ALT, &[ALT])?;
    var.put_attribute("units", "m")?;
    var.put_values(&flight.alt.to_vec(), ..)?;

    for (name, values) in &flight.profiles {
        let values: Vec<Float> = values.iter().copied().collect();

        let mut var = nc.add_variable::<Float>(name, &[LAUNCH_TIME, ALT])?;
        var.put_values(&values, ..)?;
    }

    for (name, values) in &flight.launch_vars {
        let values: Vec<Float> = values.to_vec();

        let mut var = nc.add_variable::<Float>(name, &[LAUNCH_TIME])?;
        var.put_values(&values, ..)?;
    }

    Ok(())
}

pub(super) fn read_flight(path: &Path) -> Result<FlightDataset, OutputError> {
    let nc = netcdf::open(path)?;

    let required = |name: &str| {
        nc.variable(name)
            .ok_or_else(|| OutputError::Malformed(format!("variable {} is missing", name)))
    };

    let launch_var = required(LAUNCH_TIME)?;
    let units = string_attribute(&launch_var, "units").unwrap_or_default();
    let reference = reference_time(&units).unwrap_or_else(|| {
        warn!("Unrecognised launch time units {:?}, assuming Unix epoch", units);
        epoch()
    });

    let launch_time: Vec<Option<NaiveDateTime>> = masked_values(&launch_var)?
        .into_iter()
        .map(|s| to_timestamp(reference, s))
        .collect();

    let alt = Array1::from_vec(masked_values(&required(ALT)?)?);

    let sonde_id: Vec<String> = match nc.attribute(SONDE_IDS_ATTR) {
        Some(attr) => match attr.value()? {
            AttributeValue::Str(ids) if !ids.is_empty() => {
                ids.split(',').map(str::to_string).collect()
            }
            _ => vec![],
        },
        None => vec![],
    };

    if sonde_id.len() != launch_time.len() {
        return Err(OutputError::Malformed(format!(
            "{} sonde identifiers for {} launches",
            sonde_id.len(),
            launch_time.len()
        )));
    }

    let shape = (launch_time.len(), alt.len());

    let mut profiles = BTreeMap::new();
    let mut launch_vars = BTreeMap::new();

    for var in nc.variables() {
        let name = var.name();

        if name == LAUNCH_TIME || name == ALT {
            continue;
        }

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let values = masked_values(&var)?;
        let malformed = || OutputError::Malformed(format!("variable {} has unexpected shape", name));

        if dims == [LAUNCH_TIME, ALT] {
            let values = Array2::from_shape_vec(shape, values).map_err(|_| malformed())?;
            profiles.insert(name, values);
        } else if dims == [LAUNCH_TIME] {
            launch_vars.insert(name, Array1::from_vec(values));
        } else {
            return Err(malformed());
        }
    }

    Ok(FlightDataset {
        launch_time,
        sonde_id,
        alt,
        profiles,
        launch_vars,
    })
}
