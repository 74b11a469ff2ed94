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

//! CSV rendition of sonde and flight files.
//!
//! Sonde file has one row per record with `time` (elapsed seconds),
//! `launch_time` and one column per variable. Flight file has one row
//! per launch and altitude level with `launch_time`, `sonde_id`, `alt`,
//! one column per profile variable and one `name[launch_time]` column
//! per launch variable. Empty cells and `NaN` mark missing values.

use crate::{
    constants::{ALT, LAUNCH_TIME, SONDE_ID, TIME},
    dataset::{format_timestamp, parse_timestamp, FlightDataset, SondeProfile},
    errors::{InputError, OutputError},
    Float,
};
use ndarray::{Array1, Array2};
use std::{collections::BTreeMap, path::Path};

/// Marks columns with one value per launch.
const LAUNCH_DIM_SUFFIX: &str = "[launch_time]";

fn parse_value(value: &str) -> Option<Float> {
    if value.is_empty() {
        Some(Float::NAN)
    } else {
        value.parse().ok()
    }
}

pub(super) fn read_sonde(path: &Path, sonde_id: &str) -> Result<SondeProfile, InputError> {
    let file = path.display().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();

    let time_col = headers
        .iter()
        .position(|h| h == TIME)
        .ok_or_else(|| InputError::MissingVariable {
            file: file.clone(),
            variable: TIME,
        })?;
    let launch_col = headers.iter().position(|h| h == LAUNCH_TIME);

    let mut time = Vec::new();
    let mut launch_time = None;
    let mut columns: Vec<Vec<Float>> = vec![vec![]; headers.len()];

    for record in reader.records() {
        let record = record?;

        for (i, value) in record.iter().enumerate() {
            if Some(i) == launch_col {
                if launch_time.is_none() {
                    launch_time = parse_timestamp(value).map_err(|_| InputError::BadTimestamp {
                        file: file.clone(),
                        value: value.to_string(),
                    })?;
                }
                continue;
            }

            let parsed = parse_value(value).ok_or_else(|| InputError::NotANumber {
                file: file.clone(),
                column: headers[i].to_string(),
                value: value.to_string(),
            })?;

            if i == time_col {
                time.push(parsed);
            } else {
                columns[i].push(parsed);
            }
        }
    }

    let records_count = time.len();
    let mut variables = BTreeMap::new();

    for (i, values) in columns.into_iter().enumerate() {
        if i == time_col || Some(i) == launch_col {
            continue;
        }

        let values = Array2::from_shape_vec((1, records_count), values).map_err(|_| {
            InputError::IncorrectShape {
                file: file.clone(),
                variable: headers[i].to_string(),
            }
        })?;

        variables.insert(headers[i].to_string(), values);
    }

    Ok(SondeProfile {
        sonde_id: sonde_id.to_string(),
        time: Array1::from_vec(time),
        launch_time: vec![launch_time],
        coords: BTreeMap::new(),
        variables,
    })
}

pub(super) fn write_flight(flight: &FlightDataset, path: &Path) -> Result<(), OutputError> {
    let mut out_file = csv::Writer::from_path(path)?;

    let mut header = vec![LAUNCH_TIME.to_string(), SONDE_ID.to_string(), ALT.to_string()];
    header.extend(flight.profiles.keys().cloned());
    header.extend(
        flight
            .launch_vars
            .keys()
            .map(|name| format!("{}{}", name, LAUNCH_DIM_SUFFIX)),
    );

    out_file.write_record(&header)?;

    for launch in 0..flight.launch_count() {
        let launch_time = format_timestamp(flight.launch_time[launch]);

        for (level, alt) in flight.alt.iter().enumerate() {
            let mut record = vec![
                launch_time.clone(),
                flight.sonde_id[launch].clone(),
                alt.to_string(),
            ];

            record.extend(
                flight
                    .profiles
                    .values()
                    .map(|values| values[[launch, level]].to_string()),
            );
            record.extend(
                flight
                    .launch_vars
                    .values()
                    .map(|values| values[launch].to_string()),
            );

            out_file.write_record(&record)?;
        }
    }

    out_file.flush()?;

    Ok(())
}

pub(super) fn read_flight(path: &Path) -> Result<FlightDataset, OutputError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| OutputError::Malformed(format!("column {} is missing", name)))
    };

    let launch_col = position(LAUNCH_TIME)?;
    let sonde_col = position(SONDE_ID)?;
    let alt_col = position(ALT)?;

    let value_cols: Vec<usize> = (0..headers.len())
        .filter(|i| ![launch_col, sonde_col, alt_col].contains(i))
        .collect();

    let mut launch_time = vec![];
    let mut sonde_id: Vec<String> = vec![];
    let mut alt: Vec<Float> = vec![];
    let mut values: Vec<Vec<Float>> = vec![vec![]; headers.len()];

    for record in reader.records() {
        let record = record?;

        if sonde_id.last().map(String::as_str) != Some(&record[sonde_col]) {
            let timestamp = parse_timestamp(&record[launch_col])
                .map_err(|err| OutputError::Malformed(err.to_string()))?;

            launch_time.push(timestamp);
            sonde_id.push(record[sonde_col].to_string());
        }

        let parse = |i: usize| {
            parse_value(&record[i]).ok_or_else(|| {
                OutputError::Malformed(format!("{} is not a number", &record[i]))
            })
        };

        if sonde_id.len() == 1 {
            alt.push(parse(alt_col)?);
        }

        for &i in &value_cols {
            values[i].push(parse(i)?);
        }
    }

    let shape = (sonde_id.len(), alt.len());

    let mut profiles = BTreeMap::new();
    let mut launch_vars = BTreeMap::new();

    for i in value_cols {
        let column = std::mem::take(&mut values[i]);

        let to_malformed =
            |_| OutputError::Malformed(format!("column {} has inconsistent length", &headers[i]));

        match headers[i].strip_suffix(LAUNCH_DIM_SUFFIX) {
            Some(name) => {
                // repeated on every level, first level holds the value
                let per_launch: Array1<Float> =
                    column.iter().step_by(shape.1.max(1)).copied().collect();

                if per_launch.len() != shape.0 {
                    return Err(OutputError::Malformed(format!(
                        "column {} has inconsistent length",
                        &headers[i]
                    )));
                }

                launch_vars.insert(name.to_string(), per_launch);
            }
            None => {
                let profile = Array2::from_shape_vec(shape, column).map_err(to_malformed)?;
                profiles.insert(headers[i].to_string(), profile);
            }
        }
    }

    Ok(FlightDataset {
        launch_time,
        sonde_id,
        alt: Array1::from_vec(alt),
        profiles,
        launch_vars,
    })
}
