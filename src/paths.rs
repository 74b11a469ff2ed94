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

//! Module deriving all paths of a single flight
//! from the main data directory and the flight date.
//!
//! The flight directory is expected to be named with the
//! date of the flight in `YYYYMMDD` format. When the flight
//! covers midnight, the date of take-off should be used.

use crate::{configuration::DataFormat, errors::QuickdropError};
use chrono::NaiveDate;
use log::{error, info};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Identifier of a flight, its date in `YYYYMMDD` format.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FlightId {
    label: String,
    date: NaiveDate,
}

impl FlightId {
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl FromStr for FlightId {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, "%Y%m%d")?;

        Ok(FlightId {
            label: s.to_string(),
            date,
        })
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Paths of one flight.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FlightPaths {
    flight: FlightId,
    flight_dir: PathBuf,
    l1_dir: PathBuf,
    campaign_prefix: String,
}

impl FlightPaths {
    pub fn new(main_dir: &Path, flight: FlightId, campaign_prefix: &str) -> Self {
        let flight_dir = main_dir.join(flight.to_string());
        let l1_dir = flight_dir.join("Level_1");

        info!(
            "Created paths instance: Main: {}; Flight: {}",
            main_dir.display(),
            flight
        );

        FlightPaths {
            flight,
            flight_dir,
            l1_dir,
            campaign_prefix: campaign_prefix.to_string(),
        }
    }

    pub fn flight(&self) -> &FlightId {
        &self.flight
    }

    pub fn flight_dir(&self) -> &Path {
        &self.flight_dir
    }

    /// Directory with quality-controlled files of individual sondes.
    pub fn l1_dir(&self) -> &Path {
        &self.l1_dir
    }

    /// Name of a quicklook image of given kind.
    pub fn quicklook_name(&self, kind: &str) -> String {
        format!("{}_{}_{}.png", self.campaign_prefix, kind, self.flight)
    }

    /// Directory for quicklooks, created if it does not exist.
    pub fn quickplot_dir(&self) -> Result<PathBuf, std::io::Error> {
        let qp_path = self.flight_dir.join("Quickplots");

        if qp_path.is_dir() {
            info!("Path exists: {}", qp_path.display());
        } else {
            fs::create_dir_all(&qp_path)?;
            info!(
                "Path did not exist. Created directory: {}",
                qp_path.display()
            );
        }

        Ok(qp_path)
    }

    /// Where the gridded flight file is (or will be) stored.
    pub fn quickgrid_target(&self, format: DataFormat) -> PathBuf {
        self.flight_dir.join(format!(
            "{}_quickgrid_{}.{}",
            self.campaign_prefix,
            self.flight,
            format.extension()
        ))
    }

    /// Path of an already existing gridded flight file.
    pub fn quickgrid_file(&self, format: DataFormat) -> Result<PathBuf, QuickdropError> {
        let qg_path = self.quickgrid_target(format);

        if qg_path.is_file() {
            info!("File found: {}", qg_path.display());
            Ok(qg_path)
        } else {
            error!("File Not Found: {}. Raising exception", qg_path.display());
            Err(QuickdropError::MissingGriddedFile(qg_path))
        }
    }
}
