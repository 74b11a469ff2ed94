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

//! Module responsible for parsing and checking the configuration file.
//!
//! The configuration file uses [YAML](https://en.wikipedia.org/wiki/YAML)
//! and `serde` to enforce strong typing and automatic type checking.
//! Every field is optional, so running without configuration file
//! reproduces the standard quicklook processing of a flight.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside the configuration file.

use crate::errors::ConfigError;
use crate::Float;
use serde::Deserialize;
use std::{fs, path::Path};

/// Upper limit on the number of grid levels.
const MAX_LEVELS: usize = 1_000_000;

/// Fields describing the vertical grid onto which
/// all sondes are interpolated.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Grid {
    /// _(Optional)_ Top of the grid in meters.
    ///
    /// Cannot be negative. Defaults to `14000`.
    #[serde(default = "Grid::default_max_alt")]
    pub max_alt: Float,

    /// _(Optional)_ Distance between grid levels in meters.
    ///
    /// Must be positive and not larger than `max_alt`
    /// (unless `max_alt` is `0`). Defaults to `10`.
    #[serde(default = "Grid::default_vertical_spacing")]
    pub vertical_spacing: Float,
}

impl Grid {
    fn default_max_alt() -> Float {
        14_000.0
    }

    fn default_vertical_spacing() -> Float {
        10.0
    }

    /// Checks if the grid can be constructed.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !self.max_alt.is_finite() || self.max_alt < 0.0 {
            return Err(ConfigError::OutOfBounds(
                "Maximum altitude must be a finite, non-negative number",
            ));
        }

        if !self.vertical_spacing.is_finite() || self.vertical_spacing <= 0.0 {
            return Err(ConfigError::OutOfBounds(
                "Vertical spacing must be a finite, positive number",
            ));
        }

        if self.max_alt > 0.0 && self.vertical_spacing > self.max_alt {
            return Err(ConfigError::OutOfBounds(
                "Vertical spacing cannot be larger than maximum altitude",
            ));
        }

        if self.max_alt / self.vertical_spacing >= MAX_LEVELS as Float {
            return Err(ConfigError::OutOfBounds(
                "Grid cannot have more than 1000000 levels, increase vertical spacing",
            ));
        }

        Ok(())
    }

    /// Altitudes of the grid levels: `0, spacing, 2*spacing, ..., max_alt`.
    ///
    /// Levels are computed as multiples of the spacing, so they
    /// are bit-identical between runs and between sondes.
    pub fn levels(&self) -> Vec<Float> {
        let count = (self.max_alt / self.vertical_spacing + 1e-9).floor() as usize + 1;

        (0..count)
            .map(|i| i as Float * self.vertical_spacing)
            .collect()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid {
            max_alt: Grid::default_max_alt(),
            vertical_spacing: Grid::default_vertical_spacing(),
        }
    }
}

/// Supported formats of sonde and gridded files.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Netcdf,
}

impl DataFormat {
    /// Extension of the gridded flight file.
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Netcdf => "nc",
        }
    }

    fn check_available(&self) -> Result<(), ConfigError> {
        match self {
            DataFormat::Csv => Ok(()),
            DataFormat::Netcdf if cfg!(feature = "netcdf") => Ok(()),
            DataFormat::Netcdf => Err(ConfigError::FormatUnavailable("netcdf")),
        }
    }
}

impl Default for DataFormat {
    fn default() -> Self {
        DataFormat::Csv
    }
}

/// Fields with information about the Level-1 sonde files.
#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct Input {
    /// _(Optional)_ Format of sonde files and of the gridded file.
    ///
    /// Either `csv` or `netcdf`. Defaults to `csv`.
    #[serde(default)]
    pub format: DataFormat,

    /// _(Optional)_ Fixed ending of sonde file names.
    /// Everything in front of it is used as sonde identifier.
    ///
    /// Defaults to `QC.csv` or `QC.nc` depending on format.
    #[serde(default)]
    pub suffix: Option<String>,
}

impl Input {
    pub fn suffix(&self) -> String {
        match &self.suffix {
            Some(suffix) => suffix.clone(),
            None => format!("QC.{}", self.format.extension()),
        }
    }
}

/// _(Optional)_ Fields with information about output naming.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// _(Optional)_ Prefix of the gridded file and quicklook names.
    ///
    /// Defaults to `HALO-AC3_HALO_Dropsondes`.
    #[serde(default = "Output::default_campaign_prefix")]
    pub campaign_prefix: String,
}

impl Output {
    fn default_campaign_prefix() -> String {
        "HALO-AC3_HALO_Dropsondes".to_string()
    }
}

impl Default for Output {
    fn default() -> Self {
        Output {
            campaign_prefix: Output::default_campaign_prefix(),
        }
    }
}

/// _(Optional)_ Fields with information about
/// resources available for processing.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used for reading and gridding sondes.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit in MB.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space.
    /// When the limit is reached the allocator aborts with an
    /// out-of-memory message instead of the process being killed silently.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: Grid,

    #[serde(default)]
    pub input: Input,

    #[serde(default)]
    pub output: Output,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        let config: Config = serde_yaml::from_slice(data.as_slice())?;

        config.check()?;

        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        self.grid.check_bounds()?;
        self.resources.check_bounds()?;
        self.input.format.check_available()?;

        Ok(())
    }
}
