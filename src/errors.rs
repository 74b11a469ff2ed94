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

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuickdropError {
    #[error("Error while reading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while reading sonde data: {0}")]
    Input(#[from] InputError),

    #[error("Error while assembling flight dataset: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Error while computing derived variables: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Error while saving or loading gridded file: {0}")]
    Output(#[from] OutputError),

    #[error("Error while creating quicklooks: {0}")]
    Quicklook(#[from] QuicklookError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Error while accessing flight directories: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Not Found: {0}. Please create the quickgrid file first by running with --grid")]
    MissingGriddedFile(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open configuration file: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize configuration file: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),

    #[error("Data format {0} is not available in this build, enable the cargo feature")]
    FormatUnavailable(&'static str),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Cannot list or read input files: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse CSV table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Incorrect pattern for listing sonde files: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Cannot access sonde file: {0}")]
    Glob(#[from] glob::GlobError),

    #[cfg(feature = "netcdf")]
    #[error("Cannot read netCDF file: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Column {column} in {file} holds a value that is not a number: {value}")]
    NotANumber {
        file: String,
        column: String,
        value: String,
    },

    #[error("Launch time in {file} cannot be parsed: {value}")]
    BadTimestamp { file: String, value: String },

    #[error("Required variable {variable} is missing in {file}")]
    MissingVariable { file: String, variable: &'static str },

    #[error("Variable {variable} in {file} has unexpected shape")]
    IncorrectShape { file: String, variable: String },

    #[error("Data format {0} is not available in this build")]
    FormatUnavailable(&'static str),
}

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("No valid sondes left to concatenate along launch_time")]
    NoSondes,

    #[error("Sonde {0} is gridded on a different altitude axis than the rest of the flight")]
    AltitudeMismatch(String),
}

#[derive(Error, Debug)]
pub enum DerivationError {
    #[error("Variable {0} required for derivation is missing in the flight dataset")]
    MissingVariable(&'static str),
}

/// Reasons for which the precipitable water integral
/// cannot be computed for a single launch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("less than two levels with both pressure and dewpoint present")]
    NotEnoughLevels,

    #[error("pressure profile is not monotonic")]
    NonMonotonicPressure,
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot write or read the file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot write or read CSV table: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "netcdf")]
    #[error("Cannot write or read netCDF file: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Gridded file is malformed: {0}")]
    Malformed(String),

    #[error("Data format {0} is not available in this build")]
    FormatUnavailable(&'static str),
}

#[derive(Error, Debug)]
pub enum QuicklookError {
    #[error("Variable {0} required for plotting is missing in the flight dataset")]
    MissingVariable(&'static str),

    #[error("Cannot create quicklook directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Flight dataset has no launches to plot")]
    EmptyDataset,

    #[cfg(feature = "quicklooks")]
    #[error("Cannot draw the plot: {0}")]
    Drawing(String),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Cannot create log file: {0}")]
    CantCreateFile(#[from] std::io::Error),

    #[error("Logger has already been initialised: {0}")]
    AlreadyInitialised(#[from] log::SetLoggerError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("Cannot search in an empty array")]
    EmptyArray,

    #[error("Searched value is outside of the array range")]
    OutOfBounds,
}
