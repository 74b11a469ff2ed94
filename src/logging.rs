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

//! Module responsible for setting up the logger.
//!
//! Logging has to be initialised once, by the entry point, before any
//! other part of the program runs. Nothing else in the crate creates
//! log files or directories.

use crate::errors::LoggingError;
use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::{
    fs::{self, File},
    path::PathBuf,
};

/// Environment variable that overrides the log level.
pub const LOG_LEVEL_ENV: &str = "QUICKDROP_LOG_LEVEL";

/// Where the log records should be written.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Destination {
    Stderr,
    File(PathBuf),
}

/// Initialises the global logger writing to `destination`
/// with `level`, unless the level is set in the environment.
pub fn init(destination: &Destination, level: LevelFilter) -> Result<(), LoggingError> {
    let logger_env = Env::new().filter_or(LOG_LEVEL_ENV, level.as_str());

    let mut builder = Builder::from_env(logger_env);
    builder.format_timestamp_millis();

    if let Destination::File(path) = destination {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let log_file = File::options().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    }

    builder.try_init()?;

    Ok(())
}
