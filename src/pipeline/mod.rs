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

//! Module containing the processing of a single flight.
//!
//! Every Level-1 file of the flight goes through three steps, which
//! are independent between sondes and are run on the threadpool:
//!
//! 1. the file is read ([`storage::read_sonde`]),
//! 2. it is checked for integrity ([`validation::validate`]), sondes with
//!    any of the required variables summing to zero are rejected and reported,
//! 3. the admitted sonde is interpolated onto the common altitude grid
//!    ([`gridding::grid`]).
//!
//! Gridded sondes are then stacked in file name order ([`assembly::assemble`])
//! and derived variables are added ([`derived::derive_products`]).
//! The resulting dataset is saved next to the Level-1 directory and can be
//! rendered into quicklooks.

pub mod assembly;
pub mod derived;
pub mod gridding;
pub mod interpolation;
pub mod validation;

#[cfg(test)]
mod super_tests;

use crate::{
    configuration::Config,
    dataset::{FlightDataset, GriddedSonde},
    errors::{ConfigError, InputError, QuickdropError},
    paths::{FlightId, FlightPaths},
    quicklooks, storage, Float, ALLOCATOR,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use ndarray::Array1;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use std::path::Path;
use validation::Rejection;

/// What should be done for the flight.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RunMode {
    /// Grid the flight and then plot it.
    Full,
    /// Grid, derive and save.
    Grid,
    /// Load previously saved flight and plot it.
    Plot,
}

/// Summary of which sondes made it into the flight dataset.
#[derive(Clone, Debug, Default)]
pub struct GriddingReport {
    pub admitted: Vec<String>,
    pub rejected: Vec<Rejection>,
}

/// Structure holding everything needed to process the flight.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
    pub paths: FlightPaths,
}

impl Core {
    /// Sets the resources limits and prepares flight paths.
    pub fn new(config: Config, main_dir: &Path, flight: FlightId) -> Result<Self, QuickdropError> {
        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory.saturating_mul(1024 * 1024))
            .map_err(|_| {
                ConfigError::OutOfBounds("Memory limit is lower than already allocated memory")
            })?;

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .build()?;

        let paths = FlightPaths::new(main_dir, flight, &config.output.campaign_prefix);

        Ok(Core {
            config,
            threadpool,
            paths,
        })
    }
}

/// Runs the flight processing in requested mode.
pub fn main(core: &Core, mode: RunMode) -> Result<(), QuickdropError> {
    match mode {
        RunMode::Full => {
            let flight = grid_flight(core)?;
            quicklooks::all_quicklook_plots(&flight, &core.paths)?;
        }
        RunMode::Grid => {
            grid_flight(core)?;
        }
        RunMode::Plot => {
            let flight = load_flight(core)?;
            quicklooks::all_quicklook_plots(&flight, &core.paths)?;
        }
    }

    Ok(())
}

/// Grids all sondes of the flight, adds derived variables
/// and saves the result.
pub fn grid_flight(core: &Core) -> Result<FlightDataset, QuickdropError> {
    let (flight, _) = grid_together(&core.paths, &core.config, &core.threadpool)?;
    let flight = derived::derive_products(flight)?;

    let target = core.paths.quickgrid_target(core.config.input.format);
    storage::save_flight(&flight, &target, core.config.input.format)?;

    Ok(flight)
}

fn load_flight(core: &Core) -> Result<FlightDataset, QuickdropError> {
    let format = core.config.input.format;
    let path = core.paths.quickgrid_file(format)?;

    Ok(storage::load_flight(&path, format)?)
}

/// Reads, checks and grids every sonde of the flight and
/// stacks them into one dataset.
///
/// Sondes are processed on the `threadpool`, but the launch order
/// is always the order of sorted file names.
pub fn grid_together(
    paths: &FlightPaths,
    config: &Config,
    threadpool: &ThreadPool,
) -> Result<(FlightDataset, GriddingReport), QuickdropError> {
    let suffix = config.input.suffix();
    let files = storage::list_sonde_files(paths.l1_dir(), &suffix)?;

    let levels = Array1::from_vec(config.grid.levels());

    info!("Gridding {} sondes", files.len());

    let sondes_bar = ProgressBar::new(files.len() as u64);
    sondes_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    sondes_bar.set_prefix("Gridded sondes");

    let results: Vec<Result<Result<GriddedSonde, Rejection>, InputError>> =
        threadpool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = process_sonde(file, &suffix, config, &levels);

                    if let Ok(Err(rejection)) = &result {
                        info!("{}", rejection);
                        sondes_bar.println(rejection.to_string());
                    }

                    sondes_bar.inc(1);
                    result
                })
                .collect()
        });

    sondes_bar.finish_with_message("All sondes processed");

    let mut report = GriddingReport::default();
    let mut gridded = Vec::with_capacity(results.len());

    for result in results {
        match result? {
            Ok(sonde) => {
                report.admitted.push(sonde.sonde_id.clone());
                gridded.push(sonde);
            }
            Err(rejection) => report.rejected.push(rejection),
        }
    }

    let flight = assembly::assemble(gridded)?;

    info!(
        "Gridded all individual sondes for {} at {} m vertical resolution to {} m",
        paths.l1_dir().display(),
        config.grid.vertical_spacing,
        config.grid.max_alt
    );
    info!(
        "{} sondes admitted, {} rejected",
        report.admitted.len(),
        report.rejected.len()
    );

    Ok((flight, report))
}

fn process_sonde(
    file: &Path,
    suffix: &str,
    config: &Config,
    levels: &Array1<Float>,
) -> Result<Result<GriddedSonde, Rejection>, InputError> {
    let sonde_id = storage::sonde_id(file, suffix);
    let profile = storage::read_sonde(file, &sonde_id, config.input.format)?;

    Ok(validation::validate(&profile).map(|_| gridding::grid(profile, levels)))
}
