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

//! quickdrop processes quality-controlled (Level-1) dropsonde files
//! of a research flight into a single dataset on a common altitude grid,
//! adds derived variables and creates quicklooks of the flight.
//!
//! The program is run for one flight at a time:
//!
//! ```text
//! quickdrop <main_dir> <YYYYMMDD> [--grid | --plot]
//! ```
//!
//! Without any of the mode flags the flight is gridded and then plotted.
//! Sondes are expected in `<main_dir>/<YYYYMMDD>/Level_1/`, the gridded
//! file is written into `<main_dir>/<YYYYMMDD>/` and quicklooks into
//! `<main_dir>/<YYYYMMDD>/Quickplots/`.

mod configuration;
mod constants;
mod dataset;
mod errors;
mod logging;
mod paths;
mod pipeline;
mod quicklooks;
mod storage;

use cap::Cap;
use clap::Parser;
use configuration::Config;
use errors::QuickdropError;
use log::{debug, error, info, warn, LevelFilter};
use paths::FlightId;
use pipeline::RunMode;
use std::{alloc, env, path::PathBuf, process};

type Float = f64;

/// Global allocator used by quickdrop.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Processes Level-1 files from ASPEN, provides a gridded file for the whole flight, and generates some quicklooks.",
    long_about = None
)]
struct Cli {
    /// Directory where all data are stored; parent directory of folder with YYYYMMDD format
    main_dir: PathBuf,

    /// The flight date in YYYYMMDD
    flightdate: FlightId,

    /// Only create plots from the available gridded file
    #[arg(short, long)]
    plot: bool,

    /// Only create gridded file from individual sondes (no plots)
    #[arg(short, long)]
    grid: bool,

    /// YAML configuration file, defaults are used when not provided
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File to which log is appended
    #[arg(long, default_value = "logs/quickdrop.log")]
    log_file: PathBuf,

    /// Write log to stderr instead of the log file
    #[arg(long)]
    log_stderr: bool,

    /// Log level, overridden by QUICKDROP_LOG_LEVEL environment variable
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Cli {
    /// `None` when both mode flags are given.
    fn run_mode(&self) -> Option<RunMode> {
        match (self.grid, self.plot) {
            (true, true) => None,
            (true, false) => Some(RunMode::Grid),
            (false, true) => Some(RunMode::Plot),
            (false, false) => Some(RunMode::Full),
        }
    }

    fn log_destination(&self) -> logging::Destination {
        if self.log_stderr {
            logging::Destination::Stderr
        } else {
            logging::Destination::File(self.log_file.clone())
        }
    }
}

/// The main program function.
/// Prepares the logger and calls the [`pipeline::main`].
///
/// Logger is initialised before anything else so that
/// every error, including configuration errors, ends up in the log.
fn main() {
    let cli = Cli::parse();

    if let Err(err) = logging::init(&cli.log_destination(), cli.log_level) {
        eprintln!("quickdrop cannot start: {}", err);
        process::exit(1);
    }

    info!("{:?}", env::args().collect::<Vec<String>>());

    match run(&cli) {
        Ok(_) => info!("Run completed successfully for {}", cli.flightdate),
        Err(err) => {
            error!("Processing failed with error: {}", err);
            eprintln!("Processing failed with error: {}", err);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<(), QuickdropError> {
    let mode = match cli.run_mode() {
        Some(mode) => mode,
        None => {
            warn!("Both grid and plot options provided, nothing to do");
            println!("Both 'grid' and 'plot' option provided as True. Either remove both options and the script will run both. Otherwise, provide just one option.");
            return Ok(());
        }
    };

    let config = match &cli.config {
        Some(path) => {
            debug!("Reading configuration from {}", path.display());
            Config::new_from_file(path)?
        }
        None => {
            debug!("No configuration file provided, using defaults");
            Config::default()
        }
    };

    let core = pipeline::Core::new(config, &cli.main_dir, cli.flightdate.clone())?;

    pipeline::main(&core, mode)
}

#[cfg(test)]
mod tests {
    use super::{run, Cli};
    use crate::pipeline::RunMode;
    use clap::Parser;
    use std::env;

    #[test]
    fn mode_flags() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().run_mode();

        assert_eq!(parse(&["quickdrop", "/data", "20220312"]), Some(RunMode::Full));
        assert_eq!(parse(&["quickdrop", "/data", "20220312", "-g"]), Some(RunMode::Grid));
        assert_eq!(parse(&["quickdrop", "/data", "20220312", "--plot"]), Some(RunMode::Plot));
        assert_eq!(parse(&["quickdrop", "/data", "20220312", "-g", "-p"]), None);
    }

    #[test]
    fn flight_date_checked() {
        assert!(Cli::try_parse_from(["quickdrop", "/data", "2022-03-12"]).is_err());
        assert!(Cli::try_parse_from(["quickdrop", "/data"]).is_err());
    }

    #[test]
    fn both_flags_do_nothing() {
        let dir = env::temp_dir().join(format!("quickdrop-cli-{}", std::process::id()));
        let cli = Cli::try_parse_from([
            "quickdrop",
            dir.to_str().unwrap(),
            "20220312",
            "--grid",
            "--plot",
            "--config",
            "does-not-exist.yaml",
        ])
        .unwrap();

        assert!(run(&cli).is_ok());
        assert!(!dir.exists());
    }
}
