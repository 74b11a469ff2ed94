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

use super::{grid_flight, grid_together, main, validation::RejectionReason, Core, RunMode};
use crate::{
    configuration::{Config, Grid},
    dataset::FlightDataset,
    errors::QuickdropError,
    paths::FlightId,
    storage,
};
use float_cmp::approx_eq;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const FLIGHT: &str = "20220312";
const RECORDS: usize = 50;

/// Main data directory unique for each test.
fn main_dir(test_name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("quickdrop-e2e-{}-{}", std::process::id(), test_name));

    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(dir.join(FLIGHT).join("Level_1")).unwrap();

    dir
}

fn small_grid_config(threads: u16) -> Config {
    let mut config = Config::default();
    config.grid = Grid {
        max_alt: 600.0,
        vertical_spacing: 10.0,
    };
    config.resources.threads = threads;
    config
}

/// Writes a falling sonde with records from 490 m down to 0 m.
///
/// `tweak` can overwrite any column by its name.
fn write_sonde(main_dir: &Path, sonde_id: &str, offset: f64, tweak: &dyn Fn(&str, f64) -> f64) {
    let columns = [
        "gpsalt", "alt", "pres", "tdry", "dp", "mr", "rh", "theta", "wspd", "wdir", "u_wind",
        "v_wind", "lat", "lon",
    ];

    let mut table = format!("time,launch_time,{}\n", columns.join(","));

    for i in 0..RECORDS {
        let gpsalt = 490.0 - 10.0 * i as f64;
        let tdry = 5.0 + offset - 0.0065 * gpsalt;

        let value = |name: &str| {
            let value = match name {
                "gpsalt" => gpsalt,
                "alt" => gpsalt + 12.0,
                "pres" => 1000.0 - gpsalt / 9.0,
                "tdry" => tdry,
                "dp" => tdry - 4.0,
                "mr" => 0.004,
                "rh" => 75.0,
                "theta" => tdry + 273.15 + 0.01 * gpsalt,
                "wspd" => 8.0,
                "wdir" => 270.0,
                "u_wind" => 8.0,
                "v_wind" => -0.5,
                "lat" => 75.0 + offset + 0.0001 * i as f64,
                "lon" => 10.0 - offset + 0.0002 * i as f64,
                _ => unreachable!(),
            };
            tweak(name, value)
        };

        let row: Vec<String> = columns.iter().map(|c| value(c).to_string()).collect();

        table.push_str(&format!(
            "{},2022-03-12T{:02}:00:00,{}\n",
            i as f64 * 0.5,
            10 + offset as u32,
            row.join(",")
        ));
    }

    let path = main_dir
        .join(FLIGHT)
        .join("Level_1")
        .join(format!("{}QC.csv", sonde_id));

    fs::write(path, table).unwrap();
}

fn untouched(_: &str, value: f64) -> f64 {
    value
}

fn core(main_dir: &Path, threads: u16) -> Core {
    let flight: FlightId = FLIGHT.parse().unwrap();
    Core::new(small_grid_config(threads), main_dir, flight).unwrap()
}

fn assert_bitwise_equal(left: &FlightDataset, right: &FlightDataset) {
    assert_eq!(left.sonde_id, right.sonde_id);
    assert_eq!(left.launch_time, right.launch_time);
    assert_eq!(left.alt, right.alt);
    assert_eq!(
        left.profiles.keys().collect::<Vec<_>>(),
        right.profiles.keys().collect::<Vec<_>>()
    );

    for (name, values) in &left.profiles {
        let other = &right.profiles[name];

        for (l, r) in values.iter().zip(other.iter()) {
            assert_eq!(l.to_bits(), r.to_bits(), "variable {} differs", name);
        }
    }
}

#[test]
fn zero_latitude_sonde_rejected() {
    let dir = main_dir("zero-lat");
    write_sonde(&dir, "A", 0.0, &untouched);
    write_sonde(&dir, "B", 1.0, &|name, value| if name == "lat" { 0.0 } else { value });
    write_sonde(&dir, "C", 2.0, &untouched);

    let core = core(&dir, 1);
    let (flight, report) = grid_together(&core.paths, &core.config, &core.threadpool).unwrap();

    assert_eq!(flight.sonde_id, vec!["A", "C"]);
    assert_eq!(flight.launch_count(), 3 - report.rejected.len());
    assert_eq!(report.admitted, vec!["A", "C"]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].sonde_id, "B");
    assert_eq!(report.rejected[0].variable, "lat");
    assert_eq!(report.rejected[0].reason, RejectionReason::ZeroSum);

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn altitude_axis_and_padding() {
    let dir = main_dir("axis");
    write_sonde(&dir, "A", 0.0, &untouched);

    let core = core(&dir, 1);
    let (flight, _) = grid_together(&core.paths, &core.config, &core.threadpool).unwrap();

    assert_eq!(flight.alt.len(), 61);
    assert_eq!(flight.alt[0], 0.0);
    assert_eq!(flight.alt[60], 600.0);

    let pres = flight.profile("pres").unwrap();
    assert!(approx_eq!(f64, pres[[0, 0]], 1000.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, pres[[0, 49]], 1000.0 - 490.0 / 9.0, epsilon = 1e-9));
    assert!(pres.row(0).iter().skip(50).all(|p| p.is_nan()));

    assert!(flight.profile("gpsalt").is_none());
    assert!(flight.profile("alt").is_none());
    assert!(flight.profile("lat").is_some());
    assert!(flight.profile("time").is_some());

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn gridding_is_idempotent() {
    let dir = main_dir("idempotent");
    write_sonde(&dir, "A", 0.0, &untouched);
    write_sonde(&dir, "B", 1.0, &untouched);

    let core = core(&dir, 1);
    let (first, _) = grid_together(&core.paths, &core.config, &core.threadpool).unwrap();
    let (second, _) = grid_together(&core.paths, &core.config, &core.threadpool).unwrap();

    assert_bitwise_equal(&first, &second);

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn launch_order_independent_of_threads() {
    let dir = main_dir("threads");
    for (i, id) in ["D4", "D1", "D3", "D2", "D5"].iter().enumerate() {
        write_sonde(&dir, id, i as f64, &untouched);
    }

    let sequential = core(&dir, 1);
    let parallel = core(&dir, 4);

    let (seq_flight, _) =
        grid_together(&sequential.paths, &sequential.config, &sequential.threadpool).unwrap();
    let (par_flight, _) =
        grid_together(&parallel.paths, &parallel.config, &parallel.threadpool).unwrap();

    assert_eq!(seq_flight.sonde_id, vec!["D1", "D2", "D3", "D4", "D5"]);
    assert_bitwise_equal(&seq_flight, &par_flight);

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn rejected_sonde_does_not_affect_others() {
    let with_bad = main_dir("with-bad");
    let without_bad = main_dir("without-bad");

    for dir in [&with_bad, &without_bad] {
        write_sonde(dir, "A", 0.0, &untouched);
        write_sonde(dir, "C", 2.0, &untouched);
    }
    write_sonde(&with_bad, "B", 1.0, &|name, value| if name == "pres" { 0.0 } else { value });

    let core_with = core(&with_bad, 1);
    let core_without = core(&without_bad, 1);

    let (flight_with, report) =
        grid_together(&core_with.paths, &core_with.config, &core_with.threadpool).unwrap();
    let (flight_without, _) =
        grid_together(&core_without.paths, &core_without.config, &core_without.threadpool)
            .unwrap();

    assert_eq!(report.rejected[0].variable, "pres");
    assert_bitwise_equal(&flight_with, &flight_without);

    fs::remove_dir_all(with_bad).unwrap();
    fs::remove_dir_all(without_bad).unwrap();
}

#[test]
fn no_admitted_sondes_is_fatal() {
    let dir = main_dir("all-rejected");
    write_sonde(&dir, "A", 0.0, &|name, value| if name == "mr" { 0.0 } else { value });

    let core = core(&dir, 1);
    let result = grid_together(&core.paths, &core.config, &core.threadpool);

    assert!(matches!(result, Err(QuickdropError::Assembly(_))));

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn single_sonde_at_constant_pressure() {
    let dir = main_dir("constant-pressure");
    write_sonde(&dir, "A", 0.0, &|name, value| match name {
        "pres" => 1000.0,
        "dp" => -5.0,
        _ => value,
    });

    let core = core(&dir, 1);
    let flight = grid_flight(&core).unwrap();

    let iwv = flight.launch_var("iwv").unwrap();
    assert_eq!(iwv.len(), 1);
    assert!(iwv[0].is_finite());
    assert!(iwv[0] >= 0.0);
    assert!(!iwv[0].is_sign_negative());

    let temp = flight.profile("T").unwrap();
    let tdry = flight.profile("tdry").unwrap();
    for (t, d) in temp.iter().zip(tdry.iter()) {
        if d.is_nan() {
            assert!(t.is_nan());
        } else {
            assert_eq!(*t, d + 273.15);
        }
    }

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn saved_flight_loads_back() {
    let dir = main_dir("saved");
    write_sonde(&dir, "A", 0.0, &untouched);
    write_sonde(&dir, "B", 1.0, &untouched);

    let core = core(&dir, 2);
    main(&core, RunMode::Grid).unwrap();

    let format = core.config.input.format;
    let path = core.paths.quickgrid_file(format).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        "HALO-AC3_HALO_Dropsondes_quickgrid_20220312.csv"
    );

    let saved = storage::load_flight(&path, format).unwrap();
    let gridded = grid_flight(&core).unwrap();

    assert_bitwise_equal(&saved, &gridded);
    assert_eq!(
        saved.launch_var("iwv").unwrap().to_vec(),
        gridded.launch_var("iwv").unwrap().to_vec()
    );

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn plot_without_gridded_file_is_fatal() {
    let dir = main_dir("plot-first");
    write_sonde(&dir, "A", 0.0, &untouched);

    let core = core(&dir, 1);
    let result = main(&core, RunMode::Plot);

    assert!(matches!(result, Err(QuickdropError::MissingGriddedFile(_))));

    fs::remove_dir_all(dir).unwrap();
}
