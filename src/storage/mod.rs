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

//! Module responsible for reading sonde files and for
//! saving and loading the gridded flight dataset.
//!
//! Two self-describing formats are supported: CSV tables
//! (always available) and netCDF (with `netcdf` feature).
//! Variable and dimension names are the same in both formats,
//! so a saved flight loads back without any renaming.

mod csv_table;
#[cfg(feature = "netcdf")]
mod netcdf_table;

use crate::{
    configuration::DataFormat,
    dataset::{FlightDataset, SondeProfile},
    errors::{InputError, OutputError},
    Float,
};
use glob::{glob, Pattern};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Lists sonde files in `dir` ending with `suffix`,
/// sorted by name (which is also the launch order).
pub fn list_sonde_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, InputError> {
    let pattern = format!(
        "{}/*{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(suffix)
    );

    let mut files = glob(&pattern)?.collect::<Result<Vec<PathBuf>, _>>()?;
    files.sort();

    debug!("Found {} sonde files matching {}", files.len(), pattern);

    Ok(files)
}

/// Sonde identifier, the file name without the fixed suffix.
pub fn sonde_id(path: &Path, suffix: &str) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    match file_name.strip_suffix(suffix) {
        Some(id) => id.to_string(),
        None => file_name,
    }
}

/// Factor converting mixing ratio given in `units` to kg/kg,
/// `None` when the units are not recognised.
///
/// CSV tables carry no units and their mixing ratio is read as kg/kg.
#[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
pub(crate) fn mixing_ratio_factor(units: &str) -> Option<Float> {
    let units = units
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase();

    match units.as_str() {
        "1" | "kg/kg" | "kg kg-1" | "kg kg**-1" | "kilogram/kilogram" | "g/g" => Some(1.0),
        "g/kg" | "g kg-1" | "g kg**-1" | "gram/kilogram" | "grams/kilogram" => Some(1e-3),
        _ => None,
    }
}

pub fn read_sonde(
    path: &Path,
    sonde_id: &str,
    format: DataFormat,
) -> Result<SondeProfile, InputError> {
    debug!("Reading sonde file {}", path.display());

    match format {
        DataFormat::Csv => csv_table::read_sonde(path, sonde_id),
        #[cfg(feature = "netcdf")]
        DataFormat::Netcdf => netcdf_table::read_sonde(path, sonde_id),
        #[cfg(not(feature = "netcdf"))]
        DataFormat::Netcdf => Err(InputError::FormatUnavailable("netcdf")),
    }
}

pub fn save_flight(
    flight: &FlightDataset,
    path: &Path,
    format: DataFormat,
) -> Result<(), OutputError> {
    match format {
        DataFormat::Csv => csv_table::write_flight(flight, path)?,
        #[cfg(feature = "netcdf")]
        DataFormat::Netcdf => netcdf_table::write_flight(flight, path)?,
        #[cfg(not(feature = "netcdf"))]
        DataFormat::Netcdf => return Err(OutputError::FormatUnavailable("netcdf")),
    }

    info!("File Saved: {}", path.display());

    Ok(())
}

pub fn load_flight(path: &Path, format: DataFormat) -> Result<FlightDataset, OutputError> {
    debug!("Loading gridded file {}", path.display());

    match format {
        DataFormat::Csv => csv_table::read_flight(path),
        #[cfg(feature = "netcdf")]
        DataFormat::Netcdf => netcdf_table::read_flight(path),
        #[cfg(not(feature = "netcdf"))]
        DataFormat::Netcdf => Err(OutputError::FormatUnavailable("netcdf")),
    }
}

#[cfg(test)]
mod tests {
    use super::{list_sonde_files, mixing_ratio_factor, sonde_id};
    use crate::pipeline::derived::specific_humidity;
    use float_cmp::approx_eq;
    use ndarray::array;
    use std::{env, fs, path::Path};

    #[test]
    fn mixing_ratio_units() {
        assert_eq!(mixing_ratio_factor("gram/kilogram"), Some(1e-3));
        assert_eq!(mixing_ratio_factor(" g  kg-1 "), Some(1e-3));
        assert_eq!(mixing_ratio_factor("G/KG"), Some(1e-3));
        assert_eq!(mixing_ratio_factor("kg/kg"), Some(1.0));
        assert_eq!(mixing_ratio_factor("1"), Some(1.0));
        assert_eq!(mixing_ratio_factor("percent"), None);

        let factor = mixing_ratio_factor("gram/kilogram").unwrap();
        let q = specific_humidity(&array![[4.0 * factor]]);

        assert!(approx_eq!(f64, q[[0, 0]], 0.004 / 1.004, epsilon = 1e-12));
    }

    #[test]
    fn sonde_files_sorted_and_filtered() {
        let dir = env::temp_dir().join(format!("quickdrop-list-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        for name in ["D20220312_120000QC.csv", "D20220312_090000QC.csv", "notes.txt"] {
            fs::write(dir.join(name), "").unwrap();
        }

        let files = list_sonde_files(&dir, "QC.csv").unwrap();
        let ids: Vec<String> = files.iter().map(|f| sonde_id(f, "QC.csv")).collect();

        assert_eq!(ids, vec!["D20220312_090000", "D20220312_120000"]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn id_without_suffix() {
        assert_eq!(
            sonde_id(Path::new("/data/Level_1/D20220312_101525QC.nc"), "QC.nc"),
            "D20220312_101525"
        );
        assert_eq!(sonde_id(Path::new("other.nc"), "QC.nc"), "other.nc");
    }
}
