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

//! Module producing diagnostic plots of the gridded flight.
//!
//! Four images are created in the `Quickplots` directory of the flight:
//! launch locations coloured by IWV on a polar map, latitude against
//! launch time, vertical profiles of measured quantities and the drift
//! of sondes from their release point.
//!
//! Data preparation lives here and does not depend on the plotting
//! backend. Drawing is done in `render` with `plotters`
//! and requires `quicklooks` feature.

#![cfg_attr(not(feature = "quicklooks"), allow(dead_code))]

#[cfg(feature = "quicklooks")]
mod render;

use crate::{
    constants::{
        EARTH_RADIUS, IWV, LAT, LON, REL_HUMIDITY, TEMPERATURE, THETA, WIND_DIRECTION,
        WIND_SPEED,
    },
    dataset::FlightDataset,
    errors::QuicklookError,
    paths::FlightPaths,
    Float,
};
use chrono::{NaiveDate, NaiveDateTime};
use ndarray::{Array1, Array2, Axis};

pub const LOCATIONS_PLOT: &str = "launch-locations-iwv";
pub const LAT_TIME_PLOT: &str = "spatiotemporal-variation-iwv";
pub const PROFILES_PLOT: &str = "vertical-profiles-measured-quantities";
pub const DRIFT_PLOT: &str = "drift-in-lat-lon";

/// Variables shown on the profiles plot with their axis descriptions.
pub const PROFILE_VARS: [(&str, &str); 5] = [
    (TEMPERATURE, "Temperature (°C)"),
    (THETA, "Potential temperature (K)"),
    (REL_HUMIDITY, "Relative humidity (%)"),
    (WIND_SPEED, "Wind speed (m/s)"),
    (WIND_DIRECTION, "Wind direction (°)"),
];

/// Longitude of the meridian pointing down on the polar map.
pub const CENTRAL_LONGITUDE: Float = 15.0;

/// Which level counted from the top of the grid is used
/// to mark sonde positions on maps.
const MARKER_LEVEL_FROM_TOP: usize = 700;

/// Creates all quicklooks of the flight.
pub fn all_quicklook_plots(
    flight: &FlightDataset,
    paths: &FlightPaths,
) -> Result<(), QuicklookError> {
    if flight.launch_count() == 0 {
        return Err(QuicklookError::EmptyDataset);
    }

    #[cfg(feature = "quicklooks")]
    {
        let qp_dir = paths.quickplot_dir()?;
        let target = |kind: &str| qp_dir.join(paths.quicklook_name(kind));

        render::launch_locations(flight, &target(LOCATIONS_PLOT))?;
        render::latitude_time(flight, paths.flight().date(), &target(LAT_TIME_PLOT))?;
        render::vertical_profiles(flight, &target(PROFILES_PLOT))?;
        render::drift(flight, &target(DRIFT_PLOT))?;

        log::info!("All quicklooks saved in {}", qp_dir.display());
    }

    #[cfg(not(feature = "quicklooks"))]
    log::warn!(
        "Built without quicklooks feature, skipping plots for flight {}",
        paths.flight()
    );

    Ok(())
}

pub(crate) fn required<'a>(
    flight: &'a FlightDataset,
    name: &'static str,
) -> Result<&'a Array2<Float>, QuicklookError> {
    flight
        .profile(name)
        .ok_or(QuicklookError::MissingVariable(name))
}

/// Position and IWV of each launch at the marker level.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchPositions {
    pub lon: Array1<Float>,
    pub lat: Array1<Float>,
    pub iwv: Array1<Float>,
}

/// Index of the marker level, the 700th level from the top
/// of the grid or the lowest level for shallower grids.
pub fn marker_level_index(levels_count: usize) -> usize {
    levels_count.saturating_sub(MARKER_LEVEL_FROM_TOP)
}

pub fn positions_at_marker_level(flight: &FlightDataset) -> Result<LaunchPositions, QuicklookError> {
    let level = marker_level_index(flight.alt.len());

    let iwv = flight
        .launch_var(IWV)
        .ok_or(QuicklookError::MissingVariable(IWV))?;

    Ok(LaunchPositions {
        lon: required(flight, LON)?.column(level).to_owned(),
        lat: required(flight, LAT)?.column(level).to_owned(),
        iwv: iwv.clone(),
    })
}

/// Minimum and maximum of finite values, `None` if there are none.
pub fn value_range<'a>(values: impl IntoIterator<Item = &'a Float>) -> Option<(Float, Float)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |range, &v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

/// Position of `value` within `range` scaled to `[0, 1]` for colouring.
pub fn normalise(value: Float, range: (Float, Float)) -> Option<Float> {
    if !value.is_finite() {
        return None;
    }

    let (min, max) = range;

    if max > min {
        Some(((value - min) / (max - min)).clamp(0.0, 1.0))
    } else {
        Some(0.5)
    }
}

/// Mean over launches at each level, skipping missing values.
pub fn ensemble_mean(values: &Array2<Float>) -> Array1<Float> {
    values.map_axis(Axis(0), |level| {
        let (sum, count) = level
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

        if count == 0 {
            Float::NAN
        } else {
            sum / count as Float
        }
    })
}

/// Difference from the value at release, which is the highest
/// level where longitude is present. Launches without any
/// longitude are all `NaN`.
pub fn drift_from_release(values: &Array2<Float>, lon: &Array2<Float>) -> Array2<Float> {
    let mut drift = Array2::from_elem(values.dim(), Float::NAN);

    for ((mut drift_row, values_row), lon_row) in drift
        .outer_iter_mut()
        .zip(values.outer_iter())
        .zip(lon.outer_iter())
    {
        let release = match lon_row.iter().rposition(|v| !v.is_nan()) {
            Some(i) => i,
            None => continue,
        };

        let at_release = values_row[release];
        drift_row.assign(&values_row.mapv(|v| v - at_release));
    }

    drift
}

/// North-polar azimuthal equidistant projection, in km from the pole.
///
/// [`CENTRAL_LONGITUDE`] points down.
pub fn polar_projection(lon: Float, lat: Float) -> (Float, Float) {
    let distance = EARTH_RADIUS * (90.0 - lat).to_radians();
    let angle = (lon - CENTRAL_LONGITUDE).to_radians();

    (distance * angle.sin(), -distance * angle.cos())
}

/// Launch times as hours since midnight of the flight date.
pub fn hours_since_midnight(
    launch_time: &[Option<NaiveDateTime>],
    flight_date: NaiveDate,
) -> Vec<Option<Float>> {
    let midnight = flight_date.and_hms_opt(0, 0, 0);

    launch_time
        .iter()
        .map(|t| {
            let elapsed = (*t)? - midnight?;
            Some(elapsed.num_milliseconds() as Float / 3_600_000.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        drift_from_release, ensemble_mean, hours_since_midnight, marker_level_index, normalise,
        polar_projection, positions_at_marker_level, value_range,
    };
    use crate::{dataset::FlightDataset, errors::QuicklookError};
    use chrono::NaiveDate;
    use float_cmp::approx_eq;
    use ndarray::{array, Array1, Array2};

    const NAN: f64 = f64::NAN;

    #[test]
    fn marker_level() {
        assert_eq!(marker_level_index(1401), 701);
        assert_eq!(marker_level_index(700), 0);
        assert_eq!(marker_level_index(61), 0);
        assert_eq!(marker_level_index(0), 0);
    }

    #[test]
    fn positions_need_iwv() {
        let flight = FlightDataset {
            launch_time: vec![None],
            sonde_id: vec!["A".to_string()],
            alt: Array1::range(0.0, 7010.0, 10.0),
            ..Default::default()
        }
        .with_profile("lat", Array2::from_shape_fn((1, 701), |(_, j)| 70.0 + j as f64))
        .with_profile("lon", Array2::from_elem((1, 701), 10.0));

        assert!(matches!(
            positions_at_marker_level(&flight),
            Err(QuicklookError::MissingVariable("iwv"))
        ));

        let flight = flight.with_launch_var("iwv", array![4.5]);
        let positions = positions_at_marker_level(&flight).unwrap();

        assert!(approx_eq!(f64, positions.lat[0], 71.0));
        assert!(approx_eq!(f64, positions.lon[0], 10.0));
        assert!(approx_eq!(f64, positions.iwv[0], 4.5));
    }

    #[test]
    fn colour_scaling() {
        let values = [3.0, NAN, 1.0, 5.0];
        let range = value_range(&values).unwrap();

        assert_eq!(range, (1.0, 5.0));
        assert_eq!(normalise(3.0, range), Some(0.5));
        assert_eq!(normalise(7.0, range), Some(1.0));
        assert_eq!(normalise(NAN, range), None);
        assert_eq!(normalise(2.0, (2.0, 2.0)), Some(0.5));
        assert_eq!(value_range(&[NAN, NAN]), None);
    }

    #[test]
    fn mean_skips_missing() {
        let mean = ensemble_mean(&array![[1.0, NAN, NAN], [3.0, 4.0, NAN]]);

        assert!(approx_eq!(f64, mean[0], 2.0));
        assert!(approx_eq!(f64, mean[1], 4.0));
        assert!(mean[2].is_nan());
    }

    #[test]
    fn drift_relative_to_highest_valid_level() {
        let lat = array![[70.0, 70.5, 71.0, 72.0], [60.0, 61.0, 62.0, 63.0]];
        let lon = array![[10.0, 10.0, 10.0, NAN], [NAN, NAN, NAN, NAN]];

        let drift = drift_from_release(&lat, &lon);

        assert!(approx_eq!(f64, drift[[0, 0]], -1.0));
        assert!(approx_eq!(f64, drift[[0, 2]], 0.0));
        assert!(approx_eq!(f64, drift[[0, 3]], 1.0));
        assert!(drift.row(1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn polar_map() {
        let (x, y) = polar_projection(123.0, 90.0);
        assert!(approx_eq!(f64, x, 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, y, 0.0, epsilon = 1e-9));

        let (x, y) = polar_projection(15.0, 80.0);
        assert!(approx_eq!(f64, x, 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, y, -6371.0 * 10.0_f64.to_radians(), epsilon = 1e-9));

        let (x, _) = polar_projection(105.0, 80.0);
        assert!(x > 0.0);
    }

    #[test]
    fn launch_hours() {
        let date = NaiveDate::from_ymd_opt(2022, 3, 12).unwrap();
        let launches = vec![
            date.and_hms_opt(10, 30, 0),
            None,
            NaiveDate::from_ymd_opt(2022, 3, 13)
                .unwrap()
                .and_hms_opt(1, 0, 0),
        ];

        let hours = hours_since_midnight(&launches, date);

        assert_eq!(hours, vec![Some(10.5), None, Some(25.0)]);
    }
}
