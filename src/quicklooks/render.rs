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

//! Drawing of quicklooks into PNG files.

use super::{
    drift_from_release, ensemble_mean, hours_since_midnight, normalise, polar_projection,
    positions_at_marker_level, required, value_range, PROFILE_VARS,
};
use crate::{
    constants::{KRN_LONLAT, LAT, LON, LYR_LONLAT},
    dataset::FlightDataset,
    errors::QuicklookError,
    Float,
};
use chrono::NaiveDate;
use log::debug;
use ndarray::{Array1, Array2};
use plotters::prelude::*;
use plotters::style::colors::colormaps::ViridisRGB;
use std::{error::Error, ops::Range, path::Path};

type DrawResult = Result<(), Box<dyn Error>>;

const MISSING_COLOUR: RGBColor = RGBColor(160, 160, 160);
const FONT: &str = "sans-serif";

fn drawing_error(err: Box<dyn Error>) -> QuicklookError {
    QuicklookError::Drawing(err.to_string())
}

/// Axis range covering `range` with a margin, never empty.
fn padded(range: Option<(Float, Float)>) -> Range<Float> {
    match range {
        None => 0.0..1.0,
        Some((min, max)) if max - min <= Float::EPSILON => (min - 0.5)..(max + 0.5),
        Some((min, max)) => {
            let margin = 0.05 * (max - min);
            (min - margin)..(max + margin)
        }
    }
}

fn iwv_colour(iwv: Float, range: Option<(Float, Float)>) -> RGBColor {
    match range.and_then(|range| normalise(iwv, range)) {
        Some(norm) => ViridisRGB.get_color(norm),
        None => MISSING_COLOUR,
    }
}

/// Points of a profile with missing values left out.
fn profile_points<'a>(
    values: impl IntoIterator<Item = &'a Float>,
    alt: &'a Array1<Float>,
) -> Vec<(Float, Float)> {
    values
        .into_iter()
        .zip(alt.iter())
        .filter(|(v, a)| v.is_finite() && a.is_finite())
        .map(|(&v, &a)| (v, a))
        .collect()
}

pub fn launch_locations(flight: &FlightDataset, path: &Path) -> Result<(), QuicklookError> {
    let positions = positions_at_marker_level(flight)?;

    let projected: Vec<(Float, Float)> = positions
        .lon
        .iter()
        .zip(positions.lat.iter())
        .map(|(&lon, &lat)| polar_projection(lon, lat))
        .collect();

    let stations = [
        ("KRN", polar_projection(KRN_LONLAT.0, KRN_LONLAT.1)),
        ("LYR", polar_projection(LYR_LONLAT.0, LYR_LONLAT.1)),
    ];

    draw_launch_locations(&projected, &positions.iwv, &stations, path).map_err(drawing_error)?;
    debug!("Saved {}", path.display());

    Ok(())
}

fn draw_launch_locations(
    projected: &[(Float, Float)],
    iwv: &Array1<Float>,
    stations: &[(&str, (Float, Float))],
    path: &Path,
) -> DrawResult {
    let root = BitMapBackend::new(path, (1000, 1000)).into_drawing_area();
    root.fill(&WHITE)?;

    let all_points = || {
        projected
            .iter()
            .chain(stations.iter().map(|(_, xy)| xy))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
    };

    let x_range = padded(value_range(all_points().map(|(x, _)| x)));
    let y_range = padded(value_range(all_points().map(|(_, y)| y)));
    let iwv_range = value_range(iwv);

    let mut chart = ChartBuilder::on(&root)
        .caption("Launch locations coloured by IWV", (FONT, 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc("Distance from the pole (km)")
        .y_desc("Distance from the pole (km)")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .label_style((FONT, 18))
        .draw()?;

    // parallels every 5 degrees
    for lat in (50..90).step_by(5) {
        let circle = (0..=360).map(|lon| polar_projection(lon as Float, lat as Float));
        chart.draw_series(LineSeries::new(circle, BLACK.mix(0.2)))?;
    }

    chart.draw_series(
        projected
            .iter()
            .zip(iwv.iter())
            .filter(|((x, y), _)| x.is_finite() && y.is_finite())
            .map(|(&xy, &v)| Circle::new(xy, 6, iwv_colour(v, iwv_range).filled())),
    )?;

    for (name, xy) in stations {
        chart.draw_series(std::iter::once(Cross::new(*xy, 8, RED.stroke_width(3))))?;
        chart.draw_series(std::iter::once(Text::new(
            name.to_string(),
            (xy.0 + 0.01 * (x_range.end - x_range.start), xy.1),
            (FONT, 20),
        )))?;
    }

    root.present()?;

    Ok(())
}

pub fn latitude_time(
    flight: &FlightDataset,
    flight_date: NaiveDate,
    path: &Path,
) -> Result<(), QuicklookError> {
    let positions = positions_at_marker_level(flight)?;
    let hours = hours_since_midnight(&flight.launch_time, flight_date);

    draw_latitude_time(&hours, &positions.lat, &positions.iwv, path).map_err(drawing_error)?;
    debug!("Saved {}", path.display());

    Ok(())
}

fn draw_latitude_time(
    hours: &[Option<Float>],
    lat: &Array1<Float>,
    iwv: &Array1<Float>,
    path: &Path,
) -> DrawResult {
    let root = BitMapBackend::new(path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let points: Vec<((Float, Float), Float)> = hours
        .iter()
        .zip(lat.iter())
        .zip(iwv.iter())
        .filter_map(|((h, &lat), &v)| match h {
            Some(h) if lat.is_finite() => Some(((*h, lat), v)),
            _ => None,
        })
        .collect();

    let x_range = padded(value_range(points.iter().map(|((h, _), _)| h)));
    let y_range = padded(value_range(points.iter().map(|((_, lat), _)| lat)));
    let iwv_range = value_range(iwv);

    let mut chart = ChartBuilder::on(&root)
        .caption("Spatiotemporal variation of IWV", (FONT, 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Launch time (hours UTC)")
        .y_desc("Latitude (°N)")
        .x_label_formatter(&|h| {
            let minutes = (h * 60.0).round() as i64;
            format!("{:02}:{:02}", minutes.div_euclid(60), minutes.rem_euclid(60))
        })
        .y_label_formatter(&|v| format!("{:.1}", v))
        .label_style((FONT, 18))
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(xy, v)| Circle::new(xy, 7, iwv_colour(v, iwv_range).filled())),
    )?;

    root.present()?;

    Ok(())
}

pub fn vertical_profiles(flight: &FlightDataset, path: &Path) -> Result<(), QuicklookError> {
    let mut panels = Vec::with_capacity(PROFILE_VARS.len());

    for (name, description) in PROFILE_VARS {
        let values = required(flight, name)?;
        panels.push((description, values, ensemble_mean(values)));
    }

    draw_vertical_profiles(&panels, &flight.alt, path).map_err(drawing_error)?;
    debug!("Saved {}", path.display());

    Ok(())
}

fn draw_vertical_profiles(
    panels: &[(&str, &Array2<Float>, Array1<Float>)],
    alt: &Array1<Float>,
    path: &Path,
) -> DrawResult {
    let root = BitMapBackend::new(path, (1800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((1, panels.len()));
    let alt_range = padded(value_range(alt));

    for (area, (description, values, mean)) in areas.iter().zip(panels) {
        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(padded(value_range(values.iter())), alt_range.clone())?;

        chart
            .configure_mesh()
            .x_desc(*description)
            .y_desc("Altitude (m)")
            .x_labels(5)
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .label_style((FONT, 16))
            .draw()?;

        for (i, sonde) in values.outer_iter().enumerate() {
            let colour = Palette99::pick(i).mix(0.6);
            chart.draw_series(LineSeries::new(profile_points(sonde.iter(), alt), colour))?;
        }

        chart.draw_series(LineSeries::new(
            profile_points(mean.iter(), alt),
            BLACK.stroke_width(3),
        ))?;
    }

    root.present()?;

    Ok(())
}

pub fn drift(flight: &FlightDataset, path: &Path) -> Result<(), QuicklookError> {
    let lat = required(flight, LAT)?;
    let lon = required(flight, LON)?;

    let panels = [
        ("Latitude drift (°)", drift_from_release(lat, lon)),
        ("Longitude drift (°)", drift_from_release(lon, lon)),
    ];

    draw_drift(&panels, &flight.alt, path).map_err(drawing_error)?;
    debug!("Saved {}", path.display());

    Ok(())
}

fn draw_drift(panels: &[(&str, Array2<Float>)], alt: &Array1<Float>, path: &Path) -> DrawResult {
    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((1, panels.len()));
    let alt_range = padded(value_range(alt));

    for (area, (description, drift)) in areas.iter().zip(panels) {
        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(padded(value_range(drift.iter())), alt_range.clone())?;

        chart
            .configure_mesh()
            .x_desc(*description)
            .y_desc("Altitude (m)")
            .x_label_formatter(&|v| format!("{:.2}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .label_style((FONT, 16))
            .draw()?;

        for (i, sonde) in drift.outer_iter().enumerate() {
            let colour = Palette99::pick(i);
            chart.draw_series(LineSeries::new(profile_points(sonde.iter(), alt), colour))?;
        }
    }

    root.present()?;

    Ok(())
}
