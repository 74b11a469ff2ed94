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

//! Module containing constants and fixed variable names used by quickdrop.

use crate::Float;

/// Offset between Celsius and Kelvin scales.
pub const ZERO_CELSIUS: Float = 273.15;

/// Density of liquid water (kg m^-3) used to convert
/// the precipitable water integral into depth.
pub const RHO_WATER: Float = 999.97;

/// Coefficients of Bolton (1980) saturation vapour pressure
/// formula over liquid water. Reference pressure in hPa.
pub const BOLTON_E0: Float = 6.112;
pub const BOLTON_A: Float = 17.67;
pub const BOLTON_B: Float = 243.5;

/// Variables that must not sum to zero for a sonde to be admitted.
/// Order matters, the first failing one is reported.
pub const CHECK_VARS: [&str; 6] = ["pres", "u_wind", "v_wind", "lat", "lon", "mr"];

pub const TIME: &str = "time";
pub const LAUNCH_TIME: &str = "launch_time";
pub const SONDE_ID: &str = "sonde_id";
pub const ALT: &str = "alt";
pub const GPS_ALT: &str = "gpsalt";

pub const PRESSURE: &str = "pres";
pub const DEWPOINT: &str = "dp";
pub const TEMPERATURE: &str = "tdry";
pub const THETA: &str = "theta";
pub const MIXING_RATIO: &str = "mr";
pub const REL_HUMIDITY: &str = "rh";
pub const WIND_SPEED: &str = "wspd";
pub const WIND_DIRECTION: &str = "wdir";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";

pub const TEMPERATURE_K: &str = "T";
pub const SPEC_HUMIDITY: &str = "q";
pub const IWV: &str = "iwv";

/// Kiruna airport, base of the research aircraft.
pub const KRN_LONLAT: (Float, Float) = (20.3331, 67.8207);

/// Longyearbyen, Svalbard.
pub const LYR_LONLAT: (Float, Float) = (15.4656, 78.2461);

/// Mean Earth radius (km) used for the polar map projection.
pub const EARTH_RADIUS: Float = 6371.0;
