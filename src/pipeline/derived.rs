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

//! Variables derived from the gridded measurements.
//!
//! Each derivation takes only the variables it needs and returns
//! a new variable, [`derive_products`] merges them into the dataset.

use crate::{
    constants::{
        BOLTON_A, BOLTON_B, BOLTON_E0, DEWPOINT, IWV, MIXING_RATIO, PRESSURE, RHO_WATER,
        SPEC_HUMIDITY, TEMPERATURE, TEMPERATURE_K, ZERO_CELSIUS,
    },
    dataset::FlightDataset,
    errors::{DerivationError, IntegrationError},
    Float,
};
use floccus::constants::{EPSILON, G};
use log::{info, warn};
use ndarray::{Array1, Array2, ArrayView1, Zip};

/// Dry-bulb temperature converted from Celsius to Kelvin.
pub fn temperature_kelvin(tdry: &Array2<Float>) -> Array2<Float> {
    tdry.mapv(|t| t + ZERO_CELSIUS)
}

/// Specific humidity from mixing ratio, `q = w / (1 + w)`.
pub fn specific_humidity(mixing_ratio: &Array2<Float>) -> Array2<Float> {
    mixing_ratio.mapv(|w| w / (1.0 + w))
}

/// Saturation vapour pressure (hPa) over liquid water
/// from Bolton (1980), temperature in Celsius.
fn saturation_vapour_pressure(temperature: Float) -> Float {
    BOLTON_E0 * ((BOLTON_A * temperature) / (temperature + BOLTON_B)).exp()
}

/// Precipitable water (mm, equivalent to kg m^-2) of a single profile
/// with pressure in hPa and dewpoint in Celsius.
///
/// Levels missing either of the variables are skipped. The profile
/// can be ordered from the top or from the bottom, but pressure
/// has to be monotonic.
pub fn precipitable_water(
    pressure: ArrayView1<Float>,
    dewpoint: ArrayView1<Float>,
) -> Result<Float, IntegrationError> {
    let mut levels: Vec<(Float, Float)> = pressure
        .iter()
        .zip(dewpoint.iter())
        .filter(|(p, d)| !p.is_nan() && !d.is_nan())
        .map(|(&p, &d)| (p, d))
        .collect();

    if levels.len() < 2 {
        return Err(IntegrationError::NotEnoughLevels);
    }

    let descending = levels.windows(2).all(|l| l[1].0 <= l[0].0);
    let ascending = levels.windows(2).all(|l| l[1].0 >= l[0].0);

    if !descending && !ascending {
        return Err(IntegrationError::NonMonotonicPressure);
    }

    // integrate from the bottom of the column
    if !descending {
        levels.reverse();
    }

    let mixing_ratios: Vec<Float> = levels
        .iter()
        .map(|&(p, d)| {
            let vap_pres = saturation_vapour_pressure(d);
            EPSILON * vap_pres / (p - vap_pres)
        })
        .collect();

    // pressure drops upwards, layer thickness in Pa is positive
    let integral: Float = levels
        .windows(2)
        .zip(mixing_ratios.windows(2))
        .map(|(p, w)| 0.5 * (w[0] + w[1]) * (p[0].0 - p[1].0) * 100.0)
        .sum();

    Ok(integral / (G * RHO_WATER) * 1000.0)
}

/// Integrated water vapour computed separately for each launch.
///
/// A launch for which the integral cannot be computed gets `NaN`
/// and does not affect other launches.
pub fn integrated_water_vapour(
    pressure: &Array2<Float>,
    dewpoint: &Array2<Float>,
    sonde_ids: &[String],
) -> Array1<Float> {
    let mut iwv = Array1::from_elem(pressure.nrows(), Float::NAN);

    Zip::from(&mut iwv)
        .and(pressure.rows())
        .and(dewpoint.rows())
        .and(sonde_ids)
        .for_each(|iwv, pres, dwpt, sonde_id| {
            *iwv = precipitable_water(pres, dwpt).unwrap_or_else(|err| {
                warn!("Cannot compute IWV for sonde {}: {}", sonde_id, err);
                Float::NAN
            })
        });

    iwv
}

/// Adds temperature in Kelvin, specific humidity and
/// integrated water vapour to the flight dataset.
pub fn derive_products(flight: FlightDataset) -> Result<FlightDataset, DerivationError> {
    let required = |name: &'static str| {
        flight
            .profile(name)
            .ok_or(DerivationError::MissingVariable(name))
    };

    let temperature = temperature_kelvin(required(TEMPERATURE)?);
    let spec_humidity = specific_humidity(required(MIXING_RATIO)?);
    let iwv = integrated_water_vapour(
        required(PRESSURE)?,
        required(DEWPOINT)?,
        &flight.sonde_id,
    );

    let flight = flight
        .with_profile(TEMPERATURE_K, temperature)
        .with_profile(SPEC_HUMIDITY, spec_humidity)
        .with_launch_var(IWV, iwv);

    info!("Added derived variables: T, q and iwv to flight dataset");

    Ok(flight)
}
