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

//! Sanity check of individual sondes before gridding.
//!
//! This is not a quality control. A series summing to exactly zero
//! is the usual signature of a failed or aborted release, so such
//! sondes are left out of quicklooks and must be checked during final QC.
//! A valid series which happens to sum to zero is also rejected.

use crate::{
    constants::{CHECK_VARS, GPS_ALT},
    dataset::SondeProfile,
    Float,
};
use std::fmt;

/// Why a sonde has not been admitted to gridding.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RejectionReason {
    ZeroSum,
    MissingVariable,
}

/// Record of a sonde left out of the flight dataset.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Rejection {
    pub sonde_id: String,
    pub reason: RejectionReason,
    pub variable: &'static str,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            RejectionReason::ZeroSum => write!(
                f,
                "For sonde {}, variable/s {} found to have zero sum. Ignoring this sonde now for quicklooks purposes. Check later during final QC.",
                self.sonde_id, self.variable
            ),
            RejectionReason::MissingVariable => write!(
                f,
                "For sonde {}, variable {} is missing. Ignoring this sonde now for quicklooks purposes. Check later during final QC.",
                self.sonde_id, self.variable
            ),
        }
    }
}

/// Checks whether a sonde can be gridded.
///
/// Required variables are summed (skipping missing values) in fixed
/// order and the first one with zero sum is reported.
pub fn validate(profile: &SondeProfile) -> Result<(), Rejection> {
    let reject = |reason, variable| Rejection {
        sonde_id: profile.sonde_id.clone(),
        reason,
        variable,
    };

    for variable in CHECK_VARS {
        let series = profile
            .get(variable)
            .ok_or_else(|| reject(RejectionReason::MissingVariable, variable))?;

        let sum: Float = series.iter().filter(|v| !v.is_nan()).sum();

        if sum == 0.0 {
            return Err(reject(RejectionReason::ZeroSum, variable));
        }
    }

    if profile.get(GPS_ALT).is_none() {
        return Err(reject(RejectionReason::MissingVariable, GPS_ALT));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate, RejectionReason};
    use crate::{constants::CHECK_VARS, dataset::SondeProfile};
    use ndarray::{array, Array2};
    use std::collections::BTreeMap;

    fn profile_with(overrides: &[(&str, Array2<f64>)]) -> SondeProfile {
        let mut variables = BTreeMap::new();

        for name in CHECK_VARS.iter().chain(["gpsalt", "tdry"].iter()) {
            variables.insert(name.to_string(), array![[1.0, 2.0, 3.0]]);
        }

        for (name, values) in overrides {
            variables.insert(name.to_string(), values.clone());
        }

        SondeProfile {
            sonde_id: "D20220312_101010".to_string(),
            time: array![0.0, 1.0, 2.0],
            launch_time: vec![None],
            coords: BTreeMap::new(),
            variables,
        }
    }

    #[test]
    fn valid_sonde_admitted() {
        assert!(validate(&profile_with(&[])).is_ok());
    }

    #[test]
    fn first_zero_sum_variable_reported() {
        let profile = profile_with(&[
            ("lon", array![[0.0, 0.0, 0.0]]),
            ("lat", array![[0.0, 0.0, 0.0]]),
        ]);

        let rejection = validate(&profile).unwrap_err();

        assert_eq!(rejection.reason, RejectionReason::ZeroSum);
        assert_eq!(rejection.variable, "lat");
        assert_eq!(rejection.sonde_id, "D20220312_101010");
        assert!(rejection.to_string().contains("variable/s lat found to have zero sum"));
    }

    #[test]
    fn missing_values_skipped_in_sum() {
        let partly_missing = profile_with(&[("pres", array![[f64::NAN, 1000.0, 990.0]])]);
        let all_missing = profile_with(&[("mr", array![[f64::NAN, f64::NAN, f64::NAN]])]);

        assert!(validate(&partly_missing).is_ok());
        assert_eq!(validate(&all_missing).unwrap_err().variable, "mr");
    }

    #[test]
    fn coincidental_zero_sum_rejected() {
        let profile = profile_with(&[("u_wind", array![[-2.0, 1.0, 1.0]])]);

        assert_eq!(validate(&profile).unwrap_err().variable, "u_wind");
    }

    #[test]
    fn missing_variable_rejected() {
        let mut profile = profile_with(&[]);
        profile.variables.remove("v_wind");

        let rejection = validate(&profile).unwrap_err();

        assert_eq!(rejection.reason, RejectionReason::MissingVariable);
        assert_eq!(rejection.variable, "v_wind");
    }

    #[test]
    fn variable_found_among_coordinates() {
        let mut profile = profile_with(&[]);
        let lat = profile.variables.remove("lat").unwrap();
        profile.coords.insert("lat".to_string(), lat);

        assert!(validate(&profile).is_ok());
    }
}
