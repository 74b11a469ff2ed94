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

//! Module containing linear interpolation of sonde
//! records onto the altitude grid.

use crate::{errors::SearchError, Float};
use ndarray::{Array1, ArrayView1};

/// Binary search of the last element not greater than `x`
/// in an ascending array.
///
/// Elements equal to each other are allowed, then the first
/// of the equal elements which is not greater than `x` is
/// not guaranteed, only some index `i` such that
/// `array[i] <= x <= array[i + 1]`.
fn find_left_closest<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let (first, last) = match (array.first(), array.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SearchError::EmptyArray),
    };

    if x < first || x > last {
        return Err(SearchError::OutOfBounds);
    }

    let mut lo = 0;
    let mut hi = array.len() - 1;

    while lo < hi {
        let mid = (lo + hi + 1) / 2;

        if array[mid] <= *x {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    Ok(lo)
}

/// Linearly interpolates `values` given at ascending `knots` onto `targets`.
///
/// Targets outside of the knots range get `NaN`. Target equal to a knot
/// gets the value at that knot, otherwise a missing value at either
/// of the bracketing knots gives `NaN`.
pub fn interp_linear(
    knots: ArrayView1<Float>,
    values: ArrayView1<Float>,
    targets: ArrayView1<Float>,
) -> Array1<Float> {
    debug_assert_eq!(knots.len(), values.len());

    let knots = knots.to_vec();

    targets.mapv(|x| match find_left_closest(&knots, &x) {
        Ok(i) if knots[i] == x => values[i],
        Ok(i) if i + 1 < knots.len() => {
            let (x_0, x_1) = (knots[i], knots[i + 1]);
            let (y_0, y_1) = (values[i], values[i + 1]);

            if x_1 == x {
                y_1
            } else {
                y_0 + (y_1 - y_0) * (x - x_0) / (x_1 - x_0)
            }
        }
        _ => Float::NAN,
    })
}

#[cfg(test)]
mod tests {
    use super::{find_left_closest, interp_linear};
    use crate::errors::SearchError;
    use float_cmp::approx_eq;
    use ndarray::array;

    #[test]
    fn bisection() {
        let knots = [0.0, 10.0, 20.0, 30.0];

        assert_eq!(find_left_closest(&knots, &0.0), Ok(0));
        assert_eq!(find_left_closest(&knots, &15.0), Ok(1));
        assert_eq!(find_left_closest(&knots, &20.0), Ok(2));
        assert_eq!(find_left_closest(&knots, &30.0), Ok(3));
        assert_eq!(
            find_left_closest(&knots, &31.0),
            Err(SearchError::OutOfBounds)
        );
        assert_eq!(
            find_left_closest::<f64>(&[], &1.0),
            Err(SearchError::EmptyArray)
        );
    }

    #[test]
    fn interpolation_inside_and_outside() {
        let knots = array![5.0, 15.0, 25.0];
        let values = array![1.0, 2.0, 4.0];
        let targets = array![0.0, 5.0, 10.0, 20.0, 25.0, 30.0];

        let result = interp_linear(knots.view(), values.view(), targets.view());

        assert!(result[0].is_nan());
        assert!(approx_eq!(f64, result[1], 1.0));
        assert!(approx_eq!(f64, result[2], 1.5));
        assert!(approx_eq!(f64, result[3], 3.0));
        assert!(approx_eq!(f64, result[4], 4.0));
        assert!(result[5].is_nan());
    }

    #[test]
    fn missing_values_propagate() {
        let knots = array![0.0, 10.0, 20.0];
        let values = array![1.0, f64::NAN, 3.0];
        let targets = array![0.0, 5.0, 10.0, 15.0, 20.0];

        let result = interp_linear(knots.view(), values.view(), targets.view());

        assert!(approx_eq!(f64, result[0], 1.0));
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(approx_eq!(f64, result[4], 3.0));
    }
}
