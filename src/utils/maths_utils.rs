use argminmax::ArgMinMax;
use ndarray::Array2;
use std::f64;

#[inline]
pub(crate) fn get_max(vec: &[f64]) -> f64 {
    let max_index: usize = vec.argmax();
    vec[max_index]
}

/// Replaces NaN with `fill`, leaving every other value untouched.
#[inline]
pub(crate) fn nan_to_num(grid: &Array2<f64>, fill: f64) -> Array2<f64> {
    grid.mapv(|v| if v.is_nan() { fill } else { v })
}

// Normalizes a grid of (positive) f64 to 0.0..1.0 by its maximum.
// NaN counts as 0. An all-zero (or non-positive) grid maps to all zeros.
// Name: `Max normalization`, `Max-Abs normalization`, or `L∞ normalization`
#[inline]
pub(crate) fn normalize_max(grid: &Array2<f64>) -> Array2<f64> {
    let filled = nan_to_num(grid, 0.0);
    let flat: Vec<f64> = filled.iter().copied().collect();
    if flat.is_empty() {
        return filled;
    }

    let max_value = get_max(&flat);
    if max_value <= 0.0 {
        return Array2::zeros(grid.raw_dim());
    }

    // Keeps the peak just under 1.0, like the reference surfaces were built
    filled.mapv(|x| x / (max_value + 1e-9))
}

/// Mean and population standard deviation of the finite values, or `None`
/// when there are none.
#[inline]
pub fn nan_mean_and_stddev<I>(data: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f64> = data.into_iter().filter(|v| !v.is_nan()).collect();
    let count = values.len();
    if count == 0 {
        return None;
    }

    let sum: f64 = values.iter().sum();
    let mean = sum / count as f64;

    let variance: f64 = values
        .iter()
        .map(|value| {
            let diff = mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    Some((mean, variance.sqrt()))
}

/// Mean of the non-NaN values; NaN when every value is NaN.
#[inline]
pub fn nan_mean<I>(data: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = data
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_max_peaks_near_one() {
        let grid = array![[0.0, 50.0], [100.0, f64::NAN]];
        let n = normalize_max(&grid);
        assert!((n[[1, 0]] - 1.0).abs() < 1e-6);
        assert!((n[[0, 1]] - 0.5).abs() < 1e-6);
        assert_eq!(n[[1, 1]], 0.0);
    }

    #[test]
    fn test_normalize_max_all_zero() {
        let grid = Array2::<f64>::zeros((3, 3));
        assert!(normalize_max(&grid).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_nan_mean_and_stddev() {
        let (m, s) = nan_mean_and_stddev([1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(m, 2.0);
        assert_eq!(s, 1.0);
        assert!(nan_mean_and_stddev([f64::NAN]).is_none());
        assert!(nan_mean([f64::NAN, f64::NAN]).is_nan());
    }
}
