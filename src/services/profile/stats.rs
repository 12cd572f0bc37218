//! Descriptive statistics over plain `f64` slices, computed with polars.

use polars::prelude::*;

use super::types::NumericStats;

fn chunked(values: &[f64]) -> Float64Chunked {
    Float64Chunked::from_slice("values", values)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    chunked(values).mean()
}

/// Sample standard deviation (`n - 1` denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    chunked(values).std(1)
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    chunked(values)
        .quantile(q, QuantileInterpolOptions::Linear)
        .ok()
        .flatten()
}

pub fn describe(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }
    let ca = chunked(values);
    let quartile = |q: f64| ca.quantile(q, QuantileInterpolOptions::Linear).ok().flatten();

    Some(NumericStats {
        count: values.len(),
        mean: ca.mean()?,
        std: if values.len() < 2 { None } else { ca.std(1) },
        min: ca.min()?,
        p25: quartile(0.25)?,
        p50: quartile(0.5)?,
        p75: quartile(0.75)?,
        max: ca.max()?,
    })
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_small_column() {
        let stats = describe(&[30.0, 10.0, 20.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 20.0).abs() < 1e-10);
        assert!((stats.std.unwrap() - 10.0).abs() < 1e-10);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.p50, 20.0);
        assert_eq!(stats.max, 30.0);
    }

    #[test]
    fn quartiles_interpolate() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.75), Some(3.25));
        assert_eq!(quantile(&values, 1.5), None);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        // population std of [2, 4, 4, 4, 5, 5, 7, 9] is 2.0
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((sample_std(&values).unwrap() - expected).abs() < 1e-10);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn single_value_has_no_std() {
        let stats = describe(&[7.0]).unwrap();
        assert_eq!(stats.std, None);
        assert_eq!(stats.p25, 7.0);
        assert_eq!(stats.p75, 7.0);
    }

    #[test]
    fn empty_input_has_no_stats() {
        assert!(describe(&[]).is_none());
        assert!(mean(&[]).is_none());
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(33.3333, 2), 33.33);
        assert_eq!(round_to(66.6666, 2), 66.67);
    }
}
