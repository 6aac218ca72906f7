//! Small numeric helpers shared by the scoring models.

/// Standard normal CDF, Abramowitz-Stegun 7.1.26 erf approximation.
pub(crate) fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let inner = 1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429);
    let poly = t * (0.254_829_592 + t * (-0.284_496_736 + t * inner));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Percentile of `score` in a population with the given mean and spread,
/// clamped to 1..=99.
pub(crate) fn percentile(score: f64, mean: f64, std_dev: f64) -> u8 {
    let p = normal_cdf((score - mean) / std_dev) * 100.0;
    p.round().clamp(1.0, 99.0) as u8
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_symmetry() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((normal_cdf(1.0) + normal_cdf(-1.0) - 1.0).abs() < 1e-6);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
    }

    #[test]
    fn test_percentile_clamped() {
        assert_eq!(percentile(60.0, 60.0, 15.0), 50);
        assert_eq!(percentile(500.0, 60.0, 15.0), 99);
        assert_eq!(percentile(-500.0, 60.0, 15.0), 1);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(74.549), 74.5);
        assert_eq!(round1(12.06), 12.1);
    }
}
