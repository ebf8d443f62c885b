//! Summary statistics, fit metrics and distribution quantiles.

use crate::types::{DEFAULT_CONFIDENCE, EPSILON};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Coefficient of determination, 1 - RSS/TSS; 0 when the target is constant
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let m = mean(actual);
    let tss: f64 = actual.iter().map(|y| (y - m).powi(2)).sum();
    if tss <= EPSILON {
        return 0.0;
    }
    let rss = residual_sum_of_squares(actual, predicted);
    1.0 - rss / tss
}

pub fn residual_sum_of_squares(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum()
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    (residual_sum_of_squares(actual, predicted) / actual.len() as f64).sqrt()
}

// ==================== Quantiles ====================

/// Inverse standard normal CDF (Acklam's rational approximation, |err| < 1.2e-9)
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    if p.is_nan() {
        return 0.0;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// Student-t quantile
///
/// Exact closed forms for df = 1 (Cauchy) and df = 2; otherwise the
/// Cornish-Fisher expansion around the normal quantile, which undershoots
/// badly below df = 3.
pub fn student_t_quantile(p: f64, df: f64) -> f64 {
    let z = normal_quantile(p);
    if !z.is_finite() || df <= 0.0 {
        return z;
    }
    if df == 1.0 {
        return (std::f64::consts::PI * (p - 0.5)).tan();
    }
    if df == 2.0 {
        return (2.0 * p - 1.0) / (2.0 * p * (1.0 - p)).sqrt();
    }

    let z2 = z * z;
    let z3 = z2 * z;
    let z5 = z3 * z2;
    let z7 = z5 * z2;
    let z9 = z7 * z2;

    let g1 = (z3 + z) / 4.0;
    let g2 = (5.0 * z5 + 16.0 * z3 + 3.0 * z) / 96.0;
    let g3 = (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z) / 384.0;
    let g4 = (79.0 * z9 + 776.0 * z7 + 1482.0 * z5 - 1920.0 * z3 - 945.0 * z) / 92160.0;

    z + g1 / df + g2 / df.powi(2) + g3 / df.powi(3) + g4 / df.powi(4)
}

/// Two-sided critical value for `confidence` with `df` residual degrees of freedom
///
/// Confidence outside (0, 1) falls back to 95%.
pub fn critical_value(confidence: f64, df: usize) -> f64 {
    let confidence = if confidence > 0.0 && confidence < 1.0 {
        confidence
    } else {
        DEFAULT_CONFIDENCE
    };
    student_t_quantile(0.5 + confidence / 2.0, df.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_quantile_matches_tables() {
        assert!((normal_quantile(0.975) - 1.959_964).abs() < 1e-4);
        assert!(normal_quantile(0.5).abs() < 1e-9);
        assert!((normal_quantile(0.01) + 2.326_348).abs() < 1e-4);
        assert!((normal_quantile(0.995) - 2.575_829).abs() < 1e-4);
    }

    #[test]
    fn t_quantile_approaches_normal() {
        let t2 = student_t_quantile(0.975, 2.0);
        let t10 = student_t_quantile(0.975, 10.0);
        let t1000 = student_t_quantile(0.975, 1000.0);

        assert!((t2 - 4.303).abs() < 1e-3);
        assert!((t10 - 2.228).abs() < 0.01);
        assert!((t1000 - 1.962).abs() < 0.01);
        assert!(t2 > t10 && t10 > t1000);
    }

    #[test]
    fn t_quantile_is_exact_for_one_and_two_df() {
        assert!((student_t_quantile(0.975, 1.0) - 12.706_205).abs() < 1e-5);
        assert!((student_t_quantile(0.995, 1.0) - 63.656_741).abs() < 1e-4);
        assert!((student_t_quantile(0.975, 2.0) - 4.302_653).abs() < 1e-5);
        assert!((student_t_quantile(0.025, 2.0) + 4.302_653).abs() < 1e-5);
        assert!(student_t_quantile(0.5, 1.0).abs() < 1e-12);

        // smallest residual df seen with the default 8-week minimum
        assert!((critical_value(0.95, 1) - 12.706_205).abs() < 1e-5);
        assert!((critical_value(0.95, 0) - 12.706_205).abs() < 1e-5);
    }

    #[test]
    fn critical_value_falls_back_on_bad_confidence() {
        assert_eq!(critical_value(f64::NAN, 30), critical_value(0.95, 30));
        assert_eq!(critical_value(1.5, 30), critical_value(0.95, 30));
        assert!(critical_value(0.99, 30) > critical_value(0.95, 30));
    }

    #[test]
    fn r_squared_of_constant_target_is_zero() {
        assert_eq!(r_squared(&[3.0, 3.0, 3.0], &[3.0, 3.0, 3.0]), 0.0);
        assert!((r_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn error_metrics() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.0, 3.0, 3.0, 2.0];
        assert!((mean_absolute_error(&actual, &predicted) - 0.75).abs() < 1e-12);
        assert!((root_mean_squared_error(&actual, &predicted) - 1.25f64.sqrt()).abs() < 1e-12);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
    }
}
