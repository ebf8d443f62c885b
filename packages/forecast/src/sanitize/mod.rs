use crate::types::{EPSILON, MAX_CONDITION_NUMBER, MAX_FEATURE_ABS, MAX_GRAM_VALUE, MIN_LAMBDA};

/// 检查数组是否包含无效值 (NaN 或 Inf)
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| !x.is_finite())
}

/// 非有限值替换为 `fallback`
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// 清理特征向量，确保数值稳定
pub fn sanitize_feature_vector(x: &mut [f64]) {
    for val in x.iter_mut() {
        if !val.is_finite() {
            *val = 0.0;
        } else {
            *val = val.clamp(-MAX_FEATURE_ABS, MAX_FEATURE_ABS);
        }
    }
}

/// 清理正规方程矩阵: 去除无效值、限制幅度、对称化
pub fn sanitize_gram(a: &mut [f64], d: usize) {
    for i in 0..d {
        for j in 0..d {
            let idx = i * d + j;
            let val = a[idx];

            if !val.is_finite() {
                a[idx] = if i == j { MIN_LAMBDA } else { 0.0 };
            } else if val.abs() > MAX_GRAM_VALUE {
                a[idx] = val.signum() * MAX_GRAM_VALUE;
            }
        }
    }

    for i in 0..d {
        for j in (i + 1)..d {
            let avg = (a[i * d + j] + a[j * d + i]) / 2.0;
            a[i * d + j] = avg;
            a[j * d + i] = avg;
        }
    }
}

/// Cholesky 因子的健康诊断
#[derive(Clone, Debug)]
pub struct FactorDiagnostics {
    pub is_healthy: bool,
    pub has_nan: bool,
    pub has_inf: bool,
    pub condition_number: f64,
    pub min_diagonal: f64,
    pub max_diagonal: f64,
    pub message: String,
}

/// 诊断 Cholesky 因子
///
/// 条件数用对角线比值的平方估计: (max L_ii / min L_ii)^2
pub fn diagnose_factor(l: &[f64], d: usize) -> FactorDiagnostics {
    let mut has_nan = false;
    let mut has_inf = false;
    let mut min_diagonal = f64::MAX;
    let mut max_diagonal = f64::MIN;

    for val in l.iter() {
        if val.is_nan() {
            has_nan = true;
        } else if val.is_infinite() {
            has_inf = true;
        }
    }

    for i in 0..d {
        let diag = l[i * d + i];
        if diag > 0.0 && diag.is_finite() {
            min_diagonal = min_diagonal.min(diag);
            max_diagonal = max_diagonal.max(diag);
        }
    }

    let condition_number = if d == 0 {
        1.0
    } else if min_diagonal > EPSILON && min_diagonal != f64::MAX {
        (max_diagonal / min_diagonal).powi(2)
    } else {
        f64::MAX
    };

    let is_healthy = !has_nan && !has_inf && condition_number < MAX_CONDITION_NUMBER;

    let message = if is_healthy {
        "System is well conditioned".to_string()
    } else if has_nan {
        "Factor contains NaN values".to_string()
    } else if has_inf {
        "Factor contains infinite values".to_string()
    } else {
        format!("High condition number: {:.2e}", condition_number)
    };

    FactorDiagnostics {
        is_healthy,
        has_nan,
        has_inf,
        condition_number,
        min_diagonal: if min_diagonal == f64::MAX { 0.0 } else { min_diagonal },
        max_diagonal: if max_diagonal == f64::MIN { 0.0 } else { max_diagonal },
        message,
    }
}
