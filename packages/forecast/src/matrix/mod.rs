//! 稠密小矩阵运算 (行优先存储)
//!
//! 岭回归只需要 (p+1)×(p+1) 的正规方程，手写的 Cholesky 足够。

use crate::sanitize::diagnose_factor;
use crate::types::{EPSILON, MIN_LAMBDA};

/// Cholesky 分解结果
#[derive(Clone, Debug)]
pub struct CholeskyFactor {
    /// 下三角矩阵 L，满足 A ≈ L * L^T
    pub l: Vec<f64>,
    /// 是否有主元被修复 (矩阵接近奇异)
    pub repaired: bool,
}

/// 线性系统 A * x = b 的解，附带条件数诊断
#[derive(Clone, Debug)]
pub struct LinearSolution {
    pub x: Vec<f64>,
    pub factor: CholeskyFactor,
    pub condition_number: f64,
    /// 接近奇异时为 false；调用方据此降级，而不是报错
    pub well_conditioned: bool,
}

/// 2×2 行列式
pub fn determinant_2x2(m: &[[f64; 2]; 2]) -> f64 {
    m[0][0] * m[1][1] - m[0][1] * m[1][0]
}

/// n×n 单位矩阵
pub fn identity_matrix(n: usize) -> Vec<f64> {
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    m
}

/// 欧几里得范数
pub fn vector_norm(v: &[f64]) -> f64 {
    dot_product(v, v).sqrt()
}

/// 向量点积
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

/// 矩阵向量乘法
pub fn mat_vec_mul(a: &[f64], x: &[f64], d: usize) -> Vec<f64> {
    let mut result = vec![0.0; d];
    for i in 0..d {
        result[i] = dot_product(&a[i * d..(i + 1) * d], x);
    }
    result
}

/// 外积更新: A += x * x^T
pub fn rank1_update_matrix(a: &mut [f64], x: &[f64], d: usize) {
    for i in 0..d {
        for j in 0..d {
            a[i * d + j] += x[i] * x[j];
        }
    }
}

/// 向量加法: a += scale * b
pub fn vec_add_scaled(a: &mut [f64], b: &[f64], scale: f64) {
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai += scale * bi;
    }
}

/// Cholesky 分解 A = L * L^T
///
/// 非正主元用 sqrt(lambda) 替换并标记 `repaired`，保证后续求解不会产生 NaN。
pub fn cholesky_decompose(a: &[f64], d: usize, lambda: f64) -> CholeskyFactor {
    let safe_lambda = lambda.max(MIN_LAMBDA);
    let mut l = vec![0.0; d * d];
    let mut repaired = false;

    for i in 0..d {
        for j in 0..=i {
            let mut sum = a[i * d + j];
            for k in 0..j {
                sum -= l[i * d + k] * l[j * d + k];
            }

            if i == j {
                if sum <= EPSILON || !sum.is_finite() {
                    l[i * d + i] = safe_lambda.sqrt();
                    repaired = true;
                } else {
                    l[i * d + i] = sum.sqrt();
                }
            } else {
                let diag = l[j * d + j];
                l[i * d + j] = if diag.abs() > EPSILON { sum / diag } else { 0.0 };
            }
        }
    }

    CholeskyFactor { l, repaired }
}

/// 使用 Cholesky 因子求解 A * x = b
pub fn solve_cholesky(l: &[f64], b: &[f64], d: usize) -> Vec<f64> {
    let y = solve_triangular_lower(l, b, d);
    solve_triangular_upper_transpose(l, &y, d)
}

/// 前向替换: L * x = b
pub fn solve_triangular_lower(l: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i * n + j] * x[j];
        }
        let diag = l[i * n + i];
        x[i] = if diag.abs() > EPSILON { sum / diag } else { 0.0 };
    }
    x
}

/// 后向替换: L^T * x = b
fn solve_triangular_upper_transpose(l: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= l[j * n + i] * x[j];
        }
        let diag = l[i * n + i];
        x[i] = if diag.abs() > EPSILON { sum / diag } else { 0.0 };
    }
    x
}

/// x^T * A^{-1} * x = ||L^{-1} * x||^2，用于预测区间
pub fn compute_quadratic_form(l: &[f64], x: &[f64], d: usize) -> f64 {
    let z = solve_triangular_lower(l, x, d);
    z.iter().map(|&v| v * v).sum()
}

/// 求解对称正定系统 A * x = b
///
/// 接近奇异时不会失败：返回修复后的解，并将 `well_conditioned` 置为 false。
pub fn solve_linear_system(a: &[f64], b: &[f64], d: usize) -> LinearSolution {
    let factor = cholesky_decompose(a, d, MIN_LAMBDA);
    let diagnostics = diagnose_factor(&factor.l, d);
    let x = solve_cholesky(&factor.l, b, d);

    let well_conditioned =
        !factor.repaired && diagnostics.is_healthy && x.iter().all(|v| v.is_finite());

    LinearSolution {
        x,
        condition_number: diagnostics.condition_number,
        well_conditioned,
        factor,
    }
}
