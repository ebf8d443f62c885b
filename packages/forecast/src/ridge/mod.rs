//! Ridge Regression
//!
//! Closed-form ridge fit with an unpenalized intercept:
//! `β = (X̃ᵀX̃ + λI')⁻¹ X̃ᵀy`, where `X̃` prepends a column of ones and `I'`
//! is the identity with a zero in the intercept position.
//!
//! Near-singular systems never fail the fit. They surface as
//! `is_well_conditioned = false` in [`ModelDiagnostics`], and a solve that
//! yields non-finite coefficients collapses to an intercept-only model.

pub mod stats;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::matrix::{
    compute_quadratic_form, dot_product, identity_matrix, rank1_update_matrix,
    solve_linear_system, vec_add_scaled,
};
use crate::sanitize::{finite_or, has_invalid_values, sanitize_gram};
use crate::types::{
    ModelDiagnostics, PredictionResult, DEFAULT_CONFIDENCE, MIN_LAMBDA, MIN_RELIABLE_POINTS,
    MIN_RELIABLE_R2,
};

use self::stats::{critical_value, mean, mean_absolute_error, r_squared, root_mean_squared_error};

// ==================== Basic Predictor ====================

/// Fitted ridge model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RidgePredictor {
    coefficients: Vec<f64>,
    intercept: f64,
    /// Cholesky factor of the regularized augmented Gram matrix, (p+1)×(p+1)
    gram_factor: Vec<f64>,
    residual_variance: f64,
    residual_dof: usize,
    lambda: f64,
    n_features: usize,
    training_size: usize,
    condition_number: f64,
    well_conditioned: bool,
}

impl RidgePredictor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], lambda: f64) -> Result<Self, ForecastError> {
        let n_features = check_training_data(x, y)?;
        let n = x.len();
        let d = n_features + 1;
        let safe_lambda = if lambda.is_finite() {
            lambda.max(MIN_LAMBDA)
        } else {
            MIN_LAMBDA
        };

        let mut gram = vec![0.0; d * d];
        let mut xty = vec![0.0; d];
        let mut row = vec![1.0; d];
        for (features, &target) in x.iter().zip(y.iter()) {
            row[1..].copy_from_slice(features);
            rank1_update_matrix(&mut gram, &row, d);
            vec_add_scaled(&mut xty, &row, target);
        }

        // intercept (index 0) stays unpenalized
        for i in 1..d {
            gram[i * d + i] += safe_lambda;
        }
        sanitize_gram(&mut gram, d);

        let solution = solve_linear_system(&gram, &xty, d);
        let residual_dof = n.saturating_sub(d).max(1);

        if has_invalid_values(&solution.x) {
            tracing::warn!(
                rows = n,
                features = n_features,
                lambda = safe_lambda,
                "ridge solve produced non-finite coefficients, falling back to intercept-only model"
            );
            let intercept = mean(y);
            let rss: f64 = y.iter().map(|v| (v - intercept).powi(2)).sum();
            return Ok(Self {
                coefficients: vec![0.0; n_features],
                intercept,
                gram_factor: identity_matrix(d),
                residual_variance: finite_or(rss / residual_dof as f64, 0.0),
                residual_dof,
                lambda: safe_lambda,
                n_features,
                training_size: n,
                condition_number: f64::MAX,
                well_conditioned: false,
            });
        }

        if !solution.well_conditioned {
            tracing::debug!(
                condition_number = solution.condition_number,
                repaired = solution.factor.repaired,
                "ridge system is ill-conditioned"
            );
        }

        let intercept = solution.x[0];
        let coefficients = solution.x[1..].to_vec();
        let rss: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(features, &target)| {
                let fitted = intercept + dot_product(&coefficients, features);
                (target - fitted).powi(2)
            })
            .sum();

        Ok(Self {
            coefficients,
            intercept,
            gram_factor: solution.factor.l,
            residual_variance: finite_or(rss / residual_dof as f64, 0.0),
            residual_dof,
            lambda: safe_lambda,
            n_features,
            training_size: n,
            condition_number: solution.condition_number,
            well_conditioned: solution.well_conditioned,
        })
    }

    pub fn predict(&self, x: &[f64]) -> Result<f64, ForecastError> {
        self.check_input(x)?;
        Ok(self.intercept + dot_product(&self.coefficients, x))
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Point prediction with a two-sided interval:
    /// `se = sqrt(s² (1 + x̃ᵀ A⁻¹ x̃))`, bounds at `mean ± t(df) · se`.
    pub fn predict_with_interval(
        &self,
        x: &[f64],
        confidence: f64,
    ) -> Result<PredictionResult, ForecastError> {
        let prediction = self.predict(x)?;
        let confidence = if confidence > 0.0 && confidence < 1.0 {
            confidence
        } else {
            DEFAULT_CONFIDENCE
        };

        let d = self.n_features + 1;
        let mut augmented = Vec::with_capacity(d);
        augmented.push(1.0);
        augmented.extend_from_slice(x);

        let leverage = finite_or(compute_quadratic_form(&self.gram_factor, &augmented, d), 0.0);
        let standard_error = finite_or(
            (self.residual_variance * (1.0 + leverage.max(0.0))).sqrt(),
            0.0,
        );
        let margin = critical_value(confidence, self.residual_dof) * standard_error;

        Ok(PredictionResult {
            mean: prediction,
            lower: prediction - margin,
            upper: prediction + margin,
            standard_error,
            confidence,
        })
    }

    /// Absolute coefficient per feature
    pub fn feature_importance(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.abs()).collect()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn training_size(&self) -> usize {
        self.training_size
    }

    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    pub fn condition_number(&self) -> f64 {
        self.condition_number
    }

    pub fn is_well_conditioned(&self) -> bool {
        self.well_conditioned
    }

    /// Structural check for models loaded from outside the process
    pub fn validate(&self) -> Result<(), ForecastError> {
        let d = self.n_features + 1;
        if self.coefficients.len() != self.n_features {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_features,
                actual: self.coefficients.len(),
            });
        }
        if self.gram_factor.len() != d * d {
            return Err(ForecastError::DimensionMismatch {
                expected: d * d,
                actual: self.gram_factor.len(),
            });
        }
        if has_invalid_values(&self.coefficients)
            || has_invalid_values(&self.gram_factor)
            || !self.intercept.is_finite()
            || !self.residual_variance.is_finite()
        {
            return Err(ForecastError::NonFinite("model parameters"));
        }
        if self.residual_variance < 0.0 || self.lambda.is_nan() || self.lambda < MIN_LAMBDA {
            return Err(ForecastError::InvalidModel(
                "negative variance or lambda below floor".to_string(),
            ));
        }
        Ok(())
    }

    fn check_input(&self, x: &[f64]) -> Result<(), ForecastError> {
        if x.len() != self.n_features {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_features,
                actual: x.len(),
            });
        }
        if has_invalid_values(x) {
            return Err(ForecastError::NonFinite("prediction features"));
        }
        Ok(())
    }
}

/// Returns the feature count shared by every row
fn check_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<usize, ForecastError> {
    let first = x.first().ok_or(ForecastError::EmptyInput)?;
    if x.len() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    let n_features = first.len();
    for row in x {
        if row.len() != n_features {
            return Err(ForecastError::DimensionMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        if has_invalid_values(row) {
            return Err(ForecastError::NonFinite("feature matrix"));
        }
    }
    if has_invalid_values(y) {
        return Err(ForecastError::NonFinite("targets"));
    }

    Ok(n_features)
}

// ==================== Diagnostic Predictor ====================

/// Ridge model bundled with its in-sample fit diagnostics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedRidgePredictor {
    predictor: RidgePredictor,
    diagnostics: ModelDiagnostics,
}

impl EnhancedRidgePredictor {
    pub fn fit_with_diagnostics(
        x: &[Vec<f64>],
        y: &[f64],
        lambda: f64,
    ) -> Result<Self, ForecastError> {
        let predictor = RidgePredictor::fit(x, y, lambda)?;
        let fitted = predictor.predict_many(x)?;

        let r_squared = finite_or(r_squared(y, &fitted), 0.0);
        let is_well_conditioned = predictor.is_well_conditioned();
        let effective_data_points = x.len();
        let is_reliable = is_well_conditioned
            && r_squared > MIN_RELIABLE_R2
            && effective_data_points >= MIN_RELIABLE_POINTS;

        let diagnostics = ModelDiagnostics {
            r_squared,
            mean_absolute_error: finite_or(mean_absolute_error(y, &fitted), 0.0),
            root_mean_squared_error: finite_or(root_mean_squared_error(y, &fitted), 0.0),
            condition_number: predictor.condition_number(),
            is_well_conditioned,
            is_reliable,
            effective_data_points,
            regularization_strength: predictor.lambda(),
        };

        Ok(Self {
            predictor,
            diagnostics,
        })
    }

    pub fn predictor(&self) -> &RidgePredictor {
        &self.predictor
    }

    pub fn diagnostics(&self) -> &ModelDiagnostics {
        &self.diagnostics
    }

    pub fn predict(&self, x: &[f64]) -> Result<f64, ForecastError> {
        self.predictor.predict(x)
    }

    pub fn predict_with_interval(
        &self,
        x: &[f64],
        confidence: f64,
    ) -> Result<PredictionResult, ForecastError> {
        self.predictor.predict_with_interval(x, confidence)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        self.predictor.validate()?;
        if self.diagnostics.effective_data_points != self.predictor.training_size() {
            return Err(ForecastError::InvalidModel(
                "diagnostics do not match training size".to_string(),
            ));
        }
        Ok(())
    }
}
