//! Score Forecaster
//!
//! Two states: untrained, and trained once `train_from_history` succeeds.
//! The trained model is immutable and shared through an `Arc`; retraining
//! builds a new one and swaps the pointer, so concurrent forecasts always see
//! either the old model or the new one, never a mix.

pub mod proxy;

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::cross_validation::CrossValidator;
use crate::error::ForecastError;
use crate::features::{create_feature_matrix, normalize_features, FeatureNormalization};
use crate::ridge::EnhancedRidgePredictor;
use crate::types::{
    feature_names, CvResult, ModelDiagnostics, PredictionResult, ShadowExamScore,
    WeeklySnapshot, FEATURE_COUNT,
};
use crate::validation::{has_sufficient_data, validate_shadow_score, validate_snapshot};

use self::proxy::build_targets;

// ==================== Result Types ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub prediction: PredictionResult,
    pub features_used: Vec<String>,
    pub is_reliable: bool,
    pub model_quality: String,
}

#[derive(Clone, Debug)]
pub enum TrainingResult {
    Success {
        model: Arc<TrainedModel>,
        diagnostics: ModelDiagnostics,
    },
    InsufficientData {
        current_weeks: usize,
        required_weeks: usize,
        reason: String,
    },
    InvalidInput {
        errors: Vec<String>,
    },
}

impl TrainingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TrainingResult::Success { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub training_weeks: usize,
    pub r_squared: f64,
    pub mean_absolute_error: f64,
    pub is_reliable: bool,
    pub quality_description: String,
    pub features_used: usize,
    pub cv_mean_score: Option<f64>,
}

impl ModelSummary {
    pub fn accuracy_description(&self) -> &'static str {
        if self.r_squared > 0.8 {
            "Highly accurate predictions"
        } else if self.r_squared > 0.6 {
            "Good prediction accuracy"
        } else if self.r_squared > 0.4 {
            "Moderate prediction accuracy"
        } else {
            "Low prediction accuracy"
        }
    }

    pub fn recommendation(&self) -> &'static str {
        if !self.is_reliable {
            "Continue studying to improve prediction accuracy"
        } else if self.r_squared < 0.5 {
            "Need more consistent study patterns for better predictions"
        } else if self.training_weeks < 10 {
            "Predictions will improve with more study history"
        } else {
            "Model is performing well"
        }
    }
}

// ==================== Trained Model ====================

/// Everything needed to forecast from a raw snapshot; serializable as a unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainedModel {
    model: EnhancedRidgePredictor,
    normalization: FeatureNormalization,
    feature_names: Vec<String>,
    cross_validation: Option<CvResult>,
    training_weeks: usize,
    shadow_weeks: usize,
    confidence_level: f64,
}

impl TrainedModel {
    pub fn diagnostics(&self) -> &ModelDiagnostics {
        self.model.diagnostics()
    }

    pub fn predictor(&self) -> &EnhancedRidgePredictor {
        &self.model
    }

    pub fn normalization(&self) -> &FeatureNormalization {
        &self.normalization
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn cross_validation(&self) -> Option<&CvResult> {
        self.cross_validation.as_ref()
    }

    pub fn training_weeks(&self) -> usize {
        self.training_weeks
    }

    /// Weeks whose target came from a shadow exam score
    pub fn shadow_weeks(&self) -> usize {
        self.shadow_weeks
    }

    pub fn forecast(&self, snapshot: &WeeklySnapshot) -> Result<Forecast, ForecastError> {
        let features = self.normalization.apply(&snapshot.to_feature_vector())?;
        let prediction = self
            .model
            .predict_with_interval(&features, self.confidence_level)?;

        if !(prediction.mean.is_finite()
            && prediction.lower.is_finite()
            && prediction.upper.is_finite())
        {
            return Err(ForecastError::NonFinite("prediction"));
        }

        let diagnostics = self.diagnostics();
        Ok(Forecast {
            prediction,
            features_used: self.feature_names.clone(),
            is_reliable: diagnostics.is_reliable,
            model_quality: diagnostics.quality_description().to_string(),
        })
    }

    pub fn summary(&self) -> ModelSummary {
        let diagnostics = self.diagnostics();
        ModelSummary {
            training_weeks: self.training_weeks,
            r_squared: diagnostics.r_squared,
            mean_absolute_error: diagnostics.mean_absolute_error,
            is_reliable: diagnostics.is_reliable,
            quality_description: diagnostics.quality_description().to_string(),
            features_used: self.feature_names.len(),
            cv_mean_score: self.cross_validation.as_ref().map(|cv| cv.mean_score),
        }
    }

    pub fn to_json(&self) -> Result<String, ForecastError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ForecastError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        self.model.validate()?;
        self.normalization.validate()?;

        if self.feature_names != feature_names() {
            return Err(ForecastError::InvalidModel(format!(
                "unexpected feature set: {:?}",
                self.feature_names
            )));
        }
        if self.normalization.dimension() != FEATURE_COUNT {
            return Err(ForecastError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: self.normalization.dimension(),
            });
        }
        if self.model.predictor().n_features() != FEATURE_COUNT {
            return Err(ForecastError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: self.model.predictor().n_features(),
            });
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidModel(format!(
                "confidence level {} outside (0, 1)",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

// ==================== Forecaster ====================

#[derive(Debug, Default)]
pub struct ScoreForecaster {
    config: ForecastConfig,
    model: RwLock<Option<Arc<TrainedModel>>>,
}

impl ScoreForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            config: config.sanitized(),
            model: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn min_weeks_required(&self) -> usize {
        self.config.min_weeks_required
    }

    pub fn train_from_history(
        &self,
        snapshots: &[WeeklySnapshot],
        shadow_scores: &[ShadowExamScore],
    ) -> TrainingResult {
        let required_weeks = self.config.min_weeks_required;
        if snapshots.len() < required_weeks {
            return TrainingResult::InsufficientData {
                current_weeks: snapshots.len(),
                required_weeks,
                reason: format!(
                    "Need at least {required_weeks} weeks of data, have {}",
                    snapshots.len()
                ),
            };
        }

        let mut errors: Vec<String> = Vec::new();
        for snapshot in snapshots {
            let result = validate_snapshot(snapshot);
            errors.extend(
                result
                    .errors
                    .into_iter()
                    .map(|err| format!("Week ending {}: {err}", snapshot.week_end)),
            );
        }
        for score in shadow_scores {
            errors.extend(validate_shadow_score(score).errors);
        }
        if !errors.is_empty() {
            tracing::warn!(error_count = errors.len(), "training input rejected");
            return TrainingResult::InvalidInput { errors };
        }

        if !has_sufficient_data(snapshots, required_weeks) {
            return TrainingResult::InsufficientData {
                current_weeks: snapshots.len(),
                required_weeks,
                reason: "No recent study activity to learn from".to_string(),
            };
        }

        let start = snapshots.len().saturating_sub(self.config.max_weeks_used);
        let recent = &snapshots[start..];

        let model = match self.fit(recent, shadow_scores) {
            Ok(model) => Arc::new(model),
            Err(err) => {
                return TrainingResult::InvalidInput {
                    errors: vec![err.to_string()],
                }
            }
        };

        let diagnostics = model.diagnostics().clone();
        tracing::info!(
            training_weeks = model.training_weeks,
            shadow_weeks = model.shadow_weeks,
            r_squared = diagnostics.r_squared,
            well_conditioned = diagnostics.is_well_conditioned,
            reliable = diagnostics.is_reliable,
            "forecast model trained"
        );
        if !diagnostics.is_reliable {
            tracing::warn!(
                quality = diagnostics.quality_description(),
                "trained model is not reliable"
            );
        }

        *self.model.write() = Some(Arc::clone(&model));

        TrainingResult::Success { model, diagnostics }
    }

    fn fit(
        &self,
        snapshots: &[WeeklySnapshot],
        shadow_scores: &[ShadowExamScore],
    ) -> Result<TrainedModel, ForecastError> {
        let features = create_feature_matrix(snapshots);
        let (normalized, normalization) = normalize_features(&features)?;
        let (targets, shadow_weeks) = build_targets(snapshots, shadow_scores);

        let model =
            EnhancedRidgePredictor::fit_with_diagnostics(&normalized, &targets, self.config.lambda)?;

        let folds = self.config.cv_folds;
        let cross_validation = if snapshots.len() >= 2 * folds {
            let mut validator = CrossValidator::new(folds, self.config.lambda);
            if let Some(seed) = self.config.cv_seed {
                validator = validator.with_seed(seed);
            }
            match validator.run(&normalized, &targets) {
                Ok(cv) => Some(cv),
                Err(err) => {
                    tracing::warn!(error = %err, "cross-validation skipped");
                    None
                }
            }
        } else {
            None
        };

        Ok(TrainedModel {
            model,
            normalization,
            feature_names: feature_names(),
            cross_validation,
            training_weeks: snapshots.len(),
            shadow_weeks,
            confidence_level: self.config.confidence_level,
        })
    }

    /// `None` while untrained or when `current` fails validation
    pub fn forecast_next_exam(&self, current: &WeeklySnapshot) -> Option<Forecast> {
        let model = self.current_model()?;

        let validation = validate_snapshot(current);
        if !validation.is_valid {
            tracing::warn!(errors = ?validation.errors, "forecast snapshot rejected");
            return None;
        }

        match model.forecast(current) {
            Ok(forecast) => Some(forecast),
            Err(err) => {
                tracing::warn!(error = %err, "forecast failed");
                None
            }
        }
    }

    /// Forecast change if the learner's week looked like `improved` instead
    ///
    /// `None` under the same conditions as [`Self::forecast_next_exam`].
    pub fn score_improvement(
        &self,
        current: &PredictionResult,
        improved: &WeeklySnapshot,
    ) -> Option<f64> {
        let improved = self.forecast_next_exam(improved)?;
        Some(improved.prediction.mean - current.mean)
    }

    pub fn is_model_ready(&self) -> bool {
        self.model.read().is_some()
    }

    pub fn current_model(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    pub fn model_summary(&self) -> Option<ModelSummary> {
        self.current_model().map(|model| model.summary())
    }

    /// JSON of the current model, if trained
    pub fn export_model(&self) -> Result<Option<String>, ForecastError> {
        self.current_model().map(|model| model.to_json()).transpose()
    }

    /// Validate and install a previously exported model
    pub fn import_model(&self, json: &str) -> Result<(), ForecastError> {
        let model = TrainedModel::from_json(json)?;
        *self.model.write() = Some(Arc::new(model));
        Ok(())
    }
}
