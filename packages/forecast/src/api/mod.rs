//! Prediction API
//!
//! Entry point for callers holding raw daily records: availability checks,
//! the full train-then-forecast pipeline, and a cheap quick forecast.
//! Scores leaving this module are always clamped to the 0-100 exam scale.

pub mod insights;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::features::extract_weekly_snapshots;
use crate::features::trend::{PerformanceDirection, TrendAnalyzer};
use crate::forecaster::{Forecast, ModelSummary, ScoreForecaster, TrainingResult};
use crate::types::{DailyActivityRecord, PredictionResult, ShadowExamScore};
use crate::validation::{has_sufficient_data, validate_record};

use self::insights::{generate_insights, heuristic_forecast, prediction_confidence, PredictionInsight};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ForecastResult {
    #[serde(rename_all = "camelCase")]
    Success {
        forecast: Forecast,
        insights: Vec<PredictionInsight>,
        summary: ModelSummary,
    },
    Failure { reason: ForecastFailure },
}

impl ForecastResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ForecastResult::Success { .. })
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        match self {
            ForecastResult::Success { forecast, .. } => Some(&forecast.prediction),
            ForecastResult::Failure {
                reason: ForecastFailure::Unreliable { forecast, .. },
            } => Some(&forecast.prediction),
            ForecastResult::Failure { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ForecastFailure {
    /// Too little history; retry once more weeks are logged
    #[serde(rename_all = "camelCase")]
    InsufficientData {
        current_weeks: usize,
        required_weeks: usize,
        message: String,
    },
    InvalidInput { errors: Vec<String> },
    /// Trained, but diagnostics say the fit explains too little
    Unreliable { forecast: Forecast, quality: String },
}

/// Clamp mean and bounds into [0, 100] independently
pub fn map_to_yds_scale(result: &PredictionResult) -> PredictionResult {
    result.map_to_yds_scale()
}

/// How far a caller should trust the current model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReliability {
    pub is_reliable: bool,
    /// R² of the training fit
    pub accuracy: f64,
    pub data_quality: String,
    pub training_weeks: usize,
    pub recommendation: String,
}

impl PredictionReliability {
    pub fn description(&self) -> &'static str {
        if self.is_reliable && self.accuracy > 0.7 {
            "High reliability"
        } else if self.is_reliable && self.accuracy > 0.5 {
            "Good reliability"
        } else if self.accuracy > 0.3 {
            "Moderate reliability"
        } else {
            "Low reliability"
        }
    }
}

impl From<&ModelSummary> for PredictionReliability {
    fn from(summary: &ModelSummary) -> Self {
        Self {
            is_reliable: summary.is_reliable,
            accuracy: summary.r_squared,
            data_quality: summary.quality_description.clone(),
            training_weeks: summary.training_weeks,
            recommendation: summary.recommendation().to_string(),
        }
    }
}

fn clamp_forecast(mut forecast: Forecast) -> Forecast {
    forecast.prediction = map_to_yds_scale(&forecast.prediction);
    forecast
}

#[derive(Debug, Default)]
pub struct PredictionApi {
    forecaster: ScoreForecaster,
    trend: TrendAnalyzer,
}

impl PredictionApi {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            forecaster: ScoreForecaster::new(config),
            trend: TrendAnalyzer::default(),
        }
    }

    pub fn forecaster(&self) -> &ScoreForecaster {
        &self.forecaster
    }

    pub fn minimum_weeks_for_prediction(&self) -> usize {
        self.forecaster.min_weeks_required()
    }

    pub fn are_predictions_available(&self, records: &[DailyActivityRecord]) -> bool {
        let snapshots = extract_weekly_snapshots(records);
        has_sufficient_data(&snapshots, self.minimum_weeks_for_prediction())
    }

    /// 0 once available, otherwise at least one more week
    pub fn weeks_until_predictions(&self, records: &[DailyActivityRecord]) -> usize {
        let snapshots = extract_weekly_snapshots(records);
        let required = self.minimum_weeks_for_prediction();
        if has_sufficient_data(&snapshots, required) {
            0
        } else {
            required.saturating_sub(snapshots.len()).max(1)
        }
    }

    pub fn get_exam_forecast(&self, records: &[DailyActivityRecord]) -> ForecastResult {
        self.get_exam_forecast_with_scores(records, &[])
    }

    pub fn get_exam_forecast_with_scores(
        &self,
        records: &[DailyActivityRecord],
        shadow_scores: &[ShadowExamScore],
    ) -> ForecastResult {
        let errors: Vec<String> = records
            .iter()
            .flat_map(|record| validate_record(record).errors)
            .collect();
        if !errors.is_empty() {
            return ForecastResult::Failure {
                reason: ForecastFailure::InvalidInput { errors },
            };
        }

        let snapshots = extract_weekly_snapshots(records);
        let required_weeks = self.minimum_weeks_for_prediction();
        let current = match snapshots.last() {
            Some(current) => current,
            None => {
                return ForecastResult::Failure {
                    reason: ForecastFailure::InsufficientData {
                        current_weeks: 0,
                        required_weeks,
                        message: "No study data available".to_string(),
                    },
                }
            }
        };

        match self.forecaster.train_from_history(&snapshots, shadow_scores) {
            TrainingResult::Success { model, diagnostics } => {
                let forecast = match model.forecast(current) {
                    Ok(forecast) => clamp_forecast(forecast),
                    Err(err) => {
                        return ForecastResult::Failure {
                            reason: ForecastFailure::InvalidInput {
                                errors: vec![format!("Prediction failed: {err}")],
                            },
                        }
                    }
                };

                if !diagnostics.is_reliable {
                    return ForecastResult::Failure {
                        reason: ForecastFailure::Unreliable {
                            forecast,
                            quality: diagnostics.quality_description().to_string(),
                        },
                    };
                }

                ForecastResult::Success {
                    insights: generate_insights(&forecast, current, model.training_weeks()),
                    summary: model.summary(),
                    forecast,
                }
            }
            TrainingResult::InsufficientData {
                current_weeks,
                required_weeks,
                reason,
            } => ForecastResult::Failure {
                reason: ForecastFailure::InsufficientData {
                    current_weeks,
                    required_weeks,
                    message: reason,
                },
            },
            TrainingResult::InvalidInput { errors } => ForecastResult::Failure {
                reason: ForecastFailure::InvalidInput { errors },
            },
        }
    }

    /// Forecast for the latest week without retraining; heuristic until a model exists
    pub fn get_quick_forecast(&self, records: &[DailyActivityRecord]) -> Option<Forecast> {
        let snapshots = extract_weekly_snapshots(records);
        let current = snapshots.last()?;

        if self.forecaster.is_model_ready() {
            self.forecaster
                .forecast_next_exam(current)
                .map(clamp_forecast)
        } else {
            Some(heuristic_forecast(current))
        }
    }

    pub fn performance_direction(&self, records: &[DailyActivityRecord]) -> PerformanceDirection {
        self.trend.direction(&extract_weekly_snapshots(records))
    }

    /// None until a model has been trained or imported
    pub fn prediction_reliability(&self) -> Option<PredictionReliability> {
        self.forecaster
            .model_summary()
            .map(|summary| PredictionReliability::from(&summary))
    }

    /// Confidence in [0.1, 1.0] for the latest week's forecast as seen on `as_of`.
    ///
    /// Uses the trained model's fit, days since the newest record, and the
    /// width of the clamped interval. None without a model or records.
    pub fn forecast_confidence(
        &self,
        records: &[DailyActivityRecord],
        as_of: NaiveDate,
    ) -> Option<f64> {
        let model = self.forecaster.current_model()?;
        let last_date = records.iter().map(|record| record.date).max()?;
        let snapshots = extract_weekly_snapshots(records);
        let forecast = clamp_forecast(model.forecast(snapshots.last()?).ok()?);

        let days_since_last_data = as_of.signed_duration_since(last_date).num_days().max(0);
        let width = forecast.prediction.upper - forecast.prediction.lower;
        Some(prediction_confidence(
            model.diagnostics(),
            days_since_last_data,
            width,
        ))
    }
}
