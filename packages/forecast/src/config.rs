use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_CONFIDENCE;

/// Forecasting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastConfig {
    /// Weekly snapshots required before training is attempted
    pub min_weeks_required: usize,
    /// Only the most recent weeks are used for training
    pub max_weeks_used: usize,
    /// Ridge penalty on standardized features
    pub lambda: f64,
    pub confidence_level: f64,
    pub cv_folds: usize,
    pub cv_seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_weeks_required: 8,
            max_weeks_used: 12,
            lambda: 0.1,
            confidence_level: DEFAULT_CONFIDENCE,
            cv_folds: 4,
            cv_seed: None,
        }
    }
}

impl ForecastConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` can parse
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("FORECAST_MIN_WEEKS").and_then(|v| v.parse().ok()) {
            config.min_weeks_required = v;
        }
        if let Some(v) = lookup("FORECAST_MAX_WEEKS").and_then(|v| v.parse().ok()) {
            config.max_weeks_used = v;
        }
        if let Some(v) = lookup("FORECAST_LAMBDA").and_then(|v| v.parse().ok()) {
            config.lambda = v;
        }
        if let Some(v) = lookup("FORECAST_CONFIDENCE").and_then(|v| v.parse().ok()) {
            config.confidence_level = v;
        }
        if let Some(v) = lookup("FORECAST_CV_FOLDS").and_then(|v| v.parse().ok()) {
            config.cv_folds = v;
        }
        if let Some(v) = lookup("FORECAST_CV_SEED").and_then(|v| v.parse().ok()) {
            config.cv_seed = Some(v);
        }

        config.sanitized()
    }

    /// Pull out-of-range values back to something trainable
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.min_weeks_required = self.min_weeks_required.max(2);
        self.max_weeks_used = self.max_weeks_used.max(self.min_weeks_required);
        if !self.lambda.is_finite() || self.lambda <= 0.0 {
            self.lambda = defaults.lambda;
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            self.confidence_level = defaults.confidence_level;
        }
        self.cv_folds = self.cv_folds.max(2);
        self
    }
}

/// Process-level settings for the command-line tool
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub file_logs: bool,
    pub log_dir: PathBuf,
    pub forecast: ForecastConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_logs = std::env::var("FORECAST_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let log_dir = std::env::var("FORECAST_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./logs"));

        Self {
            log_level,
            file_logs,
            log_dir,
            forecast: ForecastConfig::from_env(),
        }
    }
}
