use serde::{Deserialize, Serialize};

use crate::types::{WeeklySnapshot, TARGET_STREAK_DAYS, TARGET_WEEKLY_MINUTES};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceDirection {
    Improving,
    Declining,
    Stable,
}

impl PerformanceDirection {
    pub fn display_name(&self) -> &'static str {
        match self {
            PerformanceDirection::Improving => "Improving",
            PerformanceDirection::Declining => "Declining",
            PerformanceDirection::Stable => "Stable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendParams {
    /// Most recent weeks considered for momentum
    pub window_size: usize,
    pub up_threshold: f64,
    pub down_threshold: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            window_size: 4,
            up_threshold: 0.05,
            down_threshold: -0.05,
        }
    }
}

/// Week-over-week direction of study effort
#[derive(Clone, Debug, Default)]
pub struct TrendAnalyzer {
    params: TrendParams,
}

impl TrendAnalyzer {
    pub fn new(params: TrendParams) -> Self {
        Self { params }
    }

    /// Weighted slope of normalized volume, completion and streak, in [-1, 1]
    pub fn momentum(&self, snapshots: &[WeeklySnapshot]) -> f64 {
        if snapshots.len() < 3 {
            return 0.0;
        }

        let start = snapshots.len().saturating_sub(self.params.window_size.max(2));
        let recent = &snapshots[start..];

        let volume: Vec<f64> = recent
            .iter()
            .map(|s| s.minutes as f64 / TARGET_WEEKLY_MINUTES)
            .collect();
        let completion: Vec<f64> = recent.iter().map(|s| s.completion_rate).collect();
        let streak: Vec<f64> = recent
            .iter()
            .map(|s| s.streak as f64 / TARGET_STREAK_DAYS)
            .collect();

        let momentum = linear_trend(&volume) * 0.4
            + linear_trend(&completion) * 0.4
            + linear_trend(&streak) * 0.2;

        if momentum.is_finite() {
            momentum.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn direction(&self, snapshots: &[WeeklySnapshot]) -> PerformanceDirection {
        let momentum = self.momentum(snapshots);
        if momentum > self.params.up_threshold {
            PerformanceDirection::Improving
        } else if momentum < self.params.down_threshold {
            PerformanceDirection::Declining
        } else {
            PerformanceDirection::Stable
        }
    }
}

/// Least-squares slope of `values` against their index
pub fn linear_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_xx - sum_x.powi(2);
    if denominator.abs() < 1e-10 {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}
