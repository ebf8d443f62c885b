//! Human-readable interpretation of forecasts, plus the heuristic estimate
//! used before any model has been trained.

use serde::{Deserialize, Serialize};

use crate::forecaster::Forecast;
use crate::ridge::stats::normal_quantile;
use crate::types::{ModelDiagnostics, PredictionResult, WeeklySnapshot, SCORE_MAX, SCORE_MIN};

const HEURISTIC_CONFIDENCE: f64 = 0.5;
const HEURISTIC_MARGIN: f64 = 15.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Positive,
    Warning,
    Neutral,
    Info,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInsight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub value: String,
}

impl PredictionInsight {
    fn new(
        kind: InsightKind,
        title: &str,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description: description.into(),
            value: value.into(),
        }
    }
}

/// Approximate percentile of a score among exam takers
pub fn score_percentile(score: f64) -> f64 {
    match score {
        s if s >= 80.0 => 95.0,
        s if s >= 70.0 => 85.0,
        s if s >= 60.0 => 70.0,
        s if s >= 50.0 => 55.0,
        s if s >= 40.0 => 40.0,
        s if s >= 30.0 => 25.0,
        _ => 10.0,
    }
}

pub fn recommendation(score: f64) -> &'static str {
    if score >= 65.0 {
        "You're on track for a strong performance! Keep up the excellent work."
    } else if score >= 50.0 {
        "Good progress! Focus on weak areas to boost your score further."
    } else if score >= 35.0 {
        "Steady improvement needed. Consider increasing study intensity."
    } else {
        "Significant effort required. Review study strategy and increase practice time."
    }
}

/// Confidence in a forecast, in [0.1, 1.0].
///
/// Product of the model's fit quality, a staleness penalty for the days since
/// the last logged record, and a precision penalty for wide intervals.
pub fn prediction_confidence(
    diagnostics: &ModelDiagnostics,
    days_since_last_data: i64,
    interval_width: f64,
) -> f64 {
    let model: f64 = match diagnostics.r_squared {
        r if r > 0.7 => 0.9,
        r if r > 0.5 => 0.7,
        r if r > 0.3 => 0.5,
        _ => 0.3,
    };
    let recency = match days_since_last_data {
        d if d <= 7 => 1.0,
        d if d <= 14 => 0.9,
        d if d <= 30 => 0.7,
        _ => 0.5,
    };
    // NaN width lands in the widest bucket
    let precision = match interval_width {
        w if w <= 10.0 => 1.0,
        w if w <= 20.0 => 0.8,
        w if w <= 30.0 => 0.6,
        _ => 0.4,
    };

    (model * recency * precision).clamp(0.1, 1.0)
}

/// Notable habits in a week that push the forecast up or down
pub fn identify_key_factors(snapshot: &WeeklySnapshot) -> Vec<String> {
    let mut factors = Vec::new();

    let daily_minutes = snapshot.minutes as f64 / 7.0;
    if daily_minutes < 30.0 {
        factors.push(format!("Low study volume ({daily_minutes:.0} min/day)"));
    } else if daily_minutes > 90.0 {
        factors.push(format!("High study intensity ({daily_minutes:.0} min/day)"));
    }

    if snapshot.completion_rate < 0.7 {
        factors.push(format!(
            "Inconsistent study habits ({:.0}% of days active)",
            snapshot.completion_rate * 100.0
        ));
    }

    if snapshot.streak >= 21 {
        factors.push(format!("Excellent streak momentum ({} days)", snapshot.streak));
    } else if snapshot.streak >= 7 {
        factors.push(format!("Good consistency ({} day streak)", snapshot.streak));
    } else if snapshot.streak < 3 {
        factors.push(format!("Need better consistency ({} day streak)", snapshot.streak));
    }

    if snapshot.total_share() > 0.0 && snapshot.skill_balance() < 0.6 {
        factors.push("Unbalanced skill focus - diversify study areas".to_string());
    }

    let skills = [
        ("Reading", snapshot.reading_share),
        ("Listening", snapshot.listening_share),
        ("Vocabulary", snapshot.vocab_share),
        ("Grammar", snapshot.grammar_share),
    ];
    if let Some((name, share)) = skills
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .filter(|(_, share)| *share > 0.5)
    {
        factors.push(format!("Heavy focus on {name} ({:.0}%)", share * 100.0));
    }
    if let Some((name, share)) = skills
        .iter()
        .copied()
        .filter(|(_, share)| *share > 0.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .filter(|(_, share)| *share < 0.15)
    {
        factors.push(format!("{name} needs more attention ({:.0}%)", share * 100.0));
    }

    factors
}

/// Score, reliability and the two leading key factors
pub fn generate_insights(
    forecast: &Forecast,
    snapshot: &WeeklySnapshot,
    training_weeks: usize,
) -> Vec<PredictionInsight> {
    let mean = forecast.prediction.mean;
    let points = format!("{mean:.0} points");

    let mut insights = vec![if mean >= 65.0 {
        PredictionInsight::new(
            InsightKind::Positive,
            "Strong Exam Readiness",
            "Your current trajectory suggests excellent exam performance",
            points,
        )
    } else if mean >= 50.0 {
        PredictionInsight::new(
            InsightKind::Neutral,
            "Good Progress",
            "You're making steady progress toward exam readiness",
            points,
        )
    } else {
        PredictionInsight::new(
            InsightKind::Warning,
            "Improvement Needed",
            "Consider intensifying study efforts for better exam performance",
            points,
        )
    }];

    insights.push(if forecast.is_reliable {
        PredictionInsight::new(
            InsightKind::Info,
            "Reliable Prediction",
            format!("Based on {training_weeks} weeks of consistent data"),
            format!("{:.0}% confidence", forecast.prediction.confidence * 100.0),
        )
    } else {
        PredictionInsight::new(
            InsightKind::Warning,
            "Prediction Uncertainty",
            "Continue studying to improve forecast accuracy",
            "Lower confidence",
        )
    });

    insights.extend(
        identify_key_factors(snapshot)
            .into_iter()
            .take(2)
            .map(|factor| PredictionInsight::new(InsightKind::Info, "Key Factor", factor, "")),
    );

    insights
}

/// Rule-of-thumb forecast for when no trained model exists
pub fn heuristic_forecast(snapshot: &WeeklySnapshot) -> Forecast {
    let volume = (snapshot.minutes.max(0) as f64 / 300.0).min(1.0);
    let consistency = if snapshot.completion_rate.is_finite() {
        snapshot.completion_rate.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let streak_bonus = (snapshot.streak.max(0) as f64 / 14.0).min(0.2);

    let mean = ((volume * 0.4 + consistency * 0.4 + streak_bonus) * 70.0 + 15.0).clamp(15.0, 85.0);

    Forecast {
        prediction: PredictionResult {
            mean,
            lower: (mean - HEURISTIC_MARGIN).clamp(SCORE_MIN, SCORE_MAX),
            upper: (mean + HEURISTIC_MARGIN).clamp(SCORE_MIN, SCORE_MAX),
            standard_error: HEURISTIC_MARGIN / normal_quantile(0.5 + HEURISTIC_CONFIDENCE / 2.0),
            confidence: HEURISTIC_CONFIDENCE,
        },
        features_used: vec!["basic_heuristics".to_string()],
        is_reliable: false,
        model_quality: "Heuristic".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot() -> WeeklySnapshot {
        WeeklySnapshot {
            week_end: NaiveDate::from_ymd_opt(2024, 2, 4).unwrap(),
            minutes: 140,
            tasks: 6,
            completion_rate: 0.5,
            streak: 2,
            reading_share: 0.8,
            listening_share: 0.1,
            vocab_share: 0.05,
            grammar_share: 0.05,
        }
    }

    #[test]
    fn percentiles_and_recommendations() {
        assert_eq!(score_percentile(85.0), 95.0);
        assert_eq!(score_percentile(55.0), 55.0);
        assert_eq!(score_percentile(5.0), 10.0);
        assert!(recommendation(70.0).contains("strong"));
        assert!(recommendation(20.0).contains("Significant"));
    }

    #[test]
    fn key_factors_for_lopsided_week() {
        let factors = identify_key_factors(&snapshot());
        assert!(factors.iter().any(|f| f.starts_with("Low study volume")));
        assert!(factors.iter().any(|f| f.starts_with("Inconsistent")));
        assert!(factors.iter().any(|f| f.starts_with("Need better consistency")));
        assert!(factors.iter().any(|f| f == "Heavy focus on Reading (80%)"));
        assert!(factors.iter().any(|f| f.contains("needs more attention")));
    }

    #[test]
    fn heuristic_is_flagged_and_bounded() {
        let forecast = heuristic_forecast(&snapshot());
        assert!(!forecast.is_reliable);
        assert_eq!(forecast.model_quality, "Heuristic");
        assert!((15.0..=85.0).contains(&forecast.prediction.mean));
        assert!((forecast.prediction.interval_width() - 30.0).abs() < 1e-9);
        assert!(forecast.prediction.standard_error > HEURISTIC_MARGIN);
    }

    fn diagnostics(r_squared: f64) -> ModelDiagnostics {
        ModelDiagnostics {
            r_squared,
            mean_absolute_error: 2.0,
            root_mean_squared_error: 2.5,
            condition_number: 10.0,
            is_well_conditioned: true,
            is_reliable: r_squared > 0.3,
            effective_data_points: 12,
            regularization_strength: 0.1,
        }
    }

    #[test]
    fn confidence_combines_fit_recency_and_precision() {
        assert!((prediction_confidence(&diagnostics(0.8), 3, 8.0) - 0.9).abs() < 1e-12);
        assert!((prediction_confidence(&diagnostics(0.6), 10, 15.0) - 0.7 * 0.9 * 0.8).abs() < 1e-12);
        assert!((prediction_confidence(&diagnostics(0.4), 20, 25.0) - 0.5 * 0.7 * 0.6).abs() < 1e-12);

        // 0.3 * 0.5 * 0.4 = 0.06 is floored
        assert_eq!(prediction_confidence(&diagnostics(0.1), 90, 60.0), 0.1);
        assert_eq!(prediction_confidence(&diagnostics(0.1), 90, f64::NAN), 0.1);
        assert!(
            prediction_confidence(&diagnostics(0.8), 3, 8.0)
                > prediction_confidence(&diagnostics(0.8), 40, 8.0)
        );
    }

    #[test]
    fn insights_lead_with_score() {
        let forecast = heuristic_forecast(&snapshot());
        let insights = generate_insights(&forecast, &snapshot(), 0);

        assert_eq!(insights.len(), 4);
        assert_eq!(insights[0].kind, InsightKind::Neutral);
        assert_eq!(insights[0].value, "52 points");
        assert_eq!(insights[1].title, "Prediction Uncertainty");
        assert_eq!(insights[2].title, "Key Factor");
    }
}
