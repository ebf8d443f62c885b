//! End-to-end forecasting: daily logs through snapshots, training,
//! persistence and the prediction API.

use std::fs;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use studyplan_forecast::{
    extract_weekly_snapshots, DailyActivityRecord, ExamType, ForecastConfig, ForecastFailure,
    ForecastResult, PredictionApi, ScoreForecaster, ShadowExamScore, Skill, TrainingResult,
    WeeklySnapshot,
};

// ============================================================================
// Fixtures
// ============================================================================

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn daily_log(days: u64, seed: u64) -> Vec<DailyActivityRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let skills = [Skill::Reading, Skill::Listening, Skill::Vocabulary, Skill::Grammar];
    let mut streak = 0;

    (0..days)
        .map(|i| {
            let mut record =
                DailyActivityRecord::new(start_date().checked_add_days(Days::new(i)).unwrap());
            if rng.gen_bool(0.8) {
                streak += 1;
                for skill in skills {
                    let minutes = rng.gen_range(5..25);
                    record.skill_breakdown.insert(skill, minutes);
                    record.total_minutes += minutes;
                }
                record.tasks_completed = 1 + record.total_minutes / 30;
                record.average_accuracy = rng.gen_range(0.5..0.95);
            } else {
                streak = 0;
            }
            record.streak_day_number = streak;
            record
        })
        .collect()
}

fn weekly_history(n: usize, seed: u64) -> Vec<WeeklySnapshot> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let reading = rng.gen_range(0.1..0.35);
            let listening = rng.gen_range(0.1..0.25);
            let vocab = rng.gen_range(0.1..0.2);
            WeeklySnapshot {
                week_end: start_date()
                    .checked_add_days(Days::new(6 + 7 * i as u64))
                    .unwrap(),
                minutes: 120 + 20 * (i % 13) as i64,
                tasks: 5 + (i % 11) as i64,
                completion_rate: rng.gen_range(0.5..0.95),
                streak: 1 + (i % 15) as i64,
                reading_share: reading,
                listening_share: listening,
                vocab_share: vocab,
                grammar_share: 1.0 - reading - listening - vocab,
            }
        })
        .collect()
}

fn seeded_config() -> ForecastConfig {
    ForecastConfig {
        cv_seed: Some(42),
        ..ForecastConfig::default()
    }
}

// ============================================================================
// Training
// ============================================================================

#[test]
fn trains_on_fifty_weeks_quickly() {
    let forecaster = ScoreForecaster::new(seeded_config());
    let history = weekly_history(50, 1);

    let started = Instant::now();
    let result = forecaster.train_from_history(&history, &[]);
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(2), "training took {elapsed:?}");
    match result {
        TrainingResult::Success { model, diagnostics } => {
            assert_eq!(model.training_weeks(), 12);
            assert!(diagnostics.is_reliable, "diagnostics: {diagnostics:?}");
            let cv = model.cross_validation().expect("cross-validation should run");
            assert_eq!(cv.scores.len(), 4);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let forecast = forecaster
        .forecast_next_exam(history.last().unwrap())
        .expect("trained model forecasts");
    assert!(forecast.prediction.mean.is_finite());
    assert!(forecast.prediction.lower <= forecast.prediction.mean);
    assert!(forecast.prediction.mean <= forecast.prediction.upper);
    assert_eq!(forecast.features_used.len(), 8);
}

#[test]
fn shadow_scores_replace_proxy_targets() {
    let forecaster = ScoreForecaster::new(seeded_config());
    let history = weekly_history(10, 2);
    let shadow: Vec<ShadowExamScore> = history
        .iter()
        .map(|week| ShadowExamScore {
            date: week.week_end,
            score: 30.0 + week.minutes as f64 / 10.0,
            exam_type: ExamType::YdsPractice,
        })
        .collect();

    match forecaster.train_from_history(&history, &shadow) {
        TrainingResult::Success { model, .. } => assert_eq!(model.shadow_weeks(), 10),
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn invalid_shadow_score_rejects_training() {
    let forecaster = ScoreForecaster::default();
    let history = weekly_history(10, 3);
    let shadow = [ShadowExamScore {
        date: history[4].week_end,
        score: 140.0,
        exam_type: ExamType::MiniExam,
    }];

    assert!(matches!(
        forecaster.train_from_history(&history, &shadow),
        TrainingResult::InvalidInput { .. }
    ));
    assert!(!forecaster.is_model_ready());
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn exported_model_survives_a_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    let history = weekly_history(14, 4);

    let trained = ScoreForecaster::new(seeded_config());
    assert!(trained.train_from_history(&history, &[]).is_success());
    let json = trained.export_model().unwrap().expect("model is trained");
    fs::write(&path, json).unwrap();

    let restored = ScoreForecaster::default();
    assert!(restored.export_model().unwrap().is_none());
    restored
        .import_model(&fs::read_to_string(&path).unwrap())
        .unwrap();
    assert!(restored.is_model_ready());

    let current = history.last().unwrap();
    let before = trained.forecast_next_exam(current).unwrap();
    let after = restored.forecast_next_exam(current).unwrap();
    assert!((before.prediction.mean - after.prediction.mean).abs() < 1e-9);
    assert!((before.prediction.upper - after.prediction.upper).abs() < 1e-9);
    assert_eq!(
        trained.model_summary().unwrap().training_weeks,
        restored.model_summary().unwrap().training_weeks
    );
}

#[test]
fn corrupted_model_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, r#"{"model": "truncated"#).unwrap();

    let forecaster = ScoreForecaster::default();
    assert!(forecaster
        .import_model(&fs::read_to_string(&path).unwrap())
        .is_err());
    assert!(!forecaster.is_model_ready());
}

// ============================================================================
// Prediction API
// ============================================================================

#[test]
fn api_forecasts_sixty_days_of_records() {
    let api = PredictionApi::new(seeded_config());
    let records = daily_log(60, 11);

    assert_eq!(extract_weekly_snapshots(&records).len(), 9);
    assert!(api.are_predictions_available(&records));

    let result = api.get_exam_forecast(&records);
    let prediction = result.prediction().expect("forecast produced").clone();
    for value in [prediction.mean, prediction.lower, prediction.upper] {
        assert!((0.0..=100.0).contains(&value));
    }

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "success");
    assert!(json["forecast"]["prediction"]["mean"].is_number());
}

#[test]
fn api_reports_weeks_remaining_for_short_logs() {
    let api = PredictionApi::default();
    let records = daily_log(20, 12);

    assert_eq!(api.weeks_until_predictions(&records), 5);
    match api.get_exam_forecast(&records) {
        ForecastResult::Failure {
            reason: ForecastFailure::InsufficientData { current_weeks, .. },
        } => assert_eq!(current_weeks, 3),
        other => panic!("expected InsufficientData, got {other:?}"),
    }

    let quick = api.get_quick_forecast(&records).unwrap();
    assert!(!quick.is_reliable);
}

#[test]
fn records_parse_from_json() {
    let json = r#"[
        {"date": "2024-03-04", "totalMinutes": 45, "tasksCompleted": 3,
         "averageAccuracy": 0.8, "skillBreakdown": {"reading": 30, "grammar": 15},
         "streakDayNumber": 4},
        {"date": "2024-03-05", "totalMinutes": 0, "tasksCompleted": 0,
         "averageAccuracy": 0.0, "streakDayNumber": 0}
    ]"#;
    let records: Vec<DailyActivityRecord> = serde_json::from_str(json).unwrap();
    let snapshots = extract_weekly_snapshots(&records);

    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].minutes, 45);
    assert!((snapshots[0].completion_rate - 0.5).abs() < 1e-12);
    assert!((snapshots[0].reading_share - 30.0 / 45.0).abs() < 1e-12);
}
