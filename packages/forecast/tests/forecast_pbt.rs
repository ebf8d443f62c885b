//! Forecast engine property tests
//!
//! Invariants checked:
//! - weekly extraction emits one snapshot per 7-day window, each passing validation
//! - completion rate stays in [0, 1] and skill shares never sum past 1
//! - ridge predictions on finite inputs are finite and bracketed by their interval
//! - YDS mapping always lands on the 0-100 scale
//! - normalized features stay within the sanitization bound

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use studyplan_forecast::features::normalize_features;
use studyplan_forecast::validation::validate_snapshot;
use studyplan_forecast::{
    extract_weekly_snapshots, map_to_yds_scale, DailyActivityRecord, PredictionResult,
    RidgePredictor, Skill, MAX_FEATURE_ABS,
};

// ============================================================================
// Generators
// ============================================================================

fn arb_skill() -> impl Strategy<Value = Skill> {
    prop_oneof![
        Just(Skill::Reading),
        Just(Skill::Listening),
        Just(Skill::Vocabulary),
        Just(Skill::Grammar),
        Just(Skill::Speaking),
        Just(Skill::Writing),
        Just(Skill::PracticeExam),
        Just(Skill::Other),
    ]
}

fn arb_record() -> impl Strategy<Value = DailyActivityRecord> {
    (
        (0u64..200u64),                                                 // day offset
        (0u32..=600u32),                                                // total_minutes
        (0u32..=30u32),                                                 // tasks_completed
        (0.0f64..=1.0f64),                                              // average_accuracy
        prop::collection::btree_map(arb_skill(), 0u32..=300u32, 0..5), // skill_breakdown
        (0u32..=60u32),                                                 // streak_day_number
    )
        .prop_map(
            |(offset, total_minutes, tasks_completed, average_accuracy, skill_breakdown, streak)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .checked_add_days(Days::new(offset))
                    .unwrap();
                DailyActivityRecord {
                    date,
                    total_minutes,
                    tasks_completed,
                    average_accuracy,
                    skill_breakdown: skill_breakdown.into_iter().collect::<BTreeMap<_, _>>(),
                    streak_day_number: streak,
                }
            },
        )
}

fn arb_training_set() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>)> {
    (3usize..30usize).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(-100.0f64..100.0f64, 3), n),
            prop::collection::vec(-100.0f64..100.0f64, n),
        )
    })
}

fn arb_prediction() -> impl Strategy<Value = PredictionResult> {
    (
        (-500.0f64..500.0f64), // mean
        (0.0f64..200.0f64),    // half width
        (0.0f64..50.0f64),     // standard_error
    )
        .prop_map(|(mean, half_width, standard_error)| PredictionResult {
            mean,
            lower: mean - half_width,
            upper: mean + half_width,
            standard_error,
            confidence: 0.95,
        })
}

// ============================================================================
// Weekly extraction
// ============================================================================

proptest! {
    #[test]
    fn extracted_snapshots_are_valid(records in prop::collection::vec(arb_record(), 1..80)) {
        let snapshots = extract_weekly_snapshots(&records);

        let first = records.iter().map(|r| r.date).min().unwrap();
        let last = records.iter().map(|r| r.date).max().unwrap();
        let span = last.signed_duration_since(first).num_days() as usize;
        prop_assert_eq!(snapshots.len(), span / 7 + 1);

        for snapshot in &snapshots {
            let validation = validate_snapshot(snapshot);
            prop_assert!(validation.is_valid, "{:?}: {:?}", snapshot, validation.errors);
            prop_assert!((0.0..=1.0).contains(&snapshot.completion_rate));
            prop_assert!(snapshot.total_share() <= 1.0 + 1e-9);
            prop_assert!(snapshot.minutes >= 0);
        }

        for pair in snapshots.windows(2) {
            prop_assert_eq!(pair[1].week_end.signed_duration_since(pair[0].week_end).num_days(), 7);
        }
    }

    #[test]
    fn extraction_ignores_record_order(mut records in prop::collection::vec(arb_record(), 1..40)) {
        let forward = extract_weekly_snapshots(&records);
        records.reverse();
        prop_assert_eq!(forward, extract_weekly_snapshots(&records));
    }
}

// ============================================================================
// Ridge regression
// ============================================================================

proptest! {
    #[test]
    fn ridge_predictions_are_finite((x, y) in arb_training_set(), lambda in 0.0f64..10.0f64) {
        let model = RidgePredictor::fit(&x, &y, lambda).unwrap();

        for row in &x {
            let prediction = model.predict_with_interval(row, 0.95).unwrap();
            prop_assert!(prediction.mean.is_finite());
            prop_assert!(prediction.standard_error.is_finite());
            prop_assert!(prediction.lower <= prediction.mean);
            prop_assert!(prediction.mean <= prediction.upper);
        }
    }

    #[test]
    fn normalized_features_are_bounded((x, _) in arb_training_set()) {
        let (normalized, normalization) = normalize_features(&x).unwrap();

        prop_assert_eq!(normalization.dimension(), 3);
        for row in &normalized {
            for value in row {
                prop_assert!(value.is_finite());
                prop_assert!(value.abs() <= MAX_FEATURE_ABS);
            }
        }
    }
}

// ============================================================================
// Score mapping
// ============================================================================

proptest! {
    #[test]
    fn yds_mapping_stays_on_scale(prediction in arb_prediction()) {
        let mapped = map_to_yds_scale(&prediction);

        for value in [mapped.mean, mapped.lower, mapped.upper] {
            prop_assert!((0.0..=100.0).contains(&value));
        }
        prop_assert!(mapped.lower <= mapped.upper);
        prop_assert_eq!(mapped.standard_error, prediction.standard_error);
    }
}
