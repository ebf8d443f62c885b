//! Derived features: smoothed series, interaction terms and lagged rows.
//!
//! Not used by the default 8-feature model; available for richer models
//! built on the same snapshots.

use crate::types::{WeeklySnapshot, FEATURE_COUNT};

pub const DEFAULT_EWMA_ALPHA: f64 = 0.3;
pub const DEFAULT_LAG_WEEKS: usize = 2;

pub const INTERACTION_FEATURE_NAMES: [&str; 6] = [
    "minutes_x_completion",
    "tasks_x_completion",
    "reading_x_grammar",
    "listening_x_vocab",
    "streak_x_completion",
    "balance_x_volume",
];

/// Exponentially weighted moving average, seeded with the first value
///
/// `alpha` outside (0, 1] falls back to [`DEFAULT_EWMA_ALPHA`].
pub fn ewma(values: &[f64], alpha: f64) -> Vec<f64> {
    let alpha = if alpha > 0.0 && alpha <= 1.0 {
        alpha
    } else {
        DEFAULT_EWMA_ALPHA
    };

    let mut smoothed = Vec::with_capacity(values.len());
    let mut current = match values.first() {
        Some(&first) => first,
        None => return smoothed,
    };
    smoothed.push(current);
    for &value in &values[1..] {
        current = alpha * value + (1.0 - alpha) * current;
        smoothed.push(current);
    }
    smoothed
}

/// Pairwise products, in [`INTERACTION_FEATURE_NAMES`] order
pub fn interaction_features(snapshot: &WeeklySnapshot) -> [f64; 6] {
    let completion = snapshot.completion_rate;
    [
        snapshot.minutes as f64 * completion,
        snapshot.tasks as f64 * completion,
        snapshot.reading_share * snapshot.grammar_share,
        snapshot.listening_share * snapshot.vocab_share,
        snapshot.streak as f64 * completion,
        snapshot.skill_balance() * snapshot.volume_score(),
    ]
}

/// Each week's feature vector followed by those of the `lag_weeks` weeks before it.
///
/// The first `lag_weeks` snapshots have no complete history and produce no
/// row, so the result has `len - lag_weeks` rows of `8 * (lag_weeks + 1)` values.
pub fn lag_features(snapshots: &[WeeklySnapshot], lag_weeks: usize) -> Vec<Vec<f64>> {
    (lag_weeks..snapshots.len())
        .map(|i| {
            let mut row = Vec::with_capacity(FEATURE_COUNT * (lag_weeks + 1));
            for lag in 0..=lag_weeks {
                row.extend(snapshots[i - lag].to_feature_vector());
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn week(i: u64, minutes: i64) -> WeeklySnapshot {
        let mut snapshot = WeeklySnapshot::empty(
            NaiveDate::from_ymd_opt(2024, 1, 7)
                .unwrap()
                .checked_add_days(Days::new(7 * i))
                .unwrap(),
        );
        snapshot.minutes = minutes;
        snapshot.tasks = 10;
        snapshot.completion_rate = 0.5;
        snapshot.streak = 4;
        snapshot.reading_share = 0.4;
        snapshot.listening_share = 0.2;
        snapshot.vocab_share = 0.1;
        snapshot.grammar_share = 0.3;
        snapshot
    }

    #[test]
    fn ewma_smooths_toward_new_values() {
        let smoothed = ewma(&[10.0, 20.0, 20.0], 0.5);
        assert_eq!(smoothed, vec![10.0, 15.0, 17.5]);

        assert!(ewma(&[], 0.3).is_empty());
        assert_eq!(ewma(&[4.0], 0.3), vec![4.0]);
    }

    #[test]
    fn ewma_rejects_bad_alpha() {
        let values = [1.0, 5.0, 3.0];
        assert_eq!(ewma(&values, 0.0), ewma(&values, DEFAULT_EWMA_ALPHA));
        assert_eq!(ewma(&values, f64::NAN), ewma(&values, DEFAULT_EWMA_ALPHA));
        assert_eq!(ewma(&values, 1.0), values.to_vec());
    }

    #[test]
    fn interaction_terms() {
        let snapshot = week(0, 300);
        let features = interaction_features(&snapshot);

        assert_eq!(features.len(), INTERACTION_FEATURE_NAMES.len());
        assert_eq!(features[0], 150.0);
        assert_eq!(features[1], 5.0);
        assert!((features[2] - 0.12).abs() < 1e-12);
        assert!((features[3] - 0.02).abs() < 1e-12);
        assert_eq!(features[4], 2.0);

        let expected = snapshot.skill_balance() * (0.5f64).sqrt();
        assert!((features[5] - expected).abs() < 1e-12);
    }

    #[test]
    fn lag_rows_stack_previous_weeks() {
        let snapshots: Vec<WeeklySnapshot> = (0..5).map(|i| week(i, 100 * (i as i64 + 1))).collect();
        let rows = lag_features(&snapshots, DEFAULT_LAG_WEEKS);

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.len() == FEATURE_COUNT * 3));
        // minutes of weeks 2, 1, 0
        assert_eq!(rows[0][0], 300.0);
        assert_eq!(rows[0][FEATURE_COUNT], 200.0);
        assert_eq!(rows[0][2 * FEATURE_COUNT], 100.0);

        assert!(lag_features(&snapshots[..2], DEFAULT_LAG_WEEKS).is_empty());
        assert_eq!(lag_features(&snapshots, 0).len(), 5);
    }
}
