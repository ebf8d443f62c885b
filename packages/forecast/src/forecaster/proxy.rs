//! Regression targets: shadow exam scores where available, a synthesized
//! proxy score for every other week.

use chrono::Days;

use crate::types::{
    ShadowExamScore, WeeklySnapshot, TARGET_STREAK_DAYS, TARGET_WEEKLY_MINUTES,
    TARGET_WEEKLY_TASKS,
};

pub const PROXY_FLOOR: f64 = 15.0;
pub const PROXY_CEILING: f64 = 85.0;

const VOLUME_WEIGHT: f64 = 0.35;
const TASK_WEIGHT: f64 = 0.15;
const CONSISTENCY_WEIGHT: f64 = 0.30;
const STREAK_WEIGHT: f64 = 0.20;

/// Proxy exam score in [15, 85].
///
/// Non-decreasing in minutes, tasks, completion rate and streak, and strictly
/// increasing in each while it is below its cap.
pub fn proxy_score(snapshot: &WeeklySnapshot) -> f64 {
    let volume = capped_ratio(snapshot.minutes as f64, TARGET_WEEKLY_MINUTES);
    let tasks = capped_ratio(snapshot.tasks as f64, TARGET_WEEKLY_TASKS);
    let consistency = if snapshot.completion_rate.is_finite() {
        snapshot.completion_rate.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let streak = capped_ratio(snapshot.streak as f64, TARGET_STREAK_DAYS);

    let raw = VOLUME_WEIGHT * volume
        + TASK_WEIGHT * tasks
        + CONSISTENCY_WEIGHT * consistency
        + STREAK_WEIGHT * streak;

    (PROXY_FLOOR + (PROXY_CEILING - PROXY_FLOOR) * raw).clamp(PROXY_FLOOR, PROXY_CEILING)
}

fn capped_ratio(value: f64, target: f64) -> f64 {
    (value / target).clamp(0.0, 1.0)
}

/// Latest shadow score dated inside the snapshot's week
pub fn matching_shadow_score<'a>(
    snapshot: &WeeklySnapshot,
    shadow_scores: &'a [ShadowExamScore],
) -> Option<&'a ShadowExamScore> {
    let week_start = snapshot
        .week_end
        .checked_sub_days(Days::new(6))
        .unwrap_or(snapshot.week_end);

    shadow_scores
        .iter()
        .filter(|score| score.date >= week_start && score.date <= snapshot.week_end)
        .max_by_key(|score| score.date)
}

/// One target per snapshot plus the number of weeks backed by a shadow score
pub fn build_targets(
    snapshots: &[WeeklySnapshot],
    shadow_scores: &[ShadowExamScore],
) -> (Vec<f64>, usize) {
    let mut matched = 0;
    let targets = snapshots
        .iter()
        .map(|snapshot| match matching_shadow_score(snapshot, shadow_scores) {
            Some(score) => {
                matched += 1;
                score.score
            }
            None => proxy_score(snapshot),
        })
        .collect();

    (targets, matched)
}
