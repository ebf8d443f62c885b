//! Range and structure checks for model inputs.
//!
//! Every check runs; violations are collected into one [`ValidationResult`].

use crate::types::{
    DailyActivityRecord, ShadowExamScore, ValidationResult, WeeklySnapshot, SCORE_MAX, SCORE_MIN,
    SHARE_SUM_TOLERANCE,
};

/// Weeks at the end of the history that must contain some study time
pub const RECENT_ACTIVITY_WEEKS: usize = 4;

pub fn validate_snapshot(snapshot: &WeeklySnapshot) -> ValidationResult {
    let mut errors = Vec::new();

    if snapshot.minutes < 0 {
        errors.push(format!("Negative minutes: {}", snapshot.minutes));
    }
    if snapshot.tasks < 0 {
        errors.push(format!("Negative tasks: {}", snapshot.tasks));
    }
    if !(0.0..=1.0).contains(&snapshot.completion_rate) {
        errors.push(format!(
            "Invalid completion rate: {} (expected 0..=1)",
            snapshot.completion_rate
        ));
    }
    if snapshot.streak < 0 {
        errors.push(format!("Negative streak: {}", snapshot.streak));
    }

    let shares = [
        ("reading", snapshot.reading_share),
        ("listening", snapshot.listening_share),
        ("vocab", snapshot.vocab_share),
        ("grammar", snapshot.grammar_share),
    ];
    for (name, share) in shares {
        if !share.is_finite() || share < 0.0 {
            errors.push(format!("Invalid {name} share: {share}"));
        }
    }

    let total = snapshot.total_share();
    if total.is_finite() && total > SHARE_SUM_TOLERANCE {
        errors.push(format!(
            "Skill shares sum to {total:.2}, above {SHARE_SUM_TOLERANCE}"
        ));
    }

    ValidationResult::from_errors(errors)
}

pub fn validate_shadow_score(score: &ShadowExamScore) -> ValidationResult {
    let mut errors = Vec::new();
    if !(SCORE_MIN..=SCORE_MAX).contains(&score.score) {
        errors.push(format!(
            "Shadow score on {} out of range: {} (expected {SCORE_MIN}..={SCORE_MAX})",
            score.date, score.score
        ));
    }
    ValidationResult::from_errors(errors)
}

pub fn validate_record(record: &DailyActivityRecord) -> ValidationResult {
    let mut errors = Vec::new();
    if !(0.0..=1.0).contains(&record.average_accuracy) {
        errors.push(format!(
            "Invalid accuracy on {}: {} (expected 0..=1)",
            record.date, record.average_accuracy
        ));
    }
    ValidationResult::from_errors(errors)
}

/// Enough weeks, some real activity, and activity in the most recent weeks
pub fn has_sufficient_data(snapshots: &[WeeklySnapshot], min_weeks: usize) -> bool {
    if snapshots.len() < min_weeks {
        return false;
    }

    let has_activity = snapshots.iter().any(|s| s.minutes > 0 && s.tasks > 0);
    let recent_start = snapshots.len().saturating_sub(RECENT_ACTIVITY_WEEKS);
    let recently_active = snapshots[recent_start..].iter().any(|s| s.minutes > 0);

    has_activity && recently_active
}
