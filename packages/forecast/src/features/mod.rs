//! Feature Extraction
//!
//! Turns the daily activity log into weekly snapshots and snapshots into
//! normalized regression rows.

pub mod derived;
pub mod trend;

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::sanitize::{has_invalid_values, sanitize_feature_vector};
use crate::types::{DailyActivityRecord, Skill, WeeklySnapshot, MIN_FEATURE_STD};

const DAYS_PER_WEEK: i64 = 7;

/// Records more than this many weeks before the newest one are ignored
pub const MAX_HISTORY_WEEKS: i64 = 520;

// ==================== Weekly Snapshots ====================

/// Group records into consecutive 7-day windows anchored at the earliest date.
///
/// Windows with no records between two active ones are emitted as empty
/// weeks, and a trailing window shorter than 7 days is kept. Only the last
/// [`MAX_HISTORY_WEEKS`] weeks before the newest record are used, so the
/// output never exceeds that many snapshots.
pub fn extract_weekly_snapshots(records: &[DailyActivityRecord]) -> Vec<WeeklySnapshot> {
    let last = match records.iter().map(|record| record.date).max() {
        Some(last) => last,
        None => return Vec::new(),
    };

    let max_span_days = MAX_HISTORY_WEEKS * DAYS_PER_WEEK;
    let mut sorted: Vec<&DailyActivityRecord> = records
        .iter()
        .filter(|record| last.signed_duration_since(record.date).num_days() < max_span_days)
        .collect();
    if sorted.len() < records.len() {
        tracing::debug!(
            dropped = records.len() - sorted.len(),
            max_weeks = MAX_HISTORY_WEEKS,
            "ignoring records outside the history window"
        );
    }
    sorted.sort_by_key(|record| record.date);

    let first = match sorted.first() {
        Some(first) => first.date,
        None => return Vec::new(),
    };

    let span_days = last.signed_duration_since(first).num_days();
    let window_count = (span_days / DAYS_PER_WEEK + 1) as usize;

    let mut windows: Vec<Vec<&DailyActivityRecord>> = vec![Vec::new(); window_count];
    for record in sorted {
        let index = record.date.signed_duration_since(first).num_days() / DAYS_PER_WEEK;
        windows[index as usize].push(record);
    }

    windows
        .iter()
        .enumerate()
        .map(|(week, days)| {
            let start_offset = week as i64 * DAYS_PER_WEEK;
            let covered_days = (span_days - start_offset + 1).min(DAYS_PER_WEEK);
            let week_end = add_days(first, start_offset + DAYS_PER_WEEK - 1);
            build_snapshot(week_end, days, covered_days)
        })
        .collect()
}

fn build_snapshot(
    week_end: NaiveDate,
    days: &[&DailyActivityRecord],
    covered_days: i64,
) -> WeeklySnapshot {
    let mut snapshot = WeeklySnapshot::empty(week_end);
    if days.is_empty() {
        return snapshot;
    }

    snapshot.minutes = days.iter().map(|d| i64::from(d.total_minutes)).sum();
    snapshot.tasks = days.iter().map(|d| i64::from(d.tasks_completed)).sum();
    snapshot.streak = days
        .iter()
        .map(|d| i64::from(d.streak_day_number))
        .max()
        .unwrap_or(0);

    let active_days: BTreeSet<NaiveDate> = days
        .iter()
        .filter(|d| d.is_active())
        .map(|d| d.date)
        .collect();
    snapshot.completion_rate = (active_days.len() as f64 / covered_days.max(1) as f64).min(1.0);

    let skill_total = |skill: Skill| -> i64 {
        days.iter().map(|d| i64::from(d.skill_minutes(skill))).sum()
    };
    let logged_skill_minutes: i64 = days
        .iter()
        .flat_map(|d| d.skill_breakdown.values())
        .map(|&m| i64::from(m))
        .sum();

    // inconsistent logs can attribute more skill minutes than were studied
    let denominator = snapshot.minutes.max(logged_skill_minutes);
    if denominator > 0 {
        let share = |skill: Skill| skill_total(skill) as f64 / denominator as f64;
        snapshot.reading_share = share(Skill::Reading);
        snapshot.listening_share = share(Skill::Listening);
        snapshot.vocab_share = share(Skill::Vocabulary);
        snapshot.grammar_share = share(Skill::Grammar);
    }

    snapshot
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// One feature row per snapshot
pub fn create_feature_matrix(snapshots: &[WeeklySnapshot]) -> Vec<Vec<f64>> {
    snapshots.iter().map(WeeklySnapshot::to_feature_vector).collect()
}

// ==================== Normalization ====================

/// Per-column z-score parameters learned from the training rows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureNormalization {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl FeatureNormalization {
    /// Population mean/std per column; near-constant columns get std 1.0
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let means: Vec<f64> = (0..width)
            .map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();

        let stds = means
            .iter()
            .enumerate()
            .map(|(j, mean)| {
                let var = rows.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std.is_finite() && std >= MIN_FEATURE_STD {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Self { means, stds }
    }

    pub fn dimension(&self) -> usize {
        self.means.len()
    }

    pub fn apply(&self, row: &[f64]) -> Result<Vec<f64>, ForecastError> {
        if row.len() != self.dimension() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.dimension(),
                actual: row.len(),
            });
        }

        let mut normalized: Vec<f64> = row
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect();
        sanitize_feature_vector(&mut normalized);
        Ok(normalized)
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForecastError> {
        rows.iter().map(|row| self.apply(row)).collect()
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.means.len() != self.stds.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.means.len(),
                actual: self.stds.len(),
            });
        }
        if has_invalid_values(&self.means) || has_invalid_values(&self.stds) {
            return Err(ForecastError::NonFinite("feature normalization"));
        }
        if self.stds.iter().any(|&s| s <= 0.0) {
            return Err(ForecastError::InvalidModel(
                "non-positive feature scale".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fit z-score parameters on `rows` and return the normalized rows with them
pub fn normalize_features(
    rows: &[Vec<f64>],
) -> Result<(Vec<Vec<f64>>, FeatureNormalization), ForecastError> {
    let normalization = FeatureNormalization::fit(rows);
    let normalized = normalization.transform(rows)?;
    Ok((normalized, normalization))
}
