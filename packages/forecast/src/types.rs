//! Common Types and Constants
//!
//! Shared data structures used across the forecasting modules: the daily
//! activity log entries consumed as input, the weekly snapshots used as
//! regression rows, and the value objects handed back to callers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Minimum regularization parameter
pub const MIN_LAMBDA: f64 = 1e-3;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

/// Maximum absolute value of a normalized feature
pub const MAX_FEATURE_ABS: f64 = 50.0;

/// Maximum magnitude of a Gram matrix entry
pub const MAX_GRAM_VALUE: f64 = 1e12;

/// Condition estimate above which a system counts as ill-conditioned
pub const MAX_CONDITION_NUMBER: f64 = 1e12;

/// Standard deviation below which a feature column is treated as constant
pub const MIN_FEATURE_STD: f64 = 1e-8;

/// Minimum R² for a model to be considered reliable
pub const MIN_RELIABLE_R2: f64 = 0.3;

/// Minimum training rows for a model to be considered reliable
pub const MIN_RELIABLE_POINTS: usize = 5;

/// Skill shares may sum slightly above 1.0 before a snapshot is rejected
pub const SHARE_SUM_TOLERANCE: f64 = 1.1;

/// Default two-sided confidence level for prediction intervals
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Score scale bounds
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Weekly study volume treated as "full effort" (one hour a day)
pub const TARGET_WEEKLY_MINUTES: f64 = 420.0;

/// Weekly task count treated as "full effort"
pub const TARGET_WEEKLY_TASKS: f64 = 20.0;

/// Streak length treated as fully established
pub const TARGET_STREAK_DAYS: f64 = 21.0;

/// Number of regression features per weekly snapshot
pub const FEATURE_COUNT: usize = 8;

/// Feature names, in feature-vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "minutes",
    "tasks",
    "completion_rate",
    "streak",
    "reading_share",
    "listening_share",
    "vocab_share",
    "grammar_share",
];

pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}

// ==================== Activity Log Types ====================

/// Skill category a block of study minutes was spent on
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Grammar,
    Reading,
    Listening,
    Vocabulary,
    Speaking,
    Writing,
    PracticeExam,
    Other,
}

impl Skill {
    pub fn display_name(&self) -> &'static str {
        match self {
            Skill::Grammar => "Grammar",
            Skill::Reading => "Reading",
            Skill::Listening => "Listening",
            Skill::Vocabulary => "Vocabulary",
            Skill::Speaking => "Speaking",
            Skill::Writing => "Writing",
            Skill::PracticeExam => "Practice Exam",
            Skill::Other => "Other",
        }
    }
}

/// One calendar day of logged study activity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivityRecord {
    pub date: NaiveDate,
    pub total_minutes: u32,
    pub tasks_completed: u32,
    /// Fraction of correct answers, in [0, 1]
    pub average_accuracy: f64,
    #[serde(default)]
    pub skill_breakdown: BTreeMap<Skill, u32>,
    pub streak_day_number: u32,
}

impl DailyActivityRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total_minutes: 0,
            tasks_completed: 0,
            average_accuracy: 0.0,
            skill_breakdown: BTreeMap::new(),
            streak_day_number: 0,
        }
    }

    /// A day counts as active when anything at all was studied or completed
    pub fn is_active(&self) -> bool {
        self.total_minutes > 0 || self.tasks_completed > 0
    }

    pub fn skill_minutes(&self, skill: Skill) -> u32 {
        self.skill_breakdown.get(&skill).copied().unwrap_or(0)
    }
}

// ==================== Weekly Snapshot ====================

/// Aggregated activity of one 7-day window; one regression row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySnapshot {
    pub week_end: NaiveDate,
    pub minutes: i64,
    pub tasks: i64,
    pub completion_rate: f64,
    pub streak: i64,
    pub reading_share: f64,
    pub listening_share: f64,
    pub vocab_share: f64,
    pub grammar_share: f64,
}

impl WeeklySnapshot {
    /// An empty week ending on `week_end`
    pub fn empty(week_end: NaiveDate) -> Self {
        Self {
            week_end,
            minutes: 0,
            tasks: 0,
            completion_rate: 0.0,
            streak: 0,
            reading_share: 0.0,
            listening_share: 0.0,
            vocab_share: 0.0,
            grammar_share: 0.0,
        }
    }

    /// Feature vector in [`FEATURE_NAMES`] order
    pub fn to_feature_vector(&self) -> Vec<f64> {
        vec![
            self.minutes as f64,
            self.tasks as f64,
            self.completion_rate,
            self.streak as f64,
            self.reading_share,
            self.listening_share,
            self.vocab_share,
            self.grammar_share,
        ]
    }

    pub fn shares(&self) -> [f64; 4] {
        [
            self.reading_share,
            self.listening_share,
            self.vocab_share,
            self.grammar_share,
        ]
    }

    pub fn total_share(&self) -> f64 {
        self.shares().iter().sum()
    }

    /// Normalized entropy of the four tracked skill shares, in [0, 1]
    pub fn skill_balance(&self) -> f64 {
        let entropy: f64 = self
            .shares()
            .iter()
            .filter(|&&share| share > 0.0)
            .map(|&share| -share * share.ln())
            .sum();

        (entropy / 4f64.ln()).clamp(0.0, 1.0)
    }

    /// Combined minutes/tasks volume with diminishing returns, in [0, 1]
    pub fn volume_score(&self) -> f64 {
        let minute_score = (self.minutes.max(0) as f64 / 300.0).min(1.0);
        let task_score = (self.tasks.max(0) as f64 / 20.0).min(1.0);
        (minute_score * task_score).sqrt()
    }
}

// ==================== Exam Scores ====================

/// Kind of practice exam a shadow score came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    YdsPractice,
    YokdilPractice,
    MiniExam,
    ToeflPractice,
    IeltsPractice,
    CustomTest,
}

impl ExamType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ExamType::YdsPractice => "YDS Practice",
            ExamType::YokdilPractice => "YÖKDİL Practice",
            ExamType::MiniExam => "Mini Exam",
            ExamType::ToeflPractice => "TOEFL Practice",
            ExamType::IeltsPractice => "IELTS Practice",
            ExamType::CustomTest => "Custom Test",
        }
    }
}

/// Ground-truth practice exam result, on the 0-100 scale
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowExamScore {
    pub date: NaiveDate,
    pub score: f64,
    pub exam_type: ExamType,
}

// ==================== Prediction Types ====================

/// Point estimate with a two-sided prediction interval
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub standard_error: f64,
    pub confidence: f64,
}

impl PredictionResult {
    pub fn interval_width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Clamp mean and bounds into the exam score range independently
    pub fn map_to_yds_scale(&self) -> Self {
        Self {
            mean: self.mean.clamp(SCORE_MIN, SCORE_MAX),
            lower: self.lower.clamp(SCORE_MIN, SCORE_MAX),
            upper: self.upper.clamp(SCORE_MIN, SCORE_MAX),
            standard_error: self.standard_error,
            confidence: self.confidence,
        }
    }
}

/// Fit quality of a trained ridge model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDiagnostics {
    pub r_squared: f64,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub condition_number: f64,
    pub is_well_conditioned: bool,
    pub is_reliable: bool,
    pub effective_data_points: usize,
    pub regularization_strength: f64,
}

impl ModelDiagnostics {
    pub fn quality_description(&self) -> &'static str {
        if self.r_squared > 0.7 && self.is_well_conditioned {
            "Excellent"
        } else if self.r_squared > 0.5 && self.is_well_conditioned {
            "Good"
        } else if self.r_squared > 0.3 {
            "Fair"
        } else {
            "Poor"
        }
    }
}

/// k-fold cross-validation outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvResult {
    pub mean_score: f64,
    pub std_score: f64,
    pub scores: Vec<f64>,
    pub is_stable: bool,
}

/// Outcome of validating one snapshot or record; errors are never short-circuited
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}
