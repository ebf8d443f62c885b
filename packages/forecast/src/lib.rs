//! # studyplan-forecast - 考试成绩预测引擎
//!
//! 将每日学习记录转换为周特征快照，并用岭回归预测下一次考试成绩及其置信区间。
//!
//! ## 模块结构
//!
//! - [`features`] - 周快照提取、特征标准化、趋势分析
//! - [`validation`] - 快照/记录的范围校验，数据充足性判断
//! - [`matrix`] - 矩阵运算 (Cholesky 分解、线性系统求解)
//! - [`sanitize`] - 数值清洗与条件数诊断
//! - [`ridge`] - 岭回归 (点预测、预测区间、拟合诊断)
//! - [`cross_validation`] - k 折交叉验证
//! - [`forecaster`] - 训练/预测状态机，代理目标分数
//! - [`api`] - 面向调用方的门面，输出限制在 0-100 分
//! - [`config`] / [`logging`] / [`error`] - 配置、日志、错误类型
//!
//! ## 使用示例
//!
//! ```rust
//! use studyplan_forecast::{DailyActivityRecord, PredictionApi};
//!
//! let api = PredictionApi::default();
//! let records: Vec<DailyActivityRecord> = Vec::new();
//! assert!(!api.are_predictions_available(&records));
//! assert!(!api.get_exam_forecast(&records).is_success());
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod api;
pub mod config;
pub mod cross_validation;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod logging;
pub mod matrix;
pub mod ridge;
pub mod sanitize;
pub mod types;
pub mod validation;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use api::{map_to_yds_scale, ForecastFailure, ForecastResult, PredictionApi, PredictionReliability};
pub use config::ForecastConfig;
pub use cross_validation::{k_fold_cv, CrossValidator};
pub use error::ForecastError;
pub use features::trend::{PerformanceDirection, TrendAnalyzer};
pub use features::{extract_weekly_snapshots, FeatureNormalization, MAX_HISTORY_WEEKS};
pub use forecaster::{Forecast, ModelSummary, ScoreForecaster, TrainedModel, TrainingResult};
pub use ridge::{EnhancedRidgePredictor, RidgePredictor};
