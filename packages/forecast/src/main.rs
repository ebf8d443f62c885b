use std::path::{Path, PathBuf};
use std::process::ExitCode;

use studyplan_forecast::config::AppConfig;
use studyplan_forecast::logging::init_tracing;
use studyplan_forecast::{DailyActivityRecord, PredictionApi, ShadowExamScore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("usage: studyplan-forecast <records.json> [shadow_scores.json]")]
    Usage,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env();
    let _log_guard = init_tracing(&config);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "forecast run failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: AppConfig) -> Result<(), CliError> {
    let mut args = std::env::args_os().skip(1);
    let records_path = PathBuf::from(args.next().ok_or(CliError::Usage)?);
    let scores_path = args.next().map(PathBuf::from);

    let records: Vec<DailyActivityRecord> = read_json(&records_path)?;
    let shadow_scores: Vec<ShadowExamScore> = match scores_path {
        Some(path) => read_json(&path)?,
        None => Vec::new(),
    };

    tracing::info!(
        records = records.len(),
        shadow_scores = shadow_scores.len(),
        "running exam forecast"
    );

    let api = PredictionApi::new(config.forecast);
    let result = api.get_exam_forecast_with_scores(&records, &shadow_scores);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
