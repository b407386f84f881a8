use thiserror::Error;

/// Fatal pipeline conditions. Row-level defects never surface here; they
/// are recovered locally and counted into the validation report.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unreadable input source: {0}")]
    UnreadableSource(String),
    #[error("tower reference data unavailable: {0}")]
    TowerReference(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
