use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IncidentSourceError {
    #[error("Failed to read incident file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse incident CSV")]
    CsvParse(#[from] polars::error::PolarsError),

    #[error("Incident data is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
