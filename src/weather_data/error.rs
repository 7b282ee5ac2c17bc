use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherDataError {
    #[error("Failed to build HTTP client for NCEI requests")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to create observation cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to open observation cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode observation cache file '{0}'")]
    ParquetRead(PathBuf, #[source] PolarsError),

    #[error("I/O error writing observation cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing observation cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Request to {0} failed")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("{url} answered with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Giving up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Observation download failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Unreadable observation CSV for station '{station}'")]
    CsvReadPolars {
        station: String,
        #[source]
        source: PolarsError,
    },

    #[error("Observations of station {station} lack column '{column}'")]
    MissingColumnError { station: String, column: String },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed processing observation frame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
