use crate::incidents::error::IncidentSourceError;
use crate::output::OutputError;
use crate::stations::error::CatalogError;
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run. Per-incident failures are reported in the run report instead.
#[derive(Debug, Error)]
pub enum StrikeWeatherError {
    #[error(transparent)]
    WeatherData(#[from] WeatherDataError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    IncidentSource(#[from] IncidentSourceError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
