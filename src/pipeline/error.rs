use crate::alignment::{AlignmentError, HourKey};
use chrono::NaiveDate;
use thiserror::Error;

/// Why an incident ended up without weather data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("No station has a usable distance to the incident location")]
    NoCandidates,

    #[error("No observations on {date} at any of the nearest stations ({})", .tried.join(", "))]
    NoStationData { date: NaiveDate, tried: Vec<String> },

    #[error("Incident time could not be aligned: {0}")]
    IncidentTime(#[from] AlignmentError),

    #[error("Station {station} has no observation at {} {}", .key.date, .key.hour)]
    NoTimeMatch { station: String, key: HourKey },
}
