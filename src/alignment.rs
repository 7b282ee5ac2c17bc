//! Rounded-hour join keys for incidents and observations.
//!
//! Both sides are reduced to `(calendar date, "HH:00")`. The date is always the date of the
//! unrounded timestamp, and the hour wraps at midnight, so 23:40 on June 1st keys as
//! `(June 1st, "00:00")` on either side.

use crate::types::incident::Incident;
use crate::types::observation::Observation;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

/// Hour key given to incidents reported at the end-of-day sentinel airport.
pub const END_OF_DAY_KEY: &str = "24:00";

const TIME_OF_DAY_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%H%M"];
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("Incident has no time of day")]
    MissingTime,

    #[error("Unparseable time of day '{0}'")]
    InvalidTime(String),

    #[error("Unparseable timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Join key: calendar date plus rounded hour formatted `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HourKey {
    pub date: NaiveDate,
    pub hour: String,
}

/// Produces join keys for incidents and observations.
///
/// Because the hour wraps while the date stays that of the unrounded time, anything from
/// 23:30 onward keys as `"00:00"` of the *same* day. An incident at 23:40 therefore joins
/// with an observation taken shortly after midnight that morning, almost a day earlier.
#[derive(Debug, Clone, Default)]
pub struct TimeAligner {
    end_of_day_airport: Option<String>,
}

impl TimeAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incidents whose airport identifier equals `airport_id` are keyed at
    /// [`END_OF_DAY_KEY`] instead of their rounded time.
    ///
    /// This reproduces a quirk of the strike-report data, where one airport code marks
    /// reports filed as "end of day". It is not known whether the convention holds beyond
    /// that data set.
    pub fn with_end_of_day_airport(airport_id: impl Into<String>) -> Self {
        Self {
            end_of_day_airport: Some(airport_id.into()),
        }
    }

    pub fn end_of_day_airport(&self) -> Option<&str> {
        self.end_of_day_airport.as_deref()
    }

    pub fn incident_key(&self, incident: &Incident) -> Result<HourKey, AlignmentError> {
        if self
            .end_of_day_airport
            .as_deref()
            .is_some_and(|sentinel| sentinel == incident.airport_id)
        {
            return Ok(HourKey {
                date: incident.date,
                hour: END_OF_DAY_KEY.to_string(),
            });
        }
        let raw = incident
            .time
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AlignmentError::MissingTime)?;
        let time = parse_time_of_day(raw)?;
        Ok(HourKey {
            date: incident.date,
            hour: round_to_hour(time),
        })
    }

    pub fn observation_key(&self, observation: &Observation) -> Result<HourKey, AlignmentError> {
        let timestamp = parse_timestamp(&observation.timestamp)?;
        Ok(HourKey {
            date: timestamp.date(),
            hour: round_to_hour(timestamp.time()),
        })
    }
}

/// Rounds to the nearest whole hour, half up, wrapping at midnight: `14:29` → `"14:00"`,
/// `14:30` → `"15:00"`, `23:45` → `"00:00"`.
pub fn round_to_hour(time: NaiveTime) -> String {
    let seconds = time.num_seconds_from_midnight();
    let hour = ((seconds + 1800) / 3600) % 24;
    format!("{hour:02}:00")
}

pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, AlignmentError> {
    let raw = raw.trim();
    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| AlignmentError::InvalidTime(raw.to_string()))
}

/// Parses an observation timestamp. A bare date (`2020-01-01`) is read as midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, AlignmentError> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| AlignmentError::InvalidTimestamp(raw.to_string()))
}
