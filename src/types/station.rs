//! Defines the data structure representing an ISD weather station as listed in
//! the NOAA station history registry.

use crate::types::location::Coordinates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Represents a single weather-reporting station from the ISD station history.
///
/// The station code used throughout the crate is the USAF identifier followed by the
/// WBAN identifier (e.g. `"72408013739"` for Philadelphia International), which is the
/// form the NCEI `global-hourly` services expect.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The concatenated USAF + WBAN station code.
    pub code: String,
    /// The station name as listed in the registry, if available.
    pub name: Option<String>,
    /// The FIPS country code, if available.
    pub country: Option<String>,
    /// ICAO airport code, if the station is at an airport.
    pub icao: Option<String>,
    /// Last date the registry reports data for this station. `None` if the registry
    /// value is missing or unparseable.
    pub valid_until: Option<NaiveDate>,
    /// Station location; either component may be missing in the registry.
    pub location: Coordinates,
}

impl Station {
    /// Builds a station from its two registry identifiers.
    pub fn new(
        usaf: &str,
        wban: &str,
        valid_until: Option<NaiveDate>,
        location: Coordinates,
    ) -> Self {
        Self {
            code: format!("{}{}", usaf.trim(), wban.trim()),
            name: None,
            country: None,
            icao: None,
            valid_until,
            location,
        }
    }
}
