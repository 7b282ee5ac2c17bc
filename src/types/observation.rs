//! The hourly observation record produced by the station data fetcher.

use serde::{Deserialize, Serialize};

/// Normalized (case-folded) column names of the observation fields, in output order.
///
/// These are the `global-hourly` columns left once the station, timestamp and source
/// columns have been consumed for matching.
pub const OBSERVATION_FIELDS: [&str; 9] = [
    "report_type",
    "call_sign",
    "quality_control",
    "cig",
    "dew",
    "slp",
    "tmp",
    "vis",
    "wnd",
];

/// One hourly weather record from a station.
///
/// Meteorological values are kept in their ISD encoded form (e.g. `TMP` = `"+0250,1"`,
/// `WND` = `"160,1,N,0046,1"`), exactly as delivered by NCEI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Station code the record belongs to.
    pub station: String,
    /// Raw observation timestamp, e.g. `"2020-06-01T15:00:00"`.
    pub timestamp: String,
    pub report_type: Option<String>,
    pub call_sign: Option<String>,
    pub quality_control: Option<String>,
    /// `CIG`: sky ceiling height.
    pub ceiling: Option<String>,
    /// `DEW`: dew point temperature.
    pub dew_point: Option<String>,
    /// `SLP`: sea level pressure.
    pub sea_level_pressure: Option<String>,
    /// `TMP`: air temperature.
    pub temperature: Option<String>,
    /// `VIS`: horizontal visibility.
    pub visibility: Option<String>,
    /// `WND`: wind direction and speed.
    pub wind: Option<String>,
}

impl Observation {
    /// Returns the value of a field by its normalized column name, in the order of
    /// [`OBSERVATION_FIELDS`].
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "report_type" => &self.report_type,
            "call_sign" => &self.call_sign,
            "quality_control" => &self.quality_control,
            "cig" => &self.ceiling,
            "dew" => &self.dew_point,
            "slp" => &self.sea_level_pressure,
            "tmp" => &self.temperature,
            "vis" => &self.visibility,
            "wnd" => &self.wind,
            _ => return None,
        };
        value.as_deref()
    }
}
