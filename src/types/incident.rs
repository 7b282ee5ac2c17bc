//! The wildlife-strike incident record as read from the strike-report export.

use crate::types::location::Coordinates;
use chrono::NaiveDate;

/// One wildlife-strike report.
///
/// The matching-relevant fields are parsed out; `attributes` keeps every raw column of the
/// source row (in source column order, names case-folded) so the full record can be
/// written back out next to the attached observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    /// `INDEX_NR` of the strike report.
    pub id: String,
    pub airport_id: String,
    pub date: NaiveDate,
    /// Raw time-of-day as reported, e.g. `"14:30"`. Often blank in the source.
    pub time: Option<String>,
    pub location: Coordinates,
    pub attributes: Vec<(String, Option<String>)>,
}

impl Incident {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }
}
