use crate::pipeline::error::EnrichmentError;
use crate::types::enriched::EnrichedIncident;
use chrono::NaiveDate;

/// An incident that could not be enriched, with the fields needed to find it again.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentFailure {
    pub incident_id: String,
    pub airport_id: String,
    pub date: NaiveDate,
    pub error: EnrichmentError,
}

/// Accumulated result of a run. `enriched` only ever grows and holds one row per matched
/// incident, in input order; unmatched incidents are only listed in `failures`.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub enriched: Vec<EnrichedIncident>,
    pub failures: Vec<IncidentFailure>,
    pub processed: usize,
}

impl RunReport {
    pub fn matched(&self) -> usize {
        self.enriched.len()
    }

    pub fn errors(&self) -> usize {
        self.failures.len()
    }
}
