use crate::types::incident::Incident;
use crate::types::observation::Observation;

/// An incident joined with the single observation matched to it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedIncident {
    pub incident: Incident,
    /// Code of the station that supplied the observation.
    pub station_code: String,
    /// Great-circle distance from the incident to that station, in km.
    pub distance_km: f64,
    pub observation: Observation,
}
