//! Per-incident enrichment: rank stations, walk the candidates until one has data,
//! align times and join.

pub mod error;
pub mod report;

use crate::alignment::TimeAligner;
use crate::pipeline::error::EnrichmentError;
use crate::pipeline::report::{IncidentFailure, RunReport};
use crate::stations::catalog::StationCatalog;
use crate::types::enriched::EnrichedIncident;
use crate::types::incident::Incident;
use crate::weather_data::fetcher::ObservationProvider;
use bon::bon;
use log::{debug, info, warn};

/// Number of nearest stations tried per incident.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 3;
/// Number of processed incidents between two checkpoint callbacks.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 50;

/// Matches incidents to the nearest station observation.
///
/// Incidents are processed one at a time; a failure on one incident is recorded in the
/// [`RunReport`] and never stops the run.
pub struct EnrichmentPipeline<'a, P> {
    catalog: &'a StationCatalog,
    provider: P,
    aligner: TimeAligner,
    candidate_limit: usize,
    checkpoint_interval: usize,
}

#[bon]
impl<'a, P: ObservationProvider> EnrichmentPipeline<'a, P> {
    /// # Arguments
    ///
    /// * `.catalog(&StationCatalog)`: **Required.** Stations to match against.
    /// * `.provider(P)`: **Required.** Source of station observations, usually a
    ///   [`crate::StationDataFetcher`].
    /// * `.aligner(TimeAligner)`: Optional. Defaults to [`TimeAligner::new`].
    /// * `.candidate_limit(usize)`: Optional. Nearest stations to try, defaults to
    ///   [`DEFAULT_CANDIDATE_LIMIT`].
    /// * `.checkpoint_interval(usize)`: Optional. Defaults to [`DEFAULT_CHECKPOINT_INTERVAL`];
    ///   `0` disables checkpoints.
    #[builder]
    pub fn new(
        catalog: &'a StationCatalog,
        provider: P,
        aligner: Option<TimeAligner>,
        #[builder(default = DEFAULT_CANDIDATE_LIMIT)] candidate_limit: usize,
        #[builder(default = DEFAULT_CHECKPOINT_INTERVAL)] checkpoint_interval: usize,
    ) -> Self {
        Self {
            catalog,
            provider,
            aligner: aligner.unwrap_or_default(),
            candidate_limit,
            checkpoint_interval,
        }
    }

    /// Enriches a single incident.
    ///
    /// The first candidate station (closest first) that returns any observation for the
    /// incident date is used; the remaining candidates are not consulted, even if that
    /// station has no observation at the incident's hour.
    pub async fn enrich(&self, incident: &Incident) -> Result<EnrichedIncident, EnrichmentError> {
        let ranking = self.catalog.rank_candidates(&incident.location);
        if ranking.is_empty() {
            return Err(EnrichmentError::NoCandidates);
        }
        let incident_key = self.aligner.incident_key(incident)?;

        let mut tried = Vec::with_capacity(self.candidate_limit);
        let mut selected = None;
        for candidate in ranking.iter().take(self.candidate_limit) {
            let code = &candidate.station.code;
            let observations = self.provider.observations(code, incident.date).await;
            if observations.is_empty() {
                info!(
                    "No data for station {} on {}, trying next station",
                    code, incident.date
                );
                tried.push(code.clone());
                continue;
            }
            info!("Station found, st_code: {}, date: {}", code, incident.date);
            selected = Some((candidate, observations));
            break;
        }
        let Some((candidate, observations)) = selected else {
            return Err(EnrichmentError::NoStationData {
                date: incident.date,
                tried,
            });
        };

        let observation = observations
            .into_iter()
            .find(|observation| match self.aligner.observation_key(observation) {
                Ok(key) => key == incident_key,
                Err(e) => {
                    debug!("Skipping observation of station {}: {}", observation.station, e);
                    false
                }
            })
            .ok_or_else(|| EnrichmentError::NoTimeMatch {
                station: candidate.station.code.clone(),
                key: incident_key.clone(),
            })?;

        Ok(EnrichedIncident {
            incident: incident.clone(),
            station_code: candidate.station.code.clone(),
            distance_km: candidate.distance_km,
            observation,
        })
    }

    /// Enriches every incident in order and returns the accumulated report.
    pub async fn run<I>(&self, incidents: I) -> RunReport
    where
        I: IntoIterator<Item = Incident>,
    {
        self.run_with_checkpoints(incidents, |_| {}).await
    }

    /// Like [`Self::run`], calling `checkpoint` with the report so far after every
    /// `checkpoint_interval` processed incidents.
    pub async fn run_with_checkpoints<I, F>(&self, incidents: I, mut checkpoint: F) -> RunReport
    where
        I: IntoIterator<Item = Incident>,
        F: FnMut(&RunReport),
    {
        let mut report = RunReport::default();
        for incident in incidents {
            info!(
                "Row num: {}, incident {}, errors: {}",
                report.processed,
                incident.id,
                report.errors()
            );
            match self.enrich(&incident).await {
                Ok(row) => report.enriched.push(row),
                Err(error) => {
                    warn!(
                        "Incident {} (airport {}, {}) not enriched: {}",
                        incident.id, incident.airport_id, incident.date, error
                    );
                    report.failures.push(IncidentFailure {
                        incident_id: incident.id,
                        airport_id: incident.airport_id,
                        date: incident.date,
                        error,
                    });
                }
            }
            report.processed += 1;
            if self.checkpoint_interval > 0 && report.processed % self.checkpoint_interval == 0 {
                checkpoint(&report);
            }
        }
        info!(
            "Run finished: {} incidents processed, {} enriched, {} errors",
            report.processed,
            report.matched(),
            report.errors()
        );
        report
    }
}
