//! Wiring of a complete run: load stations and incidents, enrich, write output.

use crate::alignment::TimeAligner;
use crate::config::RunConfig;
use crate::error::StrikeWeatherError;
use crate::incidents::load_incidents;
use crate::output::{checkpoint_path, final_path, write_csv};
use crate::pipeline::report::RunReport;
use crate::pipeline::EnrichmentPipeline;
use crate::stations::catalog::StationCatalog;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::weather_data::fetcher::StationDataFetcher;
use log::{info, warn};

/// Runs the enrichment described by `config` and returns its report.
///
/// Only collaborator failures (reading incidents or stations, writing the final output)
/// are returned as errors. Incidents that cannot be enriched are listed in the report.
/// A failed checkpoint write is logged and the run continues.
pub async fn run(config: &RunConfig) -> Result<RunReport, StrikeWeatherError> {
    if config.start_date > config.end_date {
        return Err(StrikeWeatherError::InvalidDateRange {
            start: config.start_date,
            end: config.end_date,
        });
    }

    let cache_dir = match &config.cache_dir {
        Some(dir) => dir.clone(),
        None => get_cache_dir().map_err(StrikeWeatherError::CacheDirResolution)?,
    };
    ensure_cache_dir_exists(&cache_dir)
        .await
        .map_err(|e| StrikeWeatherError::CacheDirCreation(cache_dir.clone(), e))?;

    let catalog = match &config.stations {
        Some(path) => StationCatalog::from_history_file(path, config.end_date).await?,
        None => StationCatalog::load(&cache_dir, config.end_date).await?,
    };
    let incidents = load_incidents(&config.incidents, config.start_date, config.end_date).await?;

    let observation_cache = config.use_cache.then_some(cache_dir.as_path());
    let fetcher = StationDataFetcher::new(config.policy.clone(), observation_cache)?;
    let aligner = match &config.end_of_day_airport {
        Some(airport) => TimeAligner::with_end_of_day_airport(airport.as_str()),
        None => TimeAligner::new(),
    };
    let pipeline = EnrichmentPipeline::builder()
        .catalog(&catalog)
        .provider(fetcher)
        .aligner(aligner)
        .candidate_limit(config.candidates)
        .checkpoint_interval(config.checkpoint_every)
        .build();

    info!(
        "Enriching {} incidents from {} to {} against {} stations",
        incidents.len(),
        config.start_date,
        config.end_date,
        catalog.len()
    );
    let report = pipeline
        .run_with_checkpoints(incidents, |so_far| {
            let path = checkpoint_path(
                &config.output_dir,
                config.start_date,
                config.end_date,
                so_far.processed,
            );
            if let Err(e) = write_csv(&so_far.enriched, &path) {
                warn!("Checkpoint after {} incidents failed: {}", so_far.processed, e);
            }
        })
        .await;

    write_csv(
        &report.enriched,
        &final_path(&config.output_dir, config.start_date, config.end_date),
    )?;
    info!(
        "Enriched {} of {} incidents, errors: {}",
        report.matched(),
        report.processed,
        report.errors()
    );
    Ok(report)
}
