//! Enrich wildlife-strike incident records with the nearest hourly weather observation.
//!
//! For every incident the closest ISD stations are ranked by great-circle distance, the
//! first one with observations on the incident date is selected, and the observation in
//! the same rounded hour is attached to the incident.
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use strike_weather::{run, RunConfig, StrikeWeatherError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StrikeWeatherError> {
//!     let config = RunConfig::builder()
//!         .start_date(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap())
//!         .end_date(NaiveDate::from_ymd_opt(2020, 6, 30).unwrap())
//!         .incidents("strikes.csv")
//!         .build();
//!     let report = run(&config).await?;
//!     println!("{} matched, {} errors", report.matched(), report.errors());
//!     Ok(())
//! }
//! ```

mod alignment;
mod config;
mod error;
mod incidents;
mod output;
mod pipeline;
mod runner;
mod stations;
mod types;
mod utils;
mod weather_data;

pub use error::StrikeWeatherError;
pub use config::{RunConfig, DEFAULT_OUTPUT_DIR};
pub use runner::run;

pub use alignment::{
    parse_time_of_day, parse_timestamp, round_to_hour, AlignmentError, HourKey, TimeAligner,
    END_OF_DAY_KEY,
};
pub use incidents::error::IncidentSourceError;
pub use incidents::{load_incidents, parse_incidents};
pub use output::{checkpoint_path, enriched_frame, final_path, write_csv, OutputError};
pub use pipeline::error::EnrichmentError;
pub use pipeline::report::{IncidentFailure, RunReport};
pub use pipeline::{EnrichmentPipeline, DEFAULT_CANDIDATE_LIMIT, DEFAULT_CHECKPOINT_INTERVAL};

pub use stations::catalog::{RankedStation, StationCatalog};
pub use stations::distance::distance_km;
pub use stations::error::CatalogError;

pub use types::enriched::EnrichedIncident;
pub use types::incident::Incident;
pub use types::location::{Coordinates, LatLon};
pub use types::observation::{Observation, OBSERVATION_FIELDS};
pub use types::station::Station;

pub use utils::get_cache_dir;
pub use weather_data::cache::ObservationCache;
pub use weather_data::error::WeatherDataError;
pub use weather_data::fetcher::{
    Endpoints, FetchPolicy, ObservationProvider, StationDataFetcher, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY,
};
pub use weather_data::transport::{HttpResponse, HttpTransport, ReqwestTransport};
