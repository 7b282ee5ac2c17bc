use crate::pipeline::{DEFAULT_CANDIDATE_LIMIT, DEFAULT_CHECKPOINT_INTERVAL};
use crate::weather_data::fetcher::FetchPolicy;
use bon::Builder;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Directory enriched CSV files are written to when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Everything a single enrichment run needs.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strike_weather::RunConfig;
///
/// let config = RunConfig::builder()
///     .start_date(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap())
///     .end_date(NaiveDate::from_ymd_opt(2020, 6, 30).unwrap())
///     .incidents("strikes.csv")
///     .build();
/// assert!(config.use_cache);
/// assert_eq!(config.candidates, 3);
/// assert_eq!(config.checkpoint_every, 50);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct RunConfig {
    /// First incident date included in the run.
    pub start_date: NaiveDate,
    /// Last incident date included in the run. Also the date stations must still be
    /// reporting on to be considered.
    pub end_date: NaiveDate,
    /// CSV export of the strike-report table.
    #[builder(into)]
    pub incidents: PathBuf,
    /// Local copy of the ISD station history CSV. Downloaded from NCEI when absent.
    #[builder(into)]
    pub stations: Option<PathBuf>,
    /// Defaults to the platform cache directory.
    #[builder(into)]
    pub cache_dir: Option<PathBuf>,
    /// Whether fetched observations are read from and written to the parquet cache.
    #[builder(default = true)]
    pub use_cache: bool,
    #[builder(into, default = PathBuf::from(DEFAULT_OUTPUT_DIR))]
    pub output_dir: PathBuf,
    /// Write partial output after this many incidents; `0` disables checkpoints.
    #[builder(default = DEFAULT_CHECKPOINT_INTERVAL)]
    pub checkpoint_every: usize,
    /// Nearest stations tried per incident.
    #[builder(default = DEFAULT_CANDIDATE_LIMIT)]
    pub candidates: usize,
    #[builder(default)]
    pub policy: FetchPolicy,
    /// Airport code whose incidents are keyed at end of day.
    #[builder(into)]
    pub end_of_day_airport: Option<String>,
}
