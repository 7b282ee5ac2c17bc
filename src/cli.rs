use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use strike_weather::{
    FetchPolicy, RunConfig, DEFAULT_CANDIDATE_LIMIT, DEFAULT_CHECKPOINT_INTERVAL,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_DIR,
};

#[derive(Debug, Parser)]
#[command(about = "Attach the nearest hourly weather observation to wildlife-strike incidents.")]
pub struct Cli {
    /// First incident date (inclusive)
    pub start_date: NaiveDate,
    /// Last incident date (inclusive)
    pub end_date: NaiveDate,
    /// CSV export of the strike-report table
    #[arg(long, env = "STRIKE_WEATHER_INCIDENTS")]
    pub incidents: PathBuf,
    /// Local ISD station history CSV; downloaded from NCEI when omitted
    #[arg(long, env = "STRIKE_WEATHER_STATIONS")]
    pub stations: Option<PathBuf>,
    /// Cache directory, defaults to the platform cache directory
    #[arg(long, env = "STRIKE_WEATHER_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
    /// Do not read or write the observation cache
    #[arg(long)]
    pub no_cache: bool,
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
    /// Write partial output every N incidents (0 disables)
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_INTERVAL)]
    pub checkpoint_every: usize,
    /// Point service attempts per station-year
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub attempts: u32,
    #[arg(long, default_value_t = 2)]
    pub retry_delay_secs: u64,
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
    /// Nearest stations tried per incident
    #[arg(long, default_value_t = DEFAULT_CANDIDATE_LIMIT)]
    pub candidates: usize,
    /// Airport code whose incidents are matched at end of day
    #[arg(long)]
    pub end_of_day_airport: Option<String>,
}

impl Cli {
    pub fn into_config(self) -> RunConfig {
        let policy = FetchPolicy::builder()
            .max_attempts(self.attempts)
            .retry_delay(Duration::from_secs(self.retry_delay_secs))
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .build();
        RunConfig::builder()
            .start_date(self.start_date)
            .end_date(self.end_date)
            .incidents(self.incidents)
            .maybe_stations(self.stations)
            .maybe_cache_dir(self.cache_dir)
            .use_cache(!self.no_cache)
            .output_dir(self.output_dir)
            .checkpoint_every(self.checkpoint_every)
            .candidates(self.candidates)
            .policy(policy)
            .maybe_end_of_day_airport(self.end_of_day_airport)
            .build()
    }
}
