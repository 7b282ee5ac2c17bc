use crate::types::observation::Observation;
use crate::weather_data::cache::ObservationCache;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::frame::{normalized_frame, observations_on};
use crate::weather_data::transport::{HttpTransport, ReqwestTransport};
use bon::Builder;
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use polars::prelude::DataFrame;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const POINT_SERVICE_URL: &str = "https://www.ncei.noaa.gov/access/services/data/v1";
const BULK_ARCHIVE_URL: &str = "https://www.ncei.noaa.gov/data/global-hourly/access";

/// Retry policy for the point observation service.
///
/// Worst case a single station lookup takes
/// `max_attempts * (request_timeout + retry_delay)` before the bulk archive is tried.
#[derive(Debug, Clone, Builder)]
pub struct FetchPolicy {
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    #[builder(default = DEFAULT_RETRY_DELAY)]
    pub retry_delay: Duration,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Base URLs of the two NCEI endpoints.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub point_service: String,
    pub bulk_archive: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            point_service: POINT_SERVICE_URL.to_string(),
            bulk_archive: BULK_ARCHIVE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Access-data query for one station's whole year of `global-hourly` observations.
    pub fn point_url(&self, station: &str, year: i32) -> String {
        format!(
            "{}?dataset=global-hourly&stations={station}\
             &dataTypes=WND,CIG,VIS,TMP,DEW,SLP\
             &startDate={year}-01-01&endDate={year}-12-31&includeAttributes=true&format=csv",
            self.point_service
        )
    }

    pub fn archive_url(&self, station: &str, year: i32) -> String {
        format!("{}/{year}/{station}.csv", self.bulk_archive)
    }
}

/// Anything that can supply a station's hourly observations for a date.
///
/// Implementations never fail: a station without usable data yields an empty vector.
#[allow(async_fn_in_trait)]
pub trait ObservationProvider {
    async fn observations(&self, station: &str, date: NaiveDate) -> Vec<Observation>;
}

/// Fetches hourly observations for a station from NCEI.
///
/// Lookup order for a (station, year):
/// 1. the local per-year parquet cache, if enabled;
/// 2. the point observation service, retried up to [`FetchPolicy::max_attempts`] times;
/// 3. the station's bulk archive file for the year.
///
/// A non-empty remote result is written to the cache, so each (station, year) is
/// downloaded at most once.
pub struct StationDataFetcher<T = ReqwestTransport> {
    transport: T,
    endpoints: Endpoints,
    policy: FetchPolicy,
    cache: Option<ObservationCache>,
}

impl StationDataFetcher<ReqwestTransport> {
    /// Creates a fetcher talking to NCEI over HTTP. `cache_dir` of `None` disables caching.
    pub fn new(policy: FetchPolicy, cache_dir: Option<&Path>) -> Result<Self, WeatherDataError> {
        let transport = ReqwestTransport::new(policy.request_timeout)?;
        Ok(Self::with_transport(transport, policy, cache_dir))
    }
}

impl<T: HttpTransport> StationDataFetcher<T> {
    pub fn with_transport(transport: T, policy: FetchPolicy, cache_dir: Option<&Path>) -> Self {
        Self {
            transport,
            endpoints: Endpoints::default(),
            policy,
            cache: cache_dir.map(ObservationCache::new),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Returns the observations of `station` recorded on `date`.
    ///
    /// Never fails: download, cache and parse errors are logged and produce an empty vector.
    pub async fn fetch(&self, station: &str, date: NaiveDate) -> Vec<Observation> {
        let result = match self.year_frame(station, date.year()).await {
            Ok(df) => observations_on(&df, station, date),
            Err(e) => Err(e),
        };
        match result {
            Ok(observations) => observations,
            Err(e) => {
                warn!("No observations for station {} on {}: {}", station, date, e);
                Vec::new()
            }
        }
    }

    /// Loads the full-year frame for a station, going through cache, point service and
    /// bulk archive in that order.
    pub async fn year_frame(
        &self,
        station: &str,
        year: i32,
    ) -> Result<DataFrame, WeatherDataError> {
        if let Some(cache) = &self.cache {
            match cache.read(year, station).await {
                Ok(Some(df)) => return Ok(df),
                Ok(None) => {}
                Err(e) => warn!(
                    "Ignoring unreadable cache for station {} year {}: {}",
                    station, year, e
                ),
            }
        }

        let df = match self.query_point_service(station, year).await {
            Ok(df) => df,
            Err(e) => {
                warn!(
                    "Point service failed for station {} year {} ({}), falling back to bulk archive",
                    station, year, e
                );
                self.download_archive(station, year).await?
            }
        };

        if let Some(cache) = &self.cache {
            if df.height() > 0 {
                if let Err(e) = cache.write(year, station, df.clone()).await {
                    warn!("Failed to cache station {} year {}: {}", station, year, e);
                }
            }
        }
        Ok(df)
    }

    async fn query_point_service(
        &self,
        station: &str,
        year: i32,
    ) -> Result<DataFrame, WeatherDataError> {
        let url = self.endpoints.point_url(station, year);
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.transport.get(&url).await {
                Ok(response) if response.status.is_success() => {
                    info!(
                        "Point service returned {} for station {} (attempt {}/{})",
                        response.status, station, attempt, attempts
                    );
                    match normalized_frame(response.body, station).await {
                        Ok(df) => return Ok(df),
                        Err(e) => warn!(
                            "Point service sent unusable data for station {} (attempt {}/{}): {}",
                            station, attempt, attempts, e
                        ),
                    }
                }
                Ok(response) => warn!(
                    "Point service returned {} for station {} (attempt {}/{})",
                    response.status, station, attempt, attempts
                ),
                Err(e) => warn!(
                    "Point service request for station {} failed (attempt {}/{}): {}",
                    station, attempt, attempts, e
                ),
            }
            if attempt < attempts {
                tokio::time::sleep(self.policy.retry_delay).await;
            }
        }

        Err(WeatherDataError::RetriesExhausted { url, attempts })
    }

    async fn download_archive(
        &self,
        station: &str,
        year: i32,
    ) -> Result<DataFrame, WeatherDataError> {
        let url = self.endpoints.archive_url(station, year);
        info!("Downloading bulk archive from {}", url);
        let response = self.transport.get(&url).await?;
        if !response.status.is_success() {
            return Err(WeatherDataError::HttpStatus {
                url,
                status: response.status,
            });
        }
        normalized_frame(response.body, station).await
    }
}

impl<T: HttpTransport> ObservationProvider for StationDataFetcher<T> {
    async fn observations(&self, station: &str, date: NaiveDate) -> Vec<Observation> {
        self.fetch(station, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather_data::transport::HttpResponse;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const STATION: &str = "72408013739";

    const POINT_CSV: &str = r#""STATION","DATE","SOURCE","REPORT_TYPE","CALL_SIGN","QUALITY_CONTROL","WND","CIG","VIS","TMP","DEW","SLP"
"72408013739","2020-06-01T14:54:00","7","FM-15","KPHL ","V020","160,5,N,0046,5","01433,5,M,N","016093,5,N,5","+0256,5","+0128,5","10161,5"
"72408013739","2020-06-02T14:54:00","7","FM-15","KPHL ","V020","240,5,N,0031,5","22000,5,9,N","016093,5,N,5","+0271,5","+0133,5","10150,5"
"#;

    const ARCHIVE_CSV: &str = r#""STATION","DATE","SOURCE","REPORT_TYPE","CALL_SIGN","QUALITY_CONTROL","CIG","DEW","SLP","TMP","VIS","WND"
"72408013739","2020-06-01T14:54:00","4","FM-15","KPHL ","V020","01433,5,M,N","+0128,5","10161,5","+0255,5","016093,5,N,5","160,5,N,0046,5"
"#;

    /// In-memory transport: point-service responses are served from a queue (then 500s),
    /// the archive always returns the same response.
    struct ScriptedTransport {
        point: Mutex<VecDeque<HttpResponse>>,
        archive: HttpResponse,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(point: Vec<HttpResponse>, archive: HttpResponse) -> Self {
            Self {
                point: Mutex::new(point.into()),
                archive,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn point_calls(&self) -> usize {
            self.calls().iter().filter(|u| u.contains("/access/services/")).count()
        }

        fn archive_calls(&self) -> usize {
            self.calls().iter().filter(|u| u.contains("/global-hourly/access/")).count()
        }
    }

    impl HttpTransport for &ScriptedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, WeatherDataError> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("/global-hourly/access/") {
                return Ok(self.archive.clone());
            }
            Ok(self
                .point
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| status(StatusCode::INTERNAL_SERVER_ERROR)))
        }
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: StatusCode::OK,
            body: body.as_bytes().to_vec(),
        }
    }

    fn status(status: StatusCode) -> HttpResponse {
        HttpResponse {
            status,
            body: Vec::new(),
        }
    }

    fn policy() -> FetchPolicy {
        FetchPolicy::builder()
            .max_attempts(3)
            .retry_delay(Duration::ZERO)
            .build()
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, day).unwrap()
    }

    #[test]
    fn test_default_policy() {
        let policy = FetchPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.point_url(STATION, 2020),
            "https://www.ncei.noaa.gov/access/services/data/v1?dataset=global-hourly\
             &stations=72408013739&dataTypes=WND,CIG,VIS,TMP,DEW,SLP\
             &startDate=2020-01-01&endDate=2020-12-31&includeAttributes=true&format=csv"
        );
        assert_eq!(
            endpoints.archive_url(STATION, 2020),
            "https://www.ncei.noaa.gov/data/global-hourly/access/2020/72408013739.csv"
        );
    }

    #[tokio::test]
    async fn test_point_service_success() {
        let transport = ScriptedTransport::new(vec![ok(POINT_CSV)], status(StatusCode::NOT_FOUND));
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), None);

        let observations = fetcher.fetch(STATION, june(1)).await;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].timestamp, "2020-06-01T14:54:00");
        assert_eq!(observations[0].temperature.as_deref(), Some("+0256,5"));
        assert_eq!(transport.point_calls(), 1);
        assert_eq!(transport.archive_calls(), 0);
    }

    #[tokio::test]
    async fn test_point_service_retried_until_success() {
        let transport = ScriptedTransport::new(
            vec![
                status(StatusCode::SERVICE_UNAVAILABLE),
                status(StatusCode::TOO_MANY_REQUESTS),
                ok(POINT_CSV),
            ],
            status(StatusCode::NOT_FOUND),
        );
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), None);

        let observations = fetcher.fetch(STATION, june(2)).await;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].wind.as_deref(), Some("240,5,N,0031,5"));
        assert_eq!(transport.point_calls(), 3);
        assert_eq!(transport.archive_calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_archive_after_bounded_retries() {
        let transport = ScriptedTransport::new(Vec::new(), ok(ARCHIVE_CSV));
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), None);

        let observations = fetcher.fetch(STATION, june(1)).await;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].temperature.as_deref(), Some("+0255,5"));
        assert_eq!(observations[0].call_sign.as_deref(), Some("KPHL"));
        assert_eq!(transport.point_calls(), 3);
        assert_eq!(transport.archive_calls(), 1);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty() {
        let transport = ScriptedTransport::new(Vec::new(), status(StatusCode::NOT_FOUND));
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), None);

        assert!(fetcher.fetch(STATION, june(1)).await.is_empty());
        assert_eq!(transport.point_calls(), 3);
        assert_eq!(transport.archive_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let transport = ScriptedTransport::new(vec![ok(POINT_CSV)], status(StatusCode::NOT_FOUND));
        let policy = FetchPolicy::builder()
            .max_attempts(0)
            .retry_delay(Duration::ZERO)
            .build();
        let fetcher = StationDataFetcher::with_transport(&transport, policy, None);

        assert_eq!(fetcher.fetch(STATION, june(1)).await.len(), 1);
        assert_eq!(transport.point_calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_serves_second_fetch() -> Result<(), WeatherDataError> {
        let dir = tempfile::tempdir()?;
        let transport = ScriptedTransport::new(vec![ok(POINT_CSV)], status(StatusCode::NOT_FOUND));
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), Some(dir.path()));

        let first = fetcher.fetch(STATION, june(1)).await;
        let second = fetcher.fetch(STATION, june(1)).await;
        let other_day = fetcher.fetch(STATION, june(2)).await;

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(other_day.len(), 1);
        assert_eq!(transport.calls().len(), 1);
        assert!(dir.path().join("2020_72408013739.parquet").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_result_is_not_cached() -> Result<(), WeatherDataError> {
        let dir = tempfile::tempdir()?;
        let header_only = POINT_CSV.lines().next().unwrap_or_default();
        let transport = ScriptedTransport::new(
            vec![ok(header_only), ok(header_only)],
            status(StatusCode::NOT_FOUND),
        );
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), Some(dir.path()));

        assert!(fetcher.fetch(STATION, june(1)).await.is_empty());
        assert!(fetcher.fetch(STATION, june(1)).await.is_empty());
        assert!(!dir.path().join("2020_72408013739.parquet").exists());
        // A successful but empty answer is final: no retry, no archive.
        assert_eq!(transport.point_calls(), 2);
        assert_eq!(transport.archive_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unusable_point_payload_falls_back_to_archive() -> Result<(), WeatherDataError> {
        let dir = tempfile::tempdir()?;
        let maintenance_page =
            "<html><body>Service maintenance</body></html>\nplease retry later\n";
        let transport = ScriptedTransport::new(vec![ok(maintenance_page)], ok(ARCHIVE_CSV));
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), Some(dir.path()));

        let first = fetcher.fetch(STATION, june(1)).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].temperature.as_deref(), Some("+0255,5"));
        assert_eq!(transport.point_calls(), 3);
        assert_eq!(transport.archive_calls(), 1);

        // The archive data, not the maintenance page, is what got cached.
        let second = fetcher.fetch(STATION, june(1)).await;
        assert_eq!(first, second);
        assert_eq!(transport.calls().len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_custom_endpoints_are_queried() {
        let transport = ScriptedTransport::new(Vec::new(), ok(ARCHIVE_CSV));
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), None).with_endpoints(
            Endpoints {
                point_service: "http://mirror.test/access/services/data/v1".to_string(),
                bulk_archive: "http://mirror.test/data/global-hourly/access".to_string(),
            },
        );

        assert_eq!(fetcher.fetch(STATION, june(1)).await.len(), 1);
        let calls = transport.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|url| url.starts_with("http://mirror.test/")));
        assert_eq!(
            calls[3],
            "http://mirror.test/data/global-hourly/access/2020/72408013739.csv"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let transport = ScriptedTransport::new(Vec::new(), status(StatusCode::NOT_FOUND));
        let delay = Duration::from_millis(200);
        let policy = FetchPolicy::builder()
            .max_attempts(3)
            .retry_delay(delay)
            .build();
        let fetcher = StationDataFetcher::with_transport(&transport, policy, None);

        let started = tokio::time::Instant::now();
        assert!(fetcher.fetch(STATION, june(1)).await.is_empty());
        let elapsed = started.elapsed();

        // Three attempts, two pauses, none after the last attempt.
        assert_eq!(transport.point_calls(), 3);
        assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
        assert!(elapsed < delay * 3, "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_year_frame_normalizes_columns() -> Result<(), WeatherDataError> {
        let transport = ScriptedTransport::new(vec![ok(POINT_CSV)], status(StatusCode::NOT_FOUND));
        let fetcher = StationDataFetcher::with_transport(&transport, policy(), None);

        let df = fetcher.year_frame(STATION, 2020).await?;
        assert!(df.get_column_index("source").is_none());
        assert!(df.get_column_index("wnd").is_some());
        assert!(df.get_column_index("WND").is_none());
        Ok(())
    }
}
