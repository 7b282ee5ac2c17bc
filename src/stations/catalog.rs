use crate::stations::distance::distance_km;
use crate::stations::error::CatalogError;
use crate::types::location::Coordinates;
use crate::types::station::Station;
use crate::utils::{cell, normalize_column_names, parse_f64, read_csv_as_strings, string_column};
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::NaiveDate;
use futures_util::TryStreamExt;
use log::info;
use ordered_float::OrderedFloat;
use polars::prelude::{DataFrame, StringChunked};
use reqwest::Client;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

const HISTORY_URL: &str = "https://www.ncei.noaa.gov/pub/data/noaa/isd-history.csv";
const HISTORY_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const BINCODE_CACHE_FILE_NAME: &str = "isd_history.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// A station paired with its distance to the location it was ranked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedStation<'a> {
    pub station: &'a Station,
    pub distance_km: f64,
}

/// The stations usable for a run.
///
/// Only stations that are still reporting at the end of the run's date range and that lie
/// in the northern hemisphere (latitude strictly above 0) are kept. The filter is applied
/// once, when the catalog is built.
#[derive(Debug, Clone)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    /// Builds a catalog from already parsed stations, keeping registry order.
    pub fn new(stations: Vec<Station>, run_end: NaiveDate) -> Self {
        let total = stations.len();
        let stations: Vec<Station> = stations
            .into_iter()
            .filter(|station| Self::is_usable(station, run_end))
            .collect();
        info!(
            "Station catalog: {} of {} stations usable for runs ending {}",
            stations.len(),
            total,
            run_end
        );
        StationCatalog { stations }
    }

    /// Loads the catalog from a local copy of the ISD station history CSV.
    pub async fn from_history_file(
        path: &Path,
        run_end: NaiveDate,
    ) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CatalogError::HistoryRead(path.to_path_buf(), e))?;
        let stations = tokio::task::spawn_blocking(move || Self::parse_history(bytes)).await??;
        Ok(Self::new(stations, run_end))
    }

    /// Loads the catalog from the bincode cache in `cache_dir`, downloading and caching the
    /// ISD station history first if no cache exists.
    pub async fn load(cache_dir: &Path, run_end: NaiveDate) -> Result<Self, CatalogError> {
        let cache_file = cache_dir.join(BINCODE_CACHE_FILE_NAME);

        let stations: Vec<Station> = if cache_file.exists() {
            let path_clone = cache_file.clone();
            tokio::task::spawn_blocking(move || Self::get_cached_stations(&path_clone)).await??
        } else {
            info!("Cache file not found. Fetching from URL: {}", HISTORY_URL);
            let bytes = Self::download_history(HISTORY_URL, HISTORY_REQUEST_TIMEOUT).await?;
            let stations =
                tokio::task::spawn_blocking(move || Self::parse_history(bytes)).await??;
            Self::cache_stations(stations.clone(), &cache_file).await?;
            stations
        };

        Ok(Self::new(stations, run_end))
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Ranks every station by distance to `location`, closest first.
    ///
    /// Stations without a defined distance (missing coordinates on either side) are left
    /// out. The sort is stable, so stations at equal distance keep catalog order. Callers
    /// take as many leading candidates as they need.
    pub fn rank_candidates(&self, location: &Coordinates) -> Vec<RankedStation<'_>> {
        let mut ranking: Vec<RankedStation<'_>> = self
            .stations
            .iter()
            .filter_map(|station| {
                distance_km(location, &station.location).map(|distance_km| RankedStation {
                    station,
                    distance_km,
                })
            })
            .collect();
        ranking.sort_by_key(|candidate| OrderedFloat(candidate.distance_km));
        ranking
    }

    fn is_usable(station: &Station, run_end: NaiveDate) -> bool {
        station.valid_until.is_some_and(|end| end >= run_end)
            && station.location.latitude.is_some_and(|lat| lat > 0.0)
    }

    /// Parses the ISD station history CSV. Rows without both registry identifiers are
    /// skipped; everything else is kept, including rows with missing coordinates or dates.
    pub(crate) fn parse_history(bytes: Vec<u8>) -> Result<Vec<Station>, CatalogError> {
        let mut df = read_csv_as_strings(bytes)?;
        normalize_column_names(&mut df)?;

        let usaf = required_column(&df, "usaf")?;
        let wban = required_column(&df, "wban")?;
        let lat = required_column(&df, "lat")?;
        let lon = required_column(&df, "lon")?;
        let end = required_column(&df, "end")?;
        let name = string_column(&df, "station name");
        let country = string_column(&df, "ctry");
        let icao = string_column(&df, "icao");

        let mut stations = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let (Some(usaf_id), Some(wban_id)) = (cell(Some(usaf), idx), cell(Some(wban), idx))
            else {
                continue;
            };
            let location = Coordinates::new(parse_f64(lat.get(idx)), parse_f64(lon.get(idx)));
            let valid_until = end.get(idx).and_then(parse_registry_date);
            let mut station = Station::new(&usaf_id, &wban_id, valid_until, location);
            station.name = cell(name, idx);
            station.country = cell(country, idx);
            station.icao = cell(icao, idx);
            stations.push(station);
        }
        Ok(stations)
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, CatalogError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| CatalogError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded_stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG).map_err(
                |e| CatalogError::CacheDecode(cache_path.to_path_buf(), Box::from(e)),
            )?;
        Ok(decoded_stations)
    }

    async fn download_history(url: &str, timeout: Duration) -> Result<Vec<u8>, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => CatalogError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => CatalogError::NetworkRequest(url.to_string(), e),
                });
            }
        };
        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut reader = StreamReader::new(stream);
        let mut body = Vec::with_capacity(4_000_000);
        reader.read_to_end(&mut body).await?;
        Ok(body)
    }

    async fn cache_stations(stations: Vec<Station>, cache_path: &Path) -> Result<(), CatalogError> {
        let cache_start = std::time::Instant::now();
        let bincode_data = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| CatalogError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(&cache_path, &bincode_data)
            .await
            .map_err(|e| CatalogError::CacheWrite(cache_path.to_path_buf(), e))?;
        info!(
            "Serialized and wrote station cache ({} bytes) to {} in {:?}",
            bincode_data.len(),
            cache_path.display(),
            cache_start.elapsed()
        );
        Ok(())
    }
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, CatalogError> {
    string_column(df, name).ok_or_else(|| CatalogError::MissingColumn(name.to_string()))
}

/// Registry dates are `YYYYMMDD`; ISO dates are accepted as well.
fn parse_registry_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}
