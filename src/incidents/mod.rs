//! Loading wildlife-strike incidents from a CSV export of the strike-report table.

pub mod error;

use crate::incidents::error::IncidentSourceError;
use crate::types::incident::Incident;
use crate::types::location::Coordinates;
use crate::utils::{cell, normalize_column_names, parse_f64, read_csv_as_strings, string_column};
use chrono::NaiveDate;
use log::{info, warn};
use polars::prelude::{DataFrame, StringChunked};
use std::path::Path;

const ID_COLUMN: &str = "index_nr";
const AIRPORT_COLUMN: &str = "airport_id";
const DATE_COLUMN: &str = "incident_date";
const TIME_COLUMN: &str = "time";
const LATITUDE_COLUMN: &str = "latitude";
const LONGITUDE_COLUMN: &str = "longitude";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Reads incidents from `path`, keeping those dated within `[start, end]` inclusive.
pub async fn load_incidents(
    path: &Path,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Incident>, IncidentSourceError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| IncidentSourceError::Read(path.to_path_buf(), e))?;
    let incidents =
        tokio::task::spawn_blocking(move || parse_incidents(bytes, start, end)).await??;
    info!(
        "Loaded {} incidents between {} and {} from {}",
        incidents.len(),
        start,
        end,
        path.display()
    );
    Ok(incidents)
}

/// Parses an incident CSV export.
///
/// Column names are case-folded. Rows without an identifier or a readable date cannot be
/// matched or reported and are skipped with a warning. Blank coordinates and times are
/// kept; those incidents fail later, per incident.
pub fn parse_incidents(
    bytes: Vec<u8>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Incident>, IncidentSourceError> {
    let mut df = read_csv_as_strings(bytes)?;
    if df.width() == 0 {
        return Ok(Vec::new());
    }
    normalize_column_names(&mut df)?;

    let ids = required_column(&df, ID_COLUMN)?;
    let airports = required_column(&df, AIRPORT_COLUMN)?;
    let dates = required_column(&df, DATE_COLUMN)?;
    let times = required_column(&df, TIME_COLUMN)?;
    let latitudes = required_column(&df, LATITUDE_COLUMN)?;
    let longitudes = required_column(&df, LONGITUDE_COLUMN)?;

    let columns: Vec<(String, Option<&StringChunked>)> = df
        .get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.str().ok()))
        .collect();

    let mut incidents = Vec::new();
    for idx in 0..df.height() {
        let Some(id) = cell(Some(ids), idx) else {
            warn!("Skipping incident row {}: no {}", idx, ID_COLUMN);
            continue;
        };
        let Some(date) = cell(Some(dates), idx).as_deref().and_then(parse_incident_date) else {
            warn!("Skipping incident {}: unreadable {}", id, DATE_COLUMN);
            continue;
        };
        if date < start || date > end {
            continue;
        }

        let attributes = columns
            .iter()
            .map(|(name, column)| (name.clone(), cell(*column, idx)))
            .collect();
        incidents.push(Incident {
            id,
            airport_id: cell(Some(airports), idx).unwrap_or_default(),
            date,
            time: cell(Some(times), idx),
            location: Coordinates::new(
                parse_f64(latitudes.get(idx)),
                parse_f64(longitudes.get(idx)),
            ),
            attributes,
        });
    }
    Ok(incidents)
}

fn required_column<'a>(
    df: &'a DataFrame,
    name: &str,
) -> Result<&'a StringChunked, IncidentSourceError> {
    string_column(df, name).ok_or_else(|| IncidentSourceError::MissingColumn(name.to_string()))
}

/// Reads the date part of an incident date. Exports write either `2020-06-01` or
/// `6/1/2020 0:00:00`, possibly followed by a time that is ignored here.
fn parse_incident_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split([' ', 'T']).next()?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}
