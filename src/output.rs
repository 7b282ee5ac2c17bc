//! Writing enriched incidents as CSV.

use crate::types::enriched::EnrichedIncident;
use crate::types::observation::OBSERVATION_FIELDS;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

const ID_COLUMN: &str = "index_nr";
const STATION_COLUMN: &str = "st_code";
const DISTANCE_COLUMN: &str = "st_distance";
const DUPLICATE_SUFFIX: &str = "_incident";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory '{0}'")]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to create output file '{0}'")]
    CreateFile(PathBuf, #[source] std::io::Error),

    #[error("Failed to write enriched incidents to '{0}'")]
    Write(PathBuf, #[source] PolarsError),
}

/// File for the partial output written after `processed` incidents.
pub fn checkpoint_path(dir: &Path, start: NaiveDate, end: NaiveDate, processed: usize) -> PathBuf {
    dir.join(format!("enriched_{start}_{end}_{processed}.csv"))
}

pub fn final_path(dir: &Path, start: NaiveDate, end: NaiveDate) -> PathBuf {
    dir.join(format!("enriched_{start}_{end}_full.csv"))
}

/// Lays out enriched incidents as one row each.
///
/// Columns are `index_nr`, `st_code`, `st_distance`, the observation fields, then every
/// other incident attribute in source order. An incident attribute whose name is already
/// taken gets a `_incident` suffix. Attribute names are taken from the first row.
pub fn enriched_frame(rows: &[EnrichedIncident]) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new(
            ID_COLUMN.into(),
            rows.iter()
                .map(|row| row.incident.id.clone())
                .collect::<Vec<String>>(),
        ),
        Column::new(
            STATION_COLUMN.into(),
            rows.iter()
                .map(|row| row.station_code.clone())
                .collect::<Vec<String>>(),
        ),
        Column::new(
            DISTANCE_COLUMN.into(),
            rows.iter().map(|row| row.distance_km).collect::<Vec<f64>>(),
        ),
    ];
    for field in OBSERVATION_FIELDS {
        let values: Vec<Option<String>> = rows
            .iter()
            .map(|row| row.observation.field(field).map(str::to_owned))
            .collect();
        columns.push(Column::new(field.into(), values));
    }

    let mut taken: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let attribute_names: Vec<&str> = rows
        .first()
        .map(|row| {
            row.incident
                .attributes
                .iter()
                .map(|(name, _)| name.as_str())
                .filter(|name| *name != ID_COLUMN)
                .collect()
        })
        .unwrap_or_default();
    for name in attribute_names {
        let values: Vec<Option<String>> = rows
            .iter()
            .map(|row| row.incident.attribute(name).map(str::to_owned))
            .collect();
        let column_name = if taken.iter().any(|t| t == name) {
            format!("{name}{DUPLICATE_SUFFIX}")
        } else {
            name.to_string()
        };
        taken.push(column_name.clone());
        columns.push(Column::new(column_name.into(), values));
    }

    DataFrame::new(columns)
}

/// Writes `rows` to `path` as CSV with a header, creating parent directories.
pub fn write_csv(rows: &[EnrichedIncident], path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::CreateDir(parent.to_path_buf(), e))?;
    }
    let mut df = enriched_frame(rows).map_err(|e| OutputError::Write(path.to_path_buf(), e))?;
    let mut file =
        File::create(path).map_err(|e| OutputError::CreateFile(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| OutputError::Write(path.to_path_buf(), e))?;
    info!("Wrote {} enriched incidents to {}", rows.len(), path.display());
    Ok(())
}
