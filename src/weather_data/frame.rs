//! Conversion between raw `global-hourly` CSV payloads, the normalized frame that is
//! cached, and [`Observation`] records.

use crate::types::observation::Observation;
use crate::utils::{cell, normalize_column_names, read_csv_as_strings, string_column};
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDate;
use polars::prelude::*;
use tokio::task;

/// Column of the point service that carries no observation data.
const SOURCE_COLUMN: &str = "source";
const DATE_COLUMN: &str = "date";

/// Parses a CSV payload from either NCEI endpoint into a frame with case-folded, trimmed
/// column names and without the `source` column.
///
/// An empty body gives an empty frame. Any other payload must carry a `date` column; a body
/// that parses as CSV but is not observation data (an HTML maintenance page, say) is an
/// error.
pub(crate) async fn normalized_frame(
    bytes: Vec<u8>,
    station: &str,
) -> Result<DataFrame, WeatherDataError> {
    let station_owned = station.to_string();
    task::spawn_blocking(move || {
        let mut df =
            read_csv_as_strings(bytes).map_err(|e| WeatherDataError::CsvReadPolars {
                station: station_owned.clone(),
                source: e,
            })?;
        if df.width() == 0 {
            return Ok(df);
        }
        normalize_column_names(&mut df)?;
        if df.get_column_index(DATE_COLUMN).is_none() {
            return Err(WeatherDataError::MissingColumnError {
                station: station_owned,
                column: DATE_COLUMN.to_string(),
            });
        }
        if df.get_column_index(SOURCE_COLUMN).is_some() {
            df.drop_in_place(SOURCE_COLUMN)?;
        }
        Ok(df)
    })
    .await?
}

/// Extracts the observations recorded on `date` from a station-year frame, in frame order.
pub(crate) fn observations_on(
    df: &DataFrame,
    station: &str,
    date: NaiveDate,
) -> Result<Vec<Observation>, WeatherDataError> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }
    if string_column(df, DATE_COLUMN).is_none() {
        return Err(WeatherDataError::MissingColumnError {
            station: station.to_string(),
            column: DATE_COLUMN.to_string(),
        });
    }

    let day = date.format("%Y-%m-%d").to_string();
    let day_df = df
        .clone()
        .lazy()
        .filter(col(DATE_COLUMN).str().starts_with(lit(day)))
        .collect()?;

    let timestamps = string_column(&day_df, DATE_COLUMN);
    let stations = string_column(&day_df, "station");
    let report_type = string_column(&day_df, "report_type");
    let call_sign = string_column(&day_df, "call_sign");
    let quality_control = string_column(&day_df, "quality_control");
    let cig = string_column(&day_df, "cig");
    let dew = string_column(&day_df, "dew");
    let slp = string_column(&day_df, "slp");
    let tmp = string_column(&day_df, "tmp");
    let vis = string_column(&day_df, "vis");
    let wnd = string_column(&day_df, "wnd");

    let observations = (0..day_df.height())
        .filter_map(|idx| {
            Some(Observation {
                timestamp: cell(timestamps, idx)?,
                station: cell(stations, idx).unwrap_or_else(|| station.to_string()),
                report_type: cell(report_type, idx),
                call_sign: cell(call_sign, idx),
                quality_control: cell(quality_control, idx),
                ceiling: cell(cig, idx),
                dew_point: cell(dew, idx),
                sea_level_pressure: cell(slp, idx),
                temperature: cell(tmp, idx),
                visibility: cell(vis, idx),
                wind: cell(wnd, idx),
            })
        })
        .collect();
    Ok(observations)
}
