//! Row-level decoding of the Parquet reading exports.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};

use crate::error::{AppError, AppResult};
use crate::pipeline::Reading;
use crate::sources::models::parse_local_timestamp;

const SENSOR_ID: &str = "SensorId";
const VALUE: &str = "Value";
const LOCAL_TIME: &str = "LocalTimeSpan";

/// Decode every row of one Parquet export into readings, in file order.
///
/// Blocking; call from `spawn_blocking`.
///
/// # Errors
///
/// Returns `AppError::Parquet` if the file cannot be decoded and
/// `AppError::ReadingSource` for a row missing a column or holding an
/// unusable value.
pub fn read_parquet_readings(path: &Path) -> AppResult<Vec<Reading>> {
    let file = std::fs::File::open(path)?;
    let reader = SerializedFileReader::new(file)?;

    let mut readings = Vec::new();
    for row in reader.get_row_iter(None)? {
        readings.push(reading_from_row(&row?)?);
    }
    Ok(readings)
}

fn reading_from_row(row: &Row) -> AppResult<Reading> {
    let mut sensor_id = None;
    let mut value = None;
    let mut local_timestamp = None;

    for (name, field) in row.get_column_iter() {
        match name.as_str() {
            SENSOR_ID => sensor_id = field_as_string(field),
            VALUE => value = field_as_f64(field),
            LOCAL_TIME => local_timestamp = field_as_timestamp(field),
            _ => {}
        }
    }

    let missing = |column: &str| AppError::ReadingSource(format!("row without usable {column}"));
    Ok(Reading::new(
        sensor_id.ok_or_else(|| missing(SENSOR_ID))?.trim().to_uppercase(),
        value.ok_or_else(|| missing(VALUE))?,
        local_timestamp.ok_or_else(|| missing(LOCAL_TIME))?,
    ))
}

fn field_as_string(field: &Field) -> Option<String> {
    match field {
        Field::Str(s) => Some(s.clone()),
        Field::Bytes(b) => b.as_utf8().ok().map(str::to_string),
        _ => None,
    }
}

fn field_as_f64(field: &Field) -> Option<f64> {
    match field {
        Field::Double(v) => Some(*v),
        Field::Float(v) => Some(f64::from(*v)),
        Field::Int(v) => Some(f64::from(*v)),
        Field::Long(v) => Some(*v as f64),
        _ => None,
    }
}

/// Exports store facility wall-clock time; epoch-based values are read back
/// without any offset. Plain `INT64` columns carry nanoseconds.
fn field_as_timestamp(field: &Field) -> Option<NaiveDateTime> {
    match field {
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms).map(|t| t.naive_utc()),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us).map(|t| t.naive_utc()),
        Field::Long(ns) => Some(DateTime::from_timestamp_nanos(*ns).naive_utc()),
        Field::Str(s) => parse_local_timestamp(s),
        _ => None,
    }
}
