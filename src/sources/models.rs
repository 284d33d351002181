use chrono::NaiveDateTime;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Deserializer};

use crate::pipeline::{CatalogEntry, Reading};

/// Timestamp layouts seen in the exported reading files.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// One row of a reading export: `SensorId,Value,LocalTimeSpan`
#[derive(Debug, Clone, Deserialize)]
pub struct RawReading {
    #[serde(rename = "SensorId")]
    pub sensor_id: String,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "LocalTimeSpan", deserialize_with = "deserialize_local_timestamp")]
    pub local_timestamp: NaiveDateTime,
}

impl From<RawReading> for Reading {
    fn from(raw: RawReading) -> Self {
        Self {
            sensor_id: raw.sensor_id.trim().to_uppercase(),
            value: raw.value,
            local_timestamp: raw.local_timestamp,
        }
    }
}

/// Parse a facility-local timestamp in any of the accepted layouts.
#[must_use]
pub fn parse_local_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn deserialize_local_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_local_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid LocalTimeSpan: {raw:?}")))
}

/// Row of the catalog hierarchy query. Outer joins leave any level NULL.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CatalogRow {
    pub location_id: Option<String>,
    pub sub_location_id: Option<String>,
    pub device_id: Option<String>,
    pub device_type_id: Option<String>,
    pub device_name: Option<String>,
    pub sensor_id: Option<String>,
    pub sensor_type_id: Option<String>,
    pub sensor_name: Option<String>,
}

impl CatalogRow {
    /// Convert to a catalog entry; rows without a sensor or location carry nothing to join.
    #[must_use]
    pub fn into_entry(self) -> Option<CatalogEntry> {
        let sensor_id = self.sensor_id?;
        let location_id = self.location_id?;
        Some(CatalogEntry {
            sensor_id: sensor_id.trim().to_uppercase(),
            location_id: location_id.to_uppercase(),
            sub_location_id: self.sub_location_id.unwrap_or_default().to_uppercase(),
            device_id: self.device_id.unwrap_or_default().to_uppercase(),
            device_type_id: self.device_type_id.unwrap_or_default().to_uppercase(),
            device_name: self.device_name.unwrap_or_default(),
            sensor_type_id: self.sensor_type_id.unwrap_or_default().to_uppercase(),
            sensor_name: self.sensor_name.unwrap_or_default(),
        })
    }
}
