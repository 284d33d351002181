use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::pipeline::roles::{DeviceType, SensorRole};

/// One timestamped sensor observation, as produced by a reading source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    pub value: f64,
    /// Wall-clock time at the facility.
    pub local_timestamp: NaiveDateTime,
}

impl Reading {
    pub fn new(sensor_id: impl Into<String>, value: f64, local_timestamp: NaiveDateTime) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            value,
            local_timestamp,
        }
    }
}

/// Equipment hierarchy for one sensor: location → sub-location → device → sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub sensor_id: String,
    pub location_id: String,
    pub sub_location_id: String,
    pub device_id: String,
    pub device_type_id: String,
    pub device_name: String,
    pub sensor_type_id: String,
    pub sensor_name: String,
}

/// A reading joined to its catalog entry, with the date and hour bucket derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedReading {
    pub sensor_id: String,
    pub sensor_type_id: String,
    pub local_timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub location_id: String,
    pub sub_location_id: String,
    pub device_id: String,
    pub device_type_id: String,
    /// `None` when the catalog carries a device type this pipeline does not know.
    pub device_type: Option<DeviceType>,
    pub device_name: String,
    pub sensor_name: String,
    pub role: SensorRole,
    pub value: f64,
}

impl EnrichedReading {
    #[must_use]
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            date: self.date,
            hour: self.hour,
            location_id: self.location_id.clone(),
        }
    }
}

/// An enriched reading labelled against its metric's safe operating range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedReading<'a> {
    pub reading: &'a EnrichedReading,
    pub in_range: bool,
}

impl ClassifiedReading<'_> {
    /// 1 when the value was inside the safe range, 0 otherwise.
    #[must_use]
    pub fn operation_flag(&self) -> u8 {
        u8::from(self.in_range)
    }
}

/// Grouping key shared by every hourly output table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub location_id: String,
}

/// Hourly operational-compliance row (soda, ice cream).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub location_id: String,
    pub in_range_count: u32,
    pub out_of_range_count: u32,
    pub operational_ratio: f64,
}

/// Hourly mean temperature row (freezing, conservation).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageRow {
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub location_id: String,
    pub mean_value: f64,
}

/// Raw defrost resistance/current log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefrostRow {
    pub local_timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub location_id: String,
    pub device_name: String,
    pub sensor_name: String,
    pub value: f64,
}

/// Truncate a timestamp to the start of its clock hour, keeping only the time of day.
#[must_use]
pub fn hour_bucket(timestamp: NaiveDateTime) -> NaiveTime {
    NaiveTime::MIN + TimeDelta::hours(i64::from(timestamp.hour()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_bucket_drops_minutes_and_seconds() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(8, 59, 59, 999)
            .unwrap();
        assert_eq!(hour_bucket(ts), NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        let midnight = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(hour_bucket(midnight), NaiveTime::MIN);
    }
}
