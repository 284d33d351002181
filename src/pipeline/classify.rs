//! Per-metric selection and in-range labelling.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::pipeline::models::{ClassifiedReading, DefrostRow, EnrichedReading};
use crate::pipeline::roles::{DeviceType, SensorRole, is_defrost_device};

/// Inclusive value range a sensor must stay within to count as operating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingRange {
    pub min: f64,
    pub max: f64,
}

impl OperatingRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Phase current (A) on a soda dispenser.
pub const PHASE_CURRENT_RANGE: OperatingRange = OperatingRange::new(2.0, 11.0);

/// Carbonated water pressure (psi) on a soda dispenser.
pub const CARBONATED_WATER_PRESSURE_RANGE: OperatingRange = OperatingRange::new(20.0, 40.0);

/// Ice cream machine readings must be strictly above this.
pub const ICE_CREAM_MIN_VALUE: f64 = 3.5;

const WINDOW_OPEN_SECS: u32 = 7 * 3600;
const WINDOW_CLOSE_SECS: u32 = 23 * 3600;

/// The output tables, one per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Soda,
    IceCream,
    Freezing,
    Conservation,
    DefrostResistance,
}

impl Metric {
    pub const ALL: [Self; 5] = [
        Self::Soda,
        Self::IceCream,
        Self::Freezing,
        Self::Conservation,
        Self::DefrostResistance,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Soda => "soda",
            Self::IceCream => "ice_cream",
            Self::Freezing => "freezing",
            Self::Conservation => "conservation",
            Self::DefrostResistance => "defrost_resistance",
        }
    }
}

/// Whether a local timestamp falls inside store operating hours, 07:00 to 23:00
/// inclusive at both ends.
#[must_use]
pub fn in_operating_window(timestamp: NaiveDateTime) -> bool {
    let time = timestamp.time();
    let secs = time.num_seconds_from_midnight();
    match secs.cmp(&WINDOW_CLOSE_SECS) {
        std::cmp::Ordering::Less => secs >= WINDOW_OPEN_SECS,
        std::cmp::Ordering::Equal => time.nanosecond() == 0,
        std::cmp::Ordering::Greater => false,
    }
}

/// In-range predicate for a soda dispenser reading.
///
/// Roles other than the phases and the carbonated water pressure are never in range.
#[must_use]
pub fn soda_in_range(role: SensorRole, value: f64) -> bool {
    if role.is_phase() {
        PHASE_CURRENT_RANGE.contains(value)
    } else if role == SensorRole::CarbonatedWaterPressure {
        CARBONATED_WATER_PRESSURE_RANGE.contains(value)
    } else {
        false
    }
}

#[must_use]
pub fn ice_cream_in_range(value: f64) -> bool {
    value > ICE_CREAM_MIN_VALUE
}

/// Soda dispenser readings inside operating hours, labelled in/out of range.
#[must_use]
pub fn classify_soda(enriched: &[EnrichedReading]) -> Vec<ClassifiedReading<'_>> {
    enriched
        .iter()
        .filter(|r| r.device_type == Some(DeviceType::SodaDispenser))
        .filter(|r| in_operating_window(r.local_timestamp))
        .map(|r| ClassifiedReading {
            reading: r,
            in_range: soda_in_range(r.role, r.value),
        })
        .collect()
}

/// Ice cream machine readings inside operating hours, labelled in/out of range.
#[must_use]
pub fn classify_ice_cream(enriched: &[EnrichedReading]) -> Vec<ClassifiedReading<'_>> {
    enriched
        .iter()
        .filter(|r| r.device_type == Some(DeviceType::IceCreamMachine))
        .filter(|r| in_operating_window(r.local_timestamp))
        .map(|r| ClassifiedReading {
            reading: r,
            in_range: ice_cream_in_range(r.value),
        })
        .collect()
}

/// Freezer room readings that feed the hourly mean, excluding the defrost resistance.
pub fn freezing_readings(enriched: &[EnrichedReading]) -> impl Iterator<Item = &EnrichedReading> {
    enriched.iter().filter(|r| {
        r.device_type.is_some_and(DeviceType::is_freezer_room)
            && r.role != SensorRole::DefrostResistance
    })
}

/// Conservation room readings that feed the hourly mean.
pub fn conservation_readings(
    enriched: &[EnrichedReading],
) -> impl Iterator<Item = &EnrichedReading> {
    enriched
        .iter()
        .filter(|r| r.device_type.is_some_and(DeviceType::is_conservation_room))
}

/// Defrost resistance and current readings from the defrost devices, passed through.
#[must_use]
pub fn defrost_log(enriched: &[EnrichedReading]) -> Vec<DefrostRow> {
    enriched
        .iter()
        .filter(|r| r.role.is_defrost() && is_defrost_device(&r.device_name))
        .map(|r| DefrostRow {
            local_timestamp: r.local_timestamp,
            date: r.date,
            hour: r.hour,
            location_id: r.location_id.clone(),
            device_name: r.device_name.clone(),
            sensor_name: r.sensor_name.clone(),
            value: r.value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn operating_window_is_inclusive_at_both_ends() {
        assert!(!in_operating_window(at(6, 59, 59)));
        assert!(in_operating_window(at(7, 0, 0)));
        assert!(in_operating_window(at(15, 30, 0)));
        assert!(in_operating_window(at(23, 0, 0)));
        assert!(!in_operating_window(at(23, 0, 1)));
        assert!(!in_operating_window(at(0, 0, 0)));
    }

    #[test]
    fn operating_window_excludes_sub_second_past_close() {
        let just_after = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(23, 0, 0, 1)
            .unwrap();
        assert!(!in_operating_window(just_after));
    }

    #[test]
    fn phase_range_boundaries_are_in_range() {
        for role in [SensorRole::Phase1, SensorRole::Phase2, SensorRole::Phase3] {
            assert!(soda_in_range(role, 2.0));
            assert!(soda_in_range(role, 11.0));
            assert!(soda_in_range(role, 5.0));
            assert!(!soda_in_range(role, 1.99));
            assert!(!soda_in_range(role, 11.01));
        }
    }

    #[test]
    fn pressure_range_boundaries_are_in_range() {
        let role = SensorRole::CarbonatedWaterPressure;
        assert!(soda_in_range(role, 20.0));
        assert!(soda_in_range(role, 40.0));
        assert!(!soda_in_range(role, 19.9));
        assert!(!soda_in_range(role, 40.1));
        // Pressure values are not judged against the phase range.
        assert!(!soda_in_range(role, 5.0));
    }

    #[test]
    fn other_soda_roles_are_out_of_range() {
        assert!(!soda_in_range(SensorRole::Temperature, 5.0));
    }

    #[test]
    fn ice_cream_threshold_is_strict() {
        assert!(ice_cream_in_range(4.0));
        assert!(!ice_cream_in_range(3.5));
        assert!(!ice_cream_in_range(0.0));
    }
}
