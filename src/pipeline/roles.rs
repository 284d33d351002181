//! Sensor roles, device types and name canonicalisation.
//!
//! Catalog names are free text maintained by hand at each site, so the same
//! role shows up with and without accents or with different capitalisation
//! ("Presión agua carbonatada", "Presión Agua Carbonatada"). Every comparison
//! goes through [`canonicalize`] first and then matches a single canonical key.

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Fold a catalog name into its canonical comparison form.
///
/// Decomposes to NFD and drops combining marks, so precomposed and decomposed
/// accents fold alike, then lowercases and collapses runs of whitespace to a
/// single space.
#[must_use]
pub fn canonicalize(name: &str) -> String {
    let folded = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The sensor roles the pipeline consumes. Any other sensor is dropped at the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorRole {
    Phase1,
    Phase2,
    Phase3,
    CarbonatedWaterPressure,
    Temperature,
    FreezerTemperature,
    ConservationTemperature,
    DefrostCurrent,
    DefrostResistance,
}

impl SensorRole {
    pub const ALL: [Self; 9] = [
        Self::Phase1,
        Self::Phase2,
        Self::Phase3,
        Self::CarbonatedWaterPressure,
        Self::Temperature,
        Self::FreezerTemperature,
        Self::ConservationTemperature,
        Self::DefrostCurrent,
        Self::DefrostResistance,
    ];

    /// Canonical catalog name for this role.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Phase1 => "fase 1",
            Self::Phase2 => "fase 2",
            Self::Phase3 => "fase 3",
            Self::CarbonatedWaterPressure => "presion agua carbonatada",
            Self::Temperature => "temperatura",
            Self::FreezerTemperature => "temperatura congelacion 1",
            Self::ConservationTemperature => "temperatura conservacion",
            Self::DefrostCurrent => "corriente resistencia deshielo",
            Self::DefrostResistance => "resistencia deshielo",
        }
    }

    /// Resolve a catalog sensor name to its role, if it is one the pipeline uses.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let key = canonicalize(name);
        Self::ALL
            .into_iter()
            .find(|role| role.canonical_name() == key)
    }

    /// Electrical phase current sensors on a soda dispenser.
    #[must_use]
    pub fn is_phase(self) -> bool {
        matches!(self, Self::Phase1 | Self::Phase2 | Self::Phase3)
    }

    #[must_use]
    pub fn is_defrost(self) -> bool {
        matches!(self, Self::DefrostCurrent | Self::DefrostResistance)
    }
}

/// Device types present in the equipment catalog.
///
/// The catalog identifies them by opaque GUIDs; comparisons are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    SodaDispenser,
    IceCreamMachine,
    FreezerRoomA,
    FreezerRoomB,
    ConservationRoomA,
    ConservationRoomB,
    /// Catalogued but not consumed by any metric.
    Auxiliary,
}

impl DeviceType {
    pub const ALL: [Self; 7] = [
        Self::SodaDispenser,
        Self::IceCreamMachine,
        Self::FreezerRoomA,
        Self::FreezerRoomB,
        Self::ConservationRoomA,
        Self::ConservationRoomB,
        Self::Auxiliary,
    ];

    /// Catalog identifier, uppercase.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::SodaDispenser => "AF0132F0-3EB7-4F52-593F-08DC84AC4EC2",
            Self::IceCreamMachine => "8CF77DA4-E964-4719-82DA-08DC4394787A",
            Self::FreezerRoomA => "C48A1D4F-664C-4863-2555-08DD462F6DF2",
            Self::FreezerRoomB => "38308792-2617-400D-8914-08DC484D6E84",
            Self::ConservationRoomA => "9EB73A3F-2385-41AB-2554-08DD462F6DF2",
            Self::ConservationRoomB => "F2259CBC-7268-4388-8913-08DC484D6E84",
            Self::Auxiliary => "334AFC4E-08A7-491E-8915-08DC484D6E84",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(id))
    }

    #[must_use]
    pub fn is_freezer_room(self) -> bool {
        matches!(self, Self::FreezerRoomA | Self::FreezerRoomB)
    }

    #[must_use]
    pub fn is_conservation_room(self) -> bool {
        matches!(self, Self::ConservationRoomA | Self::ConservationRoomB)
    }
}

/// Canonical names of the devices whose defrost readings are logged verbatim.
const DEFROST_DEVICE_NAMES: [&str; 2] = ["resistencia de deshielo 1", "cuarto de congelacion"];

/// Whether a catalog device name is one of the defrost-logged devices.
#[must_use]
pub fn is_defrost_device(device_name: &str) -> bool {
    let key = canonicalize(device_name);
    DEFROST_DEVICE_NAMES.contains(&key.as_str())
}
