use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use time::OffsetDateTime;

use super::classifier::classify;
use super::constants::{
    DRAIN_SWEEP_LABEL, GATE_SWEEP_LABEL, OTHER_LABEL, PROCEDURE_FIELD, TIME_SERIES_LABEL,
};

/// The kind of measurement a record holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Procedure {
    #[serde(rename = "IVg")]
    GateSweep,
    #[serde(rename = "ITS")]
    TimeSeries,
    #[serde(rename = "IV")]
    DrainSweep,
    Other,
}

impl Procedure {
    /// Match a domain label (IVg, ITS, IV) to a Procedure. Case insensitive.
    ///
    /// Returns None if the label is not recognized.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case(GATE_SWEEP_LABEL) {
            Some(Self::GateSweep)
        } else if label.eq_ignore_ascii_case(TIME_SERIES_LABEL) {
            Some(Self::TimeSeries)
        } else if label.eq_ignore_ascii_case(DRAIN_SWEEP_LABEL) {
            Some(Self::DrainSweep)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::GateSweep => GATE_SWEEP_LABEL,
            Self::TimeSeries => TIME_SERIES_LABEL,
            Self::DrainSweep => DRAIN_SWEEP_LABEL,
            Self::Other => OTHER_LABEL,
        }
    }
}

impl Display for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single scalar value parsed from a measurement header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Procedure specific parameters, keyed by field name. Ordered so that output is stable.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Device identity. The group is a naming prefix, the number disambiguates within the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChipId {
    pub group: String,
    pub number: u32,
}

impl ChipId {
    pub fn new(group: &str, number: u32) -> Self {
        Self {
            group: group.to_string(),
            number,
        }
    }
}

impl Display for ChipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.group, self.number)
    }
}

/// What the loader hands over for a single raw file, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeasurement {
    pub chip_group: String,
    pub chip_number: u32,
    pub local_index: u32,
    pub source_path: String,
    pub start_timestamp: OffsetDateTime,
    pub procedure_label: Option<String>,
    pub fields: FieldMap,
}

/// One parsed measurement file.
///
/// `local_index` is only unique within the day named by `day_id`. It must never be used
/// to identify a record across days; that is what the chip history `seq` is for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub chip_group: String,
    pub chip_number: u32,
    pub procedure: Procedure,
    #[serde(with = "time::serde::rfc3339")]
    pub start_timestamp: OffsetDateTime,
    pub local_index: u32,
    pub source_path: String,
    pub fields: FieldMap,
    pub day_id: String,
}

impl MeasurementRecord {
    /// Classify a raw measurement and attach it to a day.
    ///
    /// An explicit label passed by the loader wins over a `procedure` entry in the fields.
    /// A label that is not recognized does not count, so the other one is still considered.
    pub fn from_raw(raw: RawMeasurement, day_id: &str) -> Self {
        let label = [
            raw.procedure_label.as_deref(),
            raw.fields
                .get(PROCEDURE_FIELD)
                .and_then(|value| value.as_str()),
        ]
        .into_iter()
        .flatten()
        .find(|label| Procedure::from_label(label).is_some());
        let procedure = classify(label, &raw.source_path, &raw.fields);
        Self {
            chip_group: raw.chip_group,
            chip_number: raw.chip_number,
            procedure,
            start_timestamp: raw.start_timestamp,
            local_index: raw.local_index,
            source_path: raw.source_path,
            fields: raw.fields,
            day_id: day_id.to_string(),
        }
    }

    pub fn chip(&self) -> ChipId {
        ChipId::new(&self.chip_group, self.chip_number)
    }

    pub fn is_chip(&self, chip_group: &str, chip_number: u32) -> bool {
        self.chip_group == chip_group && self.chip_number == chip_number
    }

    /// The total ordering key used to place a record in its chip's history
    pub fn order_key(&self) -> (OffsetDateTime, u32, &str) {
        (self.start_timestamp, self.local_index, &self.source_path)
    }
}
