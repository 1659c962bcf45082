use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;

use super::constants::LOCAL_INDEX_SEPARATOR;
use super::day_table::DayTable;
use super::error::LoaderError;
use super::record::{FieldMap, MeasurementRecord, RawMeasurement};

/// One measurement file as described by its day's manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    #[serde(default)]
    pub procedure: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub fields: FieldMap,
}

/// The manifest found in every day folder.
///
/// Holds the already-parsed header of each raw measurement file in that folder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayManifest {
    pub entries: Vec<ManifestEntry>,
}

impl DayManifest {
    pub fn from_yaml_str(yaml_str: &str) -> Result<Self, LoaderError> {
        Ok(serde_yaml::from_str::<Self>(yaml_str)?)
    }

    /// Read a manifest from disk
    pub fn read(path: &Path) -> Result<Self, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::BadFilePath(path.to_path_buf()));
        }
        let yaml_str = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml_str)
    }

    /// Turn each entry into a RawMeasurement.
    ///
    /// If an entry has no start time, the modification time of the raw file inside `day_dir`
    /// is used instead. Without a `day_dir`, or without the raw file, the entry is rejected.
    pub fn to_raw_measurements(
        &self,
        day_id: &str,
        day_dir: Option<&Path>,
    ) -> Result<Vec<RawMeasurement>, LoaderError> {
        let mut raws = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            let file = entry.file.replace('\\', "/");
            let source_path = format!("{day_id}/{file}");
            let file_name = file.rsplit('/').next().unwrap_or(&file);
            let (chip_group, chip_number, local_index) = parse_file_name(file_name)?;

            let start_timestamp = match entry.start_time {
                Some(start) => start,
                None => fallback_timestamp(day_dir, &file, &source_path)?,
            };

            raws.push(RawMeasurement {
                chip_group,
                chip_number,
                local_index,
                source_path,
                start_timestamp,
                procedure_label: entry.procedure.clone(),
                fields: entry.fields.clone(),
            });
        }
        Ok(raws)
    }
}

fn fallback_timestamp(
    day_dir: Option<&Path>,
    file: &str,
    source_path: &str,
) -> Result<OffsetDateTime, LoaderError> {
    let raw_path = match day_dir {
        Some(dir) => dir.join(file),
        None => return Err(LoaderError::MissingTimestamp(source_path.to_string())),
    };
    if !raw_path.exists() {
        return Err(LoaderError::MissingTimestamp(source_path.to_string()));
    }
    let modified = raw_path.metadata()?.modified()?;
    log::warn!(
        "No start time recorded for {}; using the file modification time",
        source_path
    );
    Ok(OffsetDateTime::from(modified))
}

/// Split a raw file name of the form `<group><number>_<index>.<ext>`.
///
/// Returns the chip group, chip number, and local index.
pub fn parse_file_name(file_name: &str) -> Result<(String, u32, u32), LoaderError> {
    let bad_name = || LoaderError::BadFileName(file_name.to_string());
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };
    let (chip, index) = stem.split_once(LOCAL_INDEX_SEPARATOR).ok_or_else(bad_name)?;

    let digits_start = chip
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)
        .ok_or_else(bad_name)?;
    let (group, number) = chip.split_at(digits_start);
    if group.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad_name());
    }

    let number: u32 = number.parse().map_err(|_| bad_name())?;
    let index: u32 = index.parse().map_err(|_| bad_name())?;
    Ok((group.to_string(), number, index))
}

/// Load a single day folder into a DayTable.
///
/// The folder name is the day id. Returns None when the folder has no manifest.
pub fn load_day(day_dir: &Path, manifest_name: &str) -> Result<Option<DayTable>, LoaderError> {
    let day_id = match day_dir.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => return Err(LoaderError::BadFilePath(day_dir.to_path_buf())),
    };
    let manifest_path = day_dir.join(manifest_name);
    if !manifest_path.exists() {
        log::warn!(
            "Day folder {} has no {}, skipping...",
            day_dir.to_string_lossy(),
            manifest_name
        );
        return Ok(None);
    }

    let manifest = DayManifest::read(&manifest_path)?;
    let records: Vec<MeasurementRecord> = manifest
        .to_raw_measurements(&day_id, Some(day_dir))?
        .into_iter()
        .map(|raw| MeasurementRecord::from_raw(raw, &day_id))
        .collect();
    log::info!("Loaded {} records from day {}", records.len(), day_id);

    Ok(Some(DayTable::build(records, &day_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldValue, Procedure};
    use time::macros::datetime;

    const MANIFEST: &str = r#"
entries:
  - file: Alisson67_001.csv
    procedure: IVg
    start_time: 2025-01-01T09:00:00Z
    fields:
      vg_start: -5.0
      vg_end: 5.0
      wavelength: 365
  - file: ITS/Alisson67_002.csv
    start_time: 2025-01-01T09:10:00+01:00
    fields:
      laser_period: 120.0
      note: dark
"#;

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("Alisson67_015.csv").unwrap(),
            (String::from("Alisson"), 67, 15)
        );
        assert_eq!(
            parse_file_name("Encap8_2").unwrap(),
            (String::from("Encap"), 8, 2)
        );
        for bad in ["Alisson_015.csv", "67_015.csv", "Alisson67.csv", "Alisson67_x1.csv"] {
            assert!(matches!(
                parse_file_name(bad),
                Err(LoaderError::BadFileName(_))
            ));
        }
    }

    #[test]
    fn test_manifest_to_records() {
        let manifest = DayManifest::from_yaml_str(MANIFEST).unwrap();
        let raws = manifest.to_raw_measurements("2025-01-01", None).unwrap();
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[0].source_path, "2025-01-01/Alisson67_001.csv");
        assert_eq!(raws[0].start_timestamp, datetime!(2025-01-01 09:00 UTC));
        assert_eq!(raws[0].fields.get("wavelength"), Some(&FieldValue::Int(365)));
        assert_eq!(raws[1].local_index, 2);
        assert_eq!(raws[1].start_timestamp, datetime!(2025-01-01 08:10 UTC));
        assert_eq!(
            raws[1].fields.get("note"),
            Some(&FieldValue::Text(String::from("dark")))
        );

        let record = MeasurementRecord::from_raw(raws[1].clone(), "2025-01-01");
        assert_eq!(record.procedure, Procedure::TimeSeries);
    }

    #[test]
    fn test_missing_timestamp_without_file() {
        let manifest = DayManifest::from_yaml_str(
            "entries:\n  - file: Alisson67_001.csv\n",
        )
        .unwrap();
        assert!(matches!(
            manifest.to_raw_measurements("d1", None),
            Err(LoaderError::MissingTimestamp(_))
        ));
    }
}
