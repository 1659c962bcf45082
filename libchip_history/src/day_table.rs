use fxhash::FxHashMap;
use std::collections::BTreeSet;

use super::error::DayTableError;
use super::record::{ChipId, MeasurementRecord};

/// Every DayTable available to a caller, keyed by day id
pub type DayTableIndex = FxHashMap<String, DayTable>;

/// DayTable is an immutable snapshot of every record from one calendar-day folder.
///
/// Records are kept sorted by local index. Local indices are only unique inside a single
/// DayTable; two DayTables are free to reuse the same indices. Each DayTable may also expose
/// a different set of field keys, which is why the key union is kept alongside the records.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTable {
    day_id: String,
    records: Vec<MeasurementRecord>,
    field_keys: BTreeSet<String>,
    // source path -> position in records
    source_index: FxHashMap<String, usize>,
}

impl DayTable {
    /// Build a DayTable for the given day.
    ///
    /// Every record must already carry `day_id`. Two records sharing a local index is
    /// treated as corruption and rejected rather than merged.
    pub fn build(
        mut records: Vec<MeasurementRecord>,
        day_id: &str,
    ) -> Result<Self, DayTableError> {
        if let Some(stray) = records.iter().find(|r| r.day_id != day_id) {
            return Err(DayTableError::MismatchedDay {
                expected: day_id.to_string(),
                found: stray.day_id.clone(),
                source_path: stray.source_path.clone(),
            });
        }

        records.sort_by_key(|r| r.local_index);
        if let Some(pair) = records
            .windows(2)
            .find(|pair| pair[0].local_index == pair[1].local_index)
        {
            return Err(DayTableError::DuplicateLocalIndex {
                day_id: day_id.to_string(),
                local_index: pair[0].local_index,
                first_path: pair[0].source_path.clone(),
                second_path: pair[1].source_path.clone(),
            });
        }

        let field_keys = records
            .iter()
            .flat_map(|r| r.fields.keys().cloned())
            .collect();

        let mut source_index = FxHashMap::default();
        for (idx, record) in records.iter().enumerate() {
            source_index
                .entry(record.source_path.clone())
                .or_insert(idx);
        }

        log::debug!("Built DayTable {} with {} records", day_id, records.len());

        Ok(Self {
            day_id: day_id.to_string(),
            records,
            field_keys,
            source_index,
        })
    }

    pub fn day_id(&self) -> &str {
        &self.day_id
    }

    /// Records sorted by local index
    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    /// Union of the field keys present in this table
    pub fn field_keys(&self) -> &BTreeSet<String> {
        &self.field_keys
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_by_local_index(&self, local_index: u32) -> Option<&MeasurementRecord> {
        self.records
            .binary_search_by_key(&local_index, |r| r.local_index)
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn get_by_source_path(&self, source_path: &str) -> Option<&MeasurementRecord> {
        self.source_index
            .get(source_path)
            .map(|idx| &self.records[*idx])
    }

    /// The distinct chips measured on this day, sorted
    pub fn chips(&self) -> BTreeSet<ChipId> {
        self.records.iter().map(|r| r.chip()).collect()
    }
}

/// Key a set of DayTables by day id.
///
/// The same day appearing twice is an error; one of the copies would otherwise be dropped.
pub fn index_day_tables(tables: Vec<DayTable>) -> Result<DayTableIndex, DayTableError> {
    let mut index = DayTableIndex::default();
    for table in tables {
        if index.contains_key(table.day_id()) {
            return Err(DayTableError::DuplicateDay(table.day_id));
        }
        index.insert(table.day_id.clone(), table);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldMap, FieldValue, Procedure};
    use time::macros::datetime;

    fn record(day: &str, local_index: u32, keys: &[&str]) -> MeasurementRecord {
        MeasurementRecord {
            chip_group: String::from("Alisson"),
            chip_number: 67,
            procedure: Procedure::GateSweep,
            start_timestamp: datetime!(2025-01-01 10:00 UTC),
            local_index,
            source_path: format!("{day}/Alisson67_{local_index:03}.csv"),
            fields: keys
                .iter()
                .map(|k| (k.to_string(), FieldValue::Int(1)))
                .collect::<FieldMap>(),
            day_id: day.to_string(),
        }
    }

    #[test]
    fn test_sorted_by_local_index() {
        let table = DayTable::build(
            vec![record("d1", 3, &[]), record("d1", 1, &[]), record("d1", 2, &[])],
            "d1",
        )
        .unwrap();
        let indices: Vec<u32> = table.records().iter().map(|r| r.local_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(table.get_by_local_index(2).unwrap().local_index, 2);
        assert!(table.get_by_local_index(4).is_none());
    }

    #[test]
    fn test_get_by_source_path() {
        let table = DayTable::build(
            vec![record("d1", 7, &[]), record("d1", 2, &[]), record("d1", 5, &[])],
            "d1",
        )
        .unwrap();
        assert_eq!(
            table.get_by_source_path("d1/Alisson67_005.csv").unwrap().local_index,
            5
        );
        assert_eq!(
            table.get_by_source_path("d1/Alisson67_007.csv").unwrap().local_index,
            7
        );
        assert!(table.get_by_source_path("d1/Alisson67_003.csv").is_none());
        assert!(table.get_by_source_path("d2/Alisson67_005.csv").is_none());
    }

    #[test]
    fn test_duplicate_local_index() {
        let mut dup = record("d1", 1, &[]);
        dup.source_path = String::from("d1/Alisson67_001_copy.csv");
        let result = DayTable::build(vec![record("d1", 1, &[]), dup], "d1");
        assert!(matches!(
            result,
            Err(DayTableError::DuplicateLocalIndex { local_index: 1, .. })
        ));
    }

    #[test]
    fn test_mismatched_day() {
        let result = DayTable::build(vec![record("d2", 1, &[])], "d1");
        assert!(matches!(result, Err(DayTableError::MismatchedDay { .. })));
    }

    #[test]
    fn test_field_key_union() {
        let table = DayTable::build(
            vec![record("d1", 1, &["x", "y"]), record("d1", 2, &["y", "z"])],
            "d1",
        )
        .unwrap();
        let keys: Vec<&str> = table.field_keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_index_rejects_duplicate_day() {
        let a = DayTable::build(vec![record("d1", 1, &[])], "d1").unwrap();
        let b = DayTable::build(vec![record("d1", 2, &[])], "d1").unwrap();
        assert_eq!(
            index_day_tables(vec![a, b]).unwrap_err(),
            DayTableError::DuplicateDay(String::from("d1"))
        );
    }
}
