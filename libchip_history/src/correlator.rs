use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

use super::day_table::{DayTable, DayTableIndex};
use super::error::CorrelationError;
use super::history::{ChipHistory, HistoryEntry};
use super::record::{ChipId, FieldMap, Procedure};
use super::session::SessionRole;

/// A selected record, with its fields projected onto the schema shared by every day in the
/// selection. Identity fields are always kept in full.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRecord {
    pub seq: u32,
    pub chip_group: String,
    pub chip_number: u32,
    pub procedure: Procedure,
    #[serde(with = "time::serde::rfc3339")]
    pub start_timestamp: OffsetDateTime,
    pub source_path: String,
    pub day_id: String,
    pub session_id: Option<u32>,
    pub role: Option<SessionRole>,
    pub fields: FieldMap,
}

/// The reconciled result of a cross-day selection, ordered by seq
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedResult {
    pub chip: ChipId,
    pub records: Vec<CombinedRecord>,
    pub days_combined: usize,
    pub common_field_count: usize,
    pub common_fields: BTreeSet<String>,
    pub day_ids: Vec<String>,
}

/// Combine a selection of seqs, possibly spanning several days, into a single table.
///
/// Every seq must exist in the history; unknown ones are all reported together. The full
/// DayTable of every touched day is needed, both to fetch the complete records and to work
/// out which field keys all of those days share. Only the shared keys survive in the output.
/// The order of `seq_list` does not matter and duplicate seqs are collapsed; output is always
/// in ascending seq order.
pub fn combine(
    chip_history: &ChipHistory,
    day_tables_by_id: &DayTableIndex,
    seq_list: &[u32],
) -> Result<CombinedResult, CorrelationError> {
    if seq_list.is_empty() {
        return Err(CorrelationError::EmptySelection);
    }

    let requested: BTreeSet<u32> = seq_list.iter().copied().collect();
    let missing: Vec<u32> = requested
        .iter()
        .copied()
        .filter(|seq| chip_history.get(*seq).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(CorrelationError::UnknownSeq(missing));
    }

    // Safe to resolve now, every seq was just checked
    let selected: Vec<&HistoryEntry> = requested
        .iter()
        .filter_map(|seq| chip_history.get(*seq))
        .collect();

    let mut by_day: BTreeMap<&str, &DayTable> = BTreeMap::new();
    for entry in selected.iter() {
        let day_id = entry.record.day_id.as_str();
        if by_day.contains_key(day_id) {
            continue;
        }
        let table = day_tables_by_id
            .get(day_id)
            .ok_or_else(|| CorrelationError::MissingDayTable(day_id.to_string()))?;
        by_day.insert(day_id, table);
    }

    let common_fields = intersect_field_keys(by_day.values().copied());
    if common_fields.is_empty() {
        return Err(CorrelationError::NoCommonSchema);
    }

    let mut records = Vec::with_capacity(selected.len());
    for entry in selected {
        let day_id = entry.record.day_id.as_str();
        let full = by_day
            .get(day_id)
            .and_then(|table| table.get_by_source_path(&entry.record.source_path))
            .ok_or_else(|| CorrelationError::RecordNotInDayTable {
                day_id: day_id.to_string(),
                source_path: entry.record.source_path.clone(),
            })?;

        let fields: FieldMap = full
            .fields
            .iter()
            .filter(|(key, _)| common_fields.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        records.push(CombinedRecord {
            seq: entry.seq,
            chip_group: full.chip_group.clone(),
            chip_number: full.chip_number,
            procedure: full.procedure,
            start_timestamp: full.start_timestamp,
            source_path: full.source_path.clone(),
            day_id: full.day_id.clone(),
            session_id: entry.session_id,
            role: entry.role,
            fields,
        });
    }

    log::info!(
        "Combined {} records of {} from {} days sharing {} fields",
        records.len(),
        chip_history.chip(),
        by_day.len(),
        common_fields.len()
    );

    Ok(CombinedResult {
        chip: chip_history.chip().clone(),
        records,
        days_combined: by_day.len(),
        common_field_count: common_fields.len(),
        day_ids: by_day.keys().map(|day| day.to_string()).collect(),
        common_fields,
    })
}

/// The field keys present in every one of the given tables
fn intersect_field_keys<'a>(tables: impl Iterator<Item = &'a DayTable>) -> BTreeSet<String> {
    tables
        .map(|table| table.field_keys())
        .fold(None, |acc: Option<BTreeSet<String>>, keys| match acc {
            None => Some(keys.clone()),
            Some(acc) => Some(acc.intersection(keys).cloned().collect()),
        })
        .unwrap_or_default()
}
