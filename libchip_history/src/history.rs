use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use super::day_table::DayTable;
use super::error::HistoryError;
use super::record::{ChipId, MeasurementRecord, Procedure};
use super::session::SessionRole;

// seq values start from 1
const FIRST_SEQ: u32 = 1;

/// A record placed in its chip's timeline.
///
/// `seq` is the only identifier that is safe to use across days. The session fields are
/// empty until the history has been run through the session assigner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub seq: u32,
    pub session_id: Option<u32>,
    pub role: Option<SessionRole>,
    #[serde(flatten)]
    pub record: MeasurementRecord,
}

/// The chronologically ordered history of one chip across every day.
///
/// A ChipHistory is derived data. Rebuilding it from the same DayTables always yields the
/// same seq for every record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipHistory {
    chip: ChipId,
    entries: Vec<HistoryEntry>,
}

impl ChipHistory {
    pub fn chip(&self) -> &ChipId {
        &self.chip
    }

    /// Entries in ascending seq order
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [HistoryEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    /// Look up an entry by seq
    pub fn get(&self, seq: u32) -> Option<&HistoryEntry> {
        self.entries
            .binary_search_by_key(&seq, |e| e.seq)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn find_by_source_path(&self, source_path: &str) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .find(|e| e.record.source_path == source_path)
    }

    /// The seqs of every entry recorded on the given day
    pub fn seqs_for_day(&self, day_id: &str) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|e| e.record.day_id == day_id)
            .map(|e| e.seq)
            .collect()
    }

    pub fn filter_procedure(&self, procedure: Procedure) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.record.procedure == procedure)
            .collect()
    }

    /// Distinct day ids in the order they first appear in the timeline
    pub fn days(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.entries
            .iter()
            .map(|e| e.record.day_id.as_str())
            .filter(|day| seen.insert(*day))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ChipHistory {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build the history of a single chip out of every DayTable.
///
/// Records are ordered by (start timestamp, local index, source path) and numbered from 1.
/// Each table's matching records form a sorted run and the runs are merged k-ways.
/// Two records with identical ordering keys cannot be placed deterministically and are
/// reported as an error instead.
pub fn build_history(
    day_tables: &[DayTable],
    chip_group: &str,
    chip_number: u32,
) -> Result<ChipHistory, HistoryError> {
    let runs: Vec<Vec<&MeasurementRecord>> = day_tables
        .iter()
        .map(|table| {
            let mut run: Vec<&MeasurementRecord> = table
                .records()
                .iter()
                .filter(|r| r.is_chip(chip_group, chip_number))
                .collect();
            // Usually already in order; local index and time tend to agree within a day
            run.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
            run
        })
        .filter(|run| !run.is_empty())
        .collect();

    let merged = merge_runs(&runs);

    if let Some(pair) = merged
        .windows(2)
        .find(|pair| pair[0].order_key() == pair[1].order_key())
    {
        return Err(HistoryError::AmbiguousOrdering {
            timestamp: pair[0].start_timestamp,
            local_index: pair[0].local_index,
            source_path: pair[0].source_path.clone(),
        });
    }

    let entries: Vec<HistoryEntry> = merged
        .into_iter()
        .zip(FIRST_SEQ..)
        .map(|(record, seq)| HistoryEntry {
            seq,
            session_id: None,
            role: None,
            record: record.clone(),
        })
        .collect();

    let chip = ChipId::new(chip_group, chip_number);
    log::info!(
        "Built history for {} with {} records across {} days",
        chip,
        entries.len(),
        runs.len()
    );

    Ok(ChipHistory { chip, entries })
}

/// K-way merge of sorted runs
fn merge_runs<'a>(runs: &[Vec<&'a MeasurementRecord>]) -> Vec<&'a MeasurementRecord> {
    let total = runs.iter().map(|run| run.len()).sum();
    let mut merged = Vec::with_capacity(total);
    let mut heap = BinaryHeap::with_capacity(runs.len());

    for (run_idx, run) in runs.iter().enumerate() {
        if let Some(record) = run.first() {
            heap.push(Reverse((record.order_key(), run_idx, 0usize)));
        }
    }

    while let Some(Reverse((_, run_idx, pos))) = heap.pop() {
        merged.push(runs[run_idx][pos]);
        if let Some(next) = runs[run_idx].get(pos + 1) {
            heap.push(Reverse((next.order_key(), run_idx, pos + 1)));
        }
    }

    merged
}

/// Every chip present in the given DayTables, sorted and de-duplicated
pub fn discover_chips(day_tables: &[DayTable]) -> Vec<ChipId> {
    day_tables
        .iter()
        .flat_map(|table| table.chips())
        .collect::<BTreeSet<ChipId>>()
        .into_iter()
        .collect()
}
