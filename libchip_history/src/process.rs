use super::config::Config;
use super::correlator::{combine, CombinedResult};
use super::day_table::{index_day_tables, DayTable};
use super::error::{HistoryError, ProcessorError};
use super::history::{build_history, ChipHistory};
use super::loader::load_day;
use super::record::ChipId;
use super::session::assign_sessions;

/// Load every configured day folder into a DayTable.
///
/// `progress` is called with (days done, total days) after each folder. Folders without a
/// manifest are skipped.
pub fn load_day_tables(
    config: &Config,
    mut progress: impl FnMut(usize, usize),
) -> Result<Vec<DayTable>, ProcessorError> {
    let day_dirs = config.day_directories()?;
    let total = day_dirs.len();
    log::info!(
        "Loading {} day folders from {}...",
        total,
        config.raw_data_root.to_string_lossy()
    );

    let mut tables = Vec::with_capacity(total);
    for (idx, day_dir) in day_dirs.iter().enumerate() {
        if let Some(table) = load_day(day_dir, &config.manifest_name)? {
            tables.push(table);
        }
        progress(idx + 1, total);
    }
    log::info!("Loaded {} day tables.", tables.len());
    Ok(tables)
}

/// Build a chip's history and tag its sessions
pub fn build_chip_timeline(
    day_tables: &[DayTable],
    chip: &ChipId,
) -> Result<ChipHistory, HistoryError> {
    let history = build_history(day_tables, &chip.group, chip.number)?;
    if history.is_empty() {
        log::warn!("No records were found for chip {}", chip);
    }
    Ok(assign_sessions(history))
}

/// The full pipeline for a cross-day request: load, build the timeline of the configured
/// chip, and combine the requested seqs.
pub fn combine_selection(
    config: &Config,
    seqs: &[u32],
    progress: impl FnMut(usize, usize),
) -> Result<CombinedResult, ProcessorError> {
    let tables = load_day_tables(config, progress)?;
    let history = build_chip_timeline(&tables, &config.chip())?;
    let index = index_day_tables(tables)?;
    Ok(combine(&history, &index, seqs)?)
}
