use std::path::Path;

use libchip_history::config::Config;
use libchip_history::error::{CorrelationError, ProcessorError};
use libchip_history::history::discover_chips;
use libchip_history::process::{build_chip_timeline, combine_selection, load_day_tables};
use libchip_history::record::{ChipId, Procedure};
use libchip_history::session::SessionRole;

const DAY_ONE: &str = r#"
entries:
  - file: Alisson67_001.csv
    procedure: IVg
    start_time: 2025-01-01T09:00:00Z
    fields:
      vg_start: -5.0
      vg_end: 5.0
      wavelength: 365
  - file: Alisson67_002.csv
    start_time: 2025-01-01T09:10:00Z
    fields:
      laser_period: 120.0
      wavelength: 365
  - file: Alisson67_003.csv
    start_time: 2025-01-01T10:00:00Z
    fields:
      vg_start: -5.0
      vg_end: 5.0
      wavelength: 365
  - file: Encap8_004.csv
    procedure: IV
    start_time: 2025-01-01T11:00:00Z
    fields:
      vds_start: 0.0
      vds_end: 1.0
"#;

const DAY_TWO: &str = r#"
entries:
  - file: ITS/Alisson67_001.csv
    start_time: 2025-01-02T09:00:00Z
    fields:
      wavelength: 455
  - file: Alisson67_002.csv
    fields:
      vg_start: -3.0
      vg_end: 3.0
"#;

fn write_day(root: &Path, day: &str, manifest: &str) {
    let day_dir = root.join(day);
    std::fs::create_dir_all(&day_dir).unwrap();
    std::fs::write(day_dir.join("metadata.yaml"), manifest).unwrap();
}

fn build_root() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    write_day(root.path(), "2025-01-01", DAY_ONE);
    write_day(root.path(), "2025-01-02", DAY_TWO);
    // Raw file backing the entry without a start time
    std::fs::write(root.path().join("2025-01-02").join("Alisson67_002.csv"), "vg,id\n").unwrap();
    // A folder without a manifest is skipped
    std::fs::create_dir_all(root.path().join("scratch")).unwrap();
    root
}

fn build_config(root: &Path) -> Config {
    Config {
        raw_data_root: root.to_path_buf(),
        chip_group: String::from("Alisson"),
        chip_number: 67,
        ..Default::default()
    }
}

#[test]
fn loads_every_day_folder() {
    let root = build_root();
    let config = build_config(root.path());
    let mut calls = Vec::new();
    let tables = load_day_tables(&config, |done, total| calls.push((done, total))).unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(
        discover_chips(&tables),
        vec![ChipId::new("Alisson", 67), ChipId::new("Encap", 8)]
    );
}

#[test]
fn timeline_from_disk() {
    let root = build_root();
    let config = build_config(root.path());
    let tables = load_day_tables(&config, |_, _| ()).unwrap();
    let history = build_chip_timeline(&tables, &config.chip()).unwrap();

    assert_eq!(history.len(), 5);
    let procedures: Vec<Procedure> = history.iter().map(|e| e.record.procedure).collect();
    // The last sweep of day two has no start time, so it takes the (much later) file time
    assert_eq!(
        procedures,
        vec![
            Procedure::GateSweep,
            Procedure::TimeSeries,
            Procedure::GateSweep,
            Procedure::TimeSeries,
            Procedure::GateSweep,
        ]
    );
    assert_eq!(history.get(4).unwrap().record.source_path, "2025-01-02/ITS/Alisson67_001.csv");
    // Day two's stress comes after the day one session closed, so it has no session
    assert_eq!(history.get(3).unwrap().role, Some(SessionRole::PostSweep));
    assert_eq!(history.get(4).unwrap().role, None);
    assert_eq!(history.get(5).unwrap().role, Some(SessionRole::PreSweep));
}

#[test]
fn combine_from_disk() {
    let root = build_root();
    let config = build_config(root.path());
    let result = combine_selection(&config, &[4, 1], |_, _| ()).unwrap();
    assert_eq!(result.days_combined, 2);
    // Day one also holds another chip's drain sweep keys, day two has no laser period
    assert_eq!(
        result.common_fields.iter().collect::<Vec<_>>(),
        vec!["vg_end", "vg_start", "wavelength"]
    );
    assert_eq!(result.records[0].seq, 1);
    assert_eq!(result.records[0].fields.len(), 3);
    assert_eq!(result.records[1].day_id, "2025-01-02");
    assert_eq!(result.records[1].fields.len(), 1);

    let err = combine_selection(&config, &[1, 77], |_, _| ()).unwrap_err();
    assert!(matches!(
        err,
        ProcessorError::CorrelationError(CorrelationError::UnknownSeq(ref seqs)) if seqs == &vec![77]
    ));
}
