//! # chip_history
//!
//! chip_history tracks the experimental history of test devices ("chips") across many
//! measurement days. Each day folder numbers its measurement files independently, so the
//! same local index shows up again and again. chip_history merges every day into a single
//! chronological timeline per chip, numbers it with a stable `seq`, groups it into
//! characterize -> stress -> re-characterize sessions, and lets an analyst pull a selection of
//! seqs spanning several days back out as one reconciled table.
//!
//! ## Layout
//!
//! The library is split into the following stages, each feeding the next:
//!
//! - [`classifier`]: decide whether a measurement is a gate sweep (IVg), a time series (ITS),
//! a drain sweep (IV), or something else.
//! - [`day_table`]: an immutable, local-index ordered table of one day's records.
//! - [`history`]: merge every day table into the chronological history of one chip.
//! - [`session`]: tag each history entry with a session id and role.
//! - [`correlator`]: combine a cross-day selection of seqs into a single table, keeping only
//! the fields every touched day recorded.
//!
//! [`loader`], [`config`], and [`process`] provide a minimal way of feeding the stages from
//! disk, which is what `chip_history_cli` uses.
//!
//! ## Raw data layout
//!
//! ```text
//! raw_data_root
//! |---- 2025-01-01
//! |    |---- metadata.yaml
//! |    |---- Alisson67_001.csv
//! |    |---- Alisson67_002.csv
//! |---- 2025-01-02
//! |    |---- metadata.yaml
//! |    |---- Alisson67_001.csv
//! ```
//!
//! Raw file names follow `<group><number>_<index>.<ext>`. The manifest holds the parsed header
//! of every file in the folder:
//!
//! ```yml
//! entries:
//!   - file: Alisson67_001.csv
//!     procedure: IVg
//!     start_time: 2025-01-01T09:00:00Z
//!     fields:
//!       vg_start: -5.0
//!       vg_end: 5.0
//! ```
//!
//! `procedure` and `start_time` are optional. Without a procedure the file path and fields
//! are used to classify the measurement; without a start time the raw file's modification
//! time is used.
//!
//! ## Configuration
//!
//! ```yml
//! raw_data_root: None
//! manifest_name: metadata.yaml
//! days: null
//! chip_group: ''
//! chip_number: 0
//! ```
//!
//! If `days` is `null` every folder under `raw_data_root` is loaded.
//!
//! ## seq vs local index
//!
//! A local index is only meaningful together with its day. Cross-day selections are always
//! made by `seq`.
pub mod classifier;
pub mod config;
pub mod constants;
pub mod correlator;
pub mod day_table;
pub mod error;
pub mod history;
pub mod loader;
pub mod process;
pub mod record;
pub mod session;
