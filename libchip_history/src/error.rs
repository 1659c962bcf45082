use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DayTableError {
    #[error("DayTable {day_id} has two records with local index {local_index}: {first_path} and {second_path}")]
    DuplicateLocalIndex {
        day_id: String,
        local_index: u32,
        first_path: String,
        second_path: String,
    },
    #[error("DayTable {expected} was given record {source_path} which belongs to day {found}")]
    MismatchedDay {
        expected: String,
        found: String,
        source_path: String,
    },
    #[error("DayTable {0} was provided more than once")]
    DuplicateDay(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("History could not order records: two records share timestamp {timestamp}, local index {local_index} and path {source_path}")]
    AmbiguousOrdering {
        timestamp: OffsetDateTime,
        local_index: u32,
        source_path: String,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("Requested seq values do not exist in the chip history: {0:?}")]
    UnknownSeq(Vec<u32>),
    #[error("DayTable {0} is required to combine the selection but was not provided")]
    MissingDayTable(String),
    #[error("Record {source_path} was not found in DayTable {day_id}")]
    RecordNotInDayTable { day_id: String, source_path: String },
    #[error("The selected days share no common fields; nothing can be combined")]
    NoCommonSchema,
    #[error("No seq values were requested")]
    EmptySelection,
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Loader failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Loader failed to parse manifest YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("File name {0} does not follow the <group><number>_<index>.<ext> convention")]
    BadFileName(String),
    #[error("Loader could not open {0:?} because it does not exist")]
    BadFilePath(PathBuf),
    #[error("No start time in the manifest and no raw file to fall back on for {0}")]
    MissingTimestamp(String),
    #[error("Loader failed to build a DayTable: {0}")]
    DayTableError(#[from] DayTableError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Loader error: {0}")]
    LoaderError(#[from] LoaderError),
    #[error("Processor failed due to DayTable error: {0}")]
    DayTableError(#[from] DayTableError),
    #[error("Processor failed due to History error: {0}")]
    HistoryError(#[from] HistoryError),
    #[error("Processor failed due to Correlation error: {0}")]
    CorrelationError(#[from] CorrelationError),
    #[error("Processor failed to render output as YAML: {0}")]
    OutputError(#[from] serde_yaml::Error),
}
