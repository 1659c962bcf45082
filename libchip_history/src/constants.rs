// Field names and naming conventions shared by the loader and classifier.

/// Key under which an explicit procedure label may appear in a record's fields
pub const PROCEDURE_FIELD: &str = "procedure";

/// Default name of the per-day manifest file
pub const DEFAULT_MANIFEST_NAME: &str = "metadata.yaml";

/// Separator between the chip name and the local index in a raw file name
pub const LOCAL_INDEX_SEPARATOR: char = '_';

// Structural cues. A gate sweep range pair implies IVg, a drain sweep range pair implies IV,
// a periodic illumination field implies ITS.
pub const GATE_SWEEP_START_FIELD: &str = "vg_start";
pub const GATE_SWEEP_END_FIELD: &str = "vg_end";
pub const DRAIN_SWEEP_START_FIELD: &str = "vds_start";
pub const DRAIN_SWEEP_END_FIELD: &str = "vds_end";
pub const LASER_PERIOD_FIELD: &str = "laser_period";

// Domain labels for each procedure
pub const GATE_SWEEP_LABEL: &str = "IVg";
pub const TIME_SERIES_LABEL: &str = "ITS";
pub const DRAIN_SWEEP_LABEL: &str = "IV";
pub const OTHER_LABEL: &str = "Other";
