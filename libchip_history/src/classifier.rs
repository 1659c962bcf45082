use super::constants::{
    DRAIN_SWEEP_END_FIELD, DRAIN_SWEEP_START_FIELD, GATE_SWEEP_END_FIELD, GATE_SWEEP_START_FIELD,
    LASER_PERIOD_FIELD,
};
use super::record::{FieldMap, Procedure};

/// Determine the procedure of a measurement.
///
/// Cues are considered in order: the explicit label, then the source path, then which
/// fields are populated. Anything unresolvable is `Procedure::Other`, so this never fails.
/// A label that is present but not recognized is treated as missing.
pub fn classify(label: Option<&str>, source_path: &str, fields: &FieldMap) -> Procedure {
    label
        .and_then(Procedure::from_label)
        .or_else(|| classify_path(source_path))
        .or_else(|| classify_fields(fields))
        .unwrap_or(Procedure::Other)
}

/// Look for a procedure name in the path, starting at the file name and moving outward
/// through the parent folders.
pub fn classify_path(source_path: &str) -> Option<Procedure> {
    source_path
        .rsplit(['/', '\\'])
        .filter(|component| !component.is_empty())
        .find_map(classify_path_component)
}

fn classify_path_component(component: &str) -> Option<Procedure> {
    // Drop the extension so that e.g. ".its" style suffixes are not mistaken for a cue
    let stem = match component.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => component,
    };
    stem.split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|token| match token.to_ascii_lowercase().as_str() {
            "ivg" | "gatesweep" => Some(Procedure::GateSweep),
            "its" | "it" | "timeseries" => Some(Procedure::TimeSeries),
            "iv" | "drainsweep" => Some(Procedure::DrainSweep),
            _ => None,
        })
}

/// Infer the procedure from which fields the header populated
pub fn classify_fields(fields: &FieldMap) -> Option<Procedure> {
    let has_pair =
        |start: &str, end: &str| fields.contains_key(start) && fields.contains_key(end);
    if has_pair(GATE_SWEEP_START_FIELD, GATE_SWEEP_END_FIELD) {
        Some(Procedure::GateSweep)
    } else if has_pair(DRAIN_SWEEP_START_FIELD, DRAIN_SWEEP_END_FIELD) {
        Some(Procedure::DrainSweep)
    } else if fields.contains_key(LASER_PERIOD_FIELD) {
        Some(Procedure::TimeSeries)
    } else {
        None
    }
}
