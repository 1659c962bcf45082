use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use super::history::ChipHistory;
use super::record::Procedure;

/// Position of a record within its session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    PreSweep,
    Stress,
    PostSweep,
}

impl Display for SessionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreSweep => write!(f, "pre_sweep"),
            Self::Stress => write!(f, "stress"),
            Self::PostSweep => write!(f, "post_sweep"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SessionState {
    #[default]
    NoSession,
    OpenNoStress,
    OpenWithStress,
}

/// The session tag assigned to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionTag {
    pub session_id: Option<u32>,
    pub role: Option<SessionRole>,
}

impl SessionTag {
    fn new(session_id: u32, role: SessionRole) -> Self {
        Self {
            session_id: Some(session_id),
            role: Some(role),
        }
    }
}

/// SessionAssigner walks a chip's history once, in seq order, grouping records into
/// characterize -> stress -> re-characterize sessions.
///
/// A gate sweep opens a session, any other measurement while a session is open is stress,
/// and the next gate sweep after stress closes the session. Tags are never revisited once
/// they are handed out.
#[derive(Debug, Default)]
pub struct SessionAssigner {
    state: SessionState,
    current_session_id: u32,
}

impl SessionAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag the next record in the history.
    pub fn assign(&mut self, procedure: Procedure) -> SessionTag {
        match (procedure, self.state) {
            (Procedure::GateSweep, SessionState::NoSession) => self.open_session(),
            (Procedure::GateSweep, SessionState::OpenWithStress) => {
                // Re-characterization; this sweep closes the session and does not open another
                self.state = SessionState::NoSession;
                log::debug!("Closed session {}", self.current_session_id);
                SessionTag::new(self.current_session_id, SessionRole::PostSweep)
            }
            (Procedure::GateSweep, SessionState::OpenNoStress) => {
                // Back-to-back sweeps. The open session is abandoned as-is, its sweep keeps
                // the pre_sweep tag.
                log::warn!(
                    "Session {} was followed by another gate sweep without any stress; starting a new session",
                    self.current_session_id
                );
                self.open_session()
            }
            (_, SessionState::OpenNoStress) | (_, SessionState::OpenWithStress) => {
                self.state = SessionState::OpenWithStress;
                SessionTag::new(self.current_session_id, SessionRole::Stress)
            }
            // Measurements before the first characterization sweep belong to no session
            (_, SessionState::NoSession) => SessionTag::default(),
        }
    }

    fn open_session(&mut self) -> SessionTag {
        self.current_session_id += 1;
        self.state = SessionState::OpenNoStress;
        log::debug!("Opened session {}", self.current_session_id);
        SessionTag::new(self.current_session_id, SessionRole::PreSweep)
    }
}

/// Populate the session id and role of every entry in a history.
///
/// Any tags already present are recomputed from scratch.
pub fn assign_sessions(mut history: ChipHistory) -> ChipHistory {
    let mut assigner = SessionAssigner::new();
    for entry in history.entries_mut() {
        let tag = assigner.assign(entry.record.procedure);
        entry.session_id = tag.session_id;
        entry.role = tag.role;
    }
    log::info!(
        "Assigned {} sessions for {}",
        assigner.current_session_id,
        history.chip()
    );
    history
}

/// Overview of a single session in a chip's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: u32,
    pub pre_sweep_seq: u32,
    pub stress_seqs: Vec<u32>,
    pub post_sweep_seq: Option<u32>,
    /// False when the session never saw its closing sweep
    pub complete: bool,
}

impl ChipHistory {
    /// Summarize each session, ordered by session id.
    ///
    /// Entries without a session are left out.
    pub fn sessions(&self) -> Vec<SessionSummary> {
        let mut sessions: BTreeMap<u32, SessionSummary> = BTreeMap::new();
        for entry in self.iter() {
            let (Some(session_id), Some(role)) = (entry.session_id, entry.role) else {
                continue;
            };
            let summary = sessions.entry(session_id).or_insert(SessionSummary {
                session_id,
                pre_sweep_seq: entry.seq,
                stress_seqs: Vec::new(),
                post_sweep_seq: None,
                complete: false,
            });
            match role {
                SessionRole::PreSweep => summary.pre_sweep_seq = entry.seq,
                SessionRole::Stress => summary.stress_seqs.push(entry.seq),
                SessionRole::PostSweep => {
                    summary.post_sweep_seq = Some(entry.seq);
                    summary.complete = true;
                }
            }
        }
        sessions.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Procedure::{DrainSweep, GateSweep, Other, TimeSeries};

    fn run(procedures: &[Procedure]) -> Vec<SessionTag> {
        let mut assigner = SessionAssigner::new();
        procedures.iter().map(|p| assigner.assign(*p)).collect()
    }

    fn tag(session_id: u32, role: SessionRole) -> SessionTag {
        SessionTag::new(session_id, role)
    }

    #[test]
    fn test_characterize_stress_recharacterize() {
        let tags = run(&[
            GateSweep, TimeSeries, TimeSeries, GateSweep, GateSweep, TimeSeries, GateSweep,
        ]);
        assert_eq!(
            tags,
            vec![
                tag(1, SessionRole::PreSweep),
                tag(1, SessionRole::Stress),
                tag(1, SessionRole::Stress),
                tag(1, SessionRole::PostSweep),
                tag(2, SessionRole::PreSweep),
                tag(2, SessionRole::Stress),
                tag(2, SessionRole::PostSweep),
            ]
        );
    }

    #[test]
    fn test_orphan_before_first_sweep() {
        let tags = run(&[TimeSeries, Other, GateSweep]);
        assert_eq!(tags[0], SessionTag::default());
        assert_eq!(tags[1], SessionTag::default());
        assert_eq!(tags[2], tag(1, SessionRole::PreSweep));
    }

    #[test]
    fn test_back_to_back_sweeps() {
        let tags = run(&[GateSweep, GateSweep, DrainSweep, GateSweep]);
        assert_eq!(
            tags,
            vec![
                tag(1, SessionRole::PreSweep),
                tag(2, SessionRole::PreSweep),
                tag(2, SessionRole::Stress),
                tag(2, SessionRole::PostSweep),
            ]
        );
    }

    #[test]
    fn test_stress_after_closed_session_is_orphan() {
        let tags = run(&[GateSweep, TimeSeries, GateSweep, TimeSeries]);
        assert_eq!(tags[2], tag(1, SessionRole::PostSweep));
        assert_eq!(tags[3], SessionTag::default());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(SessionRole::PostSweep.to_string(), "post_sweep");
    }
}
