use std::collections::BTreeMap;

use crate::{
    ActivityEntry, AgentEvent, ErrorState, ExportStatus, Phase, ProgressState, RunId, Stats,
};

/// Read-only snapshot of the workflow for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub run_id: Option<RunId>,
    pub progress: ProgressState,
    pub upload_enabled: bool,
    pub preferences: Vec<String>,
    pub profile_link: Option<String>,
    pub error: Option<ErrorState>,
    /// Every validation message; `error` carries only the first.
    pub violations: Vec<String>,
    pub stats: Option<Stats>,
    /// Result-derived when a result exists, otherwise the recent feed.
    pub activity: Vec<ActivityEntry>,
    pub agent_logs: BTreeMap<String, Vec<AgentEvent>>,
    pub retry_available: bool,
    pub export_available: bool,
    pub last_document: Option<String>,
    pub last_export: Option<ExportStatus>,
    pub dirty: bool,
}
