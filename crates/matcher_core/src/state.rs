use std::path::PathBuf;

use matcher_logging::{matcher_debug, matcher_info, matcher_warn};
use serde_json::Value;

use crate::{
    normalize_preference, AppViewModel, ErrorState, FileRules, NormalizedResult, ProgressState,
};

pub type RunId = u64;

pub const DEFAULT_STEP_LABELS: [&str; 6] = [
    "Uploading résumé",
    "Extracting profile",
    "Matching internships",
    "Detecting skill gaps",
    "Evaluating readiness",
    "Preparing recommendations",
];

/// A résumé the user picked. The core never reads its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub document: DocumentHandle,
    /// Ordered, deduplicated and never empty.
    pub preferences: Vec<String>,
    pub profile_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Running(RunningStage),
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningStage {
    Uploading,
    Simulating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Success,
    Processing,
    Failed,
    Warning,
}

impl StatusCategory {
    /// Maps the backend's status vocabulary; unknown labels surface as warnings.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "success" | "completed" | "complete" | "done" => Self::Success,
            "processing" | "started" | "running" | "in_progress" => Self::Processing,
            "failed" | "error" => Self::Failed,
            _ => Self::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub title: String,
    pub time: String,
    pub status: StatusCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Written(PathBuf),
    Failed(String),
}

/// Knobs the front end passes in instead of reading ambient storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub rules: FileRules,
    pub step_labels: Vec<String>,
    pub default_preferences: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            rules: FileRules::default(),
            step_labels: DEFAULT_STEP_LABELS.iter().map(|s| s.to_string()).collect(),
            default_preferences: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompletedAnalysis {
    pub(crate) raw: Value,
    pub(crate) normalized: NormalizedResult,
    pub(crate) document_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    config: WorkflowConfig,
    phase: Phase,
    preferences: Vec<String>,
    profile_link: String,
    last_document: Option<DocumentHandle>,
    next_run_id: RunId,
    active_run: Option<RunId>,
    progress: ProgressState,
    violations: Vec<String>,
    error: Option<ErrorState>,
    completed: Option<CompletedAnalysis>,
    recent_activity: Vec<ActivityEntry>,
    last_export: Option<ExportStatus>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(WorkflowConfig::default())
    }

    pub fn with_config(config: WorkflowConfig) -> Self {
        let mut state = Self {
            config,
            ..Self::default()
        };
        state.preferences = dedup_preferences(&state.config.default_preferences);
        state
    }

    pub fn view(&self) -> AppViewModel {
        let (stats, activity, agent_logs) = match &self.completed {
            Some(done) => (
                Some(done.normalized.stats),
                done.normalized.activity.clone(),
                done.normalized.agent_logs.clone(),
            ),
            None => (None, self.recent_activity.clone(), Default::default()),
        };
        AppViewModel {
            phase: self.phase,
            run_id: self.active_run,
            progress: self.progress.clone(),
            upload_enabled: !self.is_running(),
            preferences: self.preferences.clone(),
            profile_link: self.profile_link().map(ToOwned::to_owned),
            error: self.error.clone(),
            violations: self.violations.clone(),
            stats,
            activity,
            agent_logs,
            retry_available: !self.is_running() && self.last_document.is_some(),
            export_available: self.phase == Phase::Succeeded && self.completed.is_some(),
            last_document: self.last_document.as_ref().map(|d| d.file_name.clone()),
            last_export: self.last_export.clone(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    pub fn preferences(&self) -> &[String] {
        &self.preferences
    }

    /// Trimmed link, `None` when blank.
    pub fn profile_link(&self) -> Option<&str> {
        let link = self.profile_link.trim();
        (!link.is_empty()).then_some(link)
    }

    pub fn last_document(&self) -> Option<&DocumentHandle> {
        self.last_document.as_ref()
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Raw payload of the last successful run, kept for export.
    pub fn raw_result(&self) -> Option<&Value> {
        self.completed.as_ref().map(|done| &done.raw)
    }

    pub fn normalized_result(&self) -> Option<&NormalizedResult> {
        self.completed.as_ref().map(|done| &done.normalized)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn rules(&self) -> &FileRules {
        &self.config.rules
    }

    pub(crate) fn step_labels(&self) -> &[String] {
        &self.config.step_labels
    }

    pub(crate) fn completed(&self) -> Option<&CompletedAnalysis> {
        self.completed.as_ref()
    }

    pub(crate) fn is_active_run(&self, run_id: RunId) -> bool {
        self.is_running() && self.active_run == Some(run_id)
    }

    pub(crate) fn running_stage(&self) -> Option<RunningStage> {
        match self.phase {
            Phase::Running(stage) => Some(stage),
            _ => None,
        }
    }

    pub(crate) fn toggle_preference(&mut self, raw: &str) {
        let Some(pref) = normalize_preference(raw) else {
            return;
        };
        if let Some(index) = self.preferences.iter().position(|p| *p == pref) {
            self.preferences.remove(index);
        } else {
            self.preferences.push(pref);
        }
        self.mark_dirty();
    }

    pub(crate) fn set_profile_link(&mut self, link: String) {
        if self.profile_link != link {
            self.profile_link = link;
            self.mark_dirty();
        }
    }

    pub(crate) fn enter_validating(&mut self) {
        self.transition(Phase::Validating);
    }

    /// Validation failed: back to the phase the request came from, with the
    /// first violation as the message. A prior result stays usable.
    pub(crate) fn reject(&mut self, violations: Vec<String>, resting: Phase) {
        let message = violations.first().cloned().unwrap_or_default();
        matcher_warn!("Rejected analysis request: {:?}", violations);
        self.error = Some(ErrorState::validation(
            message,
            self.last_document.is_some(),
        ));
        self.violations = violations;
        self.transition(resting);
    }

    /// Starts a new run, replacing every trace of the previous one.
    pub(crate) fn begin_run(&mut self, document: DocumentHandle) -> RunId {
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.active_run = Some(run_id);
        self.progress = ProgressState::begin(self.config.step_labels.first().map(String::as_str));
        self.error = None;
        self.violations.clear();
        self.completed = None;
        self.last_export = None;
        matcher_info!(
            "Starting run {} for {} ({} bytes)",
            run_id,
            document.file_name,
            document.size_bytes
        );
        self.last_document = Some(document);
        self.transition(Phase::Running(RunningStage::Uploading));
        run_id
    }

    pub(crate) fn apply_upload(&mut self, sent: u64, total: u64) {
        let mut changed = self.progress.apply_upload(sent, total);
        if sent >= total && self.running_stage() == Some(RunningStage::Uploading) {
            changed |= self.progress.hand_over();
            self.transition(Phase::Running(RunningStage::Simulating));
        }
        if changed {
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_simulation(&mut self, step_index: usize, step_label: &str, percent: u8) {
        let authoritative = self.running_stage() == Some(RunningStage::Simulating);
        if self
            .progress
            .apply_simulation(step_index, step_label, percent, authoritative)
        {
            self.mark_dirty();
        }
    }

    pub(crate) fn succeed(&mut self, raw: Value, normalized: NormalizedResult) {
        let document_name = self
            .last_document
            .as_ref()
            .map(|d| d.file_name.clone())
            .unwrap_or_default();
        self.active_run = None;
        self.progress.complete();
        self.completed = Some(CompletedAnalysis {
            raw,
            normalized,
            document_name,
        });
        self.transition(Phase::Succeeded);
    }

    pub(crate) fn fail(&mut self, mut error: ErrorState) {
        matcher_warn!("Analysis failed ({:?}): {}", error.kind, error.message);
        error.retryable = self.last_document.is_some();
        self.active_run = None;
        self.progress.reset();
        self.error = Some(error);
        self.transition(Phase::Failed);
    }

    /// Back to defaults; the last document stays available for retry.
    pub(crate) fn reset_to_defaults(&mut self) {
        self.completed = None;
        self.error = None;
        self.violations.clear();
        self.progress.reset();
        self.last_export = None;
        self.preferences = dedup_preferences(&self.config.default_preferences);
        self.transition(Phase::Idle);
    }

    /// Forgets everything, including the last document and profile link.
    pub(crate) fn clear_all(&mut self) {
        self.reset_to_defaults();
        self.last_document = None;
        self.profile_link.clear();
    }

    pub(crate) fn set_recent_activity(&mut self, entries: Vec<ActivityEntry>) {
        if self.recent_activity != entries {
            self.recent_activity = entries;
            self.mark_dirty();
        }
    }

    pub(crate) fn record_export(&mut self, status: ExportStatus) {
        self.last_export = Some(status);
        self.mark_dirty();
    }

    fn transition(&mut self, next: Phase) {
        if self.phase != next {
            matcher_debug!("Phase {:?} -> {:?}", self.phase, next);
        }
        self.phase = next;
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

fn dedup_preferences(raw: &[String]) -> Vec<String> {
    let mut preferences: Vec<String> = Vec::with_capacity(raw.len());
    for pref in raw.iter().filter_map(|p| normalize_preference(p)) {
        if !preferences.contains(&pref) {
            preferences.push(pref);
        }
    }
    preferences
}
