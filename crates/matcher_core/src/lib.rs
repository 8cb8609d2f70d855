//! Matcher core: pure analysis-workflow state machine and view-model helpers.
mod classify;
mod effect;
mod export;
mod msg;
mod normalize;
mod progress;
mod state;
mod update;
mod validate;
mod view_model;

pub use classify::{
    classify, ErrorKind, ErrorState, RequestFailure, CONNECTIVITY_MESSAGE, TIMEOUT_MESSAGE,
};
pub use effect::Effect;
pub use export::build_export;
pub use msg::Msg;
pub use normalize::{
    normalize, synonym_conflicts, AgentEvent, NormalizeError, NormalizedResult, Stats,
    SynonymConflict, DEFAULT_READINESS_SCORE,
};
pub use progress::{ProgressState, SIMULATION_CEILING, UPLOAD_CEILING};
pub use state::{
    ActivityEntry, AnalysisRequest, AppState, DocumentHandle, ExportStatus, Phase, RunId,
    RunningStage, StatusCategory, WorkflowConfig, DEFAULT_STEP_LABELS,
};
pub use update::update;
pub use validate::{
    normalize_preference, validate_file, validate_preferences, validate_profile_link,
    FileRules, FileViolation, ProfileLinkViolation, ACCEPTED_CONTENT_TYPE, ACCEPTED_EXTENSION,
    NO_PREFERENCES_MESSAGE,
};
pub use view_model::AppViewModel;
