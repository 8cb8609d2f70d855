//! Matcher engine: backend IO, simulated progress and effect execution.
mod activity;
mod engine;
mod export;
mod filename;
mod simulator;
mod types;
mod upload;

pub use activity::RecentActivity;
pub use engine::{EngineConfig, EngineHandle, EngineStopped};
pub use export::{ensure_output_dir, ExportWriter, PersistError};
pub use filename::export_filename;
pub use simulator::{simulated_percent, ProgressSimulator, SimulatorHandle, DEFAULT_CADENCE};
pub use types::{DispatchError, EngineEvent, FailureKind, RunId, UploadRequest};
pub use upload::{
    AnalysisClient, ChannelProgressSink, ProgressSink, ReqwestAnalysisClient, UploadSettings,
    ANALYZE_PATH, RECENT_ACTIVITY_PATH,
};
