use std::path::PathBuf;

use serde_json::Value;

use crate::{ActivityEntry, DocumentHandle, RequestFailure, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User toggled a domain preference on or off.
    PreferenceToggled(String),
    /// User edited the optional source-code profile link.
    ProfileLinkChanged(String),
    /// User picked a résumé to analyze.
    FileSelected(DocumentHandle),
    /// User asked to re-run the last accepted document.
    RetryClicked,
    /// User reset the dashboard to its defaults (keeps the last document).
    ResetClicked,
    /// User started over; forgets the last document as well.
    NewAnalysisClicked,
    /// User asked for a downloadable export of the current result.
    ExportClicked { exported_at: String },
    /// Export writer finished.
    ExportFinished(Result<PathBuf, String>),
    /// Request a refresh of the recent-activity feed.
    RecentActivityRequested,
    /// Recent-activity feed arrived.
    RecentActivityLoaded(Vec<ActivityEntry>),
    /// Driver reported request body transfer.
    UploadProgress { run_id: RunId, sent: u64, total: u64 },
    /// Simulator advanced one step.
    SimulatorTick {
        run_id: RunId,
        step_index: usize,
        step_label: String,
        percent: u8,
    },
    /// Driver finished, successfully or not.
    AnalysisCompleted {
        run_id: RunId,
        outcome: Result<Value, RequestFailure>,
    },
}
