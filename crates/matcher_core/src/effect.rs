use serde_json::Value;

use crate::{AnalysisRequest, RunId};

/// Work the front end must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin emitting simulated progress for a run.
    StartSimulator {
        run_id: RunId,
        step_labels: Vec<String>,
    },
    /// Send the analysis request to the backend.
    DispatchAnalysis {
        run_id: RunId,
        request: AnalysisRequest,
    },
    /// Cancel the run's simulator interval. Returned by the same update that
    /// enters a terminal phase.
    StopSimulator { run_id: RunId },
    /// Load the independent recent-activity feed.
    FetchRecentActivity,
    /// Persist an export document.
    WriteExport {
        document_name: String,
        analysis_id: Option<String>,
        document: Value,
    },
}
