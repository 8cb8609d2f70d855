use std::time::Duration;

use matcher_core::{
    ActivityEntry, AnalysisRequest, Effect, Msg, RequestFailure, StatusCategory,
    ACCEPTED_CONTENT_TYPE,
};
use matcher_engine::{
    DispatchError, EngineConfig, EngineEvent, EngineHandle, EngineStopped, FailureKind,
    RecentActivity, UploadRequest,
};
use matcher_logging::{matcher_debug, matcher_warn};

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    outstanding: usize,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: EngineHandle::new(config),
            outstanding: 0,
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartSimulator {
                    run_id,
                    step_labels,
                } => self.engine.start_simulator(run_id, step_labels),
                Effect::DispatchAnalysis { run_id, request } => {
                    self.outstanding += 1;
                    self.engine.dispatch(run_id, upload_request(request));
                }
                Effect::StopSimulator { run_id } => self.engine.stop_simulator(run_id),
                Effect::FetchRecentActivity => {
                    self.outstanding += 1;
                    self.engine.fetch_recent_activity();
                }
                Effect::WriteExport {
                    document_name,
                    analysis_id,
                    document,
                } => {
                    self.outstanding += 1;
                    self.engine.write_export(document_name, analysis_id, document);
                }
            }
        }
    }

    /// Work whose completion event has not arrived yet.
    pub fn has_outstanding(&self) -> bool {
        self.outstanding > 0
    }

    pub fn next_msg(&mut self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        let Some(event) = self.engine.recv_timeout(timeout)? else {
            return Ok(None);
        };
        if matches!(
            event,
            EngineEvent::AnalysisFinished { .. }
                | EngineEvent::RecentActivity(_)
                | EngineEvent::ExportWritten(_)
        ) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
        Ok(Some(map_event(event)))
    }
}

fn upload_request(request: AnalysisRequest) -> UploadRequest {
    let document = request.document;
    UploadRequest {
        file_name: document.file_name,
        content_type: document
            .content_type
            .unwrap_or_else(|| ACCEPTED_CONTENT_TYPE.to_string()),
        path: document.path,
        preferences: request.preferences,
        profile_link: request.profile_link,
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadProgress {
            run_id,
            sent,
            total,
        } => Msg::UploadProgress {
            run_id,
            sent,
            total,
        },
        EngineEvent::SimulatorTick {
            run_id,
            step_index,
            step_label,
            percent,
        } => Msg::SimulatorTick {
            run_id,
            step_index,
            step_label,
            percent,
        },
        EngineEvent::AnalysisFinished { run_id, result } => Msg::AnalysisCompleted {
            run_id,
            outcome: result.map_err(request_failure),
        },
        EngineEvent::RecentActivity(Ok(entries)) => {
            Msg::RecentActivityLoaded(entries.into_iter().map(activity_entry).collect())
        }
        EngineEvent::RecentActivity(Err(err)) => {
            matcher_warn!("Recent activity unavailable: {}", err);
            Msg::RecentActivityLoaded(Vec::new())
        }
        EngineEvent::ExportWritten(result) => Msg::ExportFinished(result),
    }
}

pub(crate) fn request_failure(err: DispatchError) -> RequestFailure {
    matcher_debug!("Dispatch failed: {}", err);
    match err.kind {
        FailureKind::Timeout => RequestFailure::Timeout,
        FailureKind::HttpStatus { status, body } => RequestFailure::HttpStatus { status, body },
        FailureKind::Network => RequestFailure::Connectivity {
            detail: err.message,
        },
        FailureKind::InvalidUrl
        | FailureKind::Io
        | FailureKind::Decode
        | FailureKind::Client => {
            RequestFailure::Unexpected {
                detail: err.message,
            }
        }
    }
}

fn activity_entry(entry: RecentActivity) -> ActivityEntry {
    ActivityEntry {
        status: StatusCategory::from_label(&entry.status),
        title: entry.title,
        time: entry.time,
    }
}
