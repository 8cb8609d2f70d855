use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use matcher_logging::{matcher_debug, matcher_error, matcher_info};
use serde_json::Value;
use thiserror::Error;

use crate::upload::{AnalysisClient, ChannelProgressSink, ReqwestAnalysisClient, UploadSettings};
use crate::{
    export_filename, EngineEvent, ExportWriter, ProgressSimulator, RunId, SimulatorHandle,
    UploadRequest, DEFAULT_CADENCE,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub upload: UploadSettings,
    pub simulator_cadence: Duration,
    pub output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upload: UploadSettings::default(),
            simulator_cadence: DEFAULT_CADENCE,
            output_dir: PathBuf::from("output"),
        }
    }
}

enum EngineCommand {
    Dispatch {
        run_id: RunId,
        request: UploadRequest,
    },
    StartSimulator {
        run_id: RunId,
        step_labels: Vec<String>,
    },
    StopSimulator {
        run_id: RunId,
    },
    FetchRecentActivity,
    WriteExport {
        document_name: String,
        analysis_id: Option<String>,
        document: Value,
    },
}

/// Owns the background thread and its tokio runtime. Dropping the handle
/// closes the command channel, which stops the thread and every simulator.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let client = Arc::new(ReqwestAnalysisClient::new(config.upload.clone()));
            let mut simulators: HashMap<RunId, SimulatorHandle> = HashMap::new();

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartSimulator {
                        run_id,
                        step_labels,
                    } => {
                        let _entered = runtime.enter();
                        let sink = Arc::new(ChannelProgressSink::new(event_tx.clone()));
                        let handle = ProgressSimulator::start(
                            run_id,
                            step_labels,
                            config.simulator_cadence,
                            sink,
                        );
                        simulators.insert(run_id, handle);
                    }
                    EngineCommand::StopSimulator { run_id } => {
                        if let Some(handle) = simulators.remove(&run_id) {
                            handle.stop();
                        }
                    }
                    EngineCommand::Dispatch { run_id, request } => {
                        let client = client.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            dispatch(client.as_ref(), run_id, request, event_tx).await;
                        });
                    }
                    EngineCommand::FetchRecentActivity => {
                        let client = client.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let result = client.recent_activity().await;
                            if let Err(err) = &result {
                                matcher_debug!("Recent activity unavailable: {}", err);
                            }
                            let _ = event_tx.send(EngineEvent::RecentActivity(result));
                        });
                    }
                    EngineCommand::WriteExport {
                        document_name,
                        analysis_id,
                        document,
                    } => {
                        let writer = ExportWriter::new(config.output_dir.clone());
                        let event_tx = event_tx.clone();
                        runtime.spawn_blocking(move || {
                            let filename =
                                export_filename(&document_name, analysis_id.as_deref());
                            let result = writer.write(&filename, &document).map_err(|err| {
                                matcher_error!("Export of {} failed: {}", filename, err);
                                err.to_string()
                            });
                            let _ = event_tx.send(EngineEvent::ExportWritten(result));
                        });
                    }
                }
            }
            matcher_debug!("Engine command channel closed; stopping {} simulators", simulators.len());
        });

        Self { cmd_tx, event_rx }
    }

    pub fn dispatch(&self, run_id: RunId, request: UploadRequest) {
        self.send(EngineCommand::Dispatch { run_id, request });
    }

    pub fn start_simulator(&self, run_id: RunId, step_labels: Vec<String>) {
        self.send(EngineCommand::StartSimulator {
            run_id,
            step_labels,
        });
    }

    pub fn stop_simulator(&self, run_id: RunId) {
        self.send(EngineCommand::StopSimulator { run_id });
    }

    pub fn fetch_recent_activity(&self) {
        self.send(EngineCommand::FetchRecentActivity);
    }

    pub fn write_export(&self, document_name: String, analysis_id: Option<String>, document: Value) {
        self.send(EngineCommand::WriteExport {
            document_name,
            analysis_id,
            document,
        });
    }

    /// `Ok(None)` on timeout; an error once the engine thread is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        poll_events(&self.event_rx, timeout)
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            matcher_error!("Engine thread is gone; command dropped");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread stopped")]
pub struct EngineStopped;

fn poll_events<T>(rx: &mpsc::Receiver<T>, timeout: Duration) -> Result<Option<T>, EngineStopped> {
    match rx.recv_timeout(timeout) {
        Ok(event) => Ok(Some(event)),
        Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
    }
}

async fn dispatch(
    client: &dyn AnalysisClient,
    run_id: RunId,
    request: UploadRequest,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = Arc::new(ChannelProgressSink::new(event_tx.clone()));
    let result = client.analyze(run_id, &request, sink).await;
    match &result {
        Ok(_) => matcher_info!("Run {} returned a result", run_id),
        Err(err) => matcher_info!("Run {} failed: {}", run_id, err),
    }
    let _ = event_tx.send(EngineEvent::AnalysisFinished { run_id, result });
}
