//! Time-driven progress shown while the backend works without reporting.
use std::sync::Arc;
use std::time::Duration;

use matcher_logging::matcher_debug;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, ProgressSink, RunId};

pub const DEFAULT_CADENCE: Duration = Duration::from_secs(3);

/// Percent for a step; always below 90 so only completion reaches 100.
pub fn simulated_percent(step_index: usize, step_count: usize) -> u8 {
    if step_count == 0 {
        return 0;
    }
    let step_index = step_index.min(step_count - 1);
    (step_index * 90 / step_count) as u8
}

pub struct ProgressSimulator;

impl ProgressSimulator {
    /// Spawns the ticker on the current tokio runtime. Step 0 is implied by
    /// the run starting, so the first emitted tick is step 1.
    pub fn start(
        run_id: RunId,
        step_labels: Vec<String>,
        cadence: Duration,
        sink: Arc<dyn ProgressSink>,
    ) -> SimulatorHandle {
        let token = CancellationToken::new();
        tokio::spawn(run_ticks(run_id, step_labels, cadence, sink, token.clone()));
        SimulatorHandle { run_id, token }
    }
}

/// Stops the ticker when told to or when dropped.
#[derive(Debug)]
pub struct SimulatorHandle {
    run_id: RunId,
    token: CancellationToken,
}

impl SimulatorHandle {
    /// Idempotent.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            matcher_debug!("Stopping simulator for run {}", self.run_id);
            self.token.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_ticks(
    run_id: RunId,
    step_labels: Vec<String>,
    cadence: Duration,
    sink: Arc<dyn ProgressSink>,
    token: CancellationToken,
) {
    let step_count = step_labels.len();
    let mut ticker = interval_at(Instant::now() + cadence, cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut step_index = 0;
    while step_index + 1 < step_count {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {
                step_index += 1;
                sink.emit(EngineEvent::SimulatorTick {
                    run_id,
                    step_index,
                    step_label: step_labels[step_index].clone(),
                    percent: simulated_percent(step_index, step_count),
                });
            }
        }
    }
    matcher_debug!("Simulator for run {} reached its last step", run_id);
}
