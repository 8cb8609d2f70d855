//! Percent arbitration between the upload driver and the progress simulator.
//!
//! Both producers report asynchronously and in no particular order relative
//! to each other. Each write is clamped to the producer's sub-range and can
//! only raise the percent; only the orchestrator completes or resets it.

/// Highest percent the upload driver may claim.
pub const UPLOAD_CEILING: u8 = 15;
/// Exclusive upper bound for simulated progress.
pub const SIMULATION_CEILING: u8 = 90;

const COMPLETE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    step_index: usize,
    step_label: String,
    percent: u8,
    /// Latest simulator reading, held back until the upload hands over.
    simulated: u8,
}

impl ProgressState {
    pub(crate) fn begin(first_label: Option<&str>) -> Self {
        Self {
            step_label: first_label.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn step_label(&self) -> &str {
        &self.step_label
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Maps transferred bytes into `[0, UPLOAD_CEILING]`. Returns whether the
    /// visible state changed.
    pub(crate) fn apply_upload(&mut self, sent: u64, total: u64) -> bool {
        let scaled = if total == 0 {
            u64::from(UPLOAD_CEILING)
        } else {
            sent.min(total).saturating_mul(u64::from(UPLOAD_CEILING)) / total
        };
        // scaled <= UPLOAD_CEILING, fits in u8
        self.raise(scaled as u8)
    }

    /// Records a simulator step. The percent is only applied when the
    /// simulator is authoritative, i.e. after the upload finished.
    pub(crate) fn apply_simulation(
        &mut self,
        step_index: usize,
        step_label: &str,
        percent: u8,
        authoritative: bool,
    ) -> bool {
        if step_index < self.step_index {
            return false;
        }
        let mut changed = false;
        if step_index != self.step_index || step_label != self.step_label {
            self.step_index = step_index;
            self.step_label = step_label.to_string();
            changed = true;
        }
        let clamped = percent.clamp(UPLOAD_CEILING, SIMULATION_CEILING - 1);
        self.simulated = self.simulated.max(clamped);
        if authoritative {
            changed |= self.raise(self.simulated);
        }
        changed
    }

    /// Upload finished: the simulator takes over from the upload ceiling.
    pub(crate) fn hand_over(&mut self) -> bool {
        let floor = self.simulated.max(UPLOAD_CEILING);
        self.raise(floor)
    }

    pub(crate) fn complete(&mut self) {
        self.percent = COMPLETE;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    fn raise(&mut self, to: u8) -> bool {
        if to > self.percent {
            self.percent = to;
            true
        } else {
            false
        }
    }
}
