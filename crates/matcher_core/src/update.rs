use matcher_logging::{matcher_debug, matcher_info};
use serde_json::Value;

use crate::state::CompletedAnalysis;
use crate::{
    build_export, classify, normalize, validate_file, validate_preferences,
    validate_profile_link, AnalysisRequest, AppState, DocumentHandle, Effect, ExportStatus, Msg,
    NormalizeError, Phase, RequestFailure, RunId, NO_PREFERENCES_MESSAGE,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PreferenceToggled(pref) => {
            state.toggle_preference(&pref);
            Vec::new()
        }
        Msg::ProfileLinkChanged(link) => {
            state.set_profile_link(link);
            Vec::new()
        }
        Msg::FileSelected(document) => {
            if state.is_running() {
                matcher_debug!("Ignoring {} while a run is in flight", document.file_name);
                return (state, Vec::new());
            }
            start_run(&mut state, document)
        }
        Msg::RetryClicked => {
            if state.is_running() {
                return (state, Vec::new());
            }
            match state.last_document().cloned() {
                Some(document) => start_run(&mut state, document),
                None => Vec::new(),
            }
        }
        Msg::ResetClicked => {
            if !state.is_running() {
                state.reset_to_defaults();
            }
            Vec::new()
        }
        Msg::NewAnalysisClicked => {
            if !state.is_running() {
                state.clear_all();
            }
            Vec::new()
        }
        Msg::ExportClicked { exported_at } => match state.completed() {
            Some(done) if state.phase() == Phase::Succeeded => {
                vec![export_effect(done, &exported_at)]
            }
            _ => Vec::new(),
        },
        Msg::ExportFinished(result) => {
            state.record_export(match result {
                Ok(path) => ExportStatus::Written(path),
                Err(message) => ExportStatus::Failed(message),
            });
            Vec::new()
        }
        Msg::RecentActivityRequested => vec![Effect::FetchRecentActivity],
        Msg::RecentActivityLoaded(entries) => {
            state.set_recent_activity(entries);
            Vec::new()
        }
        Msg::UploadProgress {
            run_id,
            sent,
            total,
        } => {
            if state.is_active_run(run_id) {
                state.apply_upload(sent, total);
            }
            Vec::new()
        }
        Msg::SimulatorTick {
            run_id,
            step_index,
            step_label,
            percent,
        } => {
            if state.is_active_run(run_id) {
                state.apply_simulation(step_index, &step_label, percent);
            }
            Vec::new()
        }
        Msg::AnalysisCompleted { run_id, outcome } => {
            if !state.is_active_run(run_id) {
                matcher_debug!("Dropping late completion for run {}", run_id);
                return (state, Vec::new());
            }
            finish_run(&mut state, run_id, outcome)
        }
    };

    (state, effects)
}

/// Validates synchronously, then either rejects or dispatches.
fn start_run(state: &mut AppState, document: DocumentHandle) -> Vec<Effect> {
    let resting = state.phase();
    state.enter_validating();

    let mut violations: Vec<String> = validate_file(Some(&document), state.rules())
        .iter()
        .map(ToString::to_string)
        .collect();
    if !validate_preferences(state.preferences()) {
        violations.push(NO_PREFERENCES_MESSAGE.to_string());
    }
    let profile_link = state.profile_link().map(ToOwned::to_owned);
    if let Some(Err(err)) = profile_link.as_deref().map(validate_profile_link) {
        violations.push(err.to_string());
    }
    if !violations.is_empty() {
        state.reject(violations, resting);
        return Vec::new();
    }

    let request = AnalysisRequest {
        document: document.clone(),
        preferences: state.preferences().to_vec(),
        profile_link,
    };
    let run_id = state.begin_run(document);
    vec![
        Effect::StartSimulator {
            run_id,
            step_labels: state.step_labels().to_vec(),
        },
        Effect::DispatchAnalysis { run_id, request },
    ]
}

/// Exactly one terminal transition per run; the simulator stop travels with it.
fn finish_run(
    state: &mut AppState,
    run_id: RunId,
    outcome: Result<Value, RequestFailure>,
) -> Vec<Effect> {
    let normalized = outcome.and_then(|raw| match normalize(&raw) {
        Ok(normalized) => Ok((raw, normalized)),
        Err(NormalizeError::Embedded(message)) => Err(RequestFailure::EmbeddedError { message }),
    });
    match normalized {
        Ok((raw, normalized)) => {
            matcher_info!(
                "Run {} succeeded: {} matches, {} gaps",
                run_id,
                normalized.stats.match_count,
                normalized.stats.gap_count
            );
            state.succeed(raw, normalized);
        }
        Err(failure) => state.fail(classify(&failure)),
    }
    vec![Effect::StopSimulator { run_id }]
}

fn export_effect(done: &CompletedAnalysis, exported_at: &str) -> Effect {
    Effect::WriteExport {
        document_name: done.document_name.clone(),
        analysis_id: done
            .raw
            .get("analysis_id")
            .and_then(|id| match id {
                Value::String(text) => Some(text.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        document: build_export(&done.raw, &done.normalized, exported_at),
    }
}
