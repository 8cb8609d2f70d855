use std::path::PathBuf;
use std::sync::Once;

use matcher_core::{
    update, AppState, DocumentHandle, Effect, ErrorKind, ExportStatus, Msg, Phase,
    RequestFailure, RunId, RunningStage, WorkflowConfig, NO_PREFERENCES_MESSAGE,
    SIMULATION_CEILING, TIMEOUT_MESSAGE, UPLOAD_CEILING,
};
use serde_json::{json, Value};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(matcher_logging::initialize_for_tests);
}

fn resume(size_bytes: u64) -> DocumentHandle {
    DocumentHandle {
        file_name: "resume.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        size_bytes,
        path: PathBuf::from("/tmp/resume.pdf"),
    }
}

fn state_with_defaults(defaults: &[&str]) -> AppState {
    AppState::with_config(WorkflowConfig {
        default_preferences: defaults.iter().map(|s| s.to_string()).collect(),
        ..WorkflowConfig::default()
    })
}

fn started(state: AppState, document: DocumentHandle) -> (AppState, RunId, Vec<Effect>) {
    let (state, effects) = update(state, Msg::FileSelected(document));
    let run_id = state.active_run().expect("run started");
    (state, run_id, effects)
}

fn tick(run_id: RunId, step_index: usize, percent: u8) -> Msg {
    Msg::SimulatorTick {
        run_id,
        step_index,
        step_label: format!("step {step_index}"),
        percent,
    }
}

fn success_payload() -> Value {
    json!({
        "analysis_id": "an-1",
        "processing_timestamp": "2025-03-01T10:00:00Z",
        "profile": {"skills": ["Rust", "SQL"]},
        "recommendations": [{"title": "A"}, {"title": "B"}, {"title": "C"}],
        "gaps": ["Docker", "AWS"],
        "readiness_evaluations": {"readiness_score": 81},
        "agent_communications": [],
    })
}

#[test]
fn valid_upload_dispatches_and_starts_simulator() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, effects) = started(state, resume(200 * 1024));

    assert_eq!(state.phase(), Phase::Running(RunningStage::Uploading));
    assert!(!state.view().upload_enabled);
    assert_eq!(effects.len(), 2);
    assert!(matches!(
        &effects[0],
        Effect::StartSimulator { run_id: id, step_labels } if *id == run_id && step_labels.len() == 6
    ));
    match &effects[1] {
        Effect::DispatchAnalysis { run_id: id, request } => {
            assert_eq!(*id, run_id);
            assert_eq!(request.preferences, vec!["Web Development".to_string()]);
            assert_eq!(request.document, resume(200 * 1024));
            assert_eq!(request.profile_link, None);
        }
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn invalid_file_never_reaches_running() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, effects) = update(state, Msg::FileSelected(resume(100)));

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.active_run(), None);
    let view = state.view();
    let error = view.error.expect("validation error");
    assert_eq!(error.kind, ErrorKind::Validation);
    assert!(!error.retryable);
    assert_eq!(error.message, view.violations[0]);
    assert!(!view.retry_available);
}

#[test]
fn all_violations_are_kept_but_first_is_shown() {
    init_logging();
    let state = state_with_defaults(&[]);
    let document = DocumentHandle {
        file_name: "resume.txt".to_string(),
        content_type: None,
        size_bytes: 10,
        path: PathBuf::from("resume.txt"),
    };
    let (state, _) = update(state, Msg::FileSelected(document));

    let view = state.view();
    assert_eq!(view.violations.len(), 3);
    assert_eq!(view.violations[2], NO_PREFERENCES_MESSAGE);
    assert_eq!(view.error.unwrap().message, view.violations[0]);
}

#[test]
fn invalid_profile_link_blocks_dispatch() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, _) = update(state, Msg::ProfileLinkChanged("not a url".to_string()));
    let (state, effects) = update(state, Msg::FileSelected(resume(4096)));

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn toggled_preferences_are_dispatched_in_selection_order() {
    init_logging();
    let state = state_with_defaults(&[]);
    let (state, _) = update(state, Msg::PreferenceToggled("Data Science".to_string()));
    let (state, _) = update(state, Msg::PreferenceToggled("  Mobile Development ".to_string()));
    let (_, _, effects) = started(state, resume(50 * 1024));

    let request = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::DispatchAnalysis { request, .. } => Some(request.clone()),
            _ => None,
        })
        .expect("dispatch effect");
    assert_eq!(
        request.preferences,
        vec!["Data Science".to_string(), "Mobile Development".to_string()]
    );
}

#[test]
fn toggling_twice_removes_preference() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, _) = update(state, Msg::PreferenceToggled("AI/ML".to_string()));
    let (state, _) = update(state, Msg::PreferenceToggled("Web Development".to_string()));
    let (state, _) = update(state, Msg::PreferenceToggled("  ".to_string()));

    assert_eq!(state.preferences().to_vec(), vec!["AI/ML".to_string()]);
}

#[test]
fn successful_run_normalizes_and_completes() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(200 * 1024));
    let (state, _) = update(
        state,
        Msg::UploadProgress {
            run_id,
            sent: 200 * 1024,
            total: 200 * 1024,
        },
    );
    let (mut state, effects) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Ok(success_payload()),
        },
    );

    assert_eq!(effects, vec![Effect::StopSimulator { run_id }]);
    assert_eq!(state.phase(), Phase::Succeeded);
    assert!(state.consume_dirty());
    let view = state.view();
    assert_eq!(view.progress.percent(), 100);
    let stats = view.stats.expect("stats");
    assert_eq!(stats.match_count, 3);
    assert_eq!(stats.gap_count, 2);
    assert_eq!(stats.skill_count, 2);
    assert_eq!(stats.readiness_score, 81);
    assert!(view.agent_logs.is_empty());
    assert!(view.export_available);
    assert!(view.upload_enabled);
    assert_eq!(state.raw_result(), Some(&success_payload()));
}

#[test]
fn percent_is_monotonic_and_arbitrated_while_running() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(100 * 1024));

    let msgs = vec![
        Msg::UploadProgress { run_id, sent: 10, total: 100 },
        tick(run_id, 1, 15),
        Msg::UploadProgress { run_id, sent: 60, total: 100 },
        tick(run_id, 2, 30),
        Msg::UploadProgress { run_id, sent: 40, total: 100 },
        Msg::UploadProgress { run_id, sent: 100, total: 100 },
        tick(run_id, 1, 15),
        tick(run_id, 3, 45),
        Msg::UploadProgress { run_id, sent: 100, total: 100 },
        tick(run_id, 5, 99),
    ];

    let mut state = state;
    let mut seen = vec![state.progress().percent()];
    for msg in msgs {
        let (next, effects) = update(state, msg);
        assert!(effects.is_empty());
        state = next;
        seen.push(state.progress().percent());
    }

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert_eq!(seen[3], 9);
    assert!(seen[..6].iter().all(|p| *p <= UPLOAD_CEILING));
    assert_eq!(seen[6], 30);
    assert_eq!(state.phase(), Phase::Running(RunningStage::Simulating));
    assert_eq!(*seen.last().unwrap(), SIMULATION_CEILING - 1);
    assert_eq!(state.progress().step_index(), 5);
}

#[test]
fn late_reports_after_success_are_ignored() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(4096));
    let (mut state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Ok(success_payload()),
        },
    );
    state.consume_dirty();
    let before = state.clone();

    for msg in [
        tick(run_id, 4, 60),
        Msg::UploadProgress { run_id, sent: 1, total: 1 },
        Msg::AnalysisCompleted {
            run_id,
            outcome: Err(RequestFailure::Timeout),
        },
    ] {
        let (next, effects) = update(state, msg);
        assert!(effects.is_empty());
        state = next;
    }

    assert_eq!(state, before);
    assert!(!state.consume_dirty());
    assert_eq!(state.progress().percent(), 100);
}

#[test]
fn late_tick_after_failure_is_ignored() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Err(RequestFailure::Connectivity {
                detail: "connection refused".to_string(),
            }),
        },
    );
    let before = state.clone();

    let (state, effects) = update(state, tick(run_id, 2, 30));

    assert!(effects.is_empty());
    assert_eq!(state, before);
    assert_eq!(state.progress().percent(), 0);
}

#[test]
fn reports_for_a_superseded_run_are_ignored() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, first, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id: first,
            outcome: Err(RequestFailure::Timeout),
        },
    );
    let (state, second, _) = started(state, resume(8192));
    assert_ne!(first, second);

    let (state, effects) = update(
        state,
        Msg::AnalysisCompleted {
            run_id: first,
            outcome: Ok(success_payload()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Running(RunningStage::Uploading));
}

#[test]
fn embedded_error_in_ok_payload_fails_the_run() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(4096));
    let (state, effects) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Ok(json!({"error": "Could not read PDF text"})),
        },
    );

    assert_eq!(effects, vec![Effect::StopSimulator { run_id }]);
    assert_eq!(state.phase(), Phase::Failed);
    let error = state.view().error.unwrap();
    assert_eq!(error.kind, ErrorKind::Unexpected);
    assert_eq!(error.message, "Analysis failed: Could not read PDF text");
    assert!(state.view().stats.is_none());
}

#[test]
fn timeout_fails_and_retry_reuses_the_original_file() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let original = resume(200 * 1024);
    let (state, run_id, _) = started(state, original.clone());
    let (state, _) = update(state, Msg::UploadProgress { run_id, sent: 5, total: 10 });
    let (state, _) = update(state, tick(run_id, 1, 15));

    let (state, effects) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Err(RequestFailure::Timeout),
        },
    );

    assert_eq!(effects, vec![Effect::StopSimulator { run_id }]);
    assert_eq!(state.phase(), Phase::Failed);
    let view = state.view();
    assert_eq!(view.progress.percent(), 0);
    let error = view.error.clone().unwrap();
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(error.message, TIMEOUT_MESSAGE);
    assert!(error.retryable);
    assert!(view.retry_available);
    assert_eq!(view.last_document.as_deref(), Some("resume.pdf"));

    let (state, effects) = update(state, Msg::RetryClicked);
    let retry_run = state.active_run().unwrap();
    assert_ne!(retry_run, run_id);
    assert!(state.view().error.is_none());
    let dispatched = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::DispatchAnalysis { request, .. } => Some(request.document.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(dispatched, original);
}

#[test]
fn server_error_prefers_body_message() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Err(RequestFailure::HttpStatus {
                status: 422,
                body: Some(json!({"error": "Unsupported résumé layout"})),
            }),
        },
    );
    assert_eq!(
        state.view().error.unwrap().message,
        "Unsupported résumé layout"
    );

    let (state, run_id, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Err(RequestFailure::HttpStatus {
                status: 502,
                body: None,
            }),
        },
    );
    let error = state.view().error.unwrap();
    assert_eq!(error.kind, ErrorKind::Server);
    assert_eq!(error.message, "Request failed (status 502)");
}

#[test]
fn controls_are_ignored_while_running() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(4096));
    let before = state.clone();

    for msg in [
        Msg::FileSelected(resume(8192)),
        Msg::RetryClicked,
        Msg::ResetClicked,
        Msg::NewAnalysisClicked,
        Msg::ExportClicked {
            exported_at: "now".to_string(),
        },
    ] {
        let (next, effects) = update(state.clone(), msg);
        assert!(effects.is_empty());
        assert_eq!(next.active_run(), Some(run_id));
        assert_eq!(next.phase(), before.phase());
    }
}

#[test]
fn reset_keeps_last_document_but_new_analysis_forgets_it() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, _) = update(state, Msg::PreferenceToggled("Cybersecurity".to_string()));
    let (state, _) = update(
        state,
        Msg::ProfileLinkChanged("https://github.com/ada".to_string()),
    );
    let (state, run_id, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Ok(success_payload()),
        },
    );

    let (state, effects) = update(state, Msg::ResetClicked);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, Phase::Idle);
    assert!(view.stats.is_none());
    assert!(view.error.is_none());
    assert_eq!(view.progress.percent(), 0);
    assert_eq!(view.preferences, vec!["Web Development".to_string()]);
    assert_eq!(view.profile_link.as_deref(), Some("https://github.com/ada"));
    assert!(view.retry_available);

    let (state, _) = update(state, Msg::NewAnalysisClicked);
    let view = state.view();
    assert!(!view.retry_available);
    assert_eq!(view.last_document, None);
    assert_eq!(view.profile_link, None);

    let (state, effects) = update(state, Msg::RetryClicked);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn result_activity_supersedes_recent_feed() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, effects) = update(state, Msg::RecentActivityRequested);
    assert_eq!(effects, vec![Effect::FetchRecentActivity]);

    let feed = vec![matcher_core::ActivityEntry {
        title: "Uploaded resume_v1.pdf".to_string(),
        time: "yesterday".to_string(),
        status: matcher_core::StatusCategory::Success,
    }];
    let (state, _) = update(state, Msg::RecentActivityLoaded(feed.clone()));
    assert_eq!(state.view().activity, feed);

    let (state, run_id, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Ok(success_payload()),
        },
    );
    let activity = state.view().activity;
    assert_eq!(activity.len(), 3);
    assert_eq!(activity[0].time, "2025-03-01T10:00:00Z");

    let (state, _) = update(state, Msg::ResetClicked);
    assert_eq!(state.view().activity, feed);
}

#[test]
fn export_is_only_offered_after_success() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, effects) = update(
        state,
        Msg::ExportClicked {
            exported_at: "t0".to_string(),
        },
    );
    assert!(effects.is_empty());

    let (state, run_id, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Ok(success_payload()),
        },
    );
    let (state, effects) = update(
        state,
        Msg::ExportClicked {
            exported_at: "2025-03-02T08:00:00Z".to_string(),
        },
    );
    match effects.as_slice() {
        [Effect::WriteExport {
            document_name,
            analysis_id,
            document,
        }] => {
            assert_eq!(document_name, "resume.pdf");
            assert_eq!(analysis_id.as_deref(), Some("an-1"));
            assert_eq!(document["exported_at"], json!("2025-03-02T08:00:00Z"));
            assert_eq!(document["stats"]["gap_count"], json!(2));
        }
        other => panic!("unexpected effects {other:?}"),
    }

    let path = PathBuf::from("out/resume--abcd.json");
    let (state, _) = update(state, Msg::ExportFinished(Ok(path.clone())));
    assert_eq!(state.view().last_export, Some(ExportStatus::Written(path)));
}

#[test]
fn rejected_file_after_success_keeps_the_result_exportable() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(200 * 1024));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Ok(success_payload()),
        },
    );

    let (state, effects) = update(state, Msg::FileSelected(resume(10)));
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, Phase::Succeeded);
    assert_eq!(view.progress.percent(), 100);
    assert_eq!(view.stats.map(|s| s.match_count), Some(3));
    assert!(view.export_available);
    assert_eq!(view.error.map(|e| e.kind), Some(ErrorKind::Validation));

    let (_, effects) = update(
        state,
        Msg::ExportClicked {
            exported_at: "2025-03-01T12:00:00Z".to_string(),
        },
    );
    assert!(matches!(effects.as_slice(), [Effect::WriteExport { .. }]));
}

#[test]
fn rejected_file_after_failure_stays_failed() {
    init_logging();
    let state = state_with_defaults(&["Web Development"]);
    let (state, run_id, _) = started(state, resume(4096));
    let (state, _) = update(
        state,
        Msg::AnalysisCompleted {
            run_id,
            outcome: Err(RequestFailure::Timeout),
        },
    );

    let (state, effects) = update(state, Msg::FileSelected(resume(10)));
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(state.progress().percent(), 0);
}
