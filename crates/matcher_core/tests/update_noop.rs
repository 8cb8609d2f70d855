use matcher_core::{update, AppState, Msg, RequestFailure};

#[test]
fn report_for_unknown_run_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(
        state.clone(),
        Msg::UploadProgress {
            run_id: 42,
            sent: 10,
            total: 10,
        },
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn late_completion_does_not_dirty_state() {
    let (mut next, effects) = update(
        AppState::new(),
        Msg::AnalysisCompleted {
            run_id: 7,
            outcome: Err(RequestFailure::Timeout),
        },
    );

    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}
