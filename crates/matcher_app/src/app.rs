use std::fs;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use matcher_core::{
    update, AppState, AppViewModel, DocumentHandle, ErrorKind, Msg, Phase, ACCEPTED_CONTENT_TYPE,
    ACCEPTED_EXTENSION,
};
use matcher_logging::{matcher_info, set_current_run};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::render::{render, Screen};

const POLL_INTERVAL: Duration = Duration::from_millis(75);

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub resume: Option<PathBuf>,
    pub profile_link: Option<String>,
    pub export: bool,
    pub max_retries: u32,
    pub recent: bool,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            resume: cli.resume.clone(),
            profile_link: cli.profile_link.clone(),
            export: cli.export,
            max_retries: cli.max_retries,
            recent: cli.recent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    failed: bool,
}

impl Outcome {
    fn from_view(view: &AppViewModel) -> Self {
        Self {
            failed: view.phase == Phase::Failed || !view.violations.is_empty(),
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.failed
    }
}

pub fn run(config: &AppConfig, options: RunOptions) -> Result<Outcome> {
    let mut session = Session {
        state: AppState::with_config(config.workflow_config()),
        runner: EffectRunner::new(config.engine_config()),
        screen: Screen::new(io::stdout()),
    };
    let clock = || Utc::now().to_rfc3339();
    let mut follow_up = FollowUp::new(&options);

    if let Some(link) = &options.profile_link {
        session.dispatch(Msg::ProfileLinkChanged(link.clone()))?;
    }
    if options.recent {
        session.dispatch(Msg::RecentActivityRequested)?;
    }
    if let Some(path) = &options.resume {
        session.dispatch(Msg::FileSelected(document_handle(path)?))?;
    }

    loop {
        if let Some(msg) = session
            .runner
            .next_msg(POLL_INTERVAL)
            .context("waiting for the analysis engine")?
        {
            session.dispatch(msg)?;
            continue;
        }
        if session.state.is_running() || session.runner.has_outstanding() {
            continue;
        }
        match follow_up.next(&session.state.view(), &clock) {
            Some(msg) => session.dispatch(msg)?,
            None => break,
        }
    }

    set_current_run(None);
    Ok(Outcome::from_view(&session.state.view()))
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    screen: Screen<Stdout>,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) -> Result<()> {
        set_current_run(self.state.active_run());
        let (state, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = state;
        self.runner.run(effects);
        if self.state.consume_dirty() {
            self.screen
                .show(render(&self.state.view()))
                .context("writing to stdout")?;
        }
        Ok(())
    }
}

/// What the front end does on its own once the workflow goes quiet.
#[derive(Debug)]
struct FollowUp {
    retries_left: u32,
    export: bool,
    export_requested: bool,
}

impl FollowUp {
    fn new(options: &RunOptions) -> Self {
        Self {
            retries_left: options.max_retries,
            export: options.export,
            export_requested: false,
        }
    }

    fn next(&mut self, view: &AppViewModel, clock: &dyn Fn() -> String) -> Option<Msg> {
        match view.phase {
            Phase::Failed if view.retry_available && self.retries_left > 0 => {
                let kind = view.error.as_ref().map(|e| e.kind);
                if kind == Some(ErrorKind::Validation) {
                    return None;
                }
                self.retries_left -= 1;
                matcher_info!("Retrying ({} retries left)", self.retries_left);
                Some(Msg::RetryClicked)
            }
            Phase::Succeeded if self.export && !self.export_requested => {
                self.export_requested = true;
                Some(Msg::ExportClicked {
                    exported_at: clock(),
                })
            }
            _ => None,
        }
    }
}

/// Builds the handle the core validates; only metadata is read here.
fn document_handle(path: &Path) -> Result<DocumentHandle> {
    let meta = fs::metadata(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION));
    Ok(DocumentHandle {
        file_name,
        content_type: is_pdf.then(|| ACCEPTED_CONTENT_TYPE.to_string()),
        size_bytes: meta.len(),
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use matcher_core::ErrorState;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn failed_view(kind: ErrorKind) -> AppViewModel {
        AppViewModel {
            phase: Phase::Failed,
            error: Some(ErrorState {
                kind,
                message: "nope".to_string(),
                retryable: true,
            }),
            retry_available: true,
            ..AppViewModel::default()
        }
    }

    fn clock() -> String {
        "2025-03-01T12:00:00+00:00".to_string()
    }

    #[test]
    fn retries_are_bounded() {
        let mut follow_up = FollowUp::new(&RunOptions {
            max_retries: 2,
            ..RunOptions::default()
        });
        let view = failed_view(ErrorKind::Timeout);

        assert_eq!(follow_up.next(&view, &clock), Some(Msg::RetryClicked));
        assert_eq!(follow_up.next(&view, &clock), Some(Msg::RetryClicked));
        assert_eq!(follow_up.next(&view, &clock), None);
    }

    #[test]
    fn export_is_requested_once_after_success() {
        let mut follow_up = FollowUp::new(&RunOptions {
            export: true,
            ..RunOptions::default()
        });
        let view = AppViewModel {
            phase: Phase::Succeeded,
            ..AppViewModel::default()
        };

        assert_eq!(
            follow_up.next(&view, &clock),
            Some(Msg::ExportClicked {
                exported_at: clock()
            })
        );
        assert_eq!(follow_up.next(&view, &clock), None);
    }

    #[test]
    fn nothing_to_do_without_options() {
        let mut follow_up = FollowUp::new(&RunOptions::default());
        assert_eq!(follow_up.next(&failed_view(ErrorKind::Server), &clock), None);
    }

    #[test]
    fn handle_comes_from_file_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CV.PDF");
        fs::write(&path, vec![b'a'; 2048]).unwrap();

        let handle = document_handle(&path).unwrap();
        assert_eq!(handle.file_name, "CV.PDF");
        assert_eq!(handle.size_bytes, 2048);
        assert_eq!(handle.content_type.as_deref(), Some(ACCEPTED_CONTENT_TYPE));
        assert!(document_handle(&temp.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn outcome_fails_on_rejection_or_failure() {
        let rejected = AppViewModel {
            violations: vec!["too big".to_string()],
            ..AppViewModel::default()
        };
        assert!(!Outcome::from_view(&rejected).succeeded());
        assert!(!Outcome::from_view(&failed_view(ErrorKind::Server)).succeeded());
        assert!(Outcome::from_view(&AppViewModel::default()).succeeded());
    }
}
