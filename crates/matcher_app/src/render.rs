//! Plain-text rendering of the view model.
use std::io::{self, Write};

use matcher_core::{AppViewModel, ErrorKind, ExportStatus, Phase, StatusCategory};

pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = match view.phase {
        Phase::Running(_) => vec![progress_line(view)],
        Phase::Validating => vec![format!(
            "Checking {}",
            view.last_document.as_deref().unwrap_or("résumé")
        )],
        Phase::Succeeded => summary(view),
        Phase::Failed => failure(view),
        Phase::Idle => idle(view),
    };
    if !view.violations.is_empty() {
        lines.push("Cannot start the analysis:".to_string());
        lines.extend(view.violations.iter().map(|v| format!("  - {v}")));
    }
    lines
}

fn progress_line(view: &AppViewModel) -> String {
    format!(
        "[{:>3}%] {}",
        view.progress.percent(),
        view.progress.step_label()
    )
}

fn summary(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![format!(
        "Analysis complete for {}",
        view.last_document.as_deref().unwrap_or("résumé")
    )];
    if let Some(stats) = view.stats {
        lines.push(format!("  Readiness: {}/100", stats.readiness_score));
        lines.push(format!(
            "  Matches: {}  Gaps: {}  Skills: {}",
            stats.match_count, stats.gap_count, stats.skill_count
        ));
    }
    lines.push(format!("  Preferences: {}", view.preferences.join(", ")));
    if !view.activity.is_empty() {
        lines.push("Activity:".to_string());
        lines.extend(activity_rows(view));
    }
    if !view.agent_logs.is_empty() {
        lines.push("Agents:".to_string());
        for (agent, events) in &view.agent_logs {
            let last = events.last().map_or("", |event| status_word(event.status));
            lines.push(format!("  {agent}: {} events, last {last}", events.len()));
        }
    }
    match &view.last_export {
        Some(ExportStatus::Written(path)) => lines.push(format!("Exported to {}", path.display())),
        Some(ExportStatus::Failed(message)) => lines.push(format!("Export failed: {message}")),
        None => {}
    }
    lines
}

fn failure(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(error) = view.error.as_ref().filter(|e| e.kind != ErrorKind::Validation) {
        lines.push(format!("Analysis failed: {}", error.message));
    }
    if view.retry_available {
        if let Some(document) = &view.last_document {
            lines.push(format!("Retry is available for {document}."));
        }
    }
    lines
}

fn idle(view: &AppViewModel) -> Vec<String> {
    if !view.violations.is_empty() || view.activity.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Recent activity:".to_string()];
    lines.extend(activity_rows(view));
    lines
}

fn activity_rows(view: &AppViewModel) -> impl Iterator<Item = String> + '_ {
    view.activity.iter().map(|entry| {
        format!(
            "  {:<8} {}  ({})",
            status_word(entry.status),
            entry.title,
            entry.time
        )
    })
}

fn status_word(status: StatusCategory) -> &'static str {
    match status {
        StatusCategory::Success => "done",
        StatusCategory::Processing => "working",
        StatusCategory::Failed => "failed",
        StatusCategory::Warning => "warning",
    }
}

/// Writes frames, skipping one identical to the previous.
pub struct Screen<W: Write> {
    out: W,
    last: Vec<String>,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: Vec::new(),
        }
    }

    pub fn show(&mut self, lines: Vec<String>) -> io::Result<()> {
        if lines.is_empty() || lines == self.last {
            return Ok(());
        }
        for line in &lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        self.last = lines;
        Ok(())
    }
}
