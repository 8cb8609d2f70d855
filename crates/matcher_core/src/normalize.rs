//! Maps a loosely structured analysis payload into display aggregates.
//!
//! The backend has used several field names for the same concept over time,
//! so every stat is read through an ordered list of JSON pointers and the
//! first present value wins.
use std::collections::BTreeMap;

use matcher_logging::matcher_warn;
use serde_json::Value;
use thiserror::Error;

use crate::{ActivityEntry, StatusCategory};

/// Shown when the payload carries no readiness score; zero would read as
/// "scored and failed".
pub const DEFAULT_READINESS_SCORE: u32 = 70;

const UNKNOWN_TIME: &str = "unknown";
const UNKNOWN_AGENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
enum Reading {
    Score,
    Count,
}

struct Synonyms {
    field: &'static str,
    reading: Reading,
    pointers: &'static [&'static str],
}

const READINESS: Synonyms = Synonyms {
    field: "readiness_score",
    reading: Reading::Score,
    pointers: &[
        "/readiness_evaluations/readiness_score",
        "/readiness_evaluations/overall_score",
        "/readiness_evaluations/internship_readiness_score",
        "/readiness_score",
    ],
};

const MATCHES: Synonyms = Synonyms {
    field: "match_count",
    reading: Reading::Count,
    pointers: &[
        "/match_count",
        "/total_matches",
        "/recommendations",
        "/recommendations/internships",
    ],
};

const GAPS: Synonyms = Synonyms {
    field: "gap_count",
    reading: Reading::Count,
    pointers: &[
        "/gap_count",
        "/gaps/total_gaps",
        "/gaps",
        "/gaps/missing_skills",
    ],
};

const SKILLS: Synonyms = Synonyms {
    field: "skill_count",
    reading: Reading::Count,
    pointers: &[
        "/skill_count",
        "/profile/skill_count",
        "/profile/skills",
        "/profile/technical_skills",
    ],
};

const ALL_SYNONYMS: [&Synonyms; 4] = [&READINESS, &MATCHES, &GAPS, &SKILLS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub readiness_score: u32,
    pub match_count: u64,
    pub gap_count: u64,
    pub skill_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEvent {
    pub status: StatusCategory,
    pub message: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResult {
    pub stats: Stats,
    /// Reverse-chronological: the last pipeline phase comes first.
    pub activity: Vec<ActivityEntry>,
    /// Agent name to its events, in arrival order.
    pub agent_logs: BTreeMap<String, Vec<AgentEvent>>,
}

/// Two synonymous fields present with different values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymConflict {
    pub field: &'static str,
    pub readings: Vec<(&'static str, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("{0}")]
    Embedded(String),
}

pub fn normalize(raw: &Value) -> Result<NormalizedResult, NormalizeError> {
    if let Some(message) = embedded_error(raw) {
        return Err(NormalizeError::Embedded(message));
    }

    for conflict in synonym_conflicts(raw) {
        matcher_warn!(
            "Payload disagrees on {}: {:?}; using {}",
            conflict.field,
            conflict.readings,
            conflict.readings[0].0
        );
    }

    let stats = Stats {
        readiness_score: first_reading(raw, &READINESS)
            .map(|(_, score)| score as u32)
            .unwrap_or(DEFAULT_READINESS_SCORE),
        match_count: first_reading(raw, &MATCHES).map_or(0, |(_, n)| n),
        gap_count: first_reading(raw, &GAPS).map_or(0, |(_, n)| n),
        skill_count: first_reading(raw, &SKILLS).map_or(0, |(_, n)| n),
    };

    Ok(NormalizedResult {
        activity: activity_from(raw, &stats),
        agent_logs: group_agent_logs(raw),
        stats,
    })
}

/// Every stat whose present synonyms disagree, readings in priority order.
pub fn synonym_conflicts(raw: &Value) -> Vec<SynonymConflict> {
    ALL_SYNONYMS
        .iter()
        .filter_map(|synonyms| {
            let readings: Vec<_> = all_readings(raw, synonyms).collect();
            let first = readings.first()?.1;
            readings
                .iter()
                .any(|(_, value)| *value != first)
                .then_some(SynonymConflict {
                    field: synonyms.field,
                    readings,
                })
        })
        .collect()
}

fn first_reading(raw: &Value, synonyms: &Synonyms) -> Option<(&'static str, u64)> {
    all_readings(raw, synonyms).next()
}

fn all_readings<'a>(
    raw: &'a Value,
    synonyms: &'a Synonyms,
) -> impl Iterator<Item = (&'static str, u64)> + 'a {
    synonyms.pointers.iter().filter_map(move |pointer| {
        let value = raw.pointer(pointer)?;
        let reading = match synonyms.reading {
            Reading::Score => score_of(value),
            Reading::Count => count_of(value),
        }?;
        Some((*pointer, reading))
    })
}

/// Percentage, rounded and clamped to 0..=100. Numeric strings are accepted.
fn score_of(value: &Value) -> Option<u64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    number
        .is_finite()
        .then(|| number.round().clamp(0.0, 100.0) as u64)
}

/// A count is either a non-negative number or the length of an array.
fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::Array(items) => Some(items.len() as u64),
        _ => None,
    }
}

fn embedded_error(raw: &Value) -> Option<String> {
    let fallback = || {
        raw.get("message")
            .and_then(Value::as_str)
            .unwrap_or("the analysis reported an error")
            .to_string()
    };
    match raw.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.trim().to_string()),
        Value::Bool(true) => Some(fallback()),
        Value::Object(map) => Some(
            map.get("message")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .unwrap_or_else(fallback),
        ),
        other => Some(other.to_string()),
    }
}

fn activity_from(raw: &Value, stats: &Stats) -> Vec<ActivityEntry> {
    let time = raw
        .get("processing_timestamp")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_TIME);
    let entry = |title: String| ActivityEntry {
        title,
        time: time.to_string(),
        status: StatusCategory::Success,
    };

    let mut activity = Vec::with_capacity(4);
    if raw.get("github_analysis").is_some_and(|v| !v.is_null()) {
        activity.push(entry("Source-code profile analyzed".to_string()));
    }
    activity.push(entry(format!(
        "Skill gap analysis completed ({} gaps)",
        stats.gap_count
    )));
    activity.push(entry(format!(
        "Internship matching completed ({} matches)",
        stats.match_count
    )));
    activity.push(entry("Profile extracted from résumé".to_string()));
    activity
}

fn group_agent_logs(raw: &Value) -> BTreeMap<String, Vec<AgentEvent>> {
    let mut groups: BTreeMap<String, Vec<AgentEvent>> = BTreeMap::new();
    let Some(events) = raw.get("agent_communications").and_then(Value::as_array) else {
        return groups;
    };
    for event in events.iter().filter(|e| e.is_object()) {
        let agent = ["agent", "agent_name"]
            .iter()
            .find_map(|key| event.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_AGENT);
        let status = event
            .get("status")
            .and_then(Value::as_str)
            .map_or(StatusCategory::Warning, StatusCategory::from_label);
        groups.entry(agent.to_string()).or_default().push(AgentEvent {
            status,
            message: event
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            timestamp: event
                .get("timestamp")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
        });
    }
    groups
}
