//! Pre-flight checks. Nothing here touches the network or the filesystem.
use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::DocumentHandle;

pub const ACCEPTED_EXTENSION: &str = "pdf";
pub const ACCEPTED_CONTENT_TYPE: &str = "application/pdf";
pub const NO_PREFERENCES_MESSAGE: &str = "Please select at least one internship domain.";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Size bounds for an acceptable résumé.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRules {
    pub min_bytes: u64,
    pub max_bytes: u64,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            min_bytes: KIB,
            max_bytes: 5 * MIB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileViolation {
    #[error("Please select a résumé to analyze.")]
    Missing,
    #[error("Only PDF résumés are supported (got \"{file_name}\").")]
    UnsupportedType { file_name: String },
    #[error("File type {content_type} is not supported; upload a PDF.")]
    UnsupportedContentType { content_type: String },
    #[error("File is too small ({}); it must be at least {}.", human_size(.actual), human_size(.min))]
    TooSmall { actual: u64, min: u64 },
    #[error("File is too large ({}); the limit is {}.", human_size(.actual), human_size(.max))]
    TooLarge { actual: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileLinkViolation {
    #[error("Profile link is not a valid URL: {0}")]
    Malformed(String),
    #[error("Profile link must use http or https (got {0}).")]
    UnsupportedScheme(String),
}

/// Returns every rule the document breaks, in check order.
pub fn validate_file(document: Option<&DocumentHandle>, rules: &FileRules) -> Vec<FileViolation> {
    let Some(document) = document else {
        return vec![FileViolation::Missing];
    };

    let mut violations = Vec::new();
    let extension_ok = Path::new(&document.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION));
    if !extension_ok {
        violations.push(FileViolation::UnsupportedType {
            file_name: document.file_name.clone(),
        });
    }

    if let Some(content_type) = document.content_type.as_deref() {
        let essence = content_type.split(';').next().unwrap_or(content_type).trim();
        if !essence.eq_ignore_ascii_case(ACCEPTED_CONTENT_TYPE) {
            violations.push(FileViolation::UnsupportedContentType {
                content_type: essence.to_string(),
            });
        }
    }

    if document.size_bytes < rules.min_bytes {
        violations.push(FileViolation::TooSmall {
            actual: document.size_bytes,
            min: rules.min_bytes,
        });
    }
    if document.size_bytes > rules.max_bytes {
        violations.push(FileViolation::TooLarge {
            actual: document.size_bytes,
            max: rules.max_bytes,
        });
    }

    violations
}

/// True for a non-empty list of non-blank, distinct preferences.
pub fn validate_preferences(preferences: &[String]) -> bool {
    if preferences.is_empty() {
        return false;
    }
    let mut seen = HashSet::with_capacity(preferences.len());
    preferences
        .iter()
        .all(|pref| normalize_preference(pref).is_some_and(|p| seen.insert(p)))
}

/// Trimmed preference, or `None` when blank.
pub fn normalize_preference(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn validate_profile_link(link: &str) -> Result<(), ProfileLinkViolation> {
    let parsed = url::Url::parse(link.trim())
        .map_err(|err| ProfileLinkViolation::Malformed(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(ProfileLinkViolation::UnsupportedScheme(other.to_string())),
    }
    if parsed.host_str().is_none() {
        return Err(ProfileLinkViolation::Malformed("missing host".to_string()));
    }
    Ok(())
}

fn human_size(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} bytes")
    }
}
