use std::path::Path;

use sha2::{Digest, Sha256};

const MAX_STEM_CHARS: usize = 60;

/// `{stem}--{hash8}.json`: readable, filesystem-safe and stable per analysis.
pub fn export_filename(document_name: &str, analysis_id: Option<&str>) -> String {
    let stem = Path::new(document_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let hash_input = analysis_id.unwrap_or(document_name);
    format!("{}--{}.json", sanitize_stem(stem), short_hash(hash_input))
}

fn sanitize_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    for ch in stem.chars() {
        let mapped = if ch.is_alphanumeric() || ch == '-' { ch } else { '_' };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }
    let trimmed: String = out
        .trim_matches('_')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    if trimmed.is_empty() {
        "analysis".to_string()
    } else {
        trimmed
    }
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}
