use serde_json::{json, Value};

use crate::NormalizedResult;

/// Downloadable snapshot of a finished analysis. Pure; absent sections
/// export as `null`.
pub fn build_export(raw: &Value, normalized: &NormalizedResult, exported_at: &str) -> Value {
    let section = |key: &str| raw.get(key).cloned().unwrap_or(Value::Null);
    let stats = &normalized.stats;
    json!({
        "analysis_id": section("analysis_id"),
        "profile": section("profile"),
        "recommendations": section("recommendations"),
        "gaps": section("gaps"),
        "stats": {
            "readiness_score": stats.readiness_score,
            "match_count": stats.match_count,
            "gap_count": stats.gap_count,
            "skill_count": stats.skill_count,
        },
        "processing_timestamp": section("processing_timestamp"),
        "exported_at": exported_at,
    })
}
