use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use matcher_core::{FileRules, WorkflowConfig};
use matcher_engine::{EngineConfig, UploadSettings};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::logging::LogDestination;

/// Settings read from `matcher.ron`. Every field has a default, so a partial
/// file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub simulator_cadence_ms: u64,
    pub default_preferences: Vec<String>,
    pub output_dir: PathBuf,
    pub log_destination: LogDestination,
    pub max_upload_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 180,
            connect_timeout_secs: 10,
            simulator_cadence_ms: 3000,
            default_preferences: vec!["Web Development".to_string()],
            output_dir: PathBuf::from("./output"),
            log_destination: LogDestination::Terminal,
            max_upload_bytes: FileRules::default().max_bytes,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        ron::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.api_url {
            self.api_base_url = url.clone();
        }
        if !cli.preferences.is_empty() {
            self.default_preferences = cli.preferences.clone();
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            upload: UploadSettings {
                api_base_url: self.api_base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                ..UploadSettings::default()
            },
            simulator_cadence: Duration::from_millis(self.simulator_cadence_ms.max(1)),
            output_dir: self.output_dir.clone(),
        }
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            rules: FileRules {
                max_bytes: self.max_upload_bytes,
                ..FileRules::default()
            },
            default_preferences: self.default_preferences.clone(),
            ..WorkflowConfig::default()
        }
    }
}
