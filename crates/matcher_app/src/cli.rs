use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Analyze a résumé against internship domains.
#[derive(Debug, Parser)]
#[command(name = "matcher", version)]
pub struct Cli {
    /// Résumé to analyze (PDF, 1 KB to 5 MB).
    pub resume: Option<PathBuf>,

    /// Configuration file; a missing file means defaults.
    #[arg(long, default_value = "matcher.ron")]
    pub config: PathBuf,

    /// Backend base URL, e.g. http://localhost:8000/api.
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    /// Internship domain; repeat to select several. Replaces the configured defaults.
    #[arg(long = "pref", value_name = "DOMAIN")]
    pub preferences: Vec<String>,

    /// GitHub or portfolio link sent with the résumé.
    #[arg(long)]
    pub profile_link: Option<String>,

    /// Write the finished analysis to the output directory.
    #[arg(long)]
    pub export: bool,

    /// Retry a failed analysis up to this many times.
    #[arg(long, default_value_t = 0)]
    pub max_retries: u32,

    /// Show the backend's recent activity feed.
    #[arg(long)]
    pub recent: bool,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
