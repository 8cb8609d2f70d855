//! Logger setup. File output goes to `./matcher.log` in the working directory.

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogDestination {
    File,
    #[default]
    Terminal,
    Both,
}

pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();
    let terminal = |config: Config| -> Box<dyn SharedLogger> {
        TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
    };

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::Terminal => vec![terminal(config)],
        LogDestination::File => file_logger(level, config).into_iter().collect(),
        LogDestination::Both => {
            let mut loggers = vec![terminal(config.clone())];
            loggers.extend(file_logger(level, config));
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn file_logger(level: LevelFilter, config: Config) -> Option<Box<dyn SharedLogger>> {
    let path = PathBuf::from("./matcher.log");
    match File::create(&path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: could not create log file {}: {}", path.display(), err);
            None
        }
    }
}
