//! File logging for the TUI.
//!
//! The terminal belongs to the UI, so log output goes to a file. Failing to
//! open it only disables logging.

use std::fs::{self, File};
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::{LoggingSettings, default_log_path, parse_level};

/// Install the global logger. Returns the file being written, if any.
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let level = parse_level(&settings.level).unwrap_or(LevelFilter::Info);
    if level == LevelFilter::Off {
        return None;
    }

    let path = settings.file.clone().or_else(default_log_path)?;
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("wavedeck: cannot create log directory {}: {e}", parent.display());
            return None;
        }
    }

    let file = match File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("wavedeck: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let config = ConfigBuilder::new()
        .add_filter_ignore_str("symphonia")
        .add_filter_ignore_str("lofty")
        .build();

    match WriteLogger::init(level, config, file) {
        Ok(()) => Some(path),
        Err(e) => {
            eprintln!("wavedeck: logger already installed: {e}");
            None
        }
    }
}
