//! Tracing setup. The TUI owns the terminal, so events go to a log file.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::profiles::config_dir;

pub fn log_path() -> PathBuf {
    std::env::var_os("FLEETTOP_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("fleettop.log"))
}

fn open_log(path: &PathBuf) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. Level comes from `FLEETTOP_LOG`
/// (`EnvFilter` syntax, default `info`). Returns the log file path, or `None`
/// when the file could not be opened and logging stays off.
pub fn init() -> Option<PathBuf> {
    let path = log_path();
    let file = match open_log(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("fleettop: logging disabled ({}: {e})", path.display());
            return None;
        }
    };
    let filter = EnvFilter::try_from_env("FLEETTOP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok();
    installed.then_some(path)
}
