//! Log setup.
//!
//! The terminal belongs to the dashboard, so logs go to a file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::{WrapErr, eyre};
use directories::ProjectDirs;
use tracing::Level;

/// Environment variable holding the log level.
const LEVEL_ENV: &str = "GLYPHDECK_LOG";

/// Default log file location.
pub fn default_log_path() -> PathBuf {
    ProjectDirs::from("", "", "glyphdeck")
        .map(|dirs| dirs.data_local_dir().join("glyphdeck.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("glyphdeck.log"))
}

/// Parse a level name, falling back to `info`.
fn parse_level(value: Option<&str>) -> Level {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(Level::INFO)
}

/// Install the global subscriber writing to `path` (or the default path).
///
/// Returns the path in use.
pub fn init(path: Option<&Path>) -> color_eyre::Result<PathBuf> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("opening log file {}", path.display()))?;

    let level = parse_level(std::env::var(LEVEL_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| eyre!("installing log subscriber: {e}"))?;
    Ok(path)
}
