//! File-based tracing setup
//!
//! The terminal belongs to the TUI, so log output goes to a file instead of
//! stderr.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

pub fn default_log_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;

    Ok(data_dir.join("shopping-chat").join("shopping-chat.log"))
}

/// Filter directive: `RUST_LOG` wins, then `--verbose`, then the configured level
pub fn filter_directive(env: Option<String>, verbose: bool, configured: Option<&str>) -> String {
    if let Some(env) = env.filter(|e| !e.trim().is_empty()) {
        return env;
    }
    let level = if verbose {
        "debug"
    } else {
        configured.unwrap_or("info")
    };
    format!("shopping_chat={}", level)
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(file)
}

pub fn init(path: &Path, directive: &str) -> Result<()> {
    let file = open_log_file(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(directive)?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rust_log_takes_precedence() {
        let directive = filter_directive(Some("warn".to_string()), true, Some("trace"));
        assert_eq!(directive, "warn");
    }

    #[test]
    fn test_verbose_beats_config() {
        assert_eq!(filter_directive(None, true, Some("warn")), "shopping_chat=debug");
        assert_eq!(filter_directive(Some("  ".to_string()), false, Some("warn")), "shopping_chat=warn");
        assert_eq!(filter_directive(None, false, None), "shopping_chat=info");
    }

    #[test]
    fn test_log_file_parent_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("chat.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
