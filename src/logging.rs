//! Tracing setup. The dashboard owns stdout, so log lines go to a file.
//!
//! `RUST_LOG` replaces the default `statusdash=info` filter when set; set
//! `LOG_FORMAT=json` for one JSON object per line.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::cache_dir)
        .map(|d| d.join("statusdash").join("statusdash.log"))
        .unwrap_or_else(|| PathBuf::from("statusdash.log"))
}

const DEFAULT_FILTER: &str = "statusdash=info";

fn build_filter(rust_log: Option<String>) -> EnvFilter {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn use_json() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

pub fn init_tracing(log_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let filter = build_filter(std::env::var("RUST_LOG").ok());
    let registry = tracing_subscriber::registry().with(filter);

    if use_json() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file)),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_path_file_name() {
        assert_eq!(
            default_log_path().file_name().and_then(|n| n.to_str()),
            Some("statusdash.log")
        );
    }

    #[test]
    fn test_rust_log_level_for_crate_is_kept() {
        let filter = build_filter(Some("statusdash=debug".to_string()));
        assert_eq!(filter.to_string(), "statusdash=debug");
    }

    #[test]
    fn test_default_filter_without_rust_log() {
        assert_eq!(build_filter(None).to_string(), DEFAULT_FILTER);
        assert_eq!(build_filter(Some("  ".to_string())).to_string(), DEFAULT_FILTER);
    }

    // The global subscriber can be installed once per process, so this is
    // the only test that calls init_tracing.
    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("statusdash.log");
        init_tracing(&path).unwrap();
        tracing::info!("hello from the test");
        assert!(path.exists());
    }
}
