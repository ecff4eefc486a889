//! Command logic for the `zoneplan` tool, kept free of argument parsing so
//! it can be tested directly.

#[cfg(test)]
#[path = "commands_test.rs"]
mod commands_test;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use zoneplan_canvas::config::{ConfigError, EditorConfig};
use zoneplan_canvas::snapshot::{Snapshot, SnapshotError};
use zoneplan_canvas::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write to stdout: {0}")]
    Stdout(#[source] io::Error),
    #[error("{}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
    #[error("config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("encoding output failed: {0}")]
    Encode(#[from] SnapshotError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{count} integrity issue(s) found")]
    Integrity { count: usize },
}

/// Summary printed by `zoneplan check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub zones: usize,
    pub blocks: usize,
    pub tech_links: usize,
    pub issues: Vec<String>,
}

impl CheckReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable form: one count line, then one line per issue.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("{} zones, {} blocks, {} technical links", self.zones, self.blocks, self.tech_links);
        for issue in &self.issues {
            out.push_str("\n  - ");
            out.push_str(issue);
        }
        out
    }
}

/// Load the editor policy from `path`, or the defaults when absent.
///
/// # Errors
///
/// Returns [`CliError::Read`] or [`CliError::Config`].
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig, CliError> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let raw = read(path)?;
    let config = EditorConfig::from_json(&raw).map_err(|source| CliError::Config { path: path.to_owned(), source })?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Read and parse a snapshot file.
///
/// # Errors
///
/// Returns [`CliError::Read`] or [`CliError::Snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Snapshot, CliError> {
    let raw = read(path)?;
    Snapshot::from_json(&raw).map_err(|source| CliError::Snapshot { path: path.to_owned(), source })
}

#[must_use]
pub fn check(snapshot: &Snapshot) -> CheckReport {
    CheckReport {
        zones: snapshot.zones.len(),
        blocks: snapshot.blocks.len(),
        tech_links: snapshot.tech_links.len(),
        issues: snapshot.issues().iter().map(ToString::to_string).collect(),
    }
}

/// Load `snapshot` into a store, re-fit every zone, and return the result
/// with the number of zones whose rectangle changed.
#[must_use]
pub fn fit(snapshot: Snapshot, config: EditorConfig) -> (Snapshot, usize) {
    let mut store = Store::with_config(config);
    store.replace(snapshot);
    let changed = store.fit_all_zones();
    tracing::info!(zones = store.zones().len(), changed, "zones fitted");
    (store.snapshot(), changed)
}

/// Write `text` to `path`, or to stdout when `path` is `None`.
///
/// # Errors
///
/// Returns [`CliError::Write`] or [`CliError::Stdout`].
pub fn write_output(path: Option<&Path>, text: &str) -> Result<(), CliError> {
    match path {
        Some(path) => {
            fs::write(path, format!("{text}\n")).map_err(|source| CliError::Write { path: path.to_owned(), source })
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}").map_err(CliError::Stdout)
        }
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}
