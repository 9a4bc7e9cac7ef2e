//! Results persistence: load/save with atomic writes

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::document::{RESULTS_VERSION, ResultsDocument};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `document` to `path` atomically (temp file + rename)
pub fn save_results(path: &Path, document: &ResultsDocument) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(document).context("Failed to serialize results")?;
    let temp = temp_path(path);
    fs::write(&temp, json)
        .with_context(|| format!("Failed to write temp file {}", temp.display()))?;
    fs::rename(&temp, path)
        .with_context(|| format!("Failed to move results into {}", path.display()))?;

    debug!(path = %path.display(), sources = document.sources.len(), "Saved results");
    Ok(())
}

/// Load a results document.
///
/// Returns `None` when the file was written with a different schema version;
/// a missing or malformed file is an error.
pub fn load_results(path: &Path) -> Result<Option<ResultsDocument>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file {}", path.display()))?;

    let version = serde_json::from_str::<serde_json::Value>(&json)
        .with_context(|| format!("Failed to parse results JSON in {}", path.display()))?
        .get("version")
        .and_then(serde_json::Value::as_u64);
    if version != Some(u64::from(RESULTS_VERSION)) {
        warn!(
            path = %path.display(),
            expected = RESULTS_VERSION,
            found = ?version,
            "Results version mismatch"
        );
        return Ok(None);
    }

    let document: ResultsDocument = serde_json::from_str(&json)
        .with_context(|| format!("Failed to decode results in {}", path.display()))?;
    Ok(Some(document))
}
