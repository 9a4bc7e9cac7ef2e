use std::borrow::Cow;
use std::env;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

// Maximum transcript size: 64MB
const MAX_FILE_SIZE_BYTES: u64 = 64 * 1024 * 1024;

/// Validates that a file is not too large to load into memory
///
/// Takes an already-open file so the size check and the subsequent read see
/// the same file.
///
/// # Errors
///
/// Returns an error if:
/// - The file metadata cannot be read
/// - The file is larger than 64MB
pub fn validate_file_size(file: &File, path: &Path) -> Result<()> {
    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;

    let file_size = metadata.len();
    if file_size > MAX_FILE_SIZE_BYTES {
        bail!(
            "File too large: {} ({} bytes, max {} bytes)",
            path.display(),
            file_size,
            MAX_FILE_SIZE_BYTES
        );
    }

    Ok(())
}

/// Expands the CLI inputs into transcript files.
///
/// Files are taken as given. Directories are walked recursively for `.txt`
/// exports, sorted by path so repeated runs process files in the same order.
pub fn collect_transcripts(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            bail!("No such file or directory: {}", input.display());
        }

        let mut found: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(input).follow_links(false) {
            let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(OsStr::to_str) == Some("txt")
            {
                found.push(entry.into_path());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Formats a path with ~ substitution for the home directory
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use chat_birthdays::format_path_with_tilde;
///
/// let path = PathBuf::from("/Users/alice/Downloads/chat.txt");
/// // Returns "~/Downloads/chat.txt" if HOME=/Users/alice
/// let formatted = format_path_with_tilde(&path);
/// ```
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, None)
}

/// Internal helper for path formatting with optional home override (for testing)
pub(crate) fn format_path_with_tilde_internal(path: &Path, home_override: Option<&str>) -> String {
    let home_from_env = env::var("HOME").ok();
    let home = home_override.or(home_from_env.as_deref());

    let path_str = path.to_string_lossy();
    if let Some(home) = home
        && path_str.starts_with(home)
    {
        return path_str.replacen(home, "~", 1);
    }

    match path_str {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}
