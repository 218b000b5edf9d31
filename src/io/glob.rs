//! Glob expansion for multi-file text inputs.
//!
//! ```no_run
//! use ironframe::io::glob::expand_glob;
//!
//! // Every daily export under a hive-style tree
//! let files = expand_glob("exports/year=2024/month=*/*.csv")?;
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```

use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::PathBuf;

/// Expand `pattern` into the matching regular files, sorted.
///
/// Supports `*`, `?`, `**` and `[..]` / `[!..]` classes. Zero matches is an
/// empty vector, not an error.
///
/// # Errors
/// Returns an error for an invalid pattern or an unreadable directory.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// Like [`expand_glob`], but zero matches is an error.
///
/// # Errors
/// See [`expand_glob`]; also fails when nothing matches.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    Ok(files)
}

/// Whether `s` contains glob metacharacters.
#[must_use]
pub fn is_glob_pattern(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// A single path as-is, or the sorted expansion of a pattern.
///
/// # Errors
/// See [`expand_glob_required`].
pub fn resolve_paths(path_or_glob: &str) -> Result<Vec<PathBuf>> {
    if is_glob_pattern(path_or_glob) {
        expand_glob_required(path_or_glob)
    } else {
        Ok(vec![PathBuf::from(path_or_glob)])
    }
}
