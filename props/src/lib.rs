//! Parse properties-format (`key=value`) text and load it from disk.
//!
//! This is the format of Spindle's installation configuration file: one
//! implementation name per factory id. Kept as its own crate so parsing has a
//! single home and no dependency on the resolution machinery.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Minimal properties parser: lines as `KEY=VALUE` or `KEY: VALUE`, skip empty
/// lines and `#`/`!` comments, trim key and value.
///
/// * Separator: first `=` or `:` on the line; lines without one are skipped.
/// * Empty value: `KEY=` yields the key with value `""`.
/// * Comments: only lines starting with `#` or `!` (after trim) are skipped;
///   a `#` inside a value is kept.
/// * Values are taken literally: no quoting, escapes, or line continuation.
pub fn parse(content: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(idx) = line.find(['=', ':']) else {
            continue;
        };
        let key = line[..idx].trim().to_string();
        let value = line[idx + 1..].trim().to_string();
        if !key.is_empty() {
            out.insert(key, value);
        }
    }
    out
}

/// Read and parse a properties file. Missing file returns an empty map;
/// any other read failure is a [`LoadError::Read`].
pub fn load(path: &Path) -> Result<HashMap<String, String>, LoadError> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&content))
}
