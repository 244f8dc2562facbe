use crate::constants::WRITE_PROBE_PREFIX;
use crate::error::{Result, SqueezeError};
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Validated pair of roots the run mirrors between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoots {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl ResolvedRoots {
    /// The destination root when it lives inside the source tree.
    pub fn nested_destination(&self) -> Option<PathBuf> {
        self.destination
            .starts_with(&self.source)
            .then(|| self.destination.clone())
    }
}

/// Strips enclosing quotes and trailing separators from a raw CLI path.
///
/// Shells on Windows leave a stray `"` behind when a quoted path ends in a
/// backslash, e.g. `"C:\Photos\"` arrives as `C:\Photos"`.
pub fn clean_raw_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');

    let is_separator = |c: char| c == '/' || c == MAIN_SEPARATOR;
    let without_trailing = trimmed.trim_end_matches(is_separator);

    if without_trailing.is_empty() && !trimmed.is_empty() {
        // the filesystem root itself
        PathBuf::from(&trimmed[..1])
    } else {
        PathBuf::from(without_trailing)
    }
}

/// Resolves and validates source and destination roots.
///
/// The source must be an existing readable directory. The destination is
/// created when missing and must accept new files. Identical roots are
/// rejected before anything is created.
pub fn resolve_roots(raw_source: &str, raw_destination: &str) -> Result<ResolvedRoots> {
    let source = clean_raw_path(raw_source);
    let destination = clean_raw_path(raw_destination);

    let source = source.canonicalize().map_err(|_| SqueezeError::InaccessiblePath {
        path: source.clone(),
        access: "readable",
    })?;
    let destination = absolute_destination(&destination)?;

    if source == destination {
        return Err(SqueezeError::SamePath(source));
    }

    validate_source_root(&source)?;
    let destination = prepare_destination_root(&destination)?;

    Ok(ResolvedRoots {
        source,
        destination,
    })
}

fn absolute_destination(destination: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = destination.canonicalize() {
        return Ok(canonical);
    }

    std::path::absolute(destination).map_err(|_| SqueezeError::InaccessiblePath {
        path: destination.to_path_buf(),
        access: "writable",
    })
}

fn validate_source_root(source: &Path) -> Result<()> {
    let inaccessible = || SqueezeError::InaccessiblePath {
        path: source.to_path_buf(),
        access: "readable",
    };

    if !source.is_dir() {
        return Err(inaccessible());
    }
    fs::read_dir(source).map_err(|_| inaccessible())?;
    Ok(())
}

/// Creates the destination root if needed and proves it is writable.
fn prepare_destination_root(destination: &Path) -> Result<PathBuf> {
    let inaccessible = || SqueezeError::InaccessiblePath {
        path: destination.to_path_buf(),
        access: "writable",
    };

    fs::create_dir_all(destination).map_err(|_| inaccessible())?;
    let canonical = destination.canonicalize().map_err(|_| inaccessible())?;

    tempfile::Builder::new()
        .prefix(WRITE_PROBE_PREFIX)
        .tempfile_in(&canonical)
        .map_err(|_| inaccessible())?;

    Ok(canonical)
}
