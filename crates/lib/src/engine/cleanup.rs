//! Removing the files on the clean and clobber lists.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CleanError {
  #[error("invalid pattern {pattern}: {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("failed to remove {path}: {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Delete every file matching one of `patterns`.
///
/// Patterns are globs relative to the working directory; a plain path matches
/// itself. Directories are left alone. Returns the removed paths.
pub fn remove_matching(patterns: &[String]) -> Result<Vec<PathBuf>, CleanError> {
  let mut removed = Vec::new();

  for pattern in patterns {
    let paths = glob::glob(pattern).map_err(|source| CleanError::Pattern {
      pattern: pattern.clone(),
      source,
    })?;

    for entry in paths {
      let path = match entry {
        Ok(path) => path,
        Err(e) => {
          warn!(pattern = %pattern, error = %e, "skipping unreadable path");
          continue;
        }
      };
      if !path.is_file() || removed.contains(&path) {
        continue;
      }
      std::fs::remove_file(&path).map_err(|source| CleanError::Remove {
        path: path.clone(),
        source,
      })?;
      debug!(path = %path.display(), "removed");
      removed.push(path);
    }
  }

  Ok(removed)
}
