//! Error and result types for running actions.

use thiserror::Error;

use crate::placeholder::PlaceholderError;

/// Errors that can occur while an action runs.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// A placeholder in the command template could not be resolved.
  #[error("placeholder error: {0}")]
  Placeholder(#[from] PlaceholderError),

  /// A synthesized command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  ExternalCommandFailed {
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The wrapper generator is missing or older than required.
  #[error("{tool} version {required} or later is required (have {})", found.as_deref().unwrap_or("none"))]
  UnsupportedToolVersion {
    tool: String,
    required: String,
    found: Option<String>,
  },

  /// I/O error while spawning a command or cleaning up after one.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Result of running a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
  /// The command line that was run, placeholders substituted.
  pub command: String,

  /// Trimmed stdout of the command.
  pub output: String,
}
