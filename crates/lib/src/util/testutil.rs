//! Test utilities for extbuild-lib.
//!
//! Doubles for [`CommandRunner`] and [`ToolProbe`] so tests can exercise
//! actions and version gates without a toolchain installed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::execute::{CommandRunner, ExecuteError};
use crate::tool::ToolProbe;

/// Records every command it is asked to run and succeeds with empty output,
/// unless the command contains the configured failure marker.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  commands: Mutex<Vec<String>>,
  fail_on: Option<String>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fail any command containing `marker` with exit code 1.
  pub fn failing_on(marker: &str) -> Self {
    Self {
      commands: Mutex::new(Vec::new()),
      fail_on: Some(marker.to_string()),
    }
  }

  pub fn commands(&self) -> Vec<String> {
    self.commands.lock().unwrap().clone()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, cmd: &str) -> Result<String, ExecuteError> {
    self.commands.lock().unwrap().push(cmd.to_string());
    match &self.fail_on {
      Some(marker) if cmd.contains(marker.as_str()) => Err(ExecuteError::ExternalCommandFailed {
        cmd: cmd.to_string(),
        code: Some(1),
        stderr: String::new(),
      }),
      _ => Ok(String::new()),
    }
  }
}

/// Returns a fixed banner and counts how often it was asked.
#[derive(Debug)]
pub struct StaticProbe {
  banner: Option<String>,
  calls: Arc<AtomicUsize>,
}

impl StaticProbe {
  pub fn new(banner: Option<&str>) -> Self {
    Self {
      banner: banner.map(str::to_string),
      calls: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// Shared call counter; stays valid after the probe is moved into a gate.
  pub fn calls(&self) -> Arc<AtomicUsize> {
    Arc::clone(&self.calls)
  }
}

impl ToolProbe for StaticProbe {
  fn probe(&self, _tool: &str) -> Option<String> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.banner.clone()
  }
}
