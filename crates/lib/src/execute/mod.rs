//! Running synthesized commands.
//!
//! Actions do not spawn processes themselves; they hand a finished command
//! line to a [`CommandRunner`]. [`ShellRunner`] runs it through the platform
//! shell. Tests substitute a runner that only records what it was given.

pub mod cmd;
pub mod types;

use tokio::runtime::{Builder, Runtime};

pub use cmd::execute_cmd;
pub use types::{ActionResult, ExecuteError};

/// Something that can run a command line.
pub trait CommandRunner {
  /// Run `cmd`, returning its trimmed stdout.
  fn run(&self, cmd: &str) -> Result<String, ExecuteError>;
}

/// Runs commands through `/bin/sh -c` (or `cmd.exe /C`), one at a time.
pub struct ShellRunner {
  runtime: Runtime,
}

impl ShellRunner {
  pub fn new() -> Result<Self, ExecuteError> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(Self { runtime })
  }
}

impl CommandRunner for ShellRunner {
  fn run(&self, cmd: &str) -> Result<String, ExecuteError> {
    self.runtime.block_on(execute_cmd(cmd))
  }
}

impl std::fmt::Debug for ShellRunner {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ShellRunner").finish_non_exhaustive()
  }
}
