//! Shell command execution.

use tokio::process::Command;
use tracing::{debug, info};

use super::types::ExecuteError;

/// Run `cmd` through a shell in the current working directory.
///
/// The environment is inherited: compilers and linkers need the caller's
/// `PATH` and toolchain variables.
///
/// # Returns
///
/// The stdout of the command on success (trimmed).
pub async fn execute_cmd(cmd: &str) -> Result<String, ExecuteError> {
  info!(cmd = %cmd, "executing command");

  let (shell_cmd, shell_args) = get_shell();

  debug!(shell = %shell_cmd, "spawning process");

  let output = Command::new(&shell_cmd).args(&shell_args).arg(cmd).output().await?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ExecuteError::ExternalCommandFailed {
      cmd: cmd.to_string(),
      code: output.status.code(),
      stderr,
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// Get the shell command and arguments for the current platform:
/// `/bin/sh -c` on Unix and `cmd.exe /C` on Windows.
fn get_shell() -> (String, Vec<String>) {
  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}
