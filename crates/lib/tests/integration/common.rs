//! Shared helpers for library integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use extbuild_lib::Environment;
use extbuild_lib::execute::{CommandRunner, ExecuteError};
use extbuild_lib::platform::os::Os;
use extbuild_lib::settings::SettingKey;
use extbuild_lib::settings::defaults::build_defaults;
use extbuild_lib::tool::{ToolProbe, VersionGate};

/// Linux-style defaults with `gcc`, independent of the host and its
/// environment variables.
pub fn gcc_env() -> Environment {
  let mut env = build_defaults(Some(Os::Linux), |_| None);
  env.set(SettingKey::Cc, "gcc");
  env
}

pub fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// Records commands instead of running them.
#[derive(Default)]
pub struct Recorder {
  commands: Mutex<Vec<String>>,
}

impl Recorder {
  pub fn commands(&self) -> Vec<String> {
    self.commands.lock().unwrap().clone()
  }
}

impl CommandRunner for Recorder {
  fn run(&self, cmd: &str) -> Result<String, ExecuteError> {
    self.commands.lock().unwrap().push(cmd.to_string());
    Ok(String::new())
  }
}

/// A generator that reports a fixed banner.
pub struct FakeSwig {
  banner: String,
  calls: Arc<AtomicUsize>,
}

impl ToolProbe for FakeSwig {
  fn probe(&self, _tool: &str) -> Option<String> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Some(self.banner.clone())
  }
}

/// A gate backed by [`FakeSwig`], plus its probe counter.
pub fn fake_gate(version: &str) -> (Arc<VersionGate>, Arc<AtomicUsize>) {
  let calls = Arc::new(AtomicUsize::new(0));
  let probe = FakeSwig {
    banner: format!("\nSWIG Version {version}\n\nCompiled with g++ [x86_64-pc-linux-gnu]\n"),
    calls: Arc::clone(&calls),
  };
  (Arc::new(VersionGate::new("1.3", probe)), calls)
}
