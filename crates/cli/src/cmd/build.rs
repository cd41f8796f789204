//! Implementation of the `extbuild build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use extbuild_lib::artifact::FsProbe;
use extbuild_lib::execute::{CommandRunner, ExecuteError, ShellRunner};

use super::load_graph;
use crate::output::{format_duration, print_success};

/// Echoes each command before handing it to the shell.
struct EchoRunner(ShellRunner);

impl CommandRunner for EchoRunner {
  fn run(&self, cmd: &str) -> Result<String, ExecuteError> {
    println!("{cmd}");
    self.0.run(cmd)
  }
}

pub fn cmd_build(file: &Path, targets: &[String]) -> Result<()> {
  let start = Instant::now();
  let graph = load_graph(file)?;

  let runner = EchoRunner(ShellRunner::new().context("Failed to start command runner")?);
  let results = graph.run(targets, &runner, &FsProbe).context("Build failed")?;

  print_success(&format!(
    "Ran {} command{} in {}",
    results.len(),
    if results.len() == 1 { "" } else { "s" },
    format_duration(start.elapsed())
  ));

  Ok(())
}
