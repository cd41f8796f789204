//! Implementation of the `extbuild plan` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use extbuild_lib::artifact::FsProbe;
use extbuild_lib::engine::NodeKind;

use super::load_graph;
use crate::output::{OutputFormat, print_info, print_json, symbols};

/// Print the ordered steps for `targets` without running anything.
pub fn cmd_plan(file: &Path, targets: &[String], output: OutputFormat) -> Result<()> {
  let graph = load_graph(file)?;
  let steps = graph.plan(targets, &FsProbe).context("Failed to plan build")?;

  if output.is_json() {
    return print_json(&steps);
  }

  let actions = steps.iter().filter(|step| step.command.is_some()).count();
  print_info(&format!("{} steps, {} to run", steps.len(), actions));
  println!();

  for step in &steps {
    let label = match step.kind {
      NodeKind::Task => "task",
      NodeKind::File => "file",
    };
    println!(
      "{} {} {}",
      symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.cyan()),
      step.name,
      format!("({label})").if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
    if let Some(command) = &step.command {
      println!("    {command}");
    }
  }

  Ok(())
}
