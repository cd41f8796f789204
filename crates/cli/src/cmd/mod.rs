mod build;
mod clean;
mod env;
mod plan;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use env::cmd_env;
pub use plan::cmd_plan;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use extbuild_lib::artifact::FsProbe;
use extbuild_lib::engine::Graph;
use extbuild_lib::manifest::BuildFile;

/// Load the build file and define its tasks into a fresh graph.
///
/// Paths in the build file are relative to the file's directory, so the
/// process moves there first.
pub(crate) fn load_graph(file: &Path) -> Result<Graph> {
  let manifest = BuildFile::load(file).with_context(|| format!("Failed to load build file {}", file.display()))?;

  if let Some(dir) = file.parent()
    && !dir.as_os_str().is_empty()
  {
    std::env::set_current_dir(dir).with_context(|| format!("Failed to enter {}", dir.display()))?;
  }

  let mut graph = Graph::new();
  let names = manifest
    .define_all(&mut graph, &FsProbe)
    .context("Failed to define tasks")?;
  debug!(tasks = ?names, "defined tasks");

  Ok(graph)
}
