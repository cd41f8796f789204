//! Implementation of the `extbuild clean` and `extbuild clobber` commands.

use std::path::Path;

use anyhow::{Context, Result};

use extbuild_lib::engine::remove_matching;

use super::load_graph;
use crate::output::{print_info, print_success};

/// Remove the files on the clean list, plus the clobber list if `clobber`.
pub fn cmd_clean(file: &Path, clobber: bool) -> Result<()> {
  let graph = load_graph(file)?;

  let mut patterns = graph.clean_list().to_vec();
  if clobber {
    patterns.extend_from_slice(graph.clobber_list());
  }

  let removed = remove_matching(&patterns).context("Failed to remove build outputs")?;

  if removed.is_empty() {
    print_info("Nothing to remove");
    return Ok(());
  }

  for path in &removed {
    println!("  {}", path.display());
  }
  print_success(&format!("Removed {} file(s)", removed.len()));

  Ok(())
}
