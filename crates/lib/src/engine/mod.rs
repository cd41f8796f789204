//! The task engine seam.
//!
//! Extension tasks describe their work by declaring tasks, files and rules on
//! a [`TaskEngine`]. Scheduling, staleness checks and parallelism belong to
//! the engine. [`Graph`] is a recording engine that can order the declared
//! nodes and run their actions once each.

pub mod cleanup;
pub mod dag;
pub mod graph;

use thiserror::Error;

use crate::action::Action;
use crate::execute::ExecuteError;
use crate::rule::Rule;

pub use cleanup::{CleanError, remove_matching};
pub use dag::StepDag;
pub use graph::{Graph, Node, NodeKind, Step};

/// What a task description needs from the engine that will run it.
pub trait TaskEngine {
  /// Declare a named task that completes once its prerequisites are built.
  fn define_task(&mut self, name: &str, prerequisites: &[String]);

  /// Declare a file produced by `action` from `prerequisites`.
  ///
  /// Declaring the same file again adds prerequisites; an action is only
  /// attached if the file did not have one yet.
  fn define_file(&mut self, path: &str, prerequisites: &[String], action: Option<Action>);

  /// Register a suffix rule for files nobody declared explicitly.
  fn define_rule(&mut self, rule: &Rule);

  /// Add patterns removed by `clean`.
  fn clean(&mut self, patterns: &[String]);

  /// Add patterns removed by `clobber` (in addition to the clean list).
  fn clobber(&mut self, patterns: &[String]);

  /// Whether a task or file with this name has been declared.
  fn is_declared(&self, name: &str) -> bool;
}

/// Errors from planning or running a graph.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error("dependency cycle detected at {0}")]
  CycleDetected(String),

  #[error("don't know how to build {0}")]
  UnknownTarget(String),

  #[error("don't know how to build {artifact}, needed by {needed_by}")]
  MissingPrerequisite { artifact: String, needed_by: String },

  #[error("{step}: {source}")]
  Execute {
    step: String,
    #[source]
    source: ExecuteError,
  },
}
