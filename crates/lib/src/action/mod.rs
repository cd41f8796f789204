//! Actions attached to file nodes.
//!
//! An [`Action`] is a command template, optionally behind a version gate.
//! Placeholders in the template (see [`crate::placeholder`]) are filled from
//! a [`StepResolver`] that knows the file being produced and its
//! prerequisites.

mod types;

pub use types::*;

use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, warn};

use crate::execute::{ActionResult, CommandRunner, ExecuteError};
use crate::placeholder::{self, PlaceholderError, Resolver};

/// Resolves placeholders for one firing of an action.
#[derive(Debug, Clone, Copy)]
pub struct StepResolver<'a> {
  pub output: &'a str,
  pub prerequisites: &'a [String],
}

impl<'a> StepResolver<'a> {
  pub fn new(output: &'a str, prerequisites: &'a [String]) -> Self {
    Self { output, prerequisites }
  }
}

impl Resolver for StepResolver<'_> {
  fn resolve_out(&self) -> Result<&str, PlaceholderError> {
    Ok(self.output)
  }

  fn resolve_input(&self, index: usize) -> Result<&str, PlaceholderError> {
    self
      .prerequisites
      .get(index)
      .map(String::as_str)
      .ok_or(PlaceholderError::UnresolvedInput(index))
  }

  fn resolve_inputs(&self) -> Result<Cow<'_, str>, PlaceholderError> {
    Ok(Cow::Owned(self.prerequisites.join(" ")))
  }
}

/// The command `action` would run, with placeholders substituted.
pub fn render(action: &Action, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  placeholder::substitute(action.template().as_str(), resolver)
}

/// Run an action.
///
/// Gated actions verify their tool first and run nothing if it is too old.
/// When the command fails, a partially written output file is removed so a
/// later run does not mistake it for a finished one.
pub fn execute_action(
  action: &Action,
  resolver: &impl Resolver,
  runner: &dyn CommandRunner,
) -> Result<ActionResult, ExecuteError> {
  match action {
    Action::Gated { gate, tool, action } => {
      let version = gate.verify(tool)?;
      debug!(tool = %tool, version = %version, "version gate passed");
      execute_action(action, resolver, runner)
    }
    Action::Exec(template) => {
      let command = placeholder::substitute(template.as_str(), resolver)?;

      match runner.run(&command) {
        Ok(output) => Ok(ActionResult { command, output }),
        Err(e) => {
          let out = resolver.resolve_out()?;
          if Path::new(out).is_file() {
            warn!(file = %out, "removing output of failed command");
            std::fs::remove_file(out)?;
          }
          Err(e)
        }
      }
    }
  }
}
