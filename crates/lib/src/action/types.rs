use std::fmt;
use std::sync::Arc;

use crate::tool::VersionGate;

/// A command line with unresolved placeholders.
///
/// Produced by synthesizing a [`crate::command::CommandSpec`] against a
/// task's environment when a rule is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandTemplate(pub String);

impl CommandTemplate {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CommandTemplate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<String> for CommandTemplate {
  fn from(value: String) -> Self {
    Self(value)
  }
}

impl From<&str> for CommandTemplate {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

/// What the engine runs to produce a file.
#[derive(Debug, Clone)]
pub enum Action {
  /// Run a command through the shell.
  Exec(CommandTemplate),

  /// Check a tool's version, then run the inner action.
  ///
  /// The check happens when the action fires, so declaring a task never
  /// requires the tool to be installed.
  Gated {
    gate: Arc<VersionGate>,
    tool: String,
    action: Box<Action>,
  },
}

impl Action {
  pub fn exec(template: impl Into<CommandTemplate>) -> Self {
    Action::Exec(template.into())
  }

  /// Wrap `self` so it only runs once `tool` passes `gate`.
  pub fn gated(self, gate: Arc<VersionGate>, tool: impl Into<String>) -> Self {
    Action::Gated {
      gate,
      tool: tool.into(),
      action: Box::new(self),
    }
  }

  /// The command template this action eventually runs.
  pub fn template(&self) -> &CommandTemplate {
    match self {
      Action::Exec(template) => template,
      Action::Gated { action, .. } => action.template(),
    }
  }
}
