use tracing::debug;

use crate::action::Action;
use crate::engine::TaskEngine;
use crate::rule::Rule;

/// Nodes a task will declare, collected before any of them reach the engine.
#[derive(Debug, Default)]
pub(crate) struct Emission {
  rules: Vec<Rule>,
  files: Vec<(String, Vec<String>, Option<Action>)>,
  tasks: Vec<(String, Vec<String>)>,
  clean: Vec<String>,
  clobber: Vec<String>,
}

impl Emission {
  pub(crate) fn rule(&mut self, rule: Rule) {
    self.rules.push(rule);
  }

  pub(crate) fn file(&mut self, path: String, prerequisites: Vec<String>, action: Option<Action>) {
    self.files.push((path, prerequisites, action));
  }

  pub(crate) fn task(&mut self, name: String, prerequisites: Vec<String>) {
    self.tasks.push((name, prerequisites));
  }

  pub(crate) fn clean(&mut self, path: String) {
    self.clean.push(path);
  }

  pub(crate) fn clobber(&mut self, path: String) {
    self.clobber.push(path);
  }

  pub(crate) fn declares(&self, path: &str) -> bool {
    self.files.iter().any(|(p, _, _)| p == path)
  }

  pub(crate) fn apply(self, engine: &mut dyn TaskEngine) {
    for rule in &self.rules {
      engine.define_rule(rule);
    }
    for (path, prerequisites, action) in self.files {
      debug!(file = %path, prerequisites = ?prerequisites, "emitting file");
      engine.define_file(&path, &prerequisites, action);
    }
    for (name, prerequisites) in self.tasks {
      debug!(task = %name, prerequisites = ?prerequisites, "emitting task");
      engine.define_task(&name, &prerequisites);
    }
    engine.clean(&self.clean);
    engine.clobber(&self.clobber);
  }
}
