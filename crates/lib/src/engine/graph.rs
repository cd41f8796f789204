//! A recording task engine.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::action::{self, Action, StepResolver};
use crate::artifact::FileProbe;
use crate::execute::{ActionResult, CommandRunner};
use crate::rule::{Rule, RuleSet};

use super::{GraphError, StepDag, TaskEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
  Task,
  File,
}

/// A declared task or file.
#[derive(Debug, Clone)]
pub struct Node {
  pub name: String,
  pub kind: NodeKind,
  pub prerequisites: Vec<String>,
  pub action: Option<Action>,
}

/// One entry of a plan, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
  pub name: String,
  pub kind: NodeKind,
  pub prerequisites: Vec<String>,
  /// The command that produces this artifact, placeholders substituted.
  pub command: Option<String>,
  /// Steps on the same level do not depend on each other.
  pub level: usize,
  #[serde(skip)]
  pub action: Option<Action>,
}

/// Records declarations and replays them in dependency order.
///
/// No staleness checks: every action in a plan fires when the plan runs.
#[derive(Debug, Default)]
pub struct Graph {
  nodes: Vec<Node>,
  index: HashMap<String, usize>,
  tasks: Vec<String>,
  rules: RuleSet,
  clean: Vec<String>,
  clobber: Vec<String>,
}

impl Graph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn node(&self, name: &str) -> Option<&Node> {
    self.index.get(name).map(|&i| &self.nodes[i])
  }

  /// Declared nodes in declaration order.
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  /// Names declared as tasks, in declaration order.
  ///
  /// Includes a task that shares its name with a file node; that node keeps
  /// the file's kind and action.
  pub fn task_names(&self) -> Vec<String> {
    self.tasks.clone()
  }

  pub fn rules(&self) -> &RuleSet {
    &self.rules
  }

  pub fn clean_list(&self) -> &[String] {
    &self.clean
  }

  pub fn clobber_list(&self) -> &[String] {
    &self.clobber
  }

  fn upsert(&mut self, name: &str, kind: NodeKind, prerequisites: &[String], action: Option<Action>) {
    if let Some(&i) = self.index.get(name) {
      let node = &mut self.nodes[i];
      for prereq in prerequisites {
        if !node.prerequisites.contains(prereq) {
          node.prerequisites.push(prereq.clone());
        }
      }
      if node.action.is_none() {
        node.action = action;
      } else if action.is_some() {
        debug!(node = %name, "node already has an action; keeping the first");
      }
      return;
    }

    debug!(node = %name, kind = ?kind, prerequisites = ?prerequisites, "declared node");
    let mut unique: Vec<String> = Vec::with_capacity(prerequisites.len());
    for prereq in prerequisites {
      if !unique.contains(prereq) {
        unique.push(prereq.clone());
      }
    }
    self.index.insert(name.to_string(), self.nodes.len());
    self.nodes.push(Node {
      name: name.to_string(),
      kind,
      prerequisites: unique,
      action,
    });
  }

  /// The steps needed to build `targets` (every declared task if empty), in
  /// an order where prerequisites come first.
  ///
  /// Prerequisites that were never declared must exist according to `files`
  /// or be producible through a registered rule.
  pub fn plan(&self, targets: &[String], files: &dyn FileProbe) -> Result<Vec<Step>, GraphError> {
    let targets = if targets.is_empty() { self.task_names() } else { targets.to_vec() };

    let available = |path: &str| self.index.contains_key(path) || files.exists(path);
    let mut derived: HashMap<String, Node> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();
    let mut dag = StepDag::new();

    for target in &targets {
      if self.index.contains_key(target) {
        stack.push(target.clone());
      } else if files.exists(target) {
        continue;
      } else if let Some(chain) = self.rules.resolve(target, &available) {
        add_derivations(&mut derived, chain);
        stack.push(target.clone());
      } else {
        return Err(GraphError::UnknownTarget(target.clone()));
      }
    }

    while let Some(name) = stack.pop() {
      if !visited.insert(name.clone()) {
        continue;
      }
      dag.add_node(&name);

      let prerequisites = match self.node(&name).or_else(|| derived.get(&name)) {
        Some(node) => node.prerequisites.clone(),
        None => continue,
      };

      for prereq in prerequisites {
        if self.index.contains_key(&prereq) || derived.contains_key(&prereq) {
          dag.add_dependency(&prereq, &name);
          stack.push(prereq);
        } else if files.exists(&prereq) {
          continue;
        } else if let Some(chain) = self.rules.resolve(&prereq, &available) {
          add_derivations(&mut derived, chain);
          dag.add_dependency(&prereq, &name);
          stack.push(prereq);
        } else {
          return Err(GraphError::MissingPrerequisite {
            artifact: prereq,
            needed_by: name,
          });
        }
      }
    }

    let levels = dag.levels()?;
    let order = dag.topological_order()?;

    let mut steps = Vec::with_capacity(order.len());
    for name in order {
      let Some(node) = self.node(&name).or_else(|| derived.get(&name)) else {
        continue;
      };
      let command = match &node.action {
        Some(action) => {
          let resolver = StepResolver::new(&node.name, &node.prerequisites);
          Some(
            action::render(action, &resolver).map_err(|e| GraphError::Execute {
              step: node.name.clone(),
              source: e.into(),
            })?,
          )
        }
        None => None,
      };
      steps.push(Step {
        level: levels.get(&name).copied().unwrap_or_default(),
        name: node.name.clone(),
        kind: node.kind,
        prerequisites: node.prerequisites.clone(),
        command,
        action: node.action.clone(),
      });
    }

    debug!(targets = ?targets, steps = steps.len(), "planned");
    Ok(steps)
  }

  /// Plan `targets` and run every action in order, stopping at the first
  /// failure.
  pub fn run(
    &self,
    targets: &[String],
    runner: &dyn CommandRunner,
    files: &dyn FileProbe,
  ) -> Result<Vec<ActionResult>, GraphError> {
    let steps = self.plan(targets, files)?;
    let mut results = Vec::new();

    for step in &steps {
      let Some(action) = &step.action else {
        continue;
      };
      info!(step = %step.name, "building");
      let resolver = StepResolver::new(&step.name, &step.prerequisites);
      let result = action::execute_action(action, &resolver, runner).map_err(|source| GraphError::Execute {
        step: step.name.clone(),
        source,
      })?;
      results.push(result);
    }

    info!(actions = results.len(), "build complete");
    Ok(results)
  }
}

fn add_derivations(derived: &mut HashMap<String, Node>, chain: Vec<crate::rule::Derivation>) {
  for step in chain {
    derived.entry(step.output.clone()).or_insert_with(|| Node {
      name: step.output,
      kind: NodeKind::File,
      prerequisites: vec![step.source],
      action: Some(step.action),
    });
  }
}

impl TaskEngine for Graph {
  fn define_task(&mut self, name: &str, prerequisites: &[String]) {
    if !self.tasks.iter().any(|t| t == name) {
      self.tasks.push(name.to_string());
    }
    self.upsert(name, NodeKind::Task, prerequisites, None);
  }

  fn define_file(&mut self, path: &str, prerequisites: &[String], action: Option<Action>) {
    self.upsert(path, NodeKind::File, prerequisites, action);
  }

  fn define_rule(&mut self, rule: &Rule) {
    self.rules.register(rule.clone());
  }

  fn clean(&mut self, patterns: &[String]) {
    for pattern in patterns {
      if !self.clean.contains(pattern) {
        self.clean.push(pattern.clone());
      }
    }
  }

  fn clobber(&mut self, patterns: &[String]) {
    for pattern in patterns {
      if !self.clobber.contains(pattern) {
        self.clobber.push(pattern.clone());
      }
    }
  }

  fn is_declared(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }
}
