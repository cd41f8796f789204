//! Extension build tasks.
//!
//! An [`ExtensionTask`] describes how one native extension library is built:
//! which objects to compile, what to link them into, and which extra files the
//! library depends on. It moves through a fixed sequence of states:
//!
//! ```text
//! Unconfigured -> DefaultsApplied -> UserConfigured -> GraphEmitted
//! ```
//!
//! Defaults are applied from the task name, the caller's configure callback
//! runs exactly once, and emission declares the resulting file and task nodes
//! on a [`TaskEngine`]. Emitting twice is a no-op.
//!
//! [`SwigExtensionTask`] adds a wrapper-generation step in front of
//! compilation.

mod emission;
pub mod swig;

pub use swig::SwigExtensionTask;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::artifact::{ArtifactClass, ArtifactRef, FileProbe, FsProbe, join_dir};
use crate::engine::TaskEngine;
use crate::rule::{RuleSet, recipes};
use crate::settings::{Environment, SettingsError};

use emission::Emission;

/// Errors raised while defining or emitting a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
  #[error("no task name given")]
  MissingTaskName,

  #[error("no rule to build {artifact}: no matching source file")]
  NoMatchingRule { artifact: String },

  #[error(transparent)]
  Settings(#[from] SettingsError),
}

/// Construction progress of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskState {
  Unconfigured,
  DefaultsApplied,
  UserConfigured,
  GraphEmitted,
}

/// The target of a task: its name and, optionally, the objects to build it
/// from.
///
/// `TaskSpec::from("sample")` names a symbolic target whose library is
/// `sample.<dlext>` built from `sample.<objext>`.
/// `TaskSpec::from("sample").with_objects([ArtifactRef::stem("foo")])`
/// builds `sample.<dlext>` from `foo.<objext>` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
  pub name: ArtifactRef,
  pub objects: Option<Vec<ArtifactRef>>,
}

impl TaskSpec {
  /// A symbolic target.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: ArtifactRef::stem(name),
      objects: None,
    }
  }

  /// A target whose library file name is used verbatim.
  pub fn literal(name: impl Into<String>) -> Self {
    Self {
      name: ArtifactRef::literal(name),
      objects: None,
    }
  }

  pub fn with_objects<I, A>(mut self, objects: I) -> Self
  where
    I: IntoIterator<Item = A>,
    A: Into<ArtifactRef>,
  {
    self.objects = Some(objects.into_iter().map(Into::into).collect());
    self
  }
}

impl From<&str> for TaskSpec {
  fn from(name: &str) -> Self {
    TaskSpec::new(name)
  }
}

impl From<String> for TaskSpec {
  fn from(name: String) -> Self {
    TaskSpec::new(name)
  }
}

/// A native extension library build.
#[derive(Debug, Clone)]
pub struct ExtensionTask {
  /// File name of the library, relative to `dir`.
  pub lib_name: String,
  /// Objects compiled and linked into the library.
  pub objects: Vec<ArtifactRef>,
  /// Files that are not linked but cause a rebuild when they change.
  pub deps: Vec<String>,
  /// Libraries passed to the linker as `-l<name>`.
  pub link_libs: Vec<String>,
  /// Directory holding sources, objects and the library.
  pub dir: String,
  /// This task's own settings.
  pub env: Environment,

  name: String,
  state: TaskState,
  rules: RuleSet,
}

impl ExtensionTask {
  /// Define a task against the process-wide default settings.
  ///
  /// `configure` runs once, after defaults are applied and before anything is
  /// emitted.
  pub fn new(spec: impl Into<TaskSpec>, configure: impl FnOnce(&mut Self)) -> Result<Self, TaskError> {
    Self::with_env(spec, Environment::copy_defaults(), configure)
  }

  /// Define a task starting from `env` instead of the process-wide defaults.
  pub fn with_env(
    spec: impl Into<TaskSpec>,
    env: Environment,
    configure: impl FnOnce(&mut Self),
  ) -> Result<Self, TaskError> {
    let spec = spec.into();
    let default_objects = spec.objects.clone().unwrap_or_else(|| vec![ArtifactRef::stem(spec.name.name())]);
    let mut task = Self::with_defaults(&spec, env, default_objects)?;

    configure(&mut task);
    task.state = TaskState::UserConfigured;

    info!(task = %task.name, lib = %task.lib_name, "defined extension task");
    Ok(task)
  }

  /// Define a task and emit it straight away, resolving sources on disk.
  pub fn define(
    spec: impl Into<TaskSpec>,
    engine: &mut dyn TaskEngine,
    configure: impl FnOnce(&mut Self),
  ) -> Result<Self, TaskError> {
    let mut task = Self::new(spec, configure)?;
    task.emit(engine)?;
    Ok(task)
  }

  pub(crate) fn with_defaults(
    spec: &TaskSpec,
    env: Environment,
    objects: Vec<ArtifactRef>,
  ) -> Result<Self, TaskError> {
    let name = spec.name.name().trim();
    if name.is_empty() {
      return Err(TaskError::MissingTaskName);
    }

    let lib_name = spec.name.resolve(ArtifactClass::SharedLibrary, &env)?;

    Ok(Self {
      lib_name,
      objects,
      deps: Vec::new(),
      link_libs: Vec::new(),
      dir: ".".to_string(),
      env,
      name: name.to_string(),
      state: TaskState::DefaultsApplied,
      rules: RuleSet::new(),
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn state(&self) -> TaskState {
    self.state
  }

  /// Rules this task registered while emitting.
  pub fn rules(&self) -> &RuleSet {
    &self.rules
  }

  /// Paths of the objects linked into the library.
  pub fn output_objects(&self) -> Result<Vec<String>, SettingsError> {
    self
      .objects
      .iter()
      .map(|obj| Ok(join_dir(&self.dir, &obj.resolve(ArtifactClass::Object, &self.env)?)))
      .collect()
  }

  /// Path of the library.
  pub fn output_lib(&self) -> String {
    join_dir(&self.dir, &self.lib_name)
  }

  /// Declare this task's nodes, locating sources on disk.
  pub fn emit(&mut self, engine: &mut dyn TaskEngine) -> Result<(), TaskError> {
    self.emit_with(engine, &FsProbe)
  }

  /// Declare this task's nodes, asking `files` which sources exist.
  ///
  /// Nothing reaches the engine unless every object resolves.
  pub fn emit_with(&mut self, engine: &mut dyn TaskEngine, files: &dyn FileProbe) -> Result<(), TaskError> {
    if self.state == TaskState::GraphEmitted {
      debug!(task = %self.name, "already emitted");
      return Ok(());
    }

    let mut emission = Emission::default();
    self.collect(&*engine, files, &mut emission, &[])?;
    emission.apply(engine);

    self.state = TaskState::GraphEmitted;
    Ok(())
  }

  /// Collect object, library and task nodes. `extra_objects` are linked
  /// after the configured ones.
  pub(crate) fn collect(
    &mut self,
    engine: &dyn TaskEngine,
    files: &dyn FileProbe,
    emission: &mut Emission,
    extra_objects: &[ArtifactRef],
  ) -> Result<(), TaskError> {
    recipes::register_compile_rules(&mut self.rules, &self.env)?;

    let mut objects = Vec::with_capacity(self.objects.len() + extra_objects.len());
    for obj in self.objects.iter().chain(extra_objects) {
      let path = join_dir(&self.dir, &obj.resolve(ArtifactClass::Object, &self.env)?);

      let chain = {
        let available = |p: &str| files.exists(p) || engine.is_declared(p) || emission.declares(p);
        self.rules.resolve(&path, &available)
      };

      match chain {
        Some(chain) => {
          for step in chain {
            if !emission.declares(&step.output) {
              emission.clean(step.output.clone());
              emission.file(step.output, vec![step.source], Some(step.action));
            }
          }
        }
        None if obj.is_stem() => return Err(TaskError::NoMatchingRule { artifact: path }),
        None => {
          warn!(task = %self.name, object = %path, "no rule matches object; expecting it to exist");
        }
      }

      if !objects.contains(&path) {
        objects.push(path);
      }
    }

    let lib = self.output_lib();
    let link_libs = self.link_libs.iter().cloned();
    let deps: Vec<String> = self.deps.iter().map(|d| join_dir(&self.dir, d)).collect();
    emission.clobber(lib.clone());

    if lib == self.name {
      // The task is the library file itself: deps hang off the file node,
      // after the objects, and only the objects are linked.
      let link = Action::exec(recipes::link_first(objects.len(), link_libs).synthesize(&self.env)?);
      let mut prerequisites = objects;
      prerequisites.extend(deps);
      dedup(&mut prerequisites);
      emission.file(lib, prerequisites, Some(link));
      emission.task(self.name.clone(), Vec::new());
    } else {
      let link = Action::exec(recipes::link(link_libs).synthesize(&self.env)?);
      emission.file(lib.clone(), objects, Some(link));
      let mut prerequisites = deps;
      prerequisites.push(lib);
      dedup(&mut prerequisites);
      emission.task(self.name.clone(), prerequisites);
    }

    for rule in self.rules.iter() {
      emission.rule(rule.clone());
    }

    Ok(())
  }
}

fn dedup(paths: &mut Vec<String>) {
  let mut seen = BTreeSet::new();
  paths.retain(|p| seen.insert(p.clone()));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::artifact::KnownFiles;
  use crate::engine::Graph;
  use crate::settings::{Setting, SettingKey, defaults};

  fn linux_env() -> Environment {
    let mut env = defaults::build_defaults(Some(crate::platform::os::Os::Linux), |_| None);
    env.set(SettingKey::Cc, "gcc");
    env
  }

  fn task(name: &str, configure: impl FnOnce(&mut ExtensionTask)) -> ExtensionTask {
    ExtensionTask::with_env(name, linux_env(), configure).unwrap()
  }

  #[test]
  fn defaults_from_a_symbolic_name() {
    let t = task("mylib", |_| {});

    assert_eq!(t.name(), "mylib");
    assert_eq!(t.lib_name, "mylib.so");
    assert_eq!(t.objects, vec![ArtifactRef::stem("mylib")]);
    assert_eq!(t.output_objects().unwrap(), vec!["mylib.o"]);
    assert_eq!(t.output_lib(), "mylib.so");
    assert_eq!(t.dir, ".");
    assert!(t.deps.is_empty());
    assert!(t.link_libs.is_empty());
    assert_eq!(t.state(), TaskState::UserConfigured);
  }

  #[test]
  fn literal_name_is_the_library_file() {
    let t = ExtensionTask::with_env(TaskSpec::literal("libfoo.so.1"), linux_env(), |_| {}).unwrap();
    assert_eq!(t.lib_name, "libfoo.so.1");
  }

  #[test]
  fn literal_name_plans_without_a_self_dependency() {
    let mut graph = Graph::new();
    let mut t = ExtensionTask::with_env(TaskSpec::literal("libfoo.so.1"), linux_env(), |t| {
      t.deps.push("config.h".to_string());
    })
    .unwrap();
    t.emit_with(&mut graph, &KnownFiles::new(["libfoo.so.1.c", "config.h"])).unwrap();

    let lib = graph.node("libfoo.so.1").unwrap();
    assert_eq!(lib.prerequisites, vec!["libfoo.so.1.o", "config.h"]);
    assert!(lib.action.is_some());
    assert_eq!(graph.task_names(), vec!["libfoo.so.1"]);

    let files = KnownFiles::new(["libfoo.so.1.c", "config.h"]);
    let all: Vec<String> = graph.plan(&[], &files).unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(all, vec!["libfoo.so.1.o", "libfoo.so.1"]);

    let named = graph.plan(&["libfoo.so.1".to_string()], &files).unwrap();
    assert_eq!(named.len(), 2);
    assert_eq!(
      named[1].command.as_deref(),
      Some("cc -shared -o libfoo.so.1 libfoo.so.1.o")
    );
  }

  #[test]
  fn explicit_objects_replace_the_default() {
    let spec = TaskSpec::new("sample").with_objects([ArtifactRef::stem("foo"), ArtifactRef::literal("bar.o")]);
    let t = ExtensionTask::with_env(spec, linux_env(), |_| {}).unwrap();

    assert_eq!(t.lib_name, "sample.so");
    assert_eq!(t.output_objects().unwrap(), vec!["foo.o", "bar.o"]);
  }

  #[test]
  fn empty_name_is_rejected() {
    let err = ExtensionTask::with_env("", linux_env(), |_| {}).unwrap_err();
    assert_eq!(err, TaskError::MissingTaskName);
  }

  #[test]
  fn configure_runs_once_before_emission() {
    let mut calls = 0;
    let t = task("mylib", |t| {
      calls += 1;
      t.dir = "ext".to_string();
      t.deps.push("config.h".to_string());
      t.link_libs.push("bar".to_string());
      t.env.set(SettingKey::Cc, "clang");
    });

    assert_eq!(calls, 1);
    assert_eq!(t.output_lib(), join_dir("ext", "mylib.so"));
    assert_eq!(t.env.get_str(&SettingKey::Cc).unwrap(), "clang");
  }

  #[test]
  fn emission_declares_objects_library_and_task() {
    let mut graph = Graph::new();
    let mut t = task("mylib", |_| {});
    t.emit_with(&mut graph, &KnownFiles::new(["mylib.c"])).unwrap();

    let obj = graph.node("mylib.o").unwrap();
    assert_eq!(obj.prerequisites, vec!["mylib.c"]);
    assert!(obj.action.as_ref().unwrap().template().as_str().starts_with("gcc "));

    let lib = graph.node("mylib.so").unwrap();
    assert_eq!(lib.prerequisites, vec!["mylib.o"]);

    assert_eq!(graph.node("mylib").unwrap().prerequisites, vec!["mylib.so"]);
    assert_eq!(graph.clean_list(), ["mylib.o".to_string()].as_slice());
    assert_eq!(graph.clobber_list(), ["mylib.so".to_string()].as_slice());
    assert_eq!(t.state(), TaskState::GraphEmitted);
  }

  #[test]
  fn cxx_sources_use_the_cxx_compiler() {
    let mut graph = Graph::new();
    let mut t = task("mylib", |t| {
      t.env.set(SettingKey::Cxx, "g++");
    });
    t.emit_with(&mut graph, &KnownFiles::new(["mylib.cpp"])).unwrap();

    let obj = graph.node("mylib.o").unwrap();
    assert_eq!(obj.prerequisites, vec!["mylib.cpp"]);
    assert!(obj.action.as_ref().unwrap().template().as_str().starts_with("g++ "));
  }

  #[test]
  fn deps_and_link_libs() {
    let mut graph = Graph::new();
    let mut t = task("mylib", |t| {
      t.deps.push("config.h".to_string());
      t.link_libs = vec!["bar".to_string(), "baz".to_string()];
    });
    t.emit_with(&mut graph, &KnownFiles::new(["mylib.c"])).unwrap();

    assert_eq!(graph.node("mylib").unwrap().prerequisites, vec!["config.h", "mylib.so"]);
    let link = graph.node("mylib.so").unwrap().action.as_ref().unwrap().template().to_string();
    assert!(link.contains("$${in} -lbar -lbaz"), "{link}");
  }

  #[test]
  fn paths_are_joined_under_dir() {
    let mut graph = Graph::new();
    let mut t = task("mylib", |t| {
      t.dir = "ext".to_string();
      t.deps.push("config.h".to_string());
    });
    let src = join_dir("ext", "mylib.c");
    t.emit_with(&mut graph, &KnownFiles::new([src.clone()])).unwrap();

    let obj = join_dir("ext", "mylib.o");
    let lib = join_dir("ext", "mylib.so");
    assert_eq!(graph.node(&obj).unwrap().prerequisites, vec![src]);
    assert_eq!(graph.node(&lib).unwrap().prerequisites, vec![obj]);
    assert_eq!(
      graph.node("mylib").unwrap().prerequisites,
      vec![join_dir("ext", "config.h"), lib]
    );
  }

  #[test]
  fn stem_without_source_fails_before_declaring_anything() {
    let mut graph = Graph::new();
    let mut t = task("mylib", |_| {});
    let err = t.emit_with(&mut graph, &KnownFiles::default()).unwrap_err();

    assert_eq!(
      err,
      TaskError::NoMatchingRule {
        artifact: "mylib.o".to_string()
      }
    );
    assert!(graph.nodes().is_empty());
    assert_eq!(t.state(), TaskState::UserConfigured);
  }

  #[test]
  #[tracing_test::traced_test]
  fn literal_object_without_rule_is_linked_as_is() {
    let mut graph = Graph::new();
    let spec = TaskSpec::new("mylib").with_objects(["prebuilt.o"]);
    let mut t = ExtensionTask::with_env(spec, linux_env(), |_| {}).unwrap();
    t.emit_with(&mut graph, &KnownFiles::default()).unwrap();

    assert!(graph.node("prebuilt.o").is_none());
    assert_eq!(graph.node("mylib.so").unwrap().prerequisites, vec!["prebuilt.o"]);
    assert!(graph.clean_list().is_empty());
    assert!(logs_contain("no rule matches object"));
  }

  #[test]
  fn emission_is_idempotent() {
    let mut graph = Graph::new();
    let mut t = task("mylib", |_| {});
    let files = KnownFiles::new(["mylib.c"]);
    t.emit_with(&mut graph, &files).unwrap();
    let nodes = graph.nodes().len();
    let rules = graph.rules().len();

    t.emit_with(&mut graph, &files).unwrap();

    assert_eq!(graph.nodes().len(), nodes);
    assert_eq!(graph.rules().len(), rules);
    assert_eq!(graph.node("mylib.so").unwrap().prerequisites, vec!["mylib.o"]);
  }

  #[test]
  fn tasks_do_not_share_settings() {
    let mut graph = Graph::new();
    let files = KnownFiles::new(["one.c", "two.c"]);
    let mut one = task("one", |t| {
      t.env.set(SettingKey::Cflags, "-O3");
    });
    let mut two = task("two", |_| {});
    one.emit_with(&mut graph, &files).unwrap();
    two.emit_with(&mut graph, &files).unwrap();

    let cmd = |name: &str| graph.node(name).unwrap().action.as_ref().unwrap().template().to_string();
    assert!(cmd("one.o").contains("-O3"));
    assert!(!cmd("two.o").contains("-O3"));
    assert_eq!(two.env.lookup(&SettingKey::Cflags), Some(&Setting::from("-fPIC")));
  }

  #[test]
  fn defaults_are_not_mutated_by_tasks() {
    let before = crate::settings::DefaultSettings::get().clone();
    let _ = ExtensionTask::new("mylib", |t| {
      t.env.set(SettingKey::Cc, "something-else");
      t.env.set("extra", true);
    })
    .unwrap();

    assert_eq!(crate::settings::DefaultSettings::get(), &before);
  }
}
