//! Extensions built from wrapper-generator interface files.
//!
//! Each interface `foo.i` becomes a generated source `foo_wrap.cc`, which is
//! compiled like any other C++ source and linked into the library:
//!
//! ```text
//! dbxml.i (+ dbxml_ruby.i) -> dbxml_wrap.cc -> dbxml_wrap.o -> dbxml.so
//! ```
//!
//! Generation is gated on the generator's version. The gate is checked when a
//! generation action first runs, never while the task is being declared.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::action::Action;
use crate::artifact::{ArtifactClass, ArtifactRef, FileProbe, FsProbe, join_dir, with_extension};
use crate::engine::TaskEngine;
use crate::rule::{Rule, recipes};
use crate::settings::{Environment, SettingKey};
use crate::tool::VersionGate;

use super::emission::Emission;
use super::{ExtensionTask, TaskError, TaskSpec, TaskState};

/// An extension whose sources are generated from interface files.
#[derive(Debug, Clone)]
pub struct SwigExtensionTask {
  /// The underlying extension; its `objects` start out empty and the
  /// generated objects are appended on emission.
  pub base: ExtensionTask,
  /// Interface files to generate sources from.
  pub interfaces: Vec<ArtifactRef>,
  /// Extra files each interface includes, keyed by interface name.
  pub interface_deps: BTreeMap<String, Vec<ArtifactRef>>,

  gate: Arc<VersionGate>,
}

impl SwigExtensionTask {
  /// Define a generated-source task against the process-wide defaults and the
  /// process-wide generator version gate.
  pub fn new(spec: impl Into<TaskSpec>, configure: impl FnOnce(&mut Self)) -> Result<Self, TaskError> {
    Self::with_env(spec, Environment::copy_defaults(), VersionGate::swig(), configure)
  }

  /// Define a task starting from `env`, checking the generator with `gate`.
  pub fn with_env(
    spec: impl Into<TaskSpec>,
    env: Environment,
    gate: Arc<VersionGate>,
    configure: impl FnOnce(&mut Self),
  ) -> Result<Self, TaskError> {
    let spec = spec.into();
    let base = ExtensionTask::with_defaults(&spec, env, spec.objects.clone().unwrap_or_default())?;

    let mut task = Self {
      interfaces: vec![ArtifactRef::stem(base.name())],
      interface_deps: BTreeMap::new(),
      base,
      gate,
    };

    configure(&mut task);
    task.base.state = TaskState::UserConfigured;

    info!(task = %task.base.name(), interfaces = task.interfaces.len(), "defined generated-source extension task");
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

  /// Record that `interface` includes `dep`.
  pub fn depend(&mut self, interface: &str, dep: impl Into<ArtifactRef>) {
    self.interface_deps.entry(interface.to_string()).or_default().push(dep.into());
  }

  pub fn gate(&self) -> &Arc<VersionGate> {
    &self.gate
  }

  pub fn state(&self) -> TaskState {
    self.base.state()
  }

  /// Paths of the generated sources, one per interface.
  pub fn generated_sources(&self) -> Result<Vec<String>, TaskError> {
    self
      .interfaces
      .iter()
      .map(|iface| Ok(join_dir(&self.base.dir, &self.generated_name(iface)?)))
      .collect()
  }

  /// File name of the source generated from `iface`: the interface with its
  /// interface extension (or, for other literals, its last extension)
  /// replaced by `swig_cppext`.
  fn generated_name(&self, iface: &ArtifactRef) -> Result<String, TaskError> {
    let env = &self.base.env;
    let cppext = env.get_str(&SettingKey::SwigCppext)?;
    let file = iface.resolve(ArtifactClass::Interface, env)?;
    let swigext = format!(".{}", env.get_str(&SettingKey::Swigext)?);

    let stem = match file.strip_suffix(swigext.as_str()) {
      Some(stem) => stem.to_string(),
      None => with_extension(&file, ""),
    };
    Ok(format!("{}{cppext}", stem.trim_end_matches('.')))
  }

  pub fn emit(&mut self, engine: &mut dyn TaskEngine) -> Result<(), TaskError> {
    self.emit_with(engine, &FsProbe)
  }

  /// Declare generated-source nodes ahead of the regular extension nodes.
  pub fn emit_with(&mut self, engine: &mut dyn TaskEngine, files: &dyn FileProbe) -> Result<(), TaskError> {
    if self.base.state == TaskState::GraphEmitted {
      debug!(task = %self.base.name(), "already emitted");
      return Ok(());
    }

    let env = &self.base.env;
    let objext = env.get_str(&SettingKey::Objext)?.to_string();
    let swigext = format!(".{}", env.get_str(&SettingKey::Swigext)?);
    let cppext = env.get_str(&SettingKey::SwigCppext)?.to_string();
    let tool = env.get_str(&SettingKey::Swig)?.to_string();

    let generate = Action::exec(recipes::generate_wrapper().synthesize(env)?).gated(Arc::clone(&self.gate), tool);
    self.base.rules.register(Rule::new(swigext, cppext.clone(), generate.clone()));

    if let Some(ext) = Path::new(&cppext).extension().and_then(|e| e.to_str())
      && !env.get_list(&SettingKey::CppExts)?.iter().any(|known| known == ext)
    {
      let compile = Action::exec(recipes::compile_cxx().synthesize(env)?);
      self.base.rules.register(Rule::new(format!(".{ext}"), format!(".{objext}"), compile));
    }

    let mut emission = Emission::default();
    let mut generated = Vec::with_capacity(self.interfaces.len());

    for iface in &self.interfaces {
      let dir = &self.base.dir;
      let name = self.generated_name(iface)?;
      let src = join_dir(dir, &name);

      let iface_path = join_dir(dir, &iface.resolve(ArtifactClass::Interface, &self.base.env)?);
      let available = files.exists(&iface_path) || engine.is_declared(&iface_path) || emission.declares(&iface_path);
      if iface.is_stem() && !available {
        return Err(TaskError::NoMatchingRule { artifact: iface_path });
      }

      let mut prerequisites = vec![iface_path];
      for dep in self.interface_deps.get(iface.name()).into_iter().flatten() {
        let dep = join_dir(dir, &dep.resolve(ArtifactClass::Interface, &self.base.env)?);
        if !prerequisites.contains(&dep) {
          prerequisites.push(dep);
        }
      }

      emission.file(src.clone(), prerequisites, Some(generate.clone()));
      emission.clean(src);
      generated.push(ArtifactRef::literal(with_extension(&name, &objext)));
    }

    self.base.collect(&*engine, files, &mut emission, &generated)?;
    emission.apply(engine);

    self.base.objects.extend(generated);
    self.base.state = TaskState::GraphEmitted;
    Ok(())
  }
}
