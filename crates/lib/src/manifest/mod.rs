//! Build files.
//!
//! Loads task declarations from JSON and defines them on an engine. Setting
//! values are checked before a task is created: anything that is not a
//! string, a boolean or a list of strings is rejected with
//! [`SettingsError::InvalidOptionShape`].

mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::artifact::FileProbe;
use crate::engine::TaskEngine;
use crate::settings::{Environment, Setting, SettingsError};
use crate::task::{ExtensionTask, SwigExtensionTask, TaskError};
use crate::tool::VersionGate;

/// Default build file name.
pub const BUILD_FILE: &str = "extbuild.json";

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid build file: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("task {task}: {source}")]
  Settings {
    task: String,
    #[source]
    source: SettingsError,
  },

  #[error("task {task}: {source}")]
  Task {
    task: String,
    #[source]
    source: TaskError,
  },

  #[error("task {task}: {field} only applies to swig tasks")]
  NotSwig { task: String, field: &'static str },
}

impl FromStr for BuildFile {
  type Err = ManifestError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    Ok(serde_json::from_str(text)?)
  }
}

impl BuildFile {
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    text.parse()
  }

  /// Define and emit every task against the process-wide defaults.
  ///
  /// Returns the task names in declaration order.
  pub fn define_all(&self, engine: &mut dyn TaskEngine, files: &dyn FileProbe) -> Result<Vec<String>, ManifestError> {
    self.define_all_with(engine, files, DefaultsSource::Process)
  }

  /// Define and emit every task, seeding each from `defaults` and gating
  /// generation with `gate`.
  pub fn define_all_from(
    &self,
    engine: &mut dyn TaskEngine,
    files: &dyn FileProbe,
    defaults: &Environment,
    gate: Arc<VersionGate>,
  ) -> Result<Vec<String>, ManifestError> {
    self.define_all_with(engine, files, DefaultsSource::Given(defaults, gate))
  }

  fn define_all_with(
    &self,
    engine: &mut dyn TaskEngine,
    files: &dyn FileProbe,
    source: DefaultsSource<'_>,
  ) -> Result<Vec<String>, ManifestError> {
    let shared = parse_settings("*", &self.env)?;
    let mut names = Vec::with_capacity(self.tasks.len());

    for decl in &self.tasks {
      let overrides = parse_settings(&decl.name, &decl.env)?;
      let task_err = |source: TaskError| ManifestError::Task {
        task: decl.name.clone(),
        source,
      };

      let (mut env, gate) = match &source {
        DefaultsSource::Process => (Environment::copy_defaults(), VersionGate::swig()),
        DefaultsSource::Given(env, gate) => ((*env).clone(), Arc::clone(gate)),
      };
      for (key, value) in shared.iter().chain(&overrides) {
        env.set(key.as_str(), value.clone());
      }

      match decl.kind {
        TaskKind::Extension => {
          if decl.interfaces.is_some() {
            return Err(not_swig(decl, "interfaces"));
          }
          if !decl.interface_deps.is_empty() {
            return Err(not_swig(decl, "interface_deps"));
          }

          let mut task = ExtensionTask::with_env(decl.spec(), env, |t| {
            apply_common(t, decl);
          })
          .map_err(task_err)?;
          task.emit_with(engine, files).map_err(task_err)?;
          names.push(task.name().to_string());
        }
        TaskKind::Swig => {
          let mut task = SwigExtensionTask::with_env(decl.spec(), env, gate, |t| {
            apply_common(&mut t.base, decl);
            if let Some(interfaces) = &decl.interfaces {
              t.interfaces = interfaces.clone();
            }
            for (iface, deps) in &decl.interface_deps {
              for dep in deps {
                t.depend(iface, dep.clone());
              }
            }
          })
          .map_err(task_err)?;
          task.emit_with(engine, files).map_err(task_err)?;
          names.push(task.base.name().to_string());
        }
      }
    }

    info!(tasks = names.len(), "build file defined");
    Ok(names)
  }
}

enum DefaultsSource<'a> {
  Process,
  Given(&'a Environment, Arc<VersionGate>),
}

fn parse_settings(
  task: &str,
  raw: &std::collections::BTreeMap<String, serde_json::Value>,
) -> Result<Vec<(String, Setting)>, ManifestError> {
  raw
    .iter()
    .map(|(key, value)| {
      Setting::from_json(key, value)
        .map(|setting| (key.clone(), setting))
        .map_err(|source| ManifestError::Settings {
          task: task.to_string(),
          source,
        })
    })
    .collect()
}

fn apply_common(task: &mut ExtensionTask, decl: &TaskDecl) {
  if let Some(lib_name) = &decl.lib_name {
    task.lib_name = lib_name.clone();
  }
  if let Some(dir) = &decl.dir {
    task.dir = dir.clone();
  }
  task.deps.extend(decl.deps.iter().cloned());
  task.link_libs.extend(decl.link_libs.iter().cloned());
}

fn not_swig(decl: &TaskDecl, field: &'static str) -> ManifestError {
  ManifestError::NotSwig {
    task: decl.name.clone(),
    field,
  }
}
