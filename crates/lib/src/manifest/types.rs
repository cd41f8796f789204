//! Build file types.
//!
//! A build file is a JSON document listing extension tasks:
//!
//! ```json
//! {
//!   "env": { "cc": "gcc" },
//!   "tasks": [
//!     { "name": "mylib", "deps": ["config.h"], "link_libs": ["m"] },
//!     {
//!       "kind": "swig",
//!       "name": "dbxml",
//!       "dir": "ext",
//!       "interface_deps": { "dbxml": [{ "stem": "dbxml_ruby" }] },
//!       "env": { "includedirs": ["/usr/include/dbxml"] }
//!     }
//!   ]
//! }
//! ```
//!
//! The top-level `env` applies to every task; a task's own `env` is applied
//! after it. Setting values are kept as raw JSON until the task is defined so
//! that a bad value is reported against the task that uses it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::ArtifactRef;
use crate::task::TaskSpec;

/// The whole build file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
  /// Setting overrides shared by every task.
  #[serde(default)]
  pub env: BTreeMap<String, Value>,

  #[serde(default)]
  pub tasks: Vec<TaskDecl>,
}

/// Which task type a declaration defines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
  #[default]
  Extension,
  Swig,
}

fn default_true() -> bool {
  true
}

/// One task declaration. Absent fields keep the task's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDecl {
  #[serde(default)]
  pub kind: TaskKind,

  pub name: String,

  /// Whether `name` is a stem (library gets the platform extension) or the
  /// library file name itself.
  #[serde(default = "default_true")]
  pub symbolic: bool,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lib_name: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub objects: Option<Vec<ArtifactRef>>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub deps: Vec<String>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub link_libs: Vec<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dir: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interfaces: Option<Vec<ArtifactRef>>,

  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub interface_deps: BTreeMap<String, Vec<ArtifactRef>>,

  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, Value>,
}

impl TaskDecl {
  /// The target this declaration names.
  pub fn spec(&self) -> TaskSpec {
    let spec = if self.symbolic {
      TaskSpec::new(self.name.clone())
    } else {
      TaskSpec::literal(self.name.clone())
    };

    match &self.objects {
      Some(objects) => spec.with_objects(objects.iter().cloned()),
      None => spec,
    }
  }
}
