//! Artifact references and path helpers.
//!
//! Files are named either literally (`"config.h"`, `"foo.o"`) or by a symbolic
//! stem that gets the environment's extension for its class appended
//! (`foo` -> `foo.o` as an object, `foo.so` as a library, `foo.i` as an
//! interface). Expansion depends only on the environment, so the same stem
//! always expands to the same path within one task.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::settings::{Environment, SettingKey, SettingsError};

/// A file named literally or by a symbolic stem.
///
/// In build files a literal is a bare string and a stem is `{ "stem": "foo" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactRef {
  Literal(String),
  Stem { stem: String },
}

/// The kind of file a stem expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactClass {
  /// Compiled object, `.{objext}`.
  Object,
  /// Loadable extension library, `.{dlext}`.
  SharedLibrary,
  /// Wrapper-generator interface definition, `.{swigext}`.
  Interface,
  /// Generated wrapper source; `swig_cppext` is a full suffix such as `_wrap.cc`.
  GeneratedSource,
}

impl ArtifactClass {
  /// The suffix appended to a stem of this class.
  pub fn suffix(self, env: &Environment) -> Result<String, SettingsError> {
    Ok(match self {
      ArtifactClass::Object => format!(".{}", env.get_str(&SettingKey::Objext)?),
      ArtifactClass::SharedLibrary => format!(".{}", env.get_str(&SettingKey::Dlext)?),
      ArtifactClass::Interface => format!(".{}", env.get_str(&SettingKey::Swigext)?),
      ArtifactClass::GeneratedSource => env.get_str(&SettingKey::SwigCppext)?.to_string(),
    })
  }
}

impl ArtifactRef {
  pub fn literal(name: impl Into<String>) -> Self {
    ArtifactRef::Literal(name.into())
  }

  pub fn stem(name: impl Into<String>) -> Self {
    ArtifactRef::Stem { stem: name.into() }
  }

  /// The name as written, without any expansion.
  pub fn name(&self) -> &str {
    match self {
      ArtifactRef::Literal(name) => name,
      ArtifactRef::Stem { stem } => stem,
    }
  }

  pub fn is_stem(&self) -> bool {
    matches!(self, ArtifactRef::Stem { .. })
  }

  /// Expand to a file name (not yet joined under a directory).
  pub fn resolve(&self, class: ArtifactClass, env: &Environment) -> Result<String, SettingsError> {
    match self {
      ArtifactRef::Literal(name) => Ok(name.clone()),
      ArtifactRef::Stem { stem } => Ok(format!("{stem}{}", class.suffix(env)?)),
    }
  }
}

impl From<&str> for ArtifactRef {
  fn from(name: &str) -> Self {
    ArtifactRef::Literal(name.to_string())
  }
}

impl From<String> for ArtifactRef {
  fn from(name: String) -> Self {
    ArtifactRef::Literal(name)
  }
}

/// Join `file` under `dir`. The current directory joins to the bare name.
pub fn join_dir(dir: &str, file: &str) -> String {
  if dir.is_empty() || dir == "." {
    return file.to_string();
  }
  Path::new(dir).join(file).to_string_lossy().into_owned()
}

/// Replace the final extension of `path` with `ext` (no leading dot).
pub fn with_extension(path: &str, ext: &str) -> String {
  Path::new(path).with_extension(ext).to_string_lossy().into_owned()
}

/// Something that can tell whether a file is present.
///
/// Graph emission asks this when looking for the source of an object.
pub trait FileProbe {
  fn exists(&self, path: &str) -> bool;
}

/// Checks the real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl FileProbe for FsProbe {
  fn exists(&self, path: &str) -> bool {
    Path::new(path).exists()
  }
}

/// A fixed set of paths, for planning against files that do not exist yet.
#[derive(Debug, Clone, Default)]
pub struct KnownFiles(BTreeSet<String>);

impl KnownFiles {
  pub fn new<I, S>(paths: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(paths.into_iter().map(Into::into).collect())
  }

  pub fn insert(&mut self, path: impl Into<String>) {
    self.0.insert(path.into());
  }
}

impl FileProbe for KnownFiles {
  fn exists(&self, path: &str) -> bool {
    self.0.contains(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn env() -> Environment {
    [
      ("objext", "o"),
      ("dlext", "so"),
      ("swigext", "i"),
      ("swig_cppext", "_wrap.cc"),
    ]
    .into_iter()
    .collect()
  }

  #[test]
  fn stems_take_the_class_extension() {
    let env = env();
    let foo = ArtifactRef::stem("foo");

    assert_eq!(foo.resolve(ArtifactClass::Object, &env).unwrap(), "foo.o");
    assert_eq!(foo.resolve(ArtifactClass::SharedLibrary, &env).unwrap(), "foo.so");
    assert_eq!(foo.resolve(ArtifactClass::Interface, &env).unwrap(), "foo.i");
    assert_eq!(foo.resolve(ArtifactClass::GeneratedSource, &env).unwrap(), "foo_wrap.cc");
  }

  #[test]
  fn literals_are_used_verbatim() {
    let env = env();
    let lib = ArtifactRef::literal("libfoo.so.1");
    assert_eq!(lib.resolve(ArtifactClass::SharedLibrary, &env).unwrap(), "libfoo.so.1");
  }

  #[test]
  fn expansion_is_stable() {
    let env = env();
    let foo = ArtifactRef::stem("foo");
    let first = foo.resolve(ArtifactClass::Object, &env).unwrap();
    let second = foo.resolve(ArtifactClass::Object, &env).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn missing_extension_setting_is_unknown() {
    let env = Environment::new();
    let err = ArtifactRef::stem("foo").resolve(ArtifactClass::Object, &env).unwrap_err();
    assert_eq!(err, SettingsError::UnknownSetting("objext".to_string()));
  }

  #[test]
  fn join_dir_skips_current_directory() {
    assert_eq!(join_dir(".", "foo.o"), "foo.o");
    assert_eq!(join_dir("", "foo.o"), "foo.o");
    assert_eq!(join_dir("ext", "foo.o"), Path::new("ext").join("foo.o").to_string_lossy());
  }

  #[test]
  fn with_extension_replaces_only_the_last_one() {
    assert_eq!(with_extension("dbxml_wrap.cc", "o"), "dbxml_wrap.o");
    assert_eq!(with_extension("lib.v2/foo.c", "o"), Path::new("lib.v2/foo.o").to_string_lossy());
  }

  #[test]
  fn build_file_syntax() {
    let refs: Vec<ArtifactRef> = serde_json::from_str(r#"["config.h", {"stem": "foo"}]"#).unwrap();
    assert_eq!(refs, vec![ArtifactRef::literal("config.h"), ArtifactRef::stem("foo")]);
  }
}
