use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or shaping settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
  /// The framework asked for a setting that was never seeded.
  #[error("unknown setting: {0}")]
  UnknownSetting(String),

  /// A setting holds a value of the wrong shape for where it is used.
  #[error("setting '{key}' must be {expected}, found {found}")]
  InvalidOptionShape {
    key: String,
    expected: &'static str,
    found: &'static str,
  },
}

/// Name of a build setting.
///
/// The framework's own keys are enumerated; anything else a caller sets is
/// kept as [`SettingKey::Custom`]. Keys are always lower case, so `"CC"` and
/// `"cc"` name the same setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SettingKey {
  Cc,
  Cxx,
  Cflags,
  Cxxflags,
  Cppflags,
  Ldshared,
  Libs,
  Dlibs,
  Objext,
  Dlext,
  CExts,
  CppExts,
  Defines,
  Includedirs,
  Libdirs,
  Topdir,
  Swig,
  Swigext,
  SwigCppext,
  SwigFlags,
  SwigIncludedirs,
  Custom(String),
}

impl SettingKey {
  /// Every key the framework reads.
  pub const BUILTIN: &'static [SettingKey] = &[
    SettingKey::Cc,
    SettingKey::Cxx,
    SettingKey::Cflags,
    SettingKey::Cxxflags,
    SettingKey::Cppflags,
    SettingKey::Ldshared,
    SettingKey::Libs,
    SettingKey::Dlibs,
    SettingKey::Objext,
    SettingKey::Dlext,
    SettingKey::CExts,
    SettingKey::CppExts,
    SettingKey::Defines,
    SettingKey::Includedirs,
    SettingKey::Libdirs,
    SettingKey::Topdir,
    SettingKey::Swig,
    SettingKey::Swigext,
    SettingKey::SwigCppext,
    SettingKey::SwigFlags,
    SettingKey::SwigIncludedirs,
  ];

  pub fn as_str(&self) -> &str {
    match self {
      Self::Cc => "cc",
      Self::Cxx => "cxx",
      Self::Cflags => "cflags",
      Self::Cxxflags => "cxxflags",
      Self::Cppflags => "cppflags",
      Self::Ldshared => "ldshared",
      Self::Libs => "libs",
      Self::Dlibs => "dlibs",
      Self::Objext => "objext",
      Self::Dlext => "dlext",
      Self::CExts => "c_exts",
      Self::CppExts => "cpp_exts",
      Self::Defines => "defines",
      Self::Includedirs => "includedirs",
      Self::Libdirs => "libdirs",
      Self::Topdir => "topdir",
      Self::Swig => "swig",
      Self::Swigext => "swigext",
      Self::SwigCppext => "swig_cppext",
      Self::SwigFlags => "swig_flags",
      Self::SwigIncludedirs => "swig_includedirs",
      Self::Custom(name) => name,
    }
  }
}

impl From<&str> for SettingKey {
  fn from(name: &str) -> Self {
    let name = name.trim().to_ascii_lowercase();
    SettingKey::BUILTIN
      .iter()
      .find(|key| key.as_str() == name)
      .cloned()
      .unwrap_or(SettingKey::Custom(name))
  }
}

impl From<String> for SettingKey {
  fn from(name: String) -> Self {
    SettingKey::from(name.as_str())
  }
}

impl From<&SettingKey> for SettingKey {
  fn from(key: &SettingKey) -> Self {
    key.clone()
  }
}

impl From<SettingKey> for String {
  fn from(key: SettingKey) -> Self {
    key.as_str().to_string()
  }
}

impl FromStr for SettingKey {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(SettingKey::from(s))
  }
}

impl fmt::Display for SettingKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Value of a build setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Setting {
  Str(String),
  Bool(bool),
  List(Vec<String>),
}

impl Setting {
  /// Human-readable shape name, used in error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Setting::Str(_) => "a string",
      Setting::Bool(_) => "a boolean",
      Setting::List(_) => "a list of strings",
    }
  }

  /// Convert a JSON value from a build file into a setting.
  ///
  /// Strings, booleans and arrays of strings are accepted. Everything else is
  /// rejected here rather than when a command is synthesized.
  pub fn from_json(key: &str, value: &serde_json::Value) -> Result<Self, SettingsError> {
    use serde_json::Value;

    let invalid = |found: &'static str| SettingsError::InvalidOptionShape {
      key: key.to_string(),
      expected: "a string, a boolean or a list of strings",
      found,
    };

    match value {
      Value::String(s) => Ok(Setting::Str(s.clone())),
      Value::Bool(b) => Ok(Setting::Bool(*b)),
      Value::Array(items) => items
        .iter()
        .map(|item| match item {
          Value::String(s) => Ok(s.clone()),
          Value::Number(_) => Err(invalid("a list containing a number")),
          _ => Err(invalid("a list containing a non-string")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Setting::List),
      Value::Number(_) => Err(invalid("a number")),
      Value::Null => Err(invalid("null")),
      Value::Object(_) => Err(invalid("an object")),
    }
  }
}

impl From<&str> for Setting {
  fn from(value: &str) -> Self {
    Setting::Str(value.to_string())
  }
}

impl From<String> for Setting {
  fn from(value: String) -> Self {
    Setting::Str(value)
  }
}

impl From<bool> for Setting {
  fn from(value: bool) -> Self {
    Setting::Bool(value)
  }
}

impl From<Vec<String>> for Setting {
  fn from(value: Vec<String>) -> Self {
    Setting::List(value)
  }
}

impl From<Vec<&str>> for Setting {
  fn from(value: Vec<&str>) -> Self {
    Setting::List(value.into_iter().map(String::from).collect())
  }
}

impl<const N: usize> From<[&str; N]> for Setting {
  fn from(value: [&str; N]) -> Self {
    Setting::List(value.into_iter().map(String::from).collect())
  }
}
