//! Build settings.
//!
//! An [`Environment`] maps setting names to values (compiler paths, flags,
//! recognized source extensions, search directories, tool paths). Every task
//! owns its own environment, cloned from the process-wide [`DefaultSettings`]
//! when the task is created, so overrides made while configuring one task never
//! leak into another.
//!
//! The table is open: callers may set any key. Only lookups the framework makes
//! itself fail with [`SettingsError::UnknownSetting`].

pub mod defaults;
mod types;

pub use types::*;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Serialize;

static DEFAULTS: LazyLock<Environment> = LazyLock::new(defaults::host_defaults);

/// The process-wide default settings.
///
/// Built once, on first use, from the host platform and toolchain environment
/// variables. It is only ever handed out by shared reference; tasks work on
/// clones.
pub struct DefaultSettings;

impl DefaultSettings {
  pub fn get() -> &'static Environment {
    &DEFAULTS
  }
}

/// A mutable table of build settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Environment {
  values: BTreeMap<String, Setting>,
}

impl Environment {
  /// Create an empty environment.
  pub fn new() -> Self {
    Self::default()
  }

  /// An independent copy of the process-wide defaults.
  pub fn copy_defaults() -> Self {
    DefaultSettings::get().clone()
  }

  /// Look up a setting the framework requires.
  pub fn get(&self, key: &SettingKey) -> Result<&Setting, SettingsError> {
    self
      .values
      .get(key.as_str())
      .ok_or_else(|| SettingsError::UnknownSetting(key.to_string()))
  }

  /// Look up a setting that may legitimately be absent.
  pub fn lookup(&self, key: &SettingKey) -> Option<&Setting> {
    self.values.get(key.as_str())
  }

  /// Replace a setting, returning the previous value.
  ///
  /// Lists are replaced wholesale; use [`Environment::append`] to extend one.
  pub fn set(&mut self, key: impl Into<SettingKey>, value: impl Into<Setting>) -> Option<Setting> {
    let key: SettingKey = key.into();
    self.values.insert(key.as_str().to_string(), value.into())
  }

  /// Append items to a list setting, creating it if absent.
  pub fn append<I, S>(&mut self, key: impl Into<SettingKey>, items: I) -> Result<(), SettingsError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let key: SettingKey = key.into();
    let entry = self
      .values
      .entry(key.as_str().to_string())
      .or_insert_with(|| Setting::List(Vec::new()));

    match entry {
      Setting::List(list) => {
        list.extend(items.into_iter().map(Into::into));
        Ok(())
      }
      other => Err(SettingsError::InvalidOptionShape {
        key: key.to_string(),
        expected: "a list of strings",
        found: other.kind(),
      }),
    }
  }

  /// Remove a setting, returning its value.
  pub fn remove(&mut self, key: &SettingKey) -> Option<Setting> {
    self.values.remove(key.as_str())
  }

  /// Read a required string setting.
  pub fn get_str(&self, key: &SettingKey) -> Result<&str, SettingsError> {
    match self.get(key)? {
      Setting::Str(s) => Ok(s),
      other => Err(SettingsError::InvalidOptionShape {
        key: key.to_string(),
        expected: "a string",
        found: other.kind(),
      }),
    }
  }

  /// Read a required list setting.
  pub fn get_list(&self, key: &SettingKey) -> Result<&[String], SettingsError> {
    match self.get(key)? {
      Setting::List(items) => Ok(items),
      other => Err(SettingsError::InvalidOptionShape {
        key: key.to_string(),
        expected: "a list of strings",
        found: other.kind(),
      }),
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Setting)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
  K: Into<SettingKey>,
  V: Into<Setting>,
{
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let mut env = Environment::new();
    for (key, value) in iter {
      env.set(key, value);
    }
    env
  }
}
