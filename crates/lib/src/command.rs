//! Command-line synthesis from structured option tokens.
//!
//! A command is described as an ordered list of [`OptionToken`]s and turned
//! into a single space-joined string against an [`Environment`]:
//!
//! - `Literal("-c")` is emitted verbatim
//! - `Setting(Cflags)` emits the setting's value; a list setting emits each item
//! - `Prefixed { "-I", Includedirs }` emits `-I<item>` for every item
//!
//! Settings that are absent expand to nothing. Empty fragments are dropped, so
//! an empty `cppflags` never leaves a double space behind. Synthesis reads the
//! environment only; running it twice yields the same string.
//!
//! ```
//! use extbuild_lib::command::CommandSpec;
//! use extbuild_lib::settings::{Environment, Setting, SettingKey};
//!
//! let env: Environment = [
//!   ("cc", Setting::from("gcc")),
//!   ("includedirs", Setting::from(["/opt/include"])),
//! ]
//! .into_iter()
//! .collect();
//!
//! let cmd = CommandSpec::new()
//!   .setting(SettingKey::Cc)
//!   .prefixed("-I", SettingKey::Includedirs)
//!   .literal("-c")
//!   .synthesize(&env)
//!   .unwrap();
//!
//! assert_eq!(cmd, "gcc -I/opt/include -c");
//! ```

use crate::settings::{Environment, Setting, SettingKey, SettingsError};

/// Where the items of a prefixed option come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
  /// A named setting, looked up at synthesis time.
  Setting(SettingKey),
  /// Items known when the command is described (e.g. a task's link libraries).
  Items(Vec<String>),
}

/// One element of a command description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionToken {
  Literal(String),
  Setting(SettingKey),
  Prefixed { prefix: String, source: ListSource },
}

/// An ordered list of option tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
  tokens: Vec<OptionToken>,
}

impl CommandSpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn literal(mut self, value: impl Into<String>) -> Self {
    self.tokens.push(OptionToken::Literal(value.into()));
    self
  }

  pub fn setting(mut self, key: impl Into<SettingKey>) -> Self {
    self.tokens.push(OptionToken::Setting(key.into()));
    self
  }

  pub fn prefixed(mut self, prefix: impl Into<String>, key: impl Into<SettingKey>) -> Self {
    self.tokens.push(OptionToken::Prefixed {
      prefix: prefix.into(),
      source: ListSource::Setting(key.into()),
    });
    self
  }

  pub fn prefixed_items<I, S>(mut self, prefix: impl Into<String>, items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.tokens.push(OptionToken::Prefixed {
      prefix: prefix.into(),
      source: ListSource::Items(items.into_iter().map(Into::into).collect()),
    });
    self
  }

  pub fn synthesize(&self, env: &Environment) -> Result<String, SettingsError> {
    synthesize(&self.tokens, env)
  }
}

/// Turn option tokens into a command line.
///
/// # Errors
///
/// [`SettingsError::InvalidOptionShape`] if a boolean setting is used where a
/// string or list is needed.
pub fn synthesize(tokens: &[OptionToken], env: &Environment) -> Result<String, SettingsError> {
  let mut parts: Vec<String> = Vec::new();

  for token in tokens {
    match token {
      OptionToken::Literal(value) => push_part(&mut parts, value.clone()),
      OptionToken::Setting(key) => match env.lookup(key) {
        None => {}
        Some(Setting::Str(value)) => push_part(&mut parts, value.clone()),
        Some(Setting::List(items)) => {
          let nested: Vec<OptionToken> = items.iter().cloned().map(OptionToken::Literal).collect();
          push_part(&mut parts, synthesize(&nested, env)?);
        }
        Some(other) => return Err(shape_error(key, other)),
      },
      OptionToken::Prefixed { prefix, source } => {
        let items: &[String] = match source {
          ListSource::Items(items) => items,
          ListSource::Setting(key) => match env.lookup(key) {
            None => &[],
            Some(Setting::List(items)) => items,
            Some(Setting::Str(value)) => std::slice::from_ref(value),
            Some(other) => return Err(shape_error(key, other)),
          },
        };
        for item in items.iter().filter(|item| !item.is_empty()) {
          push_part(&mut parts, format!("{prefix}{item}"));
        }
      }
    }
  }

  Ok(parts.join(" "))
}

fn push_part(parts: &mut Vec<String>, part: String) {
  if !part.trim().is_empty() {
    parts.push(part);
  }
}

fn shape_error(key: &SettingKey, found: &Setting) -> SettingsError {
  SettingsError::InvalidOptionShape {
    key: key.to_string(),
    expected: "a string or a list of strings",
    found: found.kind(),
  }
}
