//! External tool version detection.
//!
//! The wrapper generator must be at least [`MINIMUM_SWIG_VERSION`]. The check
//! runs when a generation action first fires, not when the task is declared,
//! and the detected version is cached for the rest of the process.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock};

use tracing::{debug, info};

use crate::execute::{CommandRunner, ExecuteError, ShellRunner};

/// Oldest wrapper generator release that is accepted.
pub const MINIMUM_SWIG_VERSION: &str = "1.3";

static SWIG_GATE: LazyLock<Arc<VersionGate>> =
  LazyLock::new(|| Arc::new(VersionGate::new(MINIMUM_SWIG_VERSION, ShellProbe)));

/// A dotted numeric version, compared component by component.
///
/// Missing trailing components count as zero, so `1.3` equals `1.3.0` and
/// `1.10` is newer than `1.9`.
#[derive(Debug, Clone, Eq)]
pub struct ToolVersion(Vec<u64>);

impl ToolVersion {
  /// Parse a version such as `1.3.31`. Text after the numeric components
  /// (`4.0.2-beta`) is ignored.
  pub fn parse(text: &str) -> Option<Self> {
    let mut parts = Vec::new();
    for component in text.split('.') {
      let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
      if digits.is_empty() {
        break;
      }
      parts.push(digits.parse().ok()?);
      if digits.len() != component.len() {
        break;
      }
    }

    if parts.is_empty() { None } else { Some(Self(parts)) }
  }

  pub fn components(&self) -> &[u64] {
    &self.0
  }
}

impl Ord for ToolVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    let len = self.0.len().max(other.0.len());
    for i in 0..len {
      let a = self.0.get(i).copied().unwrap_or(0);
      let b = other.0.get(i).copied().unwrap_or(0);
      match a.cmp(&b) {
        Ordering::Equal => continue,
        unequal => return unequal,
      }
    }
    Ordering::Equal
  }
}

impl PartialOrd for ToolVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for ToolVersion {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl fmt::Display for ToolVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
    write!(f, "{}", parts.join("."))
  }
}

/// Extract the version from a tool's banner output.
///
/// Looks at the first non-blank line and takes the word after `version`
/// (`SWIG Version 1.3.31`). Falls back to the first version-like word on
/// that line.
pub fn parse_banner(output: &str) -> Option<ToolVersion> {
  let line = output.lines().find(|line| !line.trim().is_empty())?;
  let words: Vec<&str> = line.split_whitespace().collect();

  let after_keyword = words
    .iter()
    .position(|word| word.eq_ignore_ascii_case("version"))
    .and_then(|i| words.get(i + 1))
    .and_then(|word| ToolVersion::parse(word));

  after_keyword.or_else(|| words.iter().find_map(|word| ToolVersion::parse(word)))
}

/// Something that can report a tool's version banner.
pub trait ToolProbe {
  /// Raw banner output, or `None` if the tool could not be run.
  fn probe(&self, tool: &str) -> Option<String>;
}

/// Runs `<tool> -version` through the shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellProbe;

impl ToolProbe for ShellProbe {
  fn probe(&self, tool: &str) -> Option<String> {
    let runner = ShellRunner::new().ok()?;
    match runner.run(&format!("{tool} -version 2>&1")) {
      Ok(output) => Some(output),
      Err(e) => {
        debug!(tool = %tool, error = %e, "version probe failed");
        None
      }
    }
  }
}

/// A minimum-version requirement, checked once per process.
pub struct VersionGate {
  minimum: ToolVersion,
  probe: Box<dyn ToolProbe + Send + Sync>,
  detected: OnceLock<Option<ToolVersion>>,
}

impl VersionGate {
  /// A gate requiring at least `minimum`. An unparseable minimum accepts
  /// any detected version.
  pub fn new(minimum: &str, probe: impl ToolProbe + Send + Sync + 'static) -> Self {
    Self {
      minimum: ToolVersion::parse(minimum).unwrap_or(ToolVersion(vec![0])),
      probe: Box::new(probe),
      detected: OnceLock::new(),
    }
  }

  /// The process-wide gate for the wrapper generator.
  pub fn swig() -> Arc<VersionGate> {
    Arc::clone(&SWIG_GATE)
  }

  pub fn minimum(&self) -> &ToolVersion {
    &self.minimum
  }

  /// The cached probe result, if the probe has run.
  pub fn detected(&self) -> Option<Option<&ToolVersion>> {
    self.detected.get().map(Option::as_ref)
  }

  /// Check `tool` against the minimum, probing it on the first call only.
  ///
  /// A tool that cannot be run, or whose banner has no version, fails the
  /// check.
  pub fn verify(&self, tool: &str) -> Result<&ToolVersion, ExecuteError> {
    let detected = self.detected.get_or_init(|| {
      let version = self.probe.probe(tool).as_deref().and_then(parse_banner);
      info!(
        tool = %tool,
        version = %version.as_ref().map(ToString::to_string).unwrap_or_else(|| "unknown".to_string()),
        "detected tool version"
      );
      version
    });

    match detected {
      Some(version) if *version >= self.minimum => Ok(version),
      found => Err(ExecuteError::UnsupportedToolVersion {
        tool: tool.to_string(),
        required: self.minimum.to_string(),
        found: found.as_ref().map(ToString::to_string),
      }),
    }
  }
}

impl fmt::Debug for VersionGate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("VersionGate")
      .field("minimum", &self.minimum)
      .field("detected", &self.detected.get())
      .finish_non_exhaustive()
  }
}
