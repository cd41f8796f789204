//! Extension-keyed transformation rules.
//!
//! A [`Rule`] says that a file ending in `target_ext` can be produced from the
//! file with the same stem ending in `source_ext`, by running an action. A
//! [`RuleSet`] holds rules in registration order and finds the one that
//! applies to a requested artifact:
//!
//! 1. candidates are the rules whose target suffix the artifact ends with,
//!    longest suffix first (so `_wrap.cc` beats `.cc`), ties in registration
//!    order
//! 2. a candidate whose source is available wins outright
//! 3. otherwise a candidate whose source can itself be produced by another rule
//!    is used, up to [`MAX_CHAIN_DEPTH`] steps
//!
//! Suffixes include their leading separator (`.c`, `.o`, `_wrap.cc`).

pub mod recipes;

use tracing::{debug, warn};

use crate::action::Action;

/// How many rules may be chained to reach an available source.
pub const MAX_CHAIN_DEPTH: usize = 4;

/// A (source suffix, target suffix) pair and the action that performs it.
#[derive(Debug, Clone)]
pub struct Rule {
  source_ext: String,
  target_ext: String,
  action: Action,
}

impl Rule {
  pub fn new(source_ext: impl Into<String>, target_ext: impl Into<String>, action: Action) -> Self {
    Self {
      source_ext: source_ext.into(),
      target_ext: target_ext.into(),
      action,
    }
  }

  pub fn source_ext(&self) -> &str {
    &self.source_ext
  }

  pub fn target_ext(&self) -> &str {
    &self.target_ext
  }

  pub fn action(&self) -> &Action {
    &self.action
  }

  /// Whether this rule pairs the same suffixes as `other`.
  pub fn same_key(&self, other: &Rule) -> bool {
    self.source_ext == other.source_ext && self.target_ext == other.target_ext
  }

  /// The source this rule would read to produce `target`, if it applies.
  pub fn source_for(&self, target: &str) -> Option<String> {
    target
      .strip_suffix(self.target_ext.as_str())
      .filter(|stem| !stem.is_empty() && !stem.ends_with(['/', '\\']))
      .map(|stem| format!("{stem}{}", self.source_ext))
  }
}

/// One step of a resolved rule chain.
#[derive(Debug, Clone)]
pub struct Derivation {
  pub output: String,
  pub source: String,
  pub action: Action,
}

/// Registered rules, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
  rules: Vec<Rule>,
}

impl RuleSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a rule. Registering a suffix pair that is already present keeps the
  /// existing rule and returns `false`.
  pub fn register(&mut self, rule: Rule) -> bool {
    if let Some(existing) = self.rules.iter().find(|r| r.same_key(&rule)) {
      if existing.action.template() != rule.action.template() {
        warn!(
          source = %rule.source_ext,
          target = %rule.target_ext,
          kept = %existing.action.template(),
          "rule already registered with a different action; keeping the first"
        );
      } else {
        debug!(source = %rule.source_ext, target = %rule.target_ext, "rule already registered");
      }
      return false;
    }

    debug!(source = %rule.source_ext, target = %rule.target_ext, "registered rule");
    self.rules.push(rule);
    true
  }

  pub fn get(&self, source_ext: &str, target_ext: &str) -> Option<&Rule> {
    self
      .rules
      .iter()
      .find(|r| r.source_ext == source_ext && r.target_ext == target_ext)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Rule> {
    self.rules.iter()
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// Rules that could produce `target`, longest target suffix first.
  pub fn candidates(&self, target: &str) -> Vec<&Rule> {
    let mut matching: Vec<&Rule> = self.rules.iter().filter(|r| r.source_for(target).is_some()).collect();
    matching.sort_by_key(|r| std::cmp::Reverse(r.target_ext.len()));
    matching
  }

  /// Find how to produce `target`.
  ///
  /// Returns the chain of derivations leaf first: the first entry reads an
  /// available file and the last one produces `target`. `None` if no chain of
  /// at most [`MAX_CHAIN_DEPTH`] rules reaches an available source.
  pub fn resolve(&self, target: &str, available: &dyn Fn(&str) -> bool) -> Option<Vec<Derivation>> {
    self.resolve_depth(target, available, 1)
  }

  fn resolve_depth(&self, target: &str, available: &dyn Fn(&str) -> bool, depth: usize) -> Option<Vec<Derivation>> {
    let candidates = self.candidates(target);

    for rule in &candidates {
      if let Some(source) = rule.source_for(target)
        && available(&source)
      {
        return Some(vec![derivation(rule, target, source)]);
      }
    }

    if depth >= MAX_CHAIN_DEPTH {
      return None;
    }

    for rule in &candidates {
      let Some(source) = rule.source_for(target) else {
        continue;
      };
      if let Some(mut chain) = self.resolve_depth(&source, available, depth + 1) {
        debug!(target = %target, via = %source, "resolved through rule chain");
        chain.push(derivation(rule, target, source));
        return Some(chain);
      }
    }

    None
  }
}

fn derivation(rule: &Rule, target: &str, source: String) -> Derivation {
  Derivation {
    output: target.to_string(),
    source,
    action: rule.action.clone(),
  }
}
