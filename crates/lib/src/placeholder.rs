//! Placeholder parsing and substitution for command templates.
//!
//! Rule actions are synthesized before anyone knows which file they will be
//! asked to produce. Their command lines carry placeholders that are filled in
//! when the engine fires the action:
//!
//! - `$${out}` - the artifact being produced
//! - `$${source}` - its first prerequisite (the file the rule transforms)
//! - `$${in}` - every prerequisite, space-separated
//! - `$${in:N}` - the prerequisite at index N
//!
//! # Shell Variables
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$HOME` and `$PATH` work naturally without any escaping.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use extbuild_lib::placeholder::{parse, Segment, Placeholder};
//!
//! let segments = parse("cc -c -o $${out} $${source}").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Literal("cc -c -o ".to_string()),
//!     Segment::Placeholder(Placeholder::Out),
//!     Segment::Literal(" ".to_string()),
//!     Segment::Placeholder(Placeholder::Source),
//! ]);
//! ```

use std::borrow::Cow;

use thiserror::Error;

/// Placeholder for the artifact being produced.
pub const OUT: &str = "$${out}";

/// Placeholder for the primary prerequisite.
pub const SOURCE: &str = "$${source}";

/// Placeholder for all prerequisites.
pub const INPUTS: &str = "$${in}";

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${out}`
  Out,

  /// `$${source}`
  Source,

  /// `$${in}`
  Inputs,

  /// `$${in:N}`
  Input(usize),
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be resolved
  Placeholder(Placeholder),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("invalid input index: {0}")]
  InvalidInputIndex(String),

  #[error("unresolved input: index {0}")]
  UnresolvedInput(usize),

  #[error("action has no prerequisites to use as its source")]
  NoSource,
}

/// Trait for resolving placeholder values when an action fires.
pub trait Resolver {
  /// The artifact being produced.
  fn resolve_out(&self) -> Result<&str, PlaceholderError>;

  /// The prerequisite at `index`.
  fn resolve_input(&self, index: usize) -> Result<&str, PlaceholderError>;

  /// All prerequisites joined by spaces.
  fn resolve_inputs(&self) -> Result<Cow<'_, str>, PlaceholderError>;

  /// The primary prerequisite.
  fn resolve_source(&self) -> Result<&str, PlaceholderError> {
    self.resolve_input(0).map_err(|_| PlaceholderError::NoSource)
  }
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is malformed (unclosed, unknown type, etc.)
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();

        match chars.peek() {
          Some((_, '$')) => {
            chars.next();

            match chars.peek() {
              Some((_, '{')) => {
                // $$${ -> literal $${
                literal.push_str("$${");
                chars.next();
              }
              _ => literal.push_str("$$$"),
            }
          }
          Some((_, '{')) => {
            chars.next();

            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut content = String::new();
            let mut found_close = false;

            for (_, c) in chars.by_ref() {
              if c == '}' {
                found_close = true;
                break;
              }
              content.push(c);
            }

            if !found_close {
              return Err(PlaceholderError::Unclosed(pos));
            }

            segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
          }
          _ => literal.push_str("$$"),
        }
      }
      // lone $, shell variables pass through
      _ => literal.push('$'),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content inside a placeholder (everything between `${` and `}`).
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  match content {
    "out" => Ok(Placeholder::Out),
    "source" => Ok(Placeholder::Source),
    "in" => Ok(Placeholder::Inputs),
    _ => match content.split_once(':') {
      Some(("in", index)) => index
        .parse::<usize>()
        .map(Placeholder::Input)
        .map_err(|_| PlaceholderError::InvalidInputIndex(index.to_string())),
      Some((kind, _)) => Err(PlaceholderError::UnknownType(kind.to_string())),
      None => Err(PlaceholderError::UnknownType(content.to_string())),
    },
  }
}

/// Substitute all placeholders in a string using the provided resolver.
///
/// # Errors
///
/// Returns an error if parsing fails or if any placeholder cannot be resolved.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(p) => match p {
        Placeholder::Out => result.push_str(resolver.resolve_out()?),
        Placeholder::Source => result.push_str(resolver.resolve_source()?),
        Placeholder::Inputs => result.push_str(&resolver.resolve_inputs()?),
        Placeholder::Input(index) => result.push_str(resolver.resolve_input(*index)?),
      },
    }
  }

  Ok(result)
}
