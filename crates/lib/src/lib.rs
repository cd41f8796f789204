//! extbuild-lib: declarative build tasks for native extension modules
//!
//! This crate describes how a native extension library is built; it does not
//! schedule or skip work itself. The pieces are:
//! - `Environment`: the per-task table of build settings, copied from the
//!   process-wide defaults
//! - `CommandSpec`: structured option tokens synthesized into command lines
//! - `RuleSet`: extension-keyed transformation rules (source -> object,
//!   interface -> generated source)
//! - `ExtensionTask` / `SwigExtensionTask`: task descriptions that expand into
//!   file and task nodes on any [`engine::TaskEngine`]
//! - `engine::Graph`: a recording engine that orders and runs the emitted nodes

pub mod action;
pub mod artifact;
pub mod command;
pub mod engine;
pub mod execute;
pub mod manifest;
pub mod placeholder;
pub mod platform;
pub mod rule;
pub mod settings;
pub mod task;
pub mod tool;
pub mod util;

pub use artifact::{ArtifactClass, ArtifactRef};
pub use command::{CommandSpec, OptionToken};
pub use settings::{DefaultSettings, Environment, Setting, SettingKey};
pub use task::{ExtensionTask, SwigExtensionTask, TaskError, TaskSpec};
