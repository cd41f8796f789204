//! Built-in command recipes.
//!
//! Each recipe is a [`CommandSpec`] whose input and output positions are
//! placeholders; synthesizing it against a task's environment yields the
//! template a rule or file node runs.

use tracing::debug;

use crate::action::Action;
use crate::command::CommandSpec;
use crate::placeholder::{INPUTS, OUT, SOURCE};
use crate::settings::{Environment, SettingKey, SettingsError};

use super::{Rule, RuleSet};

/// `cc cflags cppflags -D<defines> -I<includedirs> -I<topdir> -c -o OUT SRC`
pub fn compile_c() -> CommandSpec {
  CommandSpec::new()
    .setting(SettingKey::Cc)
    .setting(SettingKey::Cflags)
    .setting(SettingKey::Cppflags)
    .prefixed("-D", SettingKey::Defines)
    .prefixed("-I", SettingKey::Includedirs)
    .prefixed("-I", SettingKey::Topdir)
    .literal("-c")
    .literal("-o")
    .literal(OUT)
    .literal(SOURCE)
}

/// `cxx cxxflags cppflags -D<defines> -I<includedirs> -I<topdir> -o OUT -c SRC`
pub fn compile_cxx() -> CommandSpec {
  CommandSpec::new()
    .setting(SettingKey::Cxx)
    .setting(SettingKey::Cxxflags)
    .setting(SettingKey::Cppflags)
    .prefixed("-D", SettingKey::Defines)
    .prefixed("-I", SettingKey::Includedirs)
    .prefixed("-I", SettingKey::Topdir)
    .literal("-o")
    .literal(OUT)
    .literal("-c")
    .literal(SOURCE)
}

/// `ldshared -L<libdirs> -o OUT OBJECTS -l<link_libs> libs dlibs`
pub fn link<I, S>(link_libs: I) -> CommandSpec
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  link_inputs([INPUTS.to_string()], link_libs)
}

/// Like [`link`], but only the first `count` prerequisites are objects.
pub fn link_first<I, S>(count: usize, link_libs: I) -> CommandSpec
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  link_inputs((0..count).map(|i| format!("$${{in:{i}}}")), link_libs)
}

fn link_inputs<I, S>(inputs: impl IntoIterator<Item = String>, link_libs: I) -> CommandSpec
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  let mut spec = CommandSpec::new()
    .setting(SettingKey::Ldshared)
    .prefixed("-L", SettingKey::Libdirs)
    .literal("-o")
    .literal(OUT);
  for input in inputs {
    spec = spec.literal(input);
  }
  spec
    .prefixed_items("-l", link_libs)
    .setting(SettingKey::Libs)
    .setting(SettingKey::Dlibs)
}

/// `swig swig_flags -I<swig_includedirs> -I<includedirs> -o OUT SRC`
pub fn generate_wrapper() -> CommandSpec {
  CommandSpec::new()
    .setting(SettingKey::Swig)
    .setting(SettingKey::SwigFlags)
    .prefixed("-I", SettingKey::SwigIncludedirs)
    .prefixed("-I", SettingKey::Includedirs)
    .literal("-o")
    .literal(OUT)
    .literal(SOURCE)
}

/// Register an object rule for every C and C++ extension the environment
/// recognizes. Returns how many rules were new.
pub fn register_compile_rules(rules: &mut RuleSet, env: &Environment) -> Result<usize, SettingsError> {
  let objext = format!(".{}", env.get_str(&SettingKey::Objext)?);
  let c_action = Action::exec(compile_c().synthesize(env)?);
  let cxx_action = Action::exec(compile_cxx().synthesize(env)?);

  let mut added = 0;
  for ext in env.get_list(&SettingKey::CExts)? {
    added += usize::from(rules.register(Rule::new(format!(".{ext}"), objext.clone(), c_action.clone())));
  }
  for ext in env.get_list(&SettingKey::CppExts)? {
    added += usize::from(rules.register(Rule::new(format!(".{ext}"), objext.clone(), cxx_action.clone())));
  }

  debug!(added, total = rules.len(), "compile rules registered");
  Ok(added)
}
