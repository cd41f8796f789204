//! The default settings table.
//!
//! Seeded from the host platform, then from the toolchain variables in the
//! process environment (`CC`, `CXX`, `CFLAGS`, ...), the same variables a
//! Makefile-driven build would honor.

use tracing::debug;

use super::{Environment, Setting, SettingKey};
use crate::platform::os::Os;

/// Process environment variables that override a string default.
pub const ENV_OVERRIDES: &[(&str, SettingKey)] = &[
  ("CC", SettingKey::Cc),
  ("CXX", SettingKey::Cxx),
  ("CFLAGS", SettingKey::Cflags),
  ("CXXFLAGS", SettingKey::Cxxflags),
  ("CPPFLAGS", SettingKey::Cppflags),
  ("LDSHARED", SettingKey::Ldshared),
  ("LIBS", SettingKey::Libs),
  ("SWIG", SettingKey::Swig),
];

/// Build the defaults for the running host.
pub fn host_defaults() -> Environment {
  build_defaults(Os::current(), |name| std::env::var(name).ok())
}

/// Build the defaults for `os`, reading overrides through `var`.
///
/// An unsupported OS falls back to the Unix conventions.
pub fn build_defaults(os: Option<Os>, var: impl Fn(&str) -> Option<String>) -> Environment {
  let os = os.unwrap_or(Os::Linux);
  let mut env = Environment::new();

  env.set(SettingKey::Cc, os.c_compiler());
  env.set(SettingKey::Cxx, os.cxx_compiler());
  env.set(SettingKey::Cflags, os.pic_flags());
  env.set(SettingKey::Cxxflags, os.pic_flags());
  env.set(SettingKey::Cppflags, "");
  env.set(SettingKey::Ldshared, os.shared_linker());
  env.set(SettingKey::Libs, "");
  env.set(SettingKey::Dlibs, "");
  env.set(SettingKey::Objext, os.object_ext());
  env.set(SettingKey::Dlext, os.shared_lib_ext());

  env.set(SettingKey::CExts, ["c"]);
  env.set(SettingKey::CppExts, ["cc", "cxx", "cpp"]);
  env.set(SettingKey::Defines, Setting::List(Vec::new()));
  env.set(SettingKey::Includedirs, Setting::List(Vec::new()));
  env.set(SettingKey::Libdirs, Setting::List(Vec::new()));

  env.set(SettingKey::Swig, "swig");
  env.set(SettingKey::Swigext, "i");
  env.set(SettingKey::SwigCppext, "_wrap.cc");
  env.set(SettingKey::SwigFlags, ["-ruby", "-c++"]);
  env.set(SettingKey::SwigIncludedirs, ["."]);

  for (name, key) in ENV_OVERRIDES {
    if let Some(value) = var(*name) {
      debug!(variable = *name, setting = %key, "default overridden from environment");
      env.set(key.clone(), value);
    }
  }

  env
}
