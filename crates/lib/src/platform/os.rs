use std::fmt;

/// Operating system variants with a known extension toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// Extension of compiled object files, without the leading dot.
  pub fn object_ext(&self) -> &'static str {
    match self {
      Self::Linux | Self::MacOs => "o",
      Self::Windows => "obj",
    }
  }

  /// Extension of loadable extension libraries, without the leading dot.
  ///
  /// macOS extensions are bundles, not dylibs.
  pub fn shared_lib_ext(&self) -> &'static str {
    match self {
      Self::Linux => "so",
      Self::MacOs => "bundle",
      Self::Windows => "dll",
    }
  }

  /// Default C compiler.
  pub fn c_compiler(&self) -> &'static str {
    match self {
      Self::Linux | Self::MacOs => "cc",
      Self::Windows => "cl",
    }
  }

  /// Default C++ compiler.
  pub fn cxx_compiler(&self) -> &'static str {
    match self {
      Self::Linux | Self::MacOs => "c++",
      Self::Windows => "cl",
    }
  }

  /// Default command used to link objects into a loadable module.
  pub fn shared_linker(&self) -> &'static str {
    match self {
      Self::Linux => "cc -shared",
      Self::MacOs => "cc -bundle -undefined dynamic_lookup",
      Self::Windows => "link -dll",
    }
  }

  /// Flags every compile on this platform needs for position independent code.
  pub fn pic_flags(&self) -> &'static str {
    match self {
      Self::Linux | Self::MacOs => "-fPIC",
      Self::Windows => "",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Returns the current operating system
///
/// Returns `None` if the OS is not supported
pub fn os() -> Option<Os> {
  Os::current()
}
