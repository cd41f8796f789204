//! Implementation of the `extbuild env` command.

use anyhow::Result;
use serde::Serialize;

use extbuild_lib::platform::platform_triple;
use extbuild_lib::{DefaultSettings, Environment, Setting};

use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Serialize)]
struct EnvReport<'a> {
  platform: Option<String>,
  settings: &'a Environment,
}

pub fn cmd_env(output: OutputFormat) -> Result<()> {
  let report = EnvReport {
    platform: platform_triple(),
    settings: DefaultSettings::get(),
  };

  if output.is_json() {
    return print_json(&report);
  }

  print_info(&format!(
    "Defaults for {}",
    report.platform.as_deref().unwrap_or("an unknown platform")
  ));
  for (key, value) in report.settings.iter() {
    print_stat(key, &display_setting(value));
  }

  Ok(())
}

fn display_setting(value: &Setting) -> String {
  match value {
    Setting::Str(s) => format!("{s:?}"),
    Setting::Bool(b) => b.to_string(),
    Setting::List(items) => format!("[{}]", items.join(", ")),
  }
}
