mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use extbuild_lib::manifest::BUILD_FILE;

use crate::cmd::{cmd_build, cmd_clean, cmd_env, cmd_plan};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "extbuild")]
#[command(author, version, about = "Build native extension libraries from a declarative task file")]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Build file to load
  #[arg(short, long, global = true, default_value = BUILD_FILE)]
  file: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the steps a build would run, without running them
  Plan {
    /// Tasks or files to plan (default: every task)
    targets: Vec<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Build tasks or files
  Build {
    /// Tasks or files to build (default: every task)
    targets: Vec<String>,
  },

  /// Remove intermediate files (objects, generated sources)
  Clean,

  /// Remove intermediate files and built libraries
  Clobber,

  /// Show the default build settings for this host
  Env {
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Plan { targets, format } => cmd_plan(&cli.file, &targets, format),
    Commands::Build { targets } => cmd_build(&cli.file, &targets),
    Commands::Clean => cmd_clean(&cli.file, false),
    Commands::Clobber => cmd_clean(&cli.file, true),
    Commands::Env { format } => cmd_env(format),
  }
}
