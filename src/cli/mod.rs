//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GLSLB_LOG";

/// glslb - Incremental GLSL to SPIR-V shader builds
#[derive(Parser)]
#[command(name = "glslb")]
#[command(about = "glslb - Compile GLSL shaders to SPIR-V, rebuilding only what changed")]
#[command(version)]
pub struct Cli {
    /// Verbose output (also raises the log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options locating sources, outputs and the compiler.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Override source directory
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Override output directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Override compiler executable
    #[arg(long)]
    pub compiler: Option<PathBuf>,

    /// Override optimization flag passed to the compiler (e.g. -O, -Os, -O0)
    #[arg(long = "opt", allow_hyphen_values = true)]
    pub optimization: Option<String>,

    /// Configuration file (default: search upward for glslbuild.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Output format for build progress and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON lines
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile stale shaders
    Build {
        #[command(flatten)]
        paths: PathArgs,

        /// Number of parallel jobs (default: available cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Rebuild every shader regardless of timestamps
        #[arg(short, long)]
        force: bool,

        /// Show what would be compiled without compiling
        #[arg(long)]
        dry_run: bool,

        /// Stop starting new compilations after the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Report which shaders are stale and why, without compiling
    Check {
        #[command(flatten)]
        paths: PathArgs,

        /// Treat every shader as stale
        #[arg(short, long)]
        force: bool,
    },

    /// Print the include dependencies of a shader
    Deps {
        /// Shader source file
        file: PathBuf,

        /// Only list includes written in the file itself
        #[arg(long)]
        direct: bool,
    },

    /// List recognized shader suffixes
    Kinds,
}

/// Install the tracing subscriber.
///
/// `GLSLB_LOG` takes precedence; otherwise the level is `warn`, or `debug`
/// when verbose.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { paths, jobs, force, dry_run, fail_fast, format } => {
            let options = build::BuildOptions {
                jobs,
                force,
                dry_run,
                fail_fast,
                format,
                verbose: cli.verbose,
            };
            build::run_build(&paths, &options)
        }
        Commands::Check { paths, force } => build::run_check(&paths, force, cli.verbose),
        Commands::Deps { file, direct } => build::run_deps(&file, direct),
        Commands::Kinds => build::run_kinds(),
    }
}
