//! Build command implementations (build, check, deps, kinds)

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use serde_json::json;

use super::{OutputFormat, PathArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::{
    status_name, BuildContext, BuildPipeline, BuildResult, ConsoleProgress, JsonProgress,
    ProgressReporter, ShaderKind,
};
use crate::config::loader::{
    find_config, merge_cli_overrides, project_root, resolve_path, CliOverrides,
};
use crate::config::{default_config, load_config};
use crate::include::{direct_includes, resolve_includes};

/// Options of the build command beyond path selection.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub jobs: Option<usize>,
    pub force: bool,
    pub dry_run: bool,
    pub fail_fast: bool,
    pub format: OutputFormat,
    pub verbose: bool,
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load the configuration, apply command-line overrides and build a context.
///
/// Paths given on the command line are relative to the working directory;
/// paths in the config file are relative to the file's directory.
fn load_context(
    paths: &PathArgs,
    mut overrides: CliOverrides,
    verbose: bool,
) -> Result<BuildContext, ExitCode> {
    let cwd = current_dir();
    let config_path = paths.config.clone().or_else(find_config);

    let (mut config, root) = match config_path {
        Some(config_path) => {
            if verbose {
                eprintln!("Using config: {}", config_path.display());
            }
            let cfg = match load_config(Some(&config_path)) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return Err(ExitCode::from(EXIT_ERROR));
                }
            };
            let root = match project_root(&config_path) {
                Some(p) if !p.as_os_str().is_empty() => resolve_path(&cwd, p),
                _ => cwd.clone(),
            };
            (cfg, root)
        }
        None => {
            if verbose {
                eprintln!("No glslbuild.toml found, using defaults");
            }
            (default_config(), cwd.clone())
        }
    };

    overrides.src = paths.src.as_deref().map(|p| resolve_path(&cwd, p));
    overrides.out = paths.out.as_deref().map(|p| resolve_path(&cwd, p));
    overrides.compiler = paths.compiler.as_deref().map(|p| {
        if p.components().count() > 1 {
            resolve_path(&cwd, p)
        } else {
            p.to_path_buf()
        }
    });
    overrides.optimization = paths.optimization.clone();
    merge_cli_overrides(&mut config, &overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        for error in errors {
            eprintln!("Error: {}", error);
        }
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }

    Ok(BuildContext::new(config, root))
}

/// Run the build command
pub fn run_build(paths: &PathArgs, options: &BuildOptions) -> ExitCode {
    let overrides = CliOverrides {
        jobs: options.jobs,
        fail_fast: options.fail_fast.then_some(true),
        ..Default::default()
    };
    let context = match load_context(paths, overrides, options.verbose) {
        Ok(ctx) => ctx.with_force(options.force),
        Err(code) => return code,
    };

    let reporter: Arc<dyn ProgressReporter> = match options.format {
        OutputFormat::Text => Arc::new(ConsoleProgress::new().with_verbose(options.verbose)),
        OutputFormat::Json => Arc::new(JsonProgress::new()),
    };

    let pipeline =
        BuildPipeline::new(context).with_dry_run(options.dry_run).with_reporter(reporter);

    match pipeline.build() {
        Ok(result) => {
            match options.format {
                OutputFormat::Text => println!("{}", result.summary()),
                OutputFormat::Json => println!("{}", result_json(&result)),
            }
            if result.is_success() {
                ExitCode::from(EXIT_SUCCESS)
            } else {
                ExitCode::from(EXIT_ERROR)
            }
        }
        // Already reported as an error event
        Err(_) => ExitCode::from(EXIT_ERROR),
    }
}

/// Render a build result as a JSON document.
pub fn result_json(result: &BuildResult) -> serde_json::Value {
    let targets: Vec<_> = result
        .targets
        .iter()
        .map(|t| {
            let mut value = json!({
                "id": t.target_id,
                "kind": t.kind.stage(),
                "status": status_name(&t.status),
                "output": t.output.display().to_string(),
                "duration_ms": t.duration.as_millis() as u64,
                "reason": t.reason.as_ref().map(|r| r.to_string()),
            });
            if let crate::build::BuildStatus::Failed(err) = &t.status {
                value["error"] = json!(err);
            }
            value
        })
        .collect();

    json!({
        "success": result.is_success(),
        "compiled": result.compiled_count(),
        "failed": result.failed_count(),
        "up_to_date": result.skipped_count(),
        "skipped": result.excluded_count(),
        "pending": result.pending_count(),
        "cancelled": result.cancelled_count(),
        "duration_ms": result.total_duration.as_millis() as u64,
        "targets": targets,
    })
}

/// Run the check command
pub fn run_check(paths: &PathArgs, force: bool, verbose: bool) -> ExitCode {
    let context = match load_context(paths, CliOverrides::default(), verbose) {
        Ok(ctx) => ctx.with_force(force),
        Err(code) => return code,
    };

    let checks = match BuildPipeline::new(context).check() {
        Ok(checks) => checks,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut stale = 0;
    for (target, check) in &checks {
        for warning in &check.warnings {
            eprintln!("warning: {}", warning);
        }
        if check.is_stale() {
            stale += 1;
            println!("stale  {}  ({})", target.id, check.staleness);
        } else if verbose {
            println!("fresh  {}", target.id);
        }
    }
    println!("{} of {} shader(s) out of date", stale, checks.len());

    ExitCode::from(EXIT_SUCCESS)
}

/// Run the deps command
pub fn run_deps(file: &Path, direct: bool) -> ExitCode {
    let file = resolve_path(&current_dir(), file);

    if direct {
        return match direct_includes(&file) {
            Ok(includes) => {
                for include in includes {
                    println!("{}", include.display());
                }
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    match resolve_includes(&file) {
        Ok(includes) => {
            for include in includes.files() {
                println!("{}", include.display());
            }
            for warning in includes.warnings() {
                eprintln!("warning: {}", warning);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the kinds command
pub fn run_kinds() -> ExitCode {
    println!("{:<12} {:<24} OUTPUT", "SUFFIX", "STAGE");
    for kind in ShaderKind::ALL {
        println!(
            "{:<12} {:<24} {}",
            kind.suffix(),
            kind.stage(),
            kind.output_file_name(&format!("name{}", kind.suffix()))
        );
    }
    ExitCode::from(EXIT_SUCCESS)
}
