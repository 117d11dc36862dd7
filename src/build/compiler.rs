//! External shader compiler invocation.
//!
//! The compiler is an opaque process: `<program> <optimization> <source> -o <output>`.
//! Exit status 0 is success; anything else is a failure whose diagnostics
//! are the captured stderr.
//!
//! Every failure, including a compiler that cannot be launched, is folded
//! into [`CompileOutcome::Failure`] so one shader never aborts the batch.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Result of compiling one shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The output was produced
    Success,
    /// Compilation failed, with diagnostics
    Failure(String),
}

impl CompileOutcome {
    /// Whether compilation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Success)
    }
}

/// Something that turns a shader source into a compiled output.
pub trait ShaderCompiler: Send + Sync {
    /// Compile `source` into `output`.
    fn compile(&self, source: &Path, output: &Path) -> CompileOutcome;
}

/// Create the directory holding `output`.
///
/// Safe to call concurrently for outputs that share a parent directory.
pub fn ensure_parent_dir(output: &Path) -> std::io::Result<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => match fs::create_dir_all(parent) {
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && parent.is_dir() => Ok(()),
            other => other,
        },
        _ => Ok(()),
    }
}

/// Compiler that runs an external executable such as `glslc`.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    optimization: String,
}

impl CommandCompiler {
    /// Create a compiler for `program` passing `optimization` first.
    ///
    /// An empty optimization flag is omitted from the command line.
    pub fn new(program: impl Into<PathBuf>, optimization: impl Into<String>) -> Self {
        Self { program: program.into(), optimization: optimization.into() }
    }

    /// The compiler executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed for one shader.
    pub fn args(&self, source: &Path, output: &Path) -> Vec<OsString> {
        let mut args = Vec::with_capacity(4);
        if !self.optimization.is_empty() {
            args.push(OsString::from(&self.optimization));
        }
        args.push(source.as_os_str().to_owned());
        args.push(OsString::from("-o"));
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Render the command line for display.
    pub fn command_line(&self, source: &Path, output: &Path) -> String {
        std::iter::once(self.program.as_os_str().to_owned())
            .chain(self.args(source, output))
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ShaderCompiler for CommandCompiler {
    fn compile(&self, source: &Path, output: &Path) -> CompileOutcome {
        if let Err(e) = ensure_parent_dir(output) {
            return CompileOutcome::Failure(format!("Failed to create output directory: {}", e));
        }

        debug!(command = %self.command_line(source, output), "invoking compiler");

        let result = Command::new(&self.program).args(self.args(source, output)).output();

        match result {
            Ok(out) if out.status.success() => CompileOutcome::Success,
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                let stdout = String::from_utf8_lossy(&out.stdout).trim().to_string();
                let diagnostics = if !stderr.is_empty() {
                    stderr
                } else if !stdout.is_empty() {
                    stdout
                } else {
                    format!("{} exited with {}", self.program.display(), out.status)
                };
                CompileOutcome::Failure(diagnostics)
            }
            Err(e) => CompileOutcome::Failure(format!(
                "Failed to run {}: {}",
                self.program.display(),
                e
            )),
        }
    }
}
