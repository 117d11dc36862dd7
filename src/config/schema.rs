//! Configuration schema types for `glslbuild.toml`
//!
//! Defines the structure and validation rules for shader project configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project layout section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Source directory scanned for shaders
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Output directory mirrored from `src`
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { src: default_src(), out: default_out() }
    }
}

fn default_src() -> PathBuf {
    PathBuf::from("shaders")
}

fn default_out() -> PathBuf {
    PathBuf::from("build/shaders")
}

/// External compiler section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Compiler executable (looked up on `PATH` when not a path)
    #[serde(default = "default_compiler")]
    pub path: PathBuf,
    /// Optimization flag passed before the source path (empty to omit)
    #[serde(default = "default_optimization")]
    pub optimization: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { path: default_compiler(), optimization: default_optimization() }
    }
}

fn default_compiler() -> PathBuf {
    PathBuf::from("glslc")
}

fn default_optimization() -> String {
    "-O".to_string()
}

/// Build behavior section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Number of parallel compile jobs (0 = available parallelism)
    #[serde(default)]
    pub jobs: usize,
    /// Stop starting new compilations after the first failure
    #[serde(default)]
    pub fail_fast: bool,
}

/// Complete glslbuild.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlslConfig {
    /// Source and output layout
    #[serde(default)]
    pub project: ProjectConfig,
    /// Compiler invocation
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Build behavior
    #[serde(default)]
    pub build: BuildConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "compiler.path")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "glslbuild.toml: '{}' {}", self.field, self.message)
    }
}

impl GlslConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.compiler.path.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "compiler.path".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if self.project.src.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "project.src".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if self.project.out.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "project.out".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if !self.project.src.as_os_str().is_empty() && self.project.src == self.project.out {
            errors.push(ConfigValidationError {
                field: "project.out".to_string(),
                message: "must differ from project.src".to_string(),
            });
        }

        if self.compiler.optimization.chars().any(char::is_whitespace) {
            errors.push(ConfigValidationError {
                field: "compiler.optimization".to_string(),
                message: "must be a single argument without whitespace".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
