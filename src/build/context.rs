//! Build context containing configuration and state for a build.

use crate::config::GlslConfig;
use std::path::{Path, PathBuf};

/// Default number of parallel jobs (uses available parallelism).
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Build context containing configuration and paths for a build operation.
///
/// Relative paths in the configuration are resolved against the project
/// root (the directory holding `glslbuild.toml`, or the working directory).
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: GlslConfig,
    /// Project root directory
    project_root: PathBuf,
    /// Whether to rebuild every shader regardless of timestamps
    force: bool,
}

impl BuildContext {
    /// Create a new build context.
    ///
    /// # Arguments
    /// - `config` - The loaded configuration
    /// - `project_root` - The project root directory, made absolute against
    ///   the working directory when relative
    pub fn new(config: GlslConfig, project_root: PathBuf) -> Self {
        let project_root = std::path::absolute(&project_root).unwrap_or(project_root);
        Self { config, project_root, force: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GlslConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source directory (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Compiler executable.
    ///
    /// Bare names such as `glslc` are left for `PATH` lookup; anything with a
    /// directory component is resolved against the project root.
    pub fn compiler_path(&self) -> PathBuf {
        let path = &self.config.compiler.path;
        if path.components().count() > 1 {
            self.resolve_path(path)
        } else {
            path.clone()
        }
    }

    /// Optimization flag passed to the compiler.
    pub fn optimization(&self) -> &str {
        &self.config.compiler.optimization
    }

    /// Number of parallel jobs to use.
    pub fn jobs(&self) -> usize {
        match self.config.build.jobs {
            0 => default_jobs(),
            n => n,
        }
    }

    /// Whether fail-fast is enabled in the configuration.
    pub fn is_fail_fast(&self) -> bool {
        self.config.build.fail_fast
    }

    /// Whether every shader is rebuilt regardless of timestamps.
    pub fn is_force(&self) -> bool {
        self.force
    }

    /// Set force mode.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::include::normalize(&crate::config::loader::resolve_path(&self.project_root, path))
    }
}
