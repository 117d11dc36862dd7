//! Shader source discovery for the build system.
//!
//! Walks the source directory once per shader kind, in classification order,
//! so the resulting plan is grouped by kind and sorted by path within each
//! group. Files that match no shader suffix are never listed.

use crate::build::{BuildContext, BuildPlan, ShaderKind, ShaderTarget};
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Error during source discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The source directory does not exist
    SourceRootNotFound(PathBuf),
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::SourceRootNotFound(path) => {
                write!(f, "Source directory not found: {}", path.display())
            }
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Discover shader sources of one kind under `src_dir`.
///
/// # Returns
/// Matching file paths, sorted.
pub fn discover_files(src_dir: &Path, kind: ShaderKind) -> Result<Vec<PathBuf>, DiscoveryError> {
    let pattern = format!(
        "{}/**/*{}",
        Pattern::escape(&src_dir.to_string_lossy()),
        Pattern::escape(kind.suffix())
    );

    let paths = glob(&pattern).map_err(|e| DiscoveryError::InvalidPattern(pattern.clone(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                // Unreadable directories are skipped, not fatal
                warn!(error = %e, "error reading path during discovery");
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Discover every shader under the context's source directory.
pub fn discover_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    let src_dir = ctx.src_dir();
    if !src_dir.is_dir() {
        return Err(DiscoveryError::SourceRootNotFound(src_dir));
    }

    let mut all = Vec::new();
    for kind in ShaderKind::ALL {
        all.extend(discover_files(&src_dir, kind)?);
    }
    Ok(all)
}

/// Create a build plan from the discovered sources.
///
/// Each source maps to exactly one output under the output directory.
pub fn create_build_plan(ctx: &BuildContext) -> Result<BuildPlan, DiscoveryError> {
    let src_dir = ctx.src_dir();
    let out_dir = ctx.out_dir();

    let plan: BuildPlan = discover_sources(ctx)?
        .into_iter()
        .filter_map(|source| ShaderTarget::from_source(&src_dir, &out_dir, source))
        .collect();

    debug!(targets = plan.len(), src = %src_dir.display(), "discovered shaders");
    Ok(plan)
}
