//! Incremental build support.
//!
//! Decides whether a compiled shader is out of date by comparing
//! modification times. The output files on disk are the only state carried
//! between runs; nothing else is cached.
//!
//! # How It Works
//!
//! For each shader:
//!
//! 1. A missing output is stale (includes are not resolved)
//! 2. A source at least as new as the output is stale
//! 3. The transitive `#include` closure is resolved; if any include cannot
//!    be read the shader is treated as stale
//! 4. Any include at least as new as the output makes the shader stale
//!
//! An output is fresh only when it is strictly newer than the source and
//! every include.

use crate::build::ShaderTarget;
use crate::include::{resolve_includes, IncludeWarning};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why a shader does or does not need to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The output does not exist
    Missing,
    /// The source was modified after the output was produced
    SourceNewer,
    /// An included file was modified after the output was produced
    DependencyNewer(PathBuf),
    /// Timestamps or includes could not be checked
    Unresolved(String),
    /// Rebuild requested regardless of timestamps
    Forced,
    /// The output is up to date
    Fresh,
}

impl Staleness {
    /// Whether the shader must be rebuilt.
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::Fresh)
    }
}

impl std::fmt::Display for Staleness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Staleness::Missing => write!(f, "output missing"),
            Staleness::SourceNewer => write!(f, "source changed"),
            Staleness::DependencyNewer(path) => write!(f, "include changed: {}", path.display()),
            Staleness::Unresolved(reason) => write!(f, "dependencies unresolved: {}", reason),
            Staleness::Forced => write!(f, "forced rebuild"),
            Staleness::Fresh => write!(f, "up to date"),
        }
    }
}

/// Result of a staleness check, with any include warnings encountered.
#[derive(Debug, Clone)]
pub struct StalenessCheck {
    /// The verdict
    pub staleness: Staleness,
    /// Included files that could not be read
    pub warnings: Vec<IncludeWarning>,
}

impl StalenessCheck {
    fn verdict(staleness: Staleness) -> Self {
        Self { staleness, warnings: Vec::new() }
    }

    /// Whether the shader must be rebuilt.
    pub fn is_stale(&self) -> bool {
        self.staleness.is_stale()
    }
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Check whether `output` is stale relative to `source` and its includes.
pub fn needs_rebuild(source: &Path, output: &Path) -> StalenessCheck {
    let target_time = match fs::metadata(output) {
        Ok(meta) => match meta.modified() {
            Ok(time) => time,
            Err(e) => return StalenessCheck::verdict(Staleness::Unresolved(e.to_string())),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return StalenessCheck::verdict(Staleness::Missing)
        }
        Err(e) => return StalenessCheck::verdict(Staleness::Unresolved(e.to_string())),
    };

    match modified(source) {
        Ok(time) if time >= target_time => return StalenessCheck::verdict(Staleness::SourceNewer),
        Ok(_) => {}
        Err(e) => return StalenessCheck::verdict(Staleness::Unresolved(e.to_string())),
    }

    let includes = match resolve_includes(source) {
        Ok(includes) => includes,
        Err(e) => return StalenessCheck::verdict(Staleness::Unresolved(e.to_string())),
    };

    let warnings = includes.warnings().to_vec();
    if let Some(first) = warnings.first() {
        let reason = format!("cannot read {}", first.file.display());
        return StalenessCheck { staleness: Staleness::Unresolved(reason), warnings };
    }

    for dep in includes.files() {
        match modified(dep) {
            Ok(time) if time >= target_time => {
                return StalenessCheck::verdict(Staleness::DependencyNewer(dep.to_path_buf()))
            }
            Ok(_) => {}
            Err(e) => {
                return StalenessCheck::verdict(Staleness::Unresolved(format!(
                    "{}: {}",
                    dep.display(),
                    e
                )))
            }
        }
    }

    StalenessCheck::verdict(Staleness::Fresh)
}

/// Check a build target, honoring force mode.
pub fn check_target(target: &ShaderTarget, force: bool) -> StalenessCheck {
    if force {
        return StalenessCheck::verdict(Staleness::Forced);
    }
    needs_rebuild(&target.source, &target.output)
}
