//! Build target definitions.
//!
//! A build target pairs one shader source with the single output path it
//! compiles to. Output paths mirror the source's directory relative to the
//! source root.

use crate::build::ShaderKind;
use std::path::{Path, PathBuf};

/// A shader source and the output it compiles to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTarget {
    /// Source path relative to the source root, with `/` separators
    pub id: String,
    /// Pipeline stage of the source
    pub kind: ShaderKind,
    /// Absolute source path
    pub source: PathBuf,
    /// Absolute output path
    pub output: PathBuf,
}

impl ShaderTarget {
    /// Create a target for a source file under `src_root`.
    ///
    /// Returns `None` if the file is not a recognized shader or does not live
    /// under `src_root`.
    pub fn from_source(src_root: &Path, out_root: &Path, source: PathBuf) -> Option<Self> {
        let kind = ShaderKind::classify_path(&source)?;
        let output = output_path(src_root, out_root, &source, kind)?;
        let id = source
            .strip_prefix(src_root)
            .ok()?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Some(Self { id, kind, source, output })
    }

    /// File name of the output.
    pub fn output_name(&self) -> String {
        self.output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.clone())
    }
}

impl std::fmt::Display for ShaderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.kind)
    }
}

/// Compute the output path for a source.
///
/// `src/post/blur.comp.glsl` under `src` maps to `out/post/blur.comp.spv`.
pub fn output_path(
    src_root: &Path,
    out_root: &Path,
    source: &Path,
    kind: ShaderKind,
) -> Option<PathBuf> {
    let rel = source.strip_prefix(src_root).ok()?;
    let file_name = rel.file_name()?.to_str()?;
    let rel_dir = rel.parent().unwrap_or(Path::new(""));
    Some(out_root.join(rel_dir).join(kind.output_file_name(file_name)))
}

/// An ordered set of targets to build.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    targets: Vec<ShaderTarget>,
}

impl BuildPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target to the plan.
    pub fn add_target(&mut self, target: ShaderTarget) {
        self.targets.push(target);
    }

    /// Targets in build order.
    pub fn targets(&self) -> &[ShaderTarget] {
        &self.targets
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the plan has no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<ShaderTarget> for BuildPlan {
    fn from_iter<I: IntoIterator<Item = ShaderTarget>>(iter: I) -> Self {
        Self { targets: iter.into_iter().collect() }
    }
}
