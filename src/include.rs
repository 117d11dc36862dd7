//! `#include` dependency resolution for GLSL sources
//!
//! Scans shader sources for `#include "path"` directives and computes the
//! transitive closure of included files. Paths are resolved relative to the
//! including file's directory.
//!
//! Traversal uses an explicit work list with a visited set, so circular and
//! diamond-shaped include graphs are scanned once per file and never recurse
//! on the call stack.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{trace, warn};

/// Error type for include resolution failures.
///
/// Only failures on the shader being resolved are errors. Problems with
/// transitively included files are reported as [`IncludeWarning`]s.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IncludeError {
    /// The shader source itself could not be read
    #[error("Failed to read shader source '{}': {1}", .0.display())]
    SourceUnreadable(PathBuf, String),
    /// The shader path could not be made absolute
    #[error("Invalid shader path '{}': {1}", .0.display())]
    InvalidPath(PathBuf, String),
}

/// A non-fatal problem with an included file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeWarning {
    /// The included file that could not be read
    pub file: PathBuf,
    /// The file containing the directive
    pub included_from: PathBuf,
    /// Line of the directive (1-indexed)
    pub line: usize,
    /// Underlying error message
    pub message: String,
}

impl std::fmt::Display for IncludeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: cannot read include '{}': {}",
            self.included_from.display(),
            self.line,
            self.file.display(),
            self.message
        )
    }
}

/// Transitive include closure of a shader source.
#[derive(Debug, Clone, Default)]
pub struct IncludeSet {
    files: BTreeSet<PathBuf>,
    warnings: Vec<IncludeWarning>,
}

impl IncludeSet {
    /// All transitively included files, sorted and deduplicated.
    ///
    /// Files that could not be read are still listed here; see
    /// [`IncludeSet::warnings`].
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Warnings for included files that could not be read.
    pub fn warnings(&self) -> &[IncludeWarning] {
        &self.warnings
    }

    /// Whether any included file could not be read.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether a path is part of the closure.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Number of files in the closure.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the closure is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A discovered include that has not been scanned yet.
struct Pending {
    path: PathBuf,
    included_from: PathBuf,
    line: usize,
}

fn include_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^#\s*include\s*"([^"]+)""#).expect("valid include regex"))
}

/// Extract the quoted path from an include directive.
///
/// Leading whitespace is ignored. Angle-bracket includes and lines that are
/// not include directives return `None`.
///
/// ```
/// use glslbuild::include::parse_include_directive;
///
/// assert_eq!(parse_include_directive("  #include \"common.glsl\""), Some("common.glsl"));
/// assert_eq!(parse_include_directive("#include <builtin.glsl>"), None);
/// ```
pub fn parse_include_directive(line: &str) -> Option<&str> {
    include_pattern()
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolve the full transitive include closure of a shader source.
///
/// The source itself is never part of its own closure, even when an include
/// cycle leads back to it.
pub fn resolve_includes(source: &Path) -> Result<IncludeSet, IncludeError> {
    let source = absolute(source)?;
    let text = fs::read_to_string(&source)
        .map_err(|e| IncludeError::SourceUnreadable(source.clone(), e.to_string()))?;

    let mut set = IncludeSet::default();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(source.clone());

    let mut queue = VecDeque::new();
    enqueue_directives(&source, &text, &mut visited, &mut set, &mut queue);

    while let Some(pending) = queue.pop_front() {
        match fs::read_to_string(&pending.path) {
            Ok(text) => {
                enqueue_directives(&pending.path, &text, &mut visited, &mut set, &mut queue)
            }
            Err(e) => {
                warn!(
                    file = %pending.path.display(),
                    included_from = %pending.included_from.display(),
                    line = pending.line,
                    error = %e,
                    "cannot read included file"
                );
                set.warnings.push(IncludeWarning {
                    file: pending.path,
                    included_from: pending.included_from,
                    line: pending.line,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(set)
}

/// List the files a source includes directly, in directive order.
///
/// Duplicate directives are reported once.
pub fn direct_includes(source: &Path) -> Result<Vec<PathBuf>, IncludeError> {
    let source = absolute(source)?;
    let text = fs::read_to_string(&source)
        .map_err(|e| IncludeError::SourceUnreadable(source.clone(), e.to_string()))?;
    let dir = source.parent().unwrap_or(Path::new("/"));

    let mut seen = HashSet::new();
    Ok(text
        .lines()
        .filter_map(parse_include_directive)
        .map(|rel| normalize(&dir.join(rel)))
        .filter(|path| seen.insert(path.clone()))
        .collect())
}

fn enqueue_directives(
    file: &Path,
    text: &str,
    visited: &mut HashSet<PathBuf>,
    set: &mut IncludeSet,
    queue: &mut VecDeque<Pending>,
) {
    let dir = file.parent().unwrap_or(Path::new("/"));
    for (idx, line) in text.lines().enumerate() {
        let Some(rel) = parse_include_directive(line) else {
            continue;
        };
        let path = normalize(&dir.join(rel));
        if !visited.insert(path.clone()) {
            continue;
        }
        trace!(file = %file.display(), include = %path.display(), "found include");
        set.files.insert(path.clone());
        queue.push_back(Pending { path, included_from: file.to_path_buf(), line: idx + 1 });
    }
}

fn absolute(path: &Path) -> Result<PathBuf, IncludeError> {
    std::path::absolute(path)
        .map(|p| normalize(&p))
        .map_err(|e| IncludeError::InvalidPath(path.to_path_buf(), e.to_string()))
}

/// Lexically remove `.` and `..` components.
///
/// Unlike `canonicalize`, this works for files that do not exist, which keeps
/// vanished includes in the closure.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root is the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        normalize(&path)
    }

    #[test]
    fn test_parse_include_directive() {
        assert_eq!(parse_include_directive("#include \"common.glsl\""), Some("common.glsl"));
        assert_eq!(parse_include_directive("\t  #include \"a/b.glsl\"  "), Some("a/b.glsl"));
        assert_eq!(parse_include_directive("# include \"spaced.glsl\""), Some("spaced.glsl"));
        assert_eq!(parse_include_directive("#include <system.glsl>"), None);
        assert_eq!(parse_include_directive("#include \"\""), None);
        assert_eq!(parse_include_directive("// #include \"commented.glsl\""), None);
        assert_eq!(parse_include_directive("#version 460"), None);
        assert_eq!(parse_include_directive(""), None);
    }

    #[test]
    fn test_resolve_no_includes() {
        let temp = TempDir::new().unwrap();
        let src = write(temp.path(), "a.vert.glsl", "#version 460\nvoid main() {}\n");

        let set = resolve_includes(&src).unwrap();
        assert!(set.is_empty());
        assert!(!set.has_warnings());
    }

    #[test]
    fn test_resolve_transitive() {
        let temp = TempDir::new().unwrap();
        let src = write(temp.path(), "a.vert.glsl", "#include \"b.glsl\"\n");
        let b = write(temp.path(), "b.glsl", "#include \"lib/c.glsl\"\n");
        let c = write(temp.path(), "lib/c.glsl", "float c() { return 1.0; }\n");

        let set = resolve_includes(&src).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&b));
        assert!(set.contains(&c));
    }

    #[test]
    fn test_resolve_relative_to_including_file() {
        let temp = TempDir::new().unwrap();
        let src = write(temp.path(), "shaders/a.frag.glsl", "#include \"../shared/util.glsl\"\n");
        let util = write(temp.path(), "shared/util.glsl", "#include \"math.glsl\"\n");
        let math = write(temp.path(), "shared/math.glsl", "");

        let set = resolve_includes(&src).unwrap();
        let files: Vec<_> = set.files().collect();
        assert_eq!(files, vec![math.as_path(), util.as_path()]);
    }

    #[test]
    fn test_resolve_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a.glsl", "#include \"b.glsl\"\n");
        let b = write(temp.path(), "b.glsl", "#include \"a.glsl\"\n");

        let set = resolve_includes(&a).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&b));
        assert!(!set.contains(&a));
    }

    #[test]
    fn test_resolve_diamond_counts_once() {
        let temp = TempDir::new().unwrap();
        let src = write(temp.path(), "a.comp.glsl", "#include \"l.glsl\"\n#include \"r.glsl\"\n");
        write(temp.path(), "l.glsl", "#include \"base.glsl\"\n");
        write(temp.path(), "r.glsl", "#include \"./base.glsl\"\n");
        write(temp.path(), "base.glsl", "");

        let set = resolve_includes(&src).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_missing_include_is_warning() {
        let temp = TempDir::new().unwrap();
        let src = write(temp.path(), "a.vert.glsl", "#include \"gone.glsl\"\n#include \"ok.glsl\"\n");
        let ok = write(temp.path(), "ok.glsl", "");

        let set = resolve_includes(&src).unwrap();
        assert!(set.contains(&ok));
        assert!(set.contains(&normalize(&temp.path().join("gone.glsl"))));
        assert_eq!(set.warnings().len(), 1);

        let warning = &set.warnings()[0];
        assert_eq!(warning.included_from, src);
        assert_eq!(warning.line, 1);
        assert!(warning.to_string().contains("gone.glsl"));
    }

    #[test]
    fn test_missing_source_is_error() {
        let temp = TempDir::new().unwrap();
        let result = resolve_includes(&temp.path().join("nope.vert.glsl"));
        assert!(matches!(result, Err(IncludeError::SourceUnreadable(_, _))));
    }

    #[test]
    fn test_direct_includes_only_first_level() {
        let temp = TempDir::new().unwrap();
        let src = write(
            temp.path(),
            "a.vert.glsl",
            "#include \"b.glsl\"\n#include \"b.glsl\"\n#include \"c.glsl\"\n",
        );
        let b = write(temp.path(), "b.glsl", "#include \"d.glsl\"\n");
        let c = write(temp.path(), "c.glsl", "");

        let direct = direct_includes(&src).unwrap();
        assert_eq!(direct, vec![b, c]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c.glsl")), PathBuf::from("/a/c.glsl"));
        assert_eq!(normalize(Path::new("/a/b/../../c")), PathBuf::from("/c"));
        assert_eq!(normalize(Path::new("/../c")), PathBuf::from("/c"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize(Path::new("../shaders")), PathBuf::from("../shaders"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("./../../x")), PathBuf::from("../../x"));
    }
}
