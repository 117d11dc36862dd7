//! Build System Test Suite
//!
//! Integration tests for the shader build pipeline:
//!
//! - Discovery and output mirroring
//! - Incremental rebuilds through transitive includes
//! - Failure isolation, fail-fast and cancellation
//! - Dry runs and progress reporting

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use glslbuild::build::{
    BuildContext, BuildError, BuildPipeline, BuildResult, BuildStatus, CancelToken,
    CollectingProgress, CompileOutcome, ProgressEvent, ShaderCompiler, Staleness,
};
use glslbuild::config::default_config;

// ============================================================================
// Test Utilities
// ============================================================================

/// Compiler that writes a placeholder output and records every call.
///
/// Sources containing `#error` fail to compile.
#[derive(Default)]
struct RecordingCompiler {
    calls: Mutex<Vec<PathBuf>>,
    cancel_on_first: Option<CancelToken>,
}

impl RecordingCompiler {
    fn cancelling(token: CancelToken) -> Self {
        Self { calls: Mutex::new(Vec::new()), cancel_on_first: Some(token) }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn compiled_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl ShaderCompiler for RecordingCompiler {
    fn compile(&self, source: &Path, output: &Path) -> CompileOutcome {
        self.calls.lock().unwrap().push(source.to_path_buf());
        if let Some(token) = &self.cancel_on_first {
            token.cancel();
        }

        let text = fs::read_to_string(source).unwrap_or_default();
        if text.contains("#error") {
            return CompileOutcome::Failure(format!("{}:1: error: #error", source.display()));
        }

        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(output, b"\x03\x02\x23\x07").unwrap();
        CompileOutcome::Success
    }
}

/// A project with a `shaders/` source tree.
struct Project {
    temp: TempDir,
    compiler: Arc<RecordingCompiler>,
}

impl Project {
    fn new() -> Self {
        Self::with_compiler(RecordingCompiler::default())
    }

    fn with_compiler(compiler: RecordingCompiler) -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("shaders")).unwrap();
        Self { temp, compiler: Arc::new(compiler) }
    }

    fn src(&self, name: &str) -> PathBuf {
        self.temp.path().join("shaders").join(name)
    }

    fn out(&self, name: &str) -> PathBuf {
        self.temp.path().join("build/shaders").join(name)
    }

    /// Write a source file dated well in the past.
    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.src(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        set_mtime(&path, -120);
        path
    }

    /// Mark a source file as modified after the last build.
    fn touch(&self, name: &str) {
        set_mtime(&self.src(name), -30);
    }

    fn context(&self) -> BuildContext {
        BuildContext::new(default_config(), self.temp.path().to_path_buf())
    }

    fn pipeline(&self) -> BuildPipeline {
        BuildPipeline::new(self.context()).with_compiler(self.compiler.clone()).with_jobs(4)
    }

    /// Build, then pin every produced output between the sources and a touch.
    fn build(&self) -> BuildResult {
        self.compiler.reset();
        let result = self.pipeline().build().unwrap();
        for target in &result.targets {
            if target.output.exists() {
                set_mtime(&target.output, -60);
            }
        }
        result
    }
}

fn set_mtime(path: &Path, offset_secs: i64) {
    let now = SystemTime::now();
    let time = if offset_secs >= 0 {
        now + Duration::from_secs(offset_secs as u64)
    } else {
        now - Duration::from_secs(offset_secs.unsigned_abs())
    };
    File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_vertex_shader_with_common_include() {
    let project = Project::new();
    project.write("a.vert.glsl", "#include \"common.glsl\"\nvoid main() {}\n");
    project.write("common.glsl", "const float PI = 3.14159;\n");

    let result = project.build();
    assert_eq!(result.compiled_count(), 1);
    assert!(project.out("a.vert.spv").exists());
    assert!(!project.out("common.spv").exists());
    assert_eq!(project.compiler.compiled_names(), vec!["a.vert.glsl"]);

    let result = project.build();
    assert_eq!(result.compiled_count(), 0);
    assert_eq!(result.skipped_count(), 1);
    assert_eq!(project.compiler.call_count(), 0);

    project.touch("common.glsl");
    let result = project.build();
    assert_eq!(result.compiled_count(), 1);
    assert!(matches!(result.targets[0].reason, Some(Staleness::DependencyNewer(_))));
}

#[test]
fn test_unrecognized_files_ignored() {
    let project = Project::new();
    project.write("lit.frag.glsl", "void main() {}\n");
    project.write("common.glsl", "");
    project.write("README.md", "# shaders");
    project.write("notes.vert", "");
    project.write("old.vert.glsl.bak", "");
    project.write(".vert.glsl", "");

    let result = project.build();
    let ids: Vec<&str> = result.targets.iter().map(|t| t.target_id.as_str()).collect();
    assert_eq!(ids, vec!["lit.frag.glsl"]);
    assert_eq!(project.compiler.call_count(), 1);
}

#[test]
fn test_outputs_mirror_source_tree() {
    let project = Project::new();
    project.write("post/blur.comp.glsl", "");
    project.write("rt/hit.rchit.glsl", "");
    project.write("mesh/cluster.task.glsl", "");

    project.build();
    assert!(project.out("post/blur.comp.spv").exists());
    assert!(project.out("rt/hit.rchit.spv").exists());
    assert!(project.out("mesh/cluster.task.spv").exists());
}

#[test]
fn test_results_grouped_by_kind() {
    let project = Project::new();
    project.write("z.vert.glsl", "");
    project.write("b.frag.glsl", "");
    project.write("a.vert.glsl", "");
    project.write("c.comp.glsl", "");

    let result = project.build();
    let ids: Vec<&str> = result.targets.iter().map(|t| t.target_id.as_str()).collect();
    assert_eq!(ids, vec!["c.comp.glsl", "b.frag.glsl", "a.vert.glsl", "z.vert.glsl"]);
}

#[test]
fn test_missing_source_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let compiler = Arc::new(RecordingCompiler::default());
    let result = BuildPipeline::new(BuildContext::new(default_config(), temp.path().to_path_buf()))
        .with_compiler(compiler.clone())
        .build();

    assert!(matches!(result, Err(BuildError::SourceRootNotFound(_))));
    assert_eq!(compiler.call_count(), 0);
}

// ============================================================================
// Incremental Builds
// ============================================================================

#[test]
fn test_second_build_is_noop() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    project.write("b.frag.glsl", "");

    assert_eq!(project.build().compiled_count(), 2);

    let result = project.build();
    assert_eq!(result.compiled_count(), 0);
    assert_eq!(result.skipped_count(), 2);
    assert_eq!(result.summary_line(), "Build: 0 succeeded, 0 failed, 2 up-to-date, 0 skipped");
}

#[test]
fn test_source_change_rebuilds_only_that_shader() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    project.write("b.frag.glsl", "");
    project.build();

    project.touch("b.frag.glsl");
    let result = project.build();
    assert_eq!(result.compiled_count(), 1);
    assert_eq!(project.compiler.compiled_names(), vec!["b.frag.glsl"]);
}

#[test]
fn test_transitive_include_change_rebuilds() {
    let project = Project::new();
    project.write("a.frag.glsl", "#include \"lib/b.glsl\"\n");
    project.write("lib/b.glsl", "  #include \"../inc/c.glsl\"\n");
    project.write("inc/c.glsl", "");
    project.write("other.frag.glsl", "");
    project.build();

    project.touch("inc/c.glsl");
    let result = project.build();
    assert_eq!(project.compiler.compiled_names(), vec!["a.frag.glsl"]);
    assert_eq!(result.skipped_count(), 1);
}

#[test]
fn test_include_cycle_terminates() {
    let project = Project::new();
    project.write("a.comp.glsl", "#include \"x.glsl\"\n");
    project.write("x.glsl", "#include \"y.glsl\"\n");
    project.write("y.glsl", "#include \"x.glsl\"\n");

    assert_eq!(project.build().compiled_count(), 1);
    assert_eq!(project.build().skipped_count(), 1);

    project.touch("y.glsl");
    assert_eq!(project.build().compiled_count(), 1);
}

#[test]
fn test_missing_include_always_rebuilds_with_warning() {
    let project = Project::new();
    project.write("a.vert.glsl", "#include \"missing.glsl\"\n");
    project.build();

    let reporter = Arc::new(CollectingProgress::new());
    let result = project
        .pipeline()
        .with_reporter(reporter.clone())
        .build()
        .unwrap();

    assert_eq!(result.compiled_count(), 1);
    assert_eq!(result.all_warnings().len(), 1);
    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("missing.glsl"));
}

#[test]
fn test_force_rebuilds_everything() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    project.write("b.frag.glsl", "");
    project.build();

    let result = BuildPipeline::new(project.context().with_force(true))
        .with_compiler(project.compiler.clone())
        .build()
        .unwrap();
    assert_eq!(result.compiled_count(), 2);
    assert!(result.targets.iter().all(|t| t.reason == Some(Staleness::Forced)));
}

// ============================================================================
// Failures and Cancellation
// ============================================================================

#[test]
fn test_failure_does_not_stop_siblings() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    project.write("b.frag.glsl", "#error broken\n");
    project.write("c.comp.glsl", "");

    let result = project.build();
    assert_eq!(result.compiled_count(), 2);
    assert_eq!(result.failed_count(), 1);
    assert!(!result.is_success());
    assert_eq!(result.summary_line(), "Build: 2 succeeded, 1 failed, 0 up-to-date, 0 skipped");
    assert!(!project.out("b.frag.spv").exists());

    let failures = result.failures();
    assert_eq!(failures[0].target_id, "b.frag.glsl");
    assert!(matches!(&failures[0].status, BuildStatus::Failed(msg) if msg.contains("#error")));

    // The failed shader is retried; the others are fresh
    let result = project.build();
    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.skipped_count(), 2);
}

#[test]
fn test_fail_fast_stops_new_compilations() {
    let project = Project::new();
    project.write("a.comp.glsl", "#error first\n");
    project.write("b.frag.glsl", "");
    project.write("c.vert.glsl", "");

    let result = project.pipeline().with_jobs(1).with_fail_fast(true).build().unwrap();
    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.compiled_count(), 0);
    assert_eq!(result.cancelled_count(), 2);
    assert_eq!(project.compiler.call_count(), 1);
}

#[test]
fn test_cancel_mid_build_keeps_exact_tallies() {
    let token = CancelToken::new();
    let project = Project::with_compiler(RecordingCompiler::cancelling(token.clone()));
    project.write("a.comp.glsl", "");
    project.write("b.comp.glsl", "");
    project.write("c.comp.glsl", "");

    let result = project.pipeline().with_jobs(1).with_cancel(token).build().unwrap();

    assert_eq!(result.compiled_count(), 1);
    assert_eq!(result.cancelled_count(), 2);
    assert_eq!(result.failed_count(), 0);
    assert_eq!(result.targets.len(), 3);
    assert!(result.is_success());
}

#[test]
fn test_cancel_before_start() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    let token = CancelToken::new();
    token.cancel();

    let result = project.pipeline().with_cancel(token).build().unwrap();
    assert_eq!(result.cancelled_count(), 1);
    assert_eq!(project.compiler.call_count(), 0);
    assert!(!project.out("a.vert.spv").exists());
}

// ============================================================================
// Dry Run and Progress
// ============================================================================

#[test]
fn test_dry_run_reports_without_compiling() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    project.write("b.frag.glsl", "");
    project.build();
    project.touch("a.vert.glsl");
    project.compiler.reset();

    let result = project.pipeline().with_dry_run(true).build().unwrap();
    assert_eq!(result.pending_count(), 1);
    assert_eq!(result.skipped_count(), 1);
    assert_eq!(result.compiled_count(), 0);
    assert_eq!(project.compiler.call_count(), 0);
}

#[test]
fn test_progress_events_per_target() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    project.write("b.frag.glsl", "#error\n");

    let reporter = Arc::new(CollectingProgress::new());
    project.pipeline().with_reporter(reporter.clone()).build().unwrap();

    let events = reporter.events();
    assert_eq!(events.first(), Some(&ProgressEvent::BuildStarted { total_targets: 2 }));

    let completed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::TargetCompleted { target_id, status, .. } => {
                Some((target_id.clone(), status.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), 2);
    assert!(completed.contains(&("a.vert.glsl".to_string(), BuildStatus::Success)));

    assert!(matches!(
        events.last(),
        Some(ProgressEvent::BuildCompleted { success: false, compiled: 1, failed: 1, .. })
    ));
}

#[test]
fn test_check_does_not_compile() {
    let project = Project::new();
    project.write("a.vert.glsl", "");
    project.write("b.frag.glsl", "");
    project.build();
    project.touch("b.frag.glsl");
    project.compiler.reset();

    let checks = project.pipeline().check().unwrap();
    let stale: Vec<&str> =
        checks.iter().filter(|(_, c)| c.is_stale()).map(|(t, _)| t.id.as_str()).collect();
    assert_eq!(stale, vec!["b.frag.glsl"]);
    assert_eq!(project.compiler.call_count(), 0);
}

// ============================================================================
// External Compiler
// ============================================================================

#[cfg(unix)]
#[test]
fn test_command_compiler_end_to_end() {
    use glslbuild::config::GlslConfig;
    use std::os::unix::fs::PermissionsExt;

    let project = Project::new();
    project.write("a.vert.glsl", "void main() {}\n");
    project.write("b.frag.glsl", "#error\n");

    // Fake glslc: <opt> <src> -o <out>; fails on sources containing #error
    let script = project.temp.path().join("fake-glslc");
    fs::write(
        &script,
        "#!/bin/sh\nif grep -q '#error' \"$2\"; then echo \"$2: error\" >&2; exit 1; fi\ncp \"$2\" \"$4\"\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mut config = GlslConfig::default();
    config.compiler.path = script;
    let context = BuildContext::new(config, project.temp.path().to_path_buf());

    let result = BuildPipeline::new(context).build().unwrap();
    assert_eq!(result.compiled_count(), 1);
    assert_eq!(result.failed_count(), 1);
    assert!(project.out("a.vert.spv").exists());
    assert!(matches!(&result.failures()[0].status, BuildStatus::Failed(msg) if msg.contains("error")));
}
