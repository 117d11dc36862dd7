//! Build result types.
//!
//! Contains types for representing the outcome of build operations.

use crate::build::{ShaderKind, Staleness};
use crate::include::IncludeWarning;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Status of a single build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Compiled successfully
    Success,
    /// Skipped (already up to date)
    Skipped,
    /// Compilation failed with diagnostics
    Failed(String),
    /// Stale but not compiled (dry run)
    Pending,
    /// Not started because the build was cancelled
    Cancelled,
}

impl BuildStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Skipped | BuildStatus::Pending)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failed(_))
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Skipped => write!(f, "up-to-date"),
            BuildStatus::Failed(err) => write!(f, "failed: {}", err),
            BuildStatus::Pending => write!(f, "pending"),
            BuildStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of building a single target.
#[derive(Debug, Clone)]
pub struct TargetResult {
    /// Source path relative to the source root
    pub target_id: String,
    /// Shader stage
    pub kind: ShaderKind,
    /// Build status
    pub status: BuildStatus,
    /// Output path of the target
    pub output: PathBuf,
    /// Time spent checking and compiling
    pub duration: Duration,
    /// Staleness verdict, absent if the target was never checked
    pub reason: Option<Staleness>,
    /// Include warnings found while checking
    pub warnings: Vec<IncludeWarning>,
}

impl TargetResult {
    fn new(target_id: String, kind: ShaderKind, output: PathBuf, status: BuildStatus) -> Self {
        Self {
            target_id,
            kind,
            status,
            output,
            duration: Duration::ZERO,
            reason: None,
            warnings: Vec::new(),
        }
    }

    /// Create a successful result.
    pub fn success(target_id: String, kind: ShaderKind, output: PathBuf) -> Self {
        Self::new(target_id, kind, output, BuildStatus::Success)
    }

    /// Create a skipped result.
    pub fn skipped(target_id: String, kind: ShaderKind, output: PathBuf) -> Self {
        Self::new(target_id, kind, output, BuildStatus::Skipped)
    }

    /// Create a failed result.
    pub fn failed(target_id: String, kind: ShaderKind, output: PathBuf, error: String) -> Self {
        Self::new(target_id, kind, output, BuildStatus::Failed(error))
    }

    /// Create a result for a stale target left uncompiled.
    pub fn pending(target_id: String, kind: ShaderKind, output: PathBuf) -> Self {
        Self::new(target_id, kind, output, BuildStatus::Pending)
    }

    /// Create a result for a target that never started.
    pub fn cancelled(target_id: String, kind: ShaderKind, output: PathBuf) -> Self {
        Self::new(target_id, kind, output, BuildStatus::Cancelled)
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the staleness verdict.
    pub fn with_reason(mut self, reason: Staleness) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Add include warnings to the result.
    pub fn with_warnings(mut self, warnings: Vec<IncludeWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each target, in plan order
    pub targets: Vec<TargetResult>,
    /// Total build duration
    pub total_duration: Duration,
    /// Wall-clock time the build finished
    pub finished_at: Option<SystemTime>,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target result.
    pub fn add_result(&mut self, result: TargetResult) {
        self.targets.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Record when the build finished.
    pub fn finished(mut self, at: SystemTime) -> Self {
        self.finished_at = Some(at);
        self
    }

    fn count(&self, status: &BuildStatus) -> usize {
        self.targets.iter().filter(|r| &r.status == status).count()
    }

    /// Number of shaders compiled.
    pub fn compiled_count(&self) -> usize {
        self.count(&BuildStatus::Success)
    }

    /// Number of shaders found up to date.
    pub fn skipped_count(&self) -> usize {
        self.count(&BuildStatus::Skipped)
    }

    /// Number of shaders that failed to compile.
    pub fn failed_count(&self) -> usize {
        self.targets.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Number of stale shaders left uncompiled by a dry run.
    pub fn pending_count(&self) -> usize {
        self.count(&BuildStatus::Pending)
    }

    /// Number of shaders not started because the build was cancelled.
    pub fn cancelled_count(&self) -> usize {
        self.count(&BuildStatus::Cancelled)
    }

    /// Number of shaders excluded from the build.
    ///
    /// There is no exclusion mechanism; this is always 0.
    pub fn excluded_count(&self) -> usize {
        0
    }

    /// Check if the overall build succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get all include warnings.
    pub fn all_warnings(&self) -> Vec<&IncludeWarning> {
        self.targets.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    /// Get failed target results.
    pub fn failures(&self) -> Vec<&TargetResult> {
        self.targets.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// The one-line tally.
    pub fn summary_line(&self) -> String {
        format!(
            "Build: {} succeeded, {} failed, {} up-to-date, {} skipped",
            self.compiled_count(),
            self.failed_count(),
            self.skipped_count(),
            self.excluded_count()
        )
    }

    /// The timing line, with the finish time in UTC.
    pub fn finished_line(&self) -> String {
        let clock = self.finished_at.map(clock_time).unwrap_or_else(|| "--:--:--".to_string());
        format!("Finished at {} in {:.3} s", clock, self.total_duration.as_secs_f64())
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let mut lines = vec![self.summary_line()];

        for target in self.failures() {
            lines.push(format!("  - {}: {}", target.target_id, target.status));
        }

        let pending = self.pending_count();
        if pending > 0 {
            lines.push(format!("Dry run: {} shader(s) would be compiled", pending));
        }
        let cancelled = self.cancelled_count();
        if cancelled > 0 {
            lines.push(format!("Cancelled: {} shader(s) not started", cancelled));
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}): ", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.push(self.finished_line());
        lines.join("\n")
    }
}

/// Format a wall-clock time as `HH:MM:SS` (UTC).
pub fn clock_time(at: SystemTime) -> String {
    let secs = at.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0) % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
