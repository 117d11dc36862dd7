//! Build progress reporting.
//!
//! Reporters receive a stream of [`ProgressEvent`]s from the pipeline. Events
//! for different shaders may arrive from different worker threads, so every
//! reporter is `Send + Sync` and serializes its own output.
//!
//! # Example
//!
//! ```
//! use glslbuild::build::{BuildStatus, ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::with_output(std::io::sink());
//! reporter.report(ProgressEvent::BuildStarted { total_targets: 1 });
//! reporter.report(ProgressEvent::TargetCompleted {
//!     target_id: "lighting.frag.glsl".to_string(),
//!     status: BuildStatus::Success,
//!     duration_ms: 42,
//! });
//! ```

use crate::build::BuildStatus;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Events that can be reported during a build.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Build process started
    BuildStarted {
        /// Total number of shaders discovered
        total_targets: usize,
    },
    /// A shader started compiling
    TargetStarted {
        /// Target identifier
        target_id: String,
    },
    /// A shader finished (compiled, skipped, failed, pending or cancelled)
    TargetCompleted {
        /// Target identifier
        target_id: String,
        /// Build status
        status: BuildStatus,
        /// Duration in milliseconds
        duration_ms: u64,
    },
    /// Build process completed
    BuildCompleted {
        /// Whether the overall build succeeded
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of compiled shaders
        compiled: usize,
        /// Number of up-to-date shaders
        up_to_date: usize,
        /// Number of failed shaders
        failed: usize,
    },
    /// A warning was generated
    Warning {
        /// Target that generated the warning (if applicable)
        target_id: Option<String>,
        /// Warning message
        message: String,
    },
    /// An error occurred
    Error {
        /// Target that generated the error (if applicable)
        target_id: Option<String>,
        /// Error message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// A progress reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgress {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Warning messages received so far.
    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Warning { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for CollectingProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show up-to-date shaders and compile starts
    verbose: bool,
    /// Completed target count
    current: AtomicUsize,
    /// Total target count
    total: AtomicUsize,
    /// Output writer
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter on stderr, colored when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }

    fn prefixed(target_id: Option<String>, message: &str) -> String {
        match target_id {
            Some(id) => format!("{}: {}", id, message),
            None => message.to_string(),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BuildStarted { total_targets } => {
                self.total.store(total_targets, Ordering::SeqCst);
                self.current.store(0, Ordering::SeqCst);
                if total_targets > 0 {
                    self.writeln(&format!(
                        "{} Checking {} shader{}...",
                        self.cyan("[build]"),
                        total_targets,
                        if total_targets == 1 { "" } else { "s" }
                    ));
                }
            }
            ProgressEvent::TargetStarted { target_id } => {
                if self.verbose {
                    self.writeln(&format!("{} Compiling {}...", self.cyan("[build]"), target_id));
                }
            }
            ProgressEvent::TargetCompleted { target_id, status, duration_ms } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total.load(Ordering::SeqCst);

                let status_str = match &status {
                    BuildStatus::Success => self.green("ok"),
                    BuildStatus::Skipped if !self.verbose => return,
                    BuildStatus::Skipped => self.yellow("up-to-date"),
                    BuildStatus::Failed(_) => self.red("FAILED"),
                    BuildStatus::Pending => self.cyan("stale"),
                    BuildStatus::Cancelled => self.yellow("cancelled"),
                };

                self.writeln(&format!(
                    "{} [{}/{}] {} {} ({})",
                    self.cyan("[build]"),
                    current,
                    total,
                    status_str,
                    target_id,
                    format_duration(duration_ms)
                ));

                if let BuildStatus::Failed(err) = status {
                    for line in err.lines() {
                        self.writeln(&format!("        {}", self.red(line)));
                    }
                }
            }
            ProgressEvent::BuildCompleted { success, duration_ms, compiled, up_to_date, failed } => {
                let tag = if success { self.green("[done]") } else { self.red("[error]") };
                self.writeln(&format!(
                    "{} {} compiled, {} failed, {} up-to-date in {}",
                    tag,
                    compiled,
                    failed,
                    up_to_date,
                    format_duration(duration_ms)
                ));
            }
            ProgressEvent::Warning { target_id, message } => {
                self.writeln(&format!(
                    "{} {}",
                    self.yellow("[warn]"),
                    Self::prefixed(target_id, &message)
                ));
            }
            ProgressEvent::Error { target_id, message } => {
                self.writeln(&format!(
                    "{} {}",
                    self.red("[error]"),
                    Self::prefixed(target_id, &message)
                ));
            }
        }
    }
}

/// JSON progress reporter writing one object per line.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    fn write_json(&self, value: &Value) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Short machine-readable name of a status.
pub fn status_name(status: &BuildStatus) -> &'static str {
    match status {
        BuildStatus::Success => "success",
        BuildStatus::Skipped => "up_to_date",
        BuildStatus::Failed(_) => "failed",
        BuildStatus::Pending => "pending",
        BuildStatus::Cancelled => "cancelled",
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let value = match event {
            ProgressEvent::BuildStarted { total_targets } => {
                json!({ "event": "build_started", "total_targets": total_targets })
            }
            ProgressEvent::TargetStarted { target_id } => {
                json!({ "event": "target_started", "target_id": target_id })
            }
            ProgressEvent::TargetCompleted { target_id, status, duration_ms } => {
                let mut value = json!({
                    "event": "target_completed",
                    "target_id": target_id,
                    "status": status_name(&status),
                    "duration_ms": duration_ms,
                });
                if let BuildStatus::Failed(err) = status {
                    value["error"] = Value::String(err);
                }
                value
            }
            ProgressEvent::BuildCompleted { success, duration_ms, compiled, up_to_date, failed } => {
                json!({
                    "event": "build_completed",
                    "success": success,
                    "duration_ms": duration_ms,
                    "compiled": compiled,
                    "up_to_date": up_to_date,
                    "failed": failed,
                })
            }
            ProgressEvent::Warning { target_id, message } => {
                json!({ "event": "warning", "message": message, "target_id": target_id })
            }
            ProgressEvent::Error { target_id, message } => {
                json!({ "event": "error", "message": message, "target_id": target_id })
            }
        };
        self.write_json(&value);
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
