//! Parallel build execution.
//!
//! Every shader is independent: each one has its own output path, so the
//! per-shader "check staleness, then compile" step runs on a fixed-size
//! rayon pool with no coordination beyond the cancel flag.
//!
//! # How It Works
//!
//! 1. A pool of `jobs` workers is created (`1` runs on the calling thread)
//! 2. Each target is checked and, if stale, compiled
//! 3. Results are collected by index, so they come back in plan order
//! 4. Once the [`CancelToken`] is raised, targets that have not started a
//!    compilation are reported as cancelled
//!
//! A failed compilation is a value, never a reason to stop the others,
//! unless fail-fast is requested.

use crate::build::{
    check_target, BuildError, BuildPlan, BuildStatus, CancelToken, CompileOutcome,
    ProgressEvent, ProgressReporter, ShaderCompiler, ShaderTarget, TargetResult,
};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Parallel build executor.
pub struct ParallelBuild<'a> {
    compiler: &'a dyn ShaderCompiler,
    reporter: &'a dyn ProgressReporter,
    cancel: CancelToken,
    /// Number of parallel jobs
    jobs: usize,
    /// Whether to stop launching compilations after the first failure
    fail_fast: bool,
    /// Whether to report stale targets without compiling them
    dry_run: bool,
    /// Whether to treat every target as stale
    force: bool,
}

impl<'a> ParallelBuild<'a> {
    /// Create an executor with one job per available core.
    pub fn new(compiler: &'a dyn ShaderCompiler, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            compiler,
            reporter,
            cancel: CancelToken::new(),
            jobs: crate::build::default_jobs(),
            fail_fast: false,
            dry_run: false,
            force: false,
        }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set fail-fast mode.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set force mode.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Use a shared cancel token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the number of parallel jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Execute every target in the plan.
    ///
    /// # Returns
    /// One result per target, in plan order.
    pub fn run(&self, plan: &BuildPlan) -> Result<Vec<TargetResult>, BuildError> {
        let targets = plan.targets();

        if self.jobs == 1 || targets.len() <= 1 {
            return Ok(targets.iter().map(|t| self.execute_target(t)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("glslb-worker-{}", i))
            .build()
            .map_err(|e| BuildError::ThreadPool(e.to_string()))?;

        debug!(workers = self.jobs, targets = targets.len(), "starting worker pool");

        Ok(pool.install(|| targets.par_iter().map(|t| self.execute_target(t)).collect()))
    }

    fn finish(&self, result: TargetResult) -> TargetResult {
        self.reporter.report(ProgressEvent::TargetCompleted {
            target_id: result.target_id.clone(),
            status: result.status.clone(),
            duration_ms: result.duration.as_millis() as u64,
        });
        result
    }

    fn cancelled(&self, target: &ShaderTarget) -> TargetResult {
        debug!(target = %target.id, "cancelled before compiling");
        TargetResult::cancelled(target.id.clone(), target.kind, target.output.clone())
    }

    /// Check and, if stale, compile one target.
    fn execute_target(&self, target: &ShaderTarget) -> TargetResult {
        if self.cancel.is_cancelled() {
            return self.finish(self.cancelled(target));
        }

        let start = Instant::now();
        let check = check_target(target, self.force);

        for warning in &check.warnings {
            self.reporter.report(ProgressEvent::Warning {
                target_id: Some(target.id.clone()),
                message: warning.to_string(),
            });
        }

        let id = target.id.clone();
        let output = target.output.clone();
        let staleness = check.staleness;

        let result = if !staleness.is_stale() {
            debug!(target = %target.id, "up to date");
            TargetResult::skipped(id, target.kind, output)
        } else if self.dry_run {
            debug!(target = %target.id, reason = %staleness, "would compile");
            TargetResult::pending(id, target.kind, output)
        } else if self.cancel.is_cancelled() {
            self.cancelled(target)
        } else {
            debug!(target = %target.id, reason = %staleness, "compiling");
            self.reporter.report(ProgressEvent::TargetStarted { target_id: id.clone() });

            match self.compiler.compile(&target.source, &target.output) {
                CompileOutcome::Success => TargetResult::success(id, target.kind, output),
                CompileOutcome::Failure(diagnostics) => {
                    if self.fail_fast {
                        self.cancel.cancel();
                    }
                    TargetResult::failed(id, target.kind, output, diagnostics)
                }
            }
        };

        if let BuildStatus::Failed(diagnostics) = &result.status {
            debug!(target = %target.id, %diagnostics, "compilation failed");
        }

        let result = result.with_duration(start.elapsed()).with_reason(staleness);
        self.finish(result.with_warnings(check.warnings))
    }
}
