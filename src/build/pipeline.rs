//! Build pipeline orchestration.
//!
//! The pipeline discovers shaders, decides which are stale and compiles
//! those, collecting one [`TargetResult`] per shader. Per-shader problems are
//! recorded in the result; only configuration problems (a missing source
//! directory) stop the build.

use crate::build::{
    check_target, create_build_plan, BuildContext, BuildPlan, BuildResult, CancelToken,
    CommandCompiler, DiscoveryError, NullProgress, ParallelBuild, ProgressEvent,
    ProgressReporter, ShaderCompiler, ShaderTarget, StalenessCheck,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use thiserror::Error;
use tracing::info;

/// Error that stops a build before any shader is processed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// The source directory does not exist
    #[error("Source directory not found: {}", .0.display())]
    SourceRootNotFound(PathBuf),
    /// Discovery error
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    /// Worker pool could not be created
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),
}

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    /// Number of parallel jobs
    jobs: usize,
    /// Whether to stop on first error
    fail_fast: bool,
    /// Whether to do a dry run (report stale shaders, compile nothing)
    dry_run: bool,
    reporter: Arc<dyn ProgressReporter>,
    compiler: Arc<dyn ShaderCompiler>,
    cancel: CancelToken,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    ///
    /// The compiler, job count and fail-fast mode come from the context's
    /// configuration; each can be overridden with the `with_*` methods.
    pub fn new(context: BuildContext) -> Self {
        let compiler = CommandCompiler::new(context.compiler_path(), context.optimization());
        Self {
            jobs: context.jobs(),
            fail_fast: context.is_fail_fast(),
            dry_run: false,
            reporter: Arc::new(NullProgress::new()),
            compiler: Arc::new(compiler),
            cancel: CancelToken::new(),
            context,
        }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set fail-fast mode (stop launching compilations on first error).
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set dry-run mode (don't actually compile).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Set the compiler.
    pub fn with_compiler(mut self, compiler: Arc<dyn ShaderCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Use a cancel token shared with the caller.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Get the cancel token used by this pipeline.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn plan(&self) -> Result<BuildPlan, BuildError> {
        let src_dir = self.context.src_dir();
        if !src_dir.is_dir() {
            return Err(BuildError::SourceRootNotFound(src_dir));
        }
        Ok(create_build_plan(&self.context)?)
    }

    /// Run the build pipeline.
    ///
    /// Discovers sources, creates a build plan, and executes it. A fatal
    /// error is also sent to the reporter as [`ProgressEvent::Error`].
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let result = self.plan().and_then(|plan| self.build_plan(&plan));
        if let Err(e) = &result {
            self.reporter.report(ProgressEvent::Error { target_id: None, message: e.to_string() });
        }
        result
    }

    /// Run the build pipeline with a pre-created plan.
    pub fn build_plan(&self, plan: &BuildPlan) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        info!(
            targets = plan.len(),
            jobs = self.jobs,
            dry_run = self.dry_run,
            force = self.context.is_force(),
            "starting shader build"
        );
        self.reporter.report(ProgressEvent::BuildStarted { total_targets: plan.len() });

        let targets = ParallelBuild::new(self.compiler.as_ref(), self.reporter.as_ref())
            .with_jobs(self.jobs)
            .with_fail_fast(self.fail_fast)
            .with_dry_run(self.dry_run)
            .with_force(self.context.is_force())
            .with_cancel(self.cancel.clone())
            .run(plan)?;

        let mut result = BuildResult::new();
        for target in targets {
            result.add_result(target);
        }
        let result = result.with_duration(start.elapsed()).finished(SystemTime::now());

        self.reporter.report(ProgressEvent::BuildCompleted {
            success: result.is_success(),
            duration_ms: result.total_duration.as_millis() as u64,
            compiled: result.compiled_count(),
            up_to_date: result.skipped_count(),
            failed: result.failed_count(),
        });
        info!(
            compiled = result.compiled_count(),
            failed = result.failed_count(),
            up_to_date = result.skipped_count(),
            "shader build finished"
        );

        Ok(result)
    }

    /// Check staleness of every shader without compiling anything.
    ///
    /// # Returns
    /// Each target paired with its staleness verdict, in plan order.
    pub fn check(&self) -> Result<Vec<(ShaderTarget, StalenessCheck)>, BuildError> {
        let plan = self.plan()?;
        Ok(plan
            .targets()
            .iter()
            .map(|target| (target.clone(), check_target(target, self.context.is_force())))
            .collect())
    }
}
