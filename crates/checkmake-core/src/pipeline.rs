//! Pipeline orchestration.
//!
//! Stages run in a fixed order, `extract -> build -> readme -> [target]`,
//! and the first failure halts the run. The target stage only exists when
//! a target was configured. Every failure is logged exactly once at
//! `ERROR`, naming the stage and the reason.

use crate::Config;
use crate::Logger;
use crate::Result;
use crate::StageError;
use crate::StageResult;
use crate::Workspace;
use crate::build::run_build;
use crate::containment;
use crate::deliverables::check_artifact;
use crate::deliverables::check_readme;
use crate::extract::extract_project;
use std::fmt;
use std::path::Path;

/// One pass/fail step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Archive extraction.
    Extract,
    /// Build command invocation.
    Build,
    /// Documentation check.
    Readme,
    /// Artifact check.
    Target,
}

impl Stage {
    /// Short lower-case stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Build => "build",
            Self::Readme => "readme",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Final outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every stage passed.
    Passed,
    /// A stage failed and the run halted there.
    Failed {
        /// The failing stage.
        stage: Stage,
        /// Human-readable reason.
        diagnostic: String,
    },
}

impl Verdict {
    /// Returns `true` if every stage passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Failing stage, if any.
    #[must_use]
    pub const fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Passed => None,
            Self::Failed { stage, .. } => Some(*stage),
        }
    }

    /// Process exit code: `0` when passed, `1` when a stage failed.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed { .. } => 1,
        }
    }
}

impl From<&StageError> for Verdict {
    fn from(err: &StageError) -> Self {
        Self::Failed {
            stage: err.stage(),
            diagnostic: err.to_string(),
        }
    }
}

/// Callback trait for stage progress.
///
/// # Examples
///
/// ```
/// use checkmake_core::Stage;
/// use checkmake_core::pipeline::StageObserver;
///
/// struct Printer;
///
/// impl StageObserver for Printer {
///     fn on_stage_start(&mut self, stage: Stage) {
///         println!("{stage}...");
///     }
///
///     fn on_stage_complete(&mut self, stage: Stage, passed: bool) {
///         println!("{stage}: {}", if passed { "ok" } else { "failed" });
///     }
/// }
/// ```
pub trait StageObserver {
    /// Called before a stage runs.
    fn on_stage_start(&mut self, stage: Stage);

    /// Called after a stage has run.
    fn on_stage_complete(&mut self, stage: Stage, passed: bool);
}

/// Observer that ignores every callback.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn on_stage_start(&mut self, _stage: Stage) {}

    fn on_stage_complete(&mut self, _stage: Stage, _passed: bool) {}
}

/// Runs the stages of one configuration against a prepared workspace.
#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a Config,
    workspace: &'a Path,
    log: &'a Logger,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline extracting into `workspace`, which must exist.
    #[must_use]
    pub const fn new(config: &'a Config, workspace: &'a Path, log: &'a Logger) -> Self {
        Self {
            config,
            workspace,
            log,
        }
    }

    /// Runs every stage in order and returns the verdict.
    pub fn execute(&self) -> Verdict {
        self.execute_with_observer(&mut NoopObserver)
    }

    /// Runs every stage in order, reporting progress to `observer`.
    pub fn execute_with_observer(&self, observer: &mut dyn StageObserver) -> Verdict {
        match self.stages(observer) {
            Ok(()) => {
                self.log.info("All checks passed");
                Verdict::Passed
            }
            Err(err) => {
                self.log
                    .error(format!("{} stage failed: {err}", err.stage()));
                Verdict::from(&err)
            }
        }
    }

    fn stages(&self, observer: &mut dyn StageObserver) -> StageResult<()> {
        let extraction = observe(observer, Stage::Extract, || {
            extract_project(self.config.archive(), self.workspace, self.log)
        })?;
        let project_dir = extraction.project_dir.as_path();

        observe(observer, Stage::Build, || {
            run_build(
                self.config.build_command(),
                project_dir,
                &self.config.capture_files(),
                self.log,
            )
        })?;

        observe(observer, Stage::Readme, || check_readme(project_dir, self.log))?;

        if let Some(target) = self.config.target() {
            observe(observer, Stage::Target, || {
                check_artifact(project_dir, target, self.log)
            })?;
        }

        Ok(())
    }
}

fn observe<T>(
    observer: &mut dyn StageObserver,
    stage: Stage,
    run: impl FnOnce() -> StageResult<T>,
) -> StageResult<T> {
    observer.on_stage_start(stage);
    let result = run();
    observer.on_stage_complete(stage, result.is_ok());
    result
}

/// Runs the whole acceptance check for `config`.
///
/// Validates the workspace, opens the log, resets the workspace, runs the
/// stages, closes the log and finally removes the workspace if the
/// configuration asks for it. A log file outside the workspace is opened
/// before the reset, so a bad log destination leaves the disk untouched.
///
/// # Errors
///
/// Returns a fatal [`crate::Error`] if the workspace is outside the current
/// directory or cannot be prepared, or if the log file cannot be opened.
/// Stage failures are not errors; they are reported in the [`Verdict`]. A
/// workspace that cannot be removed at the end is logged as a warning.
pub fn run(config: &Config) -> Result<Verdict> {
    run_with_observer(config, &mut NoopObserver)
}

/// Same as [`run`], reporting stage progress to `observer`.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_observer(config: &Config, observer: &mut dyn StageObserver) -> Result<Verdict> {
    let root = std::env::current_dir()?;
    run_in(&root, config, observer)
}

fn run_in(root: &Path, config: &Config, observer: &mut dyn StageObserver) -> Result<Verdict> {
    let workspace = Workspace::resolve_in(root, config.work_dir())?;
    let log_path = root.join(config.log_file());
    let open_log = || Logger::create(&log_path, config.console_level(), config.file_level());

    let early_log = if containment::path_is_parent(workspace.path(), &log_path) {
        None
    } else {
        Some(open_log()?)
    };
    workspace.reset(config.preserve_workspace())?;

    let verdict = {
        let log = match early_log {
            Some(log) => log,
            None => open_log()?,
        };
        log.info("Starting");
        Pipeline::new(config, workspace.path(), &log).execute_with_observer(observer)
    };

    if config.cleanup_workspace() {
        remove_workspace(workspace, &Logger::console(config.console_level()));
    }

    Ok(verdict)
}

fn remove_workspace(workspace: Workspace, log: &Logger) {
    let path = workspace.path().to_path_buf();
    if let Err(err) = workspace.remove() {
        log.warning(format!("Cannot remove workspace {}: {err}", path.display()));
    }
}
