//! Self-test harness.
//!
//! Runs the acceptance tool against a fixed corpus of sample archives and
//! compares each outcome to the expected one. Cases run in table order and
//! a mismatch never stops the remaining cases.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

/// Expected outcome of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// The archive must pass every stage.
    Accept,
    /// The archive must fail some stage.
    Reject,
}

impl Expectation {
    /// Returns `true` if `passed` agrees with the expectation.
    #[must_use]
    pub const fn matches(self, passed: bool) -> bool {
        match self {
            Self::Accept => passed,
            Self::Reject => !passed,
        }
    }
}

/// One archive of the corpus and its expected outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTestCase {
    /// Archive file name inside the test directory.
    pub archive: &'static str,
    /// Expected outcome.
    pub expect: Expectation,
}

impl SelfTestCase {
    /// Workspace name for this case: the archive name with every `.`
    /// replaced by `_`.
    #[must_use]
    pub fn workspace_name(&self) -> String {
        self.archive.replace('.', "_")
    }
}

/// The sample corpus, in execution order.
pub const CASES: [SelfTestCase; 6] = [
    SelfTestCase {
        archive: "project.tar",
        expect: Expectation::Reject,
    },
    SelfTestCase {
        archive: "project.tar.gz",
        expect: Expectation::Accept,
    },
    SelfTestCase {
        archive: "project_build_error.tar.gz",
        expect: Expectation::Reject,
    },
    SelfTestCase {
        archive: "project_empty_readme.tar.gz",
        expect: Expectation::Reject,
    },
    SelfTestCase {
        archive: "project_no_dir.tar.gz",
        expect: Expectation::Accept,
    },
    SelfTestCase {
        archive: "project_no_readme.tar.gz",
        expect: Expectation::Reject,
    },
];

/// Runs the acceptance tool for one archive.
pub trait CaseRunner {
    /// Checks `archive` using `work_dir` as the workspace. Returns `true`
    /// if the archive was accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool could not be run at all.
    fn run(&self, archive: &Path, work_dir: &Path, target: Option<&str>) -> io::Result<bool>;
}

/// Runs the `checkmake` executable as a child process, discarding its
/// output. Acceptance is a zero exit status.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: OsString,
}

impl ProcessRunner {
    /// Creates a runner invoking `program`.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CaseRunner for ProcessRunner {
    fn run(&self, archive: &Path, work_dir: &Path, target: Option<&str>) -> io::Result<bool> {
        let mut command = Command::new(&self.program);
        command.arg(archive).arg("--work").arg(work_dir);
        if let Some(target) = target {
            command.arg("--target").arg(target);
        }
        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(status.success())
    }
}

/// Result of one case.
#[derive(Debug)]
pub struct CaseReport {
    /// The case that ran.
    pub case: SelfTestCase,
    /// Whether the archive was accepted, or the error that kept the tool
    /// from running.
    pub outcome: io::Result<bool>,
}

impl CaseReport {
    /// Returns `true` if the tool ran and agreed with the expectation.
    #[must_use]
    pub fn ok(&self) -> bool {
        matches!(self.outcome, Ok(passed) if self.case.expect.matches(passed))
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.ok() { "OK" } else { "ERROR" };
        write!(f, "Testing {}: {status}", self.case.archive)
    }
}

/// Results of a whole self-test run.
#[derive(Debug, Default)]
pub struct SelfTestSummary {
    /// One report per case, in execution order.
    pub reports: Vec<CaseReport>,
}

impl SelfTestSummary {
    /// Number of cases whose outcome matched.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|report| report.ok()).count()
    }

    /// Number of cases whose outcome did not match.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    /// Returns `true` if every case matched.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.failed() == 0
    }
}

/// Locations used by a self-test run.
#[derive(Debug, Clone)]
pub struct SelfTestOptions {
    /// Directory holding the corpus archives.
    pub test_dir: PathBuf,
    /// Parent of the per-case workspaces. Must be a relative path inside
    /// the directory the tool is run from.
    pub work_root: PathBuf,
    /// Artifact name passed to every case, if any.
    pub target: Option<String>,
}

/// Runs every case in [`CASES`] and writes one `Testing <archive>: OK|ERROR`
/// line per case to `out`.
///
/// Each case gets its own workspace, `<work_root>/<case name>`.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails. A case that cannot be
/// run is reported as `ERROR`.
pub fn run_self_test(
    runner: &dyn CaseRunner,
    options: &SelfTestOptions,
    out: &mut dyn Write,
) -> io::Result<SelfTestSummary> {
    let mut summary = SelfTestSummary::default();

    for case in CASES {
        let archive = options.test_dir.join(case.archive);
        let work_dir = options.work_root.join(case.workspace_name());
        let outcome = runner.run(&archive, &work_dir, options.target.as_deref());

        let report = CaseReport { case, outcome };
        writeln!(out, "{report}")?;
        summary.reports.push(report);
    }

    Ok(summary)
}
