//! Stage spinner for interactive runs.

use checkmake_core::Stage;
use checkmake_core::pipeline::StageObserver;
use console::Term;
use console::style;
use indicatif::ProgressBar;
use indicatif::ProgressDrawTarget;
use indicatif::ProgressStyle;
use std::time::Duration;

/// Spinner implementing `StageObserver`.
///
/// Draws to stderr so it never mixes with the console log on stdout.
/// Cleared on drop.
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Creates a spinner.
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl StageObserver for CliProgress {
    fn on_stage_start(&mut self, stage: Stage) {
        self.bar.set_message(format!("Running {stage} stage"));
    }

    fn on_stage_complete(&mut self, stage: Stage, passed: bool) {
        let mark = if passed {
            style("✓").green().bold()
        } else {
            style("✗").red().bold()
        };
        self.bar.println(format!("{mark} {stage}"));
    }
}
