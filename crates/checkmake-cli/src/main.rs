//! Checkmake CLI - acceptance checker for submitted project archives.

mod cli;
mod error;
mod progress;

use anyhow::Result;
use checkmake_core::Verdict;
use checkmake_core::pipeline::NoopObserver;
use checkmake_core::pipeline::StageObserver;
use clap::Parser;
use console::Term;
use console::style;
use std::process::ExitCode;

/// Exit status for usage and setup errors, matching clap's usage errors.
const FATAL_EXIT: u8 = 2;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match try_main(&cli) {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(err) => {
            let term = Term::stderr();
            let _ = term.write_line(&format!("{} {err:#}", style("ERROR:").red().bold()));
            ExitCode::from(FATAL_EXIT)
        }
    }
}

fn try_main(cli: &cli::Cli) -> Result<Verdict> {
    let config = cli.to_config();

    let mut observer: Box<dyn StageObserver> = if progress::CliProgress::should_show() {
        Box::new(progress::CliProgress::new())
    } else {
        Box::new(NoopObserver)
    };

    checkmake_core::pipeline::run_with_observer(&config, observer.as_mut())
        .map_err(|err| error::convert_fatal_error(err, config.work_dir()))
}
