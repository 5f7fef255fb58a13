//! Self-test harness: runs `checkmake` over the sample corpus and reports
//! whether every archive was accepted or rejected as expected.

use anyhow::Context;
use anyhow::Result;
use checkmake_core::selftest::ProcessRunner;
use checkmake_core::selftest::SelfTestOptions;
use checkmake_core::selftest::run_self_test;
use clap::Parser;
use console::Term;
use console::style;
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "checkmake-selftest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the sample archives
    #[arg(value_name = "TEST_DIR", default_value = ".")]
    test_dir: PathBuf,

    /// File every build must produce, forwarded to checkmake
    #[arg(short, long, value_name = "NAME")]
    target: Option<String>,

    /// checkmake executable to test (default: next to this program)
    #[arg(long, value_name = "PATH")]
    checkmake: Option<PathBuf>,

    /// Parent directory of the per-case workspaces
    #[arg(long, value_name = "DIR", default_value = "./work")]
    work_root: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match try_main(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            let term = Term::stderr();
            let _ = term.write_line(&format!("{} {err:#}", style("ERROR:").red().bold()));
            ExitCode::from(2)
        }
    }
}

fn try_main(args: Args) -> Result<bool> {
    let program = match args.checkmake {
        Some(path) => path,
        None => sibling_checkmake()?,
    };

    let options = SelfTestOptions {
        test_dir: args.test_dir,
        work_root: args.work_root,
        target: args.target.filter(|name| !name.is_empty()),
    };

    let runner = ProcessRunner::new(program);
    let summary = run_self_test(&runner, &options, &mut io::stdout().lock())
        .context("failed to write the self-test report")?;
    Ok(summary.all_ok())
}

fn sibling_checkmake() -> Result<PathBuf> {
    let exe = env::current_exe().context("cannot locate the self-test executable")?;
    let dir = exe
        .parent()
        .context("self-test executable has no parent directory")?;
    Ok(dir.join(format!("checkmake{}", env::consts::EXE_SUFFIX)))
}
