//! CLI argument parsing using clap.

use checkmake_core::BuildCommand;
use checkmake_core::Config;
use checkmake_core::Level;
use checkmake_core::config::DEFAULT_WORK_DIR;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "checkmake")]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "Exit status: 0 if every check passed, 1 if a check failed, 2 on usage or setup errors."
)]
pub struct Cli {
    /// Path to the gzip-compressed tar archive to check
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Workspace directory; must be inside the current directory
    #[arg(short, long = "work", value_name = "DIR", default_value = DEFAULT_WORK_DIR)]
    pub work_dir: PathBuf,

    /// Keep an existing workspace instead of removing it first
    #[arg(short = 'x', long)]
    pub preserve: bool,

    /// Remove the workspace after the run
    #[arg(long)]
    pub cleanup: bool,

    /// Captured build output file (default: <DIR>/make.stdout)
    #[arg(short = 'o', long = "stdout", value_name = "FILE")]
    pub stdout_file: Option<PathBuf>,

    /// Captured build error file (default: <DIR>/make.stderr)
    #[arg(short = 'e', long = "stderr", value_name = "FILE")]
    pub stderr_file: Option<PathBuf>,

    /// Persistent log file (default: <DIR>/checkmake.out)
    #[arg(short = 'l', long = "log", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Console log threshold: NONE, FATAL, ERROR, WARNING, INFO, DEBUG or ALL
    #[arg(
        long,
        alias = "clog_level",
        value_name = "LEVEL",
        default_value = "WARNING",
        value_parser = parse_level
    )]
    pub clog_level: Level,

    /// Log file threshold: NONE, FATAL, ERROR, WARNING, INFO, DEBUG or ALL
    #[arg(
        long,
        alias = "flog_level",
        value_name = "LEVEL",
        default_value = "INFO",
        value_parser = parse_level
    )]
    pub flog_level: Level,

    /// File the build must produce inside the project directory
    #[arg(short, long, value_name = "NAME")]
    pub target: Option<String>,

    /// Build command, split on whitespace
    #[arg(long, value_name = "COMMAND", default_value = "make", value_parser = parse_build_command)]
    pub build_command: BuildCommand,
}

impl Cli {
    /// Resolves the arguments into a run configuration.
    pub fn to_config(&self) -> Config {
        Config::builder(&self.archive)
            .work_dir(&self.work_dir)
            .preserve_workspace(self.preserve)
            .cleanup_workspace(self.cleanup)
            .stdout_file(self.stdout_file.clone())
            .stderr_file(self.stderr_file.clone())
            .log_file(self.log_file.clone())
            .console_level(self.clog_level)
            .file_level(self.flog_level)
            .target(self.target.clone())
            .build_command(self.build_command.clone())
            .build()
    }
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse::<Level>().map_err(|e| e.to_string())
}

/// Parse a build command line such as `make -j4`.
fn parse_build_command(s: &str) -> Result<BuildCommand, String> {
    let mut words = s.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| "build command cannot be empty".to_string())?;
    Ok(words.fold(BuildCommand::new(program), |command, word| command.arg(word)))
}
