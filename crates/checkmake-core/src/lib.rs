//! Acceptance-test pipeline for submitted project archives.
//!
//! `checkmake-core` takes a gzip-compressed tar archive, expands it into a
//! confined workspace, runs the build command inside the extracted project
//! and verifies the required deliverables. Each step is a stage; the first
//! failing stage halts the run.
//!
//! # Examples
//!
//! ```no_run
//! use checkmake_core::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder("submission.tar.gz")
//!     .work_dir("./work")
//!     .target(Some("hello".to_string()))
//!     .build();
//!
//! let verdict = checkmake_core::run(&config)?;
//! std::process::exit(i32::from(verdict.exit_code()));
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod build;
pub mod config;
pub mod containment;
pub mod deliverables;
pub mod error;
pub mod extract;
pub mod logger;
pub mod pipeline;
pub mod selftest;
pub mod test_utils;
pub mod workspace;

pub use build::BuildCommand;
pub use build::BuildOutcome;
pub use build::CaptureFiles;
pub use config::Config;
pub use config::ConfigBuilder;
pub use error::Error;
pub use error::Result;
pub use error::StageError;
pub use error::StageResult;
pub use extract::Extraction;
pub use logger::Level;
pub use logger::Logger;
pub use pipeline::Pipeline;
pub use pipeline::Stage;
pub use pipeline::Verdict;
pub use pipeline::run;
pub use workspace::Workspace;
