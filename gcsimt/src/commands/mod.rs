//! Command modules for the gcsimt CLI.
//!
//! Each subcommand lives in its own file and follows the pattern set out
//! in [`traits`]: an args struct, a command struct, and a `run_*` entry.

pub mod traits;
pub mod common;

pub mod init;
pub mod run;
pub mod step;

// Re-export command types and functions
pub use init::{run_init, InitArgs};
pub use run::{run_run, RunArgs};
pub use step::{run_step, StepArgs};
