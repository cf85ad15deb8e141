//! Command traits for the gcsimt CLI.
//!
//! Every subcommand implements [`Command`] so `main` can construct and run
//! them the same way, and [`CommandDescription`] for its help text.

use crate::error::Result;

/// Standard command trait that all gcsimt commands implement.
pub trait Command {
    /// The arguments type for this command.
    type Args;

    /// The output type returned by this command.
    type Output;

    /// Create a new command instance with the given arguments.
    fn new(args: Self::Args) -> Self;

    /// Execute the command.
    fn execute(&self) -> Result<Self::Output>;

    /// Get the command name.
    fn name() -> &'static str;
}

/// Human-readable description and help text for a command.
pub trait CommandDescription {
    /// A brief one-line description.
    fn description() -> &'static str;

    /// Multi-line help text explaining usage.
    fn help() -> &'static str;
}
