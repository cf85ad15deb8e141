//! Error Module - Simulator Error Types
//!
//! Defines all error types used in gcsim.
//!
//! # Error Categories
//!
//! ## Layout Errors
//! - `NoAvailableSource` - A phase needs a space or region the layout lacks
//!
//! ## Scheduling Errors
//! - `StaleTransition` - A hold continuation from an earlier epoch
//! - `ConfigurationLocked` - Reconfiguration attempted while running
//!
//! ## Configuration Errors
//! - `Configuration` - Invalid configuration
//! - `InvalidState` - Invalid internal state
//! - `InvalidArgument` - Invalid function argument
//!
//! Capacity overflow and redundant steps are policy outcomes, not errors:
//! they are reported through [`crate::runtime::StepReport`] and
//! [`crate::stats::SimStats`].

use thiserror::Error;

/// Main error type for all simulator operations
///
/// # Examples
///
/// ```rust
/// use gcsim::SimError;
///
/// fn handle_error(err: SimError) {
///     match err {
///         SimError::NoAvailableSource { space } => {
///             eprintln!("layout too small, missing {}", space);
///         }
///         SimError::StaleTransition { .. } => {
///             // Dropped on purpose, nothing to do
///         }
///         _ => eprintln!("Other error: {}", err),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration error
    ///
    /// **When returned:** `initialize` or `configure` with invalid values
    ///
    /// **Recovery strategy:** Fix the configuration; the previous heap is kept
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required space or region missing
    ///
    /// **When returned:** A phase transition needs a destination or source
    /// that the current layout does not provide
    ///
    /// **Recovery strategy:** The step is aborted and the heap is unchanged;
    /// reinitialize with a larger layout
    #[error("No available source: {space} does not exist in this layout")]
    NoAvailableSource { space: String },

    /// Hold continuation from a previous epoch
    ///
    /// **When returned:** `resume` called with a handle that was cancelled
    /// by reset, reconfigure or pause
    ///
    /// **Recovery strategy:** Drop the handle; it is never applied
    #[error("Stale transition: hold {handle} belongs to epoch {epoch}, current epoch is {current}")]
    StaleTransition { handle: u64, epoch: u64, current: u64 },

    /// Reconfiguration while the auto-run loop is armed
    ///
    /// **Recovery strategy:** Pause, then configure
    #[error("Configuration is locked while the simulator is running")]
    ConfigurationLocked,

    /// Invalid state
    ///
    /// **When returned:** Internal state machine violation
    ///
    /// **Recovery strategy:** Cannot recover - indicates bug
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SimError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SimError::StaleTransition { .. }
                | SimError::ConfigurationLocked
                | SimError::Configuration(_)
        )
    }

    /// Check if this error indicates a bug in the code
    pub fn is_bug(&self) -> bool {
        matches!(self, SimError::InvalidState { .. })
    }
}

impl From<crate::config::ConfigError> for SimError {
    fn from(err: crate::config::ConfigError) -> Self {
        SimError::Configuration(err.to_string())
    }
}

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
