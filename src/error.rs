//! Error types for the fight core.
//!
//! Configuration mistakes fail fast when the machine or the tuning table is
//! built. Nothing that happens inside a tick is an error: missing targets,
//! observer-side spawns and stale companions all degrade in place.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// State machine configuration
// ============================================================================

/// Raised by [`crate::fsm::StateMachineBuilder`] while wiring states together.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsmError {
    /// A second behavior was registered for a state that already has one.
    #[error("state {state} already has a registered behavior")]
    DuplicateBehavior { state: String },

    /// A state can become current but has no behavior to run.
    #[error("state {state} can become current but has no registered behavior")]
    MissingBehavior { state: String },

    /// A transition defers to the selector, but none was installed.
    #[error("transition out of {source_state} defers to the selector, but no selector is set")]
    MissingSelector { source_state: String },
}

// ============================================================================
// Tuning files
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tuning file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value parsed fine but makes no sense for the fight (zero-length cycle, ratio out of range).
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ============================================================================
// Top level
// ============================================================================

#[derive(Debug, Error)]
pub enum EmpressError {
    #[error(transparent)]
    Fsm(#[from] FsmError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write recording: {0}")]
    Recording(#[from] std::io::Error),
}

pub type Result<T, E = EmpressError> = std::result::Result<T, E>;
