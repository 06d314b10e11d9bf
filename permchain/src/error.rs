//! Error types for the request engine

use thiserror::Error;

use crate::task::TaskState;

/// Contract violations inside a request chain
///
/// These are programming errors. They are returned to the caller and logged;
/// the engine never swallows them because each one would corrupt the
/// granted/denied bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Session was already started")]
    AlreadyStarted,

    #[error("Task {0} was already finished")]
    AlreadyFinished(String),

    #[error("Task {task}: invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        task: String,
        from: TaskState,
        to: TaskState,
    },

    #[error("Continuation was already resolved")]
    ContinuationResolved,

    #[error("Continuation is closed; the scope outlived its task")]
    ContinuationClosed,
}

/// Error reported by the permission host
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The owning UI context was torn down
    #[error("Host context detached")]
    Detached,

    #[error("Platform prompt failed: {0}")]
    Prompt(String),

    #[error("Failed to open settings: {0}")]
    Settings(String),
}

/// Error raised while presenting a rationale surface
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("Non-interactive environment")]
    NonInteractive,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The host context disappeared while the surface was shown
    #[error("Host context detached")]
    Detached,

    #[error("Presenter failed: {0}")]
    Other(String),
}
