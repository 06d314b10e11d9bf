//! permchain: permission request orchestration
//!
//! Request a mixed set of runtime and special permissions in one call and
//! receive one aggregated result. The engine runs a chain of tasks (the
//! normal batch first, then each special permission in configuration order),
//! routing denials to developer-supplied explain and forward-to-settings
//! callbacks along the way.

pub mod audit;
pub mod callback;
pub mod config;
pub mod continuation;
pub mod error;
pub mod host;
pub mod ledger;
pub mod rationale;
pub mod request;
pub mod scope;
pub mod session;
pub mod task;

pub use audit::{
    AuditDetails, AuditError, AuditEvent, AuditEventType, AuditSink, FileAuditSink,
    MemoryAuditSink, NullAuditSink,
};
pub use callback::{
    DefaultExplainReason, DefaultForwardToSettings, ExplainReasonCallback,
    ExplainReasonCallbackWithBeforeParam, ForwardToSettingsCallback, RequestCallback,
};
pub use config::{ChainConfig, ChainConfigBuilder, ChainPresets, ConfigError};
pub use error::{ChainError, HostError, PresentError};
pub use host::{HostEvent, PermissionHost, SimulatedHost, UserResponse};
pub use ledger::PermissionLedger;
pub use rationale::{
    AutoPresenter, DefaultSurface, RationaleContent, RationaleItem, RationalePresenter,
    RationalePurpose, RationaleSurface, RecordedRationale, RecordingPresenter, TerminalPresenter,
};
pub use request::PermissionRequest;
pub use scope::{ExplainScope, ForwardScope};
pub use session::{Session, SessionOutcome};
pub use task::{TaskKind, TaskState};
pub use permchain_api::{
    ids, DialogTint, PermissionResult, PromptOutcome, SettingsTarget, SpecialKind, SurfaceAction,
};
