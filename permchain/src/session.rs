//! Request sessions
//!
//! A [`Session`] owns one logical permission request. It splits the
//! requested identifiers into the normal batch and the special kinds, runs
//! one task per group strictly in sequence, and hands the aggregated result
//! to the result callback exactly once.

use permchain_api::{DialogTint, PermissionResult, SpecialKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Instrument;

use crate::audit::{AuditDetails, AuditEvent, AuditEventType, AuditSink};
use crate::callback::{Callbacks, RequestCallback};
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::host::PermissionHost;
use crate::ledger::PermissionLedger;
use crate::rationale::RationalePresenter;
use crate::task::{Task, TaskExit, TaskKind};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Everything a task or scope of one session can reach
pub(crate) struct ChainContext {
    pub(crate) host: Arc<dyn PermissionHost>,
    pub(crate) presenter: Arc<dyn RationalePresenter>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) tint: DialogTint,
    pub(crate) callbacks: Callbacks,
    pub(crate) session_id: String,
}

impl ChainContext {
    pub(crate) fn new(config: ChainConfig, callbacks: Callbacks) -> Self {
        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        Self {
            host: config.host,
            presenter: config.presenter,
            audit: config.audit,
            tint: config.tint,
            callbacks,
            session_id: format!("session-{}", id),
        }
    }

    /// Record an audit event; failures are logged and otherwise ignored
    pub(crate) fn record(&self, event_type: AuditEventType, task: Option<&str>, details: AuditDetails) {
        let mut event = AuditEvent::new(event_type, self.session_id.clone(), details);
        if let Some(task) = task {
            event = event.with_task(task);
        }
        if let Err(e) = self.audit.record(event) {
            tracing::warn!(error = %e, ?event_type, "Failed to record audit event");
        }
    }
}

/// Mutable state the active task works on
#[derive(Debug, Default)]
pub(crate) struct RequestState {
    pub(crate) ledger: PermissionLedger,
    /// One-shot: cleared by the first explanation that acts on it
    pub(crate) explain_reason_before_request: bool,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The result callback was invoked with this result
    Completed(PermissionResult),
    /// The host context went away; the result callback was dropped unused
    Abandoned,
}

impl SessionOutcome {
    pub fn result(&self) -> Option<&PermissionResult> {
        match self {
            SessionOutcome::Completed(result) => Some(result),
            SessionOutcome::Abandoned => None,
        }
    }
}

/// One logical permission request
pub struct Session {
    ctx: Arc<ChainContext>,
    requested: Vec<String>,
    normal: Vec<String>,
    /// Each special kind with the requested identifiers that map to it
    special: Vec<(SpecialKind, Vec<String>)>,
    state: RequestState,
    result_callback: Option<Box<dyn RequestCallback>>,
    started: bool,
}

impl Session {
    pub(crate) fn new(
        config: ChainConfig,
        permissions: Vec<String>,
        callbacks: Callbacks,
        explain_reason_before_request: bool,
        result_callback: Box<dyn RequestCallback>,
    ) -> Self {
        let ctx = Arc::new(ChainContext::new(config, callbacks));

        let mut requested: Vec<String> = Vec::new();
        let mut normal = Vec::new();
        let mut special: Vec<(SpecialKind, Vec<String>)> = Vec::new();
        for permission in permissions {
            if requested.contains(&permission) {
                continue;
            }
            match ctx.host.special_kind(&permission) {
                Some(kind) => match special.iter_mut().find(|(k, _)| *k == kind) {
                    Some((_, aliases)) => aliases.push(permission.clone()),
                    None => special.push((kind, vec![permission.clone()])),
                },
                None => normal.push(permission.clone()),
            }
            requested.push(permission);
        }

        Self {
            ctx,
            requested,
            normal,
            special,
            state: RequestState {
                ledger: PermissionLedger::new(),
                explain_reason_before_request,
            },
            result_callback: Some(result_callback),
            started: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.ctx.session_id
    }

    /// Every requested identifier, deduplicated, in configuration order
    pub fn requested_permissions(&self) -> &[String] {
        &self.requested
    }

    pub fn normal_permissions(&self) -> &[String] {
        &self.normal
    }

    /// Special kinds in the order their tasks run
    pub fn special_permissions(&self) -> Vec<SpecialKind> {
        self.special.iter().map(|(kind, _)| *kind).collect()
    }

    /// Tasks in the order they run
    pub fn plan(&self) -> Vec<TaskKind> {
        let mut tasks = Vec::with_capacity(self.special.len() + 1);
        if !self.normal.is_empty() {
            tasks.push(TaskKind::Normal(self.normal.clone()));
        }
        tasks.extend(self.special.iter().map(|(kind, permissions)| TaskKind::Special {
            kind: *kind,
            permissions: permissions.clone(),
        }));
        tasks
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Run the chain to completion
    ///
    /// May be called once. Returns [`SessionOutcome::Abandoned`] without
    /// invoking the result callback if the host context was torn down.
    pub async fn start(&mut self) -> Result<SessionOutcome, ChainError> {
        if self.started {
            tracing::error!(session = %self.ctx.session_id, "Session started twice");
            return Err(ChainError::AlreadyStarted);
        }
        self.started = true;

        let span = tracing::info_span!("session", id = %self.ctx.session_id);
        self.run().instrument(span).await
    }

    async fn run(&mut self) -> Result<SessionOutcome, ChainError> {
        tracing::info!(permissions = ?self.requested, "Permission session started");
        self.ctx.record(
            AuditEventType::SessionStarted,
            None,
            AuditDetails::Permissions {
                permissions: self.requested.clone(),
            },
        );

        for kind in self.plan() {
            if !self.ctx.host.is_attached() {
                return Ok(self.abandon());
            }
            let exit = Task::new(kind, self.ctx.clone(), &mut self.state)
                .run()
                .await?;
            if exit == TaskExit::Abandoned {
                return Ok(self.abandon());
            }
        }

        if !self.ctx.host.is_attached() {
            return Ok(self.abandon());
        }

        let result = std::mem::take(&mut self.state.ledger).into_result();
        tracing::info!(
            all_granted = result.all_granted,
            granted = ?result.granted,
            denied = ?result.denied,
            "Permission session completed"
        );
        self.ctx.record(
            AuditEventType::SessionCompleted,
            None,
            AuditDetails::Result {
                result: result.clone(),
            },
        );
        self.flush_audit();

        if let Some(callback) = self.result_callback.take() {
            callback.on_result(result.clone());
        }
        Ok(SessionOutcome::Completed(result))
    }

    fn abandon(&mut self) -> SessionOutcome {
        tracing::info!("Host detached, abandoning session");
        self.result_callback = None;
        self.ctx
            .record(AuditEventType::SessionAbandoned, None, AuditDetails::None);
        self.flush_audit();
        SessionOutcome::Abandoned
    }

    fn flush_audit(&self) {
        if let Err(e) = self.ctx.audit.flush() {
            tracing::warn!(error = %e, "Failed to flush audit sink");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.ctx.session_id)
            .field("normal", &self.normal)
            .field("special", &self.special)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainPresets;
    use crate::host::SimulatedHost;
    use permchain_api::ids;

    fn session(host: SimulatedHost, permissions: &[&str]) -> Session {
        Session::new(
            ChainPresets::testing(host),
            permissions.iter().map(|s| s.to_string()).collect(),
            Callbacks::default(),
            false,
            Box::new(|_: PermissionResult| {}),
        )
    }

    #[test]
    fn test_partition_keeps_configuration_order() {
        let s = session(
            SimulatedHost::new(),
            &[
                ids::SYSTEM_ALERT_WINDOW,
                ids::CAMERA,
                ids::POST_NOTIFICATIONS,
                ids::CAMERA,
                ids::RECORD_AUDIO,
            ],
        );

        assert_eq!(s.requested_permissions().len(), 4);
        assert_eq!(s.normal_permissions(), &[ids::CAMERA, ids::RECORD_AUDIO]);
        assert_eq!(
            s.special_permissions(),
            vec![SpecialKind::SystemAlertWindow, SpecialKind::Notification]
        );
        assert_eq!(
            s.plan(),
            vec![
                TaskKind::Normal(vec![ids::CAMERA.to_string(), ids::RECORD_AUDIO.to_string()]),
                TaskKind::special(SpecialKind::SystemAlertWindow),
                TaskKind::special(SpecialKind::Notification),
            ]
        );
    }

    #[test]
    fn test_runtime_notifications_join_normal_batch() {
        let s = session(
            SimulatedHost::new().with_runtime_notifications(),
            &[ids::POST_NOTIFICATIONS],
        );
        assert_eq!(s.normal_permissions(), &[ids::POST_NOTIFICATIONS]);
        assert!(s.special_permissions().is_empty());
    }

    #[test]
    fn test_aliases_share_one_special_task() {
        let s = session(
            SimulatedHost::new().with_alias("com.example.OVERLAY", SpecialKind::SystemAlertWindow),
            &["com.example.OVERLAY", ids::SYSTEM_ALERT_WINDOW],
        );

        assert_eq!(s.requested_permissions().len(), 2);
        assert_eq!(s.special_permissions(), vec![SpecialKind::SystemAlertWindow]);
        assert_eq!(
            s.plan(),
            vec![TaskKind::Special {
                kind: SpecialKind::SystemAlertWindow,
                permissions: vec![
                    "com.example.OVERLAY".to_string(),
                    ids::SYSTEM_ALERT_WINDOW.to_string()
                ],
            }]
        );
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = session(SimulatedHost::new(), &[]);
        let b = session(SimulatedHost::new(), &[]);
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("session-"));
    }

    #[tokio::test]
    async fn test_empty_request_completes_immediately() {
        let mut s = session(SimulatedHost::new(), &[]);
        let outcome = s.start().await.unwrap();
        assert_eq!(
            outcome,
            SessionOutcome::Completed(PermissionResult::new(vec![], vec![]))
        );
        assert!(outcome.result().unwrap().all_granted);
    }

    #[tokio::test]
    async fn test_start_twice() {
        let mut s = session(SimulatedHost::new(), &[]);
        s.start().await.unwrap();
        assert!(s.is_started());
        assert_eq!(s.start().await, Err(ChainError::AlreadyStarted));
    }
}
