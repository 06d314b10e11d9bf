//! Per-kind request tasks
//!
//! A task requests one kind of permission: the batch of normal runtime
//! permissions, or one special permission. Both run the same state machine;
//! the kind only decides which predicate is checked and where escalation
//! goes. Every suspension point (native prompt, rationale surface, settings
//! screen) is an awaited call, after which the task re-checks that the host
//! context is still attached.

use permchain_api::{PromptOutcome, SettingsTarget, SpecialKind};
use std::sync::Arc;

use crate::audit::{AuditDetails, AuditEventType};
use crate::continuation::Continuation;
use crate::error::{ChainError, HostError};
use crate::scope::{ExplainScope, ForwardScope, Resolution};
use crate::session::{ChainContext, RequestState};

/// What a task requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Batch of runtime permissions sharing the uniform prompt
    Normal(Vec<String>),
    /// One special kind and every requested identifier the host maps to it
    Special {
        kind: SpecialKind,
        permissions: Vec<String>,
    },
}

impl TaskKind {
    /// Special task for the kind's own identifier
    pub fn special(kind: SpecialKind) -> Self {
        TaskKind::Special {
            kind,
            permissions: vec![kind.permission().to_string()],
        }
    }

    /// Label used in logs and audit records
    pub fn label(&self) -> String {
        match self {
            TaskKind::Normal(_) => "normal".to_string(),
            TaskKind::Special { kind, .. } => kind.to_string(),
        }
    }

    /// Permissions this task is responsible for
    pub fn permissions(&self) -> Vec<String> {
        match self {
            TaskKind::Normal(batch) => batch.clone(),
            TaskKind::Special { permissions, .. } => permissions.clone(),
        }
    }
}

/// Task lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Checking,
    /// Waiting on an explanation shown before any request
    AwaitingExplanation,
    /// Native prompt or kind-specific settings screen is up
    Requesting,
    /// Waiting on an explanation or forward surface after a request
    AwaitingEscalation,
    Finished,
}

impl TaskState {
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Created, Checking)
                | (Checking, Finished)
                | (Checking, AwaitingExplanation)
                | (Checking, Requesting)
                | (AwaitingExplanation, Requesting)
                | (AwaitingExplanation, Finished)
                | (Requesting, Finished)
                | (Requesting, AwaitingEscalation)
                | (AwaitingEscalation, Requesting)
                | (AwaitingEscalation, Finished)
        )
    }
}

/// How a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskExit {
    Finished,
    /// Host context went away; the session must not report
    Abandoned,
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Prompt(Vec<String>),
    Explain {
        permissions: Vec<String>,
        before_request: bool,
    },
    Forward(Vec<String>),
    /// Open the special kind's settings screen
    Escalate,
    Finish,
    Abandon,
}

#[derive(Debug, Clone, Copy)]
enum Surface {
    Explain,
    Forward,
}

pub(crate) struct Task<'a> {
    kind: TaskKind,
    label: String,
    state: TaskState,
    ctx: Arc<ChainContext>,
    request: &'a mut RequestState,
    /// Permanently denied permissions held back while the explain path runs
    carried_forward: Vec<String>,
}

impl<'a> Task<'a> {
    pub(crate) fn new(kind: TaskKind, ctx: Arc<ChainContext>, request: &'a mut RequestState) -> Self {
        let label = kind.label();
        Self {
            kind,
            label,
            state: TaskState::Created,
            ctx,
            request,
            carried_forward: Vec::new(),
        }
    }

    pub(crate) async fn run(mut self) -> Result<TaskExit, ChainError> {
        tracing::debug!(task = %self.label, "Task started");
        self.ctx.record(
            AuditEventType::TaskStarted,
            Some(&self.label),
            AuditDetails::Permissions {
                permissions: self.kind.permissions(),
            },
        );

        self.transition(TaskState::Checking)?;
        let mut step = self.check();

        loop {
            step = match step {
                Step::Prompt(permissions) => self.prompt(permissions).await?,
                Step::Explain {
                    permissions,
                    before_request,
                } => self.explain(permissions, before_request).await?,
                Step::Forward(permissions) => self.forward(permissions).await?,
                Step::Escalate => self.escalate().await?,
                Step::Finish => {
                    self.finish()?;
                    return Ok(TaskExit::Finished);
                }
                Step::Abandon => {
                    tracing::debug!(task = %self.label, state = ?self.state, "Host detached, abandoning task");
                    return Ok(TaskExit::Abandoned);
                }
            };
        }
    }

    fn transition(&mut self, next: TaskState) -> Result<(), ChainError> {
        if self.state == TaskState::Finished {
            tracing::error!(task = %self.label, to = ?next, "Task used after finish");
            return Err(ChainError::AlreadyFinished(self.label.clone()));
        }
        if !self.state.can_transition_to(next) {
            tracing::error!(task = %self.label, from = ?self.state, to = ?next, "Invalid task transition");
            return Err(ChainError::InvalidTransition {
                task: self.label.clone(),
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(task = %self.label, from = ?self.state, to = ?next, "Task transition");
        self.state = next;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Check
    // ------------------------------------------------------------------

    fn check(&mut self) -> Step {
        match self.kind.clone() {
            TaskKind::Normal(batch) => self.check_normal(&batch),
            TaskKind::Special { kind, permissions } => self.check_special(kind, &permissions),
        }
    }

    fn check_normal(&mut self, batch: &[String]) -> Step {
        let mut request_list = Vec::new();
        for permission in batch {
            if self.ctx.host.is_granted(permission) {
                self.request.ledger.grant(permission);
            } else {
                request_list.push(permission.clone());
            }
        }

        if request_list.is_empty() {
            return Step::Finish;
        }

        if self.request.explain_reason_before_request && self.ctx.callbacks.has_explain() {
            self.request.explain_reason_before_request = false;
            for permission in &request_list {
                self.request.ledger.deny(permission);
            }
            return Step::Explain {
                permissions: request_list,
                before_request: true,
            };
        }

        // The whole batch: grants may have been revoked since the check
        Step::Prompt(batch.to_vec())
    }

    fn check_special(&mut self, kind: SpecialKind, permissions: &[String]) -> Step {
        if !self.ctx.host.special_applies(kind) {
            tracing::debug!(task = %self.label, "Not applicable on this platform, implicitly held");
            self.grant_all(permissions);
            return Step::Finish;
        }

        if self.ctx.host.is_special_granted(kind) {
            self.grant_all(permissions);
            return Step::Finish;
        }

        // No native prompt exists; without an explanation there is no way to ask
        if !self.ctx.callbacks.has_explain() {
            return Step::Finish;
        }

        self.request.explain_reason_before_request = false;
        for permission in permissions {
            self.request.ledger.deny(permission);
        }
        Step::Explain {
            permissions: permissions.to_vec(),
            before_request: true,
        }
    }

    fn grant_all(&mut self, permissions: &[String]) {
        for permission in permissions {
            self.request.ledger.grant(permission);
        }
    }

    // ------------------------------------------------------------------
    // Request
    // ------------------------------------------------------------------

    async fn prompt(&mut self, permissions: Vec<String>) -> Result<Step, ChainError> {
        self.transition(TaskState::Requesting)?;
        self.ctx.record(
            AuditEventType::PromptShown,
            Some(&self.label),
            AuditDetails::Permissions {
                permissions: permissions.clone(),
            },
        );

        let outcome = match self.ctx.host.prompt(&permissions).await {
            Ok(outcome) => outcome,
            Err(HostError::Detached) => return Ok(Step::Abandon),
            Err(e) => {
                tracing::warn!(task = %self.label, error = %e, "Prompt failed, treating as denied");
                PromptOutcome::all_denied(&permissions)
            }
        };

        if !self.ctx.host.is_attached() {
            return Ok(Step::Abandon);
        }

        Ok(self.on_prompt_result(&permissions, outcome))
    }

    fn on_prompt_result(&mut self, prompted: &[String], outcome: PromptOutcome) -> Step {
        let batch = self.kind.permissions();
        let mut explainable = Vec::new();
        let mut permanently_denied = Vec::new();

        for permission in &batch {
            if outcome.granted.contains(permission) {
                self.request.ledger.grant(permission);
                continue;
            }
            let reported_denied =
                outcome.denied.contains(permission) || prompted.contains(permission);
            if !reported_denied && !self.request.ledger.is_denied(permission) {
                continue;
            }
            // May have been enabled from settings in the meantime
            if self.ctx.host.is_granted(permission) {
                self.request.ledger.grant(permission);
                continue;
            }
            self.request.ledger.deny(permission);
            // Left out of this prompt: nothing to classify, stays denied
            if !reported_denied {
                continue;
            }
            if self.ctx.host.can_show_rationale(permission) {
                explainable.push(permission.clone());
            } else {
                permanently_denied.push(permission.clone());
            }
        }

        tracing::debug!(
            task = %self.label,
            ?explainable,
            ?permanently_denied,
            "Prompt resolved"
        );

        let callbacks = &self.ctx.callbacks;
        if callbacks.has_explain() && !explainable.is_empty() {
            for permission in permanently_denied {
                if !self.carried_forward.contains(&permission) {
                    self.carried_forward.push(permission);
                }
            }
            return Step::Explain {
                permissions: explainable,
                before_request: false,
            };
        }

        if callbacks.has_forward() {
            let mut forward_list = std::mem::take(&mut self.carried_forward);
            for permission in permanently_denied {
                if !forward_list.contains(&permission) {
                    forward_list.push(permission);
                }
            }
            forward_list.retain(|p| self.request.ledger.is_denied(p));
            if !forward_list.is_empty() {
                return Step::Forward(forward_list);
            }
        }

        Step::Finish
    }

    /// Re-prompt for the given permissions plus the batch's current grants
    fn request_again(&mut self, permissions: Vec<String>) -> Step {
        let TaskKind::Normal(batch) = &self.kind else {
            return Step::Escalate;
        };

        let mut requested: Vec<String> = Vec::new();
        for permission in permissions {
            if batch.contains(&permission) && !requested.contains(&permission) {
                requested.push(permission);
            }
        }

        if requested.iter().all(|p| self.request.ledger.is_granted(p)) {
            tracing::debug!(task = %self.label, "Nothing left to request");
            return Step::Finish;
        }

        let mut prompt_list: Vec<String> = batch
            .iter()
            .filter(|p| self.request.ledger.is_granted(p))
            .cloned()
            .collect();
        for permission in requested {
            if !prompt_list.contains(&permission) {
                prompt_list.push(permission);
            }
        }
        Step::Prompt(prompt_list)
    }

    // ------------------------------------------------------------------
    // Escalation
    // ------------------------------------------------------------------

    async fn explain(
        &mut self,
        permissions: Vec<String>,
        before_request: bool,
    ) -> Result<Step, ChainError> {
        let next = if self.state == TaskState::Checking {
            TaskState::AwaitingExplanation
        } else {
            TaskState::AwaitingEscalation
        };
        self.transition(next)?;

        let continuation = Arc::new(Continuation::new());
        let scope = ExplainScope::new(self.ctx.clone(), self.label.clone(), continuation.clone());
        let ctx = self.ctx.clone();
        ctx.callbacks
            .explain(scope, permissions, before_request)
            .await;

        self.resolve(continuation.take(), Surface::Explain).await
    }

    async fn forward(&mut self, permissions: Vec<String>) -> Result<Step, ChainError> {
        self.transition(TaskState::AwaitingEscalation)?;

        let continuation = Arc::new(Continuation::new());
        let scope = ForwardScope::new(self.ctx.clone(), self.label.clone(), continuation.clone());
        let ctx = self.ctx.clone();
        ctx.callbacks.forward(scope, permissions).await;

        self.resolve(continuation.take(), Surface::Forward).await
    }

    async fn resolve(
        &mut self,
        resolution: Option<Resolution>,
        surface: Surface,
    ) -> Result<Step, ChainError> {
        if !self.ctx.host.is_attached() {
            return Ok(Step::Abandon);
        }

        match resolution {
            None => {
                tracing::debug!(task = %self.label, "Callback did not use its scope, finishing");
                Ok(Step::Finish)
            }
            Some(Resolution::Detached) => Ok(Step::Abandon),
            Some(Resolution::Abort(permissions)) => {
                let own = self.kind.permissions();
                for permission in permissions.iter().filter(|p| own.contains(p)) {
                    if !self.request.ledger.is_granted(permission) {
                        self.request.ledger.deny(permission);
                    }
                }
                Ok(Step::Finish)
            }
            Some(Resolution::Proceed(permissions)) => {
                let normal = matches!(self.kind, TaskKind::Normal(_));
                match surface {
                    Surface::Explain => Ok(self.request_again(permissions)),
                    Surface::Forward if normal => {
                        if self.open_settings(SettingsTarget::AppDetails).await {
                            Ok(self.request_again(permissions))
                        } else {
                            Ok(Step::Abandon)
                        }
                    }
                    Surface::Forward => Ok(Step::Escalate),
                }
            }
        }
    }

    /// Send the user to the special kind's settings screen and re-check on return
    async fn escalate(&mut self) -> Result<Step, ChainError> {
        let TaskKind::Special { kind, .. } = self.kind else {
            return Ok(Step::Finish);
        };
        let permissions = self.kind.permissions();

        self.transition(TaskState::Requesting)?;

        if self.ctx.host.is_special_granted(kind) {
            self.grant_all(&permissions);
            return Ok(Step::Finish);
        }

        if !self.open_settings(kind.settings_target()).await {
            return Ok(Step::Abandon);
        }

        if self.ctx.host.is_special_granted(kind) {
            self.grant_all(&permissions);
            return Ok(Step::Finish);
        }

        if self.ctx.callbacks.has_explain() {
            for permission in &permissions {
                self.request.ledger.deny(permission);
            }
            return Ok(Step::Explain {
                permissions,
                before_request: false,
            });
        }

        Ok(Step::Finish)
    }

    /// Returns false when the host detached while the screen was up
    async fn open_settings(&mut self, target: SettingsTarget) -> bool {
        self.ctx.record(
            AuditEventType::SettingsOpened,
            Some(&self.label),
            AuditDetails::Settings { target },
        );

        match self.ctx.host.open_settings(target).await {
            Ok(()) => {}
            Err(HostError::Detached) => return false,
            Err(e) => {
                tracing::warn!(task = %self.label, ?target, error = %e, "Settings screen not opened");
            }
        }

        self.ctx.host.is_attached()
    }

    // ------------------------------------------------------------------
    // Finish
    // ------------------------------------------------------------------

    fn finish(&mut self) -> Result<(), ChainError> {
        self.transition(TaskState::Finished)?;

        let mut granted = Vec::new();
        let mut denied = Vec::new();
        for permission in self.kind.permissions() {
            if self.request.ledger.is_granted(&permission) {
                granted.push(permission);
            } else {
                self.request.ledger.deny(&permission);
                denied.push(permission);
            }
        }

        tracing::debug!(task = %self.label, ?granted, ?denied, "Task finished");
        if !granted.is_empty() {
            self.ctx.record(
                AuditEventType::PermissionGranted,
                Some(&self.label),
                AuditDetails::Permissions {
                    permissions: granted,
                },
            );
        }
        if !denied.is_empty() {
            self.ctx.record(
                AuditEventType::PermissionDenied,
                Some(&self.label),
                AuditDetails::Permissions {
                    permissions: denied,
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{Callbacks, DefaultExplainReason};
    use crate::config::ChainPresets;
    use crate::host::{SimulatedHost, UserResponse};
    use permchain_api::ids;

    fn context(host: SimulatedHost, callbacks: Callbacks) -> Arc<ChainContext> {
        Arc::new(ChainContext::new(ChainPresets::testing(host), callbacks))
    }

    fn with_explain() -> Callbacks {
        Callbacks {
            explain_with_before: Some(Arc::new(DefaultExplainReason::new(
                "needed",
                "OK",
                Some("Cancel"),
            ))),
            ..Default::default()
        }
    }

    fn normal(perms: &[&str]) -> TaskKind {
        TaskKind::Normal(perms.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_transitions() {
        use TaskState::*;
        assert!(Created.can_transition_to(Checking));
        assert!(Checking.can_transition_to(AwaitingExplanation));
        assert!(AwaitingEscalation.can_transition_to(Requesting));
        assert!(!Created.can_transition_to(Finished));
        assert!(!Checking.can_transition_to(AwaitingEscalation));
        assert!(!Requesting.can_transition_to(Requesting));
        assert!(!Finished.can_transition_to(Checking));
    }

    #[test]
    fn test_double_finish_is_rejected() {
        let ctx = context(SimulatedHost::new(), Callbacks::default());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA]), ctx, &mut state);

        task.transition(TaskState::Checking).unwrap();
        task.finish().unwrap();
        assert_eq!(
            task.finish(),
            Err(ChainError::AlreadyFinished("normal".to_string()))
        );
    }

    #[test]
    fn test_invalid_transition() {
        let ctx = context(SimulatedHost::new(), Callbacks::default());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA]), ctx, &mut state);

        let err = task.transition(TaskState::Requesting).unwrap_err();
        assert!(matches!(err, ChainError::InvalidTransition { .. }));
    }

    #[test]
    fn test_finish_denies_outstanding() {
        let ctx = context(SimulatedHost::new(), Callbacks::default());
        let mut state = RequestState::default();
        {
            let mut task = Task::new(normal(&[ids::CAMERA, ids::RECORD_AUDIO]), ctx, &mut state);
            task.request.ledger.grant(ids::CAMERA);
            task.transition(TaskState::Checking).unwrap();
            task.finish().unwrap();
        }
        assert!(state.ledger.is_granted(ids::CAMERA));
        assert!(state.ledger.is_denied(ids::RECORD_AUDIO));
    }

    #[test]
    fn test_check_normal_prompts_whole_batch() {
        let host = SimulatedHost::new().with_granted(ids::CAMERA);
        let ctx = context(host, Callbacks::default());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA, ids::RECORD_AUDIO]), ctx, &mut state);

        let step = task.check();
        assert_eq!(
            step,
            Step::Prompt(vec![ids::CAMERA.to_string(), ids::RECORD_AUDIO.to_string()])
        );
        assert!(task.request.ledger.is_granted(ids::CAMERA));
    }

    #[test]
    fn test_check_normal_consumes_flag() {
        let ctx = context(SimulatedHost::new(), with_explain());
        let mut state = RequestState {
            explain_reason_before_request: true,
            ..Default::default()
        };
        {
            let mut task = Task::new(normal(&[ids::CAMERA]), ctx, &mut state);
            assert_eq!(
                task.check(),
                Step::Explain {
                    permissions: vec![ids::CAMERA.to_string()],
                    before_request: true
                }
            );
        }
        assert!(!state.explain_reason_before_request);
        assert!(state.ledger.is_denied(ids::CAMERA));
    }

    #[test]
    fn test_check_special_exempt() {
        let host = SimulatedHost::new().with_exempt(SpecialKind::SystemAlertWindow);
        let ctx = context(host, with_explain());
        let mut state = RequestState::default();
        let mut task = Task::new(TaskKind::special(SpecialKind::SystemAlertWindow), ctx, &mut state);

        assert_eq!(task.check(), Step::Finish);
        assert!(task.request.ledger.is_granted(ids::SYSTEM_ALERT_WINDOW));
    }

    #[test]
    fn test_check_special_covers_every_identifier() {
        let alias = "com.example.OVERLAY".to_string();
        let overlay = TaskKind::Special {
            kind: SpecialKind::SystemAlertWindow,
            permissions: vec![alias.clone(), ids::SYSTEM_ALERT_WINDOW.to_string()],
        };
        let ctx = context(SimulatedHost::new(), with_explain());
        let mut state = RequestState::default();
        {
            let mut task = Task::new(overlay.clone(), ctx, &mut state);
            task.transition(TaskState::Checking).unwrap();
            assert_eq!(
                task.check(),
                Step::Explain {
                    permissions: overlay.permissions(),
                    before_request: true
                }
            );
        }
        assert!(state.ledger.is_denied(&alias));
        assert!(state.ledger.is_denied(ids::SYSTEM_ALERT_WINDOW));

        let host = SimulatedHost::new().with_exempt(SpecialKind::SystemAlertWindow);
        let mut state = RequestState::default();
        {
            let mut task = Task::new(overlay, context(host, with_explain()), &mut state);
            assert_eq!(task.check(), Step::Finish);
        }
        assert!(state.ledger.is_granted(&alias));
        assert!(state.ledger.is_granted(ids::SYSTEM_ALERT_WINDOW));
    }

    #[test]
    fn test_check_special_without_explain() {
        let ctx = context(SimulatedHost::new(), Callbacks::default());
        let mut state = RequestState::default();
        let mut task = Task::new(TaskKind::special(SpecialKind::WriteSettings), ctx, &mut state);

        assert_eq!(task.check(), Step::Finish);
    }

    #[test]
    fn test_request_again_filters_and_merges() {
        let ctx = context(SimulatedHost::new(), Callbacks::default());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA, ids::RECORD_AUDIO]), ctx, &mut state);
        task.request.ledger.grant(ids::CAMERA);
        task.request.ledger.deny(ids::RECORD_AUDIO);

        let step = task.request_again(vec![ids::RECORD_AUDIO.to_string(), "foreign".to_string()]);
        assert_eq!(
            step,
            Step::Prompt(vec![ids::CAMERA.to_string(), ids::RECORD_AUDIO.to_string()])
        );
    }

    #[test]
    fn test_request_again_with_granted_only_finishes() {
        let ctx = context(SimulatedHost::new(), Callbacks::default());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA]), ctx, &mut state);
        task.request.ledger.grant(ids::CAMERA);

        assert_eq!(task.request_again(vec![ids::CAMERA.to_string()]), Step::Finish);
        assert_eq!(task.request_again(Vec::new()), Step::Finish);
    }

    #[tokio::test]
    async fn test_prompt_result_routing() {
        let host = SimulatedHost::new()
            .respond(ids::CAMERA, UserResponse::Deny)
            .respond(ids::RECORD_AUDIO, UserResponse::DenyPermanently);
        let ctx = context(host, with_explain());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA, ids::RECORD_AUDIO]), ctx.clone(), &mut state);
        let prompted = vec![ids::CAMERA.to_string(), ids::RECORD_AUDIO.to_string()];

        let outcome = ctx.host.prompt(&prompted).await.unwrap();
        let step = task.on_prompt_result(&prompted, outcome);

        assert_eq!(
            step,
            Step::Explain {
                permissions: vec![ids::CAMERA.to_string()],
                before_request: false
            }
        );
        assert_eq!(task.carried_forward, vec![ids::RECORD_AUDIO.to_string()]);
    }

    #[tokio::test]
    async fn test_prompt_result_rechecks_denied() {
        let host = SimulatedHost::new().with_granted(ids::CAMERA);
        let ctx = context(host, with_explain());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA]), ctx, &mut state);

        // platform reports denied but the permission is on by now
        let outcome = PromptOutcome::all_denied(&[ids::CAMERA.to_string()]);
        task.request.ledger.deny(ids::CAMERA);
        let step = task.on_prompt_result(&[], outcome);

        assert_eq!(step, Step::Finish);
        assert!(task.request.ledger.is_granted(ids::CAMERA));
    }

    #[tokio::test]
    async fn test_prompt_result_leaves_unprompted_denials() {
        let host = SimulatedHost::new().respond(ids::CAMERA, UserResponse::Deny);
        let ctx = context(host, with_explain());
        let mut state = RequestState::default();
        let mut task = Task::new(normal(&[ids::CAMERA, ids::RECORD_AUDIO]), ctx.clone(), &mut state);
        task.request.ledger.deny(ids::CAMERA);
        task.request.ledger.deny(ids::RECORD_AUDIO);

        // only CAMERA went through the prompt
        let prompted = vec![ids::CAMERA.to_string()];
        let outcome = ctx.host.prompt(&prompted).await.unwrap();
        let step = task.on_prompt_result(&prompted, outcome);

        assert_eq!(
            step,
            Step::Explain {
                permissions: vec![ids::CAMERA.to_string()],
                before_request: false
            }
        );
        assert!(task.carried_forward.is_empty());
        assert!(task.request.ledger.is_denied(ids::RECORD_AUDIO));
    }
}
