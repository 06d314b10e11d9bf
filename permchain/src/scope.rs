//! Explain and forward scopes
//!
//! A scope is the capability a callback receives to advance its task. It is
//! created for one explanation (or forward) opportunity and consumed by the
//! first `show_*` call, so it can resolve its task at most once. A scope
//! that escapes its callback and is used after the task moved on fails with
//! [`ChainError::ContinuationClosed`].

use permchain_api::SurfaceAction;
use std::sync::Arc;

use crate::audit::{AuditDetails, AuditEventType};
use crate::continuation::Continuation;
use crate::error::{ChainError, PresentError};
use crate::rationale::{DefaultSurface, RationaleContent, RationalePurpose, RationaleSurface};
use crate::session::ChainContext;

/// How a scope resolved its task
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Positive action: request again, or go to settings first
    Proceed(Vec<String>),
    /// Negative action, or nothing to show: finish with these denied
    Abort(Vec<String>),
    /// The host context went away while the surface was up
    Detached,
}

struct ScopeCore {
    ctx: Arc<ChainContext>,
    task: String,
    continuation: Arc<Continuation<Resolution>>,
}

impl ScopeCore {
    fn default_surface(
        &self,
        purpose: RationalePurpose,
        permissions: Vec<String>,
        message: String,
        positive_text: String,
        negative_text: Option<String>,
    ) -> DefaultSurface {
        let content = RationaleContent::new(
            self.ctx.host.as_ref(),
            purpose,
            permissions,
            message,
            positive_text,
            negative_text,
            self.ctx.tint,
        );
        DefaultSurface::new(content, self.ctx.presenter.clone())
    }

    async fn resolve_with(
        self,
        surface: &dyn RationaleSurface,
        purpose: RationalePurpose,
    ) -> Result<(), ChainError> {
        let permissions = surface.permissions_to_request();

        let resolution = if permissions.is_empty() || surface.is_empty() {
            tracing::debug!(task = %self.task, "Nothing to show on rationale, finishing task");
            Resolution::Abort(permissions)
        } else {
            self.ctx.record(
                AuditEventType::RationaleShown,
                Some(&self.task),
                AuditDetails::Rationale {
                    purpose,
                    permissions: permissions.clone(),
                },
            );
            match surface.show().await {
                Ok(SurfaceAction::Positive) => Resolution::Proceed(permissions),
                Ok(SurfaceAction::Negative) => {
                    if !surface.has_negative_action() {
                        tracing::error!(
                            task = %self.task,
                            "Negative action from a surface that offers none"
                        );
                    }
                    Resolution::Abort(permissions)
                }
                Err(PresentError::Detached) => Resolution::Detached,
                Err(e) => {
                    tracing::warn!(task = %self.task, error = %e, "Rationale not shown, treating as declined");
                    Resolution::Abort(permissions)
                }
            }
        };

        let resolution = if self.ctx.host.is_attached() {
            resolution
        } else {
            Resolution::Detached
        };

        self.continuation.resolve(resolution).map_err(|e| {
            tracing::error!(task = %self.task, error = %e, "Scope resolved outside its task");
            e
        })
    }
}

/// Scope handed to explain callbacks
///
/// The positive action requests the listed permissions again; the negative
/// action finishes the task with them denied.
pub struct ExplainScope {
    core: ScopeCore,
}

impl ExplainScope {
    pub(crate) fn new(
        ctx: Arc<ChainContext>,
        task: impl Into<String>,
        continuation: Arc<Continuation<Resolution>>,
    ) -> Self {
        Self {
            core: ScopeCore {
                ctx,
                task: task.into(),
                continuation,
            },
        }
    }

    /// Show the default rationale built from these texts
    ///
    /// Without `negative_text` the permissions are mandatory and no abort
    /// path is offered.
    pub async fn show_request_reason_dialog(
        self,
        permissions: Vec<String>,
        message: impl Into<String>,
        positive_text: impl Into<String>,
        negative_text: Option<String>,
    ) -> Result<(), ChainError> {
        let surface = self.core.default_surface(
            RationalePurpose::Explain,
            permissions,
            message.into(),
            positive_text.into(),
            negative_text,
        );
        self.core
            .resolve_with(&surface, RationalePurpose::Explain)
            .await
    }

    /// Show a caller-supplied surface
    pub async fn show_rationale<S: RationaleSurface>(self, surface: S) -> Result<(), ChainError> {
        self.core
            .resolve_with(&surface, RationalePurpose::Explain)
            .await
    }
}

/// Scope handed to forward-to-settings callbacks
///
/// The positive action opens the settings screen for the task (the generic
/// app screen for runtime permissions, the kind-specific screen for special
/// ones) and re-requests on return; the negative action finishes the task
/// with the permissions denied.
pub struct ForwardScope {
    core: ScopeCore,
}

impl ForwardScope {
    pub(crate) fn new(
        ctx: Arc<ChainContext>,
        task: impl Into<String>,
        continuation: Arc<Continuation<Resolution>>,
    ) -> Self {
        Self {
            core: ScopeCore {
                ctx,
                task: task.into(),
                continuation,
            },
        }
    }

    /// Show the default settings rationale built from these texts
    pub async fn show_forward_to_settings_dialog(
        self,
        permissions: Vec<String>,
        message: impl Into<String>,
        positive_text: impl Into<String>,
        negative_text: Option<String>,
    ) -> Result<(), ChainError> {
        let surface = self.core.default_surface(
            RationalePurpose::ForwardToSettings,
            permissions,
            message.into(),
            positive_text.into(),
            negative_text,
        );
        self.core
            .resolve_with(&surface, RationalePurpose::ForwardToSettings)
            .await
    }

    /// Show a caller-supplied surface
    pub async fn show_rationale<S: RationaleSurface>(self, surface: S) -> Result<(), ChainError> {
        self.core
            .resolve_with(&surface, RationalePurpose::ForwardToSettings)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfigBuilder;
    use crate::host::SimulatedHost;
    use crate::rationale::{AutoPresenter, RecordingPresenter};
    use async_trait::async_trait;
    use permchain_api::ids;

    fn context(host: SimulatedHost, action: SurfaceAction) -> Arc<ChainContext> {
        let config = ChainConfigBuilder::new()
            .host(host)
            .presenter(AutoPresenter::with_action(action))
            .build()
            .unwrap();
        Arc::new(ChainContext::new(config, Default::default()))
    }

    struct Mandatory(Vec<String>);

    #[async_trait]
    impl RationaleSurface for Mandatory {
        fn permissions_to_request(&self) -> Vec<String> {
            self.0.clone()
        }

        fn has_negative_action(&self) -> bool {
            false
        }

        async fn show(&self) -> Result<SurfaceAction, PresentError> {
            Ok(SurfaceAction::Positive)
        }
    }

    #[tokio::test]
    async fn test_positive_resolves_proceed() {
        let ctx = context(SimulatedHost::new(), SurfaceAction::Positive);
        let continuation = Arc::new(Continuation::new());
        let scope = ExplainScope::new(ctx, "normal", continuation.clone());

        scope
            .show_request_reason_dialog(
                vec![ids::CAMERA.to_string()],
                "needed",
                "Allow",
                Some("Deny".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(
            continuation.take(),
            Some(Resolution::Proceed(vec![ids::CAMERA.to_string()]))
        );
    }

    #[tokio::test]
    async fn test_negative_resolves_abort() {
        let ctx = context(SimulatedHost::new(), SurfaceAction::Negative);
        let continuation = Arc::new(Continuation::new());
        let scope = ForwardScope::new(ctx, "normal", continuation.clone());

        scope
            .show_forward_to_settings_dialog(
                vec![ids::CAMERA.to_string()],
                "go to settings",
                "Settings",
                Some("Cancel".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(
            continuation.take(),
            Some(Resolution::Abort(vec![ids::CAMERA.to_string()]))
        );
    }

    #[tokio::test]
    async fn test_unknown_permissions_are_not_shown() {
        let presenter = Arc::new(RecordingPresenter::default());
        let config = ChainConfigBuilder::new()
            .host(SimulatedHost::new().with_unknown("hello world"))
            .presenter(presenter.clone())
            .build()
            .unwrap();
        let ctx = Arc::new(ChainContext::new(config, Default::default()));
        let continuation = Arc::new(Continuation::new());

        ExplainScope::new(ctx, "normal", continuation.clone())
            .show_request_reason_dialog(vec!["hello world".to_string()], "m", "ok", None)
            .await
            .unwrap();

        assert_eq!(presenter.shown_count(), 0);
        assert!(matches!(continuation.take(), Some(Resolution::Abort(_))));
    }

    #[tokio::test]
    async fn test_custom_surface() {
        let ctx = context(SimulatedHost::new(), SurfaceAction::Negative);
        let continuation = Arc::new(Continuation::new());

        ExplainScope::new(ctx, "normal", continuation.clone())
            .show_rationale(Mandatory(vec![ids::CAMERA.to_string()]))
            .await
            .unwrap();

        assert_eq!(
            continuation.take(),
            Some(Resolution::Proceed(vec![ids::CAMERA.to_string()]))
        );
    }

    #[tokio::test]
    async fn test_scope_after_task_moved_on() {
        let ctx = context(SimulatedHost::new(), SurfaceAction::Positive);
        let continuation = Arc::new(Continuation::new());
        let scope = ExplainScope::new(ctx, "normal", continuation.clone());

        // the task gave up waiting
        assert_eq!(continuation.take(), None);

        let err = scope
            .show_request_reason_dialog(vec![ids::CAMERA.to_string()], "m", "ok", None)
            .await
            .unwrap_err();
        assert_eq!(err, ChainError::ContinuationClosed);
    }

    #[tokio::test]
    async fn test_detached_host() {
        let host = Arc::new(SimulatedHost::new());
        let config = ChainConfigBuilder::new()
            .host(host.clone())
            .presenter(AutoPresenter::always_positive())
            .build()
            .unwrap();
        let ctx = Arc::new(ChainContext::new(config, Default::default()));
        let continuation = Arc::new(Continuation::new());
        host.detach();

        ExplainScope::new(ctx, "normal", continuation.clone())
            .show_request_reason_dialog(vec![ids::CAMERA.to_string()], "m", "ok", None)
            .await
            .unwrap();

        assert_eq!(continuation.take(), Some(Resolution::Detached));
    }
}
