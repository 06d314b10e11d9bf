//! Developer callbacks
//!
//! Explain and forward callbacks are invoked mid-flow with a scope object.
//! Using the scope is the only way to advance the task; a callback that
//! returns without using it finishes the task with its permissions denied.

use async_trait::async_trait;
use permchain_api::PermissionResult;
use std::sync::Arc;

use crate::scope::{ExplainScope, ForwardScope};

/// Called when the app should explain why it needs permissions
#[async_trait]
pub trait ExplainReasonCallback: Send + Sync {
    async fn on_explain_reason(&self, scope: ExplainScope, denied_list: Vec<String>);
}

/// Like [`ExplainReasonCallback`], also told whether the explanation comes
/// before any native prompt
///
/// Preferred over [`ExplainReasonCallback`] when both are registered.
#[async_trait]
pub trait ExplainReasonCallbackWithBeforeParam: Send + Sync {
    async fn on_explain_reason(
        &self,
        scope: ExplainScope,
        denied_list: Vec<String>,
        before_request: bool,
    );
}

/// Called when permissions can only be granted from a settings screen
#[async_trait]
pub trait ForwardToSettingsCallback: Send + Sync {
    async fn on_forward_to_settings(&self, scope: ForwardScope, denied_list: Vec<String>);
}

/// Terminal result callback, consumed when invoked
pub trait RequestCallback: Send {
    fn on_result(self: Box<Self>, result: PermissionResult);
}

impl<F> RequestCallback for F
where
    F: FnOnce(PermissionResult) + Send,
{
    fn on_result(self: Box<Self>, result: PermissionResult) {
        (*self)(result)
    }
}

#[async_trait]
impl<T: ExplainReasonCallback + ?Sized> ExplainReasonCallback for Arc<T> {
    async fn on_explain_reason(&self, scope: ExplainScope, denied_list: Vec<String>) {
        (**self).on_explain_reason(scope, denied_list).await
    }
}

#[async_trait]
impl<T: ExplainReasonCallbackWithBeforeParam + ?Sized> ExplainReasonCallbackWithBeforeParam
    for Arc<T>
{
    async fn on_explain_reason(
        &self,
        scope: ExplainScope,
        denied_list: Vec<String>,
        before_request: bool,
    ) {
        (**self)
            .on_explain_reason(scope, denied_list, before_request)
            .await
    }
}

#[async_trait]
impl<T: ForwardToSettingsCallback + ?Sized> ForwardToSettingsCallback for Arc<T> {
    async fn on_forward_to_settings(&self, scope: ForwardScope, denied_list: Vec<String>) {
        (**self).on_forward_to_settings(scope, denied_list).await
    }
}

/// The registered explain/forward callbacks of one session
#[derive(Clone, Default)]
pub struct Callbacks {
    pub(crate) explain: Option<Arc<dyn ExplainReasonCallback>>,
    pub(crate) explain_with_before: Option<Arc<dyn ExplainReasonCallbackWithBeforeParam>>,
    pub(crate) forward: Option<Arc<dyn ForwardToSettingsCallback>>,
}

impl Callbacks {
    pub fn has_explain(&self) -> bool {
        self.explain.is_some() || self.explain_with_before.is_some()
    }

    pub fn has_forward(&self) -> bool {
        self.forward.is_some()
    }

    pub(crate) async fn explain(
        &self,
        scope: ExplainScope,
        denied_list: Vec<String>,
        before_request: bool,
    ) {
        if let Some(callback) = &self.explain_with_before {
            callback
                .on_explain_reason(scope, denied_list, before_request)
                .await;
        } else if let Some(callback) = &self.explain {
            callback.on_explain_reason(scope, denied_list).await;
        }
    }

    pub(crate) async fn forward(&self, scope: ForwardScope, denied_list: Vec<String>) {
        if let Some(callback) = &self.forward {
            callback.on_forward_to_settings(scope, denied_list).await;
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("explain", &self.explain.is_some())
            .field("explain_with_before", &self.explain_with_before.is_some())
            .field("forward", &self.forward.is_some())
            .finish()
    }
}

// ============================================================================
// Ready-made callbacks
// ============================================================================

/// Explain callback that always shows the default rationale
#[derive(Debug, Clone)]
pub struct DefaultExplainReason {
    pub message: String,
    pub positive_text: String,
    pub negative_text: Option<String>,
}

impl DefaultExplainReason {
    pub fn new(
        message: impl Into<String>,
        positive_text: impl Into<String>,
        negative_text: Option<&str>,
    ) -> Self {
        Self {
            message: message.into(),
            positive_text: positive_text.into(),
            negative_text: negative_text.map(String::from),
        }
    }
}

#[async_trait]
impl ExplainReasonCallbackWithBeforeParam for DefaultExplainReason {
    async fn on_explain_reason(
        &self,
        scope: ExplainScope,
        denied_list: Vec<String>,
        before_request: bool,
    ) {
        tracing::debug!(?denied_list, before_request, "Explaining request reason");
        let shown = scope
            .show_request_reason_dialog(
                denied_list,
                self.message.clone(),
                self.positive_text.clone(),
                self.negative_text.clone(),
            )
            .await;
        if let Err(e) = shown {
            tracing::error!(error = %e, "Explain scope misused");
        }
    }
}

/// Forward callback that always shows the default settings rationale
#[derive(Debug, Clone)]
pub struct DefaultForwardToSettings {
    pub message: String,
    pub positive_text: String,
    pub negative_text: Option<String>,
}

impl DefaultForwardToSettings {
    pub fn new(
        message: impl Into<String>,
        positive_text: impl Into<String>,
        negative_text: Option<&str>,
    ) -> Self {
        Self {
            message: message.into(),
            positive_text: positive_text.into(),
            negative_text: negative_text.map(String::from),
        }
    }
}

#[async_trait]
impl ForwardToSettingsCallback for DefaultForwardToSettings {
    async fn on_forward_to_settings(&self, scope: ForwardScope, denied_list: Vec<String>) {
        let shown = scope
            .show_forward_to_settings_dialog(
                denied_list,
                self.message.clone(),
                self.positive_text.clone(),
                self.negative_text.clone(),
            )
            .await;
        if let Err(e) = shown {
            tracing::error!(error = %e, "Forward scope misused");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_request_callback() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let callback: Box<dyn RequestCallback> = Box::new(move |result: PermissionResult| {
            *sink.lock().unwrap() = Some(result);
        });

        callback.on_result(PermissionResult::new(vec!["a".into()], vec![]));

        let result = seen.lock().unwrap().clone().unwrap();
        assert!(result.all_granted);
    }

    #[test]
    fn test_callbacks_presence() {
        let callbacks = Callbacks::default();
        assert!(!callbacks.has_explain());
        assert!(!callbacks.has_forward());

        let callbacks = Callbacks {
            explain_with_before: Some(Arc::new(DefaultExplainReason::new("m", "ok", None))),
            ..Default::default()
        };
        assert!(callbacks.has_explain());
    }
}
