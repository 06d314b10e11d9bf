//! Request builder
//!
//! # Example
//!
//! ```rust,no_run
//! use permchain::{ChainPresets, DefaultExplainReason, PermissionRequest, SimulatedHost};
//! use permchain_api::{ids, PermissionResult};
//!
//! # async fn demo() -> Result<(), permchain::ChainError> {
//! let config = ChainPresets::testing(SimulatedHost::new());
//! let outcome = PermissionRequest::new(config)
//!     .permissions([ids::CAMERA, ids::SYSTEM_ALERT_WINDOW])
//!     .explain_reason_before_request()
//!     .on_explain_request_reason_with_before_param(DefaultExplainReason::new(
//!         "The camera is needed to scan codes",
//!         "OK",
//!         Some("Cancel"),
//!     ))
//!     .request(|result: PermissionResult| {
//!         println!("all granted: {}", result.all_granted);
//!     })
//!     .await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::callback::{
    Callbacks, ExplainReasonCallback, ExplainReasonCallbackWithBeforeParam,
    ForwardToSettingsCallback, RequestCallback,
};
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::session::{Session, SessionOutcome};

/// Configures one permission request
pub struct PermissionRequest {
    config: ChainConfig,
    permissions: Vec<String>,
    explain_reason_before_request: bool,
    callbacks: Callbacks,
}

impl PermissionRequest {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            permissions: Vec::new(),
            explain_reason_before_request: false,
            callbacks: Callbacks::default(),
        }
    }

    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Tint for default rationale buttons in light and dark themes (ARGB)
    pub fn set_dialog_tint_color(mut self, light: u32, dark: u32) -> Self {
        self.config.tint = permchain_api::DialogTint::new(light, dark);
        self
    }

    /// Explain before the first request instead of after a denial
    pub fn explain_reason_before_request(mut self) -> Self {
        self.explain_reason_before_request = true;
        self
    }

    pub fn on_explain_request_reason(mut self, callback: impl ExplainReasonCallback + 'static) -> Self {
        self.callbacks.explain = Some(Arc::new(callback));
        self
    }

    /// Takes precedence over [`Self::on_explain_request_reason`]
    pub fn on_explain_request_reason_with_before_param(
        mut self,
        callback: impl ExplainReasonCallbackWithBeforeParam + 'static,
    ) -> Self {
        self.callbacks.explain_with_before = Some(Arc::new(callback));
        self
    }

    pub fn on_forward_to_settings(
        mut self,
        callback: impl ForwardToSettingsCallback + 'static,
    ) -> Self {
        self.callbacks.forward = Some(Arc::new(callback));
        self
    }

    /// Build the session without starting it
    pub fn build(self, callback: impl RequestCallback + 'static) -> Session {
        Session::new(
            self.config,
            self.permissions,
            self.callbacks,
            self.explain_reason_before_request,
            Box::new(callback),
        )
    }

    /// Build and start the session
    pub async fn request(
        self,
        callback: impl RequestCallback + 'static,
    ) -> Result<SessionOutcome, ChainError> {
        self.build(callback).start().await
    }
}

impl std::fmt::Debug for PermissionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionRequest")
            .field("permissions", &self.permissions)
            .field(
                "explain_reason_before_request",
                &self.explain_reason_before_request,
            )
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainPresets;
    use crate::host::SimulatedHost;
    use permchain_api::{ids, PermissionResult};

    #[test]
    fn test_builder_collects_permissions() {
        let session = PermissionRequest::new(ChainPresets::testing(SimulatedHost::new()))
            .permissions([ids::CAMERA, ids::RECORD_AUDIO])
            .permission(ids::WRITE_SETTINGS)
            .build(|_: PermissionResult| {});

        assert_eq!(session.requested_permissions().len(), 3);
        assert_eq!(session.plan().len(), 2);
        assert!(!session.is_started());
    }

    #[test]
    fn test_tint() {
        let request = PermissionRequest::new(ChainPresets::testing(SimulatedHost::new()))
            .set_dialog_tint_color(0xFF1972E8, 0xFF8AB6F5);
        assert_eq!(request.config.tint.for_theme(true), Some(0xFF8AB6F5));
    }
}
