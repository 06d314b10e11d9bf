//! Permission host adapter
//!
//! The host is the platform collaborator: it answers "is this granted",
//! shows the native prompt, opens settings screens and reports whether the
//! owning UI context is still alive. The engine never talks to the platform
//! any other way.

pub mod simulated;

use async_trait::async_trait;
use permchain_api::{PromptOutcome, SettingsTarget, SpecialKind};

use crate::error::HostError;

pub use simulated::{HostEvent, SimulatedHost, UserResponse};

/// Trait implemented by platform integrations
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use permchain::host::PermissionHost;
/// use permchain::HostError;
/// use permchain_api::{PromptOutcome, SettingsTarget};
///
/// struct GrantEverything;
///
/// #[async_trait]
/// impl PermissionHost for GrantEverything {
///     fn is_granted(&self, _permission: &str) -> bool {
///         true
///     }
///
///     async fn prompt(&self, permissions: &[String]) -> Result<PromptOutcome, HostError> {
///         Ok(PromptOutcome::all_granted(permissions))
///     }
///
///     fn can_show_rationale(&self, _permission: &str) -> bool {
///         false
///     }
///
///     async fn open_settings(&self, _target: SettingsTarget) -> Result<(), HostError> {
///         Ok(())
///     }
///
///     fn are_notifications_enabled(&self) -> bool { true }
///     fn can_draw_overlays(&self) -> bool { true }
///     fn can_write_settings(&self) -> bool { true }
///     fn is_external_storage_manager(&self) -> bool { true }
///     fn can_request_package_installs(&self) -> bool { true }
///
///     fn permission_group(&self, permission: &str) -> Option<String> {
///         Some(permission.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait PermissionHost: Send + Sync {
    /// Whether a runtime permission is currently granted
    fn is_granted(&self, permission: &str) -> bool;

    /// Show the native prompt for a batch of runtime permissions
    async fn prompt(&self, permissions: &[String]) -> Result<PromptOutcome, HostError>;

    /// Whether the platform would still show its own rationale for a denied
    /// permission. `false` after a permanent denial.
    fn can_show_rationale(&self, permission: &str) -> bool;

    /// Open a settings screen; resolves when the user comes back
    async fn open_settings(&self, target: SettingsTarget) -> Result<(), HostError>;

    fn are_notifications_enabled(&self) -> bool;

    fn can_draw_overlays(&self) -> bool;

    fn can_write_settings(&self) -> bool;

    fn is_external_storage_manager(&self) -> bool;

    fn can_request_package_installs(&self) -> bool;

    /// Classify an identifier as special on this platform
    ///
    /// Override to return `None` for kinds the platform handles through the
    /// uniform prompt (e.g. notifications on newer releases).
    fn special_kind(&self, permission: &str) -> Option<SpecialKind> {
        SpecialKind::from_permission(permission)
    }

    /// Whether the platform version requires asking for this kind at all.
    /// `false` means the capability is implicitly held.
    fn special_applies(&self, _kind: SpecialKind) -> bool {
        true
    }

    /// Kind-specific grant predicate
    fn is_special_granted(&self, kind: SpecialKind) -> bool {
        match kind {
            SpecialKind::Notification => self.are_notifications_enabled(),
            SpecialKind::SystemAlertWindow => self.can_draw_overlays(),
            SpecialKind::WriteSettings => self.can_write_settings(),
            SpecialKind::ManageExternalStorage => self.is_external_storage_manager(),
            SpecialKind::RequestInstallPackages => self.can_request_package_installs(),
        }
    }

    /// Platform permission group, used to collapse rationale entries.
    /// `None` when the identifier is unknown.
    fn permission_group(&self, permission: &str) -> Option<String>;

    /// Whether the owning UI context is still alive
    fn is_attached(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: PermissionHost + ?Sized> PermissionHost for std::sync::Arc<T> {
    fn is_granted(&self, permission: &str) -> bool {
        (**self).is_granted(permission)
    }

    async fn prompt(&self, permissions: &[String]) -> Result<PromptOutcome, HostError> {
        (**self).prompt(permissions).await
    }

    fn can_show_rationale(&self, permission: &str) -> bool {
        (**self).can_show_rationale(permission)
    }

    async fn open_settings(&self, target: SettingsTarget) -> Result<(), HostError> {
        (**self).open_settings(target).await
    }

    fn are_notifications_enabled(&self) -> bool {
        (**self).are_notifications_enabled()
    }

    fn can_draw_overlays(&self) -> bool {
        (**self).can_draw_overlays()
    }

    fn can_write_settings(&self) -> bool {
        (**self).can_write_settings()
    }

    fn is_external_storage_manager(&self) -> bool {
        (**self).is_external_storage_manager()
    }

    fn can_request_package_installs(&self) -> bool {
        (**self).can_request_package_installs()
    }

    fn special_kind(&self, permission: &str) -> Option<SpecialKind> {
        (**self).special_kind(permission)
    }

    fn special_applies(&self, kind: SpecialKind) -> bool {
        (**self).special_applies(kind)
    }

    fn is_special_granted(&self, kind: SpecialKind) -> bool {
        (**self).is_special_granted(kind)
    }

    fn permission_group(&self, permission: &str) -> Option<String> {
        (**self).permission_group(permission)
    }

    fn is_attached(&self) -> bool {
        (**self).is_attached()
    }
}
