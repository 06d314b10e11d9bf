//! permchain-api: Shared types for the permchain request engine
//!
//! This crate defines the vocabulary spoken between the engine and the
//! platform host: permission identifiers, the special permission kinds,
//! settings targets, prompt outcomes and the terminal result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known permission identifiers
pub mod ids {
    pub const CAMERA: &str = "android.permission.CAMERA";
    pub const RECORD_AUDIO: &str = "android.permission.RECORD_AUDIO";
    pub const READ_CONTACTS: &str = "android.permission.READ_CONTACTS";
    pub const ACCESS_FINE_LOCATION: &str = "android.permission.ACCESS_FINE_LOCATION";
    pub const ACCESS_COARSE_LOCATION: &str = "android.permission.ACCESS_COARSE_LOCATION";
    pub const POST_NOTIFICATIONS: &str = "android.permission.POST_NOTIFICATIONS";
    pub const SYSTEM_ALERT_WINDOW: &str = "android.permission.SYSTEM_ALERT_WINDOW";
    pub const WRITE_SETTINGS: &str = "android.permission.WRITE_SETTINGS";
    pub const MANAGE_EXTERNAL_STORAGE: &str = "android.permission.MANAGE_EXTERNAL_STORAGE";
    pub const REQUEST_INSTALL_PACKAGES: &str = "android.permission.REQUEST_INSTALL_PACKAGES";
}

/// A permission that has no uniform platform prompt and needs its own
/// check and escalation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    /// Notification access on platforms without a runtime notification prompt
    Notification,
    /// Drawing over other apps
    SystemAlertWindow,
    /// Modifying system settings
    WriteSettings,
    /// All-files access
    ManageExternalStorage,
    /// Installing packages from unknown sources
    RequestInstallPackages,
}

impl SpecialKind {
    /// Every kind, in catalogue order
    pub const ALL: [SpecialKind; 5] = [
        SpecialKind::Notification,
        SpecialKind::SystemAlertWindow,
        SpecialKind::WriteSettings,
        SpecialKind::ManageExternalStorage,
        SpecialKind::RequestInstallPackages,
    ];

    /// Look up the kind handled specially for a permission identifier
    pub fn from_permission(permission: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.permission() == permission)
    }

    /// The permission identifier this kind stands for
    pub fn permission(self) -> &'static str {
        match self {
            Self::Notification => ids::POST_NOTIFICATIONS,
            Self::SystemAlertWindow => ids::SYSTEM_ALERT_WINDOW,
            Self::WriteSettings => ids::WRITE_SETTINGS,
            Self::ManageExternalStorage => ids::MANAGE_EXTERNAL_STORAGE,
            Self::RequestInstallPackages => ids::REQUEST_INSTALL_PACKAGES,
        }
    }

    /// The settings screen where the user can grant this kind
    pub fn settings_target(self) -> SettingsTarget {
        match self {
            Self::Notification => SettingsTarget::NotificationSettings,
            Self::SystemAlertWindow => SettingsTarget::OverlaySettings,
            Self::WriteSettings => SettingsTarget::WriteSettings,
            Self::ManageExternalStorage => SettingsTarget::AllFilesAccess,
            Self::RequestInstallPackages => SettingsTarget::UnknownAppSources,
        }
    }
}

impl fmt::Display for SpecialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.permission())
    }
}

/// A settings screen the host can open on the user's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsTarget {
    /// Generic application details screen
    AppDetails,
    NotificationSettings,
    OverlaySettings,
    WriteSettings,
    AllFilesAccess,
    UnknownAppSources,
}

/// Outcome of one native permission prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOutcome {
    /// Permissions the platform reports as granted
    #[serde(default)]
    pub granted: Vec<String>,
    /// Permissions the platform reports as denied
    #[serde(default)]
    pub denied: Vec<String>,
}

impl PromptOutcome {
    /// Outcome granting every listed permission
    pub fn all_granted(permissions: &[String]) -> Self {
        Self {
            granted: permissions.to_vec(),
            denied: Vec::new(),
        }
    }

    /// Outcome denying every listed permission
    pub fn all_denied(permissions: &[String]) -> Self {
        Self {
            granted: Vec::new(),
            denied: permissions.to_vec(),
        }
    }
}

/// Action taken on a rationale surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceAction {
    /// Proceed: request again, or go to settings
    Positive,
    /// Abort the task, leaving the listed permissions denied
    Negative,
}

/// Tint colors used by default rationale rendering (ARGB)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogTint {
    #[serde(default)]
    pub light: Option<u32>,
    #[serde(default)]
    pub dark: Option<u32>,
}

impl DialogTint {
    pub fn new(light: u32, dark: u32) -> Self {
        Self {
            light: Some(light),
            dark: Some(dark),
        }
    }

    /// Pick the tint for the current theme
    pub fn for_theme(&self, dark_theme: bool) -> Option<u32> {
        if dark_theme {
            self.dark
        } else {
            self.light
        }
    }
}

/// Aggregated result delivered exactly once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResult {
    /// True when nothing was denied
    pub all_granted: bool,
    pub granted: Vec<String>,
    pub denied: Vec<String>,
}

impl PermissionResult {
    /// Build a result; `all_granted` is derived from the denied list
    pub fn new(granted: Vec<String>, denied: Vec<String>) -> Self {
        Self {
            all_granted: denied.is_empty(),
            granted,
            denied,
        }
    }
}
