//! Rationale surfaces
//!
//! A rationale surface is the modal construct that explains why permissions
//! are needed and offers a positive (proceed) and an optional negative
//! (abort) action. Developers can hand a scope their own surface, or let the
//! scope build a [`DefaultSurface`] that is rendered by the configured
//! [`RationalePresenter`].

pub mod presenter;

use async_trait::async_trait;
use permchain_api::{DialogTint, SurfaceAction};
use serde::Serialize;
use std::sync::Arc;

use crate::error::PresentError;
use crate::host::PermissionHost;

pub use presenter::{
    AutoPresenter, RationalePresenter, RecordedRationale, RecordingPresenter, TerminalPresenter,
};

/// Contract every rationale surface satisfies
#[async_trait]
pub trait RationaleSurface: Send + Sync {
    /// Permissions to request again (or forward to settings) on the positive action
    fn permissions_to_request(&self) -> Vec<String>;

    /// Whether an abort path is offered. Without one the permissions are mandatory.
    fn has_negative_action(&self) -> bool;

    /// Whether there is nothing worth showing
    fn is_empty(&self) -> bool {
        false
    }

    /// Show the surface and wait for exactly one action
    async fn show(&self) -> Result<SurfaceAction, PresentError>;
}

/// Why a rationale is being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RationalePurpose {
    /// Explain, then request again
    Explain,
    /// Ask the user to grant in settings
    ForwardToSettings,
}

/// One entry on a rationale: a permission group, or a single special permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RationaleItem {
    /// Group name, or the permission identifier for special permissions
    pub key: String,
    pub special: bool,
    pub permissions: Vec<String>,
}

/// Renderer-independent description of a default rationale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RationaleContent {
    pub purpose: RationalePurpose,
    pub permissions: Vec<String>,
    pub message: String,
    pub positive_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_text: Option<String>,
    pub tint: DialogTint,
    pub items: Vec<RationaleItem>,
}

impl RationaleContent {
    /// Build content, grouping permissions through the host's metadata
    pub fn new(
        host: &dyn PermissionHost,
        purpose: RationalePurpose,
        permissions: Vec<String>,
        message: impl Into<String>,
        positive_text: impl Into<String>,
        negative_text: Option<String>,
        tint: DialogTint,
    ) -> Self {
        let items = group_permissions(host, &permissions);
        Self {
            purpose,
            permissions,
            message: message.into(),
            positive_text: positive_text.into(),
            negative_text,
            tint,
            items,
        }
    }
}

/// Collapse permissions into one entry per platform group
///
/// Special permissions always get their own entry. Identifiers without
/// group metadata are left out.
pub fn group_permissions(host: &dyn PermissionHost, permissions: &[String]) -> Vec<RationaleItem> {
    let mut items: Vec<RationaleItem> = Vec::new();

    for permission in permissions {
        let (key, special) = if host.special_kind(permission).is_some() {
            (permission.clone(), true)
        } else {
            match host.permission_group(permission) {
                Some(group) => (group, false),
                None => {
                    tracing::debug!(%permission, "No group metadata, omitted from rationale");
                    continue;
                }
            }
        };

        match items.iter_mut().find(|item| item.key == key) {
            Some(item) => {
                if !item.permissions.contains(permission) {
                    item.permissions.push(permission.clone());
                }
            }
            None => items.push(RationaleItem {
                key,
                special,
                permissions: vec![permission.clone()],
            }),
        }
    }

    items
}

/// Surface built from texts and rendered by the configured presenter
pub struct DefaultSurface {
    content: RationaleContent,
    presenter: Arc<dyn RationalePresenter>,
}

impl DefaultSurface {
    pub fn new(content: RationaleContent, presenter: Arc<dyn RationalePresenter>) -> Self {
        Self { content, presenter }
    }

    pub fn content(&self) -> &RationaleContent {
        &self.content
    }
}

impl std::fmt::Debug for DefaultSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultSurface")
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RationaleSurface for DefaultSurface {
    fn permissions_to_request(&self) -> Vec<String> {
        self.content.permissions.clone()
    }

    fn has_negative_action(&self) -> bool {
        self.content.negative_text.is_some()
    }

    fn is_empty(&self) -> bool {
        self.content.items.is_empty()
    }

    async fn show(&self) -> Result<SurfaceAction, PresentError> {
        self.presenter.present(&self.content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedHost;
    use permchain_api::ids;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_grouping_collapses_shared_groups() {
        let host = SimulatedHost::new()
            .with_group(ids::ACCESS_FINE_LOCATION, "LOCATION")
            .with_group(ids::ACCESS_COARSE_LOCATION, "LOCATION");

        let items = group_permissions(
            &host,
            &list(&[
                ids::ACCESS_FINE_LOCATION,
                ids::CAMERA,
                ids::ACCESS_COARSE_LOCATION,
            ]),
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key, "LOCATION");
        assert_eq!(items[0].permissions.len(), 2);
        assert_eq!(items[1].key, ids::CAMERA);
    }

    #[test]
    fn test_grouping_omits_unknown_and_keeps_special() {
        let host = SimulatedHost::new().with_unknown("hello world");

        let items = group_permissions(&host, &list(&["hello world", ids::SYSTEM_ALERT_WINDOW]));

        assert_eq!(items.len(), 1);
        assert!(items[0].special);
        assert_eq!(items[0].key, ids::SYSTEM_ALERT_WINDOW);
    }

    #[tokio::test]
    async fn test_default_surface() {
        let host = SimulatedHost::new().with_unknown("hello world");
        let content = RationaleContent::new(
            &host,
            RationalePurpose::Explain,
            list(&["hello world"]),
            "needed",
            "Allow",
            None,
            DialogTint::default(),
        );
        let surface = DefaultSurface::new(content, Arc::new(AutoPresenter::always_positive()));

        assert!(surface.is_empty());
        assert!(!surface.has_negative_action());
        assert_eq!(surface.permissions_to_request(), list(&["hello world"]));
        assert_eq!(surface.show().await.unwrap(), SurfaceAction::Positive);
    }
}
