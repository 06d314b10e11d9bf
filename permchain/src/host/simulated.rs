//! In-memory host that simulates a device and its user
//!
//! Used by tests and by the terminal driver.

use async_trait::async_trait;
use permchain_api::{PromptOutcome, SettingsTarget, SpecialKind};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::PermissionHost;
use crate::error::HostError;

/// How the simulated user answers the native prompt for one permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserResponse {
    Grant,
    /// Deny; the platform keeps offering its rationale
    #[default]
    Deny,
    /// Deny and tick "don't ask again"
    DenyPermanently,
}

/// Something the engine asked the host to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// `is_granted` was queried
    Checked(String),
    /// A special-kind predicate was queried
    SpecialChecked(SpecialKind),
    /// The native prompt was shown
    Prompted(Vec<String>),
    SettingsOpened(SettingsTarget),
}

#[derive(Debug, Default)]
struct SimState {
    granted: BTreeSet<String>,
    responses: HashMap<String, VecDeque<UserResponse>>,
    rationale_suppressed: BTreeSet<String>,
    settings_grants: BTreeSet<String>,
    exempt: BTreeSet<SpecialKind>,
    runtime_notifications: bool,
    groups: HashMap<String, String>,
    aliases: HashMap<String, SpecialKind>,
    unknown: BTreeSet<String>,
    detach_on_settings: bool,
    events: Vec<HostEvent>,
}

/// Simulated device
#[derive(Debug)]
pub struct SimulatedHost {
    state: Mutex<SimState>,
    attached: AtomicBool,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            attached: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark a permission (runtime or special) as already granted
    pub fn with_granted(self, permission: impl Into<String>) -> Self {
        self.lock().granted.insert(permission.into());
        self
    }

    /// Set how the user answers every prompt for a permission
    pub fn respond(self, permission: impl Into<String>, response: UserResponse) -> Self {
        self.respond_sequence(permission, [response])
    }

    /// Answers consumed one per prompt; the last one repeats
    pub fn respond_sequence(
        self,
        permission: impl Into<String>,
        responses: impl IntoIterator<Item = UserResponse>,
    ) -> Self {
        self.lock()
            .responses
            .insert(permission.into(), responses.into_iter().collect());
        self
    }

    /// The user enables this permission when its settings screen is opened
    pub fn grant_in_settings(self, permission: impl Into<String>) -> Self {
        self.lock().settings_grants.insert(permission.into());
        self
    }

    /// The platform version exempts this special kind
    pub fn with_exempt(self, kind: SpecialKind) -> Self {
        self.lock().exempt.insert(kind);
        self
    }

    /// Treat notifications as an ordinary runtime permission
    pub fn with_runtime_notifications(self) -> Self {
        self.lock().runtime_notifications = true;
        self
    }

    pub fn with_group(self, permission: impl Into<String>, group: impl Into<String>) -> Self {
        self.lock().groups.insert(permission.into(), group.into());
        self
    }

    /// Classify a vendor identifier as another name for a special kind
    pub fn with_alias(self, permission: impl Into<String>, kind: SpecialKind) -> Self {
        self.lock().aliases.insert(permission.into(), kind);
        self
    }

    /// Permission metadata lookups for this identifier fail
    pub fn with_unknown(self, permission: impl Into<String>) -> Self {
        self.lock().unknown.insert(permission.into());
        self
    }

    /// Tear the host context down while the user is in settings
    pub fn detach_on_settings(self) -> Self {
        self.lock().detach_on_settings = true;
        self
    }

    /// Tear the host context down now
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.lock().events.clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, HostEvent::Prompted(_)))
            .count()
    }

    pub fn settings_opened(&self) -> Vec<SettingsTarget> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                HostEvent::SettingsOpened(target) => Some(*target),
                _ => None,
            })
            .collect()
    }

    fn next_response(state: &mut SimState, permission: &str) -> UserResponse {
        match state.responses.get_mut(permission) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().copied().unwrap_or_default(),
            None => UserResponse::default(),
        }
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionHost for SimulatedHost {
    fn is_granted(&self, permission: &str) -> bool {
        let mut state = self.lock();
        state.events.push(HostEvent::Checked(permission.to_string()));
        state.granted.contains(permission)
    }

    async fn prompt(&self, permissions: &[String]) -> Result<PromptOutcome, HostError> {
        if !self.is_attached() {
            return Err(HostError::Detached);
        }

        let mut state = self.lock();
        state.events.push(HostEvent::Prompted(permissions.to_vec()));

        let mut outcome = PromptOutcome::default();
        for permission in permissions {
            if state.granted.contains(permission) {
                outcome.granted.push(permission.clone());
                continue;
            }
            match Self::next_response(&mut state, permission) {
                UserResponse::Grant => {
                    state.granted.insert(permission.clone());
                    outcome.granted.push(permission.clone());
                }
                UserResponse::Deny => {
                    state.rationale_suppressed.remove(permission);
                    outcome.denied.push(permission.clone());
                }
                UserResponse::DenyPermanently => {
                    state.rationale_suppressed.insert(permission.clone());
                    outcome.denied.push(permission.clone());
                }
            }
        }
        Ok(outcome)
    }

    fn can_show_rationale(&self, permission: &str) -> bool {
        let state = self.lock();
        !state.granted.contains(permission) && !state.rationale_suppressed.contains(permission)
    }

    async fn open_settings(&self, target: SettingsTarget) -> Result<(), HostError> {
        if !self.is_attached() {
            return Err(HostError::Detached);
        }

        let detach = {
            let mut state = self.lock();
            state.events.push(HostEvent::SettingsOpened(target));
            let enabled: Vec<String> = state
                .settings_grants
                .iter()
                .filter(|p| settings_target_of(&state, p) == target)
                .cloned()
                .collect();
            for permission in enabled {
                state.rationale_suppressed.remove(&permission);
                state.granted.insert(permission);
            }
            state.detach_on_settings
        };

        if detach {
            self.detach();
            return Err(HostError::Detached);
        }
        Ok(())
    }

    fn are_notifications_enabled(&self) -> bool {
        self.special_granted(SpecialKind::Notification)
    }

    fn can_draw_overlays(&self) -> bool {
        self.special_granted(SpecialKind::SystemAlertWindow)
    }

    fn can_write_settings(&self) -> bool {
        self.special_granted(SpecialKind::WriteSettings)
    }

    fn is_external_storage_manager(&self) -> bool {
        self.special_granted(SpecialKind::ManageExternalStorage)
    }

    fn can_request_package_installs(&self) -> bool {
        self.special_granted(SpecialKind::RequestInstallPackages)
    }

    fn special_kind(&self, permission: &str) -> Option<SpecialKind> {
        special_kind_of(&self.lock(), permission)
    }

    fn special_applies(&self, kind: SpecialKind) -> bool {
        !self.lock().exempt.contains(&kind)
    }

    fn permission_group(&self, permission: &str) -> Option<String> {
        let state = self.lock();
        if state.unknown.contains(permission) {
            return None;
        }
        Some(
            state
                .groups
                .get(permission)
                .cloned()
                .unwrap_or_else(|| permission.to_string()),
        )
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl SimulatedHost {
    fn special_granted(&self, kind: SpecialKind) -> bool {
        let mut state = self.lock();
        state.events.push(HostEvent::SpecialChecked(kind));
        state.granted.contains(kind.permission())
    }
}

// Lookups below run under an already-held lock.
fn special_kind_of(state: &SimState, permission: &str) -> Option<SpecialKind> {
    if let Some(kind) = state.aliases.get(permission) {
        return Some(*kind);
    }
    match SpecialKind::from_permission(permission) {
        Some(SpecialKind::Notification) if state.runtime_notifications => None,
        other => other,
    }
}

fn settings_target_of(state: &SimState, permission: &str) -> SettingsTarget {
    special_kind_of(state, permission)
        .map(SpecialKind::settings_target)
        .unwrap_or(SettingsTarget::AppDetails)
}
