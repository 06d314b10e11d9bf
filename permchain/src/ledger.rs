//! Granted/denied accumulators shared along a request chain

use permchain_api::PermissionResult;

/// Insertion-ordered granted and denied sets
///
/// The two sets never overlap: granting a permission clears a pending
/// denial and denying one clears a stale grant. Only the active task holds
/// `&mut` access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionLedger {
    granted: Vec<String>,
    denied: Vec<String>,
}

impl PermissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a permission as granted
    pub fn grant(&mut self, permission: &str) {
        self.denied.retain(|p| p != permission);
        if !self.is_granted(permission) {
            self.granted.push(permission.to_string());
        }
    }

    /// Record a permission as denied (possibly pending a later decision)
    pub fn deny(&mut self, permission: &str) {
        self.granted.retain(|p| p != permission);
        if !self.is_denied(permission) {
            self.denied.push(permission.to_string());
        }
    }

    pub fn is_granted(&self, permission: &str) -> bool {
        self.granted.iter().any(|p| p == permission)
    }

    pub fn is_denied(&self, permission: &str) -> bool {
        self.denied.iter().any(|p| p == permission)
    }

    pub fn granted(&self) -> &[String] {
        &self.granted
    }

    pub fn denied(&self) -> &[String] {
        &self.denied
    }

    /// Consume the ledger into the terminal result
    pub fn into_result(self) -> PermissionResult {
        PermissionResult::new(self.granted, self.denied)
    }
}
