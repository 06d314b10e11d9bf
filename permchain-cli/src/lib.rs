//! permchain-cli: run permission sessions from a terminal
//!
//! The binary drives one session against a [`SimulatedHost`] whose simulated
//! user is described on the command line. Rationales are answered on the
//! terminal or automatically.

pub mod tracing_support;

use permchain::{SimulatedHost, UserResponse};

const PERMISSION_PREFIX: &str = "android.permission.";

/// Expand short names such as `CAMERA` to full permission identifiers
pub fn normalize_permission(name: &str) -> String {
    if name.contains('.') || name.contains(' ') {
        name.to_string()
    } else {
        format!("{}{}", PERMISSION_PREFIX, name.to_ascii_uppercase())
    }
}

/// How the simulated device and its user behave
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    /// Already granted before the session starts
    pub granted: Vec<String>,
    /// Granted by the user when prompted
    pub grant: Vec<String>,
    /// Denied when prompted; the platform keeps showing its rationale
    pub deny: Vec<String>,
    /// Denied with "don't ask again"
    pub deny_permanently: Vec<String>,
    /// Turned on by the user when the settings screen opens
    pub settings_grants: Vec<String>,
}

impl Scenario {
    pub fn into_host(self) -> SimulatedHost {
        let mut host = SimulatedHost::new();
        for permission in self.granted {
            host = host.with_granted(normalize_permission(&permission));
        }
        for permission in self.grant {
            host = host.respond(normalize_permission(&permission), UserResponse::Grant);
        }
        for permission in self.deny {
            host = host.respond(normalize_permission(&permission), UserResponse::Deny);
        }
        for permission in self.deny_permanently {
            host = host.respond(
                normalize_permission(&permission),
                UserResponse::DenyPermanently,
            );
        }
        for permission in self.settings_grants {
            host = host.grant_in_settings(normalize_permission(&permission));
        }
        host
    }
}
