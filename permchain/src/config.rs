//! Chain configuration bundles and presets
//!
//! A [`ChainConfig`] carries the collaborators every session needs. Build one
//! with [`ChainConfigBuilder`] or start from a [`ChainPresets`] entry.

use permchain_api::DialogTint;
use std::path::PathBuf;
use std::sync::Arc;

use crate::audit::{AuditSink, FileAuditSink, MemoryAuditSink, NullAuditSink};
use crate::host::PermissionHost;
use crate::rationale::{AutoPresenter, RationalePresenter, TerminalPresenter};

/// Collaborators shared by the sessions built from it
#[derive(Clone)]
pub struct ChainConfig {
    /// Platform adapter
    pub host: Arc<dyn PermissionHost>,
    /// Renders default rationale surfaces
    pub presenter: Arc<dyn RationalePresenter>,
    pub audit: Arc<dyn AuditSink>,
    /// Button tint for default rationale surfaces
    pub tint: DialogTint,
}

impl std::fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConfig")
            .field("tint", &self.tint)
            .field("interactive", &self.presenter.is_interactive())
            .finish_non_exhaustive()
    }
}

impl ChainConfig {
    pub fn new(
        host: impl PermissionHost + 'static,
        presenter: impl RationalePresenter + 'static,
        audit: impl AuditSink + 'static,
    ) -> Self {
        Self {
            host: Arc::new(host),
            presenter: Arc::new(presenter),
            audit: Arc::new(audit),
            tint: DialogTint::default(),
        }
    }
}

/// Builder for chain configurations
pub struct ChainConfigBuilder {
    host: Option<Arc<dyn PermissionHost>>,
    presenter: Option<Arc<dyn RationalePresenter>>,
    audit: Option<Arc<dyn AuditSink>>,
    tint: DialogTint,
}

impl ChainConfigBuilder {
    pub fn new() -> Self {
        Self {
            host: None,
            presenter: None,
            audit: None,
            tint: DialogTint::default(),
        }
    }

    pub fn host(mut self, host: impl PermissionHost + 'static) -> Self {
        self.host = Some(Arc::new(host));
        self
    }

    pub fn presenter(mut self, presenter: impl RationalePresenter + 'static) -> Self {
        self.presenter = Some(Arc::new(presenter));
        self
    }

    pub fn audit(mut self, audit: impl AuditSink + 'static) -> Self {
        self.audit = Some(Arc::new(audit));
        self
    }

    /// Tint for light and dark themes, as ARGB
    pub fn tint(mut self, light: u32, dark: u32) -> Self {
        self.tint = DialogTint::new(light, dark);
        self
    }

    pub fn build(self) -> Result<ChainConfig, ConfigError> {
        let host = self.host.ok_or(ConfigError::MissingHost)?;

        Ok(ChainConfig {
            host,
            presenter: self
                .presenter
                .unwrap_or_else(|| Arc::new(TerminalPresenter::new())),
            audit: self.audit.unwrap_or_else(|| Arc::new(NullAuditSink)),
            tint: self.tint,
        })
    }
}

impl Default for ChainConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No permission host configured")]
    MissingHost,

    #[error("Failed to initialize audit: {0}")]
    AuditInit(String),
}

// ============================================================================
// Preset Configurations
// ============================================================================

/// Preset configurations for common use cases
pub struct ChainPresets;

impl ChainPresets {
    /// Interactive terminal mode
    ///
    /// Terminal rationales, JSONL audit log under the user config directory.
    pub fn interactive(
        app_name: &str,
        host: impl PermissionHost + 'static,
    ) -> Result<ChainConfig, ConfigError> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(app_name);

        let audit = FileAuditSink::new(config_dir.join("audit.jsonl"))
            .map_err(|e| ConfigError::AuditInit(e.to_string()))?;

        Ok(ChainConfig::new(host, TerminalPresenter::new(), audit))
    }

    /// Testing mode: every rationale proceeds, audit kept in memory
    pub fn testing(host: impl PermissionHost + 'static) -> ChainConfig {
        ChainConfig::new(host, AutoPresenter::always_positive(), MemoryAuditSink::new())
    }
}
