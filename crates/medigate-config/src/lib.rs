//! Configuration management for the access engine
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (MG_* prefix, highest precedence)
//! 2. medigate.local.toml (gitignored, local overrides)
//! 3. medigate.toml (git-tracked, project config)
//! 4. ~/.config/medigate/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedigateConfig {
    pub attributes: AttributeConfig,
    pub break_glass: BreakGlassConfig,
    pub audit: AuditConfig,
}

impl MedigateConfig {
    /// Rejects configurations the engine cannot safely run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attributes.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "attributes.ttl_secs must be positive".to_string(),
            ));
        }
        if self.break_glass.window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "break_glass.window_secs must be positive".to_string(),
            ));
        }
        if self.break_glass.approval_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "break_glass.approval_timeout_secs must be positive".to_string(),
            ));
        }
        if self.audit.durable && self.audit.log_path.is_none() {
            return Err(ConfigError::ValidationError(
                "audit.log_path is required when audit.durable is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Attribute-store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    /// How long a cached attribute snapshot stays fresh, in seconds.
    pub ttl_secs: u64,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Break-glass override settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakGlassConfig {
    /// How long a granted override stays valid, in seconds.
    pub window_secs: u64,
    /// How long a request waits for a supervisor, in seconds.
    pub approval_timeout_secs: u64,
}

impl Default for BreakGlassConfig {
    fn default() -> Self {
        Self {
            window_secs: 600,
            approval_timeout_secs: 30,
        }
    }
}

/// Audit-trail settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Behavior when a decision cannot be written to the trail.
    pub on_write_failure: WriteFailurePolicy,
    /// Mirror every entry to a flat file.
    pub durable: bool,
    /// Where the durable log lives; required when `durable` is set.
    pub log_path: Option<PathBuf>,
}

/// What to do when the audit trail cannot record a decision.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WriteFailurePolicy {
    /// Force the decision to deny.
    #[default]
    FailClosed,
    /// Deliver the computed decision anyway.
    FailOpen,
}

// ============================================================================
// Tests
// ============================================================================
