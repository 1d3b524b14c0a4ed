//! Monitor Configuration
//!
//! Recognized options for a node monitor. Invalid configuration surfaces
//! before any tracing starts; the caller decides whether to retry.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Cached once per process; hostname lookups are not free
static NODE_NAME: Lazy<String> = Lazy::new(|| {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
});

/// Host name of the node this process runs on
pub fn default_node_name() -> String {
    NODE_NAME.clone()
}

/// Recognized monitor options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Node this monitor reports for
    pub node_name: String,
    /// Observe syscall-level activity
    pub enable_syscall_trace: bool,
    /// Observe network connections
    pub enable_network_trace: bool,
    /// Address of the external policy authority; recorded, not dialled here
    pub policy_endpoint: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            enable_syscall_trace: true,
            enable_network_trace: true,
            policy_endpoint: None,
        }
    }
}

impl MonitorConfig {
    pub fn for_node(node_name: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_policy_endpoint(mut self, endpoint: &str) -> Self {
        self.policy_endpoint = Some(endpoint.to_string());
        self
    }

    /// Fatal configuration problems, checked before any tracing starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_name.trim().is_empty() {
            return Err(ConfigError::MissingNodeName);
        }
        if !self.enable_syscall_trace && !self.enable_network_trace {
            return Err(ConfigError::NoTraceSources);
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_node_name_rejected() {
        let config = MonitorConfig::for_node("  ");
        assert_eq!(config.validate(), Err(ConfigError::MissingNodeName));
    }

    #[test]
    fn test_no_trace_sources_rejected() {
        let config = MonitorConfig {
            enable_syscall_trace: false,
            enable_network_trace: false,
            ..MonitorConfig::for_node("node-1")
        };
        assert_eq!(config.validate(), Err(ConfigError::NoTraceSources));
    }
}
