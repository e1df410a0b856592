//! Layer configuration

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Environment variable holding the selector string
pub const DEFAULT_SELECTOR_VAR: &str = "MESA_VK_DEVICE_SELECT";

/// Default log filter when `DEVSEL_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Name of the environment variable the selector is read from
    pub selector_var: String,

    /// `tracing` filter directive for the layer's own logging
    pub log_filter: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            selector_var: std::env::var("DEVSEL_SELECTOR_VAR")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SELECTOR_VAR.to_string()),
            log_filter: std::env::var("DEVSEL_LOG")
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl LayerConfig {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.selector_var.is_empty() {
            bail!("Selector variable name must not be empty");
        }

        if self.selector_var.contains(['=', '\0']) {
            bail!("Invalid selector variable name: {:?}", self.selector_var);
        }

        Ok(())
    }
}

/// Where the selector string comes from. Read once per enumeration call.
pub trait SelectorSource: Send + Sync {
    fn read(&self) -> Option<String>;
}

/// Reads the selector from the process environment on every call
#[derive(Debug, Clone)]
pub struct EnvSelector {
    var: String,
}

impl EnvSelector {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl SelectorSource for EnvSelector {
    fn read(&self) -> Option<String> {
        std::env::var_os(&self.var).map(|v| v.to_string_lossy().into_owned())
    }
}

/// A selector fixed at construction
#[derive(Debug, Clone, Default)]
pub struct FixedSelector(pub Option<String>);

impl FixedSelector {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(Some(selector.into()))
    }
}

impl SelectorSource for FixedSelector {
    fn read(&self) -> Option<String> {
        self.0.clone()
    }
}
