use std::time::Duration;

use crate::gate::GateConfig;
use crate::utils::DEFAULT_DAY_FORMAT;

/// Base URL of the webhook host when nothing is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:5678";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolved runtime settings. Every field has a working default, so a
/// missing configuration never stops the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub fetch_timeout: Duration,
    pub day_format: String,
    pub gate: GateConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            day_format: DEFAULT_DAY_FORMAT.to_string(),
            gate: GateConfig::default(),
        }
    }
}

impl Settings {
    /// Uses `api_base` when it is set and non-blank, the default otherwise.
    /// A trailing slash is dropped.
    pub fn with_api_base(mut self, api_base: Option<&str>) -> Self {
        if let Some(base) = api_base.map(str::trim).filter(|b| !b.is_empty()) {
            self.api_base = base.trim_end_matches('/').to_string();
        }
        self
    }
}
