use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// A named background process checked for liveness each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemConfig {
    pub name: String,
    /// Matched against full command lines.
    pub pattern: String,
    /// Running executors count towards `patches.executing`.
    #[serde(default)]
    pub executor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_process_timeout_ms")]
    pub process_timeout_ms: u64,
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_queue_preview")]
    pub queue_preview: usize,
    #[serde(default)]
    pub health_url: Option<String>,
    #[serde(default = "default_state_file")]
    pub state_file: Option<String>,
    #[serde(default = "default_subsystems")]
    pub subsystems: Vec<SubsystemConfig>,
}

fn default_tick_interval_secs() -> u64 {
    3
}

fn default_http_timeout_secs() -> u64 {
    5
}

fn default_process_timeout_ms() -> u64 {
    1500
}

fn default_recent_activity_limit() -> usize {
    10
}

fn default_history_capacity() -> usize {
    10
}

fn default_queue_preview() -> usize {
    5
}

#[allow(clippy::unnecessary_wraps)]
fn default_state_file() -> Option<String> {
    Some("monitor-state.json".into())
}

fn default_subsystems() -> Vec<SubsystemConfig> {
    vec![
        SubsystemConfig {
            name: "patch-executor".into(),
            pattern: "patch-executor".into(),
            executor: true,
        },
        SubsystemConfig {
            name: "summary-monitor".into(),
            pattern: "summary-monitor".into(),
            executor: false,
        },
    ]
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            process_timeout_ms: default_process_timeout_ms(),
            recent_activity_limit: default_recent_activity_limit(),
            history_capacity: default_history_capacity(),
            queue_preview: default_queue_preview(),
            health_url: None,
            state_file: default_state_file(),
            subsystems: default_subsystems(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor.tick_interval_secs must be at least 1".into(),
            ));
        }
        if self.http_timeout_secs == 0 || self.process_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "monitor probe timeouts must be non-zero".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Validation(
                "monitor.history_capacity must be at least 1".into(),
            ));
        }
        if let Some(sub) = self
            .subsystems
            .iter()
            .find(|s| s.name.trim().is_empty() || s.pattern.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "monitor subsystem '{}' needs both a name and a pattern",
                sub.name
            )));
        }
        Ok(())
    }
}
