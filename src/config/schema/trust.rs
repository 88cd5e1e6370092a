use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustConfig {
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_lifetime_weight")]
    pub lifetime_weight: f64,
    #[serde(default = "default_recent_weight")]
    pub recent_weight: f64,
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_default_threshold")]
    pub default_threshold: f64,
    #[serde(default = "default_high_risk_threshold")]
    pub high_risk_threshold: f64,
    #[serde(default = "default_high_risk_kinds")]
    pub high_risk_kinds: Vec<String>,
    /// Reassessments landing below this level log a low-trust alert.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    #[serde(default = "default_reassess_interval_secs")]
    pub reassess_interval_secs: u64,
}

fn default_state_file() -> String {
    "trust-state.json".into()
}

fn default_lifetime_weight() -> f64 {
    0.7
}

fn default_recent_weight() -> f64 {
    0.3
}

fn default_recent_window() -> usize {
    5
}

fn default_history_capacity() -> usize {
    10
}

fn default_default_threshold() -> f64 {
    0.7
}

fn default_high_risk_threshold() -> f64 {
    0.9
}

fn default_high_risk_kinds() -> Vec<String> {
    ["git-push", "deploy", "delete", "restart"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_alert_threshold() -> f64 {
    0.8
}

fn default_reassess_interval_secs() -> u64 {
    30
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            lifetime_weight: default_lifetime_weight(),
            recent_weight: default_recent_weight(),
            recent_window: default_recent_window(),
            history_capacity: default_history_capacity(),
            default_threshold: default_default_threshold(),
            high_risk_threshold: default_high_risk_threshold(),
            high_risk_kinds: default_high_risk_kinds(),
            alert_threshold: default_alert_threshold(),
            reassess_interval_secs: default_reassess_interval_secs(),
        }
    }
}

impl TrustConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("trust.lifetime_weight", self.lifetime_weight),
            ("trust.recent_weight", self.recent_weight),
            ("trust.default_threshold", self.default_threshold),
            ("trust.high_risk_threshold", self.high_risk_threshold),
            ("trust.alert_threshold", self.alert_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.lifetime_weight + self.recent_weight <= 0.0 {
            return Err(ConfigError::Validation(
                "trust weights must not both be zero".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Validation(
                "trust.history_capacity must be at least 1".into(),
            ));
        }
        if self.recent_window == 0 {
            return Err(ConfigError::Validation(
                "trust.recent_window must be at least 1".into(),
            ));
        }
        if self.reassess_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "trust.reassess_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
