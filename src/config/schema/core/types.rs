use super::super::{ComplianceConfig, MonitorConfig, StoresConfig, TrustConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base for every relative path below - computed, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub stores: StoresConfig,

    #[serde(default)]
    pub trust: TrustConfig,

    #[serde(default)]
    pub compliance: ComplianceConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = directories::UserDirs::new()
            .map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let patchwarden_dir = home.join(".patchwarden");

        Self {
            workspace_dir: patchwarden_dir.join("workspace"),
            config_path: patchwarden_dir.join("config.toml"),
            stores: StoresConfig::default(),
            trust: TrustConfig::default(),
            compliance: ComplianceConfig::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Config rooted at `workspace`, everything else default.
    pub fn for_workspace(workspace: impl Into<PathBuf>) -> Self {
        let workspace_dir = workspace.into();
        Self {
            config_path: workspace_dir.join("config.toml"),
            workspace_dir,
            ..Self::default()
        }
    }

    /// `~` is expanded; relative paths are joined onto the workspace.
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
        if expanded.is_absolute() {
            expanded
        } else {
            self.workspace_dir.join(expanded)
        }
    }

    pub fn patches_dir(&self) -> PathBuf {
        self.resolve_path(&self.stores.patches_dir)
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.resolve_path(&self.stores.summaries_dir)
    }

    pub fn trust_state_path(&self) -> PathBuf {
        self.resolve_path(&self.trust.state_file)
    }

    pub fn compliance_root(&self) -> PathBuf {
        self.resolve_path(&self.compliance.root)
    }

    pub fn violation_log_path(&self) -> PathBuf {
        self.resolve_path(&self.compliance.violation_log)
    }

    pub fn monitor_state_path(&self) -> Option<PathBuf> {
        self.monitor
            .state_file
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| self.resolve_path(p))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trust.validate()?;
        self.monitor.validate()?;
        if self.compliance.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "compliance.extensions must not be empty".into(),
            ));
        }
        if !matches!(
            self.logging.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::Validation(format!(
                "logging.level '{}' is not a tracing level",
                self.logging.level
            )));
        }
        Ok(())
    }
}
