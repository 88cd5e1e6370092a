use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let patchwarden_dir = home.join(".patchwarden");
        let config_path = patchwarden_dir.join("config.toml");

        if !patchwarden_dir.exists() {
            fs::create_dir_all(&patchwarden_dir)
                .context("Failed to create .patchwarden directory")?;
            fs::create_dir_all(patchwarden_dir.join("workspace"))
                .context("Failed to create workspace directory")?;
        }

        if config_path.exists() {
            let mut config = Self::read(&config_path)?;
            config.workspace_dir = patchwarden_dir.join("workspace");
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                workspace_dir: patchwarden_dir.join("workspace"),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    /// Load an explicit config file. Relative paths inside it resolve
    /// against the directory that holds the file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.workspace_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&contents).context("Failed to parse config file")?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_from_resolves_relative_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("warden.toml");
        fs::write(&path, "[stores]\npatches_dir = \"work/patches\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.patches_dir(), tmp.path().join("work/patches"));
        assert_eq!(config.config_path, path);
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("warden.toml");
        fs::write(&path, "[trust]\nrecent_window = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("recent_window"));
    }

    #[test]
    fn save_then_load_round_trips_sections() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::for_workspace(tmp.path());
        config.monitor.health_url = Some("http://127.0.0.1:9/health".into());
        config.trust.high_risk_kinds.push("drop-database".into());
        config.save().unwrap();

        let loaded = Config::load_from(&config.config_path).unwrap();
        assert_eq!(loaded.monitor, config.monitor);
        assert_eq!(loaded.trust, config.trust);
        assert_eq!(loaded.compliance, config.compliance);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load_from(&tmp.path().join("nope.toml")).is_err());
    }
}
