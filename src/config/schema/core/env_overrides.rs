use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(workspace) = std::env::var("PATCHWARDEN_WORKSPACE")
            && !workspace.is_empty()
        {
            self.workspace_dir = PathBuf::from(shellexpand::tilde(&workspace).as_ref());
        }

        if let Ok(dir) = std::env::var("PATCHWARDEN_PATCHES_DIR")
            && !dir.is_empty()
        {
            self.stores.patches_dir = dir;
        }

        if let Ok(dir) = std::env::var("PATCHWARDEN_SUMMARIES_DIR")
            && !dir.is_empty()
        {
            self.stores.summaries_dir = dir;
        }

        if let Ok(url) = std::env::var("PATCHWARDEN_HEALTH_URL")
            && !url.is_empty()
        {
            self.monitor.health_url = Some(url);
        }

        if let Ok(secs_str) = std::env::var("PATCHWARDEN_TICK_SECS")
            && let Ok(secs) = secs_str.parse::<u64>()
            && secs > 0
        {
            self.monitor.tick_interval_secs = secs;
        }

        if let Ok(level) = std::env::var("PATCHWARDEN_LOG")
            && !level.is_empty()
        {
            self.logging.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_env::{ENV_LOCK, EnvVarGuard};
    use super::*;
    use std::sync::PoisonError;

    #[test]
    fn env_overrides_replace_config_values() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let _ws = EnvVarGuard::set("PATCHWARDEN_WORKSPACE", "/tmp/pw-env");
        let _patches = EnvVarGuard::set("PATCHWARDEN_PATCHES_DIR", "queue");
        let _url = EnvVarGuard::set("PATCHWARDEN_HEALTH_URL", "http://localhost:1/health");
        let _tick = EnvVarGuard::set("PATCHWARDEN_TICK_SECS", "7");
        let _log = EnvVarGuard::set("PATCHWARDEN_LOG", "debug");
        let _summaries = EnvVarGuard::unset("PATCHWARDEN_SUMMARIES_DIR");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.patches_dir(), PathBuf::from("/tmp/pw-env/queue"));
        assert_eq!(config.summaries_dir(), PathBuf::from("/tmp/pw-env/summaries"));
        assert_eq!(
            config.monitor.health_url.as_deref(),
            Some("http://localhost:1/health")
        );
        assert_eq!(config.monitor.tick_interval_secs, 7);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn invalid_tick_override_is_ignored() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let _tick = EnvVarGuard::set("PATCHWARDEN_TICK_SECS", "0");
        let _ws = EnvVarGuard::unset("PATCHWARDEN_WORKSPACE");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.monitor.tick_interval_secs, 3);
    }
}
