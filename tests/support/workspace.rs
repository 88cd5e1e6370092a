use patchwarden::Config;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Temp workspace with a config whose relative paths resolve inside it.
pub struct Workspace {
    pub dir: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp workspace");
        let mut config = Config::for_workspace(dir.path());
        config.monitor.subsystems.clear();
        config.monitor.health_url = None;
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_patch(&self, id: &str, body: &str) {
        let dir = self.config.patches_dir();
        fs::create_dir_all(&dir).expect("patches dir");
        fs::write(dir.join(format!("patch-{id}.json")), body).expect("write patch");
    }

    pub fn add_report(&self, id: &str) {
        let dir = self.config.summaries_dir();
        fs::create_dir_all(&dir).expect("summaries dir");
        fs::write(dir.join(format!("summary-{id}.md")), "# done\n").expect("write report");
    }

    pub fn write_source(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("source dir");
        }
        fs::write(path, content).expect("write source");
    }
}
