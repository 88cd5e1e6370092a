use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoresConfig {
    /// Pending work items live here; `.completed`, `.failed` and `.archive`
    /// are subdirectories.
    #[serde(default = "default_patches_dir")]
    pub patches_dir: String,
    #[serde(default = "default_summaries_dir")]
    pub summaries_dir: String,
}

fn default_patches_dir() -> String {
    "patches".into()
}

fn default_summaries_dir() -> String {
    "summaries".into()
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            patches_dir: default_patches_dir(),
            summaries_dir: default_summaries_dir(),
        }
    }
}
