use crate::compliance::agents::{AgentSpec, default_agents};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Directory agent `owned_paths` are relative to.
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentSpec>,
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
    /// File extensions scanned, without the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Commands that never count as violations.
    #[serde(default = "default_allow_list")]
    pub allow_list: Vec<String>,
    /// A match containing every one of these is already detached.
    #[serde(default = "default_detached_markers")]
    pub detached_markers: Vec<String>,
    #[serde(default = "default_violation_log")]
    pub violation_log: String,
}

fn default_root() -> String {
    ".".into()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_excluded_dirs() -> Vec<String> {
    strings(&[
        "node_modules",
        ".git",
        ".cursor-cache",
        "dist",
        "build",
        "coverage",
        "target",
    ])
}

fn default_extensions() -> Vec<String> {
    strings(&["js", "ts", "sh", "bash", "py"])
}

fn default_allow_list() -> Vec<String> {
    strings(&[
        "git status",
        "git log",
        "git diff",
        "ls",
        "cat",
        "pwd",
        "echo",
        "whoami",
        "date",
        "node --version",
        "npm --version",
        "ps aux",
    ])
}

fn default_detached_markers() -> Vec<String> {
    strings(&["{", "&", "disown"])
}

fn default_violation_log() -> String {
    "logs/compliance-violations.jsonl".into()
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            agents: default_agents(),
            excluded_dirs: default_excluded_dirs(),
            extensions: default_extensions(),
            allow_list: default_allow_list(),
            detached_markers: default_detached_markers(),
            violation_log: default_violation_log(),
        }
    }
}
