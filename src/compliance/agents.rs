use serde::{Deserialize, Serialize};

/// Severity an agent's violations are reported with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ComplianceLevel {
    High,
    Critical,
}

/// Static description of one agent and the code it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Files or directories relative to the compliance root.
    pub owned_paths: Vec<String>,
    /// Regular expressions over raw source text. When a pattern has a
    /// capture group, group 1 is the reported command.
    pub unsafe_patterns: Vec<String>,
    pub declared_level: ComplianceLevel,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        owned_paths: &[&str],
        unsafe_patterns: &[&str],
        declared_level: ComplianceLevel,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            owned_paths: owned_paths.iter().map(|p| (*p).to_string()).collect(),
            unsafe_patterns: unsafe_patterns.iter().map(|p| (*p).to_string()).collect(),
            declared_level,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

const EXEC_SYNC: &str = r#"execSync\(\s*['"`]([^'"`\n]*)['"`]"#;
const EXEC: &str = r#"\bexec\(\s*['"`]([^'"`\n]*)['"`]"#;

/// Executor, dev and runner agents with their usual launch idioms.
pub fn default_agents() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new(
            "executor",
            &["scripts/"],
            &[
                EXEC_SYNC,
                EXEC,
                r"(?:\{\s*)?\bnode scripts/[^;\n]*",
                r"(?:\{\s*)?\bbash scripts/[^;\n]*",
            ],
            ComplianceLevel::High,
        )
        .with_description("Runs queued patches"),
        AgentSpec::new(
            "dev",
            &["scripts/"],
            &[
                EXEC_SYNC,
                EXEC,
                r"(?:\{\s*)?\bnpm run [^;\n]*",
                r"(?:\{\s*)?\bnpx [^;\n]*",
            ],
            ComplianceLevel::High,
        )
        .with_description("Makes code changes"),
        AgentSpec::new(
            "runner",
            &["scripts/runner/"],
            &[EXEC_SYNC, EXEC, r"(?:\{\s*)?\bpython3 -m [^;\n]*"],
            ComplianceLevel::Critical,
        )
        .with_description("Relays commands to the host"),
    ]
}

pub fn find_agent<'a>(agents: &'a [AgentSpec], name: &str) -> Option<&'a AgentSpec> {
    agents.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn default_table_has_three_agents() {
        let agents = default_agents();
        let names: Vec<_> = agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["executor", "dev", "runner"]);
        assert_eq!(agents[2].declared_level, ComplianceLevel::Critical);
    }

    #[test]
    fn default_patterns_compile() {
        for agent in default_agents() {
            for pattern in &agent.unsafe_patterns {
                regex::Regex::new(pattern).unwrap();
            }
        }
    }

    #[test]
    fn level_parses_and_serializes_uppercase() {
        assert_eq!(ComplianceLevel::from_str("critical").unwrap(), ComplianceLevel::Critical);
        assert_eq!(
            serde_json::to_string(&ComplianceLevel::High).unwrap(),
            "\"HIGH\""
        );
    }

    #[test]
    fn agent_lookup_ignores_case() {
        let agents = default_agents();
        assert!(find_agent(&agents, "DEV").is_some());
        assert!(find_agent(&agents, "ghost").is_none());
    }
}
