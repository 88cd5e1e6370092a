use super::agents::{AgentSpec, ComplianceLevel};
use super::report::ScanReport;
use super::walk::{WalkOptions, collect_sources};
use crate::config::ComplianceConfig;
use crate::error::ScanError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One unsafe command found in agent-owned source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub agent: String,
    /// Relative to the compliance root, `/`-separated.
    pub file: String,
    /// 1-based line of the match start.
    pub line: usize,
    pub pattern: String,
    pub command: String,
    pub severity: ComplianceLevel,
}

/// Finds unsafe commands in one source text on behalf of one agent.
///
/// The regex heuristic is one implementation; a structural scanner can be
/// swapped in without changing [`ComplianceViolation`].
pub trait SourceScanner: Send + Sync {
    fn name(&self) -> &str;

    fn scan_source(&self, agent: &AgentSpec, file: &str, content: &str) -> Vec<ComplianceViolation>;
}

/// Textual pass: every pattern match is a violation unless it is already
/// detached or its command is allow-listed.
///
/// Comments and string literals are not understood, so both false
/// positives and disguised commands are expected.
pub struct RegexScanner {
    patterns: HashMap<String, Vec<(String, Regex)>>,
    allow_list: Vec<String>,
    detached_markers: Vec<String>,
}

impl RegexScanner {
    /// Compile every agent's patterns. Invalid patterns are left out and
    /// returned as errors.
    pub fn new(
        agents: &[AgentSpec],
        allow_list: Vec<String>,
        detached_markers: Vec<String>,
    ) -> (Self, Vec<ScanError>) {
        let mut patterns = HashMap::new();
        let mut errors = Vec::new();

        for agent in agents {
            let compiled: Vec<(String, Regex)> = agent
                .unsafe_patterns
                .iter()
                .filter_map(|pattern| match Regex::new(pattern) {
                    Ok(regex) => Some((pattern.clone(), regex)),
                    Err(source) => {
                        let error = ScanError::Pattern {
                            agent: agent.name.clone(),
                            pattern: pattern.clone(),
                            source,
                        };
                        tracing::warn!(%error, "ignoring unsafe pattern");
                        errors.push(error);
                        None
                    }
                })
                .collect();
            patterns.insert(agent.name.clone(), compiled);
        }

        let scanner = Self {
            patterns,
            allow_list,
            detached_markers,
        };
        (scanner, errors)
    }

    fn is_detached(&self, matched: &str) -> bool {
        !self.detached_markers.is_empty()
            && self.detached_markers.iter().all(|m| matched.contains(m.as_str()))
    }

    fn is_allowed(&self, command: &str) -> bool {
        let command = command.trim().trim_start_matches('{').trim();
        self.allow_list.iter().any(|entry| {
            command == entry
                || command
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with(' '))
        })
    }
}

impl SourceScanner for RegexScanner {
    fn name(&self) -> &str {
        "regex"
    }

    fn scan_source(&self, agent: &AgentSpec, file: &str, content: &str) -> Vec<ComplianceViolation> {
        let Some(patterns) = self.patterns.get(&agent.name) else {
            return Vec::new();
        };

        let mut violations = Vec::new();
        for (pattern, regex) in patterns {
            for caps in regex.captures_iter(content) {
                let Some(whole) = caps.get(0) else { continue };
                if self.is_detached(whole.as_str()) {
                    continue;
                }
                let command = caps
                    .get(1)
                    .map_or_else(|| whole.as_str(), |c| c.as_str())
                    .trim();
                if self.is_allowed(command) {
                    continue;
                }
                violations.push(ComplianceViolation {
                    agent: agent.name.clone(),
                    file: file.to_string(),
                    line: line_of(content, whole.start()),
                    pattern: pattern.clone(),
                    command: command.to_string(),
                    severity: agent.declared_level,
                });
            }
        }
        violations.sort_by_key(|v| v.line);
        violations
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

fn relative_display(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Walks each agent's owned paths and runs a [`SourceScanner`] over every
/// tracked file.
pub struct ComplianceScanner<S = RegexScanner> {
    root: PathBuf,
    walk: WalkOptions,
    scanner: S,
    setup_errors: usize,
}

impl ComplianceScanner<RegexScanner> {
    pub fn from_config(root: impl Into<PathBuf>, config: &ComplianceConfig) -> Self {
        let (scanner, errors) = RegexScanner::new(
            &config.agents,
            config.allow_list.clone(),
            config.detached_markers.clone(),
        );
        let walk = WalkOptions {
            excluded_dirs: config.excluded_dirs.clone(),
            extensions: config.extensions.clone(),
        };
        Self {
            root: root.into(),
            walk,
            scanner,
            setup_errors: errors.len(),
        }
    }
}

impl<S: SourceScanner> ComplianceScanner<S> {
    pub fn new(root: impl Into<PathBuf>, walk: WalkOptions, scanner: S) -> Self {
        Self {
            root: root.into(),
            walk,
            scanner,
            setup_errors: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan every agent. Never fails: unreadable files are skipped and
    /// counted in `stats.errors`.
    pub fn scan(&self, agents: &[AgentSpec]) -> ScanReport {
        let mut violations = Vec::new();
        let mut files_scanned = 0;
        let mut errors = self.setup_errors;

        for agent in agents {
            tracing::debug!(agent = %agent.name, scanner = self.scanner.name(), "checking agent compliance");
            for owned in &agent.owned_paths {
                let start = self.root.join(owned);
                if !start.exists() {
                    tracing::debug!(agent = %agent.name, path = %start.display(), "owned path missing");
                    continue;
                }
                let (files, walk_errors) = collect_sources(&start, &self.walk);
                errors += walk_errors.len();

                for file in files {
                    match fs::read_to_string(&file) {
                        Ok(content) => {
                            files_scanned += 1;
                            let rel = relative_display(&self.root, &file);
                            violations.extend(self.scanner.scan_source(agent, &rel, &content));
                        }
                        Err(source) => {
                            let error = ScanError::Read { path: file, source };
                            tracing::warn!(%error, "skipping unreadable source file");
                            errors += 1;
                        }
                    }
                }
            }
        }

        let report = ScanReport::build(agents, violations, files_scanned, errors);
        tracing::info!(
            agents = report.stats.agents_monitored,
            files = report.stats.files_scanned,
            violations = report.stats.violations_detected,
            errors = report.stats.errors,
            "compliance scan finished"
        );
        report
    }

    /// Scan only the agent named `name`; `None` when no such agent exists.
    pub fn scan_agent(&self, agents: &[AgentSpec], name: &str) -> Option<ScanReport> {
        super::agents::find_agent(agents, name).map(|agent| self.scan(std::slice::from_ref(agent)))
    }
}
