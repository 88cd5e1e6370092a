use super::agents::AgentSpec;
use super::scanner::ComplianceViolation;
use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const TRAINING_RECOMMENDATIONS: [&str; 4] = [
    "Review non-blocking pattern documentation",
    "Use validation tools before committing",
    "Follow agent-specific guidelines",
    "Attend compliance training session",
];

/// Advisory output for an agent with at least one violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingRecommendation {
    pub agent: String,
    pub violation_count: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub agents_monitored: usize,
    pub compliance_checks: usize,
    pub files_scanned: usize,
    pub violations_detected: usize,
    pub training_sessions: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum OverallCompliance {
    #[serde(rename = "COMPLIANT")]
    #[strum(serialize = "COMPLIANT")]
    Compliant,
    #[serde(rename = "NON-COMPLIANT")]
    #[strum(serialize = "NON-COMPLIANT")]
    NonCompliant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn for_violations(count: usize) -> Self {
        match count {
            n if n > 10 => Self::High,
            n if n > 5 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub overall_compliance: OverallCompliance,
    pub risk_level: RiskLevel,
    pub training_needed: bool,
}

/// Result of one compliance scan. Recomputed from scratch every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub violations: Vec<ComplianceViolation>,
    pub recommendations: Vec<TrainingRecommendation>,
    pub stats: ScanStats,
    pub summary: ScanSummary,
}

impl ScanReport {
    pub fn build(
        agents: &[AgentSpec],
        violations: Vec<ComplianceViolation>,
        files_scanned: usize,
        errors: usize,
    ) -> Self {
        let mut per_agent: BTreeMap<&str, usize> = BTreeMap::new();
        for violation in &violations {
            *per_agent.entry(violation.agent.as_str()).or_default() += 1;
        }

        // Agent order, not alphabetical.
        let recommendations: Vec<TrainingRecommendation> = agents
            .iter()
            .filter_map(|agent| {
                per_agent
                    .get(agent.name.as_str())
                    .map(|&violation_count| TrainingRecommendation {
                        agent: agent.name.clone(),
                        violation_count,
                        recommendations: TRAINING_RECOMMENDATIONS
                            .iter()
                            .map(|r| (*r).to_string())
                            .collect(),
                    })
            })
            .collect();

        for rec in &recommendations {
            tracing::warn!(
                agent = %rec.agent,
                violations = rec.violation_count,
                "training session recommended"
            );
        }

        let stats = ScanStats {
            agents_monitored: agents.len(),
            compliance_checks: agents.len(),
            files_scanned,
            violations_detected: violations.len(),
            training_sessions: recommendations.len(),
            errors,
        };

        let summary = ScanSummary {
            overall_compliance: if violations.is_empty() {
                OverallCompliance::Compliant
            } else {
                OverallCompliance::NonCompliant
            },
            risk_level: RiskLevel::for_violations(violations.len()),
            training_needed: !recommendations.is_empty(),
        };

        Self {
            generated_at: Utc::now(),
            violations,
            recommendations,
            stats,
            summary,
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.summary.overall_compliance == OverallCompliance::Compliant
    }

    /// Append one JSON line per violation and per recommendation.
    pub fn append_to_log(&self, path: &Path) -> Result<(), PersistenceError> {
        let write_err = |source: std::io::Error| PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut buf = Vec::new();
        for violation in &self.violations {
            serde_json::to_writer(
                &mut buf,
                &LogLine::Violation {
                    timestamp: self.generated_at,
                    violation,
                },
            )?;
            buf.push(b'\n');
        }
        for recommendation in &self.recommendations {
            serde_json::to_writer(
                &mut buf,
                &LogLine::Training {
                    timestamp: self.generated_at,
                    recommendation,
                },
            )?;
            buf.push(b'\n');
        }
        if buf.is_empty() {
            return Ok(());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(write_err)?;
        file.write_all(&buf).map_err(write_err)?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum LogLine<'a> {
    Violation {
        timestamp: DateTime<Utc>,
        #[serde(flatten)]
        violation: &'a ComplianceViolation,
    },
    Training {
        timestamp: DateTime<Utc>,
        #[serde(flatten)]
        recommendation: &'a TrainingRecommendation,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::agents::{ComplianceLevel, default_agents};
    use tempfile::TempDir;

    fn violation(agent: &str, line: usize) -> ComplianceViolation {
        ComplianceViolation {
            agent: agent.into(),
            file: "scripts/run.js".into(),
            line,
            pattern: "npx".into(),
            command: "npx jest".into(),
            severity: ComplianceLevel::High,
        }
    }

    #[test]
    fn clean_scan_is_compliant_and_low_risk() {
        let report = ScanReport::build(&default_agents(), vec![], 4, 0);
        assert!(report.is_compliant());
        assert_eq!(report.summary.risk_level, RiskLevel::Low);
        assert!(!report.summary.training_needed);
        assert_eq!(report.stats.agents_monitored, 3);
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::for_violations(5), RiskLevel::Low);
        assert_eq!(RiskLevel::for_violations(6), RiskLevel::Medium);
        assert_eq!(RiskLevel::for_violations(10), RiskLevel::Medium);
        assert_eq!(RiskLevel::for_violations(11), RiskLevel::High);
    }

    #[test]
    fn one_recommendation_per_offending_agent() {
        let violations = vec![violation("dev", 1), violation("dev", 9), violation("runner", 2)];
        let report = ScanReport::build(&default_agents(), violations, 2, 0);

        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[0].agent, "dev");
        assert_eq!(report.recommendations[0].violation_count, 2);
        assert_eq!(report.recommendations[0].recommendations.len(), 4);
        assert_eq!(report.stats.training_sessions, 2);
        assert_eq!(
            report.summary.overall_compliance.to_string(),
            "NON-COMPLIANT"
        );
    }

    #[test]
    fn summary_serializes_with_original_labels() {
        let report = ScanReport::build(&default_agents(), vec![violation("dev", 1)], 1, 0);
        let json = serde_json::to_value(report.summary).unwrap();
        assert_eq!(json["overall_compliance"], "NON-COMPLIANT");
        assert_eq!(json["risk_level"], "LOW");
    }

    #[test]
    fn violation_log_appends_json_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/violations.jsonl");
        let report = ScanReport::build(&default_agents(), vec![violation("dev", 3)], 1, 0);

        report.append_to_log(&path).unwrap();
        report.append_to_log(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["kind"], "violation");
        assert_eq!(lines[0]["line"], 3);
        assert_eq!(lines[1]["kind"], "training");
        assert_eq!(lines[1]["violation_count"], 1);
    }

    #[test]
    fn clean_report_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("violations.jsonl");
        ScanReport::build(&default_agents(), vec![], 0, 0)
            .append_to_log(&path)
            .unwrap();
        assert!(!path.exists());
    }
}
