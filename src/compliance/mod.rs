//! Advisory scanning of agent-owned source for blocking command launches,
//! plus the work-item flag audit.

pub mod agents;
pub mod flags;
pub mod report;
pub mod scanner;
pub mod walk;

pub use agents::{AgentSpec, ComplianceLevel, default_agents, find_agent};
pub use flags::{FlagFinding, audit_flags};
pub use report::{
    OverallCompliance, RiskLevel, ScanReport, ScanStats, ScanSummary, TrainingRecommendation,
};
pub use scanner::{ComplianceScanner, ComplianceViolation, RegexScanner, SourceScanner};
pub use walk::{WalkOptions, collect_sources};
