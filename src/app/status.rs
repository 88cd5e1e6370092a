use crate::compliance::{FlagFinding, ScanReport};
use crate::monitor::{ChangeRecord, HealthSnapshot, SnapshotObserver};
use crate::patches::{Reconciliation, WorkItem};
use crate::trust::{GateDecision, TrustStatus};
use std::fmt::Write;

pub fn render_snapshot(snapshot: &HealthSnapshot) -> String {
    let mut out = String::new();
    let p = &snapshot.patches;
    let _ = writeln!(out, "◆ patchwarden status (tick {})", snapshot.tick);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Patches    pending {}  executing {}  completed {}  failed {}",
        p.pending, p.executing, p.completed, p.failed
    );
    if snapshot.queue.is_empty() {
        let _ = writeln!(out, "Queue      (empty)");
    } else {
        for (i, id) in snapshot.queue.iter().enumerate() {
            let label = if i == 0 { "Queue" } else { "" };
            let _ = writeln!(out, "{label:<10} {}. {id}", i + 1);
        }
    }

    let _ = writeln!(out);
    let systems = &snapshot.systems;
    let list = |names: &[String]| {
        if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        }
    };
    let _ = writeln!(out, "Running    {}", list(&systems.running));
    let _ = writeln!(out, "Stopped    {}", list(&systems.stopped));
    if !systems.errors.is_empty() {
        let _ = writeln!(out, "Errors     {}", list(&systems.errors));
    }

    let endpoint = &snapshot.endpoint;
    match &endpoint.url {
        Some(url) => {
            let _ = writeln!(out, "Endpoint   {} ({url})", endpoint.status);
        }
        None => {
            let _ = writeln!(out, "Endpoint   {}", endpoint.status);
        }
    }

    let _ = writeln!(out);
    if snapshot.recent_activity.is_empty() {
        let _ = writeln!(out, "Recent     (no reports)");
    } else {
        let _ = writeln!(out, "Recent");
        for entry in &snapshot.recent_activity {
            let _ = writeln!(
                out,
                "  {}  {}",
                entry.modified.format("%Y-%m-%d %H:%M:%S"),
                entry.id
            );
        }
    }
    let _ = write!(
        out,
        "\nLast update {}",
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out
}

/// Prints every snapshot, followed by its transitions.
pub struct TextObserver;

impl SnapshotObserver for TextObserver {
    fn name(&self) -> &str {
        "text"
    }

    fn on_snapshot(&self, snapshot: &HealthSnapshot, changes: &[ChangeRecord]) {
        println!("{}", render_snapshot(snapshot));
        for change in changes {
            println!(
                "  ↳ {} {}: {} → {}",
                change.change_type, change.field, change.old_value, change.new_value
            );
        }
        println!();
    }
}

pub fn render_reconciliation(result: &Reconciliation, queue_preview: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "pending {}  completed {}  failed {}",
        result.pending.len(),
        result.completed.len(),
        result.failed.len()
    );
    for id in result.queue_preview(queue_preview) {
        let _ = writeln!(out, "  next  {id}");
    }
    for id in &result.failed {
        let _ = writeln!(out, "  fail  {id}");
    }
    out.trim_end().to_string()
}

pub fn render_items(items: &[WorkItem]) -> String {
    if items.is_empty() {
        return "(no work items)".into();
    }
    items
        .iter()
        .map(|item| {
            let coords = item
                .coordinates
                .as_ref()
                .map_or_else(|| "-".to_string(), |c| c.to_string());
            let trusted = if item.is_trusted_eligible() { "trusted" } else { "" };
            format!(
                "{:<10} {:<8} {} {trusted}",
                item.state.to_string(),
                coords,
                item.id
            )
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_trust_status(status: &TrustStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trust level   {:.3}", status.trust_level);
    let _ = writeln!(
        out,
        "Default gate  {}",
        if status.meets_default_threshold { "open" } else { "closed" }
    );
    if status.below_alert_threshold {
        let _ = writeln!(out, "Alert         below alert threshold");
    }
    let _ = writeln!(
        out,
        "Operations    {} total, {} failed, {} retained",
        status.total_operations, status.violations, status.retained_operations
    );
    let _ = write!(
        out,
        "Last update   {}",
        status.last_update.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out
}

pub fn render_gate(decision: &GateDecision) -> String {
    format!(
        "{} {}: trust {:.3} {} required {:.2}{}",
        if decision.allowed { "ALLOW" } else { "DENY" },
        decision.kind,
        decision.trust_level,
        if decision.allowed { ">=" } else { "<" },
        decision.required,
        if decision.high_risk { " (high-risk)" } else { "" }
    )
}

pub fn render_scan_report(report: &ScanReport) -> String {
    let mut out = String::new();
    let s = &report.stats;
    let _ = writeln!(
        out,
        "{} (risk {})  agents {}  files {}  violations {}  errors {}",
        report.summary.overall_compliance,
        report.summary.risk_level,
        s.agents_monitored,
        s.files_scanned,
        s.violations_detected,
        s.errors
    );
    for v in &report.violations {
        let _ = writeln!(
            out,
            "  [{}] {} {}:{}  {}",
            v.severity, v.agent, v.file, v.line, v.command
        );
    }
    for rec in &report.recommendations {
        let _ = writeln!(
            out,
            "  training recommended for {} ({} violations)",
            rec.agent, rec.violation_count
        );
        for line in &rec.recommendations {
            let _ = writeln!(out, "    - {line}");
        }
    }
    out.trim_end().to_string()
}

pub fn render_flag_findings(findings: &[FlagFinding]) -> String {
    if findings.is_empty() {
        return "All work items declare every required flag.".into();
    }
    findings
        .iter()
        .map(|f| format!(
                "{:<10} {}  missing {}",
                f.state.to_string(),
                f.id,
                f.missing.join(", ")
            ))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{EndpointStatus, PatchCounts, SystemsStatus};
    use crate::patches::{PatchFlags, PatchState};
    use chrono::Utc;

    fn snapshot() -> HealthSnapshot {
        HealthSnapshot {
            tick: 7,
            taken_at: Utc::now(),
            patches: PatchCounts {
                pending: 3,
                executing: 1,
                completed: 9,
                failed: 2,
            },
            queue: vec!["v1(P0.1.0)_a".into(), "v1(P0.2.0)_b".into()],
            systems: SystemsStatus {
                running: vec!["executor".into()],
                stopped: vec!["watcher".into()],
                errors: vec!["relay".into()],
            },
            endpoint: EndpointStatus {
                status: "unreachable".into(),
                last_check: Utc::now(),
                url: Some("http://localhost:2368/health".into()),
            },
            recent_activity: vec![],
        }
    }

    #[test]
    fn snapshot_text_mentions_every_section() {
        let text = render_snapshot(&snapshot());
        assert!(text.contains("tick 7"));
        assert!(text.contains("pending 3"));
        assert!(text.contains("1. v1(P0.1.0)_a"));
        assert!(text.contains("Stopped    watcher"));
        assert!(text.contains("Errors     relay"));
        assert!(text.contains("unreachable (http://localhost:2368/health)"));
        assert!(text.contains("(no reports)"));
    }

    #[test]
    fn gate_rendering() {
        let decision = GateDecision {
            kind: "deploy".into(),
            high_risk: true,
            required: 0.9,
            trust_level: 0.75,
            allowed: false,
        };
        assert_eq!(
            render_gate(&decision),
            "DENY deploy: trust 0.750 < required 0.90 (high-risk)"
        );
    }

    #[test]
    fn items_show_coordinates_and_eligibility() {
        let items = vec![WorkItem::new(
            "v1.4.100(P0.1.0)_legacy-backup",
            PatchState::Pending,
            PatchFlags::all(),
        )];
        let text = render_items(&items);
        assert!(text.contains("P0.1.0"));
        assert!(text.ends_with("trusted"));
    }
}
