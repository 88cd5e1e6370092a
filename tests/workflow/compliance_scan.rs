use crate::workspace::Workspace;
use patchwarden::compliance::{ComplianceScanner, OverallCompliance};

#[test]
fn blocking_launches_in_owned_scripts_are_reported() {
    let ws = Workspace::new();
    ws.write_source(
        "scripts/build.js",
        "const x = 1;\nexecSync('npm run build');\nexecSync('git status');\n",
    );
    ws.write_source("scripts/node_modules/dep.js", "execSync('rm -rf /');\n");
    ws.write_source("scripts/notes.txt", "execSync('make');\n");

    let scanner = ComplianceScanner::from_config(ws.config.compliance_root(), &ws.config.compliance);
    let report = scanner
        .scan_agent(&ws.config.compliance.agents, "executor")
        .expect("executor agent");

    assert_eq!(report.stats.files_scanned, 1);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].line, 2);
    assert_eq!(report.violations[0].file, "scripts/build.js");
    assert_eq!(report.summary.overall_compliance, OverallCompliance::NonCompliant);
}

#[test]
fn scan_appends_to_violation_log() {
    let ws = Workspace::new();
    ws.write_source("scripts/run.sh", "execSync('make all')\n");

    let scanner = ComplianceScanner::from_config(ws.config.compliance_root(), &ws.config.compliance);
    let report = scanner.scan(&ws.config.compliance.agents);
    assert!(!report.is_compliant());

    let log = ws.config.violation_log_path();
    report.append_to_log(&log).unwrap();
    report.append_to_log(&log).unwrap();
    let lines = std::fs::read_to_string(&log).unwrap();
    assert!(lines.lines().count() >= 2);
    for line in lines.lines() {
        serde_json::from_str::<serde_json::Value>(line).expect("json line");
    }
}

#[test]
fn missing_owned_paths_give_a_clean_report() {
    let ws = Workspace::new();
    let scanner = ComplianceScanner::from_config(ws.config.compliance_root(), &ws.config.compliance);
    let report = scanner.scan(&ws.config.compliance.agents);
    assert!(report.is_compliant());
    assert_eq!(report.stats.files_scanned, 0);
    assert_eq!(report.stats.agents_monitored, ws.config.compliance.agents.len());
}
