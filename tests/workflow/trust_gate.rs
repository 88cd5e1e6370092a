use crate::workspace::Workspace;
use patchwarden::trust::{JsonFileLedgerStore, TrustLedger};
use std::sync::Arc;

fn open(ws: &Workspace) -> TrustLedger {
    TrustLedger::open(
        ws.config.trust.clone(),
        Arc::new(JsonFileLedgerStore::new(ws.config.trust_state_path())),
    )
    .expect("open ledger")
}

#[test]
fn ledger_state_survives_restarts() {
    let ws = Workspace::new();
    {
        let ledger = open(&ws);
        for _ in 0..9 {
            ledger.record_operation("patch-complete", true).unwrap();
        }
        ledger.record_operation("patch-execute", false).unwrap();
    }

    let ledger = open(&ws);
    let status = ledger.status();
    assert_eq!(status.total_operations, 10);
    assert_eq!(status.violations, 1);
    // 0.7 * 0.9 + 0.3 * 0.8
    assert!((status.trust_level - 0.87).abs() < 1e-9);
    assert!(ws.config.trust_state_path().exists());
}

#[test]
fn high_risk_operations_need_the_higher_threshold() {
    let ws = Workspace::new();
    let ledger = open(&ws);
    for _ in 0..9 {
        ledger.record_operation("build", true).unwrap();
    }
    ledger.record_operation("build", false).unwrap();

    assert!(ledger.can_proceed("code-change"));
    let decision = ledger.evaluate("deploy");
    assert!(decision.high_risk);
    assert!(!decision.allowed);
}

#[test]
fn ledger_file_uses_camel_case_keys() {
    let ws = Workspace::new();
    open(&ws).record_operation("build", true).unwrap();

    let raw = std::fs::read_to_string(ws.config.trust_state_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["totalOperations"], 1);
    assert_eq!(value["operations"][0]["type"], "build");
}
