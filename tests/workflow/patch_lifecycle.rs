use crate::workspace::Workspace;
use patchwarden::error::StoreError;
use patchwarden::patches::{
    FsPatchStore, FsReportStore, LifecycleReconciler, PatchState, PatchStore,
};
use std::collections::BTreeSet;
use std::sync::Arc;

const FULL_FLAGS: &str =
    r#"{"enforceValidationGate":true,"requireMutationProof":true,"strictRuntimeAudit":true}"#;

fn reconciler(ws: &Workspace) -> (LifecycleReconciler, Arc<FsPatchStore>) {
    let patches = Arc::new(FsPatchStore::new(ws.config.patches_dir()));
    let reports = Arc::new(FsReportStore::new(ws.config.summaries_dir()));
    (LifecycleReconciler::new(patches.clone(), reports), patches)
}

#[test]
fn report_without_move_counts_as_completed() {
    let ws = Workspace::new();
    ws.add_patch("v1(P0.2.0)_later", FULL_FLAGS);
    ws.add_patch("v1(P0.1.0)_first", "{}");
    ws.add_report("v1(P0.1.0)_first");

    let (reconciler, _) = reconciler(&ws);
    let result = reconciler.reconcile_now();

    assert_eq!(result.pending, BTreeSet::from(["v1(P0.2.0)_later".to_string()]));
    assert_eq!(result.completed, BTreeSet::from(["v1(P0.1.0)_first".to_string()]));
}

#[test]
fn moves_are_reflected_on_the_next_reconcile() {
    let ws = Workspace::new();
    ws.add_patch("v1(P0.1.0)_a", FULL_FLAGS);
    ws.add_patch("v1(P0.1.1)_b", FULL_FLAGS);
    let (reconciler, store) = reconciler(&ws);

    store.complete("v1(P0.1.0)_a").expect("complete");
    store.fail("v1(P0.1.1)_b").expect("fail");
    let result = reconciler.reconcile_now();

    assert!(result.pending.is_empty());
    assert_eq!(result.state_of("v1(P0.1.0)_a"), Some(PatchState::Completed));
    assert_eq!(result.state_of("v1(P0.1.1)_b"), Some(PatchState::Failed));
    assert!(
        ws.config
            .patches_dir()
            .join(".failed/patch-v1(P0.1.1)_b.json")
            .exists()
    );
}

#[test]
fn archiving_a_pending_item_is_rejected() {
    let ws = Workspace::new();
    ws.add_patch("v1(P0.1.0)_a", "{}");
    let (_, store) = reconciler(&ws);

    let err = store.archive("v1(P0.1.0)_a").unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }), "{err}");
    assert_eq!(store.list(PatchState::Pending).unwrap().len(), 1);
}

#[test]
fn flags_are_read_from_descriptors() {
    let ws = Workspace::new();
    ws.add_patch("v1(P0.1.0)_a", FULL_FLAGS);
    ws.add_patch("v1(P0.1.1)_b", r#"{"enforceValidationGate":true}"#);
    let (_, store) = reconciler(&ws);

    let items = store.list(PatchState::Pending).unwrap();
    let findings = patchwarden::compliance::audit_flags(&items);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, "v1(P0.1.1)_b");
}
