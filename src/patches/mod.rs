//! Work items ("patches"), their completion reports, and lifecycle
//! reconciliation between the two.

pub mod fs;
pub mod id;
pub mod memory;
pub mod reconcile;
pub mod store;
pub mod types;

pub use fs::{FsPatchStore, FsReportStore};
pub use id::{PatchCoordinates, normalize};
pub use memory::{MemoryPatchStore, MemoryReportStore};
pub use reconcile::{LifecycleReconciler, Reconciliation, StoreView, reconcile, reconcile_view};
pub use store::{PatchStore, ReportStore};
pub use types::{CompletionReport, PatchFlags, PatchState, WorkItem};
