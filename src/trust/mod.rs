//! Operation outcome ledger and the trust level derived from it.

pub mod ledger;
pub mod persist;
pub mod reassess;
pub mod state;

pub use ledger::{GateDecision, TrustLedger, TrustStatus, compute_trust_level};
pub use persist::{JsonFileLedgerStore, LedgerStore, MemoryLedgerStore};
pub use reassess::run_reassessment_loop;
pub use state::{OperationRecord, TrustLedgerState};
