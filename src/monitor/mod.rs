//! Periodic health aggregation: probes, immutable snapshots, transition
//! history and observer fan-out.

pub mod aggregator;
pub mod observer;
pub mod probe;
pub mod probes;
pub mod scheduler;
pub mod snapshot;

pub use aggregator::{HealthAggregator, Publication};
pub use observer::{FnObserver, LogObserver, SnapshotObserver};
pub use probe::{Probe, ProbeFuture, ProbeReading, run_probe};
pub use probes::{FileTimestampProbe, HttpProbe, ProcessProbe};
pub use scheduler::MonitorScheduler;
pub use snapshot::{
    ActivityEntry, ChangeRecord, ChangeType, EndpointStatus, HealthSnapshot, PatchCounts,
    SystemsStatus, diff,
};
