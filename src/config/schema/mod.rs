mod compliance;
mod core;
mod monitor;
mod stores;
mod trust;

pub use compliance::ComplianceConfig;
pub use core::{Config, LoggingConfig};
pub use monitor::{MonitorConfig, SubsystemConfig};
pub use stores::StoresConfig;
pub use trust::TrustConfig;
