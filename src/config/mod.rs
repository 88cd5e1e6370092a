pub mod schema;

pub use schema::{
    ComplianceConfig, Config, LoggingConfig, MonitorConfig, StoresConfig, SubsystemConfig,
    TrustConfig,
};
