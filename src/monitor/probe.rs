use super::snapshot::ActivityEntry;
use crate::error::ProbeError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// What a probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeReading {
    /// Process-existence style liveness.
    Alive(bool),
    /// Status string reported by a health endpoint.
    Status(String),
    /// Recent report files, newest first.
    Activity(Vec<ActivityEntry>),
}

impl ProbeReading {
    fn unexpected(probe: &str) -> ProbeError {
        ProbeError::UnexpectedReading {
            probe: probe.to_string(),
        }
    }

    pub fn into_alive(self, probe: &str) -> Result<bool, ProbeError> {
        match self {
            Self::Alive(alive) => Ok(alive),
            _ => Err(Self::unexpected(probe)),
        }
    }

    pub fn into_status(self, probe: &str) -> Result<String, ProbeError> {
        match self {
            Self::Status(status) => Ok(status),
            _ => Err(Self::unexpected(probe)),
        }
    }

    pub fn into_activity(self, probe: &str) -> Result<Vec<ActivityEntry>, ProbeError> {
        match self {
            Self::Activity(entries) => Ok(entries),
            _ => Err(Self::unexpected(probe)),
        }
    }
}

pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Result<ProbeReading, ProbeError>> + Send + 'a>>;

/// One health signal. New signal types implement this and are composed by
/// the aggregator.
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    /// Upper bound enforced by [`run_probe`].
    fn timeout(&self) -> Duration;

    fn probe(&self) -> ProbeFuture<'_>;
}

/// Run `probe` under its own timeout. No retries: the next tick is the retry.
pub async fn run_probe(probe: &dyn Probe) -> Result<ProbeReading, ProbeError> {
    let timeout = probe.timeout();
    match tokio::time::timeout(timeout, probe.probe()).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout {
            probe: probe.name().to_string(),
            after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
