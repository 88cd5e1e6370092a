use crate::error::ProbeError;
use crate::monitor::probe::{Probe, ProbeFuture, ProbeReading};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Liveness of a local process, checked with `pgrep -f <pattern>`.
///
/// Exit status 0 means at least one match, 1 means none; anything else is a
/// probe failure.
pub struct ProcessProbe {
    name: String,
    pattern: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessProbe {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            program: "pgrep".into(),
            args: vec!["-f".into()],
            timeout,
        }
    }

    /// Replace the matcher. The pattern is passed as the last argument.
    #[must_use]
    pub fn with_command(mut self, program: impl Into<String>, args: &[&str]) -> Self {
        self.program = program.into();
        self.args = args.iter().map(|a| (*a).to_string()).collect();
        self
    }
}

impl Probe for ProcessProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn probe(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            let status = Command::new(&self.program)
                .args(&self.args)
                .arg(&self.pattern)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status()
                .await
                .map_err(|e| ProbeError::Spawn {
                    probe: self.name.clone(),
                    message: e.to_string(),
                })?;

            match status.code() {
                Some(0) => Ok(ProbeReading::Alive(true)),
                Some(1) => Ok(ProbeReading::Alive(false)),
                other => Err(ProbeError::Spawn {
                    probe: self.name.clone(),
                    message: format!("{} exited with {other:?}", self.program),
                }),
            }
        })
    }
}
