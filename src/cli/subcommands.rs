use crate::patches::PatchState;
use clap::Subcommand;

fn parse_state(raw: &str) -> Result<PatchState, String> {
    raw.parse()
        .map_err(|_| format!("unknown state '{raw}' (pending, completed, failed, archived)"))
}

#[derive(Subcommand, Debug)]
pub enum PatchCommands {
    /// List work items by physical collection
    List {
        /// pending, completed, failed or archived (default: all)
        #[arg(long, value_parser = parse_state)]
        state: Option<PatchState>,
        #[arg(long)]
        json: bool,
    },
    /// Move a pending item to completed
    Complete { id: String },
    /// Move a pending item to failed
    Fail { id: String },
    /// Move a completed item to the archive
    Archive { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TrustCommands {
    /// Record one operation outcome
    Record {
        kind: String,
        /// The operation failed
        #[arg(long)]
        failed: bool,
        /// Extra JSON object stored with the record
        #[arg(long)]
        details: Option<String>,
    },
    /// Exit non-zero when the trust level is below the gate for KIND
    Check {
        kind: String,
        #[arg(long)]
        json: bool,
    },
    /// Show trust level and counters
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Recompute and persist the trust level
    Assess,
}

#[derive(Subcommand, Debug)]
pub enum ComplianceCommands {
    /// Scan every agent (or one) for blocking command launches
    Scan {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        json: bool,
        /// Do not append to the violation log
        #[arg(long)]
        no_log: bool,
    },
    /// List work items missing required flags
    Flags {
        #[arg(long)]
        json: bool,
    },
}
