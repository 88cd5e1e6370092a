mod subcommands;

pub use subcommands::{ComplianceCommands, PatchCommands, TrustCommands};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `patchwarden` - patch lifecycle, trust gating and health status.
#[derive(Parser, Debug)]
#[command(name = "patchwarden")]
#[command(version)]
#[command(about = "Track agent work items, gate risky operations and watch system health.", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.patchwarden/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive pending/completed/failed from the patch and report stores
    Reconcile {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Inspect and move work items
    Patch {
        #[command(subcommand)]
        patch_command: PatchCommands,
    },

    /// Record outcomes and check trust gates
    Trust {
        #[command(subcommand)]
        trust_command: TrustCommands,
    },

    /// Scan agent-owned code and audit work-item flags
    Compliance {
        #[command(subcommand)]
        compliance_command: ComplianceCommands,
    },

    /// Take one health snapshot
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Tick the health monitor and trust reassessment until Ctrl-C
    Watch {
        /// Seconds between ticks (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_trust_record() {
        let cli = Cli::try_parse_from([
            "patchwarden",
            "trust",
            "record",
            "deploy",
            "--failed",
            "--details",
            r#"{"patch":"x"}"#,
        ])
        .unwrap();
        let Commands::Trust {
            trust_command: TrustCommands::Record { kind, failed, details },
        } = cli.command
        else {
            panic!("expected trust record");
        };
        assert_eq!(kind, "deploy");
        assert!(failed);
        assert_eq!(details.as_deref(), Some(r#"{"patch":"x"}"#));
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["patchwarden", "status", "--config", "/tmp/pw.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pw.toml")));
    }

    #[test]
    fn patch_list_state_filter() {
        let cli =
            Cli::try_parse_from(["patchwarden", "patch", "list", "--state", "failed"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Patch {
                patch_command: PatchCommands::List {
                    state: Some(crate::patches::PatchState::Failed),
                    ..
                }
            }
        ));
    }

    #[test]
    fn patch_list_rejects_unknown_state() {
        let err = Cli::try_parse_from(["patchwarden", "patch", "list", "--state", "running"])
            .unwrap_err();
        assert!(err.to_string().contains("unknown state 'running'"));
    }
}
