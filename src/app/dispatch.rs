use crate::app::status::{
    TextObserver, render_flag_findings, render_gate, render_items, render_reconciliation,
    render_scan_report, render_snapshot, render_trust_status,
};
use crate::cli::{Cli, Commands, ComplianceCommands, PatchCommands, TrustCommands};
use crate::compliance::{ComplianceScanner, audit_flags};
use crate::config::Config;
use crate::monitor::{HealthAggregator, LogObserver, MonitorScheduler};
use crate::patches::{
    FsPatchStore, FsReportStore, LifecycleReconciler, PatchState, PatchStore, WorkItem,
};
use crate::trust::{JsonFileLedgerStore, TrustLedger, run_reassessment_loop};
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing::info;

fn patch_store(config: &Config) -> Arc<FsPatchStore> {
    Arc::new(FsPatchStore::new(config.patches_dir()))
}

fn reconciler(config: &Config) -> LifecycleReconciler {
    LifecycleReconciler::new(
        patch_store(config),
        Arc::new(FsReportStore::new(config.summaries_dir())),
    )
}

fn open_ledger(config: &Config) -> Result<TrustLedger> {
    let path = config.trust_state_path();
    TrustLedger::open(
        config.trust.clone(),
        Arc::new(JsonFileLedgerStore::new(&path)),
    )
    .with_context(|| format!("Failed to open trust ledger at {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Arc<Config>) -> Result<()> {
    match cli.command {
        Commands::Reconcile { json } => {
            let result = reconciler(&config).reconcile_now();
            if json {
                print_json(&result)
            } else {
                println!(
                    "{}",
                    render_reconciliation(&result, config.monitor.queue_preview)
                );
                Ok(())
            }
        }

        Commands::Patch { patch_command } => handle_patch(patch_command, &config),

        Commands::Trust { trust_command } => handle_trust(trust_command, &config),

        Commands::Compliance { compliance_command } => {
            handle_compliance(compliance_command, &config)
        }

        Commands::Status { json } => {
            let snapshot = HealthAggregator::from_config(&config).tick().await;
            if json {
                print_json(&*snapshot)
            } else {
                println!("{}", render_snapshot(&snapshot));
                Ok(())
            }
        }

        Commands::Watch { interval } => {
            let secs = interval.unwrap_or(config.monitor.tick_interval_secs);
            if secs == 0 {
                bail!("--interval must be at least 1 second");
            }
            run_watch(&config, Duration::from_secs(secs)).await
        }
    }
}

fn handle_patch(command: PatchCommands, config: &Config) -> Result<()> {
    let store = patch_store(config);
    match command {
        PatchCommands::List { state, json } => {
            let states: Vec<PatchState> = match state {
                Some(state) => vec![state],
                None => PatchState::iter().collect(),
            };
            let mut items: Vec<WorkItem> = Vec::new();
            for state in states {
                items.extend(
                    store
                        .list(state)
                        .with_context(|| format!("Failed to list {state} work items"))?,
                );
            }
            if json {
                print_json(&items)
            } else {
                println!("{}", render_items(&items));
                Ok(())
            }
        }

        PatchCommands::Complete { id } => {
            let item = store.complete(&id)?;
            println!("Completed {}", item.id);
            let ledger = open_ledger(config)?;
            ledger
                .record_operation("patch-complete", true)
                .context("Work item moved but the trust ledger was not persisted")?;
            Ok(())
        }

        PatchCommands::Fail { id } => {
            let item = store.fail(&id)?;
            println!("Failed {}", item.id);
            let ledger = open_ledger(config)?;
            ledger
                .record_operation("patch-execute", false)
                .context("Work item moved but the trust ledger was not persisted")?;
            Ok(())
        }

        PatchCommands::Archive { id } => {
            let item = store.archive(&id)?;
            println!("Archived {}", item.id);
            Ok(())
        }
    }
}

fn handle_trust(command: TrustCommands, config: &Config) -> Result<()> {
    let ledger = open_ledger(config)?;
    match command {
        TrustCommands::Record {
            kind,
            failed,
            details,
        } => {
            let level = match details {
                Some(raw) => {
                    let value: serde_json::Value =
                        serde_json::from_str(&raw).context("--details must be JSON")?;
                    let serde_json::Value::Object(map) = value else {
                        bail!("--details must be a JSON object");
                    };
                    ledger.record_operation_with_details(&kind, !failed, map)?
                }
                None => ledger.record_operation(&kind, !failed)?,
            };
            let outcome = if failed { "failed" } else { "ok" };
            println!("Recorded {kind} ({outcome}); trust level {level:.3}");
            Ok(())
        }

        TrustCommands::Check { kind, json } => {
            let decision = ledger.evaluate(&kind);
            if json {
                print_json(&decision)?;
            } else {
                println!("{}", render_gate(&decision));
            }
            if !decision.allowed {
                bail!("operation '{kind}' is not permitted at the current trust level");
            }
            Ok(())
        }

        TrustCommands::Status { json } => {
            let status = ledger.status();
            if json {
                print_json(&status)
            } else {
                println!("{}", render_trust_status(&status));
                Ok(())
            }
        }

        TrustCommands::Assess => {
            let level = ledger.assess()?;
            println!("Trust level {level:.3}");
            Ok(())
        }
    }
}

fn handle_compliance(command: ComplianceCommands, config: &Config) -> Result<()> {
    match command {
        ComplianceCommands::Scan {
            agent,
            json,
            no_log,
        } => {
            let scanner =
                ComplianceScanner::from_config(config.compliance_root(), &config.compliance);
            let agents = &config.compliance.agents;
            let report = match agent.as_deref() {
                Some(name) => match scanner.scan_agent(agents, name) {
                    Some(report) => report,
                    None => bail!("Unknown agent '{name}'"),
                },
                None => scanner.scan(agents),
            };

            if !no_log {
                report
                    .append_to_log(&config.violation_log_path())
                    .context("Failed to append to the compliance violation log")?;
            }
            if json {
                print_json(&report)
            } else {
                println!("{}", render_scan_report(&report));
                Ok(())
            }
        }

        ComplianceCommands::Flags { json } => {
            let store = patch_store(config);
            let mut items = Vec::new();
            for state in [PatchState::Pending, PatchState::Completed] {
                match store.list(state) {
                    Ok(listed) => items.extend(listed),
                    Err(error) => tracing::warn!(%error, "skipping unreadable collection"),
                }
            }
            let findings = audit_flags(&items);
            if json {
                print_json(&findings)
            } else {
                println!("{}", render_flag_findings(&findings));
                Ok(())
            }
        }
    }
}

async fn run_watch(config: &Config, interval: Duration) -> Result<()> {
    let aggregator = Arc::new(HealthAggregator::from_config(config));
    let _log_feed = aggregator.on_snapshot(Arc::new(LogObserver));
    let _text_feed = aggregator.on_snapshot(Arc::new(TextObserver));

    let ledger = Arc::new(open_ledger(config)?);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let reassess = tokio::spawn(run_reassessment_loop(
        ledger,
        Duration::from_secs(config.trust.reassess_interval_secs),
        shutdown_rx,
    ));

    let scheduler = MonitorScheduler::start(Arc::clone(&aggregator), interval);
    info!("Watching; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Shutting down");
    scheduler.stop().await;
    let _ = shutdown_tx.send(true);
    if let Err(error) = reassess.await {
        tracing::error!(%error, "trust reassessment task ended abnormally");
    }
    if let Err(error) = aggregator.persist_latest().await {
        tracing::warn!(%error, "failed to write final monitor state");
    }
    Ok(())
}
