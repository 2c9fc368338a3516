//! CLI command implementations

use anyhow::Result;
use dialoguer::Confirm;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::app::SafeVault;
use crate::balance::BalanceSnapshot;
use crate::config::Config;
use crate::provider::RpcEnvironment;
use crate::report::{ChannelReporter, Reporter, TracingReporter};
use crate::trading::{IntentKind, SubmissionOutcome, TransactionIntent, TransactionPhase};

/// Build the session context, detect the provider and connect
async fn open_session(config: &Config, reporter: Arc<dyn Reporter>) -> Result<SafeVault> {
    let vault = SafeVault::new(config, reporter)?;
    let environment = RpcEnvironment::new(config.provider.clone(), config.confirmation.clone());

    vault.initialize_provider(&environment).await?;
    let account = vault.connect().await?;
    println!("Connected: {}", account);

    Ok(vault)
}

/// Show account and balances
pub async fn status(config: &Config) -> Result<()> {
    let vault = open_session(config, Arc::new(TracingReporter)).await?;
    let balances = loaded_balances(&vault).await?;

    println!("\n=== SAFEVAULT STATUS ===\n");
    match vault.account().await {
        Some(account) => println!("Account: {}", account),
        None => println!("Account: not connected"),
    }
    println!("Vault:   {}", config.contracts.vault_address);
    println!("Token:   {}", config.contracts.token_address);
    println!("\n{}", balances);

    Ok(())
}

/// Balances loaded by the refresh that follows connect
///
/// A failed load was already reported and is not attempted again.
async fn loaded_balances(vault: &SafeVault) -> Result<BalanceSnapshot> {
    let balances = vault.balances().await;
    if !balances.is_fresh() {
        anyhow::bail!("Balances could not be loaded after connect");
    }
    Ok(balances)
}

/// Deposit native currency into the vault
pub async fn deposit(config: &Config, amount: &str, force: bool) -> Result<()> {
    transact(config, TransactionIntent::deposit(amount), force).await
}

/// Withdraw from the vault
pub async fn withdraw(config: &Config, amount: &str, force: bool) -> Result<()> {
    transact(config, TransactionIntent::withdraw(amount), force).await
}

async fn transact(config: &Config, intent: TransactionIntent, force: bool) -> Result<()> {
    info!("{} command: amount={}", intent.kind, intent.amount);

    // Reject malformed amounts before asking anything
    intent.smallest_units(config.units.native_decimals)?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "{} {} {} vault {}? This cannot be undone.",
                intent.kind, intent.amount, preposition(intent.kind), config.contracts.vault_address
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let vault = open_session(config, Arc::new(TracingReporter)).await?;
    let outcome = vault.submit(intent).await?;
    print_outcome(&outcome);

    if outcome.refreshed {
        println!("\n{}", vault.balances().await);
    } else {
        warn!("Balances could not be refreshed; run `safevault status`");
    }

    Ok(())
}

fn preposition(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Deposit => "into",
        IntentKind::Withdraw => "from",
    }
}

fn print_outcome(outcome: &SubmissionOutcome) {
    println!("\n=== {} SETTLED ===\n", outcome.kind.to_string().to_uppercase());
    println!("Id:          {}", outcome.id);
    println!("Transaction: {}", outcome.tx_hash);
    println!("Block:       {}", outcome.block_number);
    println!("Amount:      {} (smallest units)", outcome.amount);
    println!(
        "Settled in:  {}ms",
        (outcome.settled_at - outcome.submitted_at).num_milliseconds()
    );
}

/// A line typed in the interactive session
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Balances,
    Refresh,
    Submit(TransactionIntent),
    Help,
    Quit,
}

fn parse_session_command(line: &str) -> Option<SessionCommand> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?;
    let argument = parts.next();

    if parts.next().is_some() {
        return None;
    }

    match (command.to_lowercase().as_str(), argument) {
        ("balances" | "b", None) => Some(SessionCommand::Balances),
        ("refresh" | "r", None) => Some(SessionCommand::Refresh),
        ("deposit" | "d", Some(amount)) => Some(SessionCommand::Submit(TransactionIntent::deposit(amount))),
        ("withdraw" | "w", Some(amount)) => {
            Some(SessionCommand::Submit(TransactionIntent::withdraw(amount)))
        }
        ("help" | "h" | "?", None) => Some(SessionCommand::Help),
        ("quit" | "q" | "exit", None) => Some(SessionCommand::Quit),
        _ => None,
    }
}

const SESSION_HELP: &str = "Commands: balances | refresh | deposit <amount> | withdraw <amount> | quit";

/// Interactive session
///
/// Submissions run in the background so a second request while one is in
/// flight reaches the busy guard and is rejected. Leaving the session waits
/// for them to settle.
pub async fn session(config: &Config) -> Result<()> {
    let (reporter, mut reports) = ChannelReporter::new();
    let vault = Arc::new(open_session(config, Arc::new(reporter)).await?);

    // Phase watcher
    let mut phases = vault.phase_updates();
    tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = *phases.borrow_and_update();
            if phase != TransactionPhase::Idle {
                println!("[{}]", phase);
            }
        }
    });

    // Failure reports
    tokio::spawn(async move {
        while let Some(report) = reports.recv().await {
            println!("! {} failed: {}", report.operation, report.message);
        }
    });

    println!("\n{}", vault.balances().await);
    println!("{}", SESSION_HELP);

    let mut inflight = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_session_command(line) {
            Some(SessionCommand::Balances) => println!("{}", vault.balances().await),
            Some(SessionCommand::Refresh) => {
                if let Ok(balances) = vault.refresh_balances().await {
                    println!("{}", balances);
                }
            }
            Some(SessionCommand::Submit(intent)) => spawn_submission(&mut inflight, &vault, intent),
            Some(SessionCommand::Help) => println!("{}", SESSION_HELP),
            Some(SessionCommand::Quit) => break,
            None => println!("Unrecognized input. {}", SESSION_HELP),
        }
    }

    if vault.is_submitting() {
        println!("Waiting for the transaction in flight to settle...");
    }
    settle_submissions(&mut inflight).await;

    debug!("Session closed");
    Ok(())
}

fn spawn_submission(inflight: &mut JoinSet<()>, vault: &Arc<SafeVault>, intent: TransactionIntent) {
    let vault = Arc::clone(vault);
    inflight.spawn(async move {
        if let Ok(outcome) = vault.submit(intent).await {
            print_outcome(&outcome);
            println!("\n{}", vault.balances().await);
        }
    });
}

/// Wait for every background submission to finish
async fn settle_submissions(inflight: &mut JoinSet<()>) {
    while let Some(joined) = inflight.join_next().await {
        if let Err(e) = joined {
            warn!("Submission task ended abnormally: {}", e);
        }
    }
}

/// Show current configuration (endpoint masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check the provider endpoint
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    print!("Provider endpoint... ");
    let environment = RpcEnvironment::new(config.provider.clone(), config.confirmation.clone());
    let healthy = match environment.rpc_provider() {
        Ok(provider) => {
            let start = Instant::now();
            match provider.health().await {
                Ok((chain_id, version)) => {
                    println!(
                        "OK ({}ms, chain {}, {})",
                        start.elapsed().as_millis(),
                        chain_id,
                        version
                    );
                    true
                }
                Err(e) => {
                    println!("FAILED: {}", e);
                    false
                }
            }
        }
        Err(e) => {
            println!("UNAVAILABLE: {}", e);
            false
        }
    };

    print!("Contract addresses... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => println!("FAILED: {}", e),
    }

    if !healthy {
        anyhow::bail!("Health check failed");
    }

    println!("\nAll checks passed.");
    Ok(())
}
