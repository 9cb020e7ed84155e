//! Credit commands - events, funding, profiles, flags

use crate::db::open_context;
use crate::{Cli, CreditAction, FlagAction};
use anyhow::{bail, Result};
use novastate_core::{CreditTier, LedgerEntryKind, RiskSeverity, NCR};
use novastate_engine::{CreditEngine, LedgerService};
use novastate_persistence::RiskFlagRepo;
use novastate_reports::CreditReport;
use rust_decimal::Decimal;

/// Feed a behavior event through the credit engine.
pub async fn event(
    cli: &Cli,
    user: i64,
    event_type: &str,
    source: &str,
    event_id: Option<&str>,
) -> Result<()> {
    let ctx = open_context(cli).await?;
    let engine = CreditEngine::new(&ctx);

    let outcome = engine
        .normalize_and_process(user, event_type, source, event_id, None)
        .await?;

    println!(
        "{} -> delta {:+} ({} -> {})",
        event_type, outcome.delta, outcome.old_score, outcome.new_score
    );
    if let Some(message) = &outcome.message {
        println!("  {}", message);
    }
    if outcome.deduped {
        println!("  (replay; stored change returned)");
    }
    Ok(())
}

/// Credit a citizen's account from the external on-ramp.
pub async fn fund(cli: &Cli, user: i64, amount: Decimal) -> Result<()> {
    let ctx = open_context(cli).await?;
    let ledger = LedgerService::new(&ctx);

    ledger
        .credit(user, NCR, amount, LedgerEntryKind::Earn, "onramp", None, None)
        .await?;
    let balance = ledger.balance(user, NCR).await?;
    println!("Funded user #{user} with {amount} NCR (balance {balance})");
    Ok(())
}

/// Credit read subcommands.
pub async fn run(cli: &Cli, action: &CreditAction) -> Result<()> {
    let ctx = open_context(cli).await?;
    match action {
        CreditAction::Profile { user } => {
            let rules = ctx.rules().load();
            match CreditReport::profile(ctx.pool(), &rules, *user).await? {
                Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                None => println!("No credit profile yet for user #{user}"),
            }
        }
        CreditAction::History { user, page, per_page } => {
            let history = CreditReport::history(ctx.pool(), *user, *page, *per_page).await?;
            println!(
                "{} changes (page {} of {} total)",
                history.items.len(),
                history.page,
                history.total
            );
            for change in &history.items {
                println!(
                    "  {}  {:+}  {} ({} -> {})",
                    change.created_at.format("%Y-%m-%d %H:%M"),
                    change.delta,
                    change.event_type,
                    change.old_score,
                    change.new_score
                );
            }
        }
        CreditAction::Leaderboard { tier, limit } => {
            let tier = match tier.as_deref() {
                Some(raw) => match CreditTier::parse(raw) {
                    Some(tier) => Some(tier),
                    None => bail!("unknown tier: {raw}"),
                },
                None => None,
            };
            let board = CreditReport::leaderboard(ctx.pool(), tier, *limit).await?;
            for (rank, entry) in board.iter().enumerate() {
                println!(
                    "  #{:<3} {:<20} {:>4} ({})",
                    rank + 1,
                    entry.username,
                    entry.nova_credit,
                    entry.tier
                );
            }
        }
        CreditAction::Stats => {
            let stats = CreditReport::stats(ctx.pool()).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

/// Risk flag subcommands.
pub async fn flag(cli: &Cli, action: &FlagAction) -> Result<()> {
    let ctx = open_context(cli).await?;
    match action {
        FlagAction::Add {
            user,
            flag_type,
            severity,
            description,
            by,
        } => {
            let Some(severity) = RiskSeverity::parse(severity) else {
                bail!("severity must be one of low, medium, high, critical");
            };
            let row = RiskFlagRepo::insert(
                ctx.pool(),
                *user,
                flag_type,
                severity.as_str(),
                description,
                *by,
            )
            .await?;
            println!("Flag #{} raised on user #{} ({})", row.id, user, severity);
        }
        FlagAction::Resolve { id, resolution } => {
            RiskFlagRepo::resolve(ctx.pool(), *id, resolution).await?;
            println!("Flag #{id} resolved");
        }
    }
    Ok(())
}
