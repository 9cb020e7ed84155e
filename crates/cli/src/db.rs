//! Database bootstrap, status, and user seeding

use crate::Cli;
use anyhow::{Context, Result};
use novastate_core::{RulesHandle, StateConfig};
use novastate_engine::ServiceContext;
use novastate_persistence::{
    init_database, AuditLog, CitizenScoreRepo, LedgerEntryRepo, TreasuryFlowRepo, UserRepo,
};
use std::sync::Arc;

/// Build the state config from CLI/env arguments.
pub fn state_config(cli: &Cli) -> StateConfig {
    StateConfig {
        ncr_treasury_user_id: cli.treasury_user,
        treasury_daily_limit: cli.daily_limit,
        ..StateConfig::default()
    }
}

/// Open (and migrate) the database and assemble a service context.
pub async fn open_context(cli: &Cli) -> Result<ServiceContext> {
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let url = format!("sqlite:{}?mode=rwc", cli.db.display());
    let pool = init_database(&url).await.context("Failed to open database")?;
    let audit = Arc::new(AuditLog::new(&cli.audit_dir).context("Failed to open audit log")?);

    Ok(ServiceContext::from_parts(
        pool,
        audit,
        RulesHandle::default(),
        state_config(cli),
    ))
}

/// Initialize the database and seed the treasury user.
pub async fn init(cli: &Cli, force: bool) -> Result<()> {
    if force && cli.db.exists() {
        std::fs::remove_file(&cli.db).context("Failed to remove existing database")?;
        println!("Removed existing database");
    }

    let ctx = open_context(cli).await?;

    if !UserRepo::exists(ctx.pool(), cli.treasury_user).await? {
        UserRepo::insert(ctx.pool(), cli.treasury_user, "state_treasury", "system").await?;
        println!("Seeded treasury user #{}", cli.treasury_user);
    }

    println!("Database ready at {}", cli.db.display());
    Ok(())
}

/// Show row counts for the main tables.
pub async fn status(cli: &Cli) -> Result<()> {
    if !cli.db.exists() {
        println!("Database not found at {:?}", cli.db);
        println!("Run 'novastate init' to create it");
        return Ok(());
    }

    let ctx = open_context(cli).await?;
    println!("Database: {}", cli.db.display());
    println!("  users:           {}", UserRepo::count(ctx.pool()).await?);
    println!("  citizen scores:  {}", CitizenScoreRepo::count(ctx.pool()).await?);
    println!("  ledger entries:  {}", LedgerEntryRepo::count(ctx.pool()).await?);
    println!("  treasury flows:  {}", TreasuryFlowRepo::count(ctx.pool()).await?);
    Ok(())
}

/// User subcommands.
pub async fn user(cli: &Cli, action: &crate::UserAction) -> Result<()> {
    let ctx = open_context(cli).await?;
    match action {
        crate::UserAction::Add { id, username, role } => {
            UserRepo::insert(ctx.pool(), *id, username, role).await?;
            println!("Added user #{id} ({username}, {role})");
        }
    }
    Ok(())
}
