//! Treasury commands - route revenue, summaries, flows

use crate::db::open_context;
use crate::{Cli, TreasuryAction};
use anyhow::{bail, Result};
use novastate_core::Reference;
use novastate_engine::{RevenueRequest, TreasuryRouter};
use novastate_reports::{Range, TreasuryReport};
use rust_decimal::Decimal;

/// Route one revenue event.
#[allow(clippy::too_many_arguments)]
pub async fn route(
    cli: &Cli,
    app: &str,
    kind: &str,
    user: i64,
    performer: Option<i64>,
    gross: Decimal,
    reference: Option<&str>,
    reference_type: &str,
) -> Result<()> {
    let ctx = open_context(cli).await?;
    let router = TreasuryRouter::new(&ctx);

    let flow = router
        .route_revenue(RevenueRequest {
            app: app.to_string(),
            kind: kind.to_string(),
            user_id: user,
            performer_id: performer,
            agency_id: None,
            gross,
            reference: reference.map(|id| Reference::new(id, reference_type)),
            metadata: None,
        })
        .await?;

    println!("Flow {}", flow.id);
    println!("  gross: {} NCR", flow.gross);
    println!("  tax:   {} NCR", flow.tax);
    println!("  net:   {} NCR", flow.net_to_performer);
    println!(
        "  pools: growth {} / performer {} / dev {}",
        flow.growth_amount, flow.performer_pool_amount, flow.dev_amount
    );
    println!("  burn:  {} NCR", flow.burn_amount);
    Ok(())
}

/// Treasury read subcommands.
pub async fn run(cli: &Cli, action: &TreasuryAction) -> Result<()> {
    let ctx = open_context(cli).await?;
    match action {
        TreasuryAction::Summary => {
            let summary = TreasuryReport::summary(ctx.pool()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        TreasuryAction::Pools => {
            let pools = TreasuryReport::pools(ctx.pool()).await?;
            println!("{}", serde_json::to_string_pretty(&pools)?);
        }
        TreasuryAction::Flows {
            range,
            app,
            kind,
            page,
            per_page,
        } => {
            let Some(range) = Range::parse(range) else {
                bail!("range must be one of 24h, 7d, 30d, all");
            };
            let flows = TreasuryReport::flows(
                ctx.pool(),
                range,
                app.as_deref(),
                kind.as_deref(),
                *page,
                *per_page,
            )
            .await?;
            println!(
                "{} flows (page {} of {} total)",
                flows.items.len(),
                flows.page,
                flows.total
            );
            for flow in &flows.items {
                println!(
                    "  {}  {}:{}  gross {} burn {}  [{}]",
                    flow.created_at.format("%Y-%m-%d %H:%M"),
                    flow.app,
                    flow.kind,
                    flow.gross,
                    flow.burn_amount,
                    flow.id
                );
            }
        }
    }
    Ok(())
}
