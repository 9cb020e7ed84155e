//! Audit trail inspection and report export

use crate::db::open_context;
use crate::{Cli, ReportFormat, ReportKind};
use anyhow::Result;
use novastate_persistence::AuditReader;
use novastate_reports::{
    CreditReport, CreditStatsReport, CsvExporter, FlowsReport, JsonExporter, LeaderboardReport,
    MarkdownExporter, Range, ReportExporter, TreasuryReport, TreasurySummaryReport,
};
use std::path::Path;

/// Print audit records, optionally filtered.
pub async fn run(
    cli: &Cli,
    from: Option<&str>,
    to: Option<&str>,
    action: Option<&str>,
) -> Result<()> {
    let reader = AuditReader::new(&cli.audit_dir);
    let records = match (from, to) {
        (Some(from), Some(to)) => reader.read_range(from, to)?,
        _ => reader.read_all()?,
    };

    let records: Vec<_> = match action {
        Some(action) => records.into_iter().filter(|r| r.action == action).collect(),
        None => records,
    };

    println!("{} audit records", records.len());
    for record in &records {
        println!(
            "  {}  {:<20} {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.action,
            record.subject.as_deref().unwrap_or("-"),
            record.detail
        );
    }
    Ok(())
}

/// Export one of the built-in reports.
pub async fn report(
    cli: &Cli,
    kind: ReportKind,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let ctx = open_context(cli).await?;

    let exporter: Box<dyn ReportExporter> = match format {
        ReportFormat::Csv => Box::new(CsvExporter::new()),
        ReportFormat::Json => Box::new(JsonExporter::new()),
        ReportFormat::Markdown => Box::new(MarkdownExporter::new()),
    };

    let rendered = match kind {
        ReportKind::Leaderboard => {
            let entries = CreditReport::leaderboard(ctx.pool(), None, 100).await?;
            exporter.export(&LeaderboardReport { entries })
        }
        ReportKind::Flows => {
            let flows = TreasuryReport::flows(ctx.pool(), Range::Last30d, None, None, 1, 100)
                .await?
                .items;
            exporter.export(&FlowsReport { flows })
        }
        ReportKind::Stats => {
            let stats = CreditReport::stats(ctx.pool()).await?;
            exporter.export(&CreditStatsReport { stats })
        }
        ReportKind::Treasury => {
            let summary = TreasuryReport::summary(ctx.pool()).await?;
            exporter.export(&TreasurySummaryReport { summary })
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
