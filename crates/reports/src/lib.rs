//! # NovaState Reports
//!
//! Read-only aggregations over the store: credit profiles, paged score
//! history, leaderboards, aggregate stats, and treasury summaries. Plus
//! exporters rendering tabular reports as CSV, JSON, or Markdown.
//!
//! Nothing in this crate mutates state; every function reads through the
//! repositories with plain pool access.

pub mod credit;
pub mod exporters;
pub mod treasury;

pub use credit::{CreditProfile, CreditReport, CreditStats, Paged};
pub use exporters::{
    CreditStatsReport, CsvExporter, FlowsReport, JsonExporter, LeaderboardReport,
    MarkdownExporter, ReportData, ReportExporter, TreasurySummaryReport,
};
pub use treasury::{PoolBalances, Range, RevenuePoint, TreasuryReport, TreasurySummary};
