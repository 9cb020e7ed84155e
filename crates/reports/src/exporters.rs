//! Report exporters - CSV, JSON, Markdown
//!
//! A report exposes a title, headers, rows, and a key/value summary; the
//! exporters render that shape without knowing which report it is.

use crate::credit::CreditStats;
use crate::treasury::TreasurySummary;
use novastate_persistence::{LeaderboardRow, TreasuryFlowRow};

/// Tabular data contract every exporter consumes.
pub trait ReportData {
    fn title(&self) -> String;
    fn headers(&self) -> Vec<String>;
    fn rows(&self) -> Vec<Vec<String>>;
    fn summary(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Renders a report into a string of some format.
pub trait ReportExporter {
    fn export(&self, report: &dyn ReportData) -> String;
    fn extension(&self) -> &'static str;
}

// ============================================================================
// CSV
// ============================================================================

/// CSV exporter with quoting for embedded commas and quotes.
#[derive(Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }

    fn escape(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = String::new();
        output.push_str(
            &report
                .headers()
                .iter()
                .map(|h| Self::escape(h))
                .collect::<Vec<_>>()
                .join(","),
        );
        output.push('\n');

        for row in report.rows() {
            output.push_str(
                &row.iter()
                    .map(|f| Self::escape(f))
                    .collect::<Vec<_>>()
                    .join(","),
            );
            output.push('\n');
        }
        output
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON exporter; pretty by default.
pub struct JsonExporter {
    pretty: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let headers = report.headers();
        let json_rows: Vec<serde_json::Value> = report
            .rows()
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (i, header) in headers.iter().enumerate() {
                    let value = row.get(i).cloned().unwrap_or_default();
                    obj.insert(header.clone(), serde_json::Value::String(value));
                }
                serde_json::Value::Object(obj)
            })
            .collect();

        let summary: serde_json::Map<String, serde_json::Value> = report
            .summary()
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();

        let output = serde_json::json!({
            "title": report.title(),
            "summary": summary,
            "data": json_rows,
        });

        if self.pretty {
            serde_json::to_string_pretty(&output).unwrap_or_default()
        } else {
            serde_json::to_string(&output).unwrap_or_default()
        }
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

// ============================================================================
// Markdown
// ============================================================================

/// Markdown exporter with an optional summary section.
pub struct MarkdownExporter {
    include_summary: bool,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self {
            include_summary: true,
        }
    }
}

impl MarkdownExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }
}

impl ReportExporter for MarkdownExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = String::new();
        output.push_str(&format!("# {}\n\n", report.title()));

        let summary = report.summary();
        if self.include_summary && !summary.is_empty() {
            output.push_str("## Summary\n\n");
            for (key, value) in summary {
                output.push_str(&format!("- **{}**: {}\n", key, value));
            }
            output.push('\n');
        }

        let headers = report.headers();
        if !headers.is_empty() {
            output.push_str("| ");
            output.push_str(&headers.join(" | "));
            output.push_str(" |\n| ");
            output.push_str(&headers.iter().map(|_| "---").collect::<Vec<_>>().join(" | "));
            output.push_str(" |\n");

            for row in report.rows() {
                output.push_str("| ");
                output.push_str(&row.join(" | "));
                output.push_str(" |\n");
            }
        }
        output
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}

// ============================================================================
// ReportData implementations
// ============================================================================

/// Leaderboard as a tabular report.
pub struct LeaderboardReport {
    pub entries: Vec<LeaderboardRow>,
}

impl ReportData for LeaderboardReport {
    fn title(&self) -> String {
        "NovaCredit Leaderboard".to_string()
    }

    fn headers(&self) -> Vec<String> {
        ["rank", "username", "nova_credit", "tier", "reputation"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                vec![
                    (i + 1).to_string(),
                    e.username.clone(),
                    e.nova_credit.to_string(),
                    e.tier.clone(),
                    format!("{:.3}", e.reputation_score),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![("citizens".to_string(), self.entries.len().to_string())]
    }
}

/// Treasury flows as a tabular report.
pub struct FlowsReport {
    pub flows: Vec<TreasuryFlowRow>,
}

impl ReportData for FlowsReport {
    fn title(&self) -> String {
        "Treasury Flows".to_string()
    }

    fn headers(&self) -> Vec<String> {
        ["id", "app", "kind", "gross", "tax", "net", "burn", "created_at"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.flows
            .iter()
            .map(|f| {
                vec![
                    f.id.clone(),
                    f.app.clone(),
                    f.kind.clone(),
                    f.gross.clone(),
                    f.tax.clone(),
                    f.net_to_performer.clone(),
                    f.burn_amount.clone(),
                    f.created_at.to_rfc3339(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![("flows".to_string(), self.flows.len().to_string())]
    }
}

/// Credit stats as a key/value report.
pub struct CreditStatsReport {
    pub stats: CreditStats,
}

impl ReportData for CreditStatsReport {
    fn title(&self) -> String {
        "Citizen Credit Stats".to_string()
    }

    fn headers(&self) -> Vec<String> {
        vec!["tier".to_string(), "citizens".to_string()]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let mut rows: Vec<(String, i64)> = self
            .stats
            .tier_distribution
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        rows.sort();
        rows.into_iter()
            .map(|(tier, count)| vec![tier, count.to_string()])
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            (
                "total_citizens".to_string(),
                self.stats.total_citizens.to_string(),
            ),
            (
                "median_nova_credit".to_string(),
                format!("{:.1}", self.stats.median_nova_credit),
            ),
            (
                "at_risk_citizens".to_string(),
                self.stats.at_risk_citizens.to_string(),
            ),
        ]
    }
}

/// Treasury summary as a key/value report.
pub struct TreasurySummaryReport {
    pub summary: TreasurySummary,
}

impl ReportData for TreasurySummaryReport {
    fn title(&self) -> String {
        "Treasury Summary".to_string()
    }

    fn headers(&self) -> Vec<String> {
        vec!["pool".to_string(), "balance".to_string()]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![
            vec![
                "growth".to_string(),
                self.summary.pools_balance.pool_growth.to_string(),
            ],
            vec![
                "performer".to_string(),
                self.summary.pools_balance.pool_performer.to_string(),
            ],
            vec![
                "dev".to_string(),
                self.summary.pools_balance.pool_dev.to_string(),
            ],
        ]
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            (
                "total_treasury".to_string(),
                self.summary.total_treasury.to_string(),
            ),
            (
                "total_burned".to_string(),
                self.summary.total_burned.to_string(),
            ),
            (
                "last_24h_revenue".to_string(),
                format!("{:.2}", self.summary.last_24h_revenue),
            ),
        ]
    }
}
