//! Repository implementations for SQLite
//!
//! CRUD operations for all tables. Every function is generic over a
//! `SqliteExecutor`, so callers can pass either the pool or an open
//! transaction; repos never begin or commit transactions themselves.
//! Append-only tables (ledger_entries, score_changes, treasury_flows,
//! abuse_events) deliberately have no update functions.

use crate::error::{StoreError, StoreResult};
use crate::schema::*;
use chrono::{DateTime, Utc};
use novastate_core::{QuestStatus, SystemAccountKind};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{SqliteExecutor, SqlitePool};
use std::str::FromStr;

/// Embedded migrations, shared with tests and the CLI.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

// ============================================================================
// User Repository (identity collaborator)
// ============================================================================

/// Repository for the `users` table
pub struct UserRepo;

impl UserRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: i64,
        username: &str,
        role: &str,
    ) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id, username, role, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(role)
            .bind(Utc::now())
            .execute(exec)
            .await?;
        Ok(())
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(exec: E, id: i64) -> StoreResult<UserRow> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    pub async fn exists<'e, E: SqliteExecutor<'e>>(exec: E, id: i64) -> StoreResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?;
        Ok(row.is_some())
    }

    pub async fn count<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(exec)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Account Repository
// ============================================================================

/// Repository for the `accounts` table
pub struct AccountRepo;

impl AccountRepo {
    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(exec: E, id: i64) -> StoreResult<AccountRow> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("Account", id))
    }

    pub async fn get_for_owner<'e, E: SqliteExecutor<'e>>(
        exec: E,
        owner_id: i64,
        asset: &str,
    ) -> StoreResult<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE owner_id = ? AND asset = ?",
        )
        .bind(owner_id)
        .bind(asset)
        .fetch_optional(exec)
        .await?;
        Ok(row)
    }

    /// Insert a new zero-balance account and return the stored row.
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        owner_id: Option<i64>,
        asset: &str,
        kind: &str,
    ) -> StoreResult<AccountRow> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (owner_id, asset, balance, kind, created_at, updated_at)
            VALUES (?, ?, '0', ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(asset)
        .bind(kind)
        .bind(now)
        .bind(now)
        .fetch_one(exec)
        .await?;
        Ok(row)
    }

    pub async fn update_balance<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: i64,
        balance: rust_decimal::Decimal,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE accounts SET balance = ?, updated_at = ? WHERE id = ?")
            .bind(balance.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(exec)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Account", id));
        }
        Ok(())
    }
}

// ============================================================================
// System Account Repository
// ============================================================================

/// Repository for the `system_accounts` table
pub struct SystemAccountRepo;

impl SystemAccountRepo {
    pub async fn get<'e, E: SqliteExecutor<'e>>(
        exec: E,
        kind: SystemAccountKind,
    ) -> StoreResult<Option<SystemAccountRow>> {
        let row = sqlx::query_as::<_, SystemAccountRow>(
            "SELECT * FROM system_accounts WHERE account_type = ?",
        )
        .bind(kind.as_str())
        .fetch_optional(exec)
        .await?;
        Ok(row)
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        kind: SystemAccountKind,
        account_id: i64,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO system_accounts (account_type, account_id, label, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(kind.as_str())
        .bind(account_id)
        .bind(kind.label())
        .bind(Utc::now())
        .execute(exec)
        .await?;
        Ok(())
    }
}

// ============================================================================
// Ledger Entry Repository (append-only)
// ============================================================================

/// Repository for the `ledger_entries` table
pub struct LedgerEntryRepo;

impl LedgerEntryRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        entry: &NewLedgerEntry,
    ) -> StoreResult<LedgerEntryRow> {
        let row = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            INSERT INTO ledger_entries
                (tx_id, account_id, amount, kind, source_app,
                 reference_id, reference_type, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&entry.tx_id)
        .bind(entry.account_id)
        .bind(entry.amount.to_string())
        .bind(entry.kind.as_str())
        .bind(&entry.source_app)
        .bind(&entry.reference_id)
        .bind(&entry.reference_type)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .fetch_one(exec)
        .await?;
        Ok(row)
    }

    pub async fn get_by_tx<'e, E: SqliteExecutor<'e>>(
        exec: E,
        tx_id: &str,
    ) -> StoreResult<Vec<LedgerEntryRow>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            "SELECT * FROM ledger_entries WHERE tx_id = ? ORDER BY id",
        )
        .bind(tx_id)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn page_by_account<'e, E: SqliteExecutor<'e>>(
        exec: E,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<LedgerEntryRow>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            "SELECT * FROM ledger_entries WHERE account_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn count<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ledger_entries")
            .fetch_one(exec)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Treasury Flow Repository (append-only)
// ============================================================================

/// Revenue aggregate bucket, keyed by app, kind, or day.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RevenueBucketRow {
    pub bucket: String,
    pub gross_total: f64,
    pub flow_count: i64,
}

/// Repository for the `treasury_flows` table
pub struct TreasuryFlowRepo;

impl TreasuryFlowRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        flow: &NewTreasuryFlow,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO treasury_flows
                (id, app, kind, user_id, performer_id, agency_id,
                 gross, tax, net_to_performer,
                 growth_amount, performer_pool_amount, dev_amount, burn_amount,
                 reference_id, reference_type, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&flow.id)
        .bind(&flow.app)
        .bind(&flow.kind)
        .bind(flow.user_id)
        .bind(flow.performer_id)
        .bind(flow.agency_id)
        .bind(flow.gross.to_string())
        .bind(flow.tax.to_string())
        .bind(flow.net_to_performer.to_string())
        .bind(flow.growth_amount.to_string())
        .bind(flow.performer_pool_amount.to_string())
        .bind(flow.dev_amount.to_string())
        .bind(flow.burn_amount.to_string())
        .bind(&flow.reference_id)
        .bind(&flow.reference_type)
        .bind(&flow.metadata)
        .bind(flow.created_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: &str,
    ) -> StoreResult<TreasuryFlowRow> {
        sqlx::query_as::<_, TreasuryFlowRow>("SELECT * FROM treasury_flows WHERE id = ?")
            .bind(id)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("TreasuryFlow", id))
    }

    /// Find a flow by its dedupe key (app + caller reference).
    pub async fn find_by_reference<'e, E: SqliteExecutor<'e>>(
        exec: E,
        app: &str,
        reference_type: &str,
        reference_id: &str,
    ) -> StoreResult<Option<TreasuryFlowRow>> {
        let row = sqlx::query_as::<_, TreasuryFlowRow>(
            "SELECT * FROM treasury_flows WHERE app = ? AND reference_type = ? AND reference_id = ?",
        )
        .bind(app)
        .bind(reference_type)
        .bind(reference_id)
        .fetch_optional(exec)
        .await?;
        Ok(row)
    }

    pub async fn page<'e, E: SqliteExecutor<'e>>(
        exec: E,
        since: Option<DateTime<Utc>>,
        app: Option<&str>,
        kind: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<TreasuryFlowRow>> {
        let rows = sqlx::query_as::<_, TreasuryFlowRow>(
            r#"
            SELECT * FROM treasury_flows
            WHERE (? IS NULL OR created_at >= ?)
              AND (? IS NULL OR app = ?)
              AND (? IS NULL OR kind = ?)
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(since)
        .bind(since)
        .bind(app)
        .bind(app)
        .bind(kind)
        .bind(kind)
        .bind(limit)
        .bind(offset)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    /// Gross revenue routed since `since` (display aggregate, REAL cast).
    pub async fn gross_since<'e, E: SqliteExecutor<'e>>(
        exec: E,
        since: DateTime<Utc>,
    ) -> StoreResult<f64> {
        let row: (Option<f64>,) = sqlx::query_as(
            "SELECT SUM(CAST(gross AS REAL)) FROM treasury_flows WHERE created_at >= ?",
        )
        .bind(since)
        .fetch_one(exec)
        .await?;
        Ok(row.0.unwrap_or(0.0))
    }

    /// Revenue grouped by app or kind since `since`.
    pub async fn revenue_buckets<'e, E: SqliteExecutor<'e>>(
        exec: E,
        by_kind: bool,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<RevenueBucketRow>> {
        let sql = if by_kind {
            r#"
            SELECT kind AS bucket, SUM(CAST(gross AS REAL)) AS gross_total, COUNT(*) AS flow_count
            FROM treasury_flows
            WHERE (? IS NULL OR created_at >= ?)
            GROUP BY kind ORDER BY gross_total DESC
            "#
        } else {
            r#"
            SELECT app AS bucket, SUM(CAST(gross AS REAL)) AS gross_total, COUNT(*) AS flow_count
            FROM treasury_flows
            WHERE (? IS NULL OR created_at >= ?)
            GROUP BY app ORDER BY gross_total DESC
            "#
        };
        let rows = sqlx::query_as::<_, RevenueBucketRow>(sql)
            .bind(since)
            .bind(since)
            .fetch_all(exec)
            .await?;
        Ok(rows)
    }

    /// Per-day revenue series for one dimension (app or kind).
    pub async fn daily_series<'e, E: SqliteExecutor<'e>>(
        exec: E,
        by_kind: bool,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<(String, String, f64)>> {
        let sql = if by_kind {
            r#"
            SELECT strftime('%Y-%m-%d', created_at) AS day, kind AS bucket,
                   SUM(CAST(gross AS REAL)) AS gross_total
            FROM treasury_flows WHERE created_at >= ?
            GROUP BY day, kind ORDER BY day
            "#
        } else {
            r#"
            SELECT strftime('%Y-%m-%d', created_at) AS day, app AS bucket,
                   SUM(CAST(gross AS REAL)) AS gross_total
            FROM treasury_flows WHERE created_at >= ?
            GROUP BY day, app ORDER BY day
            "#
        };
        let rows: Vec<(String, String, f64)> = sqlx::query_as(sql)
            .bind(since)
            .fetch_all(exec)
            .await?;
        Ok(rows)
    }

    pub async fn count<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM treasury_flows")
            .fetch_one(exec)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Citizen Score Repository
// ============================================================================

/// One leaderboard line, joined with the identity collaborator.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub username: String,
    pub nova_credit: i64,
    pub tier: String,
    pub reputation_score: f64,
}

/// Tier distribution line.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TierCountRow {
    pub tier: String,
    pub citizens: i64,
}

/// Risk-bucket distribution by quartile thresholds on risk_score.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RiskBucketCounts {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub critical: i64,
}

/// Repository for the `citizen_scores` table
pub struct CitizenScoreRepo;

impl CitizenScoreRepo {
    pub async fn get<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
    ) -> StoreResult<Option<CitizenScoreRow>> {
        let row =
            sqlx::query_as::<_, CitizenScoreRow>("SELECT * FROM citizen_scores WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(exec)
                .await?;
        Ok(row)
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        row: &CitizenScoreRow,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO citizen_scores
                (user_id, nova_credit, tier, risk_score, reputation_score,
                 positive_streak, negative_streak,
                 total_positive_events, total_negative_events,
                 last_positive_at, last_negative_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.user_id)
        .bind(row.nova_credit)
        .bind(&row.tier)
        .bind(row.risk_score)
        .bind(row.reputation_score)
        .bind(row.positive_streak)
        .bind(row.negative_streak)
        .bind(row.total_positive_events)
        .bind(row.total_negative_events)
        .bind(row.last_positive_at)
        .bind(row.last_negative_at)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn update<'e, E: SqliteExecutor<'e>>(
        exec: E,
        row: &CitizenScoreRow,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE citizen_scores SET
                nova_credit = ?, tier = ?, risk_score = ?, reputation_score = ?,
                positive_streak = ?, negative_streak = ?,
                total_positive_events = ?, total_negative_events = ?,
                last_positive_at = ?, last_negative_at = ?, updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(row.nova_credit)
        .bind(&row.tier)
        .bind(row.risk_score)
        .bind(row.reputation_score)
        .bind(row.positive_streak)
        .bind(row.negative_streak)
        .bind(row.total_positive_events)
        .bind(row.total_negative_events)
        .bind(row.last_positive_at)
        .bind(row.last_negative_at)
        .bind(row.updated_at)
        .bind(row.user_id)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("CitizenScore", row.user_id));
        }
        Ok(())
    }

    pub async fn leaderboard<'e, E: SqliteExecutor<'e>>(
        exec: E,
        tier: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT s.user_id, u.username, s.nova_credit, s.tier, s.reputation_score
            FROM citizen_scores s JOIN users u ON u.id = s.user_id
            WHERE (? IS NULL OR s.tier = ?)
            ORDER BY s.nova_credit DESC, s.user_id ASC
            LIMIT ?
            "#,
        )
        .bind(tier)
        .bind(tier)
        .bind(limit)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn tier_counts<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<Vec<TierCountRow>> {
        let rows = sqlx::query_as::<_, TierCountRow>(
            "SELECT tier, COUNT(*) AS citizens FROM citizen_scores GROUP BY tier",
        )
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn risk_buckets<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<RiskBucketCounts> {
        let row = sqlx::query_as::<_, RiskBucketCounts>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN risk_score < 0.25 THEN 1 ELSE 0 END), 0) AS low,
                COALESCE(SUM(CASE WHEN risk_score >= 0.25 AND risk_score < 0.5 THEN 1 ELSE 0 END), 0) AS medium,
                COALESCE(SUM(CASE WHEN risk_score >= 0.5 AND risk_score < 0.75 THEN 1 ELSE 0 END), 0) AS high,
                COALESCE(SUM(CASE WHEN risk_score >= 0.75 THEN 1 ELSE 0 END), 0) AS critical
            FROM citizen_scores
            "#,
        )
        .fetch_one(exec)
        .await?;
        Ok(row)
    }

    /// All credit values, sorted ascending; used for the true median.
    pub async fn all_credits_sorted<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<Vec<i64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT nova_credit FROM citizen_scores ORDER BY nova_credit")
                .fetch_all(exec)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn count<'e, E: SqliteExecutor<'e>>(exec: E) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM citizen_scores")
            .fetch_one(exec)
            .await?;
        Ok(row.0)
    }

    pub async fn at_risk_count<'e, E: SqliteExecutor<'e>>(
        exec: E,
        threshold: f64,
    ) -> StoreResult<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM citizen_scores WHERE risk_score > ?")
                .bind(threshold)
                .fetch_one(exec)
                .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Score Change Repository (append-only)
// ============================================================================

/// Repository for the `score_changes` table
pub struct ScoreChangeRepo;

impl ScoreChangeRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        change: &NewScoreChange,
    ) -> StoreResult<ScoreChangeRow> {
        let row = sqlx::query_as::<_, ScoreChangeRow>(
            r#"
            INSERT INTO score_changes
                (user_id, event_id, event_type, category, base_delta, weight,
                 delta, old_score, new_score, reason, source_app, reference_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(change.user_id)
        .bind(&change.event_id)
        .bind(&change.event_type)
        .bind(&change.category)
        .bind(change.base_delta)
        .bind(change.weight)
        .bind(change.delta)
        .bind(change.old_score)
        .bind(change.new_score)
        .bind(&change.reason)
        .bind(&change.source_app)
        .bind(&change.reference_type)
        .bind(change.created_at)
        .fetch_one(exec)
        .await?;
        Ok(row)
    }

    /// Find an existing change by its dedupe key.
    pub async fn find_by_dedupe<'e, E: SqliteExecutor<'e>>(
        exec: E,
        source_app: &str,
        reference_type: &str,
        event_id: &str,
    ) -> StoreResult<Option<ScoreChangeRow>> {
        let row = sqlx::query_as::<_, ScoreChangeRow>(
            "SELECT * FROM score_changes WHERE source_app = ? AND reference_type = ? AND event_id = ?",
        )
        .bind(source_app)
        .bind(reference_type)
        .bind(event_id)
        .fetch_optional(exec)
        .await?;
        Ok(row)
    }

    pub async fn page_by_user<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<ScoreChangeRow>> {
        let rows = sqlx::query_as::<_, ScoreChangeRow>(
            "SELECT * FROM score_changes WHERE user_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn count_by_user<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
    ) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM score_changes WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(exec)
            .await?;
        Ok(row.0)
    }

    pub async fn count_since<'e, E: SqliteExecutor<'e>>(
        exec: E,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM score_changes WHERE created_at >= ?")
            .bind(since)
            .fetch_one(exec)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Risk Flag Repository
// ============================================================================

/// Repository for the `risk_flags` table
pub struct RiskFlagRepo;

impl RiskFlagRepo {
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
        flag_type: &str,
        severity: &str,
        description: &str,
        created_by: Option<i64>,
    ) -> StoreResult<RiskFlagRow> {
        let row = sqlx::query_as::<_, RiskFlagRow>(
            r#"
            INSERT INTO risk_flags
                (user_id, flag_type, severity, description, active, created_by, created_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(flag_type)
        .bind(severity)
        .bind(description)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(exec)
        .await?;
        Ok(row)
    }

    pub async fn resolve<'e, E: SqliteExecutor<'e>>(
        exec: E,
        id: i64,
        resolution: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE risk_flags SET active = 0, resolution = ?, resolved_at = ? WHERE id = ? AND active = 1",
        )
        .bind(resolution)
        .bind(Utc::now())
        .bind(id)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("RiskFlag", id));
        }
        Ok(())
    }

    pub async fn list_active<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
    ) -> StoreResult<Vec<RiskFlagRow>> {
        let rows = sqlx::query_as::<_, RiskFlagRow>(
            "SELECT * FROM risk_flags WHERE user_id = ? AND active = 1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Abuse Repository
// ============================================================================

/// Repository for `abuse_profiles` and the append-only `abuse_events`
pub struct AbuseRepo;

impl AbuseRepo {
    pub async fn get_profile<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
    ) -> StoreResult<Option<AbuseProfileRow>> {
        let row =
            sqlx::query_as::<_, AbuseProfileRow>("SELECT * FROM abuse_profiles WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(exec)
                .await?;
        Ok(row)
    }

    pub async fn upsert_profile<'e, E: SqliteExecutor<'e>>(
        exec: E,
        row: &AbuseProfileRow,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO abuse_profiles
                (user_id, risk_score, events_total, last_event_at, last_decayed_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                risk_score = excluded.risk_score,
                events_total = excluded.events_total,
                last_event_at = excluded.last_event_at,
                last_decayed_at = excluded.last_decayed_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(row.user_id)
        .bind(row.risk_score)
        .bind(row.events_total)
        .bind(row.last_event_at)
        .bind(row.last_decayed_at)
        .bind(row.updated_at)
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn insert_event<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
        event_type: &str,
        severity: f64,
        metadata: Option<&str>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO abuse_events (user_id, event_type, severity, metadata, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(event_type)
        .bind(severity)
        .bind(metadata)
        .bind(Utc::now())
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn count_events_since<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM abuse_events WHERE user_id = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(exec)
        .await?;
        Ok(row.0)
    }
}

// ============================================================================
// User Quest Repository
// ============================================================================

/// Repository for the `user_quests` table
pub struct UserQuestRepo;

impl UserQuestRepo {
    #[allow(clippy::too_many_arguments)]
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        exec: E,
        quest_uuid: &str,
        user_id: i64,
        quest_id: &str,
        slot: &str,
        day: &str,
        title: &str,
        description: &str,
        base_reward_ncr: rust_decimal::Decimal,
        base_reward_xp: i64,
        assigned_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<UserQuestRow> {
        let row = sqlx::query_as::<_, UserQuestRow>(
            r#"
            INSERT INTO user_quests
                (quest_uuid, user_id, quest_id, slot, day, title, description,
                 base_reward_ncr, base_reward_xp, status, assigned_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'assigned', ?, ?)
            RETURNING *
            "#,
        )
        .bind(quest_uuid)
        .bind(user_id)
        .bind(quest_id)
        .bind(slot)
        .bind(day)
        .bind(title)
        .bind(description)
        .bind(base_reward_ncr.to_string())
        .bind(base_reward_xp)
        .bind(assigned_at)
        .bind(expires_at)
        .fetch_one(exec)
        .await?;
        Ok(row)
    }

    pub async fn get_by_uuid<'e, E: SqliteExecutor<'e>>(
        exec: E,
        quest_uuid: &str,
    ) -> StoreResult<UserQuestRow> {
        sqlx::query_as::<_, UserQuestRow>("SELECT * FROM user_quests WHERE quest_uuid = ?")
            .bind(quest_uuid)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("UserQuest", quest_uuid))
    }

    pub async fn list_for_day<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
        day: &str,
    ) -> StoreResult<Vec<UserQuestRow>> {
        let rows = sqlx::query_as::<_, UserQuestRow>(
            "SELECT * FROM user_quests WHERE user_id = ? AND day = ? ORDER BY slot",
        )
        .bind(user_id)
        .bind(day)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn list_active<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
    ) -> StoreResult<Vec<UserQuestRow>> {
        let rows = sqlx::query_as::<_, UserQuestRow>(
            r#"
            SELECT * FROM user_quests
            WHERE user_id = ? AND status IN ('assigned', 'submitted', 'under_review')
            ORDER BY assigned_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_status<'e, E: SqliteExecutor<'e>>(
        exec: E,
        status: QuestStatus,
        limit: i64,
    ) -> StoreResult<Vec<UserQuestRow>> {
        let rows = sqlx::query_as::<_, UserQuestRow>(
            "SELECT * FROM user_quests WHERE status = ? ORDER BY submitted_at ASC LIMIT ?",
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(exec)
        .await?;
        Ok(rows)
    }

    /// Whether the user has ever had this definition approved; gates
    /// one_time_only definitions.
    pub async fn has_approved_definition<'e, E: SqliteExecutor<'e>>(
        exec: E,
        user_id: i64,
        quest_id: &str,
    ) -> StoreResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM user_quests WHERE user_id = ? AND quest_id = ? AND status = 'approved' LIMIT 1",
        )
        .bind(user_id)
        .bind(quest_id)
        .fetch_optional(exec)
        .await?;
        Ok(row.is_some())
    }

    /// Persist a submission outcome in one statement. Guarded on the
    /// current status so an illegal transition affects zero rows.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_submission<'e, E: SqliteExecutor<'e>>(
        exec: E,
        quest_uuid: &str,
        new_status: QuestStatus,
        proof_kind: &str,
        proof_ref: &str,
        ai_source: &str,
        final_score: f64,
        abuse_risk_snapshot: f64,
        house_edge_snapshot: f64,
        final_reward_ncr: rust_decimal::Decimal,
        final_reward_xp: i64,
        submitted_at: DateTime<Utc>,
        resolved_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_quests SET
                status = ?, proof_kind = ?, proof_ref = ?, ai_source = ?,
                final_score = ?, abuse_risk_snapshot = ?, house_edge_snapshot = ?,
                final_reward_ncr = ?, final_reward_xp = ?,
                submitted_at = ?, resolved_at = ?
            WHERE quest_uuid = ? AND status = 'assigned'
            "#,
        )
        .bind(new_status.as_str())
        .bind(proof_kind)
        .bind(proof_ref)
        .bind(ai_source)
        .bind(final_score)
        .bind(abuse_risk_snapshot)
        .bind(house_edge_snapshot)
        .bind(final_reward_ncr.to_string())
        .bind(final_reward_xp)
        .bind(submitted_at)
        .bind(resolved_at)
        .bind(quest_uuid)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("UserQuest", quest_uuid));
        }
        Ok(())
    }

    /// Persist a HITL decision; only an UNDER_REVIEW row may change.
    pub async fn record_decision<'e, E: SqliteExecutor<'e>>(
        exec: E,
        quest_uuid: &str,
        new_status: QuestStatus,
        decided_by: i64,
        decision_reason: Option<&str>,
        resolved_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_quests SET
                status = ?, decided_by = ?, decision_reason = ?, resolved_at = ?
            WHERE quest_uuid = ? AND status = 'under_review'
            "#,
        )
        .bind(new_status.as_str())
        .bind(decided_by)
        .bind(decision_reason)
        .bind(resolved_at)
        .bind(quest_uuid)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("UserQuest", quest_uuid));
        }
        Ok(())
    }

    /// Expire one overdue ASSIGNED quest; no-op when already moved on.
    pub async fn mark_expired<'e, E: SqliteExecutor<'e>>(
        exec: E,
        quest_uuid: &str,
        resolved_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE user_quests SET status = 'expired', resolved_at = ? WHERE quest_uuid = ? AND status = 'assigned'",
        )
        .bind(resolved_at)
        .bind(quest_uuid)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sweep every ASSIGNED quest past its TTL into EXPIRED.
    pub async fn expire_overdue<'e, E: SqliteExecutor<'e>>(
        exec: E,
        now: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE user_quests SET status = 'expired', resolved_at = ? WHERE status = 'assigned' AND expires_at < ?",
        )
        .bind(now)
        .bind(now)
        .execute(exec)
        .await?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// Treasury Daily Issuance Repository
// ============================================================================

/// Repository for the `treasury_daily_issuance` table
pub struct IssuanceRepo;

impl IssuanceRepo {
    /// Create the day's row if missing; safe to call repeatedly.
    pub async fn ensure<'e, E: SqliteExecutor<'e>>(exec: E, day: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO treasury_daily_issuance (day, issued, capped, updated_at) VALUES (?, '0', '0', ?)",
        )
        .bind(day)
        .bind(Utc::now())
        .execute(exec)
        .await?;
        Ok(())
    }

    pub async fn get<'e, E: SqliteExecutor<'e>>(exec: E, day: &str) -> StoreResult<IssuanceRow> {
        sqlx::query_as::<_, IssuanceRow>("SELECT * FROM treasury_daily_issuance WHERE day = ?")
            .bind(day)
            .fetch_optional(exec)
            .await?
            .ok_or_else(|| StoreError::not_found("Issuance", day))
    }

    pub async fn set<'e, E: SqliteExecutor<'e>>(
        exec: E,
        day: &str,
        issued: rust_decimal::Decimal,
        capped: rust_decimal::Decimal,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE treasury_daily_issuance SET issued = ?, capped = ?, updated_at = ? WHERE day = ?",
        )
        .bind(issued.to_string())
        .bind(capped.to_string())
        .bind(Utc::now())
        .bind(day)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Issuance", day));
        }
        Ok(())
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Open a connection pool, creating the database file if missing.
pub async fn connect_pool(database_url: &str) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(sqlx::Error::from)?
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Run embedded migrations.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create (if missing) and migrate a database.
pub async fn init_database(database_url: &str) -> StoreResult<SqlitePool> {
    let pool = connect_pool(database_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use novastate_core::score::CitizenScore;
    use rust_decimal_macros::dec;

    async fn test_pool() -> SqlitePool {
        // a single connection keeps the in-memory database shared
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_user_and_account_round_trip() {
        let pool = test_pool().await;
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();
        assert!(UserRepo::exists(&pool, 1).await.unwrap());
        assert!(!UserRepo::exists(&pool, 2).await.unwrap());

        let account = AccountRepo::insert(&pool, Some(1), "NCR", "user").await.unwrap();
        assert_eq!(account.balance_decimal().unwrap(), dec!(0));

        AccountRepo::update_balance(&pool, account.id, dec!(42.5)).await.unwrap();
        let reloaded = AccountRepo::get_by_id(&pool, account.id).await.unwrap();
        assert_eq!(reloaded.balance_decimal().unwrap(), dec!(42.5));

        // (owner, asset) is unique
        let dup = AccountRepo::insert(&pool, Some(1), "NCR", "user").await;
        assert!(matches!(dup, Err(e) if e.is_unique_violation()));
    }

    #[tokio::test]
    async fn test_system_account_singleton() {
        let pool = test_pool().await;
        let account = AccountRepo::insert(&pool, None, "NCR", "pool_burn").await.unwrap();
        SystemAccountRepo::insert(&pool, SystemAccountKind::PoolBurn, account.id)
            .await
            .unwrap();

        let found = SystemAccountRepo::get(&pool, SystemAccountKind::PoolBurn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.account_id, account.id);
        assert_eq!(found.label, "Burn Sink");

        assert!(SystemAccountRepo::get(&pool, SystemAccountKind::PoolDev)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_citizen_score_crud_and_leaderboard() {
        let pool = test_pool().await;
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();
        UserRepo::insert(&pool, 2, "grace", "citizen").await.unwrap();

        let mut a = CitizenScore::initial(1);
        a.nova_credit = 720;
        a.tier = novastate_core::CreditTier::of(720);
        let b = CitizenScore::initial(2);

        CitizenScoreRepo::insert(&pool, &(&a).into()).await.unwrap();
        CitizenScoreRepo::insert(&pool, &(&b).into()).await.unwrap();

        let board = CitizenScoreRepo::leaderboard(&pool, None, 10).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].username, "ada");
        assert_eq!(board[0].nova_credit, 720);

        let elites = CitizenScoreRepo::leaderboard(&pool, Some("elite"), 10).await.unwrap();
        assert_eq!(elites.len(), 1);

        let tiers = CitizenScoreRepo::tier_counts(&pool).await.unwrap();
        assert_eq!(tiers.len(), 2);

        let credits = CitizenScoreRepo::all_credits_sorted(&pool).await.unwrap();
        assert_eq!(credits, vec![500, 720]);
    }

    #[tokio::test]
    async fn test_score_change_dedupe_key() {
        let pool = test_pool().await;
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();

        let change = NewScoreChange {
            user_id: 1,
            event_id: Some("evt-1".to_string()),
            event_type: "tip_sent".to_string(),
            category: "economic".to_string(),
            base_delta: 2,
            weight: 1.0,
            delta: 2,
            old_score: 500,
            new_score: 502,
            reason: None,
            source_app: "flirtmarket".to_string(),
            reference_type: Some("tip".to_string()),
            created_at: Utc::now(),
        };
        let row = ScoreChangeRepo::insert(&pool, &change).await.unwrap();
        assert_eq!(row.new_score, 502);

        // same dedupe key is rejected by the unique constraint
        let err = ScoreChangeRepo::insert(&pool, &change).await.unwrap_err();
        assert!(err.is_unique_violation());

        let existing = ScoreChangeRepo::find_by_dedupe(&pool, "flirtmarket", "tip", "evt-1")
            .await
            .unwrap();
        assert!(existing.is_some());

        // NULL event ids never collide
        let mut anon = change.clone();
        anon.event_id = None;
        ScoreChangeRepo::insert(&pool, &anon).await.unwrap();
        ScoreChangeRepo::insert(&pool, &anon).await.unwrap();
        assert_eq!(ScoreChangeRepo::count_by_user(&pool, 1).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_quest_lifecycle_rows() {
        let pool = test_pool().await;
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();

        let now = Utc::now();
        let quest = UserQuestRepo::insert(
            &pool,
            "q-uuid-1",
            1,
            "money_first_sale",
            "money",
            "2026-08-05",
            "Close a marketplace sale",
            "Sell something",
            dec!(5),
            25,
            now,
            now + chrono::Duration::hours(24),
        )
        .await
        .unwrap();
        assert_eq!(quest.status, "assigned");

        // one quest per (user, slot, day)
        let dup = UserQuestRepo::insert(
            &pool,
            "q-uuid-2",
            1,
            "money_tip_performer",
            "money",
            "2026-08-05",
            "t",
            "d",
            dec!(3),
            15,
            now,
            now + chrono::Duration::hours(24),
        )
        .await;
        assert!(matches!(dup, Err(e) if e.is_unique_violation()));

        UserQuestRepo::record_submission(
            &pool,
            "q-uuid-1",
            QuestStatus::UnderReview,
            "tx_ref",
            "TX_12345678",
            "rules",
            55.0,
            0.1,
            1.0,
            dec!(5),
            25,
            now,
            None,
        )
        .await
        .unwrap();

        // a second submission hits no ASSIGNED row
        let again = UserQuestRepo::record_submission(
            &pool,
            "q-uuid-1",
            QuestStatus::UnderReview,
            "tx_ref",
            "TX_12345678",
            "rules",
            55.0,
            0.1,
            1.0,
            dec!(5),
            25,
            now,
            None,
        )
        .await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));

        let queue = UserQuestRepo::list_by_status(&pool, QuestStatus::UnderReview, 10)
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);

        UserRepo::insert(&pool, 9, "moderator", "admin").await.unwrap();
        UserQuestRepo::record_decision(&pool, "q-uuid-1", QuestStatus::Approved, 9, None, now)
            .await
            .unwrap();
        let done = UserQuestRepo::get_by_uuid(&pool, "q-uuid-1").await.unwrap();
        assert_eq!(done.status, "approved");
        assert!(UserQuestRepo::has_approved_definition(&pool, 1, "money_first_sale")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_expire_overdue_sweep() {
        let pool = test_pool().await;
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();

        let past = Utc::now() - chrono::Duration::hours(30);
        UserQuestRepo::insert(
            &pool,
            "q-old",
            1,
            "skill_finish_tutorial",
            "skill",
            "2026-08-04",
            "t",
            "d",
            dec!(4),
            30,
            past,
            past + chrono::Duration::hours(24),
        )
        .await
        .unwrap();

        let swept = UserQuestRepo::expire_overdue(&pool, Utc::now()).await.unwrap();
        assert_eq!(swept, 1);
        let row = UserQuestRepo::get_by_uuid(&pool, "q-old").await.unwrap();
        assert_eq!(row.status, "expired");

        // idempotent
        let swept = UserQuestRepo::expire_overdue(&pool, Utc::now()).await.unwrap();
        assert_eq!(swept, 0);
    }

    #[tokio::test]
    async fn test_issuance_counter() {
        let pool = test_pool().await;
        IssuanceRepo::ensure(&pool, "2026-08-05").await.unwrap();
        IssuanceRepo::ensure(&pool, "2026-08-05").await.unwrap();

        let row = IssuanceRepo::get(&pool, "2026-08-05").await.unwrap();
        assert_eq!(row.issued_decimal().unwrap(), dec!(0));

        IssuanceRepo::set(&pool, "2026-08-05", dec!(900), dec!(0)).await.unwrap();
        let row = IssuanceRepo::get(&pool, "2026-08-05").await.unwrap();
        assert_eq!(row.issued_decimal().unwrap(), dec!(900));
    }

    #[tokio::test]
    async fn test_abuse_profile_upsert() {
        let pool = test_pool().await;
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();

        assert!(AbuseRepo::get_profile(&pool, 1).await.unwrap().is_none());

        let now = Utc::now();
        let profile = AbuseProfileRow {
            user_id: 1,
            risk_score: 0.2,
            events_total: 1,
            last_event_at: Some(now),
            last_decayed_at: now,
            updated_at: now,
        };
        AbuseRepo::upsert_profile(&pool, &profile).await.unwrap();
        AbuseRepo::insert_event(&pool, 1, "manual_flag", 5.0, None).await.unwrap();

        let loaded = AbuseRepo::get_profile(&pool, 1).await.unwrap().unwrap();
        assert!((loaded.risk_score - 0.2).abs() < 1e-9);
        assert_eq!(
            AbuseRepo::count_events_since(&pool, 1, now - chrono::Duration::hours(1))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_treasury_flow_dedupe_and_page() {
        let pool = test_pool().await;
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();

        let flow = NewTreasuryFlow {
            id: "flow-1".to_string(),
            app: "FLIRTMARKET".to_string(),
            kind: "TIP".to_string(),
            user_id: 1,
            performer_id: None,
            agency_id: None,
            gross: dec!(100),
            tax: dec!(20),
            net_to_performer: dec!(80),
            growth_amount: dec!(8),
            performer_pool_amount: dec!(6),
            dev_amount: dec!(4),
            burn_amount: dec!(2),
            reference_id: Some("tip-1".to_string()),
            reference_type: Some("tip".to_string()),
            metadata: None,
            created_at: Utc::now(),
        };
        TreasuryFlowRepo::insert(&pool, &flow).await.unwrap();

        let mut dup = flow.clone();
        dup.id = "flow-2".to_string();
        let err = TreasuryFlowRepo::insert(&pool, &dup).await.unwrap_err();
        assert!(err.is_unique_violation());

        let found = TreasuryFlowRepo::find_by_reference(&pool, "FLIRTMARKET", "tip", "tip-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "flow-1");

        let page = TreasuryFlowRepo::page(&pool, None, Some("FLIRTMARKET"), None, 10, 0)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);

        let buckets = TreasuryFlowRepo::revenue_buckets(&pool, true, None).await.unwrap();
        assert_eq!(buckets[0].bucket, "TIP");
        assert!((buckets[0].gross_total - 100.0).abs() < 1e-9);
    }
}
