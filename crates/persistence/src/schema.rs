//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables. The schema itself lives
//! in migrations/0001_init.sql. Decimal columns are stored as TEXT; the
//! `*_decimal` accessors parse them back out.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use novastate_core::score::CitizenScore;
use novastate_core::{CreditTier, LedgerEntryKind, QuestSlot, QuestStatus, SystemAccountKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parse a TEXT decimal column.
pub fn parse_decimal(raw: &str) -> StoreResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| StoreError::InvalidDecimal(format!("{raw}: {e}")))
}

/// Row type for the `users` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `accounts` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub asset: String,
    pub balance: String, // Decimal stored as TEXT
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRow {
    pub fn balance_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.balance)
    }

    pub fn system_kind(&self) -> StoreResult<SystemAccountKind> {
        SystemAccountKind::parse(&self.kind)
            .ok_or_else(|| StoreError::invalid_enum("accounts.kind", &self.kind))
    }
}

/// Row type for the `system_accounts` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SystemAccountRow {
    pub account_type: String,
    pub account_id: i64,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `ledger_entries` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LedgerEntryRow {
    pub id: i64,
    pub tx_id: String,
    pub account_id: i64,
    pub amount: String, // signed Decimal stored as TEXT
    pub kind: String,
    pub source_app: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntryRow {
    pub fn amount_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.amount)
    }

    pub fn entry_kind(&self) -> StoreResult<LedgerEntryKind> {
        LedgerEntryKind::parse(&self.kind)
            .ok_or_else(|| StoreError::invalid_enum("ledger_entries.kind", &self.kind))
    }
}

/// Insert payload for one ledger entry.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub tx_id: String,
    pub account_id: i64,
    pub amount: Decimal,
    pub kind: LedgerEntryKind,
    pub source_app: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `treasury_flows` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TreasuryFlowRow {
    pub id: String,
    pub app: String,
    pub kind: String,
    pub user_id: i64,
    pub performer_id: Option<i64>,
    pub agency_id: Option<i64>,
    pub gross: String,
    pub tax: String,
    pub net_to_performer: String,
    pub growth_amount: String,
    pub performer_pool_amount: String,
    pub dev_amount: String,
    pub burn_amount: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TreasuryFlowRow {
    pub fn gross_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.gross)
    }

    pub fn tax_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.tax)
    }

    pub fn burn_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.burn_amount)
    }
}

/// Insert payload for one treasury flow audit row.
#[derive(Debug, Clone)]
pub struct NewTreasuryFlow {
    pub id: String,
    pub app: String,
    pub kind: String,
    pub user_id: i64,
    pub performer_id: Option<i64>,
    pub agency_id: Option<i64>,
    pub gross: Decimal,
    pub tax: Decimal,
    pub net_to_performer: Decimal,
    pub growth_amount: Decimal,
    pub performer_pool_amount: Decimal,
    pub dev_amount: Decimal,
    pub burn_amount: Decimal,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `citizen_scores` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CitizenScoreRow {
    pub user_id: i64,
    pub nova_credit: i64,
    pub tier: String,
    pub risk_score: f64,
    pub reputation_score: f64,
    pub positive_streak: i64,
    pub negative_streak: i64,
    pub total_positive_events: i64,
    pub total_negative_events: i64,
    pub last_positive_at: Option<DateTime<Utc>>,
    pub last_negative_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CitizenScoreRow {
    pub fn into_domain(self) -> StoreResult<CitizenScore> {
        let tier = CreditTier::parse(&self.tier)
            .ok_or_else(|| StoreError::invalid_enum("citizen_scores.tier", &self.tier))?;
        Ok(CitizenScore {
            user_id: self.user_id,
            nova_credit: self.nova_credit,
            tier,
            risk_score: self.risk_score,
            reputation_score: self.reputation_score,
            positive_streak: self.positive_streak,
            negative_streak: self.negative_streak,
            total_positive_events: self.total_positive_events,
            total_negative_events: self.total_negative_events,
            last_positive_at: self.last_positive_at,
            last_negative_at: self.last_negative_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<&CitizenScore> for CitizenScoreRow {
    fn from(score: &CitizenScore) -> Self {
        Self {
            user_id: score.user_id,
            nova_credit: score.nova_credit,
            tier: score.tier.as_str().to_string(),
            risk_score: score.risk_score,
            reputation_score: score.reputation_score,
            positive_streak: score.positive_streak,
            negative_streak: score.negative_streak,
            total_positive_events: score.total_positive_events,
            total_negative_events: score.total_negative_events,
            last_positive_at: score.last_positive_at,
            last_negative_at: score.last_negative_at,
            created_at: score.created_at,
            updated_at: score.updated_at,
        }
    }
}

/// Row type for the `score_changes` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ScoreChangeRow {
    pub id: i64,
    pub user_id: i64,
    pub event_id: Option<String>,
    pub event_type: String,
    pub category: String,
    pub base_delta: i64,
    pub weight: f64,
    pub delta: i64,
    pub old_score: i64,
    pub new_score: i64,
    pub reason: Option<String>,
    pub source_app: String,
    pub reference_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one score change.
#[derive(Debug, Clone)]
pub struct NewScoreChange {
    pub user_id: i64,
    pub event_id: Option<String>,
    pub event_type: String,
    pub category: String,
    pub base_delta: i64,
    pub weight: f64,
    pub delta: i64,
    pub old_score: i64,
    pub new_score: i64,
    pub reason: Option<String>,
    pub source_app: String,
    pub reference_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `risk_flags` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RiskFlagRow {
    pub id: i64,
    pub user_id: i64,
    pub flag_type: String,
    pub severity: String,
    pub description: String,
    pub active: i64,
    pub resolution: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Row type for the `abuse_profiles` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AbuseProfileRow {
    pub user_id: i64,
    pub risk_score: f64,
    pub events_total: i64,
    pub last_event_at: Option<DateTime<Utc>>,
    pub last_decayed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row type for the `abuse_events` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AbuseEventRow {
    pub id: i64,
    pub user_id: i64,
    pub event_type: String,
    pub severity: f64,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `user_quests` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserQuestRow {
    pub id: i64,
    pub quest_uuid: String,
    pub user_id: i64,
    pub quest_id: String,
    pub slot: String,
    pub day: String,
    pub title: String,
    pub description: String,
    pub base_reward_ncr: String,
    pub base_reward_xp: i64,
    pub final_reward_ncr: Option<String>,
    pub final_reward_xp: Option<i64>,
    pub final_score: Option<f64>,
    pub status: String,
    pub proof_kind: Option<String>,
    pub proof_ref: Option<String>,
    pub ai_source: Option<String>,
    pub abuse_risk_snapshot: Option<f64>,
    pub house_edge_snapshot: Option<f64>,
    pub decided_by: Option<i64>,
    pub decision_reason: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl UserQuestRow {
    pub fn quest_status(&self) -> StoreResult<QuestStatus> {
        QuestStatus::parse(&self.status)
            .ok_or_else(|| StoreError::invalid_enum("user_quests.status", &self.status))
    }

    pub fn quest_slot(&self) -> StoreResult<QuestSlot> {
        QuestSlot::parse(&self.slot)
            .ok_or_else(|| StoreError::invalid_enum("user_quests.slot", &self.slot))
    }

    pub fn base_reward_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.base_reward_ncr)
    }

    pub fn final_reward_decimal(&self) -> StoreResult<Option<Decimal>> {
        self.final_reward_ncr
            .as_deref()
            .map(parse_decimal)
            .transpose()
    }
}

/// Row type for the `treasury_daily_issuance` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct IssuanceRow {
    pub day: String,
    pub issued: String,
    pub capped: String,
    pub updated_at: DateTime<Utc>,
}

impl IssuanceRow {
    pub fn issued_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.issued)
    }

    pub fn capped_decimal(&self) -> StoreResult<Decimal> {
        parse_decimal(&self.capped)
    }
}
