//! Credit views - profiles, history, leaderboard, stats

use chrono::{DateTime, Duration, Utc};
use novastate_core::rules::TierPrivileges;
use novastate_core::{CreditTier, RiskLevel, RulesSnapshot};
use novastate_persistence::{
    CitizenScoreRepo, LeaderboardRow, RiskBucketCounts, ScoreChangeRepo, ScoreChangeRow,
    StoreResult, TierCountRow,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Read-shaped credit profile for one citizen.
#[derive(Debug, Clone, Serialize)]
pub struct CreditProfile {
    pub user_id: i64,
    pub nova_credit: i64,
    pub tier: CreditTier,
    pub risk_score: f64,
    pub reputation_score: f64,
    pub risk_level: RiskLevel,
    pub positive_streak: i64,
    pub negative_streak: i64,
    pub total_positive_events: i64,
    pub total_negative_events: i64,
    pub privileges: TierPrivileges,
    /// Progress through the current tier, in [0, 1]
    pub progress_to_next_tier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<CreditTier>,
    pub credit_to_next_tier: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_positive_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_negative_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of rows plus the total count.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Aggregate stats over the whole citizen population.
#[derive(Debug, Clone, Serialize)]
pub struct CreditStats {
    pub total_citizens: i64,
    pub tier_distribution: HashMap<String, i64>,
    pub risk_buckets: RiskBucketCounts,
    pub events_last_24h: i64,
    pub events_last_7d: i64,
    /// Citizens with risk_score above 0.6
    pub at_risk_citizens: i64,
    pub ghost_tier_citizens: i64,
    pub average_nova_credit: f64,
    /// True median over the current score set
    pub median_nova_credit: f64,
}

/// Credit reporting queries
pub struct CreditReport;

impl CreditReport {
    /// Profile view for one citizen; `None` until their first event.
    pub async fn profile(
        pool: &SqlitePool,
        rules: &RulesSnapshot,
        user_id: i64,
    ) -> StoreResult<Option<CreditProfile>> {
        let Some(row) = CitizenScoreRepo::get(pool, user_id).await? else {
            return Ok(None);
        };
        let score = row.into_domain()?;

        Ok(Some(CreditProfile {
            user_id: score.user_id,
            nova_credit: score.nova_credit,
            tier: score.tier,
            risk_score: score.risk_score,
            reputation_score: score.reputation_score,
            risk_level: RiskLevel::of(score.risk_score),
            positive_streak: score.positive_streak,
            negative_streak: score.negative_streak,
            total_positive_events: score.total_positive_events,
            total_negative_events: score.total_negative_events,
            privileges: rules.privileges(score.tier),
            progress_to_next_tier: score.progress_to_next_tier(),
            next_tier: score.tier.next(),
            credit_to_next_tier: score.credit_to_next_tier(),
            last_positive_at: score.last_positive_at,
            last_negative_at: score.last_negative_at,
            created_at: score.created_at,
            updated_at: score.updated_at,
        }))
    }

    /// Paged score-change history, newest first. Pages are 1-based.
    pub async fn history(
        pool: &SqlitePool,
        user_id: i64,
        page: i64,
        per_page: i64,
    ) -> StoreResult<Paged<ScoreChangeRow>> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;

        let items = ScoreChangeRepo::page_by_user(pool, user_id, per_page, offset).await?;
        let total = ScoreChangeRepo::count_by_user(pool, user_id).await?;

        Ok(Paged {
            items,
            page,
            per_page,
            total,
        })
    }

    /// Top citizens by score, optionally within one tier.
    pub async fn leaderboard(
        pool: &SqlitePool,
        tier: Option<CreditTier>,
        limit: i64,
    ) -> StoreResult<Vec<LeaderboardRow>> {
        CitizenScoreRepo::leaderboard(pool, tier.map(|t| t.as_str()), limit.clamp(1, 500)).await
    }

    /// Population-wide aggregates for the admin surface.
    pub async fn stats(pool: &SqlitePool) -> StoreResult<CreditStats> {
        let now = Utc::now();

        let total_citizens = CitizenScoreRepo::count(pool).await?;
        let tier_rows: Vec<TierCountRow> = CitizenScoreRepo::tier_counts(pool).await?;
        let mut tier_distribution: HashMap<String, i64> = CreditTier::all()
            .iter()
            .map(|t| (t.as_str().to_string(), 0))
            .collect();
        for row in tier_rows {
            tier_distribution.insert(row.tier, row.citizens);
        }

        let risk_buckets = CitizenScoreRepo::risk_buckets(pool).await?;
        let at_risk_citizens = CitizenScoreRepo::at_risk_count(pool, 0.6).await?;
        let ghost_tier_citizens = tier_distribution
            .get(CreditTier::Ghost.as_str())
            .copied()
            .unwrap_or(0);

        let credits = CitizenScoreRepo::all_credits_sorted(pool).await?;
        let average = if credits.is_empty() {
            0.0
        } else {
            credits.iter().sum::<i64>() as f64 / credits.len() as f64
        };
        let median = median_of_sorted(&credits);

        Ok(CreditStats {
            total_citizens,
            tier_distribution,
            risk_buckets,
            events_last_24h: ScoreChangeRepo::count_since(pool, now - Duration::hours(24)).await?,
            events_last_7d: ScoreChangeRepo::count_since(pool, now - Duration::days(7)).await?,
            at_risk_citizens,
            ghost_tier_citizens,
            average_nova_credit: average,
            median_nova_credit: median,
        })
    }
}

/// True median; an even count averages the middle pair.
fn median_of_sorted(sorted: &[i64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    }
}
