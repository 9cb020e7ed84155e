//! Treasury views - summary, flow pages, revenue charts

use crate::credit::Paged;
use chrono::{DateTime, Duration, Utc};
use novastate_core::SystemAccountKind;
use novastate_persistence::{
    AccountRepo, RevenueBucketRow, StoreResult, SystemAccountRepo, TreasuryFlowRepo,
    TreasuryFlowRow,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Time window for flow queries and charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Last24h,
    Last7d,
    Last30d,
    All,
}

impl Range {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "24h" => Some(Range::Last24h),
            "7d" => Some(Range::Last7d),
            "30d" => Some(Range::Last30d),
            "all" => Some(Range::All),
            _ => None,
        }
    }

    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Range::Last24h => Some(now - Duration::hours(24)),
            Range::Last7d => Some(now - Duration::days(7)),
            Range::Last30d => Some(now - Duration::days(30)),
            Range::All => None,
        }
    }
}

/// Balances of the three accumulating pools.
#[derive(Debug, Clone, Serialize)]
pub struct PoolBalances {
    pub pool_growth: Decimal,
    pub pool_performer: Decimal,
    pub pool_dev: Decimal,
}

impl PoolBalances {
    pub fn total(&self) -> Decimal {
        self.pool_growth + self.pool_performer + self.pool_dev
    }
}

/// Headline treasury summary.
#[derive(Debug, Clone, Serialize)]
pub struct TreasurySummary {
    /// Sum of the three pool balances
    pub total_treasury: Decimal,
    pub pools_balance: PoolBalances,
    pub last_24h_revenue: f64,
    pub last_7d_revenue: f64,
    pub total_burned: Decimal,
    pub revenue_by_app: HashMap<String, f64>,
    pub revenue_by_kind: HashMap<String, f64>,
}

/// One day of a revenue chart series.
#[derive(Debug, Clone, Serialize)]
pub struct RevenuePoint {
    pub day: String,
    pub bucket: String,
    pub gross: f64,
}

/// Treasury reporting queries
pub struct TreasuryReport;

impl TreasuryReport {
    async fn pool_balance(pool: &SqlitePool, kind: SystemAccountKind) -> StoreResult<Decimal> {
        match SystemAccountRepo::get(pool, kind).await? {
            Some(system) => AccountRepo::get_by_id(pool, system.account_id)
                .await?
                .balance_decimal(),
            None => Ok(Decimal::ZERO),
        }
    }

    pub async fn pools(pool: &SqlitePool) -> StoreResult<PoolBalances> {
        Ok(PoolBalances {
            pool_growth: Self::pool_balance(pool, SystemAccountKind::PoolGrowth).await?,
            pool_performer: Self::pool_balance(pool, SystemAccountKind::PoolPerformer).await?,
            pool_dev: Self::pool_balance(pool, SystemAccountKind::PoolDev).await?,
        })
    }

    pub async fn summary(pool: &SqlitePool) -> StoreResult<TreasurySummary> {
        let now = Utc::now();
        let pools = Self::pools(pool).await?;
        let total_burned = Self::pool_balance(pool, SystemAccountKind::PoolBurn).await?;

        let by_app = TreasuryFlowRepo::revenue_buckets(pool, false, None).await?;
        let by_kind = TreasuryFlowRepo::revenue_buckets(pool, true, None).await?;

        Ok(TreasurySummary {
            total_treasury: pools.total(),
            pools_balance: pools,
            last_24h_revenue: TreasuryFlowRepo::gross_since(pool, now - Duration::hours(24))
                .await?,
            last_7d_revenue: TreasuryFlowRepo::gross_since(pool, now - Duration::days(7)).await?,
            total_burned,
            revenue_by_app: bucket_map(by_app),
            revenue_by_kind: bucket_map(by_kind),
        })
    }

    /// Paged flows within a range, optionally filtered by app and kind.
    pub async fn flows(
        pool: &SqlitePool,
        range: Range,
        app: Option<&str>,
        kind: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> StoreResult<Paged<TreasuryFlowRow>> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;
        let since = range.since(Utc::now());

        let items = TreasuryFlowRepo::page(pool, since, app, kind, per_page, offset).await?;
        let total = TreasuryFlowRepo::count(pool).await?;

        Ok(Paged {
            items,
            page,
            per_page,
            total,
        })
    }

    /// Per-day revenue series grouped by app or by kind.
    pub async fn revenue_chart(
        pool: &SqlitePool,
        by_kind: bool,
        range: Range,
    ) -> StoreResult<Vec<RevenuePoint>> {
        let since = range
            .since(Utc::now())
            .unwrap_or_else(|| Utc::now() - Duration::days(30));
        let rows = TreasuryFlowRepo::daily_series(pool, by_kind, since).await?;
        Ok(rows
            .into_iter()
            .map(|(day, bucket, gross)| RevenuePoint { day, bucket, gross })
            .collect())
    }
}

fn bucket_map(rows: Vec<RevenueBucketRow>) -> HashMap<String, f64> {
    rows.into_iter().map(|r| (r.bucket, r.gross_total)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use novastate_persistence::{NewTreasuryFlow, UserRepo, MIGRATOR};
    use rust_decimal_macros::dec;

    async fn test_pool() -> SqlitePool {
        // a single connection keeps the in-memory database shared
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        UserRepo::insert(&pool, 1, "ada", "citizen").await.unwrap();
        pool
    }

    async fn seed_flow(pool: &SqlitePool, id: &str, app: &str, kind: &str, gross: Decimal) {
        let flow = NewTreasuryFlow {
            id: id.to_string(),
            app: app.to_string(),
            kind: kind.to_string(),
            user_id: 1,
            performer_id: None,
            agency_id: None,
            gross,
            tax: gross,
            net_to_performer: dec!(0),
            growth_amount: dec!(0),
            performer_pool_amount: dec!(0),
            dev_amount: dec!(0),
            burn_amount: dec!(0),
            reference_id: None,
            reference_type: None,
            metadata: None,
            created_at: Utc::now(),
        };
        TreasuryFlowRepo::insert(pool, &flow).await.unwrap();
    }

    #[test]
    fn test_range_parse() {
        assert_eq!(Range::parse("24h"), Some(Range::Last24h));
        assert_eq!(Range::parse("7D"), Some(Range::Last7d));
        assert_eq!(Range::parse("30d"), Some(Range::Last30d));
        assert_eq!(Range::parse("all"), Some(Range::All));
        assert_eq!(Range::parse("1y"), None);
        assert!(Range::All.since(Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_summary_over_seeded_flows() {
        let pool = test_pool().await;
        seed_flow(&pool, "f1", "FLIRTMARKET", "TIP", dec!(100)).await;
        seed_flow(&pool, "f2", "FLIRTMARKET", "ROOM_ENTRY", dec!(50)).await;
        seed_flow(&pool, "f3", "ACADEMY", "COURSE", dec!(30)).await;

        let summary = TreasuryReport::summary(&pool).await.unwrap();
        assert!((summary.last_24h_revenue - 180.0).abs() < 1e-9);
        assert!((summary.revenue_by_app["FLIRTMARKET"] - 150.0).abs() < 1e-9);
        assert!((summary.revenue_by_kind["TIP"] - 100.0).abs() < 1e-9);
        // pools untouched in this fixture
        assert_eq!(summary.total_treasury, dec!(0));
        assert_eq!(summary.total_burned, dec!(0));
    }

    #[tokio::test]
    async fn test_flow_paging_and_filters() {
        let pool = test_pool().await;
        for i in 0..5 {
            seed_flow(&pool, &format!("f{i}"), "FLIRTMARKET", "TIP", dec!(10)).await;
        }
        seed_flow(&pool, "other", "ACADEMY", "COURSE", dec!(10)).await;

        let page = TreasuryReport::flows(&pool, Range::All, Some("FLIRTMARKET"), None, 1, 3)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 3);

        let filtered = TreasuryReport::flows(&pool, Range::All, None, Some("COURSE"), 1, 10)
            .await
            .unwrap();
        assert_eq!(filtered.items.len(), 1);
    }

    #[tokio::test]
    async fn test_revenue_chart_buckets_by_day() {
        let pool = test_pool().await;
        seed_flow(&pool, "f1", "FLIRTMARKET", "TIP", dec!(100)).await;
        seed_flow(&pool, "f2", "ACADEMY", "COURSE", dec!(40)).await;

        let chart = TreasuryReport::revenue_chart(&pool, false, Range::Last7d)
            .await
            .unwrap();
        assert_eq!(chart.len(), 2);
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert!(chart.iter().all(|p| p.day == today));
        assert!(chart.iter().any(|p| p.bucket == "FLIRTMARKET" && (p.gross - 100.0).abs() < 1e-9));
    }
}
