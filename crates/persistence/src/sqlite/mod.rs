//! SQLite persistence module
//!
//! Repository pattern for SQLite database access.

pub mod repos;

pub use repos::{
    connect_pool, init_database, run_migrations, AbuseRepo, AccountRepo, CitizenScoreRepo,
    IssuanceRepo, LedgerEntryRepo, LeaderboardRow, RevenueBucketRow, RiskBucketCounts,
    RiskFlagRepo, ScoreChangeRepo, SystemAccountRepo, TierCountRow, TreasuryFlowRepo,
    UserQuestRepo, UserRepo, MIGRATOR,
};
