//! Service context shared by all engines
//!
//! Holds the database pool, the JSONL audit log, the hot-swappable rules
//! snapshot, and the environment config. Engines borrow the context; each
//! public operation opens its own transaction from the pool.

use crate::error::EngineResult;
use novastate_core::{RulesHandle, StateConfig};
use novastate_persistence::AuditLog;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

/// Context for engine operations - database, audit, rules, config.
pub struct ServiceContext {
    pool: SqlitePool,
    audit: Arc<AuditLog>,
    rules: RulesHandle,
    config: StateConfig,
}

impl ServiceContext {
    pub fn new(pool: SqlitePool, audit: Arc<AuditLog>) -> Self {
        Self {
            pool,
            audit,
            rules: RulesHandle::default(),
            config: StateConfig::default(),
        }
    }

    /// Create from all parts; used by the CLI and tests.
    pub fn from_parts(
        pool: SqlitePool,
        audit: Arc<AuditLog>,
        rules: RulesHandle,
        config: StateConfig,
    ) -> Self {
        Self {
            pool,
            audit,
            rules,
            config,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn rules(&self) -> &RulesHandle {
        &self.rules
    }

    pub fn config(&self) -> &StateConfig {
        &self.config
    }

    /// Open the single transaction a public operation runs under.
    pub async fn begin(&self) -> EngineResult<Transaction<'_, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}
