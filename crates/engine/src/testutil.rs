//! Shared test fixtures for engine tests.

use crate::services::ServiceContext;
use novastate_core::{RulesHandle, StateConfig};
use novastate_persistence::{AuditLog, UserRepo, MIGRATOR};
use std::sync::Arc;
use tempfile::TempDir;

/// Fresh in-memory database with migrations applied, plus a temp audit dir.
/// The TempDir must stay alive for the duration of the test.
pub async fn test_context() -> (ServiceContext, TempDir) {
    test_context_with(StateConfig::default()).await
}

pub async fn test_context_with(config: StateConfig) -> (ServiceContext, TempDir) {
    // a single connection keeps the in-memory database shared
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();

    let dir = TempDir::new().unwrap();
    let audit = Arc::new(AuditLog::new(dir.path()).unwrap());
    let ctx = ServiceContext::from_parts(pool, audit, RulesHandle::default(), config);
    (ctx, dir)
}

/// Seed a handful of citizens the tests reference by id.
pub async fn seed_users(ctx: &ServiceContext, ids: &[i64]) {
    for id in ids {
        UserRepo::insert(ctx.pool(), *id, &format!("citizen_{id}"), "citizen")
            .await
            .unwrap();
    }
}

pub async fn seed_admin(ctx: &ServiceContext, id: i64) {
    UserRepo::insert(ctx.pool(), id, &format!("admin_{id}"), "admin")
        .await
        .unwrap();
}
