//! Abuse guard - rolling per-user risk profiles
//!
//! Accepts abuse signals, folds them into an exponentially-decayed risk
//! score, and answers read queries from the quest reward calculator and
//! the HITL triage. Depends on nothing above it.

use crate::error::{EngineError, EngineResult};
use crate::services::ServiceContext;
use chrono::{Duration, Utc};
use novastate_core::abuse::{decay_factor, risk_factor};
use novastate_core::score::clamp_unit;
use novastate_core::AbuseEventType;
use novastate_persistence::{AbuseProfileRow, AbuseRepo, UserRepo};
use serde::Serialize;
use sqlx::SqliteConnection;

/// Decayed view of a citizen's risk profile.
#[derive(Debug, Clone, Serialize)]
pub struct AbuseProfile {
    pub user_id: i64,
    pub risk_score: f64,
    pub events_total: i64,
    /// Signals received in the last 24 hours
    pub recent_events: i64,
    pub last_decayed_at: chrono::DateTime<chrono::Utc>,
}

/// Abuse Guard - accumulates signals, serves risk reads
pub struct AbuseGuard<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AbuseGuard<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fold one abuse signal into the citizen's profile.
    ///
    /// Severity is a 0..=10 scale; the stored risk first decays by the
    /// configured half-life, then moves toward 1 by
    /// `(1 - risk) * severity/10 * type weight`.
    pub async fn register_event(
        &self,
        user_id: i64,
        event_type: AbuseEventType,
        severity: f64,
        metadata: Option<serde_json::Value>,
    ) -> EngineResult<AbuseProfile> {
        if !(0.0..=10.0).contains(&severity) {
            return Err(EngineError::Validation(format!(
                "severity must be in 0..=10: {severity}"
            )));
        }
        if !UserRepo::exists(self.ctx.pool(), user_id).await? {
            return Err(EngineError::not_found("User", user_id));
        }

        let mut tx = self.ctx.begin().await?;
        let profile = self
            .register_event_tx(&mut tx, user_id, event_type, severity, metadata)
            .await?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            event_type = %event_type,
            severity,
            risk_score = profile.risk_score,
            "abuse signal registered"
        );
        Ok(profile)
    }

    /// Same as [`Self::register_event`] but inside an open transaction.
    pub(crate) async fn register_event_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        event_type: AbuseEventType,
        severity: f64,
        metadata: Option<serde_json::Value>,
    ) -> EngineResult<AbuseProfile> {
        let now = Utc::now();
        let half_life = self.ctx.config().abuse_half_life_hours;

        let stored = AbuseRepo::get_profile(&mut *conn, user_id).await?;
        let (mut risk, events_total) = match &stored {
            Some(row) => {
                let elapsed = (now - row.last_decayed_at).num_seconds() as f64 / 3600.0;
                (row.risk_score * decay_factor(elapsed, half_life), row.events_total)
            }
            None => (0.0, 0),
        };

        risk = clamp_unit(risk + (1.0 - risk) * (severity / 10.0) * event_type.weight());

        let row = AbuseProfileRow {
            user_id,
            risk_score: risk,
            events_total: events_total + 1,
            last_event_at: Some(now),
            last_decayed_at: now,
            updated_at: now,
        };
        AbuseRepo::upsert_profile(&mut *conn, &row).await?;
        AbuseRepo::insert_event(
            &mut *conn,
            user_id,
            event_type.as_str(),
            severity,
            metadata.as_ref().map(|m| m.to_string()).as_deref(),
        )
        .await?;

        let recent = AbuseRepo::count_events_since(&mut *conn, user_id, now - Duration::hours(24))
            .await?;

        Ok(AbuseProfile {
            user_id,
            risk_score: risk,
            events_total: events_total + 1,
            recent_events: recent,
            last_decayed_at: now,
        })
    }

    /// Decayed profile view; an untouched citizen reads as zero risk.
    pub async fn get_or_create_profile(&self, user_id: i64) -> EngineResult<AbuseProfile> {
        let mut tx = self.ctx.begin().await?;
        let profile = self.profile_tx(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(profile)
    }

    /// Read the decayed risk inside an open transaction. The stored row
    /// is not rewritten on read; decay is applied to the view only.
    pub(crate) async fn profile_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> EngineResult<AbuseProfile> {
        let now = Utc::now();
        let half_life = self.ctx.config().abuse_half_life_hours;

        match AbuseRepo::get_profile(&mut *conn, user_id).await? {
            Some(row) => {
                let elapsed = (now - row.last_decayed_at).num_seconds() as f64 / 3600.0;
                let recent =
                    AbuseRepo::count_events_since(&mut *conn, user_id, now - Duration::hours(24))
                        .await?;
                Ok(AbuseProfile {
                    user_id,
                    risk_score: row.risk_score * decay_factor(elapsed, half_life),
                    events_total: row.events_total,
                    recent_events: recent,
                    last_decayed_at: row.last_decayed_at,
                })
            }
            None => Ok(AbuseProfile {
                user_id,
                risk_score: 0.0,
                events_total: 0,
                recent_events: 0,
                last_decayed_at: now,
            }),
        }
    }

    /// Reward multiplier for a risk score: `1 - risk_factor(risk)`.
    pub fn reward_multiplier(risk_score: f64) -> f64 {
        1.0 - risk_factor(risk_score)
    }
}
