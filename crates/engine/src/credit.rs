//! Credit engine - the citizen-score state machine
//!
//! Consumes behavior events, applies category weight and streak
//! multiplier to the base delta, mutates the CitizenScore aggregate, and
//! appends an immutable ScoreChange. One transaction per event.

use crate::error::{EngineError, EngineResult};
use crate::services::ServiceContext;
use chrono::Utc;
use novastate_core::score::{clamp_score, clamp_unit, streak_multiplier, CitizenScore};
use novastate_core::{BehaviorEvent, CreditTier};
use novastate_persistence::{
    CitizenScoreRepo, CitizenScoreRow, NewScoreChange, ScoreChangeRepo, UserRepo,
};
use serde::Serialize;
use sqlx::SqliteConnection;

/// Result of one processed behavior event.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub user_id: i64,
    pub delta: i64,
    pub old_score: i64,
    pub new_score: i64,
    pub old_tier: CreditTier,
    pub new_tier: CreditTier,
    pub tier_changed: bool,
    pub streak_multiplier: f64,
    /// True when the event was already processed and the stored change
    /// was returned instead
    pub deduped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Credit Engine - processes behavior events into score mutations
pub struct CreditEngine<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CreditEngine<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Process one behavior event under its own transaction.
    pub async fn process_event(&self, event: BehaviorEvent) -> EngineResult<ProcessOutcome> {
        let mut tx = self.ctx.begin().await?;
        let outcome = match self.process_event_tx(&mut tx, &event).await {
            Ok(outcome) => outcome,
            Err(EngineError::Conflict(_)) => {
                // replay of an already-processed event: surface the
                // stored change instead
                tx.rollback().await?;
                return self.recover_deduped(&event).await;
            }
            Err(err) => return Err(err),
        };
        tx.commit().await?;

        if let Some(message) = &outcome.message {
            tracing::info!(user_id = event.actor_id, %message, "tier transition");
        }
        Ok(outcome)
    }

    /// Process an event inside an open transaction; used directly by the
    /// quest engine so payouts stay atomic.
    pub(crate) async fn process_event_tx(
        &self,
        conn: &mut SqliteConnection,
        event: &BehaviorEvent,
    ) -> EngineResult<ProcessOutcome> {
        if !UserRepo::exists(&mut *conn, event.actor_id).await? {
            return Err(EngineError::not_found("User", event.actor_id));
        }

        // Replay check ahead of the heavy work; the unique constraint
        // still backstops races.
        if let Some(event_id) = &event.event_id {
            let existing = ScoreChangeRepo::find_by_dedupe(
                &mut *conn,
                &event.source_app,
                &event.event_type,
                event_id,
            )
            .await?;
            if existing.is_some() {
                return Err(EngineError::Conflict(format!(
                    "event {event_id} already processed"
                )));
            }
        }

        let mut score = self.fetch_or_create_score(&mut *conn, event.actor_id).await?;

        let rules = self.ctx.rules().load();
        let (weight, fell_back) = rules.category_weight(event.category);
        if fell_back {
            tracing::warn!(
                category = %event.category,
                "no weight configured for category, falling back to economic"
            );
        }

        let config = self.ctx.config();
        let multiplier = if weight.weight > 0.0 {
            streak_multiplier(score.positive_streak, config.streak_step, config.streak_cap)
        } else {
            1.0
        };

        let delta = (event.base_delta as f64 * weight.weight * multiplier).trunc() as i64;

        let old_score = score.nova_credit;
        let old_tier = score.tier;
        let now = Utc::now();

        score.nova_credit = clamp_score(old_score + delta);
        score.tier = CreditTier::of(score.nova_credit);
        score.risk_score = clamp_unit(score.risk_score + weight.risk_impact);
        score.reputation_score = clamp_unit(score.reputation_score + weight.reputation_impact);
        score.update_streaks(delta, now);
        score.updated_at = now;

        CitizenScoreRepo::update(&mut *conn, &CitizenScoreRow::from(&score)).await?;

        let change = NewScoreChange {
            user_id: event.actor_id,
            event_id: event.event_id.clone(),
            event_type: event.event_type.clone(),
            category: event.category.as_str().to_string(),
            base_delta: event.base_delta,
            weight: weight.weight,
            delta,
            old_score,
            new_score: score.nova_credit,
            reason: event.reason.clone(),
            source_app: event.source_app.clone(),
            reference_type: event.event_id.as_ref().map(|_| event.event_type.clone()),
            created_at: now,
        };
        match ScoreChangeRepo::insert(&mut *conn, &change).await {
            Ok(_) => {}
            Err(err) if err.is_unique_violation() => {
                return Err(EngineError::Conflict(format!(
                    "score change for {} raced a replay",
                    event.event_type
                )));
            }
            Err(err) => return Err(err.into()),
        }

        let tier_changed = old_tier != score.tier;
        let message = if tier_changed {
            if score.tier > old_tier {
                Some(format!("promoted to {}", score.tier))
            } else {
                Some(format!("demoted to {}", score.tier))
            }
        } else {
            None
        };

        Ok(ProcessOutcome {
            user_id: event.actor_id,
            delta,
            old_score,
            new_score: score.nova_credit,
            old_tier,
            new_tier: score.tier,
            tier_changed,
            streak_multiplier: multiplier,
            deduped: false,
            message,
        })
    }

    /// Map a raw event type through EVENT_TYPE_MAPPINGS and process it.
    pub async fn normalize_and_process(
        &self,
        user_id: i64,
        event_type: &str,
        source_app: &str,
        event_id: Option<&str>,
        context: Option<serde_json::Value>,
    ) -> EngineResult<ProcessOutcome> {
        let rules = self.ctx.rules().load();
        let (category, base_delta, fell_back) = rules.event_mapping(event_type);
        if fell_back {
            tracing::warn!(
                event_type,
                "unmapped event type, defaulting to (economic, +1)"
            );
        }

        let mut event = BehaviorEvent::new(user_id, event_type, category, base_delta, source_app);
        if let Some(event_id) = event_id {
            event = event.with_event_id(event_id);
        }
        if let Some(context) = context {
            event = event.with_context(context);
        }
        self.process_event(event).await
    }

    /// Current score aggregate, creating the default lazily.
    pub async fn get_or_create_score(&self, user_id: i64) -> EngineResult<CitizenScore> {
        let mut tx = self.ctx.begin().await?;
        let score = self.fetch_or_create_score(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(score)
    }

    async fn fetch_or_create_score(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> EngineResult<CitizenScore> {
        if let Some(row) = CitizenScoreRepo::get(&mut *conn, user_id).await? {
            return Ok(row.into_domain()?);
        }

        if !UserRepo::exists(&mut *conn, user_id).await? {
            return Err(EngineError::not_found("User", user_id));
        }
        let score = CitizenScore::initial(user_id);
        CitizenScoreRepo::insert(&mut *conn, &CitizenScoreRow::from(&score)).await?;
        Ok(score)
    }

    async fn recover_deduped(&self, event: &BehaviorEvent) -> EngineResult<ProcessOutcome> {
        let event_id = event
            .event_id
            .as_deref()
            .ok_or_else(|| EngineError::Conflict("replayed event without id".into()))?;
        let existing = ScoreChangeRepo::find_by_dedupe(
            self.ctx.pool(),
            &event.source_app,
            &event.event_type,
            event_id,
        )
        .await?
        .ok_or_else(|| EngineError::Conflict("replayed event has no stored change".into()))?;

        tracing::warn!(
            user_id = event.actor_id,
            event_id,
            "behavior event replayed, returning stored score change"
        );

        let old_tier = CreditTier::of(existing.old_score);
        let new_tier = CreditTier::of(existing.new_score);
        Ok(ProcessOutcome {
            user_id: existing.user_id,
            delta: existing.delta,
            old_score: existing.old_score,
            new_score: existing.new_score,
            old_tier,
            new_tier,
            tier_changed: false,
            streak_multiplier: 1.0,
            deduped: true,
            message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_users, test_context, test_context_with};
    use novastate_core::{EventCategory, StateConfig};

    fn economic(user: i64, delta: i64) -> BehaviorEvent {
        BehaviorEvent::new(user, "purchase_completed", EventCategory::Economic, delta, "market")
    }

    #[tokio::test]
    async fn test_lazy_score_creation() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        let score = engine.get_or_create_score(1).await.unwrap();
        assert_eq!(score.nova_credit, 500);
        assert_eq!(score.tier, CreditTier::Solid);
        assert_eq!(score.reputation_score, 0.5);

        let err = engine.get_or_create_score(99).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_tier_promotion_s2() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        // walk the score to 699 first
        let outcome = engine
            .process_event(economic(1, 199))
            .await
            .unwrap();
        assert_eq!(outcome.new_score, 699);
        assert_eq!(outcome.new_tier, CreditTier::Solid);

        let outcome = engine.process_event(economic(1, 1)).await.unwrap();
        assert_eq!(outcome.new_score, 700);
        assert_eq!(outcome.new_tier, CreditTier::Elite);
        assert!(outcome.tier_changed);
        assert_eq!(outcome.message.as_deref(), Some("promoted to elite"));
    }

    #[tokio::test]
    async fn test_streak_bonus_s3() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        let mut last = None;
        for _ in 0..10 {
            last = Some(engine.process_event(economic(1, 2)).await.unwrap());
        }
        let last = last.unwrap();

        // event 10 sees streak 9 -> multiplier 1.15, floor(2 * 1.15) = 2
        assert!((last.streak_multiplier - 1.15).abs() < 1e-9);
        assert_eq!(last.delta, 2);

        let score = engine.get_or_create_score(1).await.unwrap();
        assert_eq!(score.positive_streak, 10);
        assert_eq!(score.negative_streak, 0);
        assert_eq!(score.total_positive_events, 10);
    }

    #[tokio::test]
    async fn test_negative_event_breaks_streak_and_raises_risk() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        engine.process_event(economic(1, 5)).await.unwrap();
        let outcome = engine
            .process_event(BehaviorEvent::new(
                1,
                "fraud_confirmed",
                EventCategory::RiskNegative,
                -10,
                "market",
            ))
            .await
            .unwrap();

        // weight -2.0 flips the sign: a negative base delta lands positive
        assert_eq!(outcome.delta, 20);
        let score = engine.get_or_create_score(1).await.unwrap();
        assert_eq!(score.positive_streak, 2);
        assert_eq!(score.negative_streak, 0);

        // a genuinely negative delta flips the streaks
        let outcome = engine
            .process_event(BehaviorEvent::new(
                1,
                "spam_confirmed",
                EventCategory::SocialNegative,
                4,
                "forum",
            ))
            .await
            .unwrap();
        assert!(outcome.delta < 0);
        let score = engine.get_or_create_score(1).await.unwrap();
        assert_eq!(score.positive_streak, 0);
        assert_eq!(score.negative_streak, 1);
        assert!(score.risk_score > 0.0);
        assert!(score.reputation_score < 0.5);
    }

    #[tokio::test]
    async fn test_clamp_at_bounds() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        let outcome = engine.process_event(economic(1, 100_000)).await.unwrap();
        assert_eq!(outcome.new_score, 1000);
        assert_eq!(outcome.new_tier, CreditTier::Legend);

        let outcome = engine
            .process_event(BehaviorEvent::new(
                1,
                "fraud_confirmed",
                EventCategory::RiskNegative,
                100_000,
                "market",
            ))
            .await
            .unwrap();
        assert_eq!(outcome.new_score, 0);
        assert_eq!(outcome.new_tier, CreditTier::Ghost);
    }

    #[tokio::test]
    async fn test_reversal_returns_to_start_with_streaks_off() {
        let mut config = StateConfig::default();
        config.streak_step = 0.0; // multiplier pinned at 1.0
        let (ctx, _dir) = test_context_with(config).await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        let start = engine.get_or_create_score(1).await.unwrap().nova_credit;
        engine.process_event(economic(1, 7)).await.unwrap();
        let outcome = engine.process_event(economic(1, -7)).await.unwrap();
        assert_eq!(outcome.new_score, start);
    }

    #[tokio::test]
    async fn test_dedupe_replay_recovers() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        let event = economic(1, 5).with_event_id("evt-1");
        let first = engine.process_event(event.clone()).await.unwrap();
        assert!(!first.deduped);

        let replay = engine.process_event(event).await.unwrap();
        assert!(replay.deduped);
        assert_eq!(replay.delta, first.delta);
        assert_eq!(replay.new_score, first.new_score);

        // exactly one score change recorded
        assert_eq!(
            ScoreChangeRepo::count_by_user(ctx.pool(), 1).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_normalize_and_process_mapping() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        // vote_cast maps to (civic, +3) with weight 1.5 -> +4
        let outcome = engine
            .normalize_and_process(1, "vote_cast", "senate", None, None)
            .await
            .unwrap();
        assert_eq!(outcome.delta, 4);

        // unmapped types default to (economic, +1)
        let outcome = engine
            .normalize_and_process(1, "completely_new_thing", "lab", None, None)
            .await
            .unwrap();
        assert_eq!(outcome.delta, 1);
    }

    #[tokio::test]
    async fn test_tier_always_matches_score() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let engine = CreditEngine::new(&ctx);

        for delta in [50, -300, 420, -10, 900, -1500] {
            let outcome = engine.process_event(economic(1, delta)).await.unwrap();
            assert_eq!(outcome.new_tier, CreditTier::of(outcome.new_score));
            let stored = engine.get_or_create_score(1).await.unwrap();
            assert_eq!(stored.tier, CreditTier::of(stored.nova_credit));
            assert_eq!(stored.positive_streak.min(stored.negative_streak), 0);
        }
    }
}
