//! HITL arbiter - human review of borderline quests
//!
//! Moderators work the UNDER_REVIEW queue: approval pays the rewards
//! frozen at submission time, rejection feeds the abuse guard. Terminal
//! quests are never touched again.

use crate::abuse::AbuseGuard;
use crate::error::{EngineError, EngineResult};
use crate::quest::QuestEngine;
use crate::services::ServiceContext;
use chrono::Utc;
use novastate_core::{AbuseEventType, QuestStatus};
use novastate_persistence::{IssuanceRepo, UserQuestRepo, UserQuestRow, UserRepo};
use rust_decimal::Decimal;

/// Severity of the abuse signal a human rejection emits.
const REJECT_SEVERITY: f64 = 5.0;

/// HITL Arbiter - approve or reject quests awaiting review
pub struct HitlArbiter<'a> {
    ctx: &'a ServiceContext,
    quests: QuestEngine<'a>,
    abuse: AbuseGuard<'a>,
}

impl<'a> HitlArbiter<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            quests: QuestEngine::new(ctx),
            abuse: AbuseGuard::new(ctx),
        }
    }

    /// Quests waiting for a human, oldest submission first.
    pub async fn review_queue(&self, limit: i64) -> EngineResult<Vec<UserQuestRow>> {
        Ok(UserQuestRepo::list_by_status(self.ctx.pool(), QuestStatus::UnderReview, limit).await?)
    }

    /// Resolve one UNDER_REVIEW quest.
    pub async fn decide(
        &self,
        quest_uuid: &str,
        admin_id: i64,
        decision: QuestStatus,
        reason: Option<&str>,
    ) -> EngineResult<UserQuestRow> {
        if decision != QuestStatus::Approved && decision != QuestStatus::Rejected {
            return Err(EngineError::Validation(format!(
                "decision must be approved or rejected, got {decision}"
            )));
        }
        self.verify_admin(admin_id).await?;

        let now = Utc::now();
        let mut tx = self.ctx.begin().await?;

        let quest = UserQuestRepo::get_by_uuid(&mut *tx, quest_uuid).await?;
        let status = quest.quest_status()?;
        if status != QuestStatus::UnderReview {
            return Err(EngineError::InvalidState(format!(
                "quest {quest_uuid} is {status}, expected under_review"
            )));
        }

        UserQuestRepo::record_decision(&mut *tx, quest_uuid, decision, admin_id, reason, now)
            .await?;

        match decision {
            QuestStatus::Approved => {
                let final_ncr = quest.final_reward_decimal()?.unwrap_or(Decimal::ZERO);
                let final_xp = quest.final_reward_xp.unwrap_or(0);

                let day = now.format("%Y-%m-%d").to_string();
                IssuanceRepo::ensure(&mut *tx, &day).await?;
                let issuance = IssuanceRepo::get(&mut *tx, &day).await?;
                self.quests
                    .pay_rewards_tx(
                        &mut tx,
                        &quest,
                        final_ncr,
                        final_xp,
                        "quest_hitl_approved",
                        &day,
                        issuance.issued_decimal()?,
                        issuance.capped_decimal()?,
                    )
                    .await?;
            }
            QuestStatus::Rejected => {
                self.abuse
                    .register_event_tx(
                        &mut tx,
                        quest.user_id,
                        AbuseEventType::ManualFlag,
                        REJECT_SEVERITY,
                        Some(serde_json::json!({
                            "quest_uuid": quest_uuid,
                            "admin_id": admin_id,
                            "reason": reason,
                        })),
                    )
                    .await?;
            }
            // other values rejected up front
            _ => {}
        }

        tx.commit().await?;

        tracing::info!(
            quest_uuid,
            admin_id,
            decision = %decision,
            reason = reason.unwrap_or(""),
            "hitl decision recorded"
        );
        let record = novastate_persistence::AuditRecord::new(
            self.ctx.audit().next_audit_id(),
            "hitl_decide",
            &format!("{} by admin", decision),
        )
        .with_actor(admin_id)
        .with_subject(quest_uuid);
        self.ctx.audit().append(&record)?;

        Ok(UserQuestRepo::get_by_uuid(self.ctx.pool(), quest_uuid).await?)
    }

    /// Only users with the admin role may arbitrate.
    async fn verify_admin(&self, admin_id: i64) -> EngineResult<()> {
        let user = UserRepo::get_by_id(self.ctx.pool(), admin_id).await?;
        if user.role != "admin" {
            return Err(EngineError::Validation(format!(
                "user {} is not an admin",
                admin_id
            )));
        }
        Ok(())
    }
}
