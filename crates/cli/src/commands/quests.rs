//! Quest and HITL commands

use crate::db::open_context;
use crate::{Cli, HitlAction, QuestAction};
use anyhow::{bail, Result};
use novastate_core::{ProofKind, QuestStatus};
use novastate_engine::{HitlArbiter, QuestEngine};
use novastate_persistence::UserQuestRow;

fn print_quest(quest: &UserQuestRow) {
    println!(
        "  [{}] {} ({}) - {} NCR / {} XP - {}",
        quest.slot, quest.title, quest.status, quest.base_reward_ncr, quest.base_reward_xp,
        quest.quest_uuid
    );
}

/// Quest lifecycle subcommands.
pub async fn run(cli: &Cli, action: &QuestAction) -> Result<()> {
    let ctx = open_context(cli).await?;
    let engine = QuestEngine::new(&ctx);

    match action {
        QuestAction::Ensure { user } => {
            let quests = engine.ensure_daily_quests(*user).await?;
            println!("Today's quests for user #{user}:");
            for quest in &quests {
                print_quest(quest);
            }
        }
        QuestAction::Today { user } => {
            let quests = engine.active_quests(*user).await?;
            if quests.is_empty() {
                println!("No active quests for user #{user}");
            }
            for quest in &quests {
                print_quest(quest);
            }
        }
        QuestAction::Submit {
            user,
            quest_uuid,
            kind,
            proof,
            ai_score,
        } => {
            let Some(kind) = ProofKind::parse(kind) else {
                bail!("proof kind must be one of text, url, image_ref, tx_ref");
            };
            let outcome = engine
                .submit_proof(*user, quest_uuid, kind, proof, *ai_score, "cli", None)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        QuestAction::Expire => {
            let swept = engine.expire_overdue().await?;
            println!("Expired {swept} overdue quests");
        }
    }
    Ok(())
}

/// HITL subcommands.
pub async fn hitl(cli: &Cli, action: &HitlAction) -> Result<()> {
    let ctx = open_context(cli).await?;
    let arbiter = HitlArbiter::new(&ctx);

    match action {
        HitlAction::Queue { limit } => {
            let queue = arbiter.review_queue(*limit).await?;
            if queue.is_empty() {
                println!("Review queue is empty");
            }
            for quest in &queue {
                println!(
                    "  user #{} {} quality {:?} risk {:?} - {}",
                    quest.user_id,
                    quest.title,
                    quest.final_score,
                    quest.abuse_risk_snapshot,
                    quest.quest_uuid
                );
            }
        }
        HitlAction::Decide {
            quest_uuid,
            admin,
            decision,
            reason,
        } => {
            let decision = match QuestStatus::parse(decision) {
                Some(status @ (QuestStatus::Approved | QuestStatus::Rejected)) => status,
                _ => bail!("decision must be approved or rejected"),
            };
            let quest = arbiter
                .decide(quest_uuid, *admin, decision, reason.as_deref())
                .await?;
            println!(
                "Quest {} is now {} (rewards: {:?} NCR / {:?} XP)",
                quest.quest_uuid, quest.status, quest.final_reward_ncr, quest.final_reward_xp
            );
        }
    }
    Ok(())
}
