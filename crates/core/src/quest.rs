//! # Quest Module
//!
//! Quest slots, lifecycle statuses, proof requirements, and the static
//! definition catalogue. Definitions are configuration: read-only at
//! runtime, selected per slot by the quest engine each day.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily quest slot, offered once per day per citizen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestSlot {
    Money,
    Skill,
    Integrity,
}

impl QuestSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestSlot::Money => "money",
            QuestSlot::Skill => "skill",
            QuestSlot::Integrity => "integrity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "money" => Some(QuestSlot::Money),
            "skill" => Some(QuestSlot::Skill),
            "integrity" => Some(QuestSlot::Integrity),
            _ => None,
        }
    }

    pub fn all() -> [QuestSlot; 3] {
        [QuestSlot::Money, QuestSlot::Skill, QuestSlot::Integrity]
    }
}

impl fmt::Display for QuestSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of an assigned quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Assigned,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Expired,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Assigned => "assigned",
            QuestStatus::Submitted => "submitted",
            QuestStatus::UnderReview => "under_review",
            QuestStatus::Approved => "approved",
            QuestStatus::Rejected => "rejected",
            QuestStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "assigned" => Some(QuestStatus::Assigned),
            "submitted" => Some(QuestStatus::Submitted),
            "under_review" => Some(QuestStatus::UnderReview),
            "approved" => Some(QuestStatus::Approved),
            "rejected" => Some(QuestStatus::Rejected),
            "expired" => Some(QuestStatus::Expired),
            _ => None,
        }
    }

    /// Terminal quests are never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuestStatus::Approved | QuestStatus::Rejected | QuestStatus::Expired
        )
    }

    /// Whether the state machine admits `self -> next`.
    pub fn can_transition_to(&self, next: QuestStatus) -> bool {
        use QuestStatus::*;
        matches!(
            (self, next),
            (Assigned, Submitted)
                | (Assigned, Expired)
                | (Submitted, UnderReview)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
        )
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of proof a quest accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Text,
    Url,
    ImageRef,
    TxRef,
}

impl ProofKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofKind::Text => "text",
            ProofKind::Url => "url",
            ProofKind::ImageRef => "image_ref",
            ProofKind::TxRef => "tx_ref",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ProofKind::Text),
            "url" => Some(ProofKind::Url),
            "image_ref" => Some(ProofKind::ImageRef),
            "tx_ref" => Some(ProofKind::TxRef),
            _ => None,
        }
    }
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule-based scoring applied when the caller supplies no AI score.
///
/// Starts from `base_score`, adds `keyword_bonus` per matched keyword and
/// `length_bonus` when the proof is at least `length_bonus_at` characters,
/// then clamps into [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRules {
    pub base_score: f64,
    pub keywords: Vec<String>,
    pub keyword_bonus: f64,
    pub length_bonus_at: usize,
    pub length_bonus: f64,
}

impl ScoringRules {
    pub fn score(&self, proof_ref: &str) -> f64 {
        let lowered = proof_ref.to_lowercase();
        let mut score = self.base_score;
        for keyword in &self.keywords {
            if lowered.contains(&keyword.to_lowercase()) {
                score += self.keyword_bonus;
            }
        }
        if proof_ref.chars().count() >= self.length_bonus_at {
            score += self.length_bonus;
        }
        score.clamp(0.0, 100.0)
    }
}

/// Static quest definition from the catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct QuestDefinition {
    /// Stable catalogue id (e.g. "money_first_sale")
    pub quest_id: &'static str,
    pub slot: QuestSlot,
    pub title: &'static str,
    pub instructions: &'static str,
    pub proof_kind: ProofKind,
    /// Minimum proof reference length in characters
    pub min_proof_len: usize,
    pub base_reward_ncr: Decimal,
    pub base_reward_xp: i64,
    /// Offered at most once per citizen, ever
    pub one_time_only: bool,
    /// Always routed to a human reviewer regardless of quality
    pub force_hitl: bool,
    /// Contribution of this quest's completion to NovaScore signals
    pub signal_weight: f64,
    pub scoring: ScoringRules,
}

/// The built-in catalogue: at least three definitions per slot.
pub fn quest_catalogue() -> Vec<QuestDefinition> {
    fn rules(base: f64, keywords: &[&str]) -> ScoringRules {
        ScoringRules {
            base_score: base,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            keyword_bonus: 10.0,
            length_bonus_at: 40,
            length_bonus: 10.0,
        }
    }

    vec![
        // === MONEY ===
        QuestDefinition {
            quest_id: "money_first_sale",
            slot: QuestSlot::Money,
            title: "Close a marketplace sale",
            instructions: "Sell any item or service on a state marketplace and submit the transaction reference.",
            proof_kind: ProofKind::TxRef,
            min_proof_len: 8,
            base_reward_ncr: Decimal::new(5, 0),
            base_reward_xp: 25,
            one_time_only: false,
            force_hitl: false,
            signal_weight: 1.0,
            scoring: rules(60.0, &["tx", "sale", "order"]),
        },
        QuestDefinition {
            quest_id: "money_tip_performer",
            slot: QuestSlot::Money,
            title: "Support a performer",
            instructions: "Tip any performer at least 1 NCR and submit the tip transaction reference.",
            proof_kind: ProofKind::TxRef,
            min_proof_len: 8,
            base_reward_ncr: Decimal::new(3, 0),
            base_reward_xp: 15,
            one_time_only: false,
            force_hitl: false,
            signal_weight: 0.8,
            scoring: rules(60.0, &["tip", "tx"]),
        },
        QuestDefinition {
            quest_id: "money_budget_review",
            slot: QuestSlot::Money,
            title: "Review your weekly budget",
            instructions: "Write a short reflection on your NCR spending this week (at least 40 characters).",
            proof_kind: ProofKind::Text,
            min_proof_len: 40,
            base_reward_ncr: Decimal::new(2, 0),
            base_reward_xp: 10,
            one_time_only: false,
            force_hitl: false,
            signal_weight: 0.5,
            scoring: rules(55.0, &["spent", "saved", "budget"]),
        },
        // === SKILL ===
        QuestDefinition {
            quest_id: "skill_finish_tutorial",
            slot: QuestSlot::Skill,
            title: "Finish a learning module",
            instructions: "Complete any tutorial in the academy and submit its completion URL.",
            proof_kind: ProofKind::Url,
            min_proof_len: 12,
            base_reward_ncr: Decimal::new(4, 0),
            base_reward_xp: 30,
            one_time_only: false,
            force_hitl: false,
            signal_weight: 1.0,
            scoring: rules(60.0, &["academy", "course", "tutorial"]),
        },
        QuestDefinition {
            quest_id: "skill_teach_citizen",
            slot: QuestSlot::Skill,
            title: "Teach another citizen",
            instructions: "Host a help session and describe what you taught and to whom.",
            proof_kind: ProofKind::Text,
            min_proof_len: 60,
            base_reward_ncr: Decimal::new(6, 0),
            base_reward_xp: 40,
            one_time_only: false,
            force_hitl: true,
            signal_weight: 1.2,
            scoring: rules(50.0, &["taught", "session", "helped"]),
        },
        QuestDefinition {
            quest_id: "skill_first_certification",
            slot: QuestSlot::Skill,
            title: "Earn your first certification",
            instructions: "Pass any academy certification exam and submit the certificate URL.",
            proof_kind: ProofKind::Url,
            min_proof_len: 12,
            base_reward_ncr: Decimal::new(10, 0),
            base_reward_xp: 80,
            one_time_only: true,
            force_hitl: false,
            signal_weight: 1.5,
            scoring: rules(65.0, &["cert", "exam"]),
        },
        // === INTEGRITY ===
        QuestDefinition {
            quest_id: "integrity_verify_fact",
            slot: QuestSlot::Integrity,
            title: "Verify a disputed fact",
            instructions: "Pick a disputed claim from the registry, research it, and submit your sourced verdict.",
            proof_kind: ProofKind::Text,
            min_proof_len: 80,
            base_reward_ncr: Decimal::new(5, 0),
            base_reward_xp: 35,
            one_time_only: false,
            force_hitl: false,
            signal_weight: 1.0,
            scoring: rules(50.0, &["source", "verified", "evidence"]),
        },
        QuestDefinition {
            quest_id: "integrity_report_abuse",
            slot: QuestSlot::Integrity,
            title: "Report a rule violation",
            instructions: "File a report on content that violates state rules, with a link to the offending item.",
            proof_kind: ProofKind::Url,
            min_proof_len: 12,
            base_reward_ncr: Decimal::new(3, 0),
            base_reward_xp: 20,
            one_time_only: false,
            force_hitl: true,
            signal_weight: 0.9,
            scoring: rules(50.0, &["report", "violation"]),
        },
        QuestDefinition {
            quest_id: "integrity_identity_attest",
            slot: QuestSlot::Integrity,
            title: "Attest your identity",
            instructions: "Complete the one-time identity attestation flow and submit the attestation reference.",
            proof_kind: ProofKind::TxRef,
            min_proof_len: 8,
            base_reward_ncr: Decimal::new(8, 0),
            base_reward_xp: 60,
            one_time_only: true,
            force_hitl: false,
            signal_weight: 1.4,
            scoring: rules(70.0, &["attest"]),
        },
    ]
}

/// Look up a definition by its catalogue id.
pub fn find_definition(quest_id: &str) -> Option<QuestDefinition> {
    quest_catalogue().into_iter().find(|d| d.quest_id == quest_id)
}
