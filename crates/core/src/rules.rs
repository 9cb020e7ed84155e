//! # Rules Module
//!
//! The immutable rules snapshot: category weights, event-type mappings,
//! tier privileges, treasury split config, and quest thresholds. Engines
//! read a snapshot through a [`RulesHandle`]; hot reloads build a fresh
//! snapshot and swap it in atomically, so no operation ever observes a
//! half-updated rule set.

use crate::event::EventCategory;
use crate::quest::{quest_catalogue, QuestDefinition};
use crate::score::CreditTier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Weight tuple applied to a behavior event's base delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    /// Signed multiplier on the base delta
    pub weight: f64,
    /// Added to the citizen's risk score, clamped [0, 1]
    pub risk_impact: f64,
    /// Added to the citizen's reputation score, clamped [0, 1]
    pub reputation_impact: f64,
}

impl CategoryWeight {
    pub fn new(weight: f64, risk_impact: f64, reputation_impact: f64) -> Self {
        Self {
            weight,
            risk_impact,
            reputation_impact,
        }
    }
}

/// Per-tier privilege set surfaced on the credit profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPrivileges {
    pub withdraw_limit_daily: Decimal,
    pub transfer_limit_daily: Decimal,
    pub can_create_content: bool,
    pub can_host_rooms: bool,
    pub priority_support: bool,
    pub ai_model_tier: String,
    /// Fraction knocked off transaction fees, in [0, 1]
    pub transaction_fee_discount: f64,
}

/// Tax split across the treasury pools; ratios sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreasurySplit {
    pub growth: Decimal,
    pub performer_pool: Decimal,
    pub dev_fund: Decimal,
    pub burn: Decimal,
}

impl TreasurySplit {
    pub fn sum(&self) -> Decimal {
        self.growth + self.performer_pool + self.dev_fund + self.burn
    }
}

/// Tax rate plus split for one (app, kind) class of revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueRule {
    pub tax_rate: Decimal,
    pub split: TreasurySplit,
}

/// Treasury configuration: a default rule plus per-(APP, KIND) overrides.
#[derive(Debug, Clone)]
pub struct TreasuryConfig {
    pub default_rule: RevenueRule,
    /// Keyed by the uppercased (app, kind) tuple
    pub overrides: HashMap<(String, String), RevenueRule>,
}

impl TreasuryConfig {
    /// Resolve the rule for (app, kind); `None` means the default applied
    /// because the tuple is unknown.
    pub fn resolve(&self, app: &str, kind: &str) -> (RevenueRule, bool) {
        let key = (app.to_uppercase(), kind.to_uppercase());
        match self.overrides.get(&key) {
            Some(rule) => (*rule, true),
            None => (self.default_rule, false),
        }
    }
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        let default_rule = RevenueRule {
            tax_rate: Decimal::new(20, 2), // 0.20
            split: TreasurySplit {
                growth: Decimal::new(40, 2),
                performer_pool: Decimal::new(30, 2),
                dev_fund: Decimal::new(20, 2),
                burn: Decimal::new(10, 2),
            },
        };

        let mut overrides = HashMap::new();
        // Premium room revenue is taxed harder, with a heavier burn.
        overrides.insert(
            ("FLIRTMARKET".to_string(), "ROOM_ENTRY".to_string()),
            RevenueRule {
                tax_rate: Decimal::new(30, 2),
                split: TreasurySplit {
                    growth: Decimal::new(30, 2),
                    performer_pool: Decimal::new(30, 2),
                    dev_fund: Decimal::new(20, 2),
                    burn: Decimal::new(20, 2),
                },
            },
        );

        Self {
            default_rule,
            overrides,
        }
    }
}

/// Quest routing thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuestThresholds {
    /// Quality at or above which a submission auto-approves
    pub auto_approve: f64,
    /// Quality below which a submission auto-rejects
    pub auto_reject: f64,
    /// Risk at or above which auto-approval is blocked
    pub risk_block: f64,
}

impl Default for QuestThresholds {
    fn default() -> Self {
        Self {
            auto_approve: 70.0,
            auto_reject: 30.0,
            risk_block: 0.7,
        }
    }
}

/// One immutable rules snapshot.
#[derive(Debug, Clone)]
pub struct RulesSnapshot {
    pub category_weights: HashMap<EventCategory, CategoryWeight>,
    /// event_type -> (category, base_delta)
    pub event_mappings: HashMap<String, (EventCategory, i64)>,
    pub tier_privileges: HashMap<CreditTier, TierPrivileges>,
    pub treasury: TreasuryConfig,
    pub quest_thresholds: QuestThresholds,
    pub quest_catalogue: Vec<QuestDefinition>,
}

impl RulesSnapshot {
    /// Weight for a category; unknown categories fall back to ECONOMIC.
    /// Returns `(weight, fell_back)` so callers can log the config miss.
    pub fn category_weight(&self, category: EventCategory) -> (CategoryWeight, bool) {
        match self.category_weights.get(&category) {
            Some(w) => (*w, false),
            None => (
                self.category_weights
                    .get(&EventCategory::Economic)
                    .copied()
                    .unwrap_or(CategoryWeight::new(1.0, 0.0, 0.0)),
                true,
            ),
        }
    }

    /// Mapping for an event type; unmapped types default to (ECONOMIC, +1).
    /// Returns `(category, base_delta, fell_back)`.
    pub fn event_mapping(&self, event_type: &str) -> (EventCategory, i64, bool) {
        match self.event_mappings.get(event_type) {
            Some((category, delta)) => (*category, *delta, false),
            None => (EventCategory::Economic, 1, true),
        }
    }

    pub fn privileges(&self, tier: CreditTier) -> TierPrivileges {
        self.tier_privileges
            .get(&tier)
            .cloned()
            .unwrap_or_else(|| default_privileges(tier))
    }
}

fn default_privileges(tier: CreditTier) -> TierPrivileges {
    match tier {
        CreditTier::Ghost => TierPrivileges {
            withdraw_limit_daily: Decimal::new(10, 0),
            transfer_limit_daily: Decimal::new(25, 0),
            can_create_content: false,
            can_host_rooms: false,
            priority_support: false,
            ai_model_tier: "basic".to_string(),
            transaction_fee_discount: 0.0,
        },
        CreditTier::Grey => TierPrivileges {
            withdraw_limit_daily: Decimal::new(50, 0),
            transfer_limit_daily: Decimal::new(100, 0),
            can_create_content: false,
            can_host_rooms: false,
            priority_support: false,
            ai_model_tier: "basic".to_string(),
            transaction_fee_discount: 0.0,
        },
        CreditTier::Solid => TierPrivileges {
            withdraw_limit_daily: Decimal::new(250, 0),
            transfer_limit_daily: Decimal::new(500, 0),
            can_create_content: true,
            can_host_rooms: false,
            priority_support: false,
            ai_model_tier: "standard".to_string(),
            transaction_fee_discount: 0.05,
        },
        CreditTier::Elite => TierPrivileges {
            withdraw_limit_daily: Decimal::new(1000, 0),
            transfer_limit_daily: Decimal::new(2500, 0),
            can_create_content: true,
            can_host_rooms: true,
            priority_support: true,
            ai_model_tier: "advanced".to_string(),
            transaction_fee_discount: 0.15,
        },
        CreditTier::Legend => TierPrivileges {
            withdraw_limit_daily: Decimal::new(5000, 0),
            transfer_limit_daily: Decimal::new(10000, 0),
            can_create_content: true,
            can_host_rooms: true,
            priority_support: true,
            ai_model_tier: "frontier".to_string(),
            transaction_fee_discount: 0.30,
        },
    }
}

impl Default for RulesSnapshot {
    fn default() -> Self {
        let mut category_weights = HashMap::new();
        category_weights.insert(EventCategory::Economic, CategoryWeight::new(1.0, 0.0, 0.001));
        category_weights.insert(
            EventCategory::SocialPositive,
            CategoryWeight::new(1.2, 0.0, 0.005),
        );
        category_weights.insert(
            EventCategory::SocialNegative,
            CategoryWeight::new(-1.5, 0.02, -0.01),
        );
        category_weights.insert(EventCategory::Civic, CategoryWeight::new(1.5, 0.0, 0.01));
        category_weights.insert(EventCategory::Skill, CategoryWeight::new(1.3, 0.0, 0.005));
        category_weights.insert(EventCategory::Quest, CategoryWeight::new(1.0, 0.0, 0.003));
        category_weights.insert(
            EventCategory::RiskNegative,
            CategoryWeight::new(-2.0, 0.05, -0.02),
        );

        let mut event_mappings = HashMap::new();
        let mappings: [(&str, EventCategory, i64); 10] = [
            ("tip_sent", EventCategory::Economic, 2),
            ("purchase_completed", EventCategory::Economic, 1),
            ("content_upvoted", EventCategory::SocialPositive, 1),
            ("citizen_helped", EventCategory::SocialPositive, 3),
            ("spam_confirmed", EventCategory::SocialNegative, -4),
            ("vote_cast", EventCategory::Civic, 3),
            ("course_completed", EventCategory::Skill, 4),
            ("quest_completed", EventCategory::Quest, 5),
            ("chargeback_filed", EventCategory::RiskNegative, -10),
            ("fraud_confirmed", EventCategory::RiskNegative, -25),
        ];
        for (event_type, category, delta) in mappings {
            event_mappings.insert(event_type.to_string(), (category, delta));
        }

        let mut tier_privileges = HashMap::new();
        for tier in CreditTier::all() {
            tier_privileges.insert(tier, default_privileges(tier));
        }

        Self {
            category_weights,
            event_mappings,
            tier_privileges,
            treasury: TreasuryConfig::default(),
            quest_thresholds: QuestThresholds::default(),
            quest_catalogue: quest_catalogue(),
        }
    }
}

/// Shared handle to the current rules snapshot.
///
/// Readers clone the `Arc` out; a reload stores a whole new snapshot. The
/// lock is held only for the pointer swap, never across I/O.
#[derive(Debug, Clone)]
pub struct RulesHandle {
    inner: Arc<RwLock<Arc<RulesSnapshot>>>,
}

impl RulesHandle {
    pub fn new(snapshot: RulesSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Current snapshot; cheap, just an Arc clone.
    pub fn load(&self) -> Arc<RulesSnapshot> {
        self.inner.read().expect("rules lock poisoned").clone()
    }

    /// Atomically replace the snapshot.
    pub fn store(&self, snapshot: RulesSnapshot) {
        *self.inner.write().expect("rules lock poisoned") = Arc::new(snapshot);
    }
}

impl Default for RulesHandle {
    fn default() -> Self {
        Self::new(RulesSnapshot::default())
    }
}

/// Environment-level configuration knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// User id whose NCR account is the state treasury (may go negative)
    pub ncr_treasury_user_id: i64,
    /// Daily ceiling on NCR minted by quests
    pub treasury_daily_limit: Decimal,
    pub default_tax_rate: Decimal,
    pub auto_approve_threshold: f64,
    pub auto_reject_threshold: f64,
    pub risk_block_threshold: f64,
    /// Streak bonus step per 3 consecutive positive events
    pub streak_step: f64,
    /// Upper bound on the streak multiplier
    pub streak_cap: f64,
    /// Half-life of the abuse risk score, in hours
    pub abuse_half_life_hours: f64,
    /// Time a quest stays open before expiring, in hours
    pub quest_ttl_hours: i64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            ncr_treasury_user_id: 1_000_000,
            treasury_daily_limit: Decimal::new(1000, 0),
            default_tax_rate: Decimal::new(20, 2),
            auto_approve_threshold: 70.0,
            auto_reject_threshold: 30.0,
            risk_block_threshold: 0.7,
            streak_step: 0.05,
            streak_cap: 2.0,
            abuse_half_life_hours: 72.0,
            quest_ttl_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_split_sums_to_one() {
        let cfg = TreasuryConfig::default();
        assert_eq!(cfg.default_rule.split.sum(), dec!(1));
        for rule in cfg.overrides.values() {
            assert_eq!(rule.split.sum(), dec!(1));
        }
    }

    #[test]
    fn test_resolve_override_uppercases() {
        let cfg = TreasuryConfig::default();
        let (rule, matched) = cfg.resolve("flirtmarket", "room_entry");
        assert!(matched);
        assert_eq!(rule.tax_rate, dec!(0.30));

        let (rule, matched) = cfg.resolve("UNKNOWN_APP", "TIP");
        assert!(!matched);
        assert_eq!(rule.tax_rate, dec!(0.20));
    }

    #[test]
    fn test_category_weight_fallback() {
        let snapshot = RulesSnapshot::default();
        let (w, fell_back) = snapshot.category_weight(EventCategory::Civic);
        assert!(!fell_back);
        assert_eq!(w.weight, 1.5);

        let mut sparse = RulesSnapshot::default();
        sparse.category_weights.remove(&EventCategory::Civic);
        let (w, fell_back) = sparse.category_weight(EventCategory::Civic);
        assert!(fell_back);
        assert_eq!(w.weight, 1.0);
    }

    #[test]
    fn test_event_mapping_fallback() {
        let snapshot = RulesSnapshot::default();
        let (category, delta, fell_back) = snapshot.event_mapping("vote_cast");
        assert_eq!(category, EventCategory::Civic);
        assert_eq!(delta, 3);
        assert!(!fell_back);

        let (category, delta, fell_back) = snapshot.event_mapping("never_seen");
        assert_eq!(category, EventCategory::Economic);
        assert_eq!(delta, 1);
        assert!(fell_back);
    }

    #[test]
    fn test_privileges_monotone() {
        let snapshot = RulesSnapshot::default();
        let ghost = snapshot.privileges(CreditTier::Ghost);
        let legend = snapshot.privileges(CreditTier::Legend);
        assert!(legend.withdraw_limit_daily > ghost.withdraw_limit_daily);
        assert!(legend.transaction_fee_discount > ghost.transaction_fee_discount);
        assert!(legend.can_host_rooms && !ghost.can_host_rooms);
    }

    #[test]
    fn test_rules_handle_swap() {
        let handle = RulesHandle::default();
        assert_eq!(handle.load().quest_thresholds.auto_approve, 70.0);

        let mut next = RulesSnapshot::default();
        next.quest_thresholds.auto_approve = 80.0;
        handle.store(next);
        assert_eq!(handle.load().quest_thresholds.auto_approve, 80.0);
    }

    #[test]
    fn test_state_config_defaults() {
        let cfg = StateConfig::default();
        assert_eq!(cfg.treasury_daily_limit, dec!(1000));
        assert_eq!(cfg.default_tax_rate, dec!(0.20));
        assert_eq!(cfg.risk_block_threshold, 0.7);
        assert_eq!(cfg.quest_ttl_hours, 24);
    }
}
