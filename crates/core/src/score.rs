//! # Score Module
//!
//! CitizenScore aggregate and the pure math around it: tier table, score
//! clamps, streak multiplier, and risk-level buckets. The credit engine
//! owns the mutation; everything here is side-effect free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of a citizen score.
pub const SCORE_MIN: i64 = 0;
/// Upper bound of a citizen score.
pub const SCORE_MAX: i64 = 1000;
/// Score every citizen starts from.
pub const SCORE_DEFAULT: i64 = 500;

/// Tier bucket of the NovaCredit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTier {
    /// [0, 199]
    Ghost,
    /// [200, 399]
    Grey,
    /// [400, 699]
    Solid,
    /// [700, 899]
    Elite,
    /// [900, 1000]
    Legend,
}

impl CreditTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditTier::Ghost => "ghost",
            CreditTier::Grey => "grey",
            CreditTier::Solid => "solid",
            CreditTier::Elite => "elite",
            CreditTier::Legend => "legend",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ghost" => Some(CreditTier::Ghost),
            "grey" => Some(CreditTier::Grey),
            "solid" => Some(CreditTier::Solid),
            "elite" => Some(CreditTier::Elite),
            "legend" => Some(CreditTier::Legend),
            _ => None,
        }
    }

    /// Tier of a (clamped) score.
    pub fn of(score: i64) -> Self {
        match clamp_score(score) {
            0..=199 => CreditTier::Ghost,
            200..=399 => CreditTier::Grey,
            400..=699 => CreditTier::Solid,
            700..=899 => CreditTier::Elite,
            _ => CreditTier::Legend,
        }
    }

    /// Inclusive score range of this tier.
    pub fn range(&self) -> (i64, i64) {
        match self {
            CreditTier::Ghost => (0, 199),
            CreditTier::Grey => (200, 399),
            CreditTier::Solid => (400, 699),
            CreditTier::Elite => (700, 899),
            CreditTier::Legend => (900, 1000),
        }
    }

    /// The next tier up, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            CreditTier::Ghost => Some(CreditTier::Grey),
            CreditTier::Grey => Some(CreditTier::Solid),
            CreditTier::Solid => Some(CreditTier::Elite),
            CreditTier::Elite => Some(CreditTier::Legend),
            CreditTier::Legend => None,
        }
    }

    pub fn all() -> [CreditTier; 5] {
        [
            CreditTier::Ghost,
            CreditTier::Grey,
            CreditTier::Solid,
            CreditTier::Elite,
            CreditTier::Legend,
        ]
    }
}

impl fmt::Display for CreditTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk bucket derived from a profile's risk_score by quartile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Quartile bucket of a risk score in [0, 1].
    pub fn of(risk_score: f64) -> Self {
        if risk_score < 0.25 {
            RiskLevel::Low
        } else if risk_score < 0.5 {
            RiskLevel::Medium
        } else if risk_score < 0.75 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clamp a score into [SCORE_MIN, SCORE_MAX].
pub fn clamp_score(score: i64) -> i64 {
    score.clamp(SCORE_MIN, SCORE_MAX)
}

/// Clamp a unit-interval value (risk, reputation) into [0, 1].
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Streak multiplier applied to positive-weighted deltas.
///
/// Monotone non-decreasing step function: 1.0 at streak 0, +0.05 for every
/// 3 consecutive positive events, capped at 2.0. Evaluated on the streak
/// value before the current event's own increment.
pub fn streak_multiplier(positive_streak: i64, step: f64, cap: f64) -> f64 {
    let steps = (positive_streak.max(0) / 3) as f64;
    (1.0 + steps * step).min(cap)
}

/// Per-citizen behavior score aggregate.
///
/// Exactly one row per user, created lazily on the first behavior event and
/// mutated in place by the credit engine under a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitizenScore {
    pub user_id: i64,
    /// NovaCredit in [0, 1000]
    pub nova_credit: i64,
    pub tier: CreditTier,
    /// Accumulated risk in [0, 1]
    pub risk_score: f64,
    /// Reputation in [0, 1]
    pub reputation_score: f64,
    pub positive_streak: i64,
    pub negative_streak: i64,
    pub total_positive_events: i64,
    pub total_negative_events: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_positive_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_negative_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CitizenScore {
    /// Fresh score for a citizen seen for the first time.
    pub fn initial(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            nova_credit: SCORE_DEFAULT,
            tier: CreditTier::of(SCORE_DEFAULT),
            risk_score: 0.0,
            reputation_score: 0.5,
            positive_streak: 0,
            negative_streak: 0,
            total_positive_events: 0,
            total_negative_events: 0,
            last_positive_at: None,
            last_negative_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Progress through the current tier, in [0, 1].
    pub fn progress_to_next_tier(&self) -> f64 {
        let (lo, hi) = self.tier.range();
        if hi == lo {
            return 1.0;
        }
        (self.nova_credit - lo) as f64 / (hi - lo) as f64
    }

    /// Credits still needed to reach the next tier, 0 at LEGEND.
    pub fn credit_to_next_tier(&self) -> i64 {
        match self.tier.next() {
            Some(next) => (next.range().0 - self.nova_credit).max(0),
            None => 0,
        }
    }

    /// Streak bookkeeping after a delta has been applied.
    ///
    /// Positive and negative streaks are mutually exclusive; a zero delta
    /// leaves both untouched.
    pub fn update_streaks(&mut self, delta: i64, now: DateTime<Utc>) {
        if delta > 0 {
            self.positive_streak += 1;
            self.negative_streak = 0;
            self.total_positive_events += 1;
            self.last_positive_at = Some(now);
        } else if delta < 0 {
            self.negative_streak += 1;
            self.positive_streak = 0;
            self.total_negative_events += 1;
            self.last_negative_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table() {
        assert_eq!(CreditTier::of(0), CreditTier::Ghost);
        assert_eq!(CreditTier::of(199), CreditTier::Ghost);
        assert_eq!(CreditTier::of(200), CreditTier::Grey);
        assert_eq!(CreditTier::of(399), CreditTier::Grey);
        assert_eq!(CreditTier::of(400), CreditTier::Solid);
        assert_eq!(CreditTier::of(699), CreditTier::Solid);
        assert_eq!(CreditTier::of(700), CreditTier::Elite);
        assert_eq!(CreditTier::of(899), CreditTier::Elite);
        assert_eq!(CreditTier::of(900), CreditTier::Legend);
        assert_eq!(CreditTier::of(1000), CreditTier::Legend);
    }

    #[test]
    fn test_tier_of_clamps() {
        assert_eq!(CreditTier::of(-50), CreditTier::Ghost);
        assert_eq!(CreditTier::of(5000), CreditTier::Legend);
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in CreditTier::all() {
            assert_eq!(CreditTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(CreditTier::parse("mythic"), None);
    }

    #[test]
    fn test_risk_level_quartiles() {
        assert_eq!(RiskLevel::of(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::of(0.24), RiskLevel::Low);
        assert_eq!(RiskLevel::of(0.25), RiskLevel::Medium);
        assert_eq!(RiskLevel::of(0.5), RiskLevel::High);
        assert_eq!(RiskLevel::of(0.75), RiskLevel::Critical);
        assert_eq!(RiskLevel::of(1.0), RiskLevel::Critical);
    }

    #[test]
    fn test_streak_multiplier_baseline() {
        assert_eq!(streak_multiplier(0, 0.05, 2.0), 1.0);
        assert_eq!(streak_multiplier(2, 0.05, 2.0), 1.0);
        assert!((streak_multiplier(3, 0.05, 2.0) - 1.05).abs() < 1e-9);
        assert!((streak_multiplier(9, 0.05, 2.0) - 1.15).abs() < 1e-9);
        // cap
        assert_eq!(streak_multiplier(300, 0.05, 2.0), 2.0);
        // negative streaks never boost
        assert_eq!(streak_multiplier(-5, 0.05, 2.0), 1.0);
    }

    #[test]
    fn test_initial_score() {
        let s = CitizenScore::initial(7);
        assert_eq!(s.nova_credit, 500);
        assert_eq!(s.tier, CreditTier::Solid);
        assert_eq!(s.risk_score, 0.0);
        assert_eq!(s.reputation_score, 0.5);
        assert_eq!(s.positive_streak, 0);
    }

    #[test]
    fn test_streak_exclusivity() {
        let mut s = CitizenScore::initial(1);
        let now = Utc::now();
        s.update_streaks(5, now);
        s.update_streaks(3, now);
        assert_eq!(s.positive_streak, 2);
        assert_eq!(s.negative_streak, 0);

        s.update_streaks(-1, now);
        assert_eq!(s.positive_streak, 0);
        assert_eq!(s.negative_streak, 1);

        // zero delta leaves streaks alone
        s.update_streaks(0, now);
        assert_eq!(s.negative_streak, 1);
        assert_eq!(s.total_positive_events, 2);
        assert_eq!(s.total_negative_events, 1);
    }

    #[test]
    fn test_tier_progress() {
        let mut s = CitizenScore::initial(1);
        s.nova_credit = 699;
        s.tier = CreditTier::of(699);
        assert_eq!(s.credit_to_next_tier(), 1);
        assert!(s.progress_to_next_tier() > 0.99);

        s.nova_credit = 1000;
        s.tier = CreditTier::Legend;
        assert_eq!(s.credit_to_next_tier(), 0);
    }
}
