//! # Abuse Module
//!
//! Abuse signal types and the risk curves consulted by the quest reward
//! calculator and HITL triage. The per-user profile itself lives in the
//! store; this module holds the pure math.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of abuse signals fed into a citizen's risk profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbuseEventType {
    /// Proofs submitted faster than a human plausibly could
    RapidSubmission,
    /// Same proof reference seen across quests or users
    DuplicateProof,
    /// Repeated auto-rejected submissions
    LowQualitySpam,
    /// Flag raised by a moderator or the HITL arbiter
    ManualFlag,
    /// Quest rejected during review
    QuestRejected,
    /// Payment reversal on routed revenue
    Chargeback,
}

impl AbuseEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbuseEventType::RapidSubmission => "rapid_submission",
            AbuseEventType::DuplicateProof => "duplicate_proof",
            AbuseEventType::LowQualitySpam => "low_quality_spam",
            AbuseEventType::ManualFlag => "manual_flag",
            AbuseEventType::QuestRejected => "quest_rejected",
            AbuseEventType::Chargeback => "chargeback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rapid_submission" => Some(AbuseEventType::RapidSubmission),
            "duplicate_proof" => Some(AbuseEventType::DuplicateProof),
            "low_quality_spam" => Some(AbuseEventType::LowQualitySpam),
            "manual_flag" => Some(AbuseEventType::ManualFlag),
            "quest_rejected" => Some(AbuseEventType::QuestRejected),
            "chargeback" => Some(AbuseEventType::Chargeback),
            _ => None,
        }
    }

    /// Relative weight of this signal when folded into the risk score.
    pub fn weight(&self) -> f64 {
        match self {
            AbuseEventType::RapidSubmission => 0.6,
            AbuseEventType::DuplicateProof => 0.8,
            AbuseEventType::LowQualitySpam => 0.5,
            AbuseEventType::ManualFlag => 1.0,
            AbuseEventType::QuestRejected => 0.7,
            AbuseEventType::Chargeback => 1.0,
        }
    }
}

impl fmt::Display for AbuseEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity attached to a risk flag raised by a moderator or detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskSeverity::Low => "low",
            RiskSeverity::Medium => "medium",
            RiskSeverity::High => "high",
            RiskSeverity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(RiskSeverity::Low),
            "medium" | "med" => Some(RiskSeverity::Medium),
            "high" => Some(RiskSeverity::High),
            "critical" => Some(RiskSeverity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for RiskSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exponential decay factor for a risk score after `elapsed_hours`.
///
/// Half-life decay: after one half-life the score halves.
pub fn decay_factor(elapsed_hours: f64, half_life_hours: f64) -> f64 {
    if elapsed_hours <= 0.0 || half_life_hours <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(elapsed_hours / half_life_hours)
}

/// Piecewise risk factor used for reward damping.
///
/// Zero below 0.3, linear to 0.7 at risk 0.7, linear to 0.9 at risk 0.9,
/// saturated at 0.9 beyond. The reward multiplier is `1 - risk_factor`,
/// so low-risk citizens see no damping at all.
pub fn risk_factor(risk_score: f64) -> f64 {
    let r = risk_score.clamp(0.0, 1.0);
    if r < 0.3 {
        0.0
    } else if r < 0.7 {
        (r - 0.3) / (0.7 - 0.3) * 0.7
    } else if r < 0.9 {
        0.7 + (r - 0.7) / (0.9 - 0.7) * (0.9 - 0.7)
    } else {
        0.9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abuse_type_round_trip() {
        for t in [
            AbuseEventType::RapidSubmission,
            AbuseEventType::DuplicateProof,
            AbuseEventType::LowQualitySpam,
            AbuseEventType::ManualFlag,
            AbuseEventType::QuestRejected,
            AbuseEventType::Chargeback,
        ] {
            assert_eq!(AbuseEventType::parse(t.as_str()), Some(t));
            assert!(t.weight() > 0.0 && t.weight() <= 1.0);
        }
        assert_eq!(AbuseEventType::parse("unknown"), None);
    }

    #[test]
    fn test_severity_parse_aliases() {
        assert_eq!(RiskSeverity::parse("MED"), Some(RiskSeverity::Medium));
        assert_eq!(RiskSeverity::parse("critical"), Some(RiskSeverity::Critical));
    }

    #[test]
    fn test_decay_factor() {
        assert_eq!(decay_factor(0.0, 72.0), 1.0);
        assert!((decay_factor(72.0, 72.0) - 0.5).abs() < 1e-12);
        assert!((decay_factor(144.0, 72.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_risk_factor_curve() {
        // no damping at low risk
        assert_eq!(risk_factor(0.0), 0.0);
        assert_eq!(risk_factor(0.1), 0.0);
        assert_eq!(risk_factor(0.29), 0.0);
        // linear midsection reaching 0.7 at risk 0.7
        assert!((risk_factor(0.5) - 0.35).abs() < 1e-12);
        assert!((risk_factor(0.7) - 0.7).abs() < 1e-12);
        // saturation at 0.9
        assert!((risk_factor(0.9) - 0.9).abs() < 1e-12);
        assert_eq!(risk_factor(1.0), 0.9);
        // monotone
        assert!(risk_factor(0.4) < risk_factor(0.6));
        assert!(risk_factor(0.75) < risk_factor(0.85));
    }
}
