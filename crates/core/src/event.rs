//! # Event Module
//!
//! Behavior events consumed by the credit engine. An event carries who did
//! what, which category it falls under, and the base delta before weighting;
//! opaque JSON context rides along and is never branched on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Category of a behavior event.
///
/// Categories map to weight tuples in the rules snapshot; the delta a
/// citizen actually receives is `base_delta x weight x streak multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Marketplace purchases, tips, trades
    Economic,
    /// Helping others, endorsements, content that gets upvoted
    SocialPositive,
    /// Harassment, spam reports upheld against the actor
    SocialNegative,
    /// Voting, arbitration duty, verified civic actions
    Civic,
    /// Learning paths, tutorials, skill certifications
    Skill,
    /// Quest completions
    Quest,
    /// Fraud signals, chargebacks, moderation strikes
    RiskNegative,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Economic => "economic",
            EventCategory::SocialPositive => "social_positive",
            EventCategory::SocialNegative => "social_negative",
            EventCategory::Civic => "civic",
            EventCategory::Skill => "skill",
            EventCategory::Quest => "quest",
            EventCategory::RiskNegative => "risk_negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "economic" => Some(EventCategory::Economic),
            "social_positive" => Some(EventCategory::SocialPositive),
            "social_negative" => Some(EventCategory::SocialNegative),
            "civic" => Some(EventCategory::Civic),
            "skill" => Some(EventCategory::Skill),
            "quest" => Some(EventCategory::Quest),
            "risk_negative" => Some(EventCategory::RiskNegative),
            _ => None,
        }
    }

    pub fn all() -> [EventCategory; 7] {
        [
            EventCategory::Economic,
            EventCategory::SocialPositive,
            EventCategory::SocialNegative,
            EventCategory::Civic,
            EventCategory::Skill,
            EventCategory::Quest,
            EventCategory::RiskNegative,
        ]
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single behavior event to be scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorEvent {
    /// Citizen the event belongs to
    pub actor_id: i64,
    /// Free-form event type tag (e.g. "tip_sent", "quest_completed")
    pub event_type: String,
    pub category: EventCategory,
    /// Delta before category weight and streak multiplier
    pub base_delta: i64,
    pub source_app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Caller-supplied id used for idempotent dedupe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Opaque context, written through to the score change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl BehaviorEvent {
    pub fn new(
        actor_id: i64,
        event_type: &str,
        category: EventCategory,
        base_delta: i64,
        source_app: &str,
    ) -> Self {
        Self {
            actor_id,
            event_type: event_type.to_string(),
            category,
            base_delta,
            source_app: source_app.to_string(),
            reason: None,
            event_id: None,
            context: None,
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Display for BehaviorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) by {} from {}",
            self.event_type, self.category, self.actor_id, self.source_app
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in EventCategory::all() {
            assert_eq!(EventCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(EventCategory::parse("unknown"), None);
    }

    #[test]
    fn test_event_builder() {
        let event = BehaviorEvent::new(1, "tip_sent", EventCategory::Economic, 2, "flirtmarket")
            .with_reason("tipped a performer")
            .with_event_id("evt-42")
            .with_context(serde_json::json!({"gross": "100"}));

        assert_eq!(event.actor_id, 1);
        assert_eq!(event.event_id.as_deref(), Some("evt-42"));
        assert!(event.context.is_some());
        assert_eq!(
            format!("{}", event),
            "tip_sent (economic) by 1 from flirtmarket"
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = BehaviorEvent::new(9, "vote_cast", EventCategory::Civic, 3, "senate");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"civic\""));
        assert!(!json.contains("reason"));
    }
}
