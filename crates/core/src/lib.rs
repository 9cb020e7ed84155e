//! # NovaState Core
//!
//! Core domain types for NovaState - the economic and behavioral heart of a
//! citizen-scored virtual state.
//!
//! - [`asset`] - the NCR asset and ledger-scale decimal rounding
//! - [`ledger`] - ledger entry kinds, system accounts, transaction legs
//! - [`score`] - CitizenScore aggregate, tiers, streaks, risk levels
//! - [`event`] - behavior events consumed by the credit engine
//! - [`abuse`] - abuse signal types and the risk damping curve
//! - [`quest`] - quest slots, statuses, and the static catalogue
//! - [`rules`] - the immutable rules snapshot and environment config
//! - [`error`] - core error taxonomy with stable machine codes

pub mod abuse;
pub mod asset;
pub mod error;
pub mod event;
pub mod ledger;
pub mod quest;
pub mod rules;
pub mod score;

pub use abuse::{risk_factor, AbuseEventType, RiskSeverity};
pub use asset::{round_ncr, Asset, LEDGER_SCALE, NCR};
pub use error::{CoreError, CoreResult};
pub use event::{BehaviorEvent, EventCategory};
pub use ledger::{LedgerEntryKind, Reference, SystemAccountKind, TxLeg};
pub use quest::{ProofKind, QuestDefinition, QuestSlot, QuestStatus};
pub use rules::{RulesHandle, RulesSnapshot, StateConfig, TreasuryConfig};
pub use score::{CitizenScore, CreditTier, RiskLevel};
