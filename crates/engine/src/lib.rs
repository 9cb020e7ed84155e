//! # NovaState Engine
//!
//! The operation layer: every public function here runs as one database
//! transaction that either commits whole or rolls back whole.
//!
//! Dependency arrows run one way: the ledger knows nothing of the
//! treasury; the treasury depends on the ledger; quests depend on ledger,
//! credit, and abuse; the abuse guard depends on nothing above it.
//!
//! - [`services`] - shared [`services::ServiceContext`]
//! - [`ledger`] - double-entry account mutations
//! - [`treasury`] - revenue routing with tax splitting and burns
//! - [`credit`] - citizen-score state machine
//! - [`abuse`] - rolling risk profiles
//! - [`quest`] - daily quest lifecycle
//! - [`hitl`] - human arbitration of borderline quests

pub mod abuse;
pub mod credit;
pub mod error;
#[cfg(test)]
pub(crate) mod testutil;
pub mod hitl;
pub mod ledger;
pub mod quest;
pub mod services;
pub mod treasury;

pub use abuse::{AbuseGuard, AbuseProfile};
pub use credit::{CreditEngine, ProcessOutcome};
pub use error::{EngineError, EngineResult};
pub use hitl::HitlArbiter;
pub use ledger::LedgerService;
pub use quest::{QuestEngine, SubmissionOutcome};
pub use services::ServiceContext;
pub use treasury::{RevenueRequest, TreasuryRouter};
