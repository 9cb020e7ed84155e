//! JSONL audit trail
//!
//! Append-only per-day files recording every state-changing operation:
//! routed revenue, score mutations, quest transitions, HITL decisions.
//! The relational store stays authoritative; this log exists for offline
//! review and the `audit` CLI command.

pub mod reader;
pub mod store;

pub use reader::AuditReader;
pub use store::{AuditLog, AuditRecord};
