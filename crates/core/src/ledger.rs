//! # Ledger Module
//!
//! Ledger entry kinds, system account kinds, and transaction legs.
//! The ledger itself is append-only double-entry: within one transaction
//! the signed amounts per asset must sum to zero, with BURN terminating
//! into the POOL_BURN sink account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of a single ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Value earned by an account (positive leg)
    Earn,
    /// Value spent by an account (negative leg)
    Spend,
    /// Value destroyed into the burn sink
    Burn,
    /// Incoming side of a transfer
    TransferIn,
    /// Outgoing side of a transfer
    TransferOut,
}

impl LedgerEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryKind::Earn => "earn",
            LedgerEntryKind::Spend => "spend",
            LedgerEntryKind::Burn => "burn",
            LedgerEntryKind::TransferIn => "transfer_in",
            LedgerEntryKind::TransferOut => "transfer_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "earn" => Some(LedgerEntryKind::Earn),
            "spend" => Some(LedgerEntryKind::Spend),
            "burn" => Some(LedgerEntryKind::Burn),
            "transfer_in" => Some(LedgerEntryKind::TransferIn),
            "transfer_out" => Some(LedgerEntryKind::TransferOut),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Singleton system account kinds.
///
/// Each kind owns exactly one ledger account per asset, lazily created on
/// first touch. POOL_BURN is a sink: its balance only ever grows and is
/// exempt from the non-negative floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemAccountKind {
    User,
    Performer,
    AgencyTreasury,
    StateTreasury,
    PoolGrowth,
    PoolPerformer,
    PoolDev,
    PoolBurn,
}

impl SystemAccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemAccountKind::User => "user",
            SystemAccountKind::Performer => "performer",
            SystemAccountKind::AgencyTreasury => "agency_treasury",
            SystemAccountKind::StateTreasury => "state_treasury",
            SystemAccountKind::PoolGrowth => "pool_growth",
            SystemAccountKind::PoolPerformer => "pool_performer",
            SystemAccountKind::PoolDev => "pool_dev",
            SystemAccountKind::PoolBurn => "pool_burn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(SystemAccountKind::User),
            "performer" => Some(SystemAccountKind::Performer),
            "agency_treasury" => Some(SystemAccountKind::AgencyTreasury),
            "state_treasury" => Some(SystemAccountKind::StateTreasury),
            "pool_growth" => Some(SystemAccountKind::PoolGrowth),
            "pool_performer" => Some(SystemAccountKind::PoolPerformer),
            "pool_dev" => Some(SystemAccountKind::PoolDev),
            "pool_burn" => Some(SystemAccountKind::PoolBurn),
            _ => None,
        }
    }

    /// Human label used when the singleton row is first created.
    pub fn label(&self) -> &'static str {
        match self {
            SystemAccountKind::User => "User Account",
            SystemAccountKind::Performer => "Performer Account",
            SystemAccountKind::AgencyTreasury => "Agency Treasury",
            SystemAccountKind::StateTreasury => "State Treasury",
            SystemAccountKind::PoolGrowth => "Growth Pool",
            SystemAccountKind::PoolPerformer => "Performer Pool",
            SystemAccountKind::PoolDev => "Dev Fund Pool",
            SystemAccountKind::PoolBurn => "Burn Sink",
        }
    }

    /// The three accumulating tax pools, in split order.
    pub fn tax_pools() -> [SystemAccountKind; 3] {
        [
            SystemAccountKind::PoolGrowth,
            SystemAccountKind::PoolPerformer,
            SystemAccountKind::PoolDev,
        ]
    }
}

impl fmt::Display for SystemAccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied reconciliation reference carried on every entry.
///
/// Composite operations (a treasury flow, a quest payout) stamp all of
/// their legs with the same reference so they can be reconciled later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub kind: String,
}

impl Reference {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }

    pub fn treasury_flow(flow_id: &str) -> Self {
        Self::new(flow_id, "treasury_flow")
    }

    pub fn quest(quest_uuid: &str) -> Self {
        Self::new(quest_uuid, "user_quest")
    }
}

/// Target of a transaction leg: a citizen account or a system singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegAccount {
    Citizen { user_id: i64 },
    System { kind: SystemAccountKind },
}

/// One leg of an atomic multi-leg ledger transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxLeg {
    pub account: LegAccount,
    /// Signed amount; positive credits, negative debits
    pub amount: Decimal,
    pub kind: LedgerEntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl TxLeg {
    pub fn citizen(user_id: i64, amount: Decimal, kind: LedgerEntryKind) -> Self {
        Self {
            account: LegAccount::Citizen { user_id },
            amount,
            kind,
            metadata: None,
        }
    }

    pub fn system(kind_acct: SystemAccountKind, amount: Decimal, kind: LedgerEntryKind) -> Self {
        Self {
            account: LegAccount::System { kind: kind_acct },
            amount,
            kind,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_kind_round_trip() {
        for kind in [
            LedgerEntryKind::Earn,
            LedgerEntryKind::Spend,
            LedgerEntryKind::Burn,
            LedgerEntryKind::TransferIn,
            LedgerEntryKind::TransferOut,
        ] {
            assert_eq!(LedgerEntryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(LedgerEntryKind::parse("mint"), None);
    }

    #[test]
    fn test_system_kind_round_trip() {
        assert_eq!(
            SystemAccountKind::parse("POOL_BURN"),
            Some(SystemAccountKind::PoolBurn)
        );
        assert_eq!(SystemAccountKind::parse("nope"), None);
        assert_eq!(SystemAccountKind::tax_pools().len(), 3);
    }

    #[test]
    fn test_leg_builders() {
        let leg = TxLeg::citizen(1, dec!(-100), LedgerEntryKind::Spend);
        assert_eq!(leg.account, LegAccount::Citizen { user_id: 1 });
        assert!(leg.metadata.is_none());

        let leg = TxLeg::system(SystemAccountKind::PoolBurn, dec!(2), LedgerEntryKind::Burn)
            .with_metadata(serde_json::json!({"origin": "tip"}));
        assert!(leg.metadata.is_some());
    }

    #[test]
    fn test_reference_helpers() {
        let r = Reference::treasury_flow("abc");
        assert_eq!(r.kind, "treasury_flow");
        let r = Reference::quest("q-1");
        assert_eq!(r.kind, "user_quest");
    }
}
