//! Ledger service - double-entry account mutations
//!
//! The only code that touches account balances. Multi-leg transactions
//! must sum to zero per asset; single-entry credit/debit exist for the
//! external on/off-ramp edge. Accounts are mutated in ascending id order
//! so concurrent composite operations serialize deterministically.

use crate::error::{EngineError, EngineResult};
use crate::services::ServiceContext;
use novastate_core::ledger::LegAccount;
use novastate_core::{LedgerEntryKind, Reference, SystemAccountKind, TxLeg};
use novastate_persistence::{
    AccountRepo, AccountRow, LedgerEntryRepo, LedgerEntryRow, NewLedgerEntry, SystemAccountRepo,
};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Ledger Service - account balances and append-only entries
pub struct LedgerService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LedgerService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Credit `amount` to a citizen's account (external on-ramp edge).
    pub async fn credit(
        &self,
        user_id: i64,
        asset: &str,
        amount: Decimal,
        kind: LedgerEntryKind,
        source_app: &str,
        reference: Option<Reference>,
        metadata: Option<serde_json::Value>,
    ) -> EngineResult<LedgerEntryRow> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "credit amount must be positive: {amount}"
            )));
        }

        let mut tx = self.ctx.begin().await?;
        let leg = TxLeg {
            account: LegAccount::Citizen { user_id },
            amount,
            kind,
            metadata: metadata.clone(),
        };
        let tx_id = Uuid::new_v4().to_string();
        let mut entries = self
            .apply_legs(&mut tx, asset, std::slice::from_ref(&leg), source_app, reference, &tx_id)
            .await?;
        tx.commit().await?;

        Ok(entries.remove(0))
    }

    /// Debit `amount` from a citizen's account (external off-ramp edge).
    ///
    /// Fails with `InsufficientFunds` when the balance would go negative
    /// on a non-exempt account.
    pub async fn debit(
        &self,
        user_id: i64,
        asset: &str,
        amount: Decimal,
        kind: LedgerEntryKind,
        source_app: &str,
        reference: Option<Reference>,
        metadata: Option<serde_json::Value>,
    ) -> EngineResult<LedgerEntryRow> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "debit amount must be positive: {amount}"
            )));
        }

        let mut tx = self.ctx.begin().await?;
        let leg = TxLeg {
            account: LegAccount::Citizen { user_id },
            amount: -amount,
            kind,
            metadata: metadata.clone(),
        };
        let tx_id = Uuid::new_v4().to_string();
        let mut entries = self
            .apply_legs(&mut tx, asset, std::slice::from_ref(&leg), source_app, reference, &tx_id)
            .await?;
        tx.commit().await?;

        Ok(entries.remove(0))
    }

    /// Apply a multi-leg transaction atomically; all legs or none.
    ///
    /// Returns the transaction id stamped on every entry.
    pub async fn apply_transaction(
        &self,
        asset: &str,
        legs: &[TxLeg],
        source_app: &str,
        reference: Option<Reference>,
    ) -> EngineResult<String> {
        let mut tx = self.ctx.begin().await?;
        let tx_id = Uuid::new_v4().to_string();
        self.apply_legs(&mut tx, asset, legs, source_app, reference, &tx_id)
            .await?;
        tx.commit().await?;
        Ok(tx_id)
    }

    /// Current balance of a citizen's account; zero when untouched.
    pub async fn balance(&self, user_id: i64, asset: &str) -> EngineResult<Decimal> {
        match AccountRepo::get_for_owner(self.ctx.pool(), user_id, asset).await? {
            Some(account) => Ok(account.balance_decimal()?),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Current balance of a system account; zero when untouched.
    pub async fn system_balance(&self, kind: SystemAccountKind) -> EngineResult<Decimal> {
        match SystemAccountRepo::get(self.ctx.pool(), kind).await? {
            Some(system) => {
                let account = AccountRepo::get_by_id(self.ctx.pool(), system.account_id).await?;
                Ok(account.balance_decimal()?)
            }
            None => Ok(Decimal::ZERO),
        }
    }

    // === transaction-scope API used by the treasury and quest engines ===

    /// Apply legs inside an open transaction.
    ///
    /// Multi-leg sets must sum to zero; a single leg is an on/off-ramp
    /// entry and is exempt from the zero-sum check but not from the
    /// balance floor.
    pub(crate) async fn apply_legs(
        &self,
        conn: &mut SqliteConnection,
        asset: &str,
        legs: &[TxLeg],
        source_app: &str,
        reference: Option<Reference>,
        tx_id: &str,
    ) -> EngineResult<Vec<LedgerEntryRow>> {
        if legs.is_empty() {
            return Err(EngineError::Validation("transaction has no legs".into()));
        }

        if legs.len() > 1 {
            let sum: Decimal = legs.iter().map(|l| l.amount).sum();
            if !sum.is_zero() {
                return Err(EngineError::Validation(format!(
                    "transaction legs must sum to zero per asset, got {sum}"
                )));
            }
        }

        // Resolve every account first, then mutate in ascending id order.
        let mut resolved: Vec<(AccountRow, &TxLeg)> = Vec::with_capacity(legs.len());
        for leg in legs {
            let account = self.resolve_account(conn, &leg.account, asset).await?;
            resolved.push((account, leg));
        }
        resolved.sort_by_key(|(account, _)| account.id);

        let mut entries = Vec::with_capacity(resolved.len());
        for (account, leg) in resolved {
            let old_balance = account.balance_decimal()?;
            let new_balance = old_balance + leg.amount;

            if new_balance < Decimal::ZERO && !self.floor_exempt(&account) {
                return Err(EngineError::InsufficientFunds {
                    needed: -leg.amount,
                    available: old_balance,
                });
            }

            AccountRepo::update_balance(&mut *conn, account.id, new_balance).await?;

            let entry = NewLedgerEntry {
                tx_id: tx_id.to_string(),
                account_id: account.id,
                amount: leg.amount,
                kind: leg.kind,
                source_app: source_app.to_string(),
                reference_id: reference.as_ref().map(|r| r.id.clone()),
                reference_type: reference.as_ref().map(|r| r.kind.clone()),
                metadata: leg
                    .metadata
                    .as_ref()
                    .map(|m| m.to_string()),
                created_at: chrono::Utc::now(),
            };
            entries.push(LedgerEntryRepo::insert(&mut *conn, &entry).await?);
        }

        Ok(entries)
    }

    /// Accounts allowed below zero: the burn sink and the state treasury.
    fn floor_exempt(&self, account: &AccountRow) -> bool {
        account.kind == SystemAccountKind::PoolBurn.as_str()
            || account.owner_id == Some(self.ctx.config().ncr_treasury_user_id)
    }

    /// Get or lazily create the account behind a leg.
    pub(crate) async fn resolve_account(
        &self,
        conn: &mut SqliteConnection,
        target: &LegAccount,
        asset: &str,
    ) -> EngineResult<AccountRow> {
        match target {
            LegAccount::Citizen { user_id } => {
                if let Some(account) =
                    AccountRepo::get_for_owner(&mut *conn, *user_id, asset).await?
                {
                    return Ok(account);
                }
                Ok(AccountRepo::insert(&mut *conn, Some(*user_id), asset, "user").await?)
            }
            LegAccount::System { kind } => self.system_account(conn, *kind, asset).await,
        }
    }

    /// Get or lazily create a system singleton account.
    pub(crate) async fn system_account(
        &self,
        conn: &mut SqliteConnection,
        kind: SystemAccountKind,
        asset: &str,
    ) -> EngineResult<AccountRow> {
        if let Some(system) = SystemAccountRepo::get(&mut *conn, kind).await? {
            return Ok(AccountRepo::get_by_id(&mut *conn, system.account_id).await?);
        }

        // The state treasury rides on the configured treasury user's own
        // account; the pools are ownerless singletons.
        let account = if kind == SystemAccountKind::StateTreasury {
            let owner = self.ctx.config().ncr_treasury_user_id;
            match AccountRepo::get_for_owner(&mut *conn, owner, asset).await? {
                Some(existing) => existing,
                None => AccountRepo::insert(&mut *conn, Some(owner), asset, kind.as_str()).await?,
            }
        } else {
            AccountRepo::insert(&mut *conn, None, asset, kind.as_str()).await?
        };

        SystemAccountRepo::insert(&mut *conn, kind, account.id).await?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_users, test_context};
    use novastate_core::NCR;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_credit_debit_round_trip() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let ledger = LedgerService::new(&ctx);

        ledger
            .credit(1, NCR, dec!(100), LedgerEntryKind::Earn, "onramp", None, None)
            .await
            .unwrap();
        assert_eq!(ledger.balance(1, NCR).await.unwrap(), dec!(100));

        ledger
            .debit(1, NCR, dec!(30), LedgerEntryKind::Spend, "offramp", None, None)
            .await
            .unwrap();
        assert_eq!(ledger.balance(1, NCR).await.unwrap(), dec!(70));
    }

    #[tokio::test]
    async fn test_debit_insufficient_funds() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let ledger = LedgerService::new(&ctx);

        ledger
            .credit(1, NCR, dec!(10), LedgerEntryKind::Earn, "onramp", None, None)
            .await
            .unwrap();

        let err = ledger
            .debit(1, NCR, dec!(50), LedgerEntryKind::Spend, "offramp", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        // balance untouched after the failed transaction
        assert_eq!(ledger.balance(1, NCR).await.unwrap(), dec!(10));
    }

    #[tokio::test]
    async fn test_transaction_zero_sum_enforced() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1, 2]).await;
        let ledger = LedgerService::new(&ctx);

        let legs = vec![
            TxLeg::citizen(1, dec!(-10), LedgerEntryKind::TransferOut),
            TxLeg::citizen(2, dec!(5), LedgerEntryKind::TransferIn),
        ];
        let err = ledger
            .apply_transaction(NCR, &legs, "transfer", None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_transaction_atomic_rollback() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1, 2]).await;
        let ledger = LedgerService::new(&ctx);

        ledger
            .credit(1, NCR, dec!(5), LedgerEntryKind::Earn, "onramp", None, None)
            .await
            .unwrap();

        // sender lacks funds, so neither leg may persist
        let legs = vec![
            TxLeg::citizen(1, dec!(-50), LedgerEntryKind::TransferOut),
            TxLeg::citizen(2, dec!(50), LedgerEntryKind::TransferIn),
        ];
        let err = ledger
            .apply_transaction(NCR, &legs, "transfer", None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        assert_eq!(ledger.balance(1, NCR).await.unwrap(), dec!(5));
        assert_eq!(ledger.balance(2, NCR).await.unwrap(), dec!(0));
        assert_eq!(
            novastate_persistence::LedgerEntryRepo::count(ctx.pool()).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_transfer_with_reference() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1, 2]).await;
        let ledger = LedgerService::new(&ctx);

        ledger
            .credit(1, NCR, dec!(100), LedgerEntryKind::Earn, "onramp", None, None)
            .await
            .unwrap();

        let legs = vec![
            TxLeg::citizen(1, dec!(-40), LedgerEntryKind::TransferOut),
            TxLeg::citizen(2, dec!(40), LedgerEntryKind::TransferIn),
        ];
        let tx_id = ledger
            .apply_transaction(NCR, &legs, "p2p", Some(Reference::new("xfer-1", "transfer")))
            .await
            .unwrap();

        let entries = novastate_persistence::LedgerEntryRepo::get_by_tx(ctx.pool(), &tx_id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        let sum: Decimal = entries
            .iter()
            .map(|e| e.amount_decimal().unwrap())
            .sum();
        assert_eq!(sum, Decimal::ZERO);
        assert!(entries.iter().all(|e| e.reference_id.as_deref() == Some("xfer-1")));
    }

    #[tokio::test]
    async fn test_state_treasury_may_go_negative() {
        let (ctx, _dir) = test_context().await;
        seed_users(&ctx, &[1]).await;
        let ledger = LedgerService::new(&ctx);

        // mint: treasury goes negative, citizen receives
        let legs = vec![
            TxLeg::system(
                SystemAccountKind::StateTreasury,
                dec!(-25),
                LedgerEntryKind::TransferOut,
            ),
            TxLeg::citizen(1, dec!(25), LedgerEntryKind::Earn),
        ];
        ledger
            .apply_transaction(NCR, &legs, "quest_reward", None)
            .await
            .unwrap();

        assert_eq!(ledger.balance(1, NCR).await.unwrap(), dec!(25));
        assert_eq!(
            ledger
                .system_balance(SystemAccountKind::StateTreasury)
                .await
                .unwrap(),
            dec!(-25)
        );
    }

    #[tokio::test]
    async fn test_pool_accounts_created_lazily() {
        let (ctx, _dir) = test_context().await;
        let ledger = LedgerService::new(&ctx);

        assert_eq!(
            ledger.system_balance(SystemAccountKind::PoolGrowth).await.unwrap(),
            dec!(0)
        );

        let mut tx = ctx.begin().await.unwrap();
        let account = ledger
            .system_account(&mut tx, SystemAccountKind::PoolGrowth, NCR)
            .await
            .unwrap();
        // second resolve returns the same singleton
        let again = ledger
            .system_account(&mut tx, SystemAccountKind::PoolGrowth, NCR)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(account.id, again.id);
    }
}
