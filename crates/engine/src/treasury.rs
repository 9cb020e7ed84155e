//! Treasury router - revenue splitting
//!
//! Consumes one revenue event, resolves the (app, kind) split config, and
//! emits a composite ledger transaction plus a TreasuryFlow audit row in
//! the same transaction. Rounding dust from the pool cuts is folded into
//! the burn so `gross == net + growth + performer_pool + dev + burn`
//! holds to the digit.

use crate::error::{EngineError, EngineResult};
use crate::ledger::LedgerService;
use crate::services::ServiceContext;
use novastate_core::{
    round_ncr, LedgerEntryKind, Reference, SystemAccountKind, TxLeg, NCR,
};
use novastate_persistence::{NewTreasuryFlow, TreasuryFlowRepo, TreasuryFlowRow};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

/// One monetizable interaction to route.
#[derive(Debug, Clone)]
pub struct RevenueRequest {
    pub app: String,
    pub kind: String,
    pub user_id: i64,
    pub performer_id: Option<i64>,
    pub agency_id: Option<i64>,
    pub gross: Decimal,
    /// Caller reference used for reconciliation and idempotent dedupe
    pub reference: Option<Reference>,
    pub metadata: Option<Value>,
}

/// Treasury Router - splits gross revenue into net, pools, and burn
pub struct TreasuryRouter<'a> {
    ctx: &'a ServiceContext,
    ledger: LedgerService<'a>,
}

impl<'a> TreasuryRouter<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            ledger: LedgerService::new(ctx),
        }
    }

    /// Route one revenue event through the ledger and record its flow.
    pub async fn route_revenue(&self, req: RevenueRequest) -> EngineResult<TreasuryFlowRow> {
        if req.gross <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "gross must be positive: {}",
                req.gross
            )));
        }

        // Idempotent dedupe on the caller reference: the first commit wins
        // and a replay recovers to the stored flow.
        if let Some(reference) = &req.reference {
            if let Some(existing) = TreasuryFlowRepo::find_by_reference(
                self.ctx.pool(),
                &req.app,
                &reference.kind,
                &reference.id,
            )
            .await?
            {
                tracing::warn!(
                    flow_id = %existing.id,
                    app = %req.app,
                    reference = %reference.id,
                    "duplicate revenue reference, returning existing flow"
                );
                return Ok(existing);
            }
        }

        let rules = self.ctx.rules().load();
        let (rule, matched) = rules.treasury.resolve(&req.app, &req.kind);
        if !matched {
            tracing::warn!(
                app = %req.app,
                kind = %req.kind,
                "no treasury override for (app, kind), using default config"
            );
        }

        // A missing performer means the whole gross is taxed.
        let gross = round_ncr(req.gross);
        let (tax, net) = if req.performer_id.is_some() {
            let tax = round_ncr(gross * rule.tax_rate);
            (tax, gross - tax)
        } else {
            (gross, Decimal::ZERO)
        };

        let growth = round_ncr(tax * rule.split.growth);
        let performer_pool = round_ncr(tax * rule.split.performer_pool);
        let dev = round_ncr(tax * rule.split.dev_fund);
        // burn absorbs the rounding dust so the identity holds
        let burn = tax - growth - performer_pool - dev;

        let flow_id = Uuid::new_v4().to_string();
        let flow_reference = Reference::treasury_flow(&flow_id);

        let mut legs = vec![TxLeg::citizen(req.user_id, -gross, LedgerEntryKind::Spend)];
        if let Some(performer_id) = req.performer_id {
            if net > Decimal::ZERO {
                legs.push(TxLeg::citizen(performer_id, net, LedgerEntryKind::Earn));
            }
        }
        for (pool, amount) in [
            (SystemAccountKind::PoolGrowth, growth),
            (SystemAccountKind::PoolPerformer, performer_pool),
            (SystemAccountKind::PoolDev, dev),
        ] {
            if amount > Decimal::ZERO {
                legs.push(TxLeg::system(pool, amount, LedgerEntryKind::Earn));
            }
        }
        if burn > Decimal::ZERO {
            legs.push(TxLeg::system(
                SystemAccountKind::PoolBurn,
                burn,
                LedgerEntryKind::Burn,
            ));
        }

        // Flow row and ledger legs commit together; partial success is
        // impossible.
        let mut tx = self.ctx.begin().await?;
        self.ledger
            .apply_legs(&mut tx, NCR, &legs, &req.app, Some(flow_reference), &flow_id)
            .await?;

        let flow = NewTreasuryFlow {
            id: flow_id.clone(),
            app: req.app.clone(),
            kind: req.kind.clone(),
            user_id: req.user_id,
            performer_id: req.performer_id,
            agency_id: req.agency_id,
            gross,
            tax,
            net_to_performer: net,
            growth_amount: growth,
            performer_pool_amount: performer_pool,
            dev_amount: dev,
            burn_amount: burn,
            reference_id: req.reference.as_ref().map(|r| r.id.clone()),
            reference_type: req.reference.as_ref().map(|r| r.kind.clone()),
            metadata: req.metadata.as_ref().map(|m| m.to_string()),
            created_at: chrono::Utc::now(),
        };

        match TreasuryFlowRepo::insert(&mut *tx, &flow).await {
            Ok(()) => {}
            Err(err) if err.is_unique_violation() => {
                // a concurrent replay won the race; surface its flow
                tx.rollback().await?;
                let reference = req
                    .reference
                    .as_ref()
                    .ok_or_else(|| EngineError::Conflict("duplicate flow id".into()))?;
                let existing = TreasuryFlowRepo::find_by_reference(
                    self.ctx.pool(),
                    &req.app,
                    &reference.kind,
                    &reference.id,
                )
                .await?
                .ok_or_else(|| EngineError::Conflict("duplicate flow vanished".into()))?;
                tracing::warn!(flow_id = %existing.id, "revenue replay lost the race, recovered");
                return Ok(existing);
            }
            Err(err) => return Err(err.into()),
        }
        tx.commit().await?;

        tracing::info!(
            flow_id = %flow_id,
            app = %req.app,
            kind = %req.kind,
            user_id = req.user_id,
            performer_id = ?req.performer_id,
            gross = %gross,
            tax = %tax,
            net_to_performer = %net,
            growth = %growth,
            performer_pool = %performer_pool,
            dev = %dev,
            burn = %burn,
            "revenue routed"
        );

        let record = novastate_persistence::AuditRecord::new(
            self.ctx.audit().next_audit_id(),
            "route_revenue",
            &format!("{}:{} split", req.app, req.kind),
        )
        .with_actor(req.user_id)
        .with_subject(&flow_id)
        .with_amount(&gross.to_string());
        self.ctx.audit().append(&record)?;

        Ok(TreasuryFlowRepo::get_by_id(self.ctx.pool(), &flow_id).await?)
    }
}
