//! Monthly billing derived from issued orders.
//!
//! Reads orders and items, never mutates them. A bill is a re-computable
//! function of the user's Issued orders whose effective date falls in the
//! month window, priced at generation time.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use pantry_auth::{Actor, Permission, authorize, authorize_owner_or};
use pantry_billing::{
    Billing, BillingDeleted, BillingEvent, BillingGenerated, BillingLine, DeleteBilling,
    GenerateBilling, MonthKey,
};
use pantry_core::{BillingId, ExpectedVersion, PantryItemId, UserId};
use pantry_events::{EventBus, EventEnvelope};
use pantry_inventory::PantryItem;
use pantry_orders::OrderStatus;

use crate::config::{BillingFallback, PantryConfig};
use crate::error::ServiceError;
use crate::identity::IdentityLookup;
use crate::publish::publish_committed;
use crate::store::{BillingStore, InventoryStore, OrderQuery, OrderStore, StoreError};
use crate::views::BillingView;

/// Aggregate type recorded on published billing envelopes.
pub const BILLING_AGGREGATE_TYPE: &str = "billing.billing";

/// Recomputations allowed when the user's orders change mid-generation.
const MAX_GENERATION_ATTEMPTS: u32 = 5;

#[derive(Debug)]
pub struct BillingAggregator<S, B, I> {
    store: S,
    bus: B,
    identity: I,
    fallback: BillingFallback,
    unknown_user_label: String,
}

impl<S, B, I> BillingAggregator<S, B, I> {
    pub fn new(store: S, bus: B, identity: I) -> Self {
        let defaults = PantryConfig::default();
        Self {
            store,
            bus,
            identity,
            fallback: defaults.billing_fallback,
            unknown_user_label: defaults.unknown_user_label,
        }
    }

    pub fn with_config(mut self, config: &PantryConfig) -> Self {
        self.fallback = config.billing_fallback;
        self.unknown_user_label = config.unknown_user_label.clone();
        self
    }

    /// Resolve a free-text month label under the configured fallback policy.
    pub fn resolve_month(&self, label: &str, today: NaiveDate) -> Result<MonthKey, ServiceError> {
        match MonthKey::parse(label) {
            Ok(month) => Ok(month),
            Err(err) => match self.fallback {
                BillingFallback::CurrentMonth => {
                    let month = MonthKey::of(today);
                    tracing::warn!(label, fallback = %month, "unparseable month label, billing current month");
                    Ok(month)
                }
                BillingFallback::Reject => {
                    tracing::warn!(label, "unparseable month label rejected");
                    Err(err.into())
                }
            },
        }
    }
}

impl<S, B, I> BillingAggregator<S, B, I>
where
    S: InventoryStore + OrderStore + BillingStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    I: IdentityLookup,
{
    /// Compute and upsert the bill for one user and month.
    ///
    /// Regenerating with unchanged orders rewrites the same row with the same
    /// total. A month without Issued orders yields a zero bill. A total
    /// computed from orders that changed before the write is discarded and
    /// recomputed, so the stored bill never goes back to an older total.
    #[tracing::instrument(
        skip_all,
        fields(actor = %actor.user_id, user_id = %cmd.user_id, month_label = %cmd.month_label)
    )]
    pub fn generate_for_user_month(&self, actor: &Actor, cmd: GenerateBilling) -> Result<BillingView, ServiceError> {
        authorize(actor, &Permission::BILLING_GENERATE)?;

        let month = self.resolve_month(&cmd.month_label, cmd.occurred_at.date_naive())?;

        let mut attempt = 1;
        let (stored, lines) = loop {
            let revision = self.store.order_revision(cmd.user_id)?;
            let lines = self.billable_lines(cmd.user_id, month)?;
            let billing = Billing::generate(BillingId::new(), cmd.user_id, month, &lines, cmd.occurred_at)?;

            match self.store.upsert_billing(billing, ExpectedVersion::Exact(revision)) {
                Ok(stored) => break (stored, lines),
                Err(StoreError::Conflict(reason)) if attempt < MAX_GENERATION_ATTEMPTS => {
                    tracing::debug!(attempt, %reason, "orders changed while billing, recomputing");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        };

        publish_committed(
            &self.bus,
            BILLING_AGGREGATE_TYPE,
            *stored.id().as_uuid(),
            stored.revision(),
            &[BillingEvent::BillingGenerated(BillingGenerated {
                billing_id: stored.id(),
                user_id: stored.user_id(),
                month,
                total_amount: stored.total_amount(),
                order_count: lines.len(),
                occurred_at: cmd.occurred_at,
            })],
        );

        tracing::info!(
            billing_id = %stored.id(),
            month = %month,
            total = %stored.total_amount(),
            orders = lines.len(),
            revision = stored.revision(),
            "billing generated"
        );
        Ok(self.view(stored))
    }

    /// Every bill, most recently generated first.
    pub fn all_billings(&self, actor: &Actor) -> Result<Vec<BillingView>, ServiceError> {
        authorize(actor, &Permission::BILLING_VIEW_ALL)?;
        Ok(self.views(self.store.list_billings(None)?))
    }

    pub fn billings_for_user(&self, actor: &Actor, user_id: UserId) -> Result<Vec<BillingView>, ServiceError> {
        authorize_owner_or(actor, user_id, &Permission::BILLING_VIEW_ALL)?;
        Ok(self.views(self.store.list_billings(Some(user_id))?))
    }

    pub fn billing_by_id(&self, actor: &Actor, billing_id: BillingId) -> Result<BillingView, ServiceError> {
        let billing = self.store.get_billing(billing_id)?;
        authorize_owner_or(actor, billing.user_id(), &Permission::BILLING_VIEW_ALL)?;
        Ok(self.view(billing))
    }

    #[tracing::instrument(skip_all, fields(actor = %actor.user_id, billing_id = %cmd.billing_id))]
    pub fn delete_billing(&self, actor: &Actor, cmd: DeleteBilling) -> Result<Billing, ServiceError> {
        authorize(actor, &Permission::BILLING_DELETE)?;
        let removed = self.store.delete_billing(cmd.billing_id)?;

        publish_committed(
            &self.bus,
            BILLING_AGGREGATE_TYPE,
            *removed.id().as_uuid(),
            removed.revision() + 1,
            &[BillingEvent::BillingDeleted(BillingDeleted {
                billing_id: removed.id(),
                user_id: removed.user_id(),
                month: removed.month(),
                occurred_at: cmd.occurred_at,
            })],
        );

        tracing::info!(month = %removed.month(), "billing deleted");
        Ok(removed)
    }

    /// Priced lines for the user's Issued orders effective in `month`.
    ///
    /// Orders whose item no longer exists are left out.
    fn billable_lines(&self, user_id: UserId, month: MonthKey) -> Result<Vec<BillingLine>, ServiceError> {
        let orders = self.store.query_orders(
            &OrderQuery::for_user(user_id)
                .with_status(OrderStatus::Issued)
                .effective_in(month),
        )?;

        let mut prices: HashMap<PantryItemId, Option<PantryItem>> = HashMap::new();
        let mut lines = Vec::with_capacity(orders.len());
        for order in &orders {
            let item = match prices.get(&order.item_id()).cloned() {
                Some(cached) => cached,
                None => {
                    let fetched = match self.store.get_item(order.item_id()) {
                        Ok(item) => Some(item),
                        Err(StoreError::NotFound { .. }) => None,
                        Err(err) => return Err(err.into()),
                    };
                    prices.insert(order.item_id(), fetched.clone());
                    fetched
                }
            };

            let Some(item) = item else {
                tracing::warn!(order_id = %order.id_typed(), item_id = %order.item_id(), "issued order references a missing item, not billed");
                continue;
            };

            lines.push(BillingLine {
                order_id: order.id_typed(),
                item_id: item.id(),
                quantity: order.quantity(),
                unit_price: item.unit_price(),
                effective_at: order.effective_date(),
            });
        }
        Ok(lines)
    }

    fn view(&self, billing: Billing) -> BillingView {
        let user_display_name = self
            .identity
            .display_name_or(billing.user_id(), &self.unknown_user_label);
        BillingView {
            billing,
            user_display_name,
        }
    }

    fn views(&self, billings: Vec<Billing>) -> Vec<BillingView> {
        billings.into_iter().map(|b| self.view(b)).collect()
    }
}
