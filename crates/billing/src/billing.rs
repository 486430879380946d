use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pantry_core::{BillingId, DomainError, DomainResult, OrderId, PantryItemId, UserId};
use pantry_events::Event;

use crate::MonthKey;

/// One issued order priced at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingLine {
    pub order_id: OrderId,
    pub item_id: PantryItemId,
    pub quantity: i64,
    pub unit_price: Decimal,
    /// Issued timestamp, else request timestamp.
    pub effective_at: DateTime<Utc>,
}

impl BillingLine {
    pub fn amount(&self) -> DomainResult<Decimal> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| DomainError::validation(format!("amount overflow on order {}", self.order_id)))
    }
}

/// Command: GenerateBilling.
///
/// `month_label` is free text (`Sept-2025`, `2025-09`); it is resolved to a
/// [`MonthKey`] by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateBilling {
    pub user_id: UserId,
    pub month_label: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteBilling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBilling {
    pub billing_id: BillingId,
    pub occurred_at: DateTime<Utc>,
}

/// Per-user, per-month consumption bill.
///
/// At most one exists per (user, month); regenerating replaces the total in
/// place, keeps the id and bumps the revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    id: BillingId,
    user_id: UserId,
    month: MonthKey,
    total_amount: Decimal,
    generated_at: DateTime<Utc>,
    revision: u64,
}

impl Billing {
    /// Price the given lines into a bill for `month`.
    ///
    /// Every line must fall inside the month window and carry a positive
    /// quantity.
    pub fn generate(
        id: BillingId,
        user_id: UserId,
        month: MonthKey,
        lines: &[BillingLine],
        generated_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let total_amount = Self::total_of(month, lines)?;
        Ok(Self {
            id,
            user_id,
            month,
            total_amount,
            generated_at,
            revision: 1,
        })
    }

    /// Sum of `unit_price × quantity` over `lines`. Zero for no lines.
    pub fn total_of(month: MonthKey, lines: &[BillingLine]) -> DomainResult<Decimal> {
        lines.iter().try_fold(Decimal::ZERO, |total, line| {
            if line.quantity <= 0 {
                return Err(DomainError::InvalidQuantity(line.quantity));
            }
            if !month.contains(line.effective_at) {
                return Err(DomainError::validation(format!(
                    "order {} is outside {month}",
                    line.order_id
                )));
            }
            total
                .checked_add(line.amount()?)
                .ok_or_else(|| DomainError::validation("billing total overflow"))
        })
    }

    pub fn id(&self) -> BillingId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Number of times this bill has been generated.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Recomputed bill replacing `previous` for the same (user, month).
    ///
    /// Keeps the previous id so references to the bill stay valid.
    pub fn supersede(self, previous: &Billing) -> Self {
        Self {
            id: previous.id,
            revision: previous.revision + 1,
            ..self
        }
    }
}

/// Event: BillingGenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingGenerated {
    pub billing_id: BillingId,
    pub user_id: UserId,
    pub month: MonthKey,
    pub total_amount: Decimal,
    pub order_count: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BillingDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDeleted {
    pub billing_id: BillingId,
    pub user_id: UserId,
    pub month: MonthKey,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingEvent {
    BillingGenerated(BillingGenerated),
    BillingDeleted(BillingDeleted),
}

impl Event for BillingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BillingEvent::BillingGenerated(_) => "billing.billing.generated",
            BillingEvent::BillingDeleted(_) => "billing.billing.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BillingEvent::BillingGenerated(e) => e.occurred_at,
            BillingEvent::BillingDeleted(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn sep() -> MonthKey {
        MonthKey::new(2025, 9).unwrap()
    }

    fn line(quantity: i64, unit_price: Decimal, day: u32) -> BillingLine {
        BillingLine {
            order_id: OrderId::new(),
            item_id: PantryItemId::new(),
            quantity,
            unit_price,
            effective_at: Utc.with_ymd_and_hms(2025, 9, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let lines = [line(5, dec!(10), 3), line(2, dec!(1.25), 30)];
        let bill = Billing::generate(BillingId::new(), UserId::new(), sep(), &lines, Utc::now()).unwrap();
        assert_eq!(bill.total_amount(), dec!(52.50));
        assert_eq!(bill.month().to_string(), "Sep-2025");
    }

    #[test]
    fn no_lines_means_zero_total() {
        let bill = Billing::generate(BillingId::new(), UserId::new(), sep(), &[], Utc::now()).unwrap();
        assert_eq!(bill.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn lines_outside_the_month_are_rejected() {
        let mut stray = line(1, dec!(1), 1);
        stray.effective_at = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        let err = Billing::total_of(sep(), &[stray]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("outside Sep-2025")));
    }

    #[test]
    fn supersede_keeps_id_and_bumps_revision() {
        let user = UserId::new();
        let first = Billing::generate(BillingId::new(), user, sep(), &[line(1, dec!(3), 2)], Utc::now()).unwrap();
        let second = Billing::generate(BillingId::new(), user, sep(), &[line(2, dec!(3), 2)], Utc::now()).unwrap();

        let stored = second.supersede(&first);
        assert_eq!(stored.id(), first.id());
        assert_eq!(stored.revision(), 2);
        assert_eq!(stored.total_amount(), dec!(6));
    }

    #[test]
    fn event_types_are_namespaced() {
        let event = BillingEvent::BillingDeleted(BillingDeleted {
            billing_id: BillingId::new(),
            user_id: UserId::new(),
            month: sep(),
            occurred_at: Utc::now(),
        });
        assert_eq!(event.event_type(), "billing.billing.deleted");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the total is a function of the line set, not its order.
        #[test]
        fn total_is_order_independent(
            raw in prop::collection::vec((1i64..50, 0i64..10_000, 1u32..=30), 0..20)
        ) {
            let lines: Vec<BillingLine> = raw
                .iter()
                .map(|(q, cents, day)| line(*q, Decimal::new(*cents, 2), *day))
                .collect();
            let mut reversed = lines.clone();
            reversed.reverse();

            let expected: Decimal = raw
                .iter()
                .map(|(q, cents, _)| Decimal::new(*cents, 2) * Decimal::from(*q))
                .sum();

            prop_assert_eq!(Billing::total_of(sep(), &lines).unwrap(), expected);
            prop_assert_eq!(Billing::total_of(sep(), &reversed).unwrap(), expected);
        }
    }
}
