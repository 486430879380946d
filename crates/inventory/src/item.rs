use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, PantryItemId};

use crate::PantryCategory;

const MAX_NAME_LEN: usize = 100;

/// Catalog input for a new pantry item (validated by [`PantryItem::create`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPantryItem {
    pub name: String,
    pub category: PantryCategory,
    /// Unit price; non-negative with at most two decimal places.
    pub unit_price: Decimal,
    pub quantity: i64,
    /// Last day on which the item may still be handed out.
    pub expiry_date: NaiveDate,
}

/// Entity: PantryItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PantryItem {
    id: PantryItemId,
    name: String,
    category: PantryCategory,
    unit_price: Decimal,
    quantity: i64,
    expiry_date: NaiveDate,
}

impl PantryItem {
    /// Validate catalog input and build the item.
    pub fn create(id: PantryItemId, input: NewPantryItem) -> DomainResult<Self> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }
        if input.unit_price.is_sign_negative() && !input.unit_price.is_zero() {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }
        if input.unit_price.round_dp(2) != input.unit_price {
            return Err(DomainError::validation(
                "unit_price cannot have more than two decimal places",
            ));
        }
        if input.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }

        Ok(Self {
            id,
            name,
            category: input.category,
            unit_price: input.unit_price,
            quantity: input.quantity,
            expiry_date: input.expiry_date,
        })
    }

    pub fn id(&self) -> PantryItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> PantryCategory {
        self.category
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    /// Expired once `today` is past the expiry date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Eligible for new requests: in stock and not expired.
    pub fn is_orderable(&self, today: NaiveDate) -> bool {
        self.quantity > 0 && !self.is_expired(today)
    }

    pub fn can_supply(&self, amount: i64) -> bool {
        amount > 0 && self.quantity >= amount
    }

    /// Check-and-subtract. Leaves the item untouched on failure.
    ///
    /// Returns the new quantity on hand.
    pub fn decrement(&mut self, amount: i64) -> DomainResult<i64> {
        if amount <= 0 {
            return Err(DomainError::InvalidQuantity(amount));
        }
        if self.quantity < amount {
            return Err(DomainError::InsufficientStock {
                available: self.quantity,
                requested: amount,
            });
        }
        self.quantity -= amount;
        Ok(self.quantity)
    }
}

/// Catalog listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    /// Every catalog entry (staff view).
    All,
    /// Items a member may request on `today`: quantity > 0 and not expired.
    Orderable { today: NaiveDate },
}

impl ItemFilter {
    pub fn matches(&self, item: &PantryItem) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Orderable { today } => item.is_orderable(*today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tea(quantity: i64) -> PantryItem {
        PantryItem::create(
            PantryItemId::new(),
            NewPantryItem {
                name: "Tea".to_string(),
                category: PantryCategory::Tea,
                unit_price: dec!(10),
                quantity,
                expiry_date: date(2025, 12, 31),
            },
        )
        .unwrap()
    }

    #[test]
    fn create_trims_and_keeps_fields() {
        let item = PantryItem::create(
            PantryItemId::new(),
            NewPantryItem {
                name: "  Oat Milk ".to_string(),
                category: PantryCategory::Dairy,
                unit_price: dec!(2.49),
                quantity: 12,
                expiry_date: date(2025, 10, 1),
            },
        )
        .unwrap();

        assert_eq!(item.name(), "Oat Milk");
        assert_eq!(item.category(), PantryCategory::Dairy);
        assert_eq!(item.unit_price(), dec!(2.49));
        assert_eq!(item.quantity(), 12);
    }

    #[test]
    fn create_rejects_invalid_input() {
        let base = NewPantryItem {
            name: "Coffee".to_string(),
            category: PantryCategory::Coffee,
            unit_price: dec!(5),
            quantity: 1,
            expiry_date: date(2025, 10, 1),
        };

        let cases = [
            NewPantryItem {
                name: "   ".to_string(),
                ..base.clone()
            },
            NewPantryItem {
                name: "x".repeat(101),
                ..base.clone()
            },
            NewPantryItem {
                unit_price: dec!(-0.01),
                ..base.clone()
            },
            NewPantryItem {
                unit_price: dec!(1.005),
                ..base.clone()
            },
            NewPantryItem {
                quantity: -1,
                ..base.clone()
            },
        ];

        for input in cases {
            let err = PantryItem::create(PantryItemId::new(), input).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "got {err:?}");
        }
    }

    #[test]
    fn free_items_are_allowed() {
        let item = PantryItem::create(
            PantryItemId::new(),
            NewPantryItem {
                name: "Water".to_string(),
                category: PantryCategory::Beverage,
                unit_price: Decimal::ZERO,
                quantity: 3,
                expiry_date: date(2026, 1, 1),
            },
        );
        assert!(item.is_ok());
    }

    #[test]
    fn decrement_subtracts_when_stock_suffices() {
        let mut item = tea(100);
        assert_eq!(item.decrement(5).unwrap(), 95);
        assert_eq!(item.quantity(), 95);
    }

    #[test]
    fn decrement_beyond_stock_fails_without_partial_effect() {
        let mut item = tea(2);
        let err = item.decrement(3).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 2,
                requested: 3
            }
        );
        assert_eq!(item.quantity(), 2);
    }

    #[test]
    fn decrement_rejects_non_positive_amounts() {
        let mut item = tea(2);
        assert_eq!(item.decrement(0), Err(DomainError::InvalidQuantity(0)));
        assert_eq!(item.decrement(-4), Err(DomainError::InvalidQuantity(-4)));
        assert_eq!(item.quantity(), 2);
    }

    #[test]
    fn orderable_filter_excludes_expired_and_empty_items() {
        let today = date(2025, 9, 15);
        let fresh = tea(4);
        let empty = tea(0);
        let mut expired = tea(4);
        expired.expiry_date = date(2025, 9, 14);
        let mut expires_today = tea(4);
        expires_today.expiry_date = today;

        let filter = ItemFilter::Orderable { today };
        assert!(filter.matches(&fresh));
        assert!(!filter.matches(&empty));
        assert!(!filter.matches(&expired));
        assert!(filter.matches(&expires_today));
        assert!(ItemFilter::All.matches(&expired));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: quantity on hand never goes negative, and every
        /// failed decrement leaves the quantity untouched.
        #[test]
        fn quantity_never_goes_negative(
            initial in 0i64..500,
            amounts in prop::collection::vec(-5i64..80, 0..40)
        ) {
            let mut item = tea(initial);
            let mut expected = initial;

            for amount in amounts {
                let before = item.quantity();
                match item.decrement(amount) {
                    Ok(after) => {
                        expected -= amount;
                        prop_assert_eq!(after, expected);
                    }
                    Err(_) => prop_assert_eq!(item.quantity(), before),
                }
                prop_assert!(item.quantity() >= 0);
            }

            prop_assert_eq!(item.quantity(), expected);
        }
    }
}
