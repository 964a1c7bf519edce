//! # Total Calculator
//!
//! Computes the price adjustment for a valid discount.
//!
//! ## The Two Branches
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Discount Pricing                                  │
//! │                                                                         │
//! │  PERCENTAGE                                                             │
//! │    applied = total × bps / 10000                                       │
//! │    new_total = total - applied        ← NOT floored, may go negative   │
//! │                                                                         │
//! │  FIXED_PRICE                                                           │
//! │    EachTicket: applied = amount × attendee_count                       │
//! │    Cart:      applied = amount                                         │
//! │    new_total = max(0, total - applied) ← floored at zero               │
//! │                                                                         │
//! │  The asymmetry (only the fixed branch floors) is long-standing         │
//! │  behavior that downstream accounting relies on. Both branches are      │
//! │  kept distinct and pinned by tests; do not unify them.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The applied amount is what gets frozen onto the PriceModification
//! snapshot: even when flooring kicks in, the snapshot records the full
//! discount value, not the clamped difference.

use crate::money::Money;
use crate::types::{AppliesTo, Discount, DiscountType, ReservationContext};

/// Result of applying a discount to a running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDiscount {
    /// The reservation's total after the discount.
    pub new_total: Money,

    /// The discount value that was applied, as frozen onto the snapshot.
    pub applied_amount: Money,
}

/// Applies a discount to a running total.
///
/// Assumes the discount already passed the validation pipeline; this
/// function is pure arithmetic and never fails.
///
/// ## Example
/// ```rust
/// use boxoffice_core::money::Money;
/// use boxoffice_core::pricing::apply;
/// use boxoffice_core::types::{Discount, DiscountType, ReservationContext};
/// use chrono::Utc;
///
/// let mut discount = Discount::new("TENOFF", Utc::now());
/// discount.discount_type = DiscountType::Percentage;
/// discount.amount = 1_000; // 10%
///
/// let ctx = ReservationContext {
///     reservation_id: "r1".into(),
///     email: "a@example.com".into(),
///     event: "ev".into(),
///     attendees: vec![],
///     order_items: vec![],
///     total_cents: 10_000,
///     coupons_disabled: false,
/// };
///
/// let applied = apply(&discount, Money::from_cents(10_000), &ctx);
/// assert_eq!(applied.applied_amount.cents(), 1_000);
/// assert_eq!(applied.new_total.cents(), 9_000);
/// ```
pub fn apply(
    discount: &Discount,
    running_total: Money,
    ctx: &ReservationContext,
) -> AppliedDiscount {
    match discount.discount_type {
        DiscountType::Percentage => {
            // A percentage is always calculated over the whole cart,
            // regardless of applies_to.
            let applied = running_total.percentage(discount.amount);
            AppliedDiscount {
                new_total: running_total - applied,
                applied_amount: applied,
            }
        }
        DiscountType::FixedPrice => {
            let applied = match discount.applies_to {
                AppliesTo::EachTicket => {
                    discount.amount_money().multiply_quantity(ctx.attendee_count())
                }
                AppliesTo::Cart => discount.amount_money(),
            };
            AppliedDiscount {
                new_total: (running_total - applied).floor_at_zero(),
                applied_amount: applied,
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
