//! # Domain Types
//!
//! Core domain types for the coupon engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌──────────────────┐  │
//! │  │    Discount     │   │  PriceModification  │   │ReservationContext│  │
//! │  │  ─────────────  │   │  ─────────────────  │   │ ──────────────── │  │
//! │  │  id (UUID)      │   │  id (UUID)          │   │  email           │  │
//! │  │  code (unique)  │   │  discount_id (FK)   │   │  event           │  │
//! │  │  amount         │   │  reservation_id     │   │  attendees       │  │
//! │  │  max_uses       │   │  applied_cents      │   │  order_items     │  │
//! │  │  restrictions   │   │  (frozen forever)   │   │  total_cents     │  │
//! │  └─────────────────┘   └─────────────────────┘   └──────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  DiscountType   │   │    AppliesTo    │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  FixedPrice     │   │  Cart           │                             │
//! │  │  Percentage     │   │  EachTicket     │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A discount has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `code`: the coupon code customers type - human-readable, unique, mutable
//!   by the administration layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Discount Type
// =============================================================================

/// How the discount amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `amount` is a fixed number of cents taken off.
    FixedPrice,
    /// `amount` is a rate in basis points taken off the running total
    /// (1000 bps = 10%).
    Percentage,
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::FixedPrice
    }
}

// =============================================================================
// Applies To
// =============================================================================

/// What a fixed-price discount is applied against.
///
/// Only meaningful for [`DiscountType::FixedPrice`]; a percentage is always
/// calculated over the whole cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    /// Flat amount off the cart, applied once.
    Cart,
    /// Amount multiplied by the number of attendees on the reservation.
    EachTicket,
}

impl Default for AppliesTo {
    fn default() -> Self {
        AppliesTo::Cart
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Number of uses meaning "unlimited redemptions".
pub const UNLIMITED_USES: i64 = -1;

/// Default usage cap for a freshly created discount.
pub const DEFAULT_MAX_USES: i64 = 1;

/// A configured coupon rule: unique code, pricing effect, and eligibility
/// constraints.
///
/// ## Restriction Sets
/// `restricted_events`, `restricted_groups`, and `restricted_ticket_types`
/// are sets of opaque identifiers owned by the surrounding reservation
/// subsystem. An empty set means "no restriction". See [`crate::rules`] for
/// how each set is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The coupon code customers enter. Globally unique, matched
    /// case-sensitively and exactly.
    pub code: String,

    /// Human-readable label. Defaults to the generated code.
    pub title: String,

    /// Free-text note for administrators. Presentation-only.
    pub description: Option<String>,

    /// How `amount` is interpreted.
    pub discount_type: DiscountType,

    /// Cart-level or per-ticket application (fixed-price only).
    pub applies_to: AppliesTo,

    /// Cents for [`DiscountType::FixedPrice`], basis points for
    /// [`DiscountType::Percentage`]. Never negative.
    pub amount: i64,

    /// Usage cap. [`UNLIMITED_USES`] (-1) means unlimited; otherwise a
    /// non-negative cap counted against recorded price modifications.
    pub max_uses: i64,

    /// Redemption window opens strictly after this moment (when set).
    pub valid_from: Option<DateTime<Utc>>,

    /// Redemption window closes strictly before this moment (when set).
    pub valid_till: Option<DateTime<Utc>>,

    /// Allow only one redemption per reservation email.
    pub once_per_email: bool,

    /// Buyable type tags the reservation must contain at least one of.
    pub restricted_ticket_types: Vec<String>,

    /// Group ids at least one attendee's member must belong to.
    pub restricted_groups: Vec<String>,

    /// Event ids the reservation's event must be among.
    pub restricted_events: Vec<String>,

    /// When the discount was created.
    pub created_at: DateTime<Utc>,

    /// When the discount was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Creates a discount with entity defaults: the given (generated) code,
    /// title equal to the code, a usage cap of one, no restrictions.
    ///
    /// The administration layer adjusts fields from there; this crate never
    /// mutates a stored discount.
    pub fn new(code: impl Into<String>, now: DateTime<Utc>) -> Self {
        let code = code.into();
        Discount {
            id: Uuid::new_v4().to_string(),
            title: code.clone(),
            code,
            description: None,
            discount_type: DiscountType::default(),
            applies_to: AppliesTo::default(),
            amount: 0,
            max_uses: DEFAULT_MAX_USES,
            valid_from: None,
            valid_till: None,
            once_per_email: false,
            restricted_ticket_types: Vec::new(),
            restricted_groups: Vec::new(),
            restricted_events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the fixed-price amount as Money.
    ///
    /// Meaningless for percentage discounts, whose `amount` is a rate.
    #[inline]
    pub fn amount_money(&self) -> Money {
        Money::from_cents(self.amount)
    }
}

// =============================================================================
// Price Modification
// =============================================================================

/// Immutable record of one applied discount's effect on one reservation.
///
/// ## Snapshot Pattern
/// `applied_cents` is frozen at the moment of redemption. Editing the
/// discount afterwards never changes what a past reservation paid, and the
/// count of these records per discount IS the discount's "uses" count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceModification {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The discount that was applied.
    pub discount_id: String,

    /// The reservation it was applied to.
    pub reservation_id: String,

    /// Reservation email at redemption time (frozen), queried by the
    /// once-per-email rule.
    pub email: String,

    /// The discount amount that was taken off, in cents (frozen).
    pub applied_cents: i64,

    /// When the redemption happened.
    pub created_at: DateTime<Utc>,
}

impl PriceModification {
    /// Returns the applied amount as Money.
    #[inline]
    pub fn applied_amount(&self) -> Money {
        Money::from_cents(self.applied_cents)
    }
}

// =============================================================================
// Reservation Context
// =============================================================================

/// A registered member an attendee resolves to, with group memberships
/// already looked up by the surrounding subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// Group ids this member belongs to.
    pub groups: Vec<String>,
}

/// A person listed on a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// The registered member this attendee is linked to, if any.
    pub member: Option<Member>,
}

/// A line item on a reservation, referencing a buyable with a type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Identifier of the buyable being purchased.
    pub buyable_id: String,
    /// The buyable's type tag, matched against a discount's restricted
    /// ticket types.
    pub buyable_type: String,
    pub quantity: i64,
}

/// Read view of the reservation a coupon is being validated against.
///
/// This crate never talks to the reservation subsystem directly; the caller
/// assembles this context (resolving members and their groups up front) and
/// persists the recomputed total afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationContext {
    /// Identifier of the reservation, recorded on the snapshot.
    pub reservation_id: String,

    /// Customer email on the reservation.
    pub email: String,

    /// Identifier of the ticketed event this reservation is for.
    pub event: String,

    /// People on the reservation, in order.
    pub attendees: Vec<Attendee>,

    /// Line items on the reservation.
    pub order_items: Vec<OrderItem>,

    /// Current monetary total in cents.
    pub total_cents: i64,

    /// The event has opted out of coupons entirely. When set, callers skip
    /// the pipeline the same way they do for an absent code.
    pub coupons_disabled: bool,
}

impl ReservationContext {
    /// Returns the running total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Number of attendees, used by per-ticket fixed discounts.
    #[inline]
    pub fn attendee_count(&self) -> i64 {
        self.attendees.len() as i64
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
