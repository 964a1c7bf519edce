//! # boxoffice-core: Pure Business Logic for Box Office Coupons
//!
//! This crate is the **heart** of the coupon engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Box Office Coupons Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Checkout flow (reservation subsystem)                │   │
//! │  │    coupon field ──► redeem ──► recompute reservation total     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 boxoffice-db (persistence)                      │   │
//! │  │    find_by_code • count snapshots • atomic redeem transaction  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ boxoffice-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   rules   │  │  pricing  │  │  codegen  │  │   │
//! │  │   │ Discount  │  │ pipeline  │  │ calculator│  │  coupon   │  │   │
//! │  │   │ snapshot  │  │ 7 checks  │  │ 2 branches│  │  codes    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Discount, PriceModification, ReservationContext)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`rules`] - The ordered coupon validation pipeline
//! - [`pricing`] - Total calculation for valid discounts
//! - [`codegen`] - Coupon code generation
//! - [`validation`] - Discount configuration validation
//! - [`clock`] - Injected time source
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - time comes in as
//!    a parameter, stored facts come in as [`rules::UsageFacts`]
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64); percentage
//!    rates are basis points
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use boxoffice_core::money::Money;
//! use boxoffice_core::rules::{validate, UsageFacts};
//! use boxoffice_core::types::{Discount, DiscountType, ReservationContext};
//! use boxoffice_core::pricing;
//! use chrono::Utc;
//!
//! let mut discount = Discount::new("LAUNCH10", Utc::now());
//! discount.discount_type = DiscountType::Percentage;
//! discount.amount = 1_000; // 10%
//! discount.max_uses = -1;
//!
//! let ctx = ReservationContext {
//!     reservation_id: "r1".into(),
//!     email: "ada@example.com".into(),
//!     event: "spring-gala".into(),
//!     attendees: vec![],
//!     order_items: vec![],
//!     total_cents: 10_000,
//!     coupons_disabled: false,
//! };
//!
//! let discount = validate(Some(discount), UsageFacts::default(), &ctx, Utc::now()).unwrap();
//! let applied = pricing::apply(&discount, Money::from_cents(10_000), &ctx);
//! assert_eq!(applied.new_total.cents(), 9_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod codegen;
pub mod error;
pub mod money;
pub mod pricing;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use boxoffice_core::Discount` instead of
// `use boxoffice_core::types::Discount`

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, RedeemError};
pub use money::Money;
pub use pricing::AppliedDiscount;
pub use rules::UsageFacts;
pub use types::*;
