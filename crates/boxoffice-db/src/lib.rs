//! # boxoffice-db: Persistence Layer for Box Office Coupons
//!
//! This crate provides database access for the coupon engine.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Box Office Coupons Data Flow                         │
//! │                                                                         │
//! │  Checkout flow (coupon field on the reservation form)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   boxoffice-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (discount.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │                │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ DiscountRepo   │    │ 001_init.sql │  │   │
//! │  │   │ WAL, FKs on   │    │ RedemptionRepo │    │ ...          │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │        rules + pricing from boxoffice-core run INSIDE          │   │
//! │  │        the redeem transaction                                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (discount, redemption)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boxoffice_core::SystemClock;
//! use boxoffice_db::{Database, DbConfig, RedeemFailure};
//!
//! let db = Database::new(DbConfig::new("path/to/coupons.db")).await?;
//!
//! // Administration: mint a coupon, then configure it
//! let mut discount = db.discounts().create(&SystemClock).await?;
//! discount.amount = 500;
//! db.discounts().update(&discount).await?;
//!
//! // Checkout: redeem atomically
//! match db.redemptions().redeem(&discount.code, &ctx, &SystemClock).await {
//!     Ok(outcome) => apply_new_total(outcome.new_total),
//!     Err(RedeemFailure::Rejected(e)) => show_coupon_error(e),
//!     Err(RedeemFailure::Db(e)) => return Err(e.into()),
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::discount::DiscountRepository;
pub use repository::redemption::{RedeemFailure, Redemption, RedemptionRepository};
