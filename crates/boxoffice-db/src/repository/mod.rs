//! # Repositories
//!
//! Repository implementations for database access.
//!
//! ## Repository Pattern
//! Each repository:
//! - Owns a cloned `SqlitePool` (cheap, Arc-backed)
//! - Exposes typed async methods instead of raw SQL
//! - Maps sqlx errors into [`crate::error::DbError`]
//!
//! ## Available Repositories
//! - [`discount::DiscountRepository`] - Coupon CRUD with code generation
//! - [`redemption::RedemptionRepository`] - Snapshot queries and the atomic
//!   redeem operation

pub mod discount;
pub mod redemption;
