//! # Coupon Code Generator
//!
//! Produces coupon codes that are unique with high probability by combining
//! a caller-supplied sequence value with time-based entropy.
//!
//! ## Uniqueness Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where Uniqueness Is Enforced                         │
//! │                                                                         │
//! │  generate(seq, now)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  "41-5f3a9c01d2b4e"  ← unique with high probability                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO discounts ... ← UNIQUE index on code is the guarantee     │
//! │       │                                                                 │
//! │       ├── ok → done                                                    │
//! │       └── unique violation → caller regenerates and retries            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no atomic collision avoidance here; the unique-`code` index at
//! the persistence boundary is the source of truth and callers retry on a
//! violation (see `DiscountRepository::create` in boxoffice-db).

use chrono::{DateTime, Utc};

/// Generates a coupon code from a sequence value and a timestamp.
///
/// ## Format
/// `{seq}-{micros:013x}`: the sequence value, a dash, and the microsecond
/// timestamp as 13 lowercase hex digits. Two calls in the same microsecond
/// with the same sequence value collide; the insert retry handles that.
///
/// ## Arguments
/// * `seq` - An identity or attempt counter distinguishing concurrent callers
/// * `now` - Current time from the injected clock
///
/// ## Example
/// ```rust
/// use boxoffice_core::codegen::generate;
/// use chrono::Utc;
///
/// let code = generate(7, Utc::now());
/// assert!(code.starts_with("7-"));
/// ```
pub fn generate(seq: u32, now: DateTime<Utc>) -> String {
    format!("{}-{:013x}", seq, now.timestamp_micros())
}

// =============================================================================
// Unit Tests
// =============================================================================
