//! # Validation Module
//!
//! Configuration validation for discounts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Administration boundary                                      │
//! │  └── THIS MODULE: reject malformed discounts before they are saved     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── UNIQUE constraint on code                                         │
//! │  └── NOT NULL constraints                                              │
//! │                                                                         │
//! │  The redemption pipeline (rules.rs) is NOT a layer here: it assumes    │
//! │  stored discounts are well-formed and only evaluates eligibility.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Discount;

/// Maximum accepted coupon code length.
pub const MAX_CODE_LENGTH: usize = 255;

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 255 characters
///
/// No charset restriction: codes are matched byte-exactly, so any
/// customised code an administrator can type is a valid code.
///
/// ## Example
/// ```rust
/// use boxoffice_core::validation::validate_code;
///
/// assert!(validate_code("SUMMER-10").is_ok());
/// assert!(validate_code("").is_err());
/// ```
pub fn validate_code(code: &str) -> ConfigResult<()> {
    if code.is_empty() {
        return Err(ConfigError::Required { field: "code" });
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(ConfigError::TooLong {
            field: "code",
            max: MAX_CODE_LENGTH,
        });
    }

    Ok(())
}

/// Validates a discount amount.
///
/// ## Rules
/// - Must be non-negative
/// - Zero is allowed (a no-op coupon is odd but not invalid)
pub fn validate_amount(amount: i64) -> ConfigResult<()> {
    if amount < 0 {
        return Err(ConfigError::Negative { field: "amount" });
    }

    Ok(())
}

/// Validates a usage cap.
///
/// ## Rules
/// - `-1` means unlimited and is valid
/// - Anything else must be non-negative
pub fn validate_max_uses(max_uses: i64) -> ConfigResult<()> {
    if max_uses < -1 {
        return Err(ConfigError::Negative { field: "max_uses" });
    }

    Ok(())
}

/// Validates a redemption window.
///
/// When both bounds are set, `valid_from` must be strictly before
/// `valid_till`. An inverted window never matches any instant, which the
/// pipeline deliberately does not detect; catching it here keeps such
/// discounts from being saved at all.
pub fn validate_window(
    valid_from: Option<DateTime<Utc>>,
    valid_till: Option<DateTime<Utc>>,
) -> ConfigResult<()> {
    if let (Some(from), Some(till)) = (valid_from, valid_till) {
        if from >= till {
            return Err(ConfigError::InvalidWindow);
        }
    }

    Ok(())
}

/// Validates a whole discount configuration.
///
/// ## Usage
/// Called by the administration boundary (and the repository's create path)
/// before a discount is written.
pub fn validate_discount(discount: &Discount) -> ConfigResult<()> {
    validate_code(&discount.code)?;
    validate_amount(discount.amount)?;
    validate_max_uses(discount.max_uses)?;
    validate_window(discount.valid_from, discount.valid_till)?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("SUMMER-10").is_ok());
        assert!(validate_code("5f3a9c01d2b4e").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0).is_ok());
        assert!(validate_amount(1500).is_ok());
        assert!(validate_amount(-1).is_err());
    }

    #[test]
    fn test_validate_max_uses() {
        assert!(validate_max_uses(-1).is_ok()); // unlimited
        assert!(validate_max_uses(0).is_ok());
        assert!(validate_max_uses(10).is_ok());
        assert!(validate_max_uses(-2).is_err());
    }

    #[test]
    fn test_validate_window() {
        let now = Utc::now();
        let later = now + Duration::days(7);

        assert!(validate_window(None, None).is_ok());
        assert!(validate_window(Some(now), None).is_ok());
        assert!(validate_window(None, Some(later)).is_ok());
        assert!(validate_window(Some(now), Some(later)).is_ok());

        assert_eq!(
            validate_window(Some(later), Some(now)),
            Err(ConfigError::InvalidWindow)
        );
        // Empty window (from == till) is also rejected
        assert_eq!(
            validate_window(Some(now), Some(now)),
            Err(ConfigError::InvalidWindow)
        );
    }

    #[test]
    fn test_validate_discount() {
        let now = Utc::now();
        let mut discount = Discount::new("abc", now);
        assert!(validate_discount(&discount).is_ok());

        discount.amount = -500;
        assert!(validate_discount(&discount).is_err());
    }
}
