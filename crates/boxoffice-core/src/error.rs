//! # Error Types
//!
//! Domain-specific error types for boxoffice-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  boxoffice-core errors (this file)                                     │
//! │  ├── RedeemError   - A coupon failed one of the redemption rules       │
//! │  └── ConfigError   - A discount's configuration is invalid             │
//! │                                                                         │
//! │  boxoffice-db errors (separate crate)                                  │
//! │  └── DbError       - Database operation failures                       │
//! │                                                                         │
//! │  RedeemError is an EXPECTED outcome: it flows back to the checkout     │
//! │  form as a field error, the reservation stays untouched, and nothing   │
//! │  is logged above debug level.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Errors are enum variants, never String
//! 3. Each variant maps to one rule in the validation pipeline
//! 4. Message text here is developer-facing; customer-facing copy and
//!    localization live in the presentation layer

use thiserror::Error;

// =============================================================================
// Redeem Error
// =============================================================================

/// Why a coupon code was rejected.
///
/// One variant per pipeline rule, in pipeline order. The pipeline
/// short-circuits, so a discount failing several rules reports the first.
/// All variants are recoverable user-facing outcomes, never process-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedeemError {
    /// No discount has a code exactly equal to the input (case-sensitive).
    #[error("coupon code not found")]
    NotFound,

    /// The discount's usage cap is exhausted.
    #[error("coupon is already used")]
    Used,

    /// The current time is outside the discount's validity window.
    #[error("coupon is expired")]
    Expired,

    /// The reservation's event is not among the discount's allowed events.
    #[error("coupon is not allowed on this event")]
    EventNotAllowed,

    /// A once-per-email discount was already redeemed by this email.
    #[error("coupon was already used by this email address")]
    AlreadyUsedByEmail,

    /// No line item on the reservation has an allowed buyable type.
    #[error("the reservation is missing the product this coupon applies to")]
    TicketTypeNotAllowed,

    /// No attendee resolves to a member in an allowed group.
    #[error("none of the attendees is allowed to use this coupon")]
    MemberNotAllowed,
}

impl RedeemError {
    /// The form field every redemption error pertains to. The checkout flow
    /// attaches the error to this field on the reservation form.
    pub const fn field(&self) -> &'static str {
        "coupon_code"
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Invalid discount configuration.
///
/// The administration boundary calls [`crate::validation`] before saving a
/// discount; the redemption pipeline itself assumes configuration is sane
/// and does not re-check it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    /// The validity window is inverted or empty.
    #[error("valid_from must be before valid_till")]
    InvalidWindow,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience alias for pipeline results.
pub type RedeemResult<T> = Result<T, RedeemError>;

/// Convenience alias for configuration validation results.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(RedeemError::NotFound.to_string(), "coupon code not found");
        assert_eq!(RedeemError::Used.to_string(), "coupon is already used");
        assert_eq!(RedeemError::Expired.to_string(), "coupon is expired");
    }

    #[test]
    fn test_all_redeem_errors_target_the_code_field() {
        let errors = [
            RedeemError::NotFound,
            RedeemError::Used,
            RedeemError::Expired,
            RedeemError::EventNotAllowed,
            RedeemError::AlreadyUsedByEmail,
            RedeemError::TicketTypeNotAllowed,
            RedeemError::MemberNotAllowed,
        ];
        for err in errors {
            assert_eq!(err.field(), "coupon_code");
        }
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::Required { field: "code" };
        assert_eq!(err.to_string(), "code is required");

        let err = ConfigError::Negative { field: "amount" };
        assert_eq!(err.to_string(), "amount must not be negative");
    }
}
