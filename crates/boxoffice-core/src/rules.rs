//! # Redemption Rules
//!
//! The ordered rule-evaluation pipeline for coupon codes.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Coupon Validation Pipeline                          │
//! │                                                                         │
//! │  code + ReservationContext + UsageFacts + now                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Lookup          ── none found ──────────► NotFound                 │
//! │  2. UsageLimit      ── cap exhausted ───────► Used                     │
//! │  3. DateWindow      ── outside window ──────► Expired                  │
//! │  4. EventScope      ── event not in set ────► EventNotAllowed          │
//! │  5. OncePerEmail    ── email seen before ───► AlreadyUsedByEmail       │
//! │  6. TicketTypeScope ── no allowed buyable ──► TicketTypeNotAllowed     │
//! │  7. GroupScope      ── no qualifying member ► MemberNotAllowed         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok(discount) → pricing::apply() → snapshot → recompute total          │
//! │                                                                         │
//! │  Checks run in THIS order and short-circuit on the first failure.      │
//! │  An empty/absent code never reaches the pipeline: "no coupon           │
//! │  requested" is not an error.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! The pipeline is a pure function. The two facts that live in the database
//! (how often the discount was redeemed, and whether this email already
//! redeemed it) are fetched by the caller and passed in as [`UsageFacts`],
//! so the persistence layer can gather them and evaluate the rules inside
//! one transaction.

use chrono::{DateTime, Utc};

use crate::error::{RedeemError, RedeemResult};
use crate::types::{Attendee, Discount, OrderItem, ReservationContext, UNLIMITED_USES};

// =============================================================================
// Usage Facts
// =============================================================================

/// Stored facts about a discount's redemption history, fetched by the caller
/// before the pipeline runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageFacts {
    /// Number of price-modification snapshots referencing the discount.
    pub redemption_count: i64,

    /// Whether a snapshot already links the discount to a reservation with
    /// the context's email. Only consulted when `once_per_email` is set.
    pub email_already_used: bool,
}

// =============================================================================
// Per-Rule Predicates
// =============================================================================

impl Discount {
    /// UsageLimit: whether the discount has uses left.
    ///
    /// `max_uses == -1` always passes. Otherwise passes while
    /// `redemption_count <= max_uses`. Note the `<=`: a cap of N admits
    /// N + 1 redemptions in total. That quirk is load-bearing for existing
    /// configurations, so it is kept and pinned by tests rather than
    /// corrected.
    pub fn usage_ok(&self, redemption_count: i64) -> bool {
        if self.max_uses == UNLIMITED_USES {
            return true;
        }

        redemption_count <= self.max_uses
    }

    /// DateWindow: whether `now` falls inside the validity window.
    ///
    /// Both comparisons are strict: a coupon becomes usable the instant
    /// AFTER `valid_from` and stops being usable AT `valid_till`.
    pub fn window_ok(&self, now: DateTime<Utc>) -> bool {
        if let Some(from) = self.valid_from {
            if now <= from {
                return false;
            }
        }

        if let Some(till) = self.valid_till {
            if now >= till {
                return false;
            }
        }

        true
    }

    /// EventScope: whether the reservation's event may use this discount.
    ///
    /// An empty set means no restriction.
    pub fn event_ok(&self, event: &str) -> bool {
        if self.restricted_events.is_empty() {
            return true;
        }

        self.restricted_events.iter().any(|e| e == event)
    }

    /// OncePerEmail: whether this email may (still) use the discount.
    pub fn once_per_email_ok(&self, email_already_used: bool) -> bool {
        if !self.once_per_email {
            return true;
        }

        !email_already_used
    }

    /// TicketTypeScope: whether at least one line item has an allowed
    /// buyable type.
    ///
    /// An empty set means no restriction.
    pub fn ticket_type_ok(&self, order_items: &[OrderItem]) -> bool {
        if self.restricted_ticket_types.is_empty() {
            return true;
        }

        order_items
            .iter()
            .any(|item| self.restricted_ticket_types.iter().any(|t| t == &item.buyable_type))
    }

    /// GroupScope: whether any attendee resolves to a member in an allowed
    /// group.
    ///
    /// An empty set means no restriction and passes even when the
    /// reservation has no attendees at all. With a restriction in place,
    /// attendees are scanned in order and the first qualifying member
    /// passes; attendees without a linked member never qualify.
    pub fn groups_ok(&self, attendees: &[Attendee]) -> bool {
        if self.restricted_groups.is_empty() {
            return true;
        }

        attendees
            .iter()
            .filter_map(|attendee| attendee.member.as_ref())
            .any(|member| {
                member
                    .groups
                    .iter()
                    .any(|group| self.restricted_groups.iter().any(|g| g == group))
            })
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs the ordered rule checks against a looked-up discount.
///
/// `found` is the result of the exact, case-sensitive code lookup; `None`
/// short-circuits with [`RedeemError::NotFound`]. On success the discount is
/// handed back so the caller can price it and record the snapshot.
///
/// The pipeline performs no mutation. Whatever error comes back, the
/// reservation is untouched.
pub fn validate(
    found: Option<Discount>,
    facts: UsageFacts,
    ctx: &ReservationContext,
    now: DateTime<Utc>,
) -> RedeemResult<Discount> {
    let discount = found.ok_or(RedeemError::NotFound)?;

    if !discount.usage_ok(facts.redemption_count) {
        return Err(RedeemError::Used);
    }

    if !discount.window_ok(now) {
        return Err(RedeemError::Expired);
    }

    if !discount.event_ok(&ctx.event) {
        return Err(RedeemError::EventNotAllowed);
    }

    if !discount.once_per_email_ok(facts.email_already_used) {
        return Err(RedeemError::AlreadyUsedByEmail);
    }

    if !discount.ticket_type_ok(&ctx.order_items) {
        return Err(RedeemError::TicketTypeNotAllowed);
    }

    if !discount.groups_ok(&ctx.attendees) {
        return Err(RedeemError::MemberNotAllowed);
    }

    Ok(discount)
}

// =============================================================================
// Unit Tests
// =============================================================================
