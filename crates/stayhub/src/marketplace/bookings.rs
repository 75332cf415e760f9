//! Booking lifecycle rules.
//!
//! ```text
//! pending ──► accepted ──► completed
//!    │            └──────► cancelled
//!    └──────► rejected
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{Booking, BookingStatus};
use super::error::MarketplaceError;

impl BookingStatus {
    pub const fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Rejected)
                | (BookingStatus::Accepted, BookingStatus::Completed)
                | (BookingStatus::Accepted, BookingStatus::Cancelled)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }

    /// Statuses an owner may request when deciding on a pending booking.
    pub const fn is_owner_decision(self) -> bool {
        matches!(self, BookingStatus::Accepted | BookingStatus::Rejected)
    }
}

pub(crate) const MOVE_IN_DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_move_in_date(raw: Option<&str>) -> Result<NaiveDate, MarketplaceError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| MarketplaceError::InvalidInput("move-in date is required".to_string()))?;

    NaiveDate::parse_from_str(raw, MOVE_IN_DATE_FORMAT).map_err(|err| {
        MarketplaceError::InvalidInput(format!(
            "move-in date '{raw}' must be formatted as YYYY-MM-DD ({err})"
        ))
    })
}

pub(crate) fn ensure_owner_decision(requested: BookingStatus) -> Result<(), MarketplaceError> {
    if requested.is_owner_decision() {
        Ok(())
    } else {
        Err(MarketplaceError::InvalidInput(format!(
            "status must be accepted or rejected (found {})",
            requested.label()
        )))
    }
}

/// Moves `booking` to `next`, refusing anything outside the lifecycle graph.
pub(crate) fn apply_transition(
    booking: &mut Booking,
    next: BookingStatus,
    now: DateTime<Utc>,
) -> Result<(), MarketplaceError> {
    if !booking.status.can_transition_to(next) {
        return Err(MarketplaceError::InvalidState(format!(
            "booking {} is {} and cannot become {}",
            booking.id.0,
            booking.status.label(),
            next.label()
        )));
    }

    booking.status = next;
    booking.updated_at = now;
    Ok(())
}
