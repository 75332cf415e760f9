use super::domain::{Booking, BookingStatus, CategoryRatings, RatingCategory, RatingSubmission, Review};
use super::error::MarketplaceError;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

const RATINGS_OUT_OF_RANGE: &str = "all ratings must be between 1 and 5";

/// Checks every category is present and within `MIN_SCORE..=MAX_SCORE`.
pub(crate) fn validate_ratings(
    submission: &RatingSubmission,
) -> Result<CategoryRatings, MarketplaceError> {
    let score = |category: RatingCategory| -> Result<u8, MarketplaceError> {
        submission
            .get(category)
            .filter(|value| (MIN_SCORE..=MAX_SCORE).contains(value))
            .and_then(|value| u8::try_from(value).ok())
            .ok_or_else(|| MarketplaceError::InvalidInput(RATINGS_OUT_OF_RANGE.to_string()))
    };

    Ok(CategoryRatings {
        food: score(RatingCategory::Food)?,
        cleanliness: score(RatingCategory::Cleanliness)?,
        safety: score(RatingCategory::Safety)?,
        owner: score(RatingCategory::Owner)?,
        facilities: score(RatingCategory::Facilities)?,
        study: score(RatingCategory::Study)?,
    })
}

pub(crate) fn validate_text(text: &str, field: &str) -> Result<String, MarketplaceError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MarketplaceError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn ensure_reviewable(booking: &Booking) -> Result<(), MarketplaceError> {
    if booking.status == BookingStatus::Completed {
        Ok(())
    } else {
        Err(MarketplaceError::InvalidState(format!(
            "booking {} is {}; only completed bookings can be reviewed",
            booking.id.0,
            booking.status.label()
        )))
    }
}

pub(crate) fn ensure_no_existing_review(
    booking: &Booking,
    existing: Option<&Review>,
) -> Result<(), MarketplaceError> {
    match existing {
        Some(review) => Err(MarketplaceError::Conflict(format!(
            "booking {} already has review {}",
            booking.id.0, review.id.0
        ))),
        None => Ok(()),
    }
}

pub(crate) fn ensure_reply_open(review: &Review) -> Result<(), MarketplaceError> {
    if review.owner_reply.is_some() {
        Err(MarketplaceError::Conflict(format!(
            "review {} already has an owner reply",
            review.id.0
        )))
    } else {
        Ok(())
    }
}
