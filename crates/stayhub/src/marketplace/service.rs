use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::access::AccessGuard;
use super::bookings::{apply_transition, ensure_owner_decision, parse_move_in_date};
use super::domain::{
    Actor, Booking, BookingId, BookingRequest, BookingStatus, Listing, ListingId, Review,
    ReviewId, ReviewRequest,
};
use super::error::MarketplaceError;
use super::rating::{CategoryAverage, RatingAggregator, RatingBreakdown};
use super::repository::{
    MarketplaceNotification, MarketplaceStore, NotificationPublisher, RepositoryError,
};
use super::reviews::{
    ensure_no_existing_review, ensure_reply_open, ensure_reviewable, validate_ratings,
    validate_text,
};

/// Service composing the access guard, booking lifecycle, review gate, and rating aggregation.
pub struct MarketplaceService<S, N> {
    store: Arc<S>,
    notifications: Arc<N>,
    guard: AccessGuard,
    aggregator: RatingAggregator,
}

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bkg-{id:06}"))
}

fn next_review_id() -> ReviewId {
    let id = REVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReviewId(format!("rev-{id:06}"))
}

impl<S, N> MarketplaceService<S, N>
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>) -> Self {
        Self {
            store,
            notifications,
            guard: AccessGuard,
            aggregator: RatingAggregator,
        }
    }

    /// Record a new booking request in `pending`.
    pub fn create_booking(
        &self,
        actor: &Actor,
        request: BookingRequest,
    ) -> Result<Booking, MarketplaceError> {
        self.guard.ensure_can_book(actor)?;
        let move_in_date = parse_move_in_date(request.move_in_date.as_deref())?;
        let listing = self.listing(&request.listing_id)?;

        let now = Utc::now();
        let booking = Booking {
            id: next_booking_id(),
            listing_id: listing.id.clone(),
            tenant_id: actor.id.clone(),
            status: BookingStatus::Pending,
            move_in_date,
            notes: request
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_booking(booking)?;
        info!(
            booking_id = %stored.id.0,
            listing_id = %stored.listing_id.0,
            tenant_id = %stored.tenant_id.0,
            "booking requested"
        );

        self.notify(
            MarketplaceNotification::new("booking_requested", &listing.owner_id)
                .with("booking_id", stored.id.0.clone())
                .with("listing_id", listing.id.0.clone())
                .with("move_in_date", stored.move_in_date.to_string()),
        );

        Ok(stored)
    }

    /// Owner decision on a pending booking.
    pub fn transition_booking(
        &self,
        actor: &Actor,
        booking_id: &BookingId,
        requested: BookingStatus,
    ) -> Result<Booking, MarketplaceError> {
        ensure_owner_decision(requested)?;
        let mut booking = self.booking(booking_id)?;
        let listing = self.listing(&booking.listing_id)?;
        self.guard.ensure_listing_owner(actor, &listing)?;

        apply_transition(&mut booking, requested, Utc::now())?;
        self.store.update_booking(booking.clone())?;
        info!(
            booking_id = %booking.id.0,
            status = booking.status.label(),
            "booking decided by owner"
        );

        self.notify(
            MarketplaceNotification::new(
                match requested {
                    BookingStatus::Accepted => "booking_accepted",
                    _ => "booking_rejected",
                },
                &booking.tenant_id,
            )
            .with("booking_id", booking.id.0.clone())
            .with("listing_id", listing.id.0.clone()),
        );

        Ok(booking)
    }

    /// Mark an accepted booking as completed. Reserved for trusted back-office callers.
    pub fn complete_booking(
        &self,
        actor: &Actor,
        booking_id: &BookingId,
    ) -> Result<Booking, MarketplaceError> {
        let mut booking = self.booking(booking_id)?;
        self.guard.ensure_admin(actor)?;

        apply_transition(&mut booking, BookingStatus::Completed, Utc::now())?;
        self.store.update_booking(booking.clone())?;
        info!(booking_id = %booking.id.0, "booking completed");

        self.notify(
            MarketplaceNotification::new("booking_completed", &booking.tenant_id)
                .with("booking_id", booking.id.0.clone()),
        );

        Ok(booking)
    }

    pub fn cancel_booking(
        &self,
        actor: &Actor,
        booking_id: &BookingId,
    ) -> Result<Booking, MarketplaceError> {
        let mut booking = self.booking(booking_id)?;
        self.guard.ensure_can_cancel(actor, &booking)?;

        apply_transition(&mut booking, BookingStatus::Cancelled, Utc::now())?;
        self.store.update_booking(booking.clone())?;
        info!(booking_id = %booking.id.0, cancelled_by = %actor.id.0, "booking cancelled");

        self.notify(
            MarketplaceNotification::new("booking_cancelled", &booking.tenant_id)
                .with("booking_id", booking.id.0.clone()),
        );

        Ok(booking)
    }

    pub fn get_booking(
        &self,
        actor: &Actor,
        booking_id: &BookingId,
    ) -> Result<Booking, MarketplaceError> {
        let booking = self.booking(booking_id)?;
        let listing = self.store.find_listing(&booking.listing_id)?;
        self.guard
            .ensure_can_view_booking(actor, &booking, listing.as_ref())?;
        Ok(booking)
    }

    pub fn bookings_for_listing(
        &self,
        actor: &Actor,
        listing_id: &ListingId,
    ) -> Result<Vec<Booking>, MarketplaceError> {
        let listing = self.listing(listing_id)?;
        self.guard.ensure_can_view_listing_bookings(actor, &listing)?;
        Ok(self.store.bookings_for_listing(listing_id)?)
    }

    /// Create the single review allowed for a completed booking, then refresh the listing
    /// aggregate. A failed refresh is logged and left for the next recompute.
    pub fn create_review(
        &self,
        actor: &Actor,
        request: ReviewRequest,
    ) -> Result<Review, MarketplaceError> {
        let ratings = validate_ratings(&request.ratings)?;
        let text_review = validate_text(&request.text_review, "review text")?;

        let booking = self.booking(&request.booking_id)?;
        self.guard.ensure_booking_tenant(actor, &booking)?;
        ensure_reviewable(&booking)?;
        let existing = self.store.review_for_booking(&booking.id)?;
        ensure_no_existing_review(&booking, existing.as_ref())?;
        let listing = self.listing(&booking.listing_id)?;

        let review = Review {
            id: next_review_id(),
            booking_id: booking.id.clone(),
            listing_id: listing.id.clone(),
            tenant_id: booking.tenant_id.clone(),
            owner_id: listing.owner_id.clone(),
            ratings,
            text_review,
            owner_reply: None,
            replied_at: None,
            created_at: Utc::now(),
        };

        let stored = self.store.insert_review(review).map_err(|err| match err {
            RepositoryError::Conflict => MarketplaceError::Conflict(format!(
                "booking {} already has a review",
                booking.id.0
            )),
            other => MarketplaceError::from(other),
        })?;
        info!(
            review_id = %stored.id.0,
            booking_id = %stored.booking_id.0,
            listing_id = %stored.listing_id.0,
            "review created"
        );

        match self.refresh_rating(&listing.id) {
            Ok(breakdown) => info!(
                listing_id = %listing.id.0,
                total_ratings = breakdown.total_ratings,
                average_rating = %breakdown.average_rating,
                "listing rating recomputed"
            ),
            Err(err) => warn!(
                listing_id = %listing.id.0,
                error = %err,
                "listing rating recompute failed; aggregate left stale"
            ),
        }

        self.notify(
            MarketplaceNotification::new("review_received", &stored.owner_id)
                .with("review_id", stored.id.0.clone())
                .with("listing_id", stored.listing_id.0.clone()),
        );

        Ok(stored)
    }

    /// Attach the listing owner's one-time reply to a review.
    pub fn reply_to_review(
        &self,
        actor: &Actor,
        review_id: &ReviewId,
        reply_text: &str,
    ) -> Result<Review, MarketplaceError> {
        let reply = validate_text(reply_text, "reply text")?;
        let mut review = self
            .store
            .fetch_review(review_id)?
            .ok_or_else(|| MarketplaceError::not_found("review", &review_id.0))?;
        self.guard.ensure_review_owner(actor, &review)?;
        ensure_reply_open(&review)?;

        review.owner_reply = Some(reply);
        review.replied_at = Some(Utc::now());
        self.store.update_review(review.clone())?;
        info!(review_id = %review.id.0, "owner replied to review");

        self.notify(
            MarketplaceNotification::new("review_replied", &review.tenant_id)
                .with("review_id", review.id.0.clone())
                .with("listing_id", review.listing_id.0.clone()),
        );

        Ok(review)
    }

    pub fn reviews_for_listing(&self, listing_id: &ListingId) -> Result<Vec<Review>, MarketplaceError> {
        let listing = self.listing(listing_id)?;
        Ok(self.store.reviews_for_listing(&listing.id)?)
    }

    /// Stored aggregate alongside the per-category figures from the current review set.
    ///
    /// The categories are always computed from the reviews, so after a failed refresh they can be
    /// ahead of the stored aggregate; `reviews_counted` differing from `total_ratings` marks that.
    pub fn listing_rating(
        &self,
        listing_id: &ListingId,
    ) -> Result<ListingRatingSummary, MarketplaceError> {
        let listing = self.listing(listing_id)?;
        let reviews = self.store.reviews_for_listing(&listing.id)?;
        let breakdown = self.aggregator.breakdown(&reviews);

        Ok(ListingRatingSummary {
            listing_id: listing.id,
            total_ratings: listing.total_ratings,
            average_rating: listing.average_rating,
            reviews_counted: breakdown.total_ratings,
            categories: breakdown.categories,
        })
    }

    /// Rebuild a listing's aggregate from its reviews on demand.
    pub fn recompute_listing_rating(
        &self,
        actor: &Actor,
        listing_id: &ListingId,
    ) -> Result<ListingRatingSummary, MarketplaceError> {
        self.guard.ensure_admin(actor)?;
        let listing = self.listing(listing_id)?;
        let breakdown = self.refresh_rating(&listing.id)?;
        info!(
            listing_id = %listing.id.0,
            total_ratings = breakdown.total_ratings,
            average_rating = %breakdown.average_rating,
            "listing rating recomputed on request"
        );

        Ok(ListingRatingSummary {
            listing_id: listing.id,
            total_ratings: breakdown.total_ratings,
            average_rating: breakdown.average_rating,
            reviews_counted: breakdown.total_ratings,
            categories: breakdown.categories,
        })
    }

    fn refresh_rating(&self, listing_id: &ListingId) -> Result<RatingBreakdown, MarketplaceError> {
        let reviews = self.store.reviews_for_listing(listing_id)?;
        let breakdown = self.aggregator.breakdown(&reviews);
        self.store.write_rating(listing_id, breakdown.rating())?;
        Ok(breakdown)
    }

    fn booking(&self, booking_id: &BookingId) -> Result<Booking, MarketplaceError> {
        self.store
            .fetch_booking(booking_id)?
            .ok_or_else(|| MarketplaceError::not_found("booking", &booking_id.0))
    }

    fn listing(&self, listing_id: &ListingId) -> Result<Listing, MarketplaceError> {
        self.store
            .find_listing(listing_id)?
            .ok_or_else(|| MarketplaceError::not_found("listing", &listing_id.0))
    }

    fn notify(&self, notification: MarketplaceNotification) {
        let template = notification.template.clone();
        if let Err(err) = self.notifications.publish(notification) {
            warn!(template = %template, error = %err, "notification dispatch failed");
        }
    }
}

/// Public rating view for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRatingSummary {
    pub listing_id: ListingId,
    pub total_ratings: u32,
    pub average_rating: Decimal,
    /// Reviews behind `categories`; equals `total_ratings` unless the stored aggregate is stale.
    pub reviews_counted: u32,
    pub categories: Vec<CategoryAverage>,
}
