use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Booking, BookingId, Listing, ListingId, ListingRating, Review, ReviewId, UserId,
};

/// Read access to listings owned by the listing management subsystem.
pub trait ListingDirectory: Send + Sync {
    fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
}

/// Persists the derived rating fields back onto a listing.
pub trait ListingAggregateWriter: Send + Sync {
    fn write_rating(&self, id: &ListingId, rating: ListingRating) -> Result<(), RepositoryError>;
}

/// Storage abstraction for bookings.
pub trait BookingRepository: Send + Sync {
    fn insert_booking(&self, booking: Booking) -> Result<Booking, RepositoryError>;
    fn update_booking(&self, booking: Booking) -> Result<(), RepositoryError>;
    fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    fn bookings_for_listing(&self, listing_id: &ListingId)
        -> Result<Vec<Booking>, RepositoryError>;
}

/// Storage abstraction for reviews.
///
/// `insert_review` must reject a second review for the same booking with [`RepositoryError::Conflict`]
/// atomically, the way a unique index on `booking_id` would.
pub trait ReviewRepository: Send + Sync {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn update_review(&self, review: Review) -> Result<(), RepositoryError>;
    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn review_for_booking(&self, booking_id: &BookingId)
        -> Result<Option<Review>, RepositoryError>;
    fn reviews_for_listing(&self, listing_id: &ListingId) -> Result<Vec<Review>, RepositoryError>;
}

/// Everything the marketplace service needs from storage, bundled so a single adapter can serve
/// all collaborators.
pub trait MarketplaceStore:
    ListingDirectory + ListingAggregateWriter + BookingRepository + ReviewRepository
{
}

impl<T> MarketplaceStore for T where
    T: ListingDirectory + ListingAggregateWriter + BookingRepository + ReviewRepository
{
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound notification hooks (e-mail, push, in-app inbox adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: MarketplaceNotification) -> Result<(), NotificationError>;
}

/// Notification payload handed to the dispatch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceNotification {
    pub template: String,
    pub recipient: UserId,
    pub details: BTreeMap<String, String>,
}

impl MarketplaceNotification {
    pub(crate) fn new(template: &str, recipient: &UserId) -> Self {
        Self {
            template: template.to_string(),
            recipient: recipient.clone(),
            details: BTreeMap::new(),
        }
    }

    pub(crate) fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
