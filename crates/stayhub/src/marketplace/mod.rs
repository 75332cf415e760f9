//! Booking lifecycle, review eligibility, and listing rating aggregation.
//!
//! Storage, listing management, identity, and notification delivery live outside this module and
//! are reached through the traits in [`repository`].

pub mod access;
pub mod bookings;
pub mod domain;
pub mod error;
pub mod rating;
pub mod repository;
pub(crate) mod reviews;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::AccessGuard;
pub use domain::{
    Actor, Booking, BookingId, BookingRequest, BookingStatus, CategoryRatings, Listing, ListingId,
    ListingRating, RatingCategory, RatingSubmission, Review, ReviewId, ReviewRequest, Role, UserId,
};
pub use error::{ErrorKind, MarketplaceError};
pub use rating::{CategoryAverage, RatingAggregator, RatingBreakdown};
pub use repository::{
    BookingRepository, ListingAggregateWriter, ListingDirectory, MarketplaceNotification,
    MarketplaceStore, NotificationError, NotificationPublisher, RepositoryError, ReviewRepository,
};
pub use reviews::{MAX_SCORE, MIN_SCORE};
pub use router::{marketplace_router, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
pub use service::{ListingRatingSummary, MarketplaceService};
