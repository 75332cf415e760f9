use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::marketplace::domain::{
    Actor, Booking, BookingId, BookingRequest, BookingStatus, CategoryRatings, Listing, ListingId,
    ListingRating, RatingSubmission, Review, ReviewId, ReviewRequest, Role,
};
use crate::marketplace::repository::{
    BookingRepository, ListingAggregateWriter, ListingDirectory, MarketplaceNotification,
    NotificationError, NotificationPublisher, RepositoryError, ReviewRepository,
};
use crate::marketplace::{marketplace_router, MarketplaceService};

pub(super) const LISTING: &str = "lst-1";
pub(super) const OWNER: &str = "owner-1";
pub(super) const TENANT: &str = "tenant-1";

pub(super) fn tenant() -> Actor {
    Actor::new(TENANT, Role::Tenant)
}

pub(super) fn owner() -> Actor {
    Actor::new(OWNER, Role::Owner)
}

pub(super) fn admin() -> Actor {
    Actor::new("ops-1", Role::Admin)
}

pub(super) fn stranger() -> Actor {
    Actor::new("tenant-2", Role::Tenant)
}

pub(super) fn listing_id() -> ListingId {
    ListingId(LISTING.to_string())
}

pub(super) fn booking_request() -> BookingRequest {
    BookingRequest {
        listing_id: listing_id(),
        move_in_date: Some("2025-09-01".to_string()),
        notes: Some("Arriving with one suitcase".to_string()),
    }
}

pub(super) fn review_request(booking_id: &BookingId, ratings: CategoryRatings) -> ReviewRequest {
    ReviewRequest {
        booking_id: booking_id.clone(),
        ratings: RatingSubmission::from(ratings),
        text_review: "Bright room, responsive owner".to_string(),
    }
}

pub(super) type TestService = MarketplaceService<MemoryStore, MemoryNotifications>;

pub(super) fn build_service() -> (TestService, Arc<MemoryStore>, Arc<MemoryNotifications>) {
    let store = Arc::new(MemoryStore::with_listing(Listing::new(
        LISTING,
        OWNER,
        "Room near the library",
    )));
    let notifications = Arc::new(MemoryNotifications::default());
    let service = MarketplaceService::new(store.clone(), notifications.clone());
    (service, store, notifications)
}

/// Drives a fresh booking through owner acceptance and admin completion.
pub(super) fn completed_booking(service: &TestService) -> Booking {
    let booking = service
        .create_booking(&tenant(), booking_request())
        .expect("booking created");
    service
        .transition_booking(&owner(), &booking.id, BookingStatus::Accepted)
        .expect("owner accepts");
    service
        .complete_booking(&admin(), &booking.id)
        .expect("admin completes")
}

#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) listings: Mutex<HashMap<ListingId, Listing>>,
    pub(super) bookings: Mutex<HashMap<BookingId, Booking>>,
    pub(super) reviews: Mutex<HashMap<ReviewId, Review>>,
    pub(super) fail_rating_writes: AtomicBool,
    race_review_inserts: AtomicBool,
    rating_writes: AtomicUsize,
}

impl MemoryStore {
    pub(super) fn with_listing(listing: Listing) -> Self {
        let store = Self::default();
        store
            .listings
            .lock()
            .expect("listing mutex poisoned")
            .insert(listing.id.clone(), listing);
        store
    }

    pub(super) fn listing(&self, id: &ListingId) -> Listing {
        self.listings
            .lock()
            .expect("listing mutex poisoned")
            .get(id)
            .cloned()
            .expect("listing present")
    }

    pub(super) fn review_count(&self) -> usize {
        self.reviews.lock().expect("review mutex poisoned").len()
    }

    pub(super) fn fail_rating_writes(&self) {
        self.fail_rating_writes.store(true, Ordering::SeqCst);
    }

    /// Simulates a concurrent submission landing between the duplicate check and the insert.
    pub(super) fn race_review_inserts(&self) {
        self.race_review_inserts.store(true, Ordering::SeqCst);
    }

    pub(super) fn rating_writes(&self) -> usize {
        self.rating_writes.load(Ordering::SeqCst)
    }
}

impl ListingDirectory for MemoryStore {
    fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        let guard = self.listings.lock().expect("listing mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

impl ListingAggregateWriter for MemoryStore {
    fn write_rating(&self, id: &ListingId, rating: ListingRating) -> Result<(), RepositoryError> {
        self.rating_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_rating_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("listing table locked".to_string()));
        }
        let mut guard = self.listings.lock().expect("listing mutex poisoned");
        let listing = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        listing.total_ratings = rating.total_ratings;
        listing.average_rating = rating.average_rating;
        Ok(())
    }
}

impl BookingRepository for MemoryStore {
    fn insert_booking(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut guard = self.bookings.lock().expect("booking mutex poisoned");
        if guard.contains_key(&booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn update_booking(&self, booking: Booking) -> Result<(), RepositoryError> {
        let mut guard = self.bookings.lock().expect("booking mutex poisoned");
        guard.insert(booking.id.clone(), booking);
        Ok(())
    }

    fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let guard = self.bookings.lock().expect("booking mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn bookings_for_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let guard = self.bookings.lock().expect("booking mutex poisoned");
        Ok(guard
            .values()
            .filter(|booking| &booking.listing_id == listing_id)
            .cloned()
            .collect())
    }
}

impl ReviewRepository for MemoryStore {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        if self.race_review_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Conflict);
        }
        let mut guard = self.reviews.lock().expect("review mutex poisoned");
        if guard
            .values()
            .any(|existing| existing.booking_id == review.booking_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(review.id.clone(), review.clone());
        Ok(review)
    }

    fn update_review(&self, review: Review) -> Result<(), RepositoryError> {
        let mut guard = self.reviews.lock().expect("review mutex poisoned");
        guard.insert(review.id.clone(), review);
        Ok(())
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        let guard = self.reviews.lock().expect("review mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn review_for_booking(&self, booking_id: &BookingId) -> Result<Option<Review>, RepositoryError> {
        if self.race_review_inserts.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let guard = self.reviews.lock().expect("review mutex poisoned");
        Ok(guard
            .values()
            .find(|review| &review.booking_id == booking_id)
            .cloned())
    }

    fn reviews_for_listing(&self, listing_id: &ListingId) -> Result<Vec<Review>, RepositoryError> {
        let guard = self.reviews.lock().expect("review mutex poisoned");
        Ok(guard
            .values()
            .filter(|review| &review.listing_id == listing_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<MarketplaceNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn templates(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .iter()
            .map(|event| event.template.clone())
            .collect()
    }

    pub(super) fn events(&self) -> Vec<MarketplaceNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: MarketplaceNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct OfflineNotifications;

impl NotificationPublisher for OfflineNotifications {
    fn publish(&self, _notification: MarketplaceNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl ListingDirectory for UnavailableStore {
    fn find_listing(&self, _id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ListingAggregateWriter for UnavailableStore {
    fn write_rating(&self, _id: &ListingId, _rating: ListingRating) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl BookingRepository for UnavailableStore {
    fn insert_booking(&self, _booking: Booking) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_booking(&self, _booking: Booking) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_booking(&self, _id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn bookings_for_listing(
        &self,
        _listing_id: &ListingId,
    ) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ReviewRepository for UnavailableStore {
    fn insert_review(&self, _review: Review) -> Result<Review, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_review(&self, _review: Review) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_review(&self, _id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn review_for_booking(
        &self,
        _booking_id: &BookingId,
    ) -> Result<Option<Review>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn reviews_for_listing(&self, _listing_id: &ListingId) -> Result<Vec<Review>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    marketplace_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
