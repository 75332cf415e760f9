use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use stayhub::marketplace::{
    Booking, BookingId, BookingRepository, Listing, ListingAggregateWriter, ListingDirectory,
    ListingId, ListingRating, MarketplaceError, MarketplaceNotification, NotificationError,
    NotificationPublisher, RepositoryError, Review, ReviewId, ReviewRepository,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Listings exposed when demo seeding is enabled: (id, owner, title).
pub(crate) const DEMO_LISTINGS: [(&str, &str, &str); 3] = [
    ("lst-maple-101", "owner-ana", "Maple Street studio, 5 min from campus"),
    ("lst-birch-7", "owner-ana", "Birch Court shared flat, room 2"),
    ("lst-harbor-3", "owner-ben", "Harbor View room with desk"),
];

#[derive(Default, Clone)]
pub(crate) struct InMemoryMarketplaceStore {
    listings: Arc<Mutex<HashMap<ListingId, Listing>>>,
    bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
    reviews: Arc<Mutex<HashMap<ReviewId, Review>>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} store poisoned")))
}

impl InMemoryMarketplaceStore {
    pub(crate) fn insert_listing(&self, listing: Listing) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.listings, "listing")?;
        if guard.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(listing.id.clone(), listing);
        Ok(())
    }
}

impl ListingDirectory for InMemoryMarketplaceStore {
    fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(lock(&self.listings, "listing")?.get(id).cloned())
    }
}

impl ListingAggregateWriter for InMemoryMarketplaceStore {
    fn write_rating(&self, id: &ListingId, rating: ListingRating) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.listings, "listing")?;
        let listing = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        listing.total_ratings = rating.total_ratings;
        listing.average_rating = rating.average_rating;
        Ok(())
    }
}

impl BookingRepository for InMemoryMarketplaceStore {
    fn insert_booking(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut guard = lock(&self.bookings, "booking")?;
        if guard.contains_key(&booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn update_booking(&self, booking: Booking) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.bookings, "booking")?;
        if guard.contains_key(&booking.id) {
            guard.insert(booking.id.clone(), booking);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(lock(&self.bookings, "booking")?.get(id).cloned())
    }

    fn bookings_for_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let guard = lock(&self.bookings, "booking")?;
        let mut bookings: Vec<Booking> = guard
            .values()
            .filter(|booking| &booking.listing_id == listing_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }
}

impl ReviewRepository for InMemoryMarketplaceStore {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        // Uniqueness check and insert share one guard so concurrent submissions cannot both land.
        let mut guard = lock(&self.reviews, "review")?;
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
        let mut guard = lock(&self.reviews, "review")?;
        if guard.contains_key(&review.id) {
            guard.insert(review.id.clone(), review);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(lock(&self.reviews, "review")?.get(id).cloned())
    }

    fn review_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Review>, RepositoryError> {
        Ok(lock(&self.reviews, "review")?
            .values()
            .find(|review| &review.booking_id == booking_id)
            .cloned())
    }

    fn reviews_for_listing(&self, listing_id: &ListingId) -> Result<Vec<Review>, RepositoryError> {
        let guard = lock(&self.reviews, "review")?;
        let mut reviews: Vec<Review> = guard
            .values()
            .filter(|review| &review.listing_id == listing_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(reviews)
    }
}

/// Records notifications and writes them to the log in place of an email relay.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationPublisher {
    events: Arc<Mutex<Vec<MarketplaceNotification>>>,
}

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notification: MarketplaceNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            recipient = %notification.recipient.0,
            "notification queued"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotificationError::Transport("outbox poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl LoggingNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<MarketplaceNotification> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn seed_demo_listings(store: &InMemoryMarketplaceStore) -> Result<usize, MarketplaceError> {
    for (id, owner, title) in DEMO_LISTINGS {
        store.insert_listing(Listing::new(id, owner, title))?;
    }
    Ok(DEMO_LISTINGS.len())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
