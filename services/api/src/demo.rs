use crate::infra::{seed_demo_listings, InMemoryMarketplaceStore, LoggingNotificationPublisher};
use chrono::{Local, NaiveDate};
use clap::Args;
use stayhub::error::AppError;
use stayhub::marketplace::{
    Actor, BookingRequest, BookingStatus, CategoryRatings, ListingId, MarketplaceService,
    RatingSubmission, ReviewRequest, Role,
};
use std::sync::Arc;

const DEMO_LISTING: &str = "lst-maple-101";
const DEMO_OWNER: &str = "owner-ana";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Move-in date for the demo bookings (YYYY-MM-DD). Defaults to today + 14 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) move_in: Option<NaiveDate>,
    /// Skip the owner reply step.
    #[arg(long)]
    pub(crate) skip_reply: bool,
}

struct DemoStay {
    tenant: &'static str,
    ratings: CategoryRatings,
    text: &'static str,
}

fn demo_stays() -> [DemoStay; 2] {
    [
        DemoStay {
            tenant: "tenant-carla",
            ratings: CategoryRatings {
                food: 4,
                cleanliness: 5,
                safety: 5,
                owner: 4,
                facilities: 4,
                study: 5,
            },
            text: "Quiet street, fast wifi, great desk.",
        },
        DemoStay {
            tenant: "tenant-dev",
            ratings: CategoryRatings::uniform(3),
            text: "Fine for a semester, kitchen is small.",
        },
    ]
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        move_in,
        skip_reply,
    } = args;
    let move_in = move_in.unwrap_or_else(|| Local::now().date_naive() + chrono::Duration::days(14));

    let store = Arc::new(InMemoryMarketplaceStore::default());
    seed_demo_listings(&store)?;
    let notifications = Arc::new(LoggingNotificationPublisher::default());
    let service = MarketplaceService::new(store, notifications.clone());

    let owner = Actor::new(DEMO_OWNER, Role::Owner);
    let admin = Actor::new("ops-demo", Role::Admin);
    let listing_id = ListingId(DEMO_LISTING.to_string());

    println!("StayHub marketplace demo");
    println!("Listing {DEMO_LISTING} owned by {DEMO_OWNER}, move-in {move_in}");

    let mut first_review = None;
    for stay in demo_stays() {
        let tenant = Actor::new(stay.tenant, Role::Tenant);
        let booking = service.create_booking(
            &tenant,
            BookingRequest {
                listing_id: listing_id.clone(),
                move_in_date: Some(move_in.format("%Y-%m-%d").to_string()),
                notes: None,
            },
        )?;
        println!("- {} requested booking {}", stay.tenant, booking.id.0);

        service.transition_booking(&owner, &booking.id, BookingStatus::Accepted)?;
        let completed = service.complete_booking(&admin, &booking.id)?;
        println!("  {} is now {}", completed.id.0, completed.status.label());

        let review = service.create_review(
            &tenant,
            ReviewRequest {
                booking_id: booking.id.clone(),
                ratings: RatingSubmission::from(stay.ratings),
                text_review: stay.text.to_string(),
            },
        )?;
        println!("  review {} submitted: \"{}\"", review.id.0, review.text_review);
        first_review.get_or_insert(review.id);
    }

    if let (false, Some(review_id)) = (skip_reply, first_review) {
        let replied =
            service.reply_to_review(&owner, &review_id, "Thanks, the desk is staying put!")?;
        if let Some(reply) = replied.owner_reply.as_deref() {
            println!("- {DEMO_OWNER} replied to {}: \"{reply}\"", replied.id.0);
        }
    }

    let summary = service.listing_rating(&listing_id)?;
    println!(
        "\nRating for {}: {} across {} review(s)",
        summary.listing_id.0, summary.average_rating, summary.total_ratings
    );
    for category in &summary.categories {
        println!("  - {}: {}", category.category.label(), category.average);
    }

    let events = notifications.events();
    println!("\nNotifications queued: {}", events.len());
    for event in events {
        println!("  - {} -> {}", event.template, event.recipient.0);
    }

    Ok(())
}
