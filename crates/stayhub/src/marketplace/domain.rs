use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for rentable listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier wrapper for booking requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier wrapper for submitted reviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewId(pub String);

/// Identifier wrapper for marketplace users (tenants, owners, admins).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Role resolved by the identity layer for the calling user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tenant,
    Owner,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Tenant => "tenant",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tenant" => Ok(Role::Tenant),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Authenticated caller on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id.into()),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Listing record as exposed by the listing directory. Only the fields the booking and review
/// pipeline reads or writes are modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: UserId,
    pub title: String,
    pub total_ratings: u32,
    pub average_rating: Decimal,
}

impl Listing {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ListingId(id.into()),
            owner_id: UserId(owner_id.into()),
            title: title.into(),
            total_ratings: 0,
            average_rating: Decimal::ZERO,
        }
    }

    pub fn rating(&self) -> ListingRating {
        ListingRating {
            total_ratings: self.total_ratings,
            average_rating: self.average_rating,
        }
    }
}

/// Derived aggregate written back onto a listing after every review write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRating {
    pub total_ratings: u32,
    pub average_rating: Decimal,
}

impl ListingRating {
    pub const EMPTY: ListingRating = ListingRating {
        total_ratings: 0,
        average_rating: Decimal::ZERO,
    };
}

/// Lifecycle status of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "rejected" => Ok(BookingStatus::Rejected),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

/// A tenant's request to rent a listing from a move-in date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub listing_id: ListingId,
    pub tenant_id: UserId,
    pub status: BookingStatus,
    pub move_in_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw booking request as received from the outer layer. The move-in date stays textual so that
/// missing or malformed values surface as input errors from the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub listing_id: ListingId,
    #[serde(default)]
    pub move_in_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The six fixed categories every review scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingCategory {
    Food,
    Cleanliness,
    Safety,
    Owner,
    Facilities,
    Study,
}

impl RatingCategory {
    pub const ALL: [RatingCategory; 6] = [
        RatingCategory::Food,
        RatingCategory::Cleanliness,
        RatingCategory::Safety,
        RatingCategory::Owner,
        RatingCategory::Facilities,
        RatingCategory::Study,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RatingCategory::Food => "food",
            RatingCategory::Cleanliness => "cleanliness",
            RatingCategory::Safety => "safety",
            RatingCategory::Owner => "owner",
            RatingCategory::Facilities => "facilities",
            RatingCategory::Study => "study",
        }
    }
}

/// Validated category scores, each within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRatings {
    pub food: u8,
    pub cleanliness: u8,
    pub safety: u8,
    pub owner: u8,
    pub facilities: u8,
    pub study: u8,
}

impl CategoryRatings {
    pub const fn score(&self, category: RatingCategory) -> u8 {
        match category {
            RatingCategory::Food => self.food,
            RatingCategory::Cleanliness => self.cleanliness,
            RatingCategory::Safety => self.safety,
            RatingCategory::Owner => self.owner,
            RatingCategory::Facilities => self.facilities,
            RatingCategory::Study => self.study,
        }
    }

    /// Same score in every category; handy for fixtures and demos.
    pub const fn uniform(score: u8) -> Self {
        Self {
            food: score,
            cleanliness: score,
            safety: score,
            owner: score,
            facilities: score,
            study: score,
        }
    }
}

/// Unvalidated category scores. Any field may be missing or out of range until the review gate
/// checks it. Values that are not JSON integers (`4.5`, `"5"`) deserialize as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSubmission {
    #[serde(deserialize_with = "integer_score")]
    pub food: Option<i64>,
    #[serde(deserialize_with = "integer_score")]
    pub cleanliness: Option<i64>,
    #[serde(deserialize_with = "integer_score")]
    pub safety: Option<i64>,
    #[serde(deserialize_with = "integer_score")]
    pub owner: Option<i64>,
    #[serde(deserialize_with = "integer_score")]
    pub facilities: Option<i64>,
    #[serde(deserialize_with = "integer_score")]
    pub study: Option<i64>,
}

fn integer_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.as_i64()))
}

impl RatingSubmission {
    pub const fn get(&self, category: RatingCategory) -> Option<i64> {
        match category {
            RatingCategory::Food => self.food,
            RatingCategory::Cleanliness => self.cleanliness,
            RatingCategory::Safety => self.safety,
            RatingCategory::Owner => self.owner,
            RatingCategory::Facilities => self.facilities,
            RatingCategory::Study => self.study,
        }
    }
}

impl From<CategoryRatings> for RatingSubmission {
    fn from(ratings: CategoryRatings) -> Self {
        Self {
            food: Some(ratings.food.into()),
            cleanliness: Some(ratings.cleanliness.into()),
            safety: Some(ratings.safety.into()),
            owner: Some(ratings.owner.into()),
            facilities: Some(ratings.facilities.into()),
            study: Some(ratings.study.into()),
        }
    }
}

/// Review creation payload submitted by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub booking_id: BookingId,
    #[serde(default)]
    pub ratings: RatingSubmission,
    #[serde(default)]
    pub text_review: String,
}

/// A tenant's six-category rating and free text for a completed booking.
///
/// `owner_id` is copied from the listing when the review is created and is never rewritten, so a
/// later change of listing ownership leaves historical reviews attributed to the original owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub listing_id: ListingId,
    pub tenant_id: UserId,
    pub owner_id: UserId,
    pub ratings: CategoryRatings,
    pub text_review: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
