//! Listing rating aggregation.
//!
//! The aggregate is always recomputed from the complete review set of a listing. Each category
//! mean is rounded to one decimal place (half-up) first, and the overall rating is the mean of
//! those six rounded figures, rounded again. The two stages are never collapsed into a single mean
//! over raw scores.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::domain::{ListingRating, RatingCategory, Review};

/// Mean score of one category across a listing's reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryAverage {
    pub category: RatingCategory,
    pub average: Decimal,
}

/// Aggregate plus the per-category figures it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingBreakdown {
    pub total_ratings: u32,
    pub average_rating: Decimal,
    pub categories: Vec<CategoryAverage>,
}

impl RatingBreakdown {
    pub fn rating(&self) -> ListingRating {
        ListingRating {
            total_ratings: self.total_ratings,
            average_rating: self.average_rating,
        }
    }
}

/// Stateless aggregation engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingAggregator;

impl RatingAggregator {
    pub fn aggregate(&self, reviews: &[Review]) -> ListingRating {
        self.breakdown(reviews).rating()
    }

    pub fn breakdown(&self, reviews: &[Review]) -> RatingBreakdown {
        if reviews.is_empty() {
            return RatingBreakdown {
                total_ratings: 0,
                average_rating: Decimal::ZERO,
                categories: RatingCategory::ALL
                    .into_iter()
                    .map(|category| CategoryAverage {
                        category,
                        average: Decimal::ZERO,
                    })
                    .collect(),
            };
        }

        let count = Decimal::from(reviews.len() as u64);
        let categories: Vec<CategoryAverage> = RatingCategory::ALL
            .into_iter()
            .map(|category| {
                let total: u64 = reviews
                    .iter()
                    .map(|review| u64::from(review.ratings.score(category)))
                    .sum();
                CategoryAverage {
                    category,
                    average: round_one_decimal(Decimal::from(total) / count),
                }
            })
            .collect();

        let rounded_sum: Decimal = categories.iter().map(|entry| entry.average).sum();
        let category_count = Decimal::from(RatingCategory::ALL.len() as u64);

        RatingBreakdown {
            total_ratings: u32::try_from(reviews.len()).unwrap_or(u32::MAX),
            average_rating: round_one_decimal(rounded_sum / category_count),
            categories,
        }
    }
}

/// Rounds to one decimal place, ties away from zero (half-up for the positive scores used here).
pub fn round_one_decimal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
