//! Bayesian-average star rating
//!
//! A business with a handful of reviews should not be able to sit at the top
//! (or bottom) of a listing because of one extreme rating. Scores are shrunk
//! toward a global prior mean, weighted as if every business had already
//! received `weight` reviews at that mean:
//!
//! ```text
//! score = (C * m + S) / (m + N)
//! ```
//!
//! where `C` is the prior mean, `m` the confidence weight, `S` the sum of the
//! business's ratings and `N` their count. With no ratings at all the score
//! is `0.0`, meaning "no score yet" rather than "scored badly".

use serde::{Deserialize, Serialize};

/// Lowest star rating a review may carry
pub const MIN_STARS: f64 = 1.0;

/// Highest star rating a review may carry
pub const MAX_STARS: f64 = 5.0;

/// Prior used for shrinkage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingPrior {
    /// Global mean that small samples are pulled toward (`C`)
    pub mean: f64,
    /// Pseudo-count of reviews at `mean` (`m`)
    pub weight: f64,
}

impl RatingPrior {
    /// 3.5 stars, worth seven average reviews of trust
    pub const DEFAULT: RatingPrior = RatingPrior {
        mean: 3.5,
        weight: 7.0,
    };

    /// Shrinkage-adjusted score for `ratings`
    ///
    /// Returns `0.0` for an empty slice.
    pub fn score(&self, ratings: &[f64]) -> f64 {
        if ratings.is_empty() {
            return 0.0;
        }

        let sum: f64 = ratings.iter().sum();
        let count = ratings.len() as f64;

        (self.mean * self.weight + sum) / (self.weight + count)
    }
}

impl Default for RatingPrior {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Compute a business's rating using the default prior
pub fn compute_rating(ratings: &[f64]) -> f64 {
    RatingPrior::DEFAULT.score(ratings)
}

/// Values written back to a business row after recomputation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub rating: f64,
    pub review_count: i64,
}

/// Score and count for `ratings` in one step
pub fn summarize(ratings: &[f64]) -> RatingSummary {
    RatingSummary {
        rating: compute_rating(ratings),
        review_count: ratings.len() as i64,
    }
}

/// Whether `stars` is an acceptable review rating
pub fn is_valid_stars(stars: f64) -> bool {
    stars.is_finite() && (MIN_STARS..=MAX_STARS).contains(&stars)
}
