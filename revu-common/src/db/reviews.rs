//! Review database operations

use sqlx::SqlitePool;

use crate::db::models::Review;
use crate::rating::is_valid_stars;
use crate::{Error, Result};

/// Save a review
///
/// Ratings outside [1, 5] are rejected before touching the database.
pub async fn insert_review(pool: &SqlitePool, review: &Review) -> Result<()> {
    if !is_valid_stars(review.rating) {
        return Err(Error::InvalidInput(format!(
            "Rating must be between 1 and 5, got {}",
            review.rating
        )));
    }

    sqlx::query("INSERT INTO reviews (guid, business_guid, rating, body) VALUES (?, ?, ?, ?)")
        .bind(review.guid.to_string())
        .bind(review.business_guid.to_string())
        .bind(review.rating)
        .bind(&review.body)
        .execute(pool)
        .await?;

    Ok(())
}
