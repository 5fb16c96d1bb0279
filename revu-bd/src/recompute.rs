//! Batch rating recomputation
//!
//! Recomputes the Bayesian-average score of every business and writes
//! `{rating, review_count}` back to its row. Businesses are independent, so
//! they are processed with bounded concurrency and one business failing to
//! load or save never stops the others. Failures are logged and counted.

use futures::stream::{self, StreamExt};
use revu_common::db;
use revu_common::rating::{summarize, RatingSummary};
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeReport {
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
    /// Businesses whose recomputation failed
    pub failed_businesses: Vec<Uuid>,
}

/// Recompute and persist one business's score
pub async fn recompute_business(pool: &SqlitePool, guid: Uuid) -> revu_common::Result<RatingSummary> {
    let ratings = db::load_ratings(pool, guid).await?;
    let summary = summarize(&ratings);
    db::save_rating_summary(pool, guid, &summary).await?;
    Ok(summary)
}

/// Recompute every business in the database
pub async fn recompute_all(pool: &SqlitePool, concurrency: usize) -> revu_common::Result<RecomputeReport> {
    let guids = db::list_business_guids(pool).await?;
    Ok(recompute_businesses(pool, guids, concurrency).await)
}

/// Recompute the given businesses
///
/// Never fails as a whole; per-business errors end up in the report.
pub async fn recompute_businesses(
    pool: &SqlitePool,
    guids: Vec<Uuid>,
    concurrency: usize,
) -> RecomputeReport {
    let start_time = Instant::now();
    let total = guids.len();
    info!(total, concurrency, "Starting rating recompute");

    let results: Vec<(Uuid, revu_common::Result<RatingSummary>)> = stream::iter(guids)
        .map(|guid| async move {
            let result = recompute_business(pool, guid).await;
            match &result {
                Ok(summary) => debug!(
                    business = %guid,
                    rating = summary.rating,
                    review_count = summary.review_count,
                    "Rating recomputed"
                ),
                Err(e) => error!(
                    business = %guid,
                    error = %e,
                    "Rating recompute failed"
                ),
            }
            (guid, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let failed_businesses: Vec<Uuid> = results
        .iter()
        .filter(|(_, result)| result.is_err())
        .map(|(guid, _)| *guid)
        .collect();

    let report = RecomputeReport {
        total,
        updated: total - failed_businesses.len(),
        failed: failed_businesses.len(),
        failed_businesses,
    };

    info!(
        total = report.total,
        updated = report.updated,
        failed = report.failed,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Rating recompute completed"
    );

    report
}
