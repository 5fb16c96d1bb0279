//! Usage counter persistence

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::usage::{UsageCounters, UsagePeriod};
use crate::Result;

fn to_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Counters for one business in one period (zero when nothing was recorded)
pub async fn load_usage(
    pool: &SqlitePool,
    guid: Uuid,
    period: UsagePeriod,
) -> Result<UsageCounters> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        "SELECT emails_sent, updates_posted FROM usage_counters WHERE business_guid = ? AND period_start = ?",
    )
    .bind(guid.to_string())
    .bind(period.key())
    .fetch_optional(pool)
    .await?;

    Ok(row
        .map(|(emails, updates)| UsageCounters {
            emails_sent: to_count(emails),
            updates_posted: to_count(updates),
        })
        .unwrap_or_default())
}

/// Add `count` sent emails to the period's counter
pub async fn record_emails_sent(
    pool: &SqlitePool,
    guid: Uuid,
    period: UsagePeriod,
    count: u32,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO usage_counters (business_guid, period_start, emails_sent)
        VALUES (?, ?, ?)
        ON CONFLICT(business_guid, period_start) DO UPDATE SET
            emails_sent = emails_sent + excluded.emails_sent
        "#,
    )
    .bind(guid.to_string())
    .bind(period.key())
    .bind(i64::from(count))
    .execute(pool)
    .await?;

    Ok(())
}

/// Count one posted update in the period
pub async fn record_update_posted(pool: &SqlitePool, guid: Uuid, period: UsagePeriod) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO usage_counters (business_guid, period_start, updates_posted)
        VALUES (?, ?, 1)
        ON CONFLICT(business_guid, period_start) DO UPDATE SET
            updates_posted = updates_posted + 1
        "#,
    )
    .bind(guid.to_string())
    .bind(period.key())
    .execute(pool)
    .await?;

    Ok(())
}
