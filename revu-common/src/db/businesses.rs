//! Business database operations
//!
//! Plan tier and override columns are written only through [`set_overrides`]
//! and [`change_plan`]; the cached score only through [`save_rating_summary`].

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::Business;
use crate::entitlements::{EntityOverrides, Override, PlanTier};
use crate::rating::RatingSummary;
use crate::{Error, Result};

const BUSINESS_COLUMNS: &str = "guid, name, plan_tier, custom_email_limit, custom_update_limit, \
     enable_analytics, enable_lead_gen, hide_competitors, rating, review_count";

pub(crate) fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid GUID {:?}: {}", value, e)))
}

/// Stored limit columns are INTEGER; anything outside `u32` is treated as unset
fn limit_override(guid: &str, column: &str, value: Option<i64>) -> Override<u32> {
    match value {
        None => Override::Inherit,
        Some(v) => match u32::try_from(v) {
            Ok(limit) => Override::Set(limit),
            Err(_) => {
                warn!(business = %guid, column, value = v, "Ignoring out-of-range limit override");
                Override::Inherit
            }
        },
    }
}

fn business_from_row(row: &SqliteRow) -> Result<Business> {
    let guid: String = row.try_get("guid")?;
    let plan_tier: Option<String> = row.try_get("plan_tier")?;

    let overrides = EntityOverrides {
        custom_email_limit: limit_override(
            &guid,
            "custom_email_limit",
            row.try_get("custom_email_limit")?,
        ),
        custom_update_limit: limit_override(
            &guid,
            "custom_update_limit",
            row.try_get("custom_update_limit")?,
        ),
        enable_analytics: row.try_get::<Option<bool>, _>("enable_analytics")?.into(),
        enable_lead_gen: row.try_get::<Option<bool>, _>("enable_lead_gen")?.into(),
        hide_competitors: row.try_get::<Option<bool>, _>("hide_competitors")?.into(),
    };

    Ok(Business {
        guid: parse_guid(&guid)?,
        name: row.try_get("name")?,
        plan_tier: PlanTier::parse_or_free(plan_tier.as_deref()),
        overrides,
        rating: row.try_get("rating")?,
        review_count: row.try_get("review_count")?,
    })
}

/// Insert a new business on `tier` with no overrides and no score
pub async fn insert_business(pool: &SqlitePool, name: &str, tier: PlanTier) -> Result<Business> {
    let business = Business {
        guid: Uuid::new_v4(),
        name: name.to_string(),
        plan_tier: tier,
        overrides: EntityOverrides::default(),
        rating: 0.0,
        review_count: 0,
    };

    sqlx::query("INSERT INTO businesses (guid, name, plan_tier) VALUES (?, ?, ?)")
        .bind(business.guid.to_string())
        .bind(&business.name)
        .bind(tier.as_str())
        .execute(pool)
        .await?;

    Ok(business)
}

/// Load a business by GUID
pub async fn load_business(pool: &SqlitePool, guid: Uuid) -> Result<Business> {
    let sql = format!("SELECT {} FROM businesses WHERE guid = ?", BUSINESS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Business {}", guid)))?;

    business_from_row(&row)
}

/// GUIDs of every business, in insertion order
pub async fn list_business_guids(pool: &SqlitePool) -> Result<Vec<Uuid>> {
    let guids: Vec<String> =
        sqlx::query_scalar("SELECT guid FROM businesses ORDER BY created_at, guid")
            .fetch_all(pool)
            .await?;

    guids.iter().map(|g| parse_guid(g)).collect()
}

/// Replace all override fields of a business
pub async fn set_overrides(
    pool: &SqlitePool,
    guid: Uuid,
    overrides: &EntityOverrides,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE businesses SET
            custom_email_limit = ?,
            custom_update_limit = ?,
            enable_analytics = ?,
            enable_lead_gen = ?,
            hide_competitors = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(overrides.custom_email_limit.as_option().map(i64::from))
    .bind(overrides.custom_update_limit.as_option().map(i64::from))
    .bind(overrides.enable_analytics.as_option())
    .bind(overrides.enable_lead_gen.as_option())
    .bind(overrides.hide_competitors.as_option())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Business {}", guid)));
    }

    info!(business = %guid, ?overrides, "Overrides updated");
    Ok(())
}

/// Move a business to `tier`
///
/// A real change resets every override to inherit, in the same transaction as
/// the tier update. Returns `false` when the business was already on `tier`,
/// in which case nothing is touched.
pub async fn change_plan(pool: &SqlitePool, guid: Uuid, tier: PlanTier) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let current: Option<Option<String>> =
        sqlx::query_scalar("SELECT plan_tier FROM businesses WHERE guid = ?")
            .bind(guid.to_string())
            .fetch_optional(&mut *tx)
            .await?;

    let current = match current {
        Some(current) => current,
        None => return Err(Error::NotFound(format!("Business {}", guid))),
    };

    if current.as_deref() == Some(tier.as_str()) {
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE businesses SET
            plan_tier = ?,
            custom_email_limit = NULL,
            custom_update_limit = NULL,
            enable_analytics = NULL,
            enable_lead_gen = NULL,
            hide_competitors = NULL,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(tier.as_str())
    .bind(guid.to_string())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        business = %guid,
        from = current.as_deref().unwrap_or("<unset>"),
        to = %tier,
        "Plan changed, overrides reset"
    );
    Ok(true)
}

/// Every star rating of a business, oldest first
pub async fn load_ratings(pool: &SqlitePool, guid: Uuid) -> Result<Vec<f64>> {
    let ratings: Vec<f64> = sqlx::query_scalar(
        "SELECT rating FROM reviews WHERE business_guid = ? ORDER BY created_at, guid",
    )
    .bind(guid.to_string())
    .fetch_all(pool)
    .await?;

    Ok(ratings)
}

/// Write a recomputed score back to the business row
pub async fn save_rating_summary(
    pool: &SqlitePool,
    guid: Uuid,
    summary: &RatingSummary,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE businesses SET rating = ?, review_count = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(summary.rating)
    .bind(summary.review_count)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Business {}", guid)));
    }

    Ok(())
}
