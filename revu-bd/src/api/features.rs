//! Feature gating reads
//!
//! Effective features are resolved on every request and never cached, so an
//! override or plan change is visible on the next call.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use revu_common::db;
use revu_common::entitlements::{resolve_features, EffectiveFeatures, EntityOverrides, PlanTier};
use revu_common::usage::{
    check_email_quota, check_update_quota, email_batches, QuotaDecision, UsagePeriod,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

/// Resolved features of one business
#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub business: Uuid,
    pub plan_tier: PlanTier,
    pub overrides: EntityOverrides,
    pub features: EffectiveFeatures,
}

/// Load a business and resolve its features
pub async fn load_features(pool: &SqlitePool, guid: Uuid) -> ApiResult<FeaturesResponse> {
    let business = db::load_business(pool, guid).await?;
    let features = resolve_features(business.plan_tier, &business.overrides);

    Ok(FeaturesResponse {
        business: business.guid,
        plan_tier: business.plan_tier,
        overrides: business.overrides,
        features,
    })
}

/// GET /api/businesses/:guid/features
pub async fn get_features(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<FeaturesResponse>> {
    Ok(Json(load_features(&state.db, guid).await?))
}

/// Query parameters for the email quota check
#[derive(Debug, Deserialize)]
pub struct EmailQuotaQuery {
    /// Emails the caller wants to send
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// Quota check result
#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    pub business: Uuid,
    /// First day of the metering period (`YYYY-MM-DD`)
    pub period: String,
    pub limit: u32,
    pub used: u32,
    pub requested: u32,
    #[serde(flatten)]
    pub decision: QuotaDecision,
    /// Send batch sizes; only present for allowed email checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batches: Option<Vec<u32>>,
}

/// GET /api/businesses/:guid/quota/email?count=N
pub async fn get_email_quota(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
    Query(query): Query<EmailQuotaQuery>,
) -> ApiResult<Json<QuotaResponse>> {
    let resolved = load_features(&state.db, guid).await?;
    let period = UsagePeriod::current();
    let usage = db::load_usage(&state.db, guid, period).await?;

    let decision = check_email_quota(&resolved.features, &usage, query.count);
    let batches = decision
        .is_allowed()
        .then(|| email_batches(query.count, resolved.features.email_batch_size));

    Ok(Json(QuotaResponse {
        business: guid,
        period: period.key(),
        limit: resolved.features.email_limit,
        used: usage.emails_sent,
        requested: query.count,
        decision,
        batches,
    }))
}

/// GET /api/businesses/:guid/quota/update
pub async fn get_update_quota(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<QuotaResponse>> {
    let resolved = load_features(&state.db, guid).await?;
    let period = UsagePeriod::current();
    let usage = db::load_usage(&state.db, guid, period).await?;

    Ok(Json(QuotaResponse {
        business: guid,
        period: period.key(),
        limit: resolved.features.update_limit,
        used: usage.updates_posted,
        requested: 1,
        decision: check_update_quota(&resolved.features, &usage),
        batches: None,
    }))
}
