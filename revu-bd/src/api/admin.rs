//! Administrative mutations: overrides, plan changes and recompute trigger

use axum::{
    extract::{Path, State},
    Json,
};
use revu_common::db;
use revu_common::entitlements::{EntityOverrides, PlanTier};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::features::{load_features, FeaturesResponse};
use crate::error::{ApiError, ApiResult};
use crate::recompute::{recompute_all, RecomputeReport};
use crate::AppState;

/// PUT /api/businesses/:guid/overrides
///
/// Replaces every override field; omitted or `null` fields inherit.
pub async fn put_overrides(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
    Json(overrides): Json<EntityOverrides>,
) -> ApiResult<Json<FeaturesResponse>> {
    db::set_overrides(&state.db, guid, &overrides).await?;
    Ok(Json(load_features(&state.db, guid).await?))
}

/// Plan change request body
#[derive(Debug, Deserialize)]
pub struct PlanChangeRequest {
    pub plan_tier: String,
}

/// Plan change response
#[derive(Debug, Serialize)]
pub struct PlanChangeResponse {
    /// False when the business was already on the requested tier
    pub changed: bool,
    #[serde(flatten)]
    pub current: FeaturesResponse,
}

/// PUT /api/businesses/:guid/plan
///
/// Unknown tiers are rejected here; only read paths fall back to FREE.
pub async fn put_plan(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
    Json(request): Json<PlanChangeRequest>,
) -> ApiResult<Json<PlanChangeResponse>> {
    let tier: PlanTier = request
        .plan_tier
        .parse()
        .map_err(|e: revu_common::Error| ApiError::BadRequest(e.to_string()))?;

    let changed = db::change_plan(&state.db, guid, tier).await?;
    let current = load_features(&state.db, guid).await?;

    Ok(Json(PlanChangeResponse { changed, current }))
}

/// POST /api/recompute
pub async fn post_recompute(State(state): State<AppState>) -> ApiResult<Json<RecomputeReport>> {
    info!("Rating recompute requested via API");
    let report = recompute_all(&state.db, state.concurrency).await?;
    Ok(Json(report))
}
