//! Integration tests for revu-bd API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Effective feature resolution per business
//! - Email and update quota checks
//! - Override and plan administration
//! - Recompute trigger

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use revu_bd::{build_router, AppState};
use revu_common::db::{self, init_database, Review};
use revu_common::entitlements::PlanTier;
use revu_common::usage::UsagePeriod;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

/// Test helper: fresh database in a temporary directory
async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("revu.db"))
        .await
        .expect("Should initialize database");
    (dir, pool)
}

fn setup_app(db: SqlitePool) -> axum::Router {
    build_router(AppState::new(db, 2))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "revu-bd");
    assert!(body["version"].is_string());
}

// =============================================================================
// Features
// =============================================================================

#[tokio::test]
async fn test_free_business_features() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Corner Bakery", PlanTier::Free)
        .await
        .unwrap();
    let app = setup_app(db);

    let uri = format!("/api/businesses/{}/features", business.guid);
    let response = app.oneshot(test_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["plan_tier"], "FREE");
    assert_eq!(
        body["features"],
        json!({
            "email_limit": 10,
            "email_batch_size": 50,
            "update_limit": 0,
            "analytics_tier": "BASIC",
            "has_lead_gen": false,
            "should_hide_competitors": false,
        })
    );
    assert!(body["overrides"]["custom_email_limit"].is_null());
}

#[tokio::test]
async fn test_features_unknown_business_404() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let uri = format!("/api/businesses/{}/features", Uuid::new_v4());
    let response = app.oneshot(test_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_corrupt_tier_still_renders_as_free() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Old Import", PlanTier::Growth)
        .await
        .unwrap();
    sqlx::query("UPDATE businesses SET plan_tier = 'UNKNOWN_TIER' WHERE guid = ?")
        .bind(business.guid.to_string())
        .execute(&db)
        .await
        .unwrap();
    let app = setup_app(db);

    let uri = format!("/api/businesses/{}/features", business.guid);
    let response = app.oneshot(test_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["plan_tier"], "FREE");
    assert_eq!(body["features"]["email_limit"], 10);
}

// =============================================================================
// Administration
// =============================================================================

#[tokio::test]
async fn test_override_applies_per_field() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Harbor Dental", PlanTier::Growth)
        .await
        .unwrap();
    let app = setup_app(db);

    let uri = format!("/api/businesses/{}/overrides", business.guid);
    let response = app
        .oneshot(json_request(
            "PUT",
            &uri,
            json!({ "custom_email_limit": 500, "enable_analytics": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["features"]["email_limit"], 500);
    assert_eq!(body["features"]["analytics_tier"], "BASIC");
    // GROWTH defaults for everything not overridden
    assert_eq!(body["features"]["update_limit"], 4);
    assert_eq!(body["features"]["has_lead_gen"], true);
    assert_eq!(body["overrides"]["enable_analytics"], false);
    assert!(body["overrides"]["enable_lead_gen"].is_null());
}

#[tokio::test]
async fn test_plan_change_resets_overrides() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Glow Salon", PlanTier::Free)
        .await
        .unwrap();
    let app = setup_app(db);

    let overrides_uri = format!("/api/businesses/{}/overrides", business.guid);
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &overrides_uri,
            json!({ "custom_email_limit": 40, "enable_analytics": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let plan_uri = format!("/api/businesses/{}/plan", business.guid);
    let response = app
        .oneshot(json_request("PUT", &plan_uri, json!({ "plan_tier": "growth" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["plan_tier"], "GROWTH");
    assert!(body["overrides"]["custom_email_limit"].is_null());
    assert!(body["overrides"]["enable_analytics"].is_null());
    assert_eq!(body["features"]["email_limit"], 100);
    assert_eq!(body["features"]["analytics_tier"], "ADVANCED");
}

#[tokio::test]
async fn test_plan_change_rejects_unknown_tier() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Pet Palace", PlanTier::Free)
        .await
        .unwrap();
    let app = setup_app(db.clone());

    let uri = format!("/api/businesses/{}/plan", business.guid);
    let response = app
        .oneshot(json_request("PUT", &uri, json!({ "plan_tier": "PLATINUM" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let loaded = db::load_business(&db, business.guid).await.unwrap();
    assert_eq!(loaded.plan_tier, PlanTier::Free);
}

// =============================================================================
// Quotas
// =============================================================================

#[tokio::test]
async fn test_email_quota_check() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Print Shop", PlanTier::Free)
        .await
        .unwrap();
    db::record_emails_sent(&db, business.guid, UsagePeriod::current(), 8)
        .await
        .unwrap();
    let app = setup_app(db);

    let uri = format!("/api/businesses/{}/quota/email?count=2", business.guid);
    let response = app.clone().oneshot(test_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["decision"], "allowed");
    assert_eq!(body["remaining_after"], 0);
    assert_eq!(body["used"], 8);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["batches"], json!([2]));

    let uri = format!("/api/businesses/{}/quota/email?count=3", business.guid);
    let response = app.oneshot(test_request("GET", &uri)).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["decision"], "denied");
    assert_eq!(body["remaining"], 2);
    assert!(body.get("batches").is_none());
}

#[tokio::test]
async fn test_update_quota_free_tier_denied() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Bike Shop", PlanTier::Free)
        .await
        .unwrap();
    let app = setup_app(db);

    let uri = format!("/api/businesses/{}/quota/update", business.guid);
    let response = app.oneshot(test_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["decision"], "denied");
    assert_eq!(body["limit"], 0);
}

// =============================================================================
// Recompute
// =============================================================================

#[tokio::test]
async fn test_recompute_endpoint_updates_ratings() {
    let (_dir, db) = setup_test_db().await;
    let business = db::insert_business(&db, "Taco Stand", PlanTier::Free)
        .await
        .unwrap();
    db::insert_review(&db, &Review::new(business.guid, 5.0, None))
        .await
        .unwrap();
    let app = setup_app(db.clone());

    let response = app
        .oneshot(test_request("POST", "/api/recompute"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["updated"], 1);
    assert_eq!(body["failed"], 0);

    let loaded = db::load_business(&db, business.guid).await.unwrap();
    assert_eq!(loaded.review_count, 1);
    assert!((loaded.rating - 3.6875).abs() < 1e-9);
}
