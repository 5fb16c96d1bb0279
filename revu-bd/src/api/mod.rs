//! HTTP API handlers for revu-bd

pub mod admin;
pub mod features;
pub mod health;

pub use admin::{post_recompute, put_overrides, put_plan};
pub use features::{get_email_quota, get_features, get_update_quota};
pub use health::health_routes;
