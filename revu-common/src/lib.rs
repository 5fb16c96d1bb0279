//! # REVU Common Library
//!
//! Shared code for the REVU business directory services including:
//! - Bayesian-average rating computation
//! - Plan tier defaults and entitlement resolution
//! - Usage-limit counters for feature gating
//! - Translation cache
//! - Database initialization and queries
//! - Configuration loading

pub mod config;
pub mod db;
pub mod entitlements;
pub mod error;
pub mod rating;
pub mod translation;
pub mod usage;

pub use entitlements::{
    resolve_features, AnalyticsTier, EffectiveFeatures, EntityOverrides, Override, PlanTier,
};
pub use error::{Error, Result};
pub use rating::{compute_rating, RatingSummary};
