//! Database models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entitlements::{EntityOverrides, PlanTier};

/// A listed business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub guid: Uuid,
    pub name: String,
    /// Unrecognized stored tiers are read as FREE
    pub plan_tier: PlanTier,
    pub overrides: EntityOverrides,
    pub rating: f64,
    pub review_count: i64,
}

/// A single customer review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub guid: Uuid,
    pub business_guid: Uuid,
    pub rating: f64,
    pub body: Option<String>,
}

impl Review {
    /// Create new review record
    pub fn new(business_guid: Uuid, rating: f64, body: Option<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            business_guid,
            rating,
            body,
        }
    }
}
