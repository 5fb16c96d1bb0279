//! Plan tiers, per-business overrides and effective feature resolution
//!
//! Every business is on a [`PlanTier`] whose [`PlanDefaults`] describe the
//! limits and features it gets out of the box. Administrators may attach
//! [`EntityOverrides`] to a business; each override field is either
//! [`Override::Inherit`] (use the tier default) or [`Override::Set`].
//!
//! [`resolve_features`] merges the two, field by field, into the
//! [`EffectiveFeatures`] that feature gates consult. Resolution is total:
//! every tier has defaults and every field resolves to a concrete value.
//!
//! Two merge rules exist:
//! - Limits and plain flags coalesce: a set override wins, otherwise the default.
//! - Analytics forces: `Set(true)` means PRO, `Set(false)` means BASIC,
//!   regardless of the tier default. `Set(false)` is a real downgrade, not
//!   "unset".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// Subscription level of a business
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanTier {
    #[default]
    Free,
    Growth,
    Scale,
    Custom,
}

impl PlanTier {
    /// All tiers, cheapest first
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Growth,
        PlanTier::Scale,
        PlanTier::Custom,
    ];

    /// Stored/serialized name (`"FREE"`, `"GROWTH"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "FREE",
            PlanTier::Growth => "GROWTH",
            PlanTier::Scale => "SCALE",
            PlanTier::Custom => "CUSTOM",
        }
    }

    /// Lenient parse for read paths
    ///
    /// Missing or unrecognized values fall back to [`PlanTier::Free`] so that a
    /// bad row can never break a page render.
    pub fn parse_or_free(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(PlanTier::Free)
    }

    /// Default limits and features for this tier
    pub fn defaults(self) -> &'static PlanDefaults {
        match self {
            PlanTier::Free => &FREE_DEFAULTS,
            PlanTier::Growth => &GROWTH_DEFAULTS,
            PlanTier::Scale => &SCALE_DEFAULTS,
            PlanTier::Custom => &CUSTOM_DEFAULTS,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse (case-insensitive), used when an administrator sets a plan
impl FromStr for PlanTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FREE" => Ok(PlanTier::Free),
            "GROWTH" => Ok(PlanTier::Growth),
            "SCALE" => Ok(PlanTier::Scale),
            "CUSTOM" => Ok(PlanTier::Custom),
            other => Err(Error::InvalidInput(format!("Unknown plan tier: {}", other))),
        }
    }
}

/// Level of analytics shown on the business dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalyticsTier {
    Basic,
    Advanced,
    Pro,
}

/// Maximum recipients per outgoing email batch
///
/// Serializes as a number, or `null` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSize {
    Limited(u32),
    Unbounded,
}

impl BatchSize {
    /// Limit as an option (`None` = unbounded)
    pub fn limit(self) -> Option<u32> {
        match self {
            BatchSize::Limited(n) => Some(n),
            BatchSize::Unbounded => None,
        }
    }
}

impl Serialize for BatchSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.limit().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BatchSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<u32>::deserialize(deserializer)? {
            Some(n) => BatchSize::Limited(n),
            None => BatchSize::Unbounded,
        })
    }
}

/// Out-of-the-box limits and features of a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanDefaults {
    /// Emails per usage period
    pub email_limit: u32,
    pub email_batch_size: BatchSize,
    /// Business updates (posts) per usage period
    pub update_limit: u32,
    pub analytics_tier: AnalyticsTier,
    pub has_lead_gen: bool,
    pub hide_competitors: bool,
}

static FREE_DEFAULTS: PlanDefaults = PlanDefaults {
    email_limit: 10,
    email_batch_size: BatchSize::Limited(50),
    update_limit: 0,
    analytics_tier: AnalyticsTier::Basic,
    has_lead_gen: false,
    hide_competitors: false,
};

static GROWTH_DEFAULTS: PlanDefaults = PlanDefaults {
    email_limit: 100,
    email_batch_size: BatchSize::Limited(100),
    update_limit: 4,
    analytics_tier: AnalyticsTier::Advanced,
    has_lead_gen: true,
    hide_competitors: false,
};

static SCALE_DEFAULTS: PlanDefaults = PlanDefaults {
    email_limit: 500,
    email_batch_size: BatchSize::Limited(250),
    update_limit: 12,
    analytics_tier: AnalyticsTier::Pro,
    has_lead_gen: true,
    hide_competitors: true,
};

static CUSTOM_DEFAULTS: PlanDefaults = PlanDefaults {
    email_limit: 2000,
    email_batch_size: BatchSize::Unbounded,
    update_limit: 30,
    analytics_tier: AnalyticsTier::Pro,
    has_lead_gen: true,
    hide_competitors: true,
};

/// A single administrator override
///
/// Serializes as `null` for [`Override::Inherit`] and as the bare value for
/// [`Override::Set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Override<T> {
    /// Use the tier default
    #[default]
    Inherit,
    /// Explicit value that supersedes the tier default
    Set(T),
}

impl<T: Copy> Override<T> {
    /// The override if set, otherwise `default`
    pub fn or_inherit(self, default: T) -> T {
        match self {
            Override::Inherit => default,
            Override::Set(value) => value,
        }
    }

    pub fn is_inherit(&self) -> bool {
        matches!(self, Override::Inherit)
    }

    pub fn as_option(self) -> Option<T> {
        match self {
            Override::Inherit => None,
            Override::Set(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Override<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Override::Set(v),
            None => Override::Inherit,
        }
    }
}

impl<T: Serialize> Serialize for Override<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Override::Inherit => serializer.serialize_none(),
            Override::Set(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Override<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Override::from)
    }
}

/// Per-business administrator overrides
///
/// All fields start as [`Override::Inherit`] and are reset to it whenever the
/// business changes plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityOverrides {
    pub custom_email_limit: Override<u32>,
    pub custom_update_limit: Override<u32>,
    /// `Set(true)` forces PRO analytics, `Set(false)` forces BASIC
    pub enable_analytics: Override<bool>,
    pub enable_lead_gen: Override<bool>,
    pub hide_competitors: Override<bool>,
}

impl EntityOverrides {
    /// True when every field inherits from the plan
    pub fn is_empty(&self) -> bool {
        self.custom_email_limit.is_inherit()
            && self.custom_update_limit.is_inherit()
            && self.enable_analytics.is_inherit()
            && self.enable_lead_gen.is_inherit()
            && self.hide_competitors.is_inherit()
    }
}

/// Resolved limits and features of a business
///
/// Never stored; recompute with [`resolve_features`] on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveFeatures {
    pub email_limit: u32,
    pub email_batch_size: BatchSize,
    pub update_limit: u32,
    pub analytics_tier: AnalyticsTier,
    pub has_lead_gen: bool,
    pub should_hide_competitors: bool,
}

impl EffectiveFeatures {
    /// Whether dashboards may show analytics at `required` level
    pub fn analytics_at_least(&self, required: AnalyticsTier) -> bool {
        self.analytics_tier >= required
    }
}

fn resolve_analytics(enable: Override<bool>, default: AnalyticsTier) -> AnalyticsTier {
    match enable {
        Override::Set(true) => AnalyticsTier::Pro,
        Override::Set(false) => AnalyticsTier::Basic,
        Override::Inherit => default,
    }
}

/// Merge tier defaults with a business's overrides
pub fn resolve_features(tier: PlanTier, overrides: &EntityOverrides) -> EffectiveFeatures {
    let defaults = tier.defaults();

    EffectiveFeatures {
        email_limit: overrides.custom_email_limit.or_inherit(defaults.email_limit),
        email_batch_size: defaults.email_batch_size,
        update_limit: overrides.custom_update_limit.or_inherit(defaults.update_limit),
        analytics_tier: resolve_analytics(overrides.enable_analytics, defaults.analytics_tier),
        has_lead_gen: overrides.enable_lead_gen.or_inherit(defaults.has_lead_gen),
        should_hide_competitors: overrides.hide_competitors.or_inherit(defaults.hide_competitors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_without_overrides() {
        let features = resolve_features(PlanTier::Free, &EntityOverrides::default());
        assert_eq!(
            features,
            EffectiveFeatures {
                email_limit: 10,
                email_batch_size: BatchSize::Limited(50),
                update_limit: 0,
                analytics_tier: AnalyticsTier::Basic,
                has_lead_gen: false,
                should_hide_competitors: false,
            }
        );
    }

    #[test]
    fn test_growth_email_override_only_touches_email_limit() {
        let overrides = EntityOverrides {
            custom_email_limit: Override::Set(500),
            ..Default::default()
        };
        let features = resolve_features(PlanTier::Growth, &overrides);
        let plain = resolve_features(PlanTier::Growth, &EntityOverrides::default());

        assert_eq!(features.email_limit, 500);
        assert_eq!(features.update_limit, plain.update_limit);
        assert_eq!(features.email_batch_size, plain.email_batch_size);
        assert_eq!(features.analytics_tier, AnalyticsTier::Advanced);
        assert_eq!(features.has_lead_gen, plain.has_lead_gen);
        assert_eq!(features.should_hide_competitors, plain.should_hide_competitors);
    }

    #[test]
    fn test_analytics_false_forces_basic() {
        let overrides = EntityOverrides {
            enable_analytics: Override::Set(false),
            ..Default::default()
        };

        assert_eq!(
            resolve_features(PlanTier::Free, &overrides).analytics_tier,
            AnalyticsTier::Basic
        );
        // GROWTH defaults to ADVANCED; the explicit false must still win
        assert_eq!(
            resolve_features(PlanTier::Growth, &overrides).analytics_tier,
            AnalyticsTier::Basic
        );
        assert_eq!(
            resolve_features(PlanTier::Scale, &overrides).analytics_tier,
            AnalyticsTier::Basic
        );
    }

    #[test]
    fn test_analytics_true_forces_pro() {
        let overrides = EntityOverrides {
            enable_analytics: Override::Set(true),
            ..Default::default()
        };
        for tier in PlanTier::ALL {
            assert_eq!(
                resolve_features(tier, &overrides).analytics_tier,
                AnalyticsTier::Pro,
                "{} with analytics forced on",
                tier
            );
        }
    }

    #[test]
    fn test_inherit_uses_tier_default_for_every_tier() {
        for tier in PlanTier::ALL {
            let defaults = tier.defaults();
            let features = resolve_features(tier, &EntityOverrides::default());
            assert_eq!(features.email_limit, defaults.email_limit);
            assert_eq!(features.email_batch_size, defaults.email_batch_size);
            assert_eq!(features.update_limit, defaults.update_limit);
            assert_eq!(features.analytics_tier, defaults.analytics_tier);
            assert_eq!(features.has_lead_gen, defaults.has_lead_gen);
            assert_eq!(features.should_hide_competitors, defaults.hide_competitors);
        }
    }

    #[test]
    fn test_boolean_overrides_coalesce() {
        let overrides = EntityOverrides {
            enable_lead_gen: Override::Set(false),
            hide_competitors: Override::Set(true),
            ..Default::default()
        };
        let features = resolve_features(PlanTier::Growth, &overrides);
        assert!(!features.has_lead_gen);
        assert!(features.should_hide_competitors);
    }

    #[test]
    fn test_zero_override_is_not_inherit() {
        let overrides = EntityOverrides {
            custom_update_limit: Override::Set(0),
            ..Default::default()
        };
        assert_eq!(resolve_features(PlanTier::Scale, &overrides).update_limit, 0);
    }

    #[test]
    fn test_unknown_tier_falls_back_to_free() {
        let tier = PlanTier::parse_or_free(Some("UNKNOWN_TIER"));
        assert_eq!(tier, PlanTier::Free);
        assert_eq!(
            resolve_features(tier, &EntityOverrides::default()),
            resolve_features(PlanTier::Free, &EntityOverrides::default())
        );
        assert_eq!(PlanTier::parse_or_free(None), PlanTier::Free);
        assert_eq!(PlanTier::parse_or_free(Some("")), PlanTier::Free);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("growth".parse::<PlanTier>().unwrap(), PlanTier::Growth);
        assert_eq!(" SCALE ".parse::<PlanTier>().unwrap(), PlanTier::Scale);
        assert!("platinum".parse::<PlanTier>().is_err());
        for tier in PlanTier::ALL {
            assert_eq!(tier.as_str().parse::<PlanTier>().unwrap(), tier);
        }
    }

    #[test]
    fn test_custom_tier_batch_unbounded() {
        let features = resolve_features(PlanTier::Custom, &EntityOverrides::default());
        assert_eq!(features.email_batch_size, BatchSize::Unbounded);
        assert_eq!(features.email_batch_size.limit(), None);
    }

    #[test]
    fn test_analytics_at_least() {
        let features = resolve_features(PlanTier::Growth, &EntityOverrides::default());
        assert!(features.analytics_at_least(AnalyticsTier::Basic));
        assert!(features.analytics_at_least(AnalyticsTier::Advanced));
        assert!(!features.analytics_at_least(AnalyticsTier::Pro));
    }

    #[test]
    fn test_overrides_json_null_means_inherit() {
        let overrides: EntityOverrides = serde_json::from_str(
            r#"{"custom_email_limit": 250, "enable_analytics": false, "enable_lead_gen": null}"#,
        )
        .unwrap();

        assert_eq!(overrides.custom_email_limit, Override::Set(250));
        assert_eq!(overrides.enable_analytics, Override::Set(false));
        assert_eq!(overrides.enable_lead_gen, Override::Inherit);
        assert_eq!(overrides.hide_competitors, Override::Inherit);
        assert!(!overrides.is_empty());
        assert!(EntityOverrides::default().is_empty());
    }

    #[test]
    fn test_features_json_shape() {
        let features = resolve_features(PlanTier::Custom, &EntityOverrides::default());
        let value = serde_json::to_value(features).unwrap();
        assert_eq!(value["analytics_tier"], "PRO");
        assert!(value["email_batch_size"].is_null());

        let free = serde_json::to_value(resolve_features(
            PlanTier::Free,
            &EntityOverrides::default(),
        ))
        .unwrap();
        assert_eq!(free["email_batch_size"], 50);
        assert_eq!(free["should_hide_competitors"], false);
    }
}
