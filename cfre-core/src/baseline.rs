//! Baseline records and the tiered baseline resolution policy.
//!
//! A baseline is a reference (non-vegetarian) footprint for a category of
//! meal, used only to compute a relative reduction percentage. Lookups run
//! through three tiers of decreasing strictness, short-circuiting on the
//! first hit:
//!
//! 1. active records with no date window,
//! 2. active records whose effective/expiry window contains the query date,
//! 3. any status at all — a last resort so the caller gets *something* if a
//!    record with that id exists in any state.
//!
//! A miss on all tiers means the reduction percentage is omitted from the
//! result, never zeroed and never an error.

use crate::footprint::Footprint;
use crate::region::Region;
use crate::storage::{BaselineFilter, BaselineStore, StorageError};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Token substituted for an absent optional category field when deriving a
/// baseline id.
pub const DEFAULT_TOKEN: &str = "default";

/// Lifecycle state of a baseline version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineStatus {
    Draft,
    Active,
}

/// The composite category a baseline applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineCategory {
    pub meal_type: String,
    pub region: Region,
    pub energy_type: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub restaurant_type: Option<String>,
}

impl BaselineCategory {
    /// Derive the baseline id from the category fields.
    ///
    /// The id is a pure function of the category: the fields are joined with
    /// `"_"`, with absent optional fields substituted by [`DEFAULT_TOKEN`].
    /// Recomputing from the category always reproduces the stored id, which
    /// is relied on both when writing records and when re-deriving lookups.
    pub fn baseline_id(&self) -> String {
        [
            self.meal_type.as_str(),
            self.region.as_str(),
            self.energy_type.as_str(),
            self.city.as_deref().unwrap_or(DEFAULT_TOKEN),
            self.restaurant_type.as_deref().unwrap_or(DEFAULT_TOKEN),
        ]
        .join("_")
    }

    /// The same category with its region replaced.
    pub fn in_region(&self, region: Region) -> BaselineCategory {
        BaselineCategory {
            region,
            ..self.clone()
        }
    }
}

/// A versioned reference footprint for a meal category.
///
/// Multiple versions may coexist; resolution always prefers the highest
/// version among matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub baseline_id: String,
    pub category: BaselineCategory,
    pub carbon_footprint: Footprint,
    #[serde(default)]
    pub source: Option<String>,
    pub version: u32,
    pub status: BaselineStatus,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

/// Which query tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineTier {
    Active,
    DateScoped,
    AnyStatus,
}

/// A baseline together with the tier that found it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMatch {
    pub baseline: Baseline,
    pub tier: BaselineTier,
}

/// Resolve the most specific applicable baseline for a category.
///
/// Returns `Ok(None)` when no record with the derived id exists in any
/// state; storage failures propagate.
pub fn resolve_baseline<S: BaselineStore + ?Sized>(
    store: &S,
    category: &BaselineCategory,
    query_date: NaiveDate,
) -> Result<Option<BaselineMatch>, StorageError> {
    let baseline_id = category.baseline_id();
    let tiers = [
        (
            BaselineFilter {
                baseline_id: baseline_id.clone(),
                status: Some(BaselineStatus::Active),
                unscoped_only: true,
                ..Default::default()
            },
            BaselineTier::Active,
        ),
        (
            BaselineFilter {
                baseline_id: baseline_id.clone(),
                status: Some(BaselineStatus::Active),
                on_date: Some(query_date),
                ..Default::default()
            },
            BaselineTier::DateScoped,
        ),
        (
            BaselineFilter {
                baseline_id: baseline_id.clone(),
                ..Default::default()
            },
            BaselineTier::AnyStatus,
        ),
    ];

    for (filter, tier) in tiers {
        // Highest version wins regardless of adapter ordering
        let mut matches = store.find_baselines(&filter)?;
        matches.sort_by(|a, b| b.version.cmp(&a.version));
        if let Some(baseline) = matches.into_iter().next() {
            debug!(
                "baseline {} v{} matched via tier {:?}",
                baseline.baseline_id, baseline.version, tier
            );
            return Ok(Some(BaselineMatch { baseline, tier }));
        }
    }

    Ok(None)
}

/// Resolve a list of categories, one single-resolve per entry.
///
/// Input order is preserved and failures are isolated per item: one
/// unresolved baseline or one storage error never aborts the batch.
pub fn resolve_baselines<S: BaselineStore + ?Sized>(
    store: &S,
    categories: &[BaselineCategory],
    query_date: NaiveDate,
) -> Vec<Result<Option<BaselineMatch>, StorageError>> {
    categories
        .iter()
        .map(|category| resolve_baseline(store, category, query_date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn category() -> BaselineCategory {
        BaselineCategory {
            meal_type: "meat_simple".to_string(),
            region: Region::EastChina,
            energy_type: "electric".to_string(),
            city: None,
            restaurant_type: None,
        }
    }

    fn baseline(version: u32, status: BaselineStatus) -> Baseline {
        let category = category();
        Baseline {
            baseline_id: category.baseline_id(),
            category,
            carbon_footprint: Footprint::Scalar(5.0),
            source: Some("test".to_string()),
            version,
            status,
            effective_date: None,
            expiry_date: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn baseline_id_substitutes_default_tokens() {
        assert_eq!(
            category().baseline_id(),
            "meat_simple_east_china_electric_default_default"
        );
        let with_city = BaselineCategory {
            city: Some("上海".to_string()),
            ..category()
        };
        assert_eq!(
            with_city.baseline_id(),
            "meat_simple_east_china_electric_上海_default"
        );
    }

    #[test]
    fn baseline_id_is_reproducible() {
        let c = category();
        assert_eq!(c.baseline_id(), c.baseline_id());
    }

    #[test]
    fn active_unscoped_record_matches_tier_one() {
        let store = MemoryStore::new().with_baselines(vec![baseline(1, BaselineStatus::Active)]);
        let matched = resolve_baseline(&store, &category(), today())
            .unwrap()
            .unwrap();
        assert_eq!(matched.tier, BaselineTier::Active);
    }

    #[test]
    fn date_scoped_record_needs_tier_two() {
        let mut scoped = baseline(1, BaselineStatus::Active);
        scoped.effective_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        scoped.expiry_date = NaiveDate::from_ymd_opt(2025, 12, 31);
        let store = MemoryStore::new().with_baselines(vec![scoped]);

        let matched = resolve_baseline(&store, &category(), today())
            .unwrap()
            .unwrap();
        assert_eq!(matched.tier, BaselineTier::DateScoped);
    }

    #[test]
    fn draft_only_record_needs_tier_three() {
        let store = MemoryStore::new().with_baselines(vec![baseline(1, BaselineStatus::Draft)]);
        let matched = resolve_baseline(&store, &category(), today())
            .unwrap()
            .unwrap();
        assert_eq!(matched.tier, BaselineTier::AnyStatus);
        assert_eq!(matched.baseline.status, BaselineStatus::Draft);
    }

    #[test]
    fn highest_version_wins_within_a_tier() {
        let store = MemoryStore::new().with_baselines(vec![
            baseline(2, BaselineStatus::Active),
            baseline(5, BaselineStatus::Active),
            baseline(3, BaselineStatus::Active),
        ]);
        let matched = resolve_baseline(&store, &category(), today())
            .unwrap()
            .unwrap();
        assert_eq!(matched.baseline.version, 5);
    }

    #[test]
    fn no_record_in_any_state_is_none() {
        let store = MemoryStore::new();
        assert!(resolve_baseline(&store, &category(), today())
            .unwrap()
            .is_none());
    }

    #[test]
    fn explicit_city_derives_a_different_id() {
        // A baseline stored without a city must not serve a query that
        // explicitly names one
        let store = MemoryStore::new().with_baselines(vec![baseline(1, BaselineStatus::Active)]);
        let with_city = BaselineCategory {
            city: Some("杭州".to_string()),
            ..category()
        };
        assert!(resolve_baseline(&store, &with_city, today())
            .unwrap()
            .is_none());
    }

    #[test]
    fn batch_preserves_order_and_isolates_misses() {
        let store = MemoryStore::new().with_baselines(vec![baseline(1, BaselineStatus::Active)]);
        let missing = BaselineCategory {
            meal_type: "meat_full".to_string(),
            ..category()
        };
        let results = resolve_baselines(&store, &[missing.clone(), category(), missing], today());
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().is_none());
        assert!(results[1].as_ref().unwrap().is_some());
        assert!(results[2].as_ref().unwrap().is_none());
    }
}
