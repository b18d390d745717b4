//! Emission factor records and the factor resolution policy.
//!
//! Resolution is a lookup/ranking policy, not a fuzzy-text algorithm: each
//! step is deterministic set-membership plus a tie-break by recency. The
//! steps form an explicit ordered list of strategies evaluated in sequence,
//! short-circuiting on the first hit, which keeps the policy auditable and
//! testable per tier:
//!
//! 1. exact canonical name in the requested region,
//! 2. alias containment in the requested region,
//! 3. both again with the region relaxed to [`DEFAULT_REGION`].
//!
//! A miss on all four attempts is not an error; the caller records a warning
//! and treats the ingredient's contribution as zero.

use crate::region::{Region, DEFAULT_REGION};
use crate::storage::{FactorFilter, FactorStore, StorageError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Lifecycle state of a factor record. Records are archived, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorStatus {
    Active,
    Archived,
    Draft,
}

/// Broad class of emission factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Ingredient,
    Energy,
    Material,
    Transport,
}

/// A standard carbon-intensity value for an ingredient, energy carrier,
/// packaging material or transport mode.
///
/// Exactly one canonical name per factor id. Aliases are searchable but do
/// not identify a unique factor: several records may share an alias across
/// regions and years, and resolution disambiguates by `status == Active`
/// plus the highest `(year, version)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    pub factor_id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub category: FactorCategory,
    #[serde(default)]
    pub sub_category: Option<String>,
    pub factor_value: f64,
    pub unit: String,
    /// Raw region code as stored; may be legacy (`"CN"`) or canonical.
    pub region: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default = "default_version")]
    pub version: String,
    pub status: FactorStatus,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// How a factor was matched, recorded on the per-ingredient breakdown for
/// audit purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorMatchLevel {
    ExactRegion,
    Alias,
    RegionRelaxed,
    RegionRelaxedAlias,
}

/// A factor together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFactor {
    pub factor: EmissionFactor,
    pub match_level: FactorMatchLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    Name,
    Alias,
}

/// Resolve the best-matching emission factor for a name within a region.
///
/// `category`, when given, scopes the search (the same chain serves
/// ingredient, energy, packaging-material and transport lookups). Returns
/// `Ok(None)` when no strategy matches; storage failures propagate.
///
/// Repeated calls with identical arguments over an unchanged data set return
/// the same factor id: candidates are ranked by year descending, then
/// version descending, then factor id ascending.
pub fn resolve_factor<S: FactorStore + ?Sized>(
    store: &S,
    name: &str,
    region: Region,
    category: Option<FactorCategory>,
) -> Result<Option<ResolvedFactor>, StorageError> {
    let attempts = [
        (region, MatchMode::Name, FactorMatchLevel::ExactRegion),
        (region, MatchMode::Alias, FactorMatchLevel::Alias),
        (DEFAULT_REGION, MatchMode::Name, FactorMatchLevel::RegionRelaxed),
        (
            DEFAULT_REGION,
            MatchMode::Alias,
            FactorMatchLevel::RegionRelaxedAlias,
        ),
    ];

    for (target, mode, match_level) in attempts {
        // The relaxed attempts repeat the first two when the request already
        // targets the default region
        if region == DEFAULT_REGION
            && matches!(
                match_level,
                FactorMatchLevel::RegionRelaxed | FactorMatchLevel::RegionRelaxedAlias
            )
        {
            break;
        }

        let mut filter = FactorFilter {
            region: Some(target),
            status: Some(FactorStatus::Active),
            category,
            ..Default::default()
        };
        match mode {
            MatchMode::Name => filter.name = Some(name.to_string()),
            MatchMode::Alias => filter.alias = Some(name.to_string()),
        }

        let candidates = store.find_factors(&filter)?;
        if let Some(factor) = best_candidate(candidates) {
            debug!(
                "factor '{}' matched {} in {} via {:?}",
                name, factor.factor_id, target, match_level
            );
            return Ok(Some(ResolvedFactor {
                factor,
                match_level,
            }));
        }
    }

    Ok(None)
}

/// Pick the most recent candidate: year descending (records without a year
/// rank last), version descending, factor id ascending as the final
/// deterministic tie-break.
fn best_candidate(mut candidates: Vec<EmissionFactor>) -> Option<EmissionFactor> {
    candidates.sort_by(|a, b| {
        let by_year = b.year.unwrap_or(i32::MIN).cmp(&a.year.unwrap_or(i32::MIN));
        if by_year != Ordering::Equal {
            return by_year;
        }
        let by_version = b.version.cmp(&a.version);
        if by_version != Ordering::Equal {
            return by_version;
        }
        a.factor_id.cmp(&b.factor_id)
    });
    candidates.into_iter().next()
}
