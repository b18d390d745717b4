//! The storage boundary.
//!
//! The engine never talks to a database directly: it is handed two read-only
//! lookup capabilities, [`FactorStore`] and [`BaselineStore`]. Stores perform
//! plain set-membership filtering; all ranking and tie-breaking lives in the
//! resolvers. [`MemoryStore`] implements both traits and doubles as the
//! reference adapter and the test double.

use crate::baseline::{Baseline, BaselineStatus};
use crate::factor::{EmissionFactor, FactorCategory, FactorStatus};
use crate::region::Region;
use chrono::NaiveDate;
use thiserror::Error;

/// Failure of the underlying lookup capability.
///
/// Distinct from validation errors and from the soft unresolved-factor /
/// unresolved-baseline outcomes: a storage error is propagated to the caller
/// untouched. Retry policy, if any, belongs to the storage adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("malformed record {id}: {reason}")]
    Malformed { id: String, reason: String },
}

/// Filter for factor lookups.
///
/// All set fields must match. Region matching is canonical: adapters compare
/// `Region::normalize` of the stored code against the filter region, so a
/// factor stored under the legacy `"CN"` code matches a `national_average`
/// query. Alias matching is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FactorFilter {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub region: Option<Region>,
    pub status: Option<FactorStatus>,
    pub category: Option<FactorCategory>,
}

/// Filter for baseline lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineFilter {
    pub baseline_id: String,
    pub status: Option<BaselineStatus>,
    /// When set, only records whose effective/expiry window contains the
    /// date.
    pub on_date: Option<NaiveDate>,
    /// When true, only records with no effective/expiry window.
    pub unscoped_only: bool,
}

/// Read-only factor lookup supplied by the storage layer.
pub trait FactorStore: Send + Sync {
    /// Return every factor matching the filter, in no particular order.
    fn find_factors(&self, filter: &FactorFilter) -> Result<Vec<EmissionFactor>, StorageError>;
}

/// Read-only baseline lookup supplied by the storage layer.
pub trait BaselineStore: Send + Sync {
    /// Return every baseline matching the filter, ordered by version
    /// descending.
    fn find_baselines(&self, filter: &BaselineFilter) -> Result<Vec<Baseline>, StorageError>;
}

impl<S: FactorStore + ?Sized> FactorStore for &S {
    fn find_factors(&self, filter: &FactorFilter) -> Result<Vec<EmissionFactor>, StorageError> {
        (**self).find_factors(filter)
    }
}

impl<S: BaselineStore + ?Sized> BaselineStore for &S {
    fn find_baselines(&self, filter: &BaselineFilter) -> Result<Vec<Baseline>, StorageError> {
        (**self).find_baselines(filter)
    }
}

/// In-memory store over plain vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    factors: Vec<EmissionFactor>,
    baselines: Vec<Baseline>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factors(mut self, factors: Vec<EmissionFactor>) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_baselines(mut self, baselines: Vec<Baseline>) -> Self {
        self.baselines = baselines;
        self
    }

    pub fn push_factor(&mut self, factor: EmissionFactor) {
        self.factors.push(factor);
    }

    pub fn push_baseline(&mut self, baseline: Baseline) {
        self.baselines.push(baseline);
    }

    fn factor_matches(factor: &EmissionFactor, filter: &FactorFilter) -> bool {
        if let Some(name) = &filter.name {
            if !factor.name.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        if let Some(alias) = &filter.alias {
            let alias = alias.to_lowercase();
            if !factor.aliases.iter().any(|a| a.to_lowercase() == alias) {
                return false;
            }
        }
        if let Some(region) = filter.region {
            if Region::normalize(Some(&factor.region)) != region {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if factor.status != status {
                return false;
            }
        }
        if let Some(category) = filter.category {
            if factor.category != category {
                return false;
            }
        }
        true
    }

    fn baseline_matches(baseline: &Baseline, filter: &BaselineFilter) -> bool {
        if baseline.baseline_id != filter.baseline_id {
            return false;
        }
        if let Some(status) = filter.status {
            if baseline.status != status {
                return false;
            }
        }
        if filter.unscoped_only
            && (baseline.effective_date.is_some() || baseline.expiry_date.is_some())
        {
            return false;
        }
        if let Some(date) = filter.on_date {
            let effective_ok = baseline.effective_date.is_some_and(|d| d <= date);
            let expiry_ok = baseline.expiry_date.is_some_and(|d| d >= date);
            if !(effective_ok && expiry_ok) {
                return false;
            }
        }
        true
    }
}

impl FactorStore for MemoryStore {
    fn find_factors(&self, filter: &FactorFilter) -> Result<Vec<EmissionFactor>, StorageError> {
        Ok(self
            .factors
            .iter()
            .filter(|f| Self::factor_matches(f, filter))
            .cloned()
            .collect())
    }
}

impl BaselineStore for MemoryStore {
    fn find_baselines(&self, filter: &BaselineFilter) -> Result<Vec<Baseline>, StorageError> {
        let mut matches: Vec<Baseline> = self
            .baselines
            .iter()
            .filter(|b| Self::baseline_matches(b, filter))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(matches)
    }
}
