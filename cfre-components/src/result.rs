//! Calculation result types.
//!
//! The result is self-describing for audit purposes: every ingredient line
//! records which factor matched and how, the baseline comparison records the
//! id, version, source and query tier, and soft failures surface as warnings
//! rather than being silently folded into the totals.

use cfre_core::baseline::BaselineTier;
use cfre_core::config::CarbonLabel;
use cfre_core::factor::FactorMatchLevel;
use cfre_core::footprint::{Footprint, FootprintParts};
use cfre_core::region::Region;
use serde::{Deserialize, Serialize};

use crate::input::CalculationLevel;

/// The factor applied to one ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedFactor {
    pub factor_id: String,
    pub factor_value: f64,
    pub unit: String,
    /// Raw region code of the matched record, as stored.
    pub region: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    pub match_level: FactorMatchLevel,
}

/// One line of the per-ingredient breakdown.
///
/// An unresolved ingredient keeps its line with `factor: None` and a zero
/// contribution, paired with an entry in the result's warning list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientContribution {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub weight_g: f64,
    #[serde(default)]
    pub waste_rate: Option<f64>,
    pub cooking_multiplier: f64,
    #[serde(default)]
    pub factor: Option<MatchedFactor>,
    /// kg CO₂e, rounded to the display precision.
    pub contribution: f64,
}

/// Baseline comparison block, present only when a baseline resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub baseline_id: String,
    pub baseline: f64,
    pub version: u32,
    #[serde(default)]
    pub source: Option<String>,
    pub tier: BaselineTier,
    /// `(baseline - total) / baseline`; omitted when the total exceeds the
    /// baseline or the baseline is non-positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<CarbonLabel>,
}

/// The outcome of a footprint calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub name: String,
    pub level: CalculationLevel,
    pub region: Region,
    /// Total kg CO₂e, rounded; equals the sum of the parts.
    pub total: f64,
    pub parts: FootprintParts,
    pub ingredients: Vec<IngredientContribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<BaselineComparison>,
    /// Soft failures: unresolved factors, unresolved baseline, fallbacks
    /// taken. Never fatal.
    #[serde(default)]
    pub warnings: Vec<String>,
    pub config_version: String,
}

impl CalculationResult {
    /// The result rendered as a storable footprint document.
    pub fn footprint(&self) -> Footprint {
        Footprint::Breakdown {
            value: self.total,
            baseline: self.comparison.as_ref().map(|c| c.baseline),
            reduction: self.comparison.as_ref().and_then(|c| c.reduction),
            breakdown: self.parts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_document_carries_the_comparison() {
        let result = CalculationResult {
            name: "测试".to_string(),
            level: CalculationLevel::L2,
            region: Region::EastChina,
            total: 1.0,
            parts: FootprintParts {
                ingredients: 0.6,
                energy: 0.3,
                packaging: 0.05,
                transport: 0.05,
            },
            ingredients: vec![],
            comparison: Some(BaselineComparison {
                baseline_id: "meat_simple_east_china_electric_default_default".to_string(),
                baseline: 2.0,
                version: 1,
                source: None,
                tier: BaselineTier::Active,
                reduction: Some(0.5),
                label: Some(CarbonLabel::UltraLow),
            }),
            warnings: vec![],
            config_version: "test".to_string(),
        };
        match result.footprint() {
            Footprint::Breakdown {
                value,
                baseline,
                reduction,
                breakdown,
            } => {
                assert_eq!(value, 1.0);
                assert_eq!(baseline, Some(2.0));
                assert_eq!(reduction, Some(0.5));
                assert!((breakdown.total() - 1.0).abs() < 1e-12);
            }
            Footprint::Scalar(_) => panic!("expected breakdown"),
        }
    }

    #[test]
    fn omitted_reduction_stays_omitted_in_the_document() {
        let result = CalculationResult {
            name: "测试".to_string(),
            level: CalculationLevel::L1,
            region: Region::NationalAverage,
            total: 3.0,
            parts: FootprintParts {
                ingredients: 3.0,
                ..Default::default()
            },
            ingredients: vec![],
            comparison: Some(BaselineComparison {
                baseline_id: "id".to_string(),
                baseline: 2.0,
                version: 1,
                source: None,
                tier: BaselineTier::AnyStatus,
                reduction: None,
                label: None,
            }),
            warnings: vec![],
            config_version: "test".to_string(),
        };
        let json = serde_json::to_value(result.footprint()).unwrap();
        assert!(json.get("reduction").is_none());
        assert_eq!(json["baseline"], 2.0);
    }
}
