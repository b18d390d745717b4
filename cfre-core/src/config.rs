//! Engine configuration.
//!
//! All tunable tables live here as one static, versioned value supplied at
//! startup — cooking-method multipliers, carbon-label thresholds, the
//! standard energy model and the L1 estimates. Nothing is fetched per call.
//! Defaults match the platform's published parameter set; deployments
//! override them from a TOML table via [`EngineConfig::from_toml_str`].

use crate::errors::{CfreError, CfreResult};
use crate::region::{Region, DEFAULT_REGION};
use serde::{Deserialize, Serialize};

/// Coarse consumer-facing tier derived from the reduction percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarbonLabel {
    UltraLow,
    Low,
    Medium,
    High,
}

/// One row of the cooking-method multiplier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookingMultiplier {
    pub method: String,
    pub multiplier: f64,
}

/// One row of the label threshold table: reductions of at least
/// `min_reduction` earn `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelThreshold {
    pub min_reduction: f64,
    pub label: CarbonLabel,
}

/// Standard time and power assumed for a cooking method when the caller
/// declares neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodProfile {
    pub method: String,
    pub minutes: f64,
    pub power_kw: f64,
}

/// The L2/L3 standard energy model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyModel {
    /// National grid average emission factor, kg CO₂e per kWh.
    pub electric_kg_per_kwh: f64,
    /// IPCC natural gas factor, kg CO₂e per m³.
    pub gas_kg_per_m3: f64,
    /// Burner flow assumed per kW of rated power, m³ per hour.
    pub gas_flow_m3_per_kw: f64,
    pub profiles: Vec<MethodProfile>,
    /// Fallbacks for methods without a profile.
    pub default_minutes: f64,
    pub default_power_kw: f64,
}

impl Default for EnergyModel {
    fn default() -> Self {
        let profile = |method: &str, minutes: f64, power_kw: f64| MethodProfile {
            method: method.to_string(),
            minutes,
            power_kw,
        };
        Self {
            electric_kg_per_kwh: 0.5703,
            gas_kg_per_m3: 2.16,
            gas_flow_m3_per_kw: 0.1,
            profiles: vec![
                profile("raw", 0.0, 0.0),
                profile("steamed", 15.0, 2.0),
                profile("boiled", 20.0, 1.5),
                profile("stir_fried", 5.0, 3.0),
                profile("fried", 8.0, 5.0),
                profile("baked", 45.0, 4.0),
            ],
            default_minutes: 10.0,
            default_power_kw: 2.0,
        }
    }
}

/// Coarse L1 constants for one restaurant type, kg CO₂e per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L1Estimate {
    pub restaurant_type: String,
    pub energy: f64,
    pub packaging: f64,
    pub transport: f64,
}

/// Static configuration consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub version: String,
    pub default_region: Region,
    /// Multiplier applied to each ingredient contribution per cooking
    /// method; unknown or absent methods use 1.0.
    pub cooking_multipliers: Vec<CookingMultiplier>,
    /// Ordered descending by `min_reduction`; the first row the reduction
    /// meets wins.
    pub label_thresholds: Vec<LabelThreshold>,
    pub energy: EnergyModel,
    /// Keyed by restaurant type; the `"default"` row must exist.
    pub l1_estimates: Vec<L1Estimate>,
    /// Flat packaging allowance when no packaging entries are declared,
    /// kg CO₂e.
    pub packaging_default_kg_co2e: f64,
    /// Flat transport allowance when no transport leg is declared, kg CO₂e.
    pub transport_default_kg_co2e: f64,
    /// Decimal places used for displayed values and part sums.
    pub display_decimals: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let multiplier = |method: &str, multiplier: f64| CookingMultiplier {
            method: method.to_string(),
            multiplier,
        };
        let threshold = |min_reduction: f64, label: CarbonLabel| LabelThreshold {
            min_reduction,
            label,
        };
        Self {
            version: "2025.1".to_string(),
            default_region: DEFAULT_REGION,
            cooking_multipliers: vec![
                multiplier("raw", 1.0),
                multiplier("steamed", 1.1),
                multiplier("boiled", 1.15),
                multiplier("stir_fried", 1.5),
                multiplier("baked", 1.6),
                multiplier("fried", 1.7),
            ],
            label_thresholds: vec![
                threshold(0.35, CarbonLabel::UltraLow),
                threshold(0.20, CarbonLabel::Low),
                threshold(0.05, CarbonLabel::Medium),
                threshold(0.0, CarbonLabel::High),
            ],
            energy: EnergyModel::default(),
            l1_estimates: vec![
                L1Estimate {
                    restaurant_type: "default".to_string(),
                    energy: 0.30,
                    packaging: 0.05,
                    transport: 0.05,
                },
                L1Estimate {
                    restaurant_type: "fast_food".to_string(),
                    energy: 0.20,
                    packaging: 0.08,
                    transport: 0.04,
                },
                L1Estimate {
                    restaurant_type: "formal_dining".to_string(),
                    energy: 0.45,
                    packaging: 0.03,
                    transport: 0.06,
                },
            ],
            packaging_default_kg_co2e: 0.05,
            transport_default_kg_co2e: 0.02,
            display_decimals: 3,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML table, falling back to defaults for
    /// absent fields, and validate it.
    pub fn from_toml_str(raw: &str) -> CfreResult<Self> {
        let config: EngineConfig =
            toml::from_str(raw).map_err(|e| CfreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency: positive multipliers and factors,
    /// strictly descending label thresholds, a `"default"` L1 row, and a
    /// sane display precision.
    pub fn validate(&self) -> CfreResult<()> {
        for row in &self.cooking_multipliers {
            if !(row.multiplier.is_finite() && row.multiplier > 0.0) {
                return Err(CfreError::Config(format!(
                    "cooking multiplier for '{}' must be positive, got {}",
                    row.method, row.multiplier
                )));
            }
        }
        if self.label_thresholds.is_empty() {
            return Err(CfreError::Config("label threshold table is empty".into()));
        }
        for pair in self.label_thresholds.windows(2) {
            if pair[0].min_reduction <= pair[1].min_reduction {
                return Err(CfreError::Config(
                    "label thresholds must be strictly descending".into(),
                ));
            }
        }
        for row in &self.label_thresholds {
            if !(0.0..=1.0).contains(&row.min_reduction) {
                return Err(CfreError::Config(format!(
                    "label threshold {} outside [0, 1]",
                    row.min_reduction
                )));
            }
        }
        if !self
            .l1_estimates
            .iter()
            .any(|e| e.restaurant_type == "default")
        {
            return Err(CfreError::Config(
                "l1_estimates must contain a 'default' row".into(),
            ));
        }
        if self.energy.electric_kg_per_kwh <= 0.0 || self.energy.gas_kg_per_m3 <= 0.0 {
            return Err(CfreError::Config("energy factors must be positive".into()));
        }
        if self.display_decimals > 9 {
            return Err(CfreError::Config(format!(
                "display_decimals {} exceeds 9",
                self.display_decimals
            )));
        }
        Ok(())
    }

    /// Multiplier for a cooking method; 1.0 for unknown or absent methods.
    pub fn cooking_multiplier(&self, method: Option<&str>) -> f64 {
        method
            .and_then(|m| {
                self.cooking_multipliers
                    .iter()
                    .find(|row| row.method == m)
                    .map(|row| row.multiplier)
            })
            .unwrap_or(1.0)
    }

    /// Label for a reduction percentage in `[0, 1]`.
    pub fn label_for(&self, reduction: f64) -> CarbonLabel {
        self.label_thresholds
            .iter()
            .find(|row| reduction >= row.min_reduction)
            .map(|row| row.label)
            .unwrap_or(CarbonLabel::High)
    }

    /// Standard minutes and power for a cooking method.
    pub fn method_profile(&self, method: Option<&str>) -> (f64, f64) {
        method
            .and_then(|m| self.energy.profiles.iter().find(|p| p.method == m))
            .map(|p| (p.minutes, p.power_kw))
            .unwrap_or((self.energy.default_minutes, self.energy.default_power_kw))
    }

    /// L1 estimates for a restaurant type, falling back to the `"default"`
    /// row.
    pub fn l1_estimate(&self, restaurant_type: Option<&str>) -> &L1Estimate {
        restaurant_type
            .and_then(|t| self.l1_estimates.iter().find(|e| e.restaurant_type == t))
            .or_else(|| {
                self.l1_estimates
                    .iter()
                    .find(|e| e.restaurant_type == "default")
            })
            .expect("validated config has a default L1 row")
    }

    /// Round a value to the configured display precision.
    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.display_decimals as i32);
        (value * scale).round() / scale
    }
}
