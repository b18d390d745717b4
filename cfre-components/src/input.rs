//! Calculation request types and their validation.
//!
//! Validation is a pure function of the input, run before any storage call:
//! an invalid request never touches the factor or baseline stores.

use cfre_core::errors::{CfreError, CfreResult};
use serde::{Deserialize, Serialize};

/// Meal category the request is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    MeatSimple,
    MeatFull,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::MeatSimple => "meat_simple",
            MealType::MeatFull => "meat_full",
        }
    }
}

/// Kitchen energy carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    Electric,
    Gas,
    Mixed,
}

impl EnergyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyType::Electric => "electric",
            EnergyType::Gas => "gas",
            EnergyType::Mixed => "mixed",
        }
    }
}

/// Precision tier of a calculation.
///
/// L1 uses coarse per-restaurant-type constants for the non-ingredient
/// parts, L2 derives energy from the standard cooking model, L3 additionally
/// accepts measured meter readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationLevel {
    L1,
    L2,
    L3,
}

/// One ingredient line of a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientEntry {
    pub name: String,
    /// Optional grouping hint carried through to the breakdown untouched.
    #[serde(default)]
    pub category: Option<String>,
    pub weight_g: f64,
    /// Fraction of the purchased weight discarded before cooking, in
    /// `[0, 1)`. Absent means no waste adjustment.
    #[serde(default)]
    pub waste_rate: Option<f64>,
}

/// One declared packaging item, weighed in kg of material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingEntry {
    pub material: String,
    pub weight_kg: f64,
}

/// One inbound transport leg for the ingredients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportLeg {
    pub mode: String,
    pub distance_km: f64,
    pub weight_kg: f64,
}

/// Measured kitchen energy attributable to this dish, for L3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub energy_kwh: f64,
}

/// A complete calculation request for one menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemInput {
    pub name: String,
    /// Caller's restaurant identifier, carried through for correlation.
    #[serde(default)]
    pub restaurant_id: Option<String>,
    pub meal_type: MealType,
    pub energy_type: EnergyType,
    pub level: CalculationLevel,
    pub ingredients: Vec<IngredientEntry>,
    /// Cooking method token, e.g. `"stir_fried"`; unknown tokens behave as
    /// no method.
    #[serde(default)]
    pub cooking_method: Option<String>,
    /// Declared cooking time; overrides the method's standard minutes.
    #[serde(default)]
    pub cooking_time_min: Option<f64>,
    /// Declared appliance power; overrides the method's standard power.
    #[serde(default)]
    pub power_kw: Option<f64>,
    /// Raw region token; absent or unrecognized falls back to the national
    /// average.
    #[serde(default)]
    pub region: Option<String>,
    /// Free-form restaurant address, used to infer the region when no
    /// explicit token is given.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub restaurant_type: Option<String>,
    #[serde(default)]
    pub packaging: Vec<PackagingEntry>,
    #[serde(default)]
    pub transport: Vec<TransportLeg>,
    /// Only consulted at L3.
    #[serde(default)]
    pub meter: Option<MeterReading>,
}

impl MenuItemInput {
    /// Reject malformed requests before any store is consulted.
    ///
    /// Checks: at least one ingredient, every weight finite and
    /// non-negative (zero weight is a valid zero contribution), every waste
    /// rate in `[0, 1)`, packaging and transport quantities non-negative,
    /// and a non-negative meter reading.
    pub fn validate(&self) -> CfreResult<()> {
        if self.ingredients.is_empty() {
            return Err(CfreError::InvalidInput(format!(
                "menu item '{}' has no ingredients",
                self.name
            )));
        }
        for ingredient in &self.ingredients {
            if !(ingredient.weight_g.is_finite() && ingredient.weight_g >= 0.0) {
                return Err(CfreError::InvalidWeight {
                    name: ingredient.name.clone(),
                    weight: ingredient.weight_g,
                });
            }
            if let Some(rate) = ingredient.waste_rate {
                if !(rate.is_finite() && (0.0..1.0).contains(&rate)) {
                    return Err(CfreError::InvalidWasteRate {
                        name: ingredient.name.clone(),
                        rate,
                    });
                }
            }
        }
        for entry in &self.packaging {
            if !(entry.weight_kg.is_finite() && entry.weight_kg >= 0.0) {
                return Err(CfreError::InvalidInput(format!(
                    "packaging '{}' has invalid weight {} kg",
                    entry.material, entry.weight_kg
                )));
            }
        }
        for leg in &self.transport {
            if !(leg.distance_km.is_finite() && leg.distance_km >= 0.0) {
                return Err(CfreError::InvalidInput(format!(
                    "transport leg '{}' has invalid distance {} km",
                    leg.mode, leg.distance_km
                )));
            }
            if !(leg.weight_kg.is_finite() && leg.weight_kg >= 0.0) {
                return Err(CfreError::InvalidInput(format!(
                    "transport leg '{}' has invalid weight {} kg",
                    leg.mode, leg.weight_kg
                )));
            }
        }
        if let Some(minutes) = self.cooking_time_min {
            if !(minutes.is_finite() && minutes >= 0.0) {
                return Err(CfreError::InvalidInput(format!(
                    "cooking time {minutes} min is invalid"
                )));
            }
        }
        if let Some(power) = self.power_kw {
            if !(power.is_finite() && power >= 0.0) {
                return Err(CfreError::InvalidInput(format!(
                    "appliance power {power} kW is invalid"
                )));
            }
        }
        if let Some(meter) = self.meter {
            if !(meter.energy_kwh.is_finite() && meter.energy_kwh >= 0.0) {
                return Err(CfreError::InvalidInput(format!(
                    "meter reading {} kWh is invalid",
                    meter.energy_kwh
                )));
            }
        }
        Ok(())
    }
}
