//! The footprint calculator.
//!
//! One entry point, [`FootprintCalculator::calculate`], runs the full
//! pipeline: validate, normalize the region, resolve per-ingredient factors,
//! estimate the non-ingredient parts at the requested precision level,
//! assemble the rounded totals and compare against the resolved baseline.
//!
//! The calculator owns no mutable state. Configuration is validated once at
//! construction, the stores are read-only, and every call is independent, so
//! a single calculator is safely shared across threads.

use cfre_core::baseline::{resolve_baseline, BaselineCategory, BaselineMatch};
use cfre_core::config::EngineConfig;
use cfre_core::errors::CfreResult;
use cfre_core::factor::{resolve_factor, FactorCategory, ResolvedFactor};
use cfre_core::footprint::FootprintParts;
use cfre_core::region::{address_to_region, Region, DEFAULT_REGION};
use cfre_core::storage::{BaselineStore, FactorStore};
use chrono::{Local, NaiveDate};
use log::{debug, warn};

use crate::input::{CalculationLevel, EnergyType, MenuItemInput};
use crate::result::{
    BaselineComparison, CalculationResult, IngredientContribution, MatchedFactor,
};

/// Canonical factor names for the kitchen energy carriers.
const ELECTRICITY_FACTOR_NAME: &str = "electricity";
const NATURAL_GAS_FACTOR_NAME: &str = "natural_gas";

/// Grams per kilogram, the unit bridge between declared ingredient weights
/// and per-kg factors.
const G_PER_KG: f64 = 1000.0;

/// Kilograms per tonne, for tonne-kilometre transport factors.
const KG_PER_TONNE: f64 = 1000.0;

pub struct FootprintCalculator<F, B> {
    config: EngineConfig,
    factors: F,
    baselines: B,
}

impl<F: FactorStore, B: BaselineStore> FootprintCalculator<F, B> {
    /// Build a calculator over validated configuration and two stores.
    pub fn new(config: EngineConfig, factors: F, baselines: B) -> CfreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factors,
            baselines,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Calculate a footprint, dating the baseline lookup to today.
    pub fn calculate(&self, input: &MenuItemInput) -> CfreResult<CalculationResult> {
        self.calculate_on(input, Local::now().date_naive())
    }

    /// Calculate a footprint with an explicit baseline query date.
    pub fn calculate_on(
        &self,
        input: &MenuItemInput,
        query_date: NaiveDate,
    ) -> CfreResult<CalculationResult> {
        input.validate()?;

        let region = self.effective_region(input);
        let mut warnings = Vec::new();

        let ingredients = self.ingredient_contributions(input, region, &mut warnings)?;
        let ingredients_part: f64 = ingredients.iter().map(|i| i.contribution).sum();

        let (energy, packaging, transport) = match input.level {
            CalculationLevel::L1 => self.l1_parts(input),
            CalculationLevel::L2 => self.modelled_parts(input, region, None, &mut warnings)?,
            CalculationLevel::L3 => {
                self.modelled_parts(input, region, input.meter.map(|m| m.energy_kwh), &mut warnings)?
            }
        };

        let parts = FootprintParts {
            ingredients: self.config.round(ingredients_part),
            energy: self.config.round(energy),
            packaging: self.config.round(packaging),
            transport: self.config.round(transport),
        };
        let total = self.config.round(parts.total());

        let comparison =
            self.baseline_comparison(input, region, total, query_date, &mut warnings)?;

        debug!(
            "calculated '{}' at {:?} in {}: {} kg CO2e",
            input.name, input.level, region, total
        );

        Ok(CalculationResult {
            name: input.name.clone(),
            level: input.level,
            region,
            total,
            parts,
            ingredients,
            comparison,
            warnings,
            config_version: self.config.version.clone(),
        })
    }

    /// Explicit region token wins; otherwise infer from the address; fall
    /// back to the configured default.
    fn effective_region(&self, input: &MenuItemInput) -> Region {
        match &input.region {
            Some(raw) if !raw.trim().is_empty() => Region::normalize(Some(raw)),
            _ => input
                .address
                .as_deref()
                .and_then(address_to_region)
                .unwrap_or(self.config.default_region),
        }
    }

    fn ingredient_contributions(
        &self,
        input: &MenuItemInput,
        region: Region,
        warnings: &mut Vec<String>,
    ) -> CfreResult<Vec<IngredientContribution>> {
        let multiplier = self.config.cooking_multiplier(input.cooking_method.as_deref());
        let mut contributions = Vec::with_capacity(input.ingredients.len());

        for ingredient in &input.ingredients {
            let resolved = resolve_factor(
                &self.factors,
                &ingredient.name,
                region,
                Some(FactorCategory::Ingredient),
            )?;

            let (factor, contribution) = match resolved {
                Some(ResolvedFactor {
                    factor,
                    match_level,
                }) => {
                    let usable = 1.0 - ingredient.waste_rate.unwrap_or(0.0);
                    let raw = factor.factor_value
                        * (ingredient.weight_g / G_PER_KG)
                        * usable
                        * multiplier;
                    (
                        Some(MatchedFactor {
                            factor_id: factor.factor_id,
                            factor_value: factor.factor_value,
                            unit: factor.unit,
                            region: factor.region,
                            source: factor.source,
                            year: factor.year,
                            match_level,
                        }),
                        self.config.round(raw),
                    )
                }
                None => {
                    warn!("no emission factor for ingredient '{}'", ingredient.name);
                    warnings.push(format!(
                        "no emission factor matched ingredient '{}'; contribution counted as 0",
                        ingredient.name
                    ));
                    (None, 0.0)
                }
            };

            contributions.push(IngredientContribution {
                name: ingredient.name.clone(),
                category: ingredient.category.clone(),
                weight_g: ingredient.weight_g,
                waste_rate: ingredient.waste_rate,
                cooking_multiplier: multiplier,
                factor,
                contribution,
            });
        }

        Ok(contributions)
    }

    fn l1_parts(&self, input: &MenuItemInput) -> (f64, f64, f64) {
        let estimate = self.config.l1_estimate(input.restaurant_type.as_deref());
        (estimate.energy, estimate.packaging, estimate.transport)
    }

    /// Energy, packaging and transport from the standard model (L2) or a
    /// meter reading (L3).
    fn modelled_parts(
        &self,
        input: &MenuItemInput,
        region: Region,
        metered_kwh: Option<f64>,
        warnings: &mut Vec<String>,
    ) -> CfreResult<(f64, f64, f64)> {
        let electric_factor = self
            .energy_factor(ELECTRICITY_FACTOR_NAME, region)?
            .unwrap_or(self.config.energy.electric_kg_per_kwh);
        let gas_factor = self
            .energy_factor(NATURAL_GAS_FACTOR_NAME, region)?
            .unwrap_or(self.config.energy.gas_kg_per_m3);

        let energy = match metered_kwh {
            // Metered readings are electricity-equivalent kWh
            Some(kwh) => kwh * electric_factor,
            None => {
                let (standard_minutes, standard_power) =
                    self.config.method_profile(input.cooking_method.as_deref());
                let minutes = input.cooking_time_min.unwrap_or(standard_minutes);
                let power_kw = input.power_kw.unwrap_or(standard_power);
                let hours = minutes / 60.0;
                let electric_kg = power_kw * hours * electric_factor;
                let gas_kg =
                    power_kw * self.config.energy.gas_flow_m3_per_kw * hours * gas_factor;
                match input.energy_type {
                    EnergyType::Electric => electric_kg,
                    EnergyType::Gas => gas_kg,
                    EnergyType::Mixed => (electric_kg + gas_kg) / 2.0,
                }
            }
        };

        let packaging = if input.packaging.is_empty() {
            self.config.packaging_default_kg_co2e
        } else {
            let mut sum = 0.0;
            for entry in &input.packaging {
                match resolve_factor(
                    &self.factors,
                    &entry.material,
                    region,
                    Some(FactorCategory::Material),
                )? {
                    Some(resolved) => sum += resolved.factor.factor_value * entry.weight_kg,
                    None => warnings.push(format!(
                        "no emission factor matched packaging material '{}'; entry counted as 0",
                        entry.material
                    )),
                }
            }
            sum
        };

        let transport = if input.transport.is_empty() {
            self.config.transport_default_kg_co2e
        } else {
            let mut sum = 0.0;
            for leg in &input.transport {
                match resolve_factor(
                    &self.factors,
                    &leg.mode,
                    region,
                    Some(FactorCategory::Transport),
                )? {
                    // Transport factors are kg CO2e per tonne-kilometre
                    Some(resolved) => {
                        sum += resolved.factor.factor_value
                            * leg.distance_km
                            * (leg.weight_kg / KG_PER_TONNE)
                    }
                    None => warnings.push(format!(
                        "no emission factor matched transport mode '{}'; leg counted as 0",
                        leg.mode
                    )),
                }
            }
            sum
        };

        Ok((energy, packaging, transport))
    }

    fn energy_factor(&self, name: &str, region: Region) -> CfreResult<Option<f64>> {
        Ok(
            resolve_factor(&self.factors, name, region, Some(FactorCategory::Energy))?
                .map(|resolved| resolved.factor.factor_value),
        )
    }

    fn baseline_comparison(
        &self,
        input: &MenuItemInput,
        region: Region,
        total: f64,
        query_date: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> CfreResult<Option<BaselineComparison>> {
        let category = BaselineCategory {
            meal_type: input.meal_type.as_str().to_string(),
            region,
            energy_type: input.energy_type.as_str().to_string(),
            city: input.city.clone(),
            restaurant_type: input.restaurant_type.clone(),
        };

        let mut matched = resolve_baseline(&self.baselines, &category, query_date)?;
        if matched.is_none() && region != DEFAULT_REGION {
            matched =
                resolve_baseline(&self.baselines, &category.in_region(DEFAULT_REGION), query_date)?;
            if matched.is_some() {
                warnings.push(format!(
                    "no baseline for region {region}; fell back to the national average"
                ));
            }
        }

        let Some(BaselineMatch { baseline, tier }) = matched else {
            warnings.push(format!(
                "no baseline found for id '{}'; reduction omitted",
                category.baseline_id()
            ));
            return Ok(None);
        };

        let baseline_value = baseline.carbon_footprint.value();
        let (reduction, label) = if baseline_value <= 0.0 {
            warnings.push(format!(
                "baseline '{}' has non-positive value {baseline_value}; reduction omitted",
                baseline.baseline_id
            ));
            (None, None)
        } else if total > baseline_value {
            warnings.push(format!(
                "total {total} exceeds baseline {baseline_value}; reduction omitted"
            ));
            (None, None)
        } else {
            let reduction = ((baseline_value - total) / baseline_value).clamp(0.0, 1.0);
            (Some(reduction), Some(self.config.label_for(reduction)))
        };

        Ok(Some(BaselineComparison {
            baseline_id: baseline.baseline_id,
            baseline: baseline_value,
            version: baseline.version,
            source: baseline.source,
            tier,
            reduction,
            label,
        }))
    }
}
