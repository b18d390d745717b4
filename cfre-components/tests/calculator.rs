//! End-to-end calculator tests over the in-memory store.

use cfre_components::{
    CalculationLevel, EnergyType, FootprintCalculator, IngredientEntry, MealType, MenuItemInput,
};
use cfre_core::baseline::{Baseline, BaselineCategory, BaselineStatus, BaselineTier};
use cfre_core::config::{CarbonLabel, EngineConfig};
use cfre_core::errors::CfreError;
use cfre_core::factor::{EmissionFactor, FactorCategory, FactorStatus};
use cfre_core::footprint::Footprint;
use cfre_core::region::Region;
use cfre_core::storage::{
    BaselineFilter, BaselineStore, FactorFilter, FactorStore, MemoryStore, StorageError,
};
use chrono::NaiveDate;
use is_close::is_close;
use std::sync::atomic::{AtomicUsize, Ordering};

fn factor(name: &str, value: f64, category: FactorCategory) -> EmissionFactor {
    EmissionFactor {
        factor_id: format!("f-{name}"),
        name: name.to_string(),
        aliases: vec![],
        category,
        sub_category: None,
        factor_value: value,
        unit: "kg CO2e/kg".to_string(),
        region: "CN".to_string(),
        source: Some("test".to_string()),
        year: Some(2022),
        version: "1.0".to_string(),
        status: FactorStatus::Active,
    }
}

fn baseline(category: BaselineCategory, value: f64, status: BaselineStatus) -> Baseline {
    Baseline {
        baseline_id: category.baseline_id(),
        category,
        carbon_footprint: Footprint::Scalar(value),
        source: Some("survey".to_string()),
        version: 1,
        status,
        effective_date: None,
        expiry_date: None,
    }
}

fn tofu_input() -> MenuItemInput {
    MenuItemInput {
        name: "麻婆豆腐".to_string(),
        restaurant_id: Some("rest-001".to_string()),
        meal_type: MealType::MeatSimple,
        energy_type: EnergyType::Electric,
        level: CalculationLevel::L2,
        ingredients: vec![IngredientEntry {
            name: "豆腐".to_string(),
            category: Some("bean_product".to_string()),
            weight_g: 200.0,
            waste_rate: None,
        }],
        cooking_method: Some("stir_fried".to_string()),
        cooking_time_min: None,
        power_kw: None,
        region: Some("east_china".to_string()),
        address: None,
        city: None,
        restaurant_type: None,
        packaging: vec![],
        transport: vec![],
        meter: None,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

#[test]
fn total_equals_the_sum_of_the_parts_at_every_level() {
    let store = MemoryStore::new().with_factors(vec![
        factor("豆腐", 1.2, FactorCategory::Ingredient),
        factor("牛肉", 27.0, FactorCategory::Ingredient),
    ]);
    let calc = FootprintCalculator::new(EngineConfig::default(), store, MemoryStore::new()).unwrap();

    for level in [
        CalculationLevel::L1,
        CalculationLevel::L2,
        CalculationLevel::L3,
    ] {
        let mut input = tofu_input();
        input.level = level;
        input.ingredients.push(IngredientEntry {
            name: "牛肉".to_string(),
            category: None,
            weight_g: 150.0,
            waste_rate: Some(0.1),
        });
        let result = calc.calculate_on(&input, date()).unwrap();
        assert!(
            (result.total - result.parts.total()).abs() < 1e-9,
            "conservation violated at {level:?}: {} vs {}",
            result.total,
            result.parts.total()
        );
        let line_sum: f64 = result.ingredients.iter().map(|i| i.contribution).sum();
        assert!((result.parts.ingredients - line_sum).abs() < 1e-9);
    }
}

#[test]
fn stir_fried_tofu_contributes_point_three_six() {
    let store = MemoryStore::new().with_factors(vec![factor("豆腐", 1.2, FactorCategory::Ingredient)]);
    let calc = FootprintCalculator::new(EngineConfig::default(), store, MemoryStore::new()).unwrap();
    let result = calc.calculate_on(&tofu_input(), date()).unwrap();
    // 1.2 kg CO2e/kg * 0.2 kg * 1.5
    assert!(is_close!(result.ingredients[0].contribution, 0.36));
}

struct CountingStore {
    factor_calls: AtomicUsize,
    baseline_calls: AtomicUsize,
}

impl FactorStore for CountingStore {
    fn find_factors(&self, _: &FactorFilter) -> Result<Vec<EmissionFactor>, StorageError> {
        self.factor_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![])
    }
}

impl BaselineStore for CountingStore {
    fn find_baselines(&self, _: &BaselineFilter) -> Result<Vec<Baseline>, StorageError> {
        self.baseline_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![])
    }
}

#[test]
fn invalid_input_fails_before_any_store_call() {
    let store = CountingStore {
        factor_calls: AtomicUsize::new(0),
        baseline_calls: AtomicUsize::new(0),
    };
    let calc = FootprintCalculator::new(EngineConfig::default(), &store, &store).unwrap();

    let mut bad = tofu_input();
    bad.ingredients[0].weight_g = -50.0;
    let err = calc.calculate_on(&bad, date()).unwrap_err();
    assert!(matches!(err, CfreError::InvalidWeight { .. }));
    assert_eq!(store.factor_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.baseline_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn zero_weight_ingredient_contributes_zero() {
    let store = MemoryStore::new().with_factors(vec![factor("豆腐", 1.2, FactorCategory::Ingredient)]);
    let calc = FootprintCalculator::new(EngineConfig::default(), store, MemoryStore::new()).unwrap();

    let mut input = tofu_input();
    input.ingredients[0].weight_g = 0.0;
    let result = calc.calculate_on(&input, date()).unwrap();
    assert_eq!(result.ingredients[0].contribution, 0.0);
    // Zero weight still matches its factor and raises no warning
    assert!(result.ingredients[0].factor.is_some());
    assert!(result.warnings.iter().all(|w| !w.contains("豆腐")));
}

struct FailingStore;

impl FactorStore for FailingStore {
    fn find_factors(&self, _: &FactorFilter) -> Result<Vec<EmissionFactor>, StorageError> {
        Err(StorageError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }
}

impl BaselineStore for FailingStore {
    fn find_baselines(&self, _: &BaselineFilter) -> Result<Vec<Baseline>, StorageError> {
        Err(StorageError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }
}

#[test]
fn storage_failure_propagates_as_an_error_not_a_warning() {
    let calc =
        FootprintCalculator::new(EngineConfig::default(), FailingStore, MemoryStore::new())
            .unwrap();
    let err = calc.calculate_on(&tofu_input(), date()).unwrap_err();
    assert!(matches!(
        err,
        CfreError::Storage(StorageError::Unavailable { .. })
    ));

    // A failing baseline store aborts the calculation the same way
    let calc =
        FootprintCalculator::new(EngineConfig::default(), MemoryStore::new(), FailingStore)
            .unwrap();
    let err = calc.calculate_on(&tofu_input(), date()).unwrap_err();
    assert!(matches!(err, CfreError::Storage(_)));
}

#[test]
fn reduction_and_label_come_from_the_baseline() {
    let store = MemoryStore::new().with_factors(vec![factor("豆腐", 1.2, FactorCategory::Ingredient)]);
    let category = BaselineCategory {
        meal_type: "meat_simple".to_string(),
        region: Region::EastChina,
        energy_type: "electric".to_string(),
        city: None,
        restaurant_type: None,
    };
    let baselines =
        MemoryStore::new().with_baselines(vec![baseline(category, 5.0, BaselineStatus::Active)]);
    let calc = FootprintCalculator::new(EngineConfig::default(), store, baselines).unwrap();

    let result = calc.calculate_on(&tofu_input(), date()).unwrap();
    let comparison = result.comparison.unwrap();
    assert_eq!(comparison.tier, BaselineTier::Active);
    let expected = (5.0 - result.total) / 5.0;
    assert!(is_close!(comparison.reduction.unwrap(), expected));
    // total ~ 0.573 against a 5.0 baseline -> reduction ~ 0.89
    assert_eq!(comparison.label, Some(CarbonLabel::UltraLow));
}

#[test]
fn reduction_is_omitted_when_total_exceeds_baseline() {
    let store = MemoryStore::new().with_factors(vec![factor("豆腐", 30.0, FactorCategory::Ingredient)]);
    let category = BaselineCategory {
        meal_type: "meat_simple".to_string(),
        region: Region::EastChina,
        energy_type: "electric".to_string(),
        city: None,
        restaurant_type: None,
    };
    let baselines =
        MemoryStore::new().with_baselines(vec![baseline(category, 1.0, BaselineStatus::Active)]);
    let calc = FootprintCalculator::new(EngineConfig::default(), store, baselines).unwrap();

    let result = calc.calculate_on(&tofu_input(), date()).unwrap();
    let comparison = result.comparison.unwrap();
    assert_eq!(comparison.baseline, 1.0);
    assert!(comparison.reduction.is_none());
    assert!(comparison.label.is_none());
    assert!(result.warnings.iter().any(|w| w.contains("exceeds")));
}

#[test]
fn draft_only_baseline_matches_on_the_last_tier() {
    let category = BaselineCategory {
        meal_type: "meat_simple".to_string(),
        region: Region::EastChina,
        energy_type: "electric".to_string(),
        city: None,
        restaurant_type: None,
    };
    let baselines =
        MemoryStore::new().with_baselines(vec![baseline(category, 5.0, BaselineStatus::Draft)]);
    let calc =
        FootprintCalculator::new(EngineConfig::default(), MemoryStore::new(), baselines).unwrap();

    let result = calc.calculate_on(&tofu_input(), date()).unwrap();
    assert_eq!(result.comparison.unwrap().tier, BaselineTier::AnyStatus);
}

#[test]
fn missing_regional_baseline_falls_back_to_national_average() {
    let category = BaselineCategory {
        meal_type: "meat_simple".to_string(),
        region: Region::NationalAverage,
        energy_type: "electric".to_string(),
        city: None,
        restaurant_type: None,
    };
    let baselines =
        MemoryStore::new().with_baselines(vec![baseline(category, 5.0, BaselineStatus::Active)]);
    let calc =
        FootprintCalculator::new(EngineConfig::default(), MemoryStore::new(), baselines).unwrap();

    // Input targets east_china, where no baseline exists
    let result = calc.calculate_on(&tofu_input(), date()).unwrap();
    let comparison = result.comparison.unwrap();
    assert!(comparison.baseline_id.contains("national_average"));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("national average")));
}

#[test]
fn explicit_city_queries_a_city_scoped_baseline() {
    let default_city = BaselineCategory {
        meal_type: "meat_simple".to_string(),
        region: Region::EastChina,
        energy_type: "electric".to_string(),
        city: None,
        restaurant_type: None,
    };
    let shanghai = BaselineCategory {
        city: Some("上海".to_string()),
        ..default_city.clone()
    };
    let baselines = MemoryStore::new().with_baselines(vec![
        baseline(default_city, 5.0, BaselineStatus::Active),
        baseline(shanghai, 4.0, BaselineStatus::Active),
    ]);
    let calc =
        FootprintCalculator::new(EngineConfig::default(), MemoryStore::new(), baselines).unwrap();

    let mut input = tofu_input();
    input.city = Some("上海".to_string());
    let result = calc.calculate_on(&input, date()).unwrap();
    assert_eq!(result.comparison.as_ref().unwrap().baseline, 4.0);

    input.city = None;
    let result = calc.calculate_on(&input, date()).unwrap();
    assert_eq!(result.comparison.as_ref().unwrap().baseline, 5.0);
}

#[test]
fn missing_baseline_yields_a_warning_not_an_error() {
    let calc = FootprintCalculator::new(
        EngineConfig::default(),
        MemoryStore::new(),
        MemoryStore::new(),
    )
    .unwrap();
    let result = calc.calculate_on(&tofu_input(), date()).unwrap();
    assert!(result.comparison.is_none());
    assert!(result.warnings.iter().any(|w| w.contains("no baseline")));
}

#[test]
fn result_round_trips_through_json() {
    let store = MemoryStore::new().with_factors(vec![factor("豆腐", 1.2, FactorCategory::Ingredient)]);
    let calc = FootprintCalculator::new(EngineConfig::default(), store, MemoryStore::new()).unwrap();
    let result = calc.calculate_on(&tofu_input(), date()).unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let back: cfre_components::CalculationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
