//! Carbon footprint resolution engine for restaurant menu items.
//!
//! The engine resolves emission factors and reference baselines from
//! pluggable stores, then computes a per-dish footprint with an ingredient,
//! energy, packaging and transport breakdown at three precision levels.
//!
//! ```rust
//! use cfre::{
//!     CalculationLevel, EnergyType, EngineConfig, FootprintCalculator, IngredientEntry,
//!     MealType, MemoryStore, MenuItemInput,
//! };
//!
//! let calculator = FootprintCalculator::new(
//!     EngineConfig::default(),
//!     MemoryStore::new(),
//!     MemoryStore::new(),
//! )
//! .unwrap();
//!
//! let input = MenuItemInput {
//!     name: "麻婆豆腐".to_string(),
//!     restaurant_id: None,
//!     meal_type: MealType::MeatSimple,
//!     energy_type: EnergyType::Electric,
//!     level: CalculationLevel::L2,
//!     ingredients: vec![IngredientEntry {
//!         name: "豆腐".to_string(),
//!         category: None,
//!         weight_g: 200.0,
//!         waste_rate: None,
//!     }],
//!     cooking_method: Some("stir_fried".to_string()),
//!     cooking_time_min: None,
//!     power_kw: None,
//!     region: None,
//!     address: None,
//!     city: None,
//!     restaurant_type: None,
//!     packaging: vec![],
//!     transport: vec![],
//!     meter: None,
//! };
//!
//! let result = calculator.calculate(&input).unwrap();
//! assert!((result.total - result.parts.total()).abs() < 1e-9);
//! ```

pub use cfre_components::{
    BaselineComparison, CalculationLevel, CalculationResult, EnergyType, FootprintCalculator,
    IngredientContribution, IngredientEntry, MatchedFactor, MealType, MenuItemInput, MeterReading,
    PackagingEntry, TransportLeg,
};
pub use cfre_core::baseline::{
    resolve_baseline, resolve_baselines, Baseline, BaselineCategory, BaselineMatch, BaselineStatus,
    BaselineTier,
};
pub use cfre_core::cache::{CachedFactorStore, TtlCache};
pub use cfre_core::config::{CarbonLabel, EngineConfig};
pub use cfre_core::errors::{CfreError, CfreResult};
pub use cfre_core::factor::{
    resolve_factor, EmissionFactor, FactorCategory, FactorMatchLevel, FactorStatus, ResolvedFactor,
};
pub use cfre_core::footprint::{Footprint, FootprintParts};
pub use cfre_core::region::{address_to_region, Region, DEFAULT_REGION};
pub use cfre_core::storage::{
    BaselineFilter, BaselineStore, FactorFilter, FactorStore, MemoryStore, StorageError,
};
