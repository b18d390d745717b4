//! Calculation pipeline over the resolution core: request types, the
//! footprint calculator and its self-describing result.

pub mod calculator;
pub mod input;
pub mod result;

pub use calculator::FootprintCalculator;
pub use input::{
    CalculationLevel, EnergyType, IngredientEntry, MealType, MenuItemInput, MeterReading,
    PackagingEntry, TransportLeg,
};
pub use result::{BaselineComparison, CalculationResult, IngredientContribution, MatchedFactor};
