//! Footprint value types.
//!
//! Stored footprint documents historically came in two shapes: a bare number,
//! or an object carrying a total plus baseline/reduction/breakdown fields.
//! [`Footprint`] folds both into one tagged union that is decoded once at the
//! storage boundary instead of being branched on throughout the engine.

use serde::{Deserialize, Serialize};

/// Per-source breakdown of a footprint total.
///
/// All values are kg CO₂e.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintParts {
    pub ingredients: f64,
    pub energy: f64,
    pub packaging: f64,
    pub transport: f64,
}

impl FootprintParts {
    /// Sum of the four parts.
    pub fn total(&self) -> f64 {
        self.ingredients + self.energy + self.packaging + self.transport
    }
}

/// A footprint value as stored: either a bare total or a full breakdown.
///
/// # Examples
///
/// ```rust
/// use cfre_core::footprint::Footprint;
///
/// let legacy: Footprint = serde_json::from_str("4.2").unwrap();
/// assert_eq!(legacy.value(), 4.2);
///
/// let full: Footprint = serde_json::from_str(
///     r#"{"value": 4.2, "baseline": 5.0, "breakdown": {"ingredients": 4.2}}"#,
/// )
/// .unwrap();
/// assert_eq!(full.value(), 4.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Footprint {
    Scalar(f64),
    Breakdown {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        baseline: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reduction: Option<f64>,
        #[serde(default)]
        breakdown: FootprintParts,
    },
}

impl Footprint {
    /// The scalar total for either variant.
    pub fn value(&self) -> f64 {
        match self {
            Footprint::Scalar(value) => *value,
            Footprint::Breakdown { value, .. } => *value,
        }
    }

    /// The breakdown parts, if this footprint carries them.
    pub fn parts(&self) -> Option<&FootprintParts> {
        match self {
            Footprint::Scalar(_) => None,
            Footprint::Breakdown { breakdown, .. } => Some(breakdown),
        }
    }
}
