//! Coarse distance bands.

use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of each band, in kilometres.
const IMMEDIATE_KM: f64 = 0.05;
const VERY_CLOSE_KM: f64 = 0.5;
const CLOSE_KM: f64 = 2.0;
const NEARBY_KM: f64 = 10.0;

/// Distance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceClass {
    /// Under 50 metres.
    Immediate,
    /// Under 500 metres.
    VeryClose,
    /// Under 2 kilometres.
    Close,
    /// Under 10 kilometres.
    Nearby,
    /// Everything else.
    Far,
}

impl DistanceClass {
    /// Wire name of the class.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceClass::Immediate => "immediate",
            DistanceClass::VeryClose => "very_close",
            DistanceClass::Close => "close",
            DistanceClass::Nearby => "nearby",
            DistanceClass::Far => "far",
        }
    }
}

impl std::fmt::Display for DistanceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a distance given in kilometres.
#[must_use]
pub fn classify(km: f64) -> DistanceClass {
    if km < IMMEDIATE_KM {
        DistanceClass::Immediate
    } else if km < VERY_CLOSE_KM {
        DistanceClass::VeryClose
    } else if km < CLOSE_KM {
        DistanceClass::Close
    } else if km < NEARBY_KM {
        DistanceClass::Nearby
    } else {
        DistanceClass::Far
    }
}
