//! # Soil Parameters
//!
//! Geotechnical parameter sets for soil and rock units. A [`SoilParams`] is
//! validated once at construction and never mutated afterwards; derived
//! values (earth pressure coefficients, factored parameters, equivalent
//! Mohr-Coulomb strength for rock) are computed from it or returned as new
//! parameter sets.
//!
//! ## Example
//!
//! ```rust
//! use ground_core::soil::{SoilParamsInput, SoilBehaviour};
//!
//! let sand = SoilParamsInput::granular("SAND", 19.0)
//!     .with_phi_prime(32.0)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(sand.behaviour(), SoilBehaviour::Granular);
//! let ka = sand.k_active(None).unwrap();
//! assert!(ka > 0.3 && ka < 0.31);
//! ```

pub mod description;
pub mod earth_pressure;
pub mod factors;
pub mod params;
pub mod rock;

pub use description::{
    generate_description, parse_soil_description, validate_soil_description, SoilDescription, ValidationOptions,
};
pub use factors::PartialFactors;
pub use params::{AdvancedParameter, SoilParams, SoilParamsInput};
pub use rock::HoekBrownConstants;

use serde::{Deserialize, Serialize};

/// Drained/undrained behaviour class of a soil unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoilBehaviour {
    /// Fine-grained soil, strength from cohesion/undrained shear strength
    Cohesive,
    /// Coarse-grained soil, strength from friction
    #[default]
    Granular,
    /// Rock mass, strength from Hoek-Brown parameters
    Rock,
}

impl SoilBehaviour {
    /// Get display name for tables and strip logs
    pub fn display_name(&self) -> &'static str {
        match self {
            SoilBehaviour::Cohesive => "Cohesive",
            SoilBehaviour::Granular => "Granular",
            SoilBehaviour::Rock => "Rock",
        }
    }

    /// All behaviours, for parsing and menus
    pub fn all() -> &'static [SoilBehaviour] {
        &[SoilBehaviour::Cohesive, SoilBehaviour::Granular, SoilBehaviour::Rock]
    }
}

impl std::fmt::Display for SoilBehaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for SoilBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoilBehaviour::all()
            .iter()
            .copied()
            .find(|b| b.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown soil behaviour '{}': use Cohesive, Granular or Rock", s))
    }
}
