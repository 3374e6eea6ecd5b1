//! Partial factors on soil parameters (limit state design).
//!
//! Factors divide the characteristic value: `tan φ'd = tan φ'k / γφ`,
//! `c'd = c'k / γc`, `γd = γk / γγ`, `cu,d = cu,k / γcu`. A factored set
//! remembers the factors it was built with so they can be removed again.

use serde::{Deserialize, Serialize};

use super::params::SoilParams;
use crate::errors::{GroundError, GroundResult};
use crate::units::{Degrees, Radians};

/// Set of material partial factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialFactors {
    /// Factor on tan φ'
    pub gamma_phi: f64,
    /// Factor on c'
    pub gamma_c: f64,
    /// Factor on unit weight
    pub gamma_gamma: f64,
    /// Factor on cu
    pub gamma_cu: f64,
}

impl PartialFactors {
    pub fn new(gamma_phi: f64, gamma_c: f64, gamma_gamma: f64, gamma_cu: f64) -> Self {
        PartialFactors {
            gamma_phi,
            gamma_c,
            gamma_gamma,
            gamma_cu,
        }
    }

    /// Eurocode 7 material set M2 (DA1 combination 2)
    pub fn ec7_m2() -> Self {
        PartialFactors::new(1.25, 1.25, 1.0, 1.4)
    }

    pub fn validate(&self) -> GroundResult<()> {
        let named = [
            ("gamma_phi", self.gamma_phi),
            ("gamma_c", self.gamma_c),
            ("gamma_gamma", self.gamma_gamma),
            ("gamma_cu", self.gamma_cu),
        ];
        for (field, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(GroundError::invalid_parameter(
                    field,
                    value.to_string(),
                    "Partial factor must be a positive finite number",
                ));
            }
        }
        Ok(())
    }
}

impl Default for PartialFactors {
    fn default() -> Self {
        PartialFactors::new(1.0, 1.0, 1.0, 1.0)
    }
}

fn factor_angle(phi_deg: f64, divisor: f64) -> f64 {
    let phi: Radians = Degrees(phi_deg).into();
    let factored = Radians((phi.tan() / divisor).atan());
    Degrees::from(factored).0
}

impl SoilParams {
    /// Return a new parameter set with `factors` applied.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if this set is already factored or a factor is
    /// not positive.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ground_core::soil::{PartialFactors, SoilParamsInput};
    ///
    /// let sand = SoilParamsInput::granular("SAND", 19.0).with_phi_prime(35.0).build().unwrap();
    /// let design = sand.apply_partial_factors(&PartialFactors::ec7_m2()).unwrap();
    /// assert!(design.phi_prime_deg().unwrap() < 35.0);
    /// assert!(design.is_factored());
    /// ```
    pub fn apply_partial_factors(&self, factors: &PartialFactors) -> GroundResult<SoilParams> {
        factors.validate()?;
        if self.is_factored() {
            return Err(GroundError::invalid_parameter(
                "factors",
                self.reference(),
                "Parameters are already factored; remove the existing factors first",
            ));
        }

        let mut input = self.to_input();
        input.phi_prime_deg = input.phi_prime_deg.map(|phi| factor_angle(phi, factors.gamma_phi));
        input.c_prime_kpa = input.c_prime_kpa.map(|c| c / factors.gamma_c);
        input.unit_weight_kn_m3 /= factors.gamma_gamma;
        input.cu_kpa = input.cu_kpa.map(|cu| cu / factors.gamma_cu);
        input.factors = Some(*factors);
        SoilParams::new(input)
    }

    /// Undo the stored partial factors.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if this set carries no factors.
    pub fn remove_partial_factors(&self) -> GroundResult<SoilParams> {
        let factors = *self.factors().ok_or_else(|| {
            GroundError::invalid_parameter("factors", self.reference(), "No factors stored on this parameter set")
        })?;

        let mut input = self.to_input();
        input.phi_prime_deg = input.phi_prime_deg.map(|phi| factor_angle(phi, 1.0 / factors.gamma_phi));
        input.c_prime_kpa = input.c_prime_kpa.map(|c| c * factors.gamma_c);
        input.unit_weight_kn_m3 *= factors.gamma_gamma;
        input.cu_kpa = input.cu_kpa.map(|cu| cu * factors.gamma_cu);
        input.factors = None;
        SoilParams::new(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::SoilParamsInput;

    fn clay() -> SoilParams {
        SoilParamsInput::cohesive("CLAY", 20.0)
            .with_phi_prime(25.0)
            .with_c_prime(10.0)
            .with_cu(50.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_apply_partial_factors() {
        let params = clay();
        let factors = PartialFactors::new(1.25, 1.25, 1.1, 1.4);
        let factored = params.apply_partial_factors(&factors).unwrap();

        assert!(factored.is_factored());
        assert_eq!(factored.factors(), Some(&factors));
        assert!(factored.phi_prime_deg().unwrap() < 25.0);
        assert!((factored.c_prime_kpa().unwrap() - 8.0).abs() < 1e-12);
        assert!(factored.unit_weight_kn_m3() < 20.0);
        assert!((factored.cu_kpa().unwrap() - 50.0 / 1.4).abs() < 1e-12);

        let expected_phi = (25.0f64.to_radians().tan() / 1.25).atan().to_degrees();
        assert!((factored.phi_prime_deg().unwrap() - expected_phi).abs() < 1e-12);
    }

    #[test]
    fn test_remove_partial_factors_roundtrip() {
        let params = clay();
        let factored = params.apply_partial_factors(&PartialFactors::ec7_m2()).unwrap();
        let restored = factored.remove_partial_factors().unwrap();

        assert!(!restored.is_factored());
        assert!((restored.phi_prime_deg().unwrap() - 25.0).abs() < 1e-10);
        assert!((restored.c_prime_kpa().unwrap() - 10.0).abs() < 1e-10);
        assert!((restored.cu_kpa().unwrap() - 50.0).abs() < 1e-10);
        assert!((restored.unit_weight_kn_m3() - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_double_factoring_rejected() {
        let factored = clay().apply_partial_factors(&PartialFactors::ec7_m2()).unwrap();
        let err = factored.apply_partial_factors(&PartialFactors::ec7_m2()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_remove_without_factors_fails() {
        assert!(clay().remove_partial_factors().is_err());
    }

    #[test]
    fn test_invalid_factor() {
        let err = clay().apply_partial_factors(&PartialFactors::new(0.0, 1.0, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, GroundError::InvalidParameter { ref field, .. } if field == "gamma_phi"));
    }
}
