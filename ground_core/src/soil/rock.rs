//! Hoek-Brown rock mass strength (2002 edition) and its equivalent
//! Mohr-Coulomb parameters.
//!
//! Inputs come from the parameter set: GSI, intact UCS σci (MPa), mi and the
//! disturbance factor D. Stresses passed in are in MPa.

use serde::{Deserialize, Serialize};

use super::params::SoilParams;
use super::SoilBehaviour;
use crate::errors::{GroundError, GroundResult};
use crate::units::{Degrees, Gpa, Kpa, Mpa, Radians};

/// Generalised Hoek-Brown constants for a rock mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoekBrownConstants {
    pub mb: f64,
    pub s: f64,
    pub a: f64,
}

impl HoekBrownConstants {
    /// Major principal stress at failure for a given σ3 (both MPa)
    pub fn sigma1_mpa(&self, sigma3_mpa: f64, ucs_mpa: f64) -> f64 {
        sigma3_mpa + ucs_mpa * (self.mb * sigma3_mpa / ucs_mpa + self.s).powf(self.a)
    }
}

impl SoilParams {
    /// Rock mass constants mb, s and a.
    ///
    /// # Errors
    ///
    /// `MissingParameter` when GSI or mi is not set.
    pub fn hoek_brown(&self) -> GroundResult<HoekBrownConstants> {
        let gsi = self.required("gsi", self.gsi())?;
        let mi = self.required("mi", self.mi())?;
        let d = self.disturbance();

        let mb = mi * ((gsi - 100.0) / (28.0 - 14.0 * d)).exp();
        let s = ((gsi - 100.0) / (9.0 - 3.0 * d)).exp();
        let a = 0.5 + ((-gsi / 15.0).exp() - (-20.0f64 / 3.0).exp()) / 6.0;

        Ok(HoekBrownConstants { mb, s, a })
    }

    /// Rock mass deformation modulus Em (GPa), Hoek-Carranza-Torres-Corkum.
    pub fn rock_mass_modulus_gpa(&self) -> GroundResult<f64> {
        let ucs = self.required("ucs_mpa", self.ucs_mpa())?;
        let gsi = self.required("gsi", self.gsi())?;

        let strength_term = if ucs <= 100.0 { (ucs / 100.0).sqrt() } else { 1.0 };
        Ok((1.0 - self.disturbance() / 2.0) * strength_term * 10f64.powf((gsi - 10.0) / 40.0))
    }

    /// Fit Mohr-Coulomb φ' and c' to the Hoek-Brown envelope over
    /// `0 < σ3 < sigma3_max_mpa`, returning a new rock parameter set with
    /// φ' (degrees), c' (kPa) and E (MPa) filled in.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ground_core::soil::SoilParamsInput;
    ///
    /// let mudstone = SoilParamsInput::rock("MUDSTONE", 23.0)
    ///     .with_hoek_brown(45.0, 20.0, 9.0, 0.0)
    ///     .build()
    ///     .unwrap();
    /// let mc = mudstone.equivalent_mohr_coulomb(1.0).unwrap();
    /// assert!(mc.phi_prime_deg().unwrap() > 0.0);
    /// assert!(mc.c_prime_kpa().unwrap() > 0.0);
    /// ```
    pub fn equivalent_mohr_coulomb(&self, sigma3_max_mpa: f64) -> GroundResult<SoilParams> {
        if !sigma3_max_mpa.is_finite() || sigma3_max_mpa <= 0.0 {
            return Err(GroundError::invalid_parameter(
                "sigma3_max_mpa",
                sigma3_max_mpa.to_string(),
                "Confining stress range must be positive",
            ));
        }
        let ucs = self.required("ucs_mpa", self.ucs_mpa())?;
        let HoekBrownConstants { mb, s, a } = self.hoek_brown()?;

        let sigma3n = sigma3_max_mpa / ucs;
        let power = (s + mb * sigma3n).powf(a - 1.0);
        let denom = (1.0 + a) * (2.0 + a);

        let sin_phi = 6.0 * a * mb * power / (2.0 * denom + 6.0 * a * mb * power);
        let phi = Degrees::from(Radians(sin_phi.asin()));

        let c_numerator = ucs * ((1.0 + 2.0 * a) * s + (1.0 - a) * mb * sigma3n) * power;
        let c_denominator = denom * (1.0 + 6.0 * a * mb * power / denom).sqrt();
        let c_prime: Kpa = Mpa(c_numerator / c_denominator).into();

        let modulus: Mpa = Gpa(self.rock_mass_modulus_gpa()?).into();

        let mut input = self.to_input();
        input.behaviour = SoilBehaviour::Rock;
        input.phi_prime_deg = Some(phi.0);
        input.c_prime_kpa = Some(c_prime.0);
        input.youngs_modulus_mpa = Some(modulus.0);
        SoilParams::new(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::SoilParamsInput;

    fn sandstone() -> SoilParams {
        SoilParamsInput::rock("SANDSTONE", 24.0)
            .with_hoek_brown(50.0, 50.0, 10.0, 0.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_hoek_brown_constants() {
        let hb = sandstone().hoek_brown().unwrap();
        assert!((hb.mb - 10.0 * (-50.0f64 / 28.0).exp()).abs() < 1e-12);
        assert!((hb.mb - 1.6767).abs() < 1e-3);
        assert!((hb.s - 0.003866).abs() < 1e-5);
        assert!((hb.a - 0.50573).abs() < 1e-4);
    }

    #[test]
    fn test_disturbance_weakens_mass() {
        let intact = sandstone().hoek_brown().unwrap();
        let blasted = SoilParamsInput::rock("SANDSTONE", 24.0)
            .with_hoek_brown(50.0, 50.0, 10.0, 0.7)
            .build()
            .unwrap()
            .hoek_brown()
            .unwrap();
        assert!(blasted.mb < intact.mb);
        assert!(blasted.s < intact.s);
    }

    #[test]
    fn test_rock_mass_modulus() {
        // (1 - 0) * sqrt(50/100) * 10^((50-10)/40)
        let em = sandstone().rock_mass_modulus_gpa().unwrap();
        assert!((em - 0.5f64.sqrt() * 10.0).abs() < 1e-9);

        let strong = SoilParamsInput::rock("GRANITE", 26.0)
            .with_hoek_brown(70.0, 150.0, 32.0, 0.0)
            .build()
            .unwrap();
        assert!((strong.rock_mass_modulus_gpa().unwrap() - 10f64.powf(1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_equivalent_mohr_coulomb() {
        let mc = sandstone().equivalent_mohr_coulomb(2.0).unwrap();
        let phi = mc.phi_prime_deg().unwrap();
        assert!(phi > 20.0 && phi < 60.0, "phi = {}", phi);
        assert!(mc.c_prime_kpa().unwrap() > 100.0);
        assert!((mc.youngs_modulus_mpa().unwrap() - 7071.0678).abs() < 1e-2);
        assert_eq!(mc.behaviour(), SoilBehaviour::Rock);
        assert_eq!(mc.gsi(), Some(50.0));
    }

    #[test]
    fn test_sigma1_at_zero_confinement() {
        let params = sandstone();
        let hb = params.hoek_brown().unwrap();
        let sigma1 = hb.sigma1_mpa(0.0, 50.0);
        assert!((sigma1 - 50.0 * hb.s.powf(hb.a)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_inputs() {
        let clay = SoilParamsInput::cohesive("CLAY", 18.0).build().unwrap();
        assert_eq!(clay.hoek_brown().unwrap_err(), GroundError::missing_parameter("CLAY", "gsi"));
        assert!(clay.equivalent_mohr_coulomb(1.0).is_err());
        assert!(sandstone().equivalent_mohr_coulomb(0.0).is_err());
    }
}
