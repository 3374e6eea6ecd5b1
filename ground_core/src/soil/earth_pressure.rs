//! Lateral earth pressure coefficients.
//!
//! Rankine active/passive coefficients, with the inclined-backfill form when
//! a ground slope β is given, and Jaky's at-rest coefficient.

use super::params::SoilParams;
use crate::errors::{GroundError, GroundResult};
use crate::units::{Degrees, Radians};

impl SoilParams {
    fn phi_prime(&self) -> GroundResult<Radians> {
        let phi = self.required("phi_prime_deg", self.phi_prime_deg())?;
        Ok(Degrees(phi).into())
    }

    /// `cos β` and `√(cos²β − cos²φ)` for a backfill slope.
    fn slope_terms(&self, slope_deg: Option<f64>) -> GroundResult<(f64, f64)> {
        let phi_deg = self.required("phi_prime_deg", self.phi_prime_deg())?;
        let phi: Radians = Degrees(phi_deg).into();
        let beta_deg = slope_deg.unwrap_or(0.0);
        if !beta_deg.is_finite() || beta_deg < 0.0 {
            return Err(GroundError::invalid_parameter(
                "slope_deg",
                beta_deg.to_string(),
                "Backfill slope must be a non-negative angle",
            ));
        }
        if beta_deg > phi_deg {
            return Err(GroundError::invalid_parameter(
                "slope_deg",
                beta_deg.to_string(),
                format!("Backfill slope exceeds the friction angle of {} degrees", phi_deg),
            ));
        }
        let beta: Radians = Degrees(beta_deg).into();
        let cos_beta = beta.cos();
        let discriminant = (cos_beta.powi(2) - phi.cos().powi(2)).max(0.0);
        Ok((cos_beta, discriminant.sqrt()))
    }

    /// Rankine active coefficient Ka.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ground_core::soil::SoilParamsInput;
    ///
    /// let sand = SoilParamsInput::granular("SAND", 19.0).with_phi_prime(30.0).build().unwrap();
    /// assert!((sand.k_active(None).unwrap() - 1.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn k_active(&self, slope_deg: Option<f64>) -> GroundResult<f64> {
        let (cos_beta, root) = self.slope_terms(slope_deg)?;
        Ok(cos_beta * (cos_beta - root) / (cos_beta + root))
    }

    /// Rankine passive coefficient Kp.
    pub fn k_passive(&self, slope_deg: Option<f64>) -> GroundResult<f64> {
        let (cos_beta, root) = self.slope_terms(slope_deg)?;
        let kp = cos_beta * (cos_beta + root) / (cos_beta - root);
        if !kp.is_finite() {
            return Err(GroundError::invalid_parameter(
                "phi_prime_deg",
                self.phi_prime_deg().unwrap_or_default().to_string(),
                "Passive coefficient is unbounded for this friction angle",
            ));
        }
        Ok(kp)
    }

    /// At-rest coefficient K0 = 1 − sin φ' (normally consolidated)
    pub fn k0(&self) -> GroundResult<f64> {
        Ok(1.0 - self.phi_prime()?.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::SoilParamsInput;

    fn sand(phi: f64) -> SoilParams {
        SoilParamsInput::granular("SAND", 19.0).with_phi_prime(phi).build().unwrap()
    }

    #[test]
    fn test_rankine_level_backfill() {
        let s = sand(30.0);
        assert!((s.k_active(None).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((s.k_passive(None).unwrap() - 3.0).abs() < 1e-12);
        assert!((s.k0().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sloping_backfill_increases_ka() {
        let s = sand(32.0);
        let level = s.k_active(None).unwrap();
        let sloped = s.k_active(Some(15.0)).unwrap();
        assert!(sloped > level);
        assert_eq!(s.k_active(Some(0.0)).unwrap(), level);
    }

    #[test]
    fn test_slope_steeper_than_phi_rejected() {
        let err = sand(25.0).k_active(Some(30.0)).unwrap_err();
        assert!(matches!(err, GroundError::InvalidParameter { ref field, .. } if field == "slope_deg"));
    }

    #[test]
    fn test_missing_phi() {
        let clay = SoilParamsInput::cohesive("CLAY", 18.0).with_cu(40.0).build().unwrap();
        let err = clay.k_active(None).unwrap_err();
        assert_eq!(err, GroundError::missing_parameter("CLAY", "phi_prime_deg"));
        assert!(clay.k0().is_err());
    }

    #[test]
    fn test_passive_unbounded_at_ninety_degrees() {
        assert!(sand(90.0).k_passive(None).is_err());
        assert_eq!(sand(90.0).k_active(None).unwrap(), 0.0);
    }
}
