//! Soil parameter input form and the validated, immutable [`SoilParams`].
//!
//! `SoilParamsInput` is the editable, JSON-facing form. `SoilParams` wraps a
//! validated input and only exposes getters; deserialising a `SoilParams`
//! goes back through validation, so an out-of-range value in a file is
//! rejected rather than loaded.

use serde::{Deserialize, Serialize};

use super::factors::PartialFactors;
use super::SoilBehaviour;
use crate::errors::{GroundError, GroundResult};

/// Upper bound on unit weight; anything heavier is a unit error (kN vs N).
pub const MAX_UNIT_WEIGHT_KN_M3: f64 = 50.0;

/// Named parameter without a dedicated field (e.g. from an AGSi import)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedParameter {
    pub name: String,
    pub value: f64,
}

/// Editable soil parameter set, validated by [`SoilParamsInput::build`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilParamsInput {
    /// Unit reference (e.g. "LONDON CLAY")
    pub reference: String,

    pub behaviour: SoilBehaviour,

    /// Bulk unit weight γ (kN/m³)
    pub unit_weight_kn_m3: f64,

    /// Effective friction angle φ' (degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phi_prime_deg: Option<f64>,

    /// Effective cohesion c' (kPa)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_prime_kpa: Option<f64>,

    /// Undrained shear strength cu (kPa)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cu_kpa: Option<f64>,

    /// Coefficient of volume compressibility mv (m²/MN)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mv_m2_mn: Option<f64>,

    /// Drained Young's modulus E' (MPa)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youngs_modulus_mpa: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poissons_ratio: Option<f64>,

    /// Coefficient of consolidation cv (m²/yr)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_m2_yr: Option<f64>,

    /// Hydraulic conductivity k (m/s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permeability_m_s: Option<f64>,

    /// Geological Strength Index (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gsi: Option<f64>,

    /// Intact unconfined compressive strength σci (MPa)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ucs_mpa: Option<f64>,

    /// Hoek-Brown intact rock constant mi
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mi: Option<f64>,

    /// Hoek-Brown disturbance factor D (0-1)
    pub disturbance: f64,

    /// Permit c' or cu on a granular soil (e.g. cemented or apparent cohesion)
    pub allow_cohesion: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advanced_parameters: Vec<AdvancedParameter>,

    /// Partial factors already applied to this set, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<PartialFactors>,
}

impl SoilParamsInput {
    /// Start an input with the three mandatory values.
    pub fn new(reference: impl Into<String>, behaviour: SoilBehaviour, unit_weight_kn_m3: f64) -> Self {
        SoilParamsInput {
            reference: reference.into(),
            behaviour,
            unit_weight_kn_m3,
            ..Default::default()
        }
    }

    pub fn cohesive(reference: impl Into<String>, unit_weight_kn_m3: f64) -> Self {
        Self::new(reference, SoilBehaviour::Cohesive, unit_weight_kn_m3)
    }

    pub fn granular(reference: impl Into<String>, unit_weight_kn_m3: f64) -> Self {
        Self::new(reference, SoilBehaviour::Granular, unit_weight_kn_m3)
    }

    pub fn rock(reference: impl Into<String>, unit_weight_kn_m3: f64) -> Self {
        Self::new(reference, SoilBehaviour::Rock, unit_weight_kn_m3)
    }

    pub fn with_phi_prime(mut self, phi_prime_deg: f64) -> Self {
        self.phi_prime_deg = Some(phi_prime_deg);
        self
    }

    pub fn with_c_prime(mut self, c_prime_kpa: f64) -> Self {
        self.c_prime_kpa = Some(c_prime_kpa);
        self
    }

    pub fn with_cu(mut self, cu_kpa: f64) -> Self {
        self.cu_kpa = Some(cu_kpa);
        self
    }

    pub fn with_mv(mut self, mv_m2_mn: f64) -> Self {
        self.mv_m2_mn = Some(mv_m2_mn);
        self
    }

    pub fn with_youngs_modulus(mut self, youngs_modulus_mpa: f64) -> Self {
        self.youngs_modulus_mpa = Some(youngs_modulus_mpa);
        self
    }

    pub fn with_poissons_ratio(mut self, poissons_ratio: f64) -> Self {
        self.poissons_ratio = Some(poissons_ratio);
        self
    }

    pub fn with_cv(mut self, cv_m2_yr: f64) -> Self {
        self.cv_m2_yr = Some(cv_m2_yr);
        self
    }

    pub fn with_permeability(mut self, permeability_m_s: f64) -> Self {
        self.permeability_m_s = Some(permeability_m_s);
        self
    }

    /// Set the Hoek-Brown rock mass inputs in one go.
    pub fn with_hoek_brown(mut self, gsi: f64, ucs_mpa: f64, mi: f64, disturbance: f64) -> Self {
        self.gsi = Some(gsi);
        self.ucs_mpa = Some(ucs_mpa);
        self.mi = Some(mi);
        self.disturbance = disturbance;
        self
    }

    /// Mark a granular soil as allowed to carry cohesion.
    pub fn with_apparent_cohesion(mut self) -> Self {
        self.allow_cohesion = true;
        self
    }

    pub fn with_advanced(mut self, name: impl Into<String>, value: f64) -> Self {
        self.advanced_parameters.push(AdvancedParameter {
            name: name.into(),
            value,
        });
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> GroundResult<SoilParams> {
        SoilParams::new(self)
    }
}

/// Validated, immutable soil parameter set.
///
/// Share between layers with `Arc<SoilParams>`; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SoilParamsInput", into = "SoilParamsInput")]
pub struct SoilParams {
    input: SoilParamsInput,
}

impl SoilParams {
    /// Validate an input form.
    ///
    /// # Errors
    ///
    /// `GroundError::InvalidParameter` naming the first offending field.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ground_core::soil::{SoilParams, SoilParamsInput};
    ///
    /// let bad = SoilParamsInput::granular("SAND", 19.0).with_phi_prime(95.0);
    /// assert!(SoilParams::new(bad).is_err());
    /// ```
    pub fn new(input: SoilParamsInput) -> GroundResult<Self> {
        validate(&input)?;
        Ok(SoilParams { input })
    }

    pub fn reference(&self) -> &str {
        &self.input.reference
    }

    pub fn behaviour(&self) -> SoilBehaviour {
        self.input.behaviour
    }

    pub fn unit_weight_kn_m3(&self) -> f64 {
        self.input.unit_weight_kn_m3
    }

    pub fn phi_prime_deg(&self) -> Option<f64> {
        self.input.phi_prime_deg
    }

    pub fn c_prime_kpa(&self) -> Option<f64> {
        self.input.c_prime_kpa
    }

    pub fn cu_kpa(&self) -> Option<f64> {
        self.input.cu_kpa
    }

    pub fn mv_m2_mn(&self) -> Option<f64> {
        self.input.mv_m2_mn
    }

    pub fn youngs_modulus_mpa(&self) -> Option<f64> {
        self.input.youngs_modulus_mpa
    }

    pub fn poissons_ratio(&self) -> Option<f64> {
        self.input.poissons_ratio
    }

    pub fn cv_m2_yr(&self) -> Option<f64> {
        self.input.cv_m2_yr
    }

    pub fn permeability_m_s(&self) -> Option<f64> {
        self.input.permeability_m_s
    }

    pub fn gsi(&self) -> Option<f64> {
        self.input.gsi
    }

    pub fn ucs_mpa(&self) -> Option<f64> {
        self.input.ucs_mpa
    }

    pub fn mi(&self) -> Option<f64> {
        self.input.mi
    }

    pub fn disturbance(&self) -> f64 {
        self.input.disturbance
    }

    pub fn allows_cohesion(&self) -> bool {
        self.input.allow_cohesion
    }

    pub fn advanced_parameters(&self) -> &[AdvancedParameter] {
        &self.input.advanced_parameters
    }

    /// Look up an advanced parameter by name (case-insensitive)
    pub fn advanced_parameter(&self, name: &str) -> Option<f64> {
        self.input
            .advanced_parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value)
    }

    pub fn factors(&self) -> Option<&PartialFactors> {
        self.input.factors.as_ref()
    }

    pub fn is_factored(&self) -> bool {
        self.input.factors.is_some()
    }

    /// Copy of the input form, for deriving a modified parameter set.
    pub fn to_input(&self) -> SoilParamsInput {
        self.input.clone()
    }

    /// Same parameters under a new reference.
    pub fn renamed(&self, reference: impl Into<String>) -> SoilParams {
        let mut input = self.input.clone();
        input.reference = reference.into();
        SoilParams { input }
    }

    pub(crate) fn required(&self, field: &str, value: Option<f64>) -> GroundResult<f64> {
        value.ok_or_else(|| GroundError::missing_parameter(self.reference(), field))
    }
}

impl TryFrom<SoilParamsInput> for SoilParams {
    type Error = GroundError;

    fn try_from(input: SoilParamsInput) -> Result<Self, Self::Error> {
        SoilParams::new(input)
    }
}

impl From<SoilParams> for SoilParamsInput {
    fn from(params: SoilParams) -> Self {
        params.input
    }
}

impl std::fmt::Display for SoilParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, γ={} kN/m³)",
            self.input.reference, self.input.behaviour, self.input.unit_weight_kn_m3
        )
    }
}

// ============================================================================
// Validation
// ============================================================================

fn invalid(field: &str, value: f64, reason: &str) -> GroundError {
    GroundError::invalid_parameter(field, value.to_string(), reason)
}

fn check(field: &str, value: f64, valid: impl Fn(f64) -> bool, reason: &str) -> GroundResult<()> {
    if !value.is_finite() {
        return Err(invalid(field, value, "Value must be a finite number"));
    }
    if !valid(value) {
        return Err(invalid(field, value, reason));
    }
    Ok(())
}

fn check_optional(field: &str, value: Option<f64>, valid: impl Fn(f64) -> bool, reason: &str) -> GroundResult<()> {
    match value {
        Some(v) => check(field, v, valid, reason),
        None => Ok(()),
    }
}

fn validate(input: &SoilParamsInput) -> GroundResult<()> {
    check(
        "unit_weight_kn_m3",
        input.unit_weight_kn_m3,
        |v| v > 0.0 && v <= MAX_UNIT_WEIGHT_KN_M3,
        "Unit weight must be positive and at most 50 kN/m³",
    )?;
    check_optional(
        "phi_prime_deg",
        input.phi_prime_deg,
        |v| (0.0..=90.0).contains(&v),
        "Friction angle must be within 0-90 degrees",
    )?;
    check_optional("c_prime_kpa", input.c_prime_kpa, |v| v >= 0.0, "Cohesion cannot be negative")?;
    check_optional("cu_kpa", input.cu_kpa, |v| v >= 0.0, "Undrained shear strength cannot be negative")?;
    check_optional("mv_m2_mn", input.mv_m2_mn, |v| v >= 0.0, "Compressibility cannot be negative")?;
    check_optional(
        "youngs_modulus_mpa",
        input.youngs_modulus_mpa,
        |v| v > 0.0,
        "Young's modulus must be positive",
    )?;
    check_optional(
        "poissons_ratio",
        input.poissons_ratio,
        |v| (0.0..=0.5).contains(&v),
        "Poisson's ratio must be within 0-0.5",
    )?;
    check_optional("cv_m2_yr", input.cv_m2_yr, |v| v >= 0.0, "Coefficient of consolidation cannot be negative")?;
    check_optional(
        "permeability_m_s",
        input.permeability_m_s,
        |v| v > 0.0,
        "Permeability must be positive",
    )?;
    check_optional("gsi", input.gsi, |v| (0.0..=100.0).contains(&v), "GSI must be within 0-100")?;
    check_optional("ucs_mpa", input.ucs_mpa, |v| v > 0.0, "UCS must be positive")?;
    check_optional("mi", input.mi, |v| v > 0.0, "Hoek-Brown mi must be positive")?;
    check(
        "disturbance",
        input.disturbance,
        |v| (0.0..=1.0).contains(&v),
        "Disturbance factor must be within 0-1",
    )?;

    if input.behaviour == SoilBehaviour::Granular && !input.allow_cohesion {
        for (field, value) in [("c_prime_kpa", input.c_prime_kpa), ("cu_kpa", input.cu_kpa)] {
            if let Some(v) = value.filter(|v| *v > 0.0) {
                return Err(invalid(
                    field,
                    v,
                    "Granular soil cannot carry cohesion unless allow_cohesion is set",
                ));
            }
        }
    }

    for param in &input.advanced_parameters {
        if param.name.trim().is_empty() {
            return Err(GroundError::invalid_parameter(
                "advanced_parameters",
                param.value.to_string(),
                "Advanced parameter needs a name",
            ));
        }
        check(&param.name, param.value, |_| true, "")?;
    }

    if let Some(factors) = &input.factors {
        factors.validate()?;
    }

    Ok(())
}
