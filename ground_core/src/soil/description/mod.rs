//! # Field Descriptions
//!
//! Parsing of BS 5930 style soil and rock descriptions such as
//! `"Firm brown slightly sandy CLAY"` or `"Strong slightly weathered
//! LIMESTONE"`, with spelling correction, validation of the term
//! combinations, regeneration of a canonical description and indicative
//! strength ranges.
//!
//! ## Example
//!
//! ```rust
//! use ground_core::soil::description::{parse_soil_description, Consistency, SoilType};
//!
//! let desc = parse_soil_description("Firm brown CLAY, moist");
//! assert_eq!(desc.primary_soil_type, Some(SoilType::Clay));
//! assert_eq!(desc.consistency, Some(Consistency::Firm));
//!
//! let strength = desc.strength.unwrap();
//! assert_eq!(strength.range.typical, 37.0);
//! ```

pub mod lexer;
pub mod validate;

pub use lexer::{fuzzy_match, levenshtein_distance, similarity, tokenize, Token, TokenKind};
pub use validate::{validate_soil_description, IssueCode, ValidationIssue, ValidationOptions, ValidationResult};

use serde::{Deserialize, Serialize};

use super::{SoilBehaviour, SoilParams, SoilParamsInput};
use crate::errors::{GroundError, GroundResult};

/// Confidence factor applied per spelling correction.
const CORRECTION_CONFIDENCE: f64 = 0.8;
/// Confidence factor when no primary soil or rock type was found.
const NO_PRIMARY_CONFIDENCE: f64 = 0.7;
/// Confidence of strength ranges read from descriptive terms.
const DERIVED_STRENGTH_CONFIDENCE: f64 = 0.8;

/// Declares a description-term enum with `ALL`, `term()` and `Display`.
macro_rules! term_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $term:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Lower-case description term
            pub fn term(&self) -> &'static str {
                match self {
                    $($name::$variant => $term),+
                }
            }

            #[allow(dead_code)]
            fn from_term(term: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.term() == term)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.term())
            }
        }
    };
}

term_enum! {
    MaterialType {
        Soil => "soil",
        Rock => "rock",
    }
}

term_enum! {
    /// Consistency of fine soils, including the BS 5930 intermediate ranges
    Consistency {
        VerySoft => "very soft",
        Soft => "soft",
        Firm => "firm",
        Stiff => "stiff",
        VeryStiff => "very stiff",
        Hard => "hard",
        VerySoftToSoft => "very soft to soft",
        SoftToFirm => "soft to firm",
        FirmToStiff => "firm to stiff",
        StiffToVeryStiff => "stiff to very stiff",
        VeryStiffToHard => "very stiff to hard",
    }
}

term_enum! {
    /// Relative density of coarse soils
    Density {
        VeryLoose => "very loose",
        Loose => "loose",
        MediumDense => "medium dense",
        Dense => "dense",
        VeryDense => "very dense",
    }
}

term_enum! {
    SoilType {
        Clay => "clay",
        Silt => "silt",
        Sand => "sand",
        Gravel => "gravel",
        Peat => "peat",
        Organic => "organic",
        Cobbles => "cobbles",
        Boulders => "boulders",
    }
}

term_enum! {
    RockType {
        Limestone => "limestone",
        Sandstone => "sandstone",
        Mudstone => "mudstone",
        Shale => "shale",
        Granite => "granite",
        Basalt => "basalt",
    }
}

term_enum! {
    MoistureContent {
        Dry => "dry",
        Moist => "moist",
        Wet => "wet",
        Saturated => "saturated",
    }
}

term_enum! {
    Plasticity {
        NonPlastic => "non-plastic",
        Low => "low plasticity",
        Intermediate => "intermediate plasticity",
        High => "high plasticity",
        ExtremelyHigh => "extremely high plasticity",
    }
}

term_enum! {
    /// Intact rock strength
    RockStrength {
        VeryWeak => "very weak",
        Weak => "weak",
        ModeratelyWeak => "moderately weak",
        ModeratelyStrong => "moderately strong",
        Strong => "strong",
        VeryStrong => "very strong",
        ExtremelyStrong => "extremely strong",
    }
}

term_enum! {
    Weathering {
        Fresh => "fresh",
        SlightlyWeathered => "slightly weathered",
        ModeratelyWeathered => "moderately weathered",
        HighlyWeathered => "highly weathered",
        CompletelyWeathered => "completely weathered",
    }
}

term_enum! {
    /// Proportion qualifier of a secondary constituent
    Proportion {
        Slightly => "slightly",
        Moderately => "moderately",
        Very => "very",
    }
}

/// Indicative range of a strength parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthRange {
    pub lower: f64,
    pub upper: f64,
    pub typical: f64,
}

impl StrengthRange {
    const fn new(lower: f64, upper: f64, typical: f64) -> Self {
        StrengthRange { lower, upper, typical }
    }

    /// Range spanning two adjacent classes, typical value midway.
    fn spanning(low: StrengthRange, high: StrengthRange) -> Self {
        StrengthRange {
            lower: low.lower,
            upper: high.upper,
            typical: (low.typical + high.typical) / 2.0,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

impl Consistency {
    /// Undrained shear strength, kPa
    pub fn undrained_shear_strength(&self) -> StrengthRange {
        use Consistency::*;
        match self {
            VerySoft => StrengthRange::new(0.0, 12.0, 6.0),
            Soft => StrengthRange::new(12.0, 25.0, 18.0),
            Firm => StrengthRange::new(25.0, 50.0, 37.0),
            Stiff => StrengthRange::new(50.0, 100.0, 75.0),
            VeryStiff => StrengthRange::new(100.0, 200.0, 150.0),
            Hard => StrengthRange::new(200.0, 400.0, 300.0),
            VerySoftToSoft => StrengthRange::spanning(VerySoft.undrained_shear_strength(), Soft.undrained_shear_strength()),
            SoftToFirm => StrengthRange::spanning(Soft.undrained_shear_strength(), Firm.undrained_shear_strength()),
            FirmToStiff => StrengthRange::spanning(Firm.undrained_shear_strength(), Stiff.undrained_shear_strength()),
            StiffToVeryStiff => {
                StrengthRange::spanning(Stiff.undrained_shear_strength(), VeryStiff.undrained_shear_strength())
            }
            VeryStiffToHard => StrengthRange::spanning(VeryStiff.undrained_shear_strength(), Hard.undrained_shear_strength()),
        }
    }
}

impl Density {
    /// SPT N-value
    pub fn spt_n(&self) -> StrengthRange {
        match self {
            Density::VeryLoose => StrengthRange::new(0.0, 4.0, 2.0),
            Density::Loose => StrengthRange::new(4.0, 10.0, 7.0),
            Density::MediumDense => StrengthRange::new(10.0, 30.0, 20.0),
            Density::Dense => StrengthRange::new(30.0, 50.0, 40.0),
            Density::VeryDense => StrengthRange::new(50.0, 100.0, 75.0),
        }
    }

    /// Typical bulk unit weight, kN/m³
    pub fn typical_unit_weight_kn_m3(&self) -> f64 {
        match self {
            Density::VeryLoose => 17.0,
            Density::Loose => 18.0,
            Density::MediumDense => 19.0,
            Density::Dense => 20.0,
            Density::VeryDense => 21.0,
        }
    }
}

impl RockStrength {
    /// Uniaxial compressive strength, MPa
    pub fn ucs_mpa(&self) -> StrengthRange {
        match self {
            RockStrength::VeryWeak => StrengthRange::new(0.25, 1.0, 0.6),
            RockStrength::Weak => StrengthRange::new(1.0, 5.0, 2.5),
            RockStrength::ModeratelyWeak => StrengthRange::new(5.0, 12.5, 8.0),
            RockStrength::ModeratelyStrong => StrengthRange::new(12.5, 50.0, 25.0),
            RockStrength::Strong => StrengthRange::new(50.0, 100.0, 75.0),
            RockStrength::VeryStrong => StrengthRange::new(100.0, 200.0, 150.0),
            RockStrength::ExtremelyStrong => StrengthRange::new(200.0, 500.0, 300.0),
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, RockStrength::VeryWeak | RockStrength::Weak)
    }

    pub fn is_strong(&self) -> bool {
        matches!(
            self,
            RockStrength::Strong | RockStrength::VeryStrong | RockStrength::ExtremelyStrong
        )
    }
}

impl SoilType {
    pub fn behaviour(&self) -> SoilBehaviour {
        match self {
            SoilType::Clay | SoilType::Silt | SoilType::Peat | SoilType::Organic => SoilBehaviour::Cohesive,
            SoilType::Sand | SoilType::Gravel | SoilType::Cobbles | SoilType::Boulders => SoilBehaviour::Granular,
        }
    }

    pub fn is_cohesive(&self) -> bool {
        self.behaviour() == SoilBehaviour::Cohesive
    }

    pub fn is_granular(&self) -> bool {
        self.behaviour() == SoilBehaviour::Granular
    }

    /// Adjective used for a secondary constituent ("sandy")
    pub fn adjective(&self) -> Option<&'static str> {
        match self {
            SoilType::Clay => Some("clayey"),
            SoilType::Silt => Some("silty"),
            SoilType::Sand => Some("sandy"),
            SoilType::Gravel => Some("gravelly"),
            _ => None,
        }
    }

    fn from_adjective(adjective: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.adjective() == Some(adjective))
    }

    /// Typical bulk unit weight, kN/m³
    pub fn typical_unit_weight_kn_m3(&self) -> f64 {
        match self {
            SoilType::Clay | SoilType::Silt | SoilType::Sand => 19.0,
            SoilType::Gravel => 20.0,
            SoilType::Peat => 11.0,
            SoilType::Organic => 14.0,
            SoilType::Cobbles | SoilType::Boulders => 21.0,
        }
    }
}

impl RockType {
    /// Typical bulk unit weight, kN/m³
    pub fn typical_unit_weight_kn_m3(&self) -> f64 {
        match self {
            RockType::Limestone => 25.0,
            RockType::Sandstone | RockType::Mudstone => 23.0,
            RockType::Shale => 24.0,
            RockType::Granite => 26.0,
            RockType::Basalt => 28.0,
        }
    }
}

/// A minor soil fraction, e.g. "slightly sandy".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryConstituent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proportion: Option<Proportion>,
    pub soil_type: SoilType,
}

impl std::fmt::Display for SecondaryConstituent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let adjective = self.soil_type.adjective().unwrap_or(self.soil_type.term());
        match self.proportion {
            Some(p) => write!(f, "{} {}", p, adjective),
            None => f.write_str(adjective),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrengthParameterType {
    /// cu from consistency
    UndrainedShear,
    /// SPT N from relative density
    SptN,
    /// UCS from rock strength
    Ucs,
}

impl StrengthParameterType {
    pub fn unit(&self) -> &'static str {
        match self {
            StrengthParameterType::UndrainedShear => "kPa",
            StrengthParameterType::SptN => "blows/300mm",
            StrengthParameterType::Ucs => "MPa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthParameter {
    pub parameter_type: StrengthParameterType,
    pub range: StrengthRange,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellingCorrection {
    pub original: String,
    pub corrected: String,
    pub score: f64,
}

/// Structured reading of a field description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilDescription {
    pub raw: String,
    pub material_type: Option<MaterialType>,
    pub consistency: Option<Consistency>,
    pub density: Option<Density>,
    pub primary_soil_type: Option<SoilType>,
    pub secondary_constituents: Vec<SecondaryConstituent>,
    pub colour: Option<String>,
    pub moisture: Option<MoistureContent>,
    pub plasticity: Option<Plasticity>,
    pub particle_size: Option<String>,
    pub rock_type: Option<RockType>,
    pub rock_strength: Option<RockStrength>,
    pub weathering: Option<Weathering>,
    pub rock_structure: Option<String>,
    pub strength: Option<StrengthParameter>,
    pub spelling_corrections: Vec<SpellingCorrection>,
    /// 0-1; lowered by spelling corrections and a missing primary type
    pub confidence: f64,
}

/// Read a free-text description. Unrecognised words are ignored; the
/// first soil or rock type named is the primary one.
pub fn parse_soil_description(text: &str) -> SoilDescription {
    let tokens = tokenize(text);
    let mut desc = SoilDescription {
        raw: text.to_string(),
        ..Default::default()
    };
    let mut pending_proportion = None;
    let mut recognised = 0usize;

    for token in &tokens {
        if let (Some(original), Some(score)) = (&token.corrected_from, token.score) {
            desc.spelling_corrections.push(SpellingCorrection {
                original: original.clone(),
                corrected: token.value.clone(),
                score,
            });
        }
        if token.kind != TokenKind::Unknown {
            recognised += 1;
        }

        let value = token.value.as_str();
        match token.kind {
            TokenKind::Consistency => desc.consistency = Consistency::from_term(value),
            TokenKind::Density => desc.density = Density::from_term(value),
            TokenKind::RockStrength => desc.rock_strength = RockStrength::from_term(value),
            TokenKind::Weathering => desc.weathering = Weathering::from_term(value),
            TokenKind::Structure => desc.rock_structure = Some(value.to_string()),
            TokenKind::Colour => desc.colour = Some(value.to_string()),
            TokenKind::Proportion => {
                pending_proportion = Proportion::from_term(value);
                continue;
            }
            TokenKind::Constituent => {
                if let Some(soil_type) = SoilType::from_adjective(value) {
                    desc.secondary_constituents.push(SecondaryConstituent {
                        proportion: pending_proportion,
                        soil_type,
                    });
                }
            }
            TokenKind::Moisture => desc.moisture = MoistureContent::from_term(value),
            TokenKind::ParticleSize => desc.particle_size = Some(value.to_string()),
            TokenKind::Plasticity => desc.plasticity = Plasticity::from_term(value),
            TokenKind::SoilType => {
                if desc.primary_soil_type.is_none() {
                    desc.primary_soil_type = SoilType::from_term(value);
                }
            }
            TokenKind::RockType => {
                if desc.rock_type.is_none() {
                    desc.rock_type = RockType::from_term(value);
                }
            }
            TokenKind::Unknown => {}
        }
        pending_proportion = None;
    }

    desc.material_type = if desc.rock_type.is_some() {
        Some(MaterialType::Rock)
    } else if desc.primary_soil_type.is_some() {
        Some(MaterialType::Soil)
    } else if desc.rock_strength.is_some() || desc.weathering.is_some() {
        Some(MaterialType::Rock)
    } else if desc.consistency.is_some() || desc.density.is_some() {
        Some(MaterialType::Soil)
    } else {
        None
    };

    desc.confidence = if recognised == 0 {
        0.0
    } else {
        let mut confidence = CORRECTION_CONFIDENCE.powi(desc.spelling_corrections.len() as i32);
        if desc.primary_soil_type.is_none() && desc.rock_type.is_none() {
            confidence *= NO_PRIMARY_CONFIDENCE;
        }
        confidence
    };
    desc.strength = derive_strength_parameters(&desc);
    desc
}

/// Indicative strength from the descriptive terms: cu from consistency,
/// SPT N from density, UCS from rock strength, in that order.
pub fn derive_strength_parameters(desc: &SoilDescription) -> Option<StrengthParameter> {
    let (parameter_type, range) = if let Some(consistency) = desc.consistency {
        (StrengthParameterType::UndrainedShear, consistency.undrained_shear_strength())
    } else if let Some(density) = desc.density {
        (StrengthParameterType::SptN, density.spt_n())
    } else if let Some(strength) = desc.rock_strength {
        (StrengthParameterType::Ucs, strength.ucs_mpa())
    } else {
        return None;
    };
    Some(StrengthParameter {
        parameter_type,
        range,
        confidence: DERIVED_STRENGTH_CONFIDENCE,
    })
}

/// Canonical description in BS 5930 word order, primary type upper case.
pub fn generate_description(desc: &SoilDescription) -> String {
    let mut parts: Vec<String> = Vec::new();

    if desc.material_type == Some(MaterialType::Rock) {
        parts.extend(desc.rock_strength.map(|s| s.term().to_string()));
        parts.extend(desc.weathering.map(|w| w.term().to_string()));
        parts.extend(desc.rock_structure.clone());
        parts.extend(desc.colour.clone());
        parts.extend(desc.rock_type.map(|r| r.term().to_uppercase()));
    } else {
        parts.extend(desc.consistency.map(|c| c.term().to_string()));
        parts.extend(desc.density.map(|d| d.term().to_string()));
        parts.extend(desc.colour.clone());
        parts.extend(desc.secondary_constituents.iter().map(|c| c.to_string()));
        parts.extend(desc.moisture.map(|m| m.term().to_string()));
        parts.extend(desc.plasticity.map(|p| p.term().to_string()));
        parts.extend(desc.particle_size.clone());
        parts.extend(desc.primary_soil_type.map(|t| t.term().to_uppercase()));
    }

    let text = parts.join(" ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

impl SoilDescription {
    /// Behaviour class implied by the material and primary type.
    pub fn behaviour(&self) -> Option<SoilBehaviour> {
        match self.material_type {
            Some(MaterialType::Rock) => Some(SoilBehaviour::Rock),
            _ => self.primary_soil_type.map(|t| t.behaviour()),
        }
    }

    /// Starting parameter set: typical unit weight, plus cu for cohesive
    /// soil, φ' from SPT N (Wolff 1989) for granular soil and UCS for rock
    /// where the description gives a strength term.
    pub fn suggest_params(&self, reference: impl Into<String>) -> GroundResult<SoilParams> {
        let behaviour = self.behaviour().ok_or_else(|| {
            GroundError::invalid_parameter("description", self.raw.clone(), "Description names no soil or rock type")
        })?;

        let unit_weight = match behaviour {
            SoilBehaviour::Rock => self.rock_type.map_or(24.0, |r| r.typical_unit_weight_kn_m3()),
            SoilBehaviour::Granular => match self.density {
                Some(density) => density.typical_unit_weight_kn_m3(),
                None => self.primary_soil_type.map_or(19.0, |t| t.typical_unit_weight_kn_m3()),
            },
            SoilBehaviour::Cohesive => self.primary_soil_type.map_or(19.0, |t| t.typical_unit_weight_kn_m3()),
        };

        let mut input = SoilParamsInput::new(reference, behaviour, unit_weight);
        match behaviour {
            SoilBehaviour::Cohesive => {
                input.cu_kpa = self.consistency.map(|c| c.undrained_shear_strength().typical);
            }
            SoilBehaviour::Granular => {
                input.phi_prime_deg = self.density.map(|d| phi_from_spt(d.spt_n().typical));
            }
            SoilBehaviour::Rock => {
                input.ucs_mpa = self.rock_strength.map(|s| s.ucs_mpa().typical);
            }
        }
        input.build()
    }
}

/// Wolff (1989) fit of Peck, Hanson and Thornburn: φ' = 27.1 + 0.3N − 0.00054N².
pub fn phi_from_spt(n: f64) -> f64 {
    27.1 + 0.3 * n - 0.00054 * n * n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_firm_clay() {
        let desc = parse_soil_description("Firm brown clay, moist");
        assert_eq!(desc.material_type, Some(MaterialType::Soil));
        assert_eq!(desc.primary_soil_type, Some(SoilType::Clay));
        assert_eq!(desc.consistency, Some(Consistency::Firm));
        assert_eq!(desc.colour.as_deref(), Some("brown"));
        assert_eq!(desc.moisture, Some(MoistureContent::Moist));
        assert_eq!(desc.confidence, 1.0);

        let strength = desc.strength.unwrap();
        assert_eq!(strength.parameter_type, StrengthParameterType::UndrainedShear);
        assert_eq!(strength.range, StrengthRange::new(25.0, 50.0, 37.0));
        assert_eq!(strength.confidence, 0.8);
    }

    #[test]
    fn test_parse_medium_dense_sand() {
        let desc = parse_soil_description("Medium dense fine to medium SAND");
        assert_eq!(desc.density, Some(Density::MediumDense));
        assert_eq!(desc.particle_size.as_deref(), Some("fine to medium"));
        let strength = desc.strength.unwrap();
        assert_eq!(strength.parameter_type, StrengthParameterType::SptN);
        assert_eq!(strength.range.typical, 20.0);
    }

    #[test]
    fn test_parse_rock() {
        let desc = parse_soil_description("Strong limestone, slightly weathered");
        assert_eq!(desc.material_type, Some(MaterialType::Rock));
        assert_eq!(desc.rock_type, Some(RockType::Limestone));
        assert_eq!(desc.rock_strength, Some(RockStrength::Strong));
        assert_eq!(desc.weathering, Some(Weathering::SlightlyWeathered));
        let strength = desc.strength.unwrap();
        assert_eq!(strength.parameter_type, StrengthParameterType::Ucs);
        assert_eq!(strength.range, StrengthRange::new(50.0, 100.0, 75.0));
    }

    #[test]
    fn test_consistency_range_spans_classes() {
        let desc = parse_soil_description("Soft to firm grey CLAY");
        assert_eq!(desc.consistency, Some(Consistency::SoftToFirm));
        let range = desc.strength.unwrap().range;
        assert_eq!(range.lower, 12.0);
        assert_eq!(range.upper, 50.0);
        assert_eq!(range.typical, 27.5);
    }

    #[test]
    fn test_secondary_constituents() {
        let desc = parse_soil_description("Stiff slightly sandy very gravelly silty CLAY");
        assert_eq!(
            desc.secondary_constituents,
            vec![
                SecondaryConstituent {
                    proportion: Some(Proportion::Slightly),
                    soil_type: SoilType::Sand
                },
                SecondaryConstituent {
                    proportion: Some(Proportion::Very),
                    soil_type: SoilType::Gravel
                },
                SecondaryConstituent {
                    proportion: None,
                    soil_type: SoilType::Silt
                },
            ]
        );
    }

    #[test]
    fn test_corrections_lower_confidence() {
        let desc = parse_soil_description("Firn brown clai");
        assert_eq!(desc.consistency, Some(Consistency::Firm));
        assert_eq!(desc.primary_soil_type, Some(SoilType::Clay));
        assert_eq!(desc.spelling_corrections.len(), 2);
        assert_eq!(desc.spelling_corrections[0].original, "Firn");
        assert!((desc.confidence - 0.64).abs() < 1e-12);

        let no_type = parse_soil_description("firm brown");
        assert!((no_type.confidence - 0.7).abs() < 1e-12);
        assert_eq!(parse_soil_description("made ground").confidence, 0.0);
        assert_eq!(parse_soil_description("").material_type, None);
    }

    #[test]
    fn test_generate_round_trip() {
        let text = "Firm brown slightly sandy moist high plasticity CLAY";
        let desc = parse_soil_description(text);
        assert_eq!(generate_description(&desc), text);

        let rock = parse_soil_description("thinly bedded grey mudstone, moderately weak, highly weathered");
        let generated = generate_description(&rock);
        assert_eq!(generated, "Moderately weak highly weathered thinly bedded grey MUDSTONE");

        let reparsed = parse_soil_description(&generated);
        assert_eq!(reparsed.rock_strength, rock.rock_strength);
        assert_eq!(reparsed.weathering, rock.weathering);
        assert_eq!(reparsed.rock_structure, rock.rock_structure);
        assert_eq!(reparsed.rock_type, rock.rock_type);
        assert_eq!(generate_description(&SoilDescription::default()), "");
    }

    #[test]
    fn test_suggest_params() {
        let clay = parse_soil_description("Stiff brown CLAY").suggest_params("CLAY").unwrap();
        assert_eq!(clay.behaviour(), SoilBehaviour::Cohesive);
        assert_eq!(clay.unit_weight_kn_m3(), 19.0);
        assert_eq!(clay.cu_kpa(), Some(75.0));

        let sand = parse_soil_description("Dense SAND").suggest_params("SAND").unwrap();
        assert_eq!(sand.behaviour(), SoilBehaviour::Granular);
        assert_eq!(sand.unit_weight_kn_m3(), 20.0);
        let phi = sand.phi_prime_deg().unwrap();
        assert!((phi - (27.1 + 12.0 - 0.864)).abs() < 1e-9);
        assert_eq!(sand.cu_kpa(), None);

        let rock = parse_soil_description("Very strong BASALT").suggest_params("BASALT").unwrap();
        assert_eq!(rock.behaviour(), SoilBehaviour::Rock);
        assert_eq!(rock.unit_weight_kn_m3(), 28.0);
        assert_eq!(rock.ucs_mpa(), Some(150.0));

        let err = parse_soil_description("brown, moist").suggest_params("X").unwrap_err();
        assert!(matches!(err, GroundError::InvalidParameter { ref field, .. } if field == "description"));
    }

    #[test]
    fn test_description_serializes_kebab_terms() {
        let desc = parse_soil_description("Very stiff CLAY");
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["consistency"], "very-stiff");
        assert_eq!(json["strength"]["parameter_type"], "undrained-shear");
        let back: SoilDescription = serde_json::from_value(json).unwrap();
        assert_eq!(back, desc);
    }
}
