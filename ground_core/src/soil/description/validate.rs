//! Consistency checks on a parsed description.

use serde::{Deserialize, Serialize};

use super::{MaterialType, Plasticity, SoilDescription, StrengthParameterType, Weathering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Report every warning as an error as well
    pub strict: bool,
    pub require_strength_parameters: bool,
    pub require_primary_type: bool,
    pub check_correlations: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            strict: false,
            require_strength_parameters: false,
            require_primary_type: false,
            check_correlations: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    CohesiveWithDensity,
    GranularWithConsistency,
    RockWithConsistency,
    RockWithDensity,
    RockWithSoilType,
    SoilWithRockStrength,
    SoilWithRockType,
    SoilWithWeathering,
    SoilWithRockStructure,
    MissingSoilType,
    MissingRockType,
    MissingStrengthParameters,
    InvalidConfidence,
    InvalidStrengthRange,
    TypicalValueOutOfRange,
    InvalidStrengthConfidence,
    MissingConsistency,
    MissingDensity,
    StrengthTypeMismatch,
    UnusualCombination,
    SpellingCorrected,
    StrictWarning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|issue| issue.code == code)
    }

    fn error(&mut self, code: IssueCode, field: &str, message: impl Into<String>) {
        self.errors.push(issue(code, field, message));
    }

    fn warning(&mut self, code: IssueCode, field: &str, message: impl Into<String>) {
        self.warnings.push(issue(code, field, message));
    }
}

fn issue(code: IssueCode, field: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        code,
        message: message.into(),
        field: (!field.is_empty()).then(|| field.to_string()),
    }
}

pub fn validate_soil_description(desc: &SoilDescription, options: ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::default();

    match desc.material_type {
        Some(MaterialType::Rock) => check_rock(desc, options, &mut result),
        Some(MaterialType::Soil) => check_soil(desc, options, &mut result),
        None => {
            if options.require_primary_type {
                result.error(IssueCode::MissingSoilType, "primary_soil_type", "No soil or rock type found");
            }
        }
    }

    if !(0.0..=1.0).contains(&desc.confidence) {
        result.error(
            IssueCode::InvalidConfidence,
            "confidence",
            format!("Confidence {} is outside 0-1", desc.confidence),
        );
    }
    check_strength(desc, options, &mut result);

    if options.check_correlations {
        check_correlations(desc, &mut result);
    }
    for correction in &desc.spelling_corrections {
        result.warning(
            IssueCode::SpellingCorrected,
            "",
            format!("'{}' read as '{}'", correction.original, correction.corrected),
        );
    }

    if options.strict {
        let promoted: Vec<ValidationIssue> = result
            .warnings
            .iter()
            .map(|w| ValidationIssue {
                code: IssueCode::StrictWarning,
                message: format!("{:?}: {}", w.code, w.message),
                field: w.field.clone(),
            })
            .collect();
        result.errors.extend(promoted);
    }
    result.is_valid = result.errors.is_empty();
    result
}

fn check_soil(desc: &SoilDescription, options: ValidationOptions, result: &mut ValidationResult) {
    match desc.primary_soil_type {
        Some(soil) if soil.is_cohesive() => {
            if desc.density.is_some() {
                result.error(
                    IssueCode::CohesiveWithDensity,
                    "density",
                    format!("Cohesive {} is described by consistency, not density", soil),
                );
            }
            if desc.consistency.is_none() {
                result.warning(IssueCode::MissingConsistency, "consistency", "Cohesive soil has no consistency term");
            }
        }
        Some(soil) => {
            if desc.consistency.is_some() {
                result.error(
                    IssueCode::GranularWithConsistency,
                    "consistency",
                    format!("Granular {} is described by density, not consistency", soil),
                );
            }
            if desc.density.is_none() {
                result.warning(IssueCode::MissingDensity, "density", "Granular soil has no density term");
            }
        }
        None => {
            if options.require_primary_type {
                result.error(IssueCode::MissingSoilType, "primary_soil_type", "No primary soil type found");
            }
        }
    }

    if desc.rock_strength.is_some() {
        result.error(IssueCode::SoilWithRockStrength, "rock_strength", "Soil cannot carry a rock strength term");
    }
    if desc.rock_type.is_some() {
        result.error(IssueCode::SoilWithRockType, "rock_type", "Soil cannot have a rock type");
    }
    if desc.weathering.is_some() {
        result.error(IssueCode::SoilWithWeathering, "weathering", "Weathering grades apply to rock only");
    }
    if desc.rock_structure.is_some() {
        result.error(IssueCode::SoilWithRockStructure, "rock_structure", "Rock structure terms apply to rock only");
    }
}

fn check_rock(desc: &SoilDescription, options: ValidationOptions, result: &mut ValidationResult) {
    if desc.consistency.is_some() {
        result.error(IssueCode::RockWithConsistency, "consistency", "Rock cannot carry a consistency term");
    }
    if desc.density.is_some() {
        result.error(IssueCode::RockWithDensity, "density", "Rock cannot carry a density term");
    }
    if desc.primary_soil_type.is_some() {
        result.error(IssueCode::RockWithSoilType, "primary_soil_type", "Rock cannot have a soil type");
    }
    if desc.rock_type.is_none() && options.require_primary_type {
        result.error(IssueCode::MissingRockType, "rock_type", "No rock type found");
    }
}

fn check_strength(desc: &SoilDescription, options: ValidationOptions, result: &mut ValidationResult) {
    let Some(strength) = &desc.strength else {
        if options.require_strength_parameters {
            result.error(
                IssueCode::MissingStrengthParameters,
                "strength",
                "No strength term to derive parameters from",
            );
        }
        return;
    };

    let range = strength.range;
    if !(range.lower.is_finite() && range.upper.is_finite()) || range.lower > range.upper {
        result.error(
            IssueCode::InvalidStrengthRange,
            "strength",
            format!("Range {}-{} is not ordered", range.lower, range.upper),
        );
    } else if !range.contains(range.typical) {
        result.error(
            IssueCode::TypicalValueOutOfRange,
            "strength",
            format!("Typical value {} lies outside {}-{}", range.typical, range.lower, range.upper),
        );
    }
    if !(0.0..=1.0).contains(&strength.confidence) {
        result.error(
            IssueCode::InvalidStrengthConfidence,
            "strength",
            format!("Strength confidence {} is outside 0-1", strength.confidence),
        );
    }
}

fn check_correlations(desc: &SoilDescription, result: &mut ValidationResult) {
    let granular = desc.primary_soil_type.is_some_and(|t| t.is_granular());
    if granular && matches!(desc.plasticity, Some(Plasticity::High | Plasticity::ExtremelyHigh)) {
        result.warning(
            IssueCode::UnusualCombination,
            "plasticity",
            "High plasticity is unusual for a granular soil",
        );
    }
    if desc.weathering == Some(Weathering::Fresh) && desc.rock_strength.is_some_and(|s| s.is_weak()) {
        result.warning(IssueCode::UnusualCombination, "rock_strength", "Fresh rock described as weak");
    }
    if desc.weathering == Some(Weathering::CompletelyWeathered) && desc.rock_strength.is_some_and(|s| s.is_strong()) {
        result.warning(
            IssueCode::UnusualCombination,
            "rock_strength",
            "Completely weathered rock described as strong",
        );
    }

    if let (Some(material), Some(strength)) = (desc.material_type, &desc.strength) {
        let expected = match material {
            MaterialType::Rock => strength.parameter_type == StrengthParameterType::Ucs,
            MaterialType::Soil => strength.parameter_type != StrengthParameterType::Ucs,
        };
        if !expected {
            result.warning(
                IssueCode::StrengthTypeMismatch,
                "strength",
                format!("{:?} strength does not suit {}", strength.parameter_type, material),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::description::parse_soil_description;

    fn validate(text: &str) -> ValidationResult {
        validate_soil_description(&parse_soil_description(text), ValidationOptions::default())
    }

    #[test]
    fn test_valid_descriptions() {
        for text in ["Firm brown CLAY", "Medium dense SAND", "Strong slightly weathered LIMESTONE"] {
            let result = validate(text);
            assert!(result.is_valid, "{}: {:?}", text, result.errors);
            assert!(result.warnings.is_empty(), "{}: {:?}", text, result.warnings);
        }
    }

    #[test]
    fn test_cohesive_with_density() {
        let result = validate("Firm dense clay");
        assert!(!result.is_valid);
        assert!(result.has_error(IssueCode::CohesiveWithDensity));
    }

    #[test]
    fn test_mixed_soil_and_rock_terms() {
        let result = validate("Loose weathered SAND, stiff");
        assert!(result.has_error(IssueCode::GranularWithConsistency));

        let result = validate("Weak soft thinly bedded SAND");
        assert!(result.has_error(IssueCode::SoilWithRockStrength));
        assert!(result.has_error(IssueCode::SoilWithRockStructure));

        let result = validate("Firm CLAY with SANDSTONE");
        assert_eq!(parse_soil_description("Firm CLAY with SANDSTONE").material_type, Some(MaterialType::Rock));
        assert!(result.has_error(IssueCode::RockWithConsistency));
        assert!(result.has_error(IssueCode::RockWithSoilType));
    }

    #[test]
    fn test_warnings_and_strict_mode() {
        let result = validate("brown CLAY");
        assert!(result.is_valid);
        assert!(result.has_warning(IssueCode::MissingConsistency));

        let strict = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        let result = validate_soil_description(&parse_soil_description("brown CLAY"), strict);
        assert!(!result.is_valid);
        assert!(result.has_error(IssueCode::StrictWarning));

        let result = validate("Firn CLAY");
        assert!(result.has_warning(IssueCode::SpellingCorrected));
    }

    #[test]
    fn test_required_fields() {
        let options = ValidationOptions {
            require_strength_parameters: true,
            require_primary_type: true,
            ..Default::default()
        };
        let result = validate_soil_description(&parse_soil_description("brown, moist"), options);
        assert!(result.has_error(IssueCode::MissingSoilType));
        assert!(result.has_error(IssueCode::MissingStrengthParameters));

        let result = validate_soil_description(&parse_soil_description("strong, slightly weathered"), options);
        assert!(result.has_error(IssueCode::MissingRockType));
    }

    #[test]
    fn test_unusual_combinations() {
        let result = validate("Dense high plasticity SAND");
        assert!(result.has_warning(IssueCode::UnusualCombination));

        let result = validate("Very weak fresh MUDSTONE");
        assert!(result.has_warning(IssueCode::UnusualCombination));

        let result = validate("Strong completely weathered GRANITE");
        assert!(result.has_warning(IssueCode::UnusualCombination));

        let quiet = ValidationOptions {
            check_correlations: false,
            ..Default::default()
        };
        let result = validate_soil_description(&parse_soil_description("Strong completely weathered GRANITE"), quiet);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_edited_strength_is_checked() {
        let mut desc = parse_soil_description("Stiff CLAY");
        if let Some(strength) = desc.strength.as_mut() {
            strength.range.typical = 500.0;
            strength.confidence = 1.5;
        }
        let result = validate_soil_description(&desc, ValidationOptions::default());
        assert!(result.has_error(IssueCode::TypicalValueOutOfRange));
        assert!(result.has_error(IssueCode::InvalidStrengthConfidence));

        if let Some(strength) = desc.strength.as_mut() {
            strength.range.lower = 200.0;
            strength.parameter_type = StrengthParameterType::Ucs;
        }
        desc.confidence = -0.1;
        let result = validate_soil_description(&desc, ValidationOptions::default());
        assert!(result.has_error(IssueCode::InvalidStrengthRange));
        assert!(result.has_error(IssueCode::InvalidConfidence));
        assert!(result.has_warning(IssueCode::StrengthTypeMismatch));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["errors"][0]["code"], "INVALID_CONFIDENCE");
    }
}
