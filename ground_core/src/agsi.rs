//! # AGSi Import
//!
//! Reads soil parameter sets (and optionally layers) from an AGSi JSON
//! ground model. Only the first `agsiModel` is read. Each
//! `agsiModelElement` with `agsiDataParameterValue` entries becomes a
//! parameter set named after its `elementName`; elements that also carry an
//! `agsiGeometry` with `topElevation`/`bottomElevation` become layers.
//!
//! ```json
//! {
//!   "agsiModel": [{
//!     "modelName": "Site model",
//!     "agsiModelElement": [{
//!       "elementName": "London Clay",
//!       "agsiGeometry": { "topElevation": 5.0, "bottomElevation": -20.0 },
//!       "agsiDataParameterValue": [
//!         { "codeID": "UnitWeight", "valueNumeric": 20.0 },
//!         { "codeID": "UndrainedShearStrength", "valueNumeric": 75.0 }
//!       ]
//!     }]
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::errors::{GroundError, GroundResult};
use crate::model::{GroundModel, LayerInput};
use crate::soil::{AdvancedParameter, SoilBehaviour, SoilParams, SoilParamsInput};

// ============================================================================
// Document shape (only the parts read here)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgsiRoot {
    #[serde(default)]
    agsi_model: Vec<AgsiModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgsiModel {
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    agsi_model_element: Vec<AgsiModelElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgsiModelElement {
    #[serde(default)]
    element_name: Option<String>,
    #[serde(default)]
    agsi_geometry: Option<AgsiGeometry>,
    #[serde(default)]
    agsi_data_parameter_value: Vec<AgsiDataParameterValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgsiGeometry {
    top_elevation: Option<f64>,
    bottom_elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AgsiDataParameterValue {
    #[serde(rename = "codeID")]
    code_id: String,
    #[serde(rename = "valueNumeric", default)]
    value_numeric: Option<f64>,
}

// ============================================================================
// Parameter code table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgsiField {
    UnitWeight,
    FrictionAngle,
    Cohesion,
    UndrainedShearStrength,
    YoungsModulus,
    Mv,
    Gsi,
    Ucs,
    Mi,
    Disturbance,
    PoissonsRatio,
    Permeability,
}

static CODE_TABLE: Lazy<HashMap<&'static str, AgsiField>> = Lazy::new(|| {
    HashMap::from([
        ("UnitWeight", AgsiField::UnitWeight),
        ("AngleFriction", AgsiField::FrictionAngle),
        ("EffectiveFrictionAngle", AgsiField::FrictionAngle),
        ("Cohesion", AgsiField::Cohesion),
        ("EffectiveCohesion", AgsiField::Cohesion),
        ("UndrainedShearStrength", AgsiField::UndrainedShearStrength),
        ("YoungsModulus", AgsiField::YoungsModulus),
        ("ModulusOfVolumeCompressibility", AgsiField::Mv),
        ("GeologicalStrengthIndex", AgsiField::Gsi),
        ("UnconfinedCompressiveStrength", AgsiField::Ucs),
        ("HoekBrownParamMi", AgsiField::Mi),
        ("Disturbance", AgsiField::Disturbance),
        ("PoissonsRatio", AgsiField::PoissonsRatio),
        ("Permeability", AgsiField::Permeability),
    ])
});

// ============================================================================
// Import
// ============================================================================

/// Read every parameter set in the first AGSi model.
///
/// # Errors
///
/// `Agsi` for unreadable JSON, a missing `agsiModel` or an element whose
/// values fail validation (the message names the element).
pub fn soil_params_from_agsi(json: &str) -> GroundResult<Vec<SoilParams>> {
    let root = parse(json)?;
    let model = first_model(&root)?;
    let mut soils = Vec::new();
    for (index, element) in model.agsi_model_element.iter().enumerate() {
        if let Some(params) = element_params(index, element)? {
            soils.push(params);
        }
    }
    debug!(soils = soils.len(), "read AGSi parameter sets");
    Ok(soils)
}

impl GroundModel {
    /// Build a model from the first AGSi model.
    ///
    /// Elements with a top and bottom elevation become layers; ground level
    /// is the highest top elevation. Elements without geometry are skipped.
    pub fn from_agsi(json: &str) -> GroundResult<GroundModel> {
        let root = parse(json)?;
        let agsi_model = first_model(&root)?;

        let mut placed = Vec::new();
        for (index, element) in agsi_model.agsi_model_element.iter().enumerate() {
            let Some(geometry) = &element.agsi_geometry else {
                continue;
            };
            let (Some(top), Some(bottom)) = (geometry.top_elevation, geometry.bottom_elevation) else {
                continue;
            };
            if let Some(params) = element_params(index, element)? {
                placed.push((top, bottom, Arc::new(params)));
            }
        }

        let reference = agsi_model.model_name.clone().unwrap_or_else(|| "AGSi".to_string());
        let mut model = GroundModel::new(reference);
        let Some(ground_level) = placed.iter().map(|(top, _, _)| *top).reduce(f64::max) else {
            return Ok(model);
        };
        model.set_ground_level(ground_level)?;

        placed.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (top, bottom, params) in placed {
            let input = LayerInput::new(model.depth_at_level(top), model.depth_at_level(bottom), params);
            model.add_described_layer(input)?;
        }
        debug!(model = %model, "built ground model from AGSi");
        Ok(model)
    }
}

fn parse(json: &str) -> GroundResult<AgsiRoot> {
    serde_json::from_str(json).map_err(|e| GroundError::agsi("$", e.to_string()))
}

fn first_model(root: &AgsiRoot) -> GroundResult<&AgsiModel> {
    root.agsi_model
        .first()
        .ok_or_else(|| GroundError::agsi("agsiModel", "document has no agsiModel entries"))
}

/// Parameter set for one element, or `None` if it carries no parameters.
fn element_params(index: usize, element: &AgsiModelElement) -> GroundResult<Option<SoilParams>> {
    if element.agsi_data_parameter_value.is_empty() {
        return Ok(None);
    }
    let path = format!("agsiModel[0].agsiModelElement[{}]", index);
    let reference = element.element_name.clone().unwrap_or_else(|| format!("ELEMENT {}", index + 1));

    let mut input = SoilParamsInput::new(reference, SoilBehaviour::Granular, 0.0);
    for value in &element.agsi_data_parameter_value {
        let Some(numeric) = value.value_numeric else {
            trace!(code = %value.code_id, "AGSi parameter without numeric value");
            continue;
        };
        match CODE_TABLE.get(value.code_id.as_str()) {
            Some(AgsiField::UnitWeight) => input.unit_weight_kn_m3 = numeric,
            Some(AgsiField::FrictionAngle) => input.phi_prime_deg = Some(numeric),
            Some(AgsiField::Cohesion) => input.c_prime_kpa = Some(numeric),
            Some(AgsiField::UndrainedShearStrength) => input.cu_kpa = Some(numeric),
            Some(AgsiField::YoungsModulus) => input.youngs_modulus_mpa = Some(numeric),
            Some(AgsiField::Mv) => input.mv_m2_mn = Some(numeric),
            Some(AgsiField::Gsi) => input.gsi = Some(numeric),
            Some(AgsiField::Ucs) => input.ucs_mpa = Some(numeric),
            Some(AgsiField::Mi) => input.mi = Some(numeric),
            Some(AgsiField::Disturbance) => input.disturbance = numeric,
            Some(AgsiField::PoissonsRatio) => input.poissons_ratio = Some(numeric),
            Some(AgsiField::Permeability) => input.permeability_m_s = Some(numeric),
            None => input.advanced_parameters.push(AdvancedParameter {
                name: value.code_id.clone(),
                value: numeric,
            }),
        }
    }

    input.behaviour = if input.ucs_mpa.is_some() {
        SoilBehaviour::Rock
    } else if input.cu_kpa.is_some_and(|cu| cu > 0.0) {
        SoilBehaviour::Cohesive
    } else {
        SoilBehaviour::Granular
    };
    // AGSi data states its cohesion explicitly; keep it on granular units
    if input.behaviour == SoilBehaviour::Granular && input.c_prime_kpa.is_some_and(|c| c > 0.0) {
        input.allow_cohesion = true;
    }

    SoilParams::new(input)
        .map(Some)
        .map_err(|e| GroundError::agsi(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = r#"{
        "agsiModel": [{
            "modelName": "Site model",
            "agsiModelElement": [
                {
                    "elementName": "Made Ground",
                    "agsiGeometry": { "topElevation": 10.0, "bottomElevation": 8.5 },
                    "agsiDataParameterValue": [
                        { "codeID": "UnitWeight", "valueNumeric": 18.0 },
                        { "codeID": "EffectiveFrictionAngle", "valueNumeric": 28.0 },
                        { "codeID": "EffectiveCohesion", "valueNumeric": 2.0 }
                    ]
                },
                {
                    "elementName": "London Clay",
                    "agsiGeometry": { "topElevation": 8.5, "bottomElevation": -10.0 },
                    "agsiDataParameterValue": [
                        { "codeID": "UnitWeight", "valueNumeric": 20.0 },
                        { "codeID": "UndrainedShearStrength", "valueNumeric": 75.0 },
                        { "codeID": "PlasticityIndex", "valueNumeric": 45.0 },
                        { "codeID": "Remarks" }
                    ]
                },
                {
                    "elementName": "Chalk",
                    "agsiDataParameterValue": [
                        { "codeID": "UnitWeight", "valueNumeric": 21.0 },
                        { "codeID": "UnconfinedCompressiveStrength", "valueNumeric": 5.0 },
                        { "codeID": "GeologicalStrengthIndex", "valueNumeric": 40.0 },
                        { "codeID": "HoekBrownParamMi", "valueNumeric": 7.0 }
                    ]
                },
                { "elementName": "Empty" }
            ]
        }]
    }"#;

    #[test]
    fn test_soil_params_from_agsi() {
        let soils = soil_params_from_agsi(SITE).unwrap();
        assert_eq!(soils.len(), 3);

        let made = &soils[0];
        assert_eq!(made.reference(), "Made Ground");
        assert_eq!(made.behaviour(), SoilBehaviour::Granular);
        assert!(made.allows_cohesion());
        assert_eq!(made.phi_prime_deg(), Some(28.0));

        let clay = &soils[1];
        assert_eq!(clay.behaviour(), SoilBehaviour::Cohesive);
        assert_eq!(clay.cu_kpa(), Some(75.0));
        assert_eq!(clay.advanced_parameter("PlasticityIndex"), Some(45.0));
        assert_eq!(clay.advanced_parameters().len(), 1);

        let chalk = &soils[2];
        assert_eq!(chalk.behaviour(), SoilBehaviour::Rock);
        assert!(chalk.hoek_brown().is_ok());
    }

    #[test]
    fn test_model_from_agsi() {
        let model = GroundModel::from_agsi(SITE).unwrap();
        assert_eq!(model.reference(), "Site model");
        assert_eq!(model.ground_level_m(), 10.0);
        assert_eq!(model.len(), 2);
        assert_eq!(model.extent(), Some((0.0, 20.0)));
        assert_eq!(model.parameter_at(1.0).unwrap().reference(), "Made Ground");
        assert_eq!(model.parameter_at(1.5).unwrap().reference(), "London Clay");
    }

    #[test]
    fn test_invalid_agsi() {
        assert!(matches!(soil_params_from_agsi("not json"), Err(GroundError::Agsi { .. })));
        let err = soil_params_from_agsi(r#"{"agsiModel": []}"#).unwrap_err();
        assert_eq!(err, GroundError::agsi("agsiModel", "document has no agsiModel entries"));

        let bad = r#"{"agsiModel": [{"agsiModelElement": [
            {"elementName": "Heavy", "agsiDataParameterValue": [{"codeID": "UnitWeight", "valueNumeric": 90.0}]}
        ]}]}"#;
        let err = soil_params_from_agsi(bad).unwrap_err();
        assert!(matches!(err, GroundError::Agsi { ref path, .. } if path == "agsiModel[0].agsiModelElement[0]"));
    }

    #[test]
    fn test_model_without_geometry() {
        let json = r#"{"agsiModel": [{"agsiModelElement": [
            {"elementName": "Sand", "agsiDataParameterValue": [{"codeID": "UnitWeight", "valueNumeric": 19.0}]}
        ]}]}"#;
        let model = GroundModel::from_agsi(json).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.reference(), "AGSi");
    }
}
