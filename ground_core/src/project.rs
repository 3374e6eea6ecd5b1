//! # Project Data Structures
//!
//! The `Project` struct is the root container for a site's ground data.
//! Projects serialize to `.gmp` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, engineer, job info, timestamps)
//! ├── settings: GlobalSettings (gap policy, stress step, AGS options)
//! ├── soils: BTreeMap<String, SoilParams> (parameter library by reference)
//! └── models: HashMap<Uuid, GroundModel> (one model per borehole/section)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ground_core::project::Project;
//! use ground_core::soil::SoilParamsInput;
//!
//! let mut project = Project::new("Jane Engineer", "25-042", "Riverside");
//! project.add_soil(SoilParamsInput::cohesive("CLAY", 19.0).with_cu(50.0).build().unwrap());
//!
//! let id = project.new_model("BH1").unwrap();
//! assert!(project.models.contains_key(&id));
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("CLAY"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ags::{AgsErrorPolicy, ConversionOptions};
use crate::errors::{GroundError, GroundResult};
use crate::model::{GapPolicy, GroundModel, DEFAULT_STRESS_STEP_M, DEFAULT_WATER_UNIT_WEIGHT_KN_M3};
use crate::soil::SoilParams;

/// Current schema version for .gmp files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
///
/// Models are stored in a flat UUID-keyed map; soils are keyed by their
/// reference so a library lookup by `GEOL_GEOL` code is direct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: GlobalSettings,

    /// Soil parameter library, keyed by reference
    #[serde(default)]
    pub soils: BTreeMap<String, SoilParams>,

    /// Ground models, keyed by UUID
    #[serde(default)]
    pub models: HashMap<Uuid, GroundModel>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Arguments
    ///
    /// * `engineer` - Name of the responsible engineer
    /// * `job_id` - Job/project number (e.g., "25-001")
    /// * `site` - Site name
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, site: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                site: site.into(),
                created: now,
                modified: now,
            },
            settings: GlobalSettings::default(),
            soils: BTreeMap::new(),
            models: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Soil library
    // ------------------------------------------------------------------------

    /// Add or replace a soil, returning the previous set with that reference.
    pub fn add_soil(&mut self, params: SoilParams) -> Option<SoilParams> {
        let previous = self.soils.insert(params.reference().to_string(), params);
        self.touch();
        previous
    }

    pub fn soil(&self, reference: &str) -> Option<&SoilParams> {
        self.soils.get(reference)
    }

    /// Remove a soil from the library. Fails while a model still uses it.
    pub fn remove_soil(&mut self, reference: &str) -> GroundResult<SoilParams> {
        if let Some(model) = self.models.values().find(|m| m.soil_params(reference).is_some()) {
            return Err(GroundError::invalid_parameter(
                "reference",
                reference,
                format!("Soil is used by model '{}'", model.reference()),
            ));
        }
        let removed = self
            .soils
            .remove(reference)
            .ok_or_else(|| GroundError::not_found("soil", reference))?;
        self.touch();
        Ok(removed)
    }

    /// Library as shared parameter sets, for building layers.
    pub fn soil_library(&self) -> HashMap<String, Arc<SoilParams>> {
        self.soils
            .iter()
            .map(|(reference, params)| (reference.clone(), Arc::new(params.clone())))
            .collect()
    }

    /// Shared handle to one library soil.
    pub fn shared_soil(&self, reference: &str) -> GroundResult<Arc<SoilParams>> {
        self.soils
            .get(reference)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| GroundError::not_found("soil", reference))
    }

    // ------------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------------

    /// Add a model, returning the UUID assigned to it.
    pub fn add_model(&mut self, model: GroundModel) -> Uuid {
        let id = Uuid::new_v4();
        self.models.insert(id, model);
        self.touch();
        id
    }

    /// Create an empty model using the project settings.
    pub fn new_model(&mut self, reference: impl Into<String>) -> GroundResult<Uuid> {
        let model = GroundModel::with_settings(reference, &self.settings)?;
        Ok(self.add_model(model))
    }

    pub fn remove_model(&mut self, id: &Uuid) -> Option<GroundModel> {
        let model = self.models.remove(id);
        if model.is_some() {
            self.touch();
        }
        model
    }

    pub fn model(&self, id: &Uuid) -> Option<&GroundModel> {
        self.models.get(id)
    }

    /// Mutable access marks the project as modified.
    pub fn model_mut(&mut self, id: &Uuid) -> Option<&mut GroundModel> {
        if self.models.contains_key(id) {
            self.meta.modified = Utc::now();
            self.models.get_mut(id)
        } else {
            None
        }
    }

    /// Find a model by reference (e.g. borehole name).
    pub fn find_model(&self, reference: &str) -> GroundResult<(Uuid, &GroundModel)> {
        self.models
            .iter()
            .find(|(_, model)| model.reference() == reference)
            .map(|(id, model)| (*id, model))
            .ok_or_else(|| GroundError::not_found("model", reference))
    }

    pub fn find_model_mut(&mut self, reference: &str) -> GroundResult<&mut GroundModel> {
        let (id, _) = self.find_model(reference)?;
        self.model_mut(&id)
            .ok_or_else(|| GroundError::not_found("model", reference))
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    /// Site name
    #[serde(default)]
    pub site: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Project-wide defaults, also loadable from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Gap policy for new models
    pub gap_policy: GapPolicy,

    /// Effective stress profile spacing (m)
    pub stress_step_m: f64,

    /// Unit weight of water (kN/m³)
    pub water_unit_weight_kn_m3: f64,

    /// What AGS conversion does with bad data rows
    pub ags_error_policy: AgsErrorPolicy,

    /// Pretty-print JSON output
    pub pretty_json: bool,
}

impl GlobalSettings {
    pub fn validate(&self) -> GroundResult<()> {
        if !self.stress_step_m.is_finite() || self.stress_step_m <= 0.0 {
            return Err(GroundError::invalid_parameter(
                "stress_step_m",
                self.stress_step_m.to_string(),
                "Profile step must be positive",
            ));
        }
        if !self.water_unit_weight_kn_m3.is_finite() || self.water_unit_weight_kn_m3 <= 0.0 {
            return Err(GroundError::invalid_parameter(
                "water_unit_weight_kn_m3",
                self.water_unit_weight_kn_m3.to_string(),
                "Water unit weight must be positive",
            ));
        }
        Ok(())
    }

    /// AGS conversion options implied by these settings
    pub fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions {
            error_policy: self.ags_error_policy,
            pretty: self.pretty_json,
        }
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            gap_policy: GapPolicy::Reject,
            stress_step_m: DEFAULT_STRESS_STEP_M,
            water_unit_weight_kn_m3: DEFAULT_WATER_UNIT_WEIGHT_KN_M3,
            ags_error_policy: AgsErrorPolicy::Abort,
            pretty_json: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::SoilParamsInput;

    fn clay() -> SoilParams {
        SoilParamsInput::cohesive("CLAY", 19.0).with_cu(50.0).build().unwrap()
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("John Doe", "25-001", "Riverside");
        assert_eq!(project.meta.engineer, "John Doe");
        assert_eq!(project.meta.job_id, "25-001");
        assert_eq!(project.meta.site, "Riverside");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings, GlobalSettings::default());
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Jane Engineer", "25-042", "Test Site");
        project.add_soil(clay());
        let id = project.new_model("BH1").unwrap();
        let soil = project.shared_soil("CLAY").unwrap();
        project.model_mut(&id).unwrap().add_layer(0.0, 3.0, soil).unwrap();

        let json = serde_json::to_string_pretty(&project).unwrap();
        assert!(json.contains("Jane Engineer"));
        assert!(json.contains("\"gap_policy\": \"reject\""));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.engineer, "Jane Engineer");
        assert_eq!(roundtrip.soils, project.soils);
        assert_eq!(roundtrip.model(&id), project.model(&id));
    }

    #[test]
    fn test_soil_library() {
        let mut project = Project::new("Engineer", "25-001", "Site");
        assert!(project.add_soil(clay()).is_none());
        assert!(project.add_soil(clay()).is_some());
        assert_eq!(project.soil_library().len(), 1);
        assert!(project.shared_soil("SAND").is_err());

        let id = project.new_model("BH1").unwrap();
        let soil = project.shared_soil("CLAY").unwrap();
        project.model_mut(&id).unwrap().add_layer(0.0, 1.0, soil).unwrap();
        assert!(project.remove_soil("CLAY").is_err());

        project.remove_model(&id);
        assert!(project.remove_soil("CLAY").is_ok());
        assert_eq!(project.remove_soil("CLAY").unwrap_err().error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_find_model() {
        let mut project = Project::new("Engineer", "25-001", "Site");
        let id = project.new_model("BH1").unwrap();
        project.new_model("BH2").unwrap();

        let (found, model) = project.find_model("BH1").unwrap();
        assert_eq!(found, id);
        assert_eq!(model.reference(), "BH1");
        assert!(project.find_model("BH9").is_err());

        project.find_model_mut("BH2").unwrap().set_groundwater_depth(Some(2.0)).unwrap();
        assert_eq!(project.find_model("BH2").unwrap().1.groundwater_depth_m(), Some(2.0));
        assert_eq!(project.model_count(), 2);
    }

    #[test]
    fn test_new_model_uses_settings() {
        let mut project = Project::new("Engineer", "25-001", "Site");
        project.settings.gap_policy = GapPolicy::Allow;
        project.settings.stress_step_m = 0.25;
        let id = project.new_model("BH1").unwrap();
        let model = project.model(&id).unwrap();
        assert_eq!(model.gap_policy(), GapPolicy::Allow);
        assert_eq!(model.stress_step_m(), 0.25);

        project.settings.stress_step_m = 0.0;
        assert!(project.new_model("BH2").is_err());
    }

    #[test]
    fn test_settings_partial_json() {
        let settings: GlobalSettings = serde_json::from_str(r#"{"ags_error_policy": "skip_and_report"}"#).unwrap();
        assert_eq!(settings.ags_error_policy, AgsErrorPolicy::SkipAndReport);
        assert_eq!(settings.stress_step_m, DEFAULT_STRESS_STEP_M);
        assert_eq!(settings.conversion_options().error_policy, AgsErrorPolicy::SkipAndReport);
    }
}
