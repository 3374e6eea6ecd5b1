//! # Ground Models
//!
//! A [`GroundModel`] is a one-dimensional stack of soil layers below a
//! ground surface, with an optional groundwater table. Depths are metres
//! below the ground surface and increase downwards; levels are elevations
//! (`level = ground_level_m - depth`).
//!
//! Layers are kept sorted and never overlap. Under [`GapPolicy::Reject`]
//! (the default) they are also contiguous: a new layer must start at the
//! current base or end at the current top. Every mutation validates first
//! and changes nothing on error.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ground_core::model::GroundModel;
//! use ground_core::soil::SoilParamsInput;
//!
//! let clay = Arc::new(SoilParamsInput::cohesive("CLAY", 18.0).with_cu(40.0).build().unwrap());
//! let sand = Arc::new(SoilParamsInput::granular("SAND", 20.0).with_phi_prime(32.0).build().unwrap());
//!
//! let mut model = GroundModel::new("BH1");
//! model.add_layer(0.0, 2.0, clay).unwrap();
//! model.add_layer(2.0, 5.0, sand).unwrap();
//!
//! assert_eq!(model.parameter_at(1.0).unwrap().reference(), "CLAY");
//! assert_eq!(model.parameter_at(2.0).unwrap().reference(), "SAND");
//! assert!(model.parameter_at(5.1).is_err());
//! ```

pub mod stress;
pub mod strip_log;
pub mod strip_log_svg;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{GroundError, GroundResult};
use crate::project::GlobalSettings;
use crate::soil::SoilParams;

pub use stress::{StressProfile, StressSample, StressSamples, MAX_PROFILE_SAMPLES};
pub use strip_log::StripLogEntry;
pub use strip_log_svg::{StripLogColours, StripLogRenderOptions};

/// Depths closer than this are treated as the same boundary.
pub const DEPTH_TOLERANCE_M: f64 = 1e-9;

/// Unit weight of water used when nothing else is configured.
pub const DEFAULT_WATER_UNIT_WEIGHT_KN_M3: f64 = 10.0;

/// Default spacing of effective stress profile samples.
pub const DEFAULT_STRESS_STEP_M: f64 = 0.1;

/// Whether uncovered depth intervals between layers are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Layers must be depth-contiguous
    #[default]
    Reject,
    /// Layers may leave gaps; queries inside a gap are out of range
    Allow,
}

// ============================================================================
// Layers
// ============================================================================

/// A layer stored in a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub top_m: f64,
    pub bottom_m: f64,
    pub params: Arc<SoilParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geol_code: Option<String>,
}

impl Layer {
    pub fn thickness_m(&self) -> f64 {
        self.bottom_m - self.top_m
    }

    pub fn mid_depth_m(&self) -> f64 {
        0.5 * (self.top_m + self.bottom_m)
    }

    /// Code used for this layer in AGS `GEOL_GEOL`: the explicit code, or
    /// the soil reference.
    pub fn code(&self) -> &str {
        self.geol_code.as_deref().unwrap_or_else(|| self.params.reference())
    }
}

/// A layer to be added, with optional description and GEOL code.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInput {
    pub top_m: f64,
    pub bottom_m: f64,
    pub params: Arc<SoilParams>,
    pub description: Option<String>,
    pub geol_code: Option<String>,
}

impl LayerInput {
    pub fn new(top_m: f64, bottom_m: f64, params: Arc<SoilParams>) -> Self {
        LayerInput {
            top_m,
            bottom_m,
            params,
            description: None,
            geol_code: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_geol_code(mut self, geol_code: impl Into<String>) -> Self {
        self.geol_code = Some(geol_code.into());
        self
    }
}

// ============================================================================
// Ground model
// ============================================================================

/// Layered ground model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GroundModelRecord", into = "GroundModelRecord")]
pub struct GroundModel {
    reference: String,
    ground_level_m: f64,
    groundwater_depth_m: Option<f64>,
    water_unit_weight_kn_m3: f64,
    stress_step_m: f64,
    gap_policy: GapPolicy,
    layers: Vec<Layer>,
}

impl GroundModel {
    /// Empty model with ground level 0 and no groundwater.
    pub fn new(reference: impl Into<String>) -> Self {
        GroundModel {
            reference: reference.into(),
            ground_level_m: 0.0,
            groundwater_depth_m: None,
            water_unit_weight_kn_m3: DEFAULT_WATER_UNIT_WEIGHT_KN_M3,
            stress_step_m: DEFAULT_STRESS_STEP_M,
            gap_policy: GapPolicy::Reject,
            layers: Vec::new(),
        }
    }

    /// Empty model taking gap policy, stress step and water unit weight
    /// from project settings.
    pub fn with_settings(reference: impl Into<String>, settings: &GlobalSettings) -> GroundResult<Self> {
        settings.validate()?;
        let mut model = GroundModel::new(reference);
        model.gap_policy = settings.gap_policy;
        model.stress_step_m = settings.stress_step_m;
        model.water_unit_weight_kn_m3 = settings.water_unit_weight_kn_m3;
        Ok(model)
    }

    /// Single layer of `params` from the surface down to `thickness_m`.
    pub fn quick(
        reference: impl Into<String>,
        params: Arc<SoilParams>,
        thickness_m: f64,
        groundwater_depth_m: Option<f64>,
    ) -> GroundResult<Self> {
        let mut model = GroundModel::new(reference);
        model.set_groundwater_depth(groundwater_depth_m)?;
        model.add_layer(0.0, thickness_m, params)?;
        Ok(model)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn ground_level_m(&self) -> f64 {
        self.ground_level_m
    }

    pub fn groundwater_depth_m(&self) -> Option<f64> {
        self.groundwater_depth_m
    }

    pub fn water_unit_weight_kn_m3(&self) -> f64 {
        self.water_unit_weight_kn_m3
    }

    pub fn stress_step_m(&self) -> f64 {
        self.stress_step_m
    }

    pub fn gap_policy(&self) -> GapPolicy {
        self.gap_policy
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// `(top, bottom)` depths covered by the model, if it has layers
    pub fn extent(&self) -> Option<(f64, f64)> {
        match (self.layers.first(), self.layers.last()) {
            (Some(first), Some(last)) => Some((first.top_m, last.bottom_m)),
            _ => None,
        }
    }

    /// All distinct layer boundary depths, shallowest first
    pub fn boundaries(&self) -> Vec<f64> {
        let mut depths: Vec<f64> = Vec::with_capacity(self.layers.len() + 1);
        for layer in &self.layers {
            for depth in [layer.top_m, layer.bottom_m] {
                if depths.last().map_or(true, |last| (depth - last).abs() > DEPTH_TOLERANCE_M) {
                    depths.push(depth);
                }
            }
        }
        depths
    }

    /// Distinct parameter sets used by the layers (shared sets counted once)
    pub fn soils(&self) -> Vec<Arc<SoilParams>> {
        let mut soils: Vec<Arc<SoilParams>> = Vec::new();
        for layer in &self.layers {
            if !soils.iter().any(|s| Arc::ptr_eq(s, &layer.params)) {
                soils.push(Arc::clone(&layer.params));
            }
        }
        soils
    }

    /// First layer whose soil has the given reference
    pub fn soil_params(&self, reference: &str) -> Option<&SoilParams> {
        self.layers
            .iter()
            .map(|layer| layer.params.as_ref())
            .find(|params| params.reference() == reference)
    }

    pub fn level_at_depth(&self, depth_m: f64) -> f64 {
        self.ground_level_m - depth_m
    }

    pub fn depth_at_level(&self, level_m: f64) -> f64 {
        self.ground_level_m - level_m
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = reference.into();
    }

    pub fn set_ground_level(&mut self, ground_level_m: f64) -> GroundResult<()> {
        if !ground_level_m.is_finite() {
            return Err(GroundError::invalid_parameter(
                "ground_level_m",
                ground_level_m.to_string(),
                "Ground level must be a finite number",
            ));
        }
        self.ground_level_m = ground_level_m;
        Ok(())
    }

    /// Set or clear the groundwater table (depth below ground surface).
    pub fn set_groundwater_depth(&mut self, depth_m: Option<f64>) -> GroundResult<()> {
        if let Some(depth) = depth_m {
            check_depth("groundwater_depth_m", depth)?;
        }
        self.groundwater_depth_m = depth_m;
        Ok(())
    }

    pub fn set_water_unit_weight(&mut self, unit_weight_kn_m3: f64) -> GroundResult<()> {
        if !unit_weight_kn_m3.is_finite() || unit_weight_kn_m3 <= 0.0 {
            return Err(GroundError::invalid_parameter(
                "water_unit_weight_kn_m3",
                unit_weight_kn_m3.to_string(),
                "Water unit weight must be positive",
            ));
        }
        self.water_unit_weight_kn_m3 = unit_weight_kn_m3;
        Ok(())
    }

    pub fn set_stress_step(&mut self, step_m: f64) -> GroundResult<()> {
        check_step(step_m)?;
        self.stress_step_m = step_m;
        Ok(())
    }

    /// Change the gap policy. Switching to `Reject` fails while the model
    /// has gaps.
    pub fn set_gap_policy(&mut self, policy: GapPolicy) -> GroundResult<()> {
        if policy == GapPolicy::Reject {
            if let Some(pair) = self.layers.windows(2).find(|w| w[1].top_m - w[0].bottom_m > DEPTH_TOLERANCE_M) {
                return Err(GroundError::Gap {
                    top_m: pair[1].top_m,
                    bottom_m: pair[1].bottom_m,
                    gap_top_m: pair[0].bottom_m,
                    gap_bottom_m: pair[1].top_m,
                });
            }
        }
        self.gap_policy = policy;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Layer management
    // ------------------------------------------------------------------------

    /// Insert a layer covering `top_m..bottom_m`.
    ///
    /// Returns the index of the new layer.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for a negative or non-finite depth
    /// - `Order` if `bottom_m <= top_m`
    /// - `Overlap` if the interval overlaps an existing layer
    /// - `Gap` under [`GapPolicy::Reject`] if the layer would not touch the
    ///   current top or base
    pub fn add_layer(&mut self, top_m: f64, bottom_m: f64, params: Arc<SoilParams>) -> GroundResult<usize> {
        self.add_described_layer(LayerInput::new(top_m, bottom_m, params))
    }

    /// [`add_layer`](GroundModel::add_layer) with description and GEOL code.
    pub fn add_described_layer(&mut self, input: LayerInput) -> GroundResult<usize> {
        let LayerInput {
            mut top_m,
            mut bottom_m,
            params,
            description,
            geol_code,
        } = input;

        check_depth("top_m", top_m)?;
        check_depth("bottom_m", bottom_m)?;
        if bottom_m - top_m <= DEPTH_TOLERANCE_M {
            return Err(GroundError::Order { top_m, bottom_m });
        }

        let index = self.layers.partition_point(|layer| layer.top_m < top_m);

        if let Some(above) = index.checked_sub(1).map(|i| &self.layers[i]) {
            if above.bottom_m - top_m > DEPTH_TOLERANCE_M {
                return Err(overlap(top_m, bottom_m, above));
            }
            if (above.bottom_m - top_m).abs() <= DEPTH_TOLERANCE_M {
                top_m = above.bottom_m;
            }
        }
        if let Some(below) = self.layers.get(index) {
            if bottom_m - below.top_m > DEPTH_TOLERANCE_M {
                return Err(overlap(top_m, bottom_m, below));
            }
            if (below.top_m - bottom_m).abs() <= DEPTH_TOLERANCE_M {
                bottom_m = below.top_m;
            }
        }

        if self.gap_policy == GapPolicy::Reject {
            if let Some((model_top, model_base)) = self.extent() {
                let joins_base = top_m == model_base;
                let joins_top = bottom_m == model_top;
                if !joins_base && !joins_top {
                    let (gap_top_m, gap_bottom_m) = if top_m > model_base {
                        (model_base, top_m)
                    } else {
                        (bottom_m, model_top)
                    };
                    return Err(GroundError::Gap {
                        top_m,
                        bottom_m,
                        gap_top_m,
                        gap_bottom_m,
                    });
                }
            }
        }

        debug!(
            model = %self.reference,
            soil = params.reference(),
            top_m,
            bottom_m,
            index,
            "inserted layer"
        );
        self.layers.insert(
            index,
            Layer {
                top_m,
                bottom_m,
                params,
                description,
                geol_code,
            },
        );
        Ok(index)
    }

    /// Remove and return the layer at `index`.
    ///
    /// Under [`GapPolicy::Reject`] only the top or base layer can be removed.
    pub fn remove_layer(&mut self, index: usize) -> GroundResult<Layer> {
        let count = self.layers.len();
        let layer = self
            .layers
            .get(index)
            .ok_or_else(|| GroundError::not_found("layer", index.to_string()))?;
        if self.gap_policy == GapPolicy::Reject && index != 0 && index + 1 != count {
            return Err(GroundError::Gap {
                top_m: layer.top_m,
                bottom_m: layer.bottom_m,
                gap_top_m: layer.top_m,
                gap_bottom_m: layer.bottom_m,
            });
        }
        debug!(model = %self.reference, index, "removed layer");
        Ok(self.layers.remove(index))
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Layer containing `depth_m`.
    ///
    /// Layer tops are inclusive and bottoms exclusive, except that the base
    /// of the model (and the base of a layer above a gap) is inclusive.
    ///
    /// # Errors
    ///
    /// `OutOfRange` above the model top, below its base, inside a gap, or
    /// for a non-finite depth.
    pub fn layer_at(&self, depth_m: f64) -> GroundResult<&Layer> {
        if !depth_m.is_finite() {
            return Err(GroundError::out_of_range(depth_m, "depth is not a finite number"));
        }
        let (model_top, model_base) = self
            .extent()
            .ok_or_else(|| GroundError::out_of_range(depth_m, "model has no layers"))?;
        if depth_m < model_top - DEPTH_TOLERANCE_M {
            return Err(GroundError::out_of_range(
                depth_m,
                format!("above the model top at {} m", model_top),
            ));
        }
        if depth_m > model_base + DEPTH_TOLERANCE_M {
            return Err(GroundError::out_of_range(
                depth_m,
                format!("below the model base at {} m", model_base),
            ));
        }

        let candidate = self
            .layers
            .partition_point(|layer| layer.top_m <= depth_m)
            .saturating_sub(1);
        let layer = &self.layers[candidate];
        if depth_m <= layer.bottom_m + DEPTH_TOLERANCE_M {
            return Ok(layer);
        }

        let next_top = self.layers.get(candidate + 1).map_or(model_base, |next| next.top_m);
        Err(GroundError::out_of_range(
            depth_m,
            format!("inside a gap between {} m and {} m", layer.bottom_m, next_top),
        ))
    }

    /// Soil parameters at `depth_m`; see [`layer_at`](GroundModel::layer_at).
    pub fn parameter_at(&self, depth_m: f64) -> GroundResult<&SoilParams> {
        Ok(self.layer_at(depth_m)?.params.as_ref())
    }

    /// New model with everything above `depth_m` removed.
    ///
    /// Depths in the new model are still measured from the original ground
    /// surface; the layer cut by the excavation keeps its lower part.
    pub fn excavate(&self, depth_m: f64) -> GroundResult<GroundModel> {
        check_depth("depth_m", depth_m)?;
        let (_, model_base) = self
            .extent()
            .ok_or_else(|| GroundError::out_of_range(depth_m, "model has no layers"))?;
        if depth_m >= model_base - DEPTH_TOLERANCE_M {
            return Err(GroundError::out_of_range(
                depth_m,
                format!("excavation reaches the model base at {} m", model_base),
            ));
        }

        let layers = self
            .layers
            .iter()
            .filter(|layer| layer.bottom_m > depth_m + DEPTH_TOLERANCE_M)
            .map(|layer| {
                let mut layer = layer.clone();
                layer.top_m = layer.top_m.max(depth_m);
                layer
            })
            .collect();

        debug!(model = %self.reference, depth_m, "excavated model");
        Ok(GroundModel {
            layers,
            ..self.clone_settings()
        })
    }

    fn clone_settings(&self) -> GroundModel {
        GroundModel {
            reference: self.reference.clone(),
            ground_level_m: self.ground_level_m,
            groundwater_depth_m: self.groundwater_depth_m,
            water_unit_weight_kn_m3: self.water_unit_weight_kn_m3,
            stress_step_m: self.stress_step_m,
            gap_policy: self.gap_policy,
            layers: Vec::new(),
        }
    }
}

impl fmt::Display for GroundModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} layers", self.reference, self.layers.len())?;
        if let Some((top, base)) = self.extent() {
            write!(f, ", {}-{} m", top, base)?;
        }
        if let Some(water) = self.groundwater_depth_m {
            write!(f, ", water at {} m", water)?;
        }
        write!(f, ")")
    }
}

fn check_depth(field: &str, depth_m: f64) -> GroundResult<()> {
    if !depth_m.is_finite() || depth_m < 0.0 {
        return Err(GroundError::invalid_parameter(
            field,
            depth_m.to_string(),
            "Depth must be a non-negative finite number",
        ));
    }
    Ok(())
}

pub(crate) fn check_step(step_m: f64) -> GroundResult<()> {
    if !step_m.is_finite() || step_m <= 0.0 {
        return Err(GroundError::invalid_parameter(
            "stress_step_m",
            step_m.to_string(),
            "Profile step must be positive",
        ));
    }
    Ok(())
}

fn overlap(top_m: f64, bottom_m: f64, existing: &Layer) -> GroundError {
    GroundError::Overlap {
        top_m,
        bottom_m,
        existing_top_m: existing.top_m,
        existing_bottom_m: existing.bottom_m,
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// On-disk form of a model; loading replays every layer through
/// `add_described_layer` so a hand-edited file cannot break the invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroundModelRecord {
    reference: String,
    #[serde(default)]
    ground_level_m: f64,
    #[serde(default)]
    groundwater_depth_m: Option<f64>,
    #[serde(default = "default_water_unit_weight")]
    water_unit_weight_kn_m3: f64,
    #[serde(default = "default_stress_step")]
    stress_step_m: f64,
    #[serde(default)]
    gap_policy: GapPolicy,
    #[serde(default)]
    layers: Vec<Layer>,
}

fn default_water_unit_weight() -> f64 {
    DEFAULT_WATER_UNIT_WEIGHT_KN_M3
}

fn default_stress_step() -> f64 {
    DEFAULT_STRESS_STEP_M
}

impl TryFrom<GroundModelRecord> for GroundModel {
    type Error = GroundError;

    fn try_from(record: GroundModelRecord) -> Result<Self, Self::Error> {
        let mut model = GroundModel::new(record.reference);
        model.set_ground_level(record.ground_level_m)?;
        model.set_groundwater_depth(record.groundwater_depth_m)?;
        model.set_water_unit_weight(record.water_unit_weight_kn_m3)?;
        model.set_stress_step(record.stress_step_m)?;
        model.gap_policy = record.gap_policy;

        let mut layers = record.layers;
        layers.sort_by(|a, b| a.top_m.total_cmp(&b.top_m));
        for layer in layers {
            model.add_described_layer(LayerInput {
                top_m: layer.top_m,
                bottom_m: layer.bottom_m,
                params: layer.params,
                description: layer.description,
                geol_code: layer.geol_code,
            })?;
        }
        Ok(model)
    }
}

impl From<GroundModel> for GroundModelRecord {
    fn from(model: GroundModel) -> Self {
        GroundModelRecord {
            reference: model.reference,
            ground_level_m: model.ground_level_m,
            groundwater_depth_m: model.groundwater_depth_m,
            water_unit_weight_kn_m3: model.water_unit_weight_kn_m3,
            stress_step_m: model.stress_step_m,
            gap_policy: model.gap_policy,
            layers: model.layers,
        }
    }
}
