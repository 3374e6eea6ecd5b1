//! Strip logs and AGS `GEOL` export/import for ground models.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GroundModel, LayerInput};
use crate::ags::{AgsDataType, AgsDocument, AgsEdition, AgsGroup, AgsHeading, AgsValue};
use crate::errors::{GroundError, GroundResult};
use crate::model::StressSample;
use crate::soil::{SoilBehaviour, SoilParams};

/// One row of a strip log: a layer with levels, key parameters and the
/// stress state at its mid-depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripLogEntry {
    pub top_m: f64,
    pub bottom_m: f64,
    pub top_level_m: f64,
    pub bottom_level_m: f64,
    pub thickness_m: f64,
    pub soil: String,
    pub code: String,
    pub description: Option<String>,
    pub behaviour: SoilBehaviour,
    pub unit_weight_kn_m3: f64,
    pub phi_prime_deg: Option<f64>,
    pub c_prime_kpa: Option<f64>,
    pub cu_kpa: Option<f64>,
    /// Water table lies within this layer
    pub contains_water_table: bool,
    /// Whole layer is below the water table
    pub submerged: bool,
    pub mid_depth_stress: Option<StressSample>,
}

/// Column order of [`GroundModel::strip_log_csv`].
const CSV_COLUMNS: [&str; 19] = [
    "top_m",
    "bottom_m",
    "top_level_m",
    "bottom_level_m",
    "thickness_m",
    "soil",
    "code",
    "description",
    "behaviour",
    "unit_weight_kn_m3",
    "phi_prime_deg",
    "c_prime_kpa",
    "cu_kpa",
    "contains_water_table",
    "submerged",
    "mid_depth_m",
    "total_kpa",
    "pore_pressure_kpa",
    "effective_kpa",
];

/// Flat CSV row for a [`StripLogEntry`]; missing values are empty fields.
#[derive(Serialize)]
struct StripLogRecord<'a> {
    top_m: f64,
    bottom_m: f64,
    top_level_m: f64,
    bottom_level_m: f64,
    thickness_m: f64,
    soil: &'a str,
    code: &'a str,
    description: Option<&'a str>,
    behaviour: SoilBehaviour,
    unit_weight_kn_m3: f64,
    phi_prime_deg: Option<f64>,
    c_prime_kpa: Option<f64>,
    cu_kpa: Option<f64>,
    contains_water_table: bool,
    submerged: bool,
    mid_depth_m: Option<f64>,
    total_kpa: Option<f64>,
    pore_pressure_kpa: Option<f64>,
    effective_kpa: Option<f64>,
}

impl<'a> From<&'a StripLogEntry> for StripLogRecord<'a> {
    fn from(entry: &'a StripLogEntry) -> Self {
        let stress = entry.mid_depth_stress;
        StripLogRecord {
            top_m: entry.top_m,
            bottom_m: entry.bottom_m,
            top_level_m: entry.top_level_m,
            bottom_level_m: entry.bottom_level_m,
            thickness_m: entry.thickness_m,
            soil: &entry.soil,
            code: &entry.code,
            description: entry.description.as_deref(),
            behaviour: entry.behaviour,
            unit_weight_kn_m3: entry.unit_weight_kn_m3,
            phi_prime_deg: entry.phi_prime_deg,
            c_prime_kpa: entry.c_prime_kpa,
            cu_kpa: entry.cu_kpa,
            contains_water_table: entry.contains_water_table,
            submerged: entry.submerged,
            mid_depth_m: stress.map(|s| s.depth_m),
            total_kpa: stress.map(|s| s.total_kpa),
            pore_pressure_kpa: stress.map(|s| s.pore_pressure_kpa),
            effective_kpa: stress.map(|s| s.effective_kpa),
        }
    }
}

/// AGS `GEOL` headings written by [`GroundModel::to_ags_geol`].
const GEOL_HEADINGS: [(&str, &str, AgsDataType); 5] = [
    ("LOCA_ID", "", AgsDataType::Id),
    ("GEOL_TOP", "m", AgsDataType::DecimalPlaces(2)),
    ("GEOL_BASE", "m", AgsDataType::DecimalPlaces(2)),
    ("GEOL_DESC", "", AgsDataType::Text),
    ("GEOL_GEOL", "", AgsDataType::PickList),
];

impl GroundModel {
    /// One entry per layer, shallowest first.
    ///
    /// With `include_stresses` each entry carries the stresses at the layer
    /// mid-depth.
    pub fn strip_log(&self, include_stresses: bool) -> GroundResult<Vec<StripLogEntry>> {
        self.layers
            .iter()
            .map(|layer| -> GroundResult<StripLogEntry> {
                let params = layer.params.as_ref();
                let (contains_water_table, submerged) = match self.groundwater_depth_m {
                    Some(water) => (water >= layer.top_m && water < layer.bottom_m, water <= layer.top_m),
                    None => (false, false),
                };
                let mid_depth_stress = if include_stresses {
                    Some(self.vertical_stress_at(layer.mid_depth_m())?)
                } else {
                    None
                };
                Ok(StripLogEntry {
                    top_m: layer.top_m,
                    bottom_m: layer.bottom_m,
                    top_level_m: self.level_at_depth(layer.top_m),
                    bottom_level_m: self.level_at_depth(layer.bottom_m),
                    thickness_m: layer.thickness_m(),
                    soil: params.reference().to_string(),
                    code: layer.code().to_string(),
                    description: layer.description.clone(),
                    behaviour: params.behaviour(),
                    unit_weight_kn_m3: params.unit_weight_kn_m3(),
                    phi_prime_deg: params.phi_prime_deg(),
                    c_prime_kpa: params.c_prime_kpa(),
                    cu_kpa: params.cu_kpa(),
                    contains_water_table,
                    submerged,
                    mid_depth_stress,
                })
            })
            .collect()
    }

    /// Strip log as CSV text with a header row (written even for an empty
    /// model).
    pub fn strip_log_csv(&self, include_stresses: bool) -> GroundResult<String> {
        let entries = self.strip_log(include_stresses)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        writer.write_record(CSV_COLUMNS).map_err(GroundError::serialization)?;
        for entry in &entries {
            writer
                .serialize(StripLogRecord::from(entry))
                .map_err(GroundError::serialization)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| GroundError::serialization(e.error()))?;
        String::from_utf8(bytes).map_err(GroundError::serialization)
    }

    /// AGS document with a single `GEOL` group describing this model at
    /// location `hole_id`.
    pub fn to_ags_geol(&self, hole_id: &str) -> GroundResult<AgsDocument> {
        let headings = GEOL_HEADINGS
            .iter()
            .map(|(name, unit, data_type)| AgsHeading::new(*name, *unit, data_type.clone()))
            .collect();
        let mut geol = AgsGroup::new("GEOL", headings);
        for layer in &self.layers {
            geol.push_row(vec![
                AgsValue::from(hole_id),
                AgsValue::Number(layer.top_m),
                AgsValue::Number(layer.bottom_m),
                AgsValue::from(layer.description.clone()),
                AgsValue::from(layer.code()),
            ])?;
        }

        let mut document = AgsDocument::new(AgsEdition::Ags4);
        document.push_group(geol)?;
        Ok(document)
    }

    /// Build a model for `hole_id` from an AGS `GEOL` group.
    ///
    /// `GEOL_GEOL` codes are resolved against `soils`; layers sharing a code
    /// share one parameter set.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing group, heading or soil code; the layer
    /// errors of [`add_described_layer`](GroundModel::add_described_layer).
    pub fn from_ags_geol(
        document: &AgsDocument,
        hole_id: &str,
        soils: &HashMap<String, Arc<SoilParams>>,
    ) -> GroundResult<GroundModel> {
        let mut model = GroundModel::new(hole_id);
        model.load_ags_geol(document, hole_id, soils)?;
        Ok(model)
    }

    /// Add the `GEOL` layers of `hole_id` to this model, keeping its
    /// settings. Nothing is added if any row fails.
    pub fn load_ags_geol(
        &mut self,
        document: &AgsDocument,
        hole_id: &str,
        soils: &HashMap<String, Arc<SoilParams>>,
    ) -> GroundResult<usize> {
        let geol = document
            .group("GEOL")
            .ok_or_else(|| GroundError::not_found("AGS group", "GEOL"))?;
        let location = ["LOCA_ID", "HOLE_ID"]
            .into_iter()
            .find_map(|heading| geol.column(heading))
            .ok_or_else(|| GroundError::not_found("GEOL heading", "LOCA_ID"))?;
        let top = required_column(geol, "GEOL_TOP")?;
        let base = required_column(geol, "GEOL_BASE")?;
        let code = required_column(geol, "GEOL_GEOL")?;
        let description = geol.column("GEOL_DESC");

        let mut inputs = Vec::new();
        for (index, row) in geol.rows().iter().enumerate() {
            if row[location].as_str() != Some(hole_id) {
                continue;
            }
            let line = index + 1;
            let top_m = number(&row[top], "GEOL_TOP", line)?;
            let bottom_m = number(&row[base], "GEOL_BASE", line)?;
            let geol_code = text(&row[code]).ok_or_else(|| {
                GroundError::invalid_parameter("GEOL_GEOL", format!("row {}", line), "Layer has no geology code")
            })?;
            let params = soils
                .get(&geol_code)
                .ok_or_else(|| GroundError::not_found("soil", geol_code.clone()))?;

            let mut input = LayerInput::new(top_m, bottom_m, Arc::clone(params)).with_geol_code(geol_code);
            input.description = description.and_then(|column| text(&row[column]));
            inputs.push(input);
        }
        if inputs.is_empty() {
            return Err(GroundError::not_found("GEOL rows for location", hole_id));
        }
        inputs.sort_by(|a, b| a.top_m.total_cmp(&b.top_m));

        let mut updated = self.clone();
        for input in inputs.iter().cloned() {
            updated.add_described_layer(input)?;
        }
        *self = updated;
        debug!(model = %self.reference, hole_id, layers = inputs.len(), "loaded GEOL layers");
        Ok(inputs.len())
    }
}

fn required_column(group: &AgsGroup, heading: &str) -> GroundResult<usize> {
    group
        .column(heading)
        .ok_or_else(|| GroundError::not_found("GEOL heading", heading))
}

fn number(value: &AgsValue, heading: &str, line: usize) -> GroundResult<f64> {
    match value {
        AgsValue::Number(v) => Ok(*v),
        AgsValue::Text(s) => s.trim().parse().map_err(|_| {
            GroundError::invalid_parameter(heading, s.clone(), format!("row {} is not a depth", line))
        }),
        AgsValue::Null => Err(GroundError::invalid_parameter(
            heading,
            "",
            format!("row {} has no depth", line),
        )),
    }
}

fn text(value: &AgsValue) -> Option<String> {
    match value {
        AgsValue::Text(s) if !s.trim().is_empty() => Some(s.clone()),
        AgsValue::Number(v) => Some(v.to_string()),
        _ => None,
    }
}
