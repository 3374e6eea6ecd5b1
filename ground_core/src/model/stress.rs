//! Vertical stresses in a ground model.
//!
//! Total stress is the integral of layer unit weight from the model top;
//! each layer contributes `γ · thickness` exactly, so results do not depend
//! on the sampling step. Pore pressure is hydrostatic below the water table.
//! Gaps (under `GapPolicy::Allow`) carry no weight.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use super::{check_step, GroundModel, DEPTH_TOLERANCE_M};
use crate::errors::{GroundError, GroundResult};
use crate::units::{KnPerM3, Kpa, Metres};

/// Most samples [`GroundModel::effective_stress_profile_with_step`] accepts.
pub const MAX_PROFILE_SAMPLES: usize = 1_000_000;

/// Stresses at one depth (kPa).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressSample {
    pub depth_m: f64,
    pub total_kpa: f64,
    pub pore_pressure_kpa: f64,
    pub effective_kpa: f64,
}

impl GroundModel {
    /// Hydrostatic pore pressure `γw · max(0, z − zw)`; zero with no water table.
    pub fn pore_pressure_at(&self, depth_m: f64) -> f64 {
        match self.groundwater_depth_m {
            Some(water_m) if depth_m > water_m => {
                (KnPerM3(self.water_unit_weight_kn_m3) * Metres(depth_m - water_m)).value()
            }
            _ => 0.0,
        }
    }

    /// Total, pore and effective vertical stress at `depth_m`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` when the depth is outside the model or inside a gap.
    pub fn vertical_stress_at(&self, depth_m: f64) -> GroundResult<StressSample> {
        self.layer_at(depth_m)?;
        let mut cursor = StressSamples::new(self, self.stress_step_m);
        let total = cursor.integrate_to(depth_m);
        Ok(self.sample(depth_m, total))
    }

    /// Lazy effective stress profile from the model top to its base at the
    /// model's `stress_step_m`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use ground_core::model::GroundModel;
    /// use ground_core::soil::SoilParamsInput;
    ///
    /// let sand = Arc::new(SoilParamsInput::granular("SAND", 20.0).build().unwrap());
    /// let model = GroundModel::quick("BH1", sand, 1.0, None).unwrap();
    ///
    /// let profile = model.effective_stress_profile();
    /// let last = profile.iter().last().unwrap();
    /// assert_eq!(last.depth_m, 1.0);
    /// assert!((last.effective_kpa - 20.0).abs() < 1e-9);
    /// assert_eq!(profile.iter().count(), 11);
    /// ```
    pub fn effective_stress_profile(&self) -> StressProfile<'_> {
        StressProfile {
            model: self,
            step_m: self.stress_step_m,
        }
    }

    /// Profile with an explicit sampling step.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` unless `step_m` is positive and finite, and
    /// when the step would yield more than [`MAX_PROFILE_SAMPLES`] samples
    /// over the model extent.
    pub fn effective_stress_profile_with_step(&self, step_m: f64) -> GroundResult<StressProfile<'_>> {
        check_step(step_m)?;
        if let Some((top_m, base_m)) = self.extent() {
            let samples = step_count(base_m - top_m, step_m).saturating_add(1);
            if samples > MAX_PROFILE_SAMPLES {
                return Err(GroundError::invalid_parameter(
                    "stress_step_m",
                    step_m.to_string(),
                    format!(
                        "Step gives more than {} samples over {} m",
                        MAX_PROFILE_SAMPLES,
                        base_m - top_m
                    ),
                ));
            }
        }
        Ok(StressProfile { model: self, step_m })
    }

    fn sample(&self, depth_m: f64, total: Kpa) -> StressSample {
        let pore_pressure_kpa = self.pore_pressure_at(depth_m);
        StressSample {
            depth_m,
            total_kpa: total.value(),
            pore_pressure_kpa,
            effective_kpa: total.value() - pore_pressure_kpa,
        }
    }
}

/// A restartable view of a model's stress profile.
#[derive(Debug, Clone, Copy)]
pub struct StressProfile<'a> {
    model: &'a GroundModel,
    step_m: f64,
}

impl<'a> StressProfile<'a> {
    pub fn step_m(&self) -> f64 {
        self.step_m
    }

    /// Number of samples the profile yields
    pub fn len(&self) -> usize {
        self.iter().len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    /// Fresh iterator from the model top.
    pub fn iter(&self) -> StressSamples<'a> {
        StressSamples::new(self.model, self.step_m)
    }
}

impl<'a> IntoIterator for StressProfile<'a> {
    type Item = StressSample;
    type IntoIter = StressSamples<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &StressProfile<'a> {
    type Item = StressSample;
    type IntoIter = StressSamples<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over profile samples.
///
/// Walks the layers once, carrying the running total stress forward.
#[derive(Debug, Clone)]
pub struct StressSamples<'a> {
    model: &'a GroundModel,
    step_m: f64,
    top_m: f64,
    base_m: f64,
    next_index: usize,
    steps: usize,
    layer_index: usize,
    integrated_to_m: f64,
    total: Kpa,
}

impl<'a> StressSamples<'a> {
    fn new(model: &'a GroundModel, step_m: f64) -> Self {
        let (top_m, base_m, steps, finished) = match model.extent() {
            Some((top, base)) => (top, base, step_count(base - top, step_m), 0),
            None => (0.0, 0.0, 0, 1),
        };
        StressSamples {
            model,
            step_m,
            top_m,
            base_m,
            next_index: finished,
            steps,
            layer_index: 0,
            integrated_to_m: top_m,
            total: Kpa(0.0),
        }
    }

    /// Advance the running integral to `depth_m` (never backwards).
    fn integrate_to(&mut self, depth_m: f64) -> Kpa {
        let layers = self.model.layers();
        while let Some(layer) = layers.get(self.layer_index) {
            if layer.top_m >= depth_m {
                break;
            }
            let from = self.integrated_to_m.max(layer.top_m);
            let to = depth_m.min(layer.bottom_m);
            if to > from {
                self.total = self.total + KnPerM3(layer.params.unit_weight_kn_m3()) * Metres(to - from);
            }
            if layer.bottom_m <= depth_m {
                self.layer_index += 1;
            } else {
                break;
            }
        }
        self.integrated_to_m = self.integrated_to_m.max(depth_m);
        self.total
    }

    fn remaining(&self) -> usize {
        self.steps.saturating_add(1).saturating_sub(self.next_index)
    }
}

/// Number of steps to cover `span` with the last one clamped to the base.
/// Saturates at `usize::MAX`.
fn step_count(span_m: f64, step_m: f64) -> usize {
    let steps = span_m / step_m;
    let rounded = steps.round();
    if (steps - rounded).abs() <= DEPTH_TOLERANCE_M * steps.max(1.0) {
        rounded as usize
    } else {
        steps.ceil() as usize
    }
}

impl Iterator for StressSamples<'_> {
    type Item = StressSample;

    fn next(&mut self) -> Option<StressSample> {
        if self.remaining() == 0 {
            return None;
        }
        let depth_m = if self.next_index >= self.steps {
            self.base_m
        } else {
            self.top_m + self.next_index as f64 * self.step_m
        };
        self.next_index += 1;
        let total = self.integrate_to(depth_m);
        Some(self.model.sample(depth_m, total))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StressSamples<'_> {}

impl FusedIterator for StressSamples<'_> {}
