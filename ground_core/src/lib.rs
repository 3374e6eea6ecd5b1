//! # ground_core - Geotechnical Ground Model Engine
//!
//! `ground_core` holds the data behind a site's ground model: validated soil
//! parameter sets, layered ground models with stress profiles, and AGS/AGSi
//! data conversion. All public types implement Serialize/Deserialize so the
//! library can be driven through JSON.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ground_core::{GroundModel, SoilParamsInput};
//!
//! let clay = Arc::new(SoilParamsInput::cohesive("CLAY", 19.0).with_cu(50.0).build().unwrap());
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
//!
//! ## Modules
//!
//! - [`soil`] - Soil parameters, partial factors, earth pressure, Hoek-Brown, field descriptions
//! - [`model`] - Layered ground model, stress profiles, strip logs
//! - [`ags`] - AGS3/AGS4 text codec and AGS-JSON conversion
//! - [`agsi`] - AGSi JSON import
//! - [`project`] - Project container, metadata and settings
//! - [`file_io`] - Project files with atomic saves and locking
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod ags;
pub mod agsi;
pub mod errors;
pub mod file_io;
pub mod model;
pub mod project;
pub mod soil;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use ags::{convert_agsi_to_json, convert_json_to_agsi, AgsDocument, AgsErrorPolicy};
pub use errors::{GroundError, GroundResult};
pub use file_io::{load_project, save_project, FileLock};
pub use model::{GapPolicy, GroundModel, Layer, LayerInput};
pub use project::{GlobalSettings, Project, ProjectMetadata};
pub use soil::{SoilBehaviour, SoilParams, SoilParamsInput};
