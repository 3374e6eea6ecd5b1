use super::to_csv;
use crate::cli::{ModelSelection, OutputFormat, ProfileArgs, QueryArgs, StripLogArgs};
use crate::error::{CliError, Result};
use ground_core::model::{StressSample, StripLogRenderOptions};
use ground_core::{load_project, GroundModel};
use serde_json::json;
use std::fmt::Write as _;

/// Load the project and run `f` on the selected model.
fn with_model<T>(selection: &ModelSelection, f: impl FnOnce(&GroundModel) -> Result<T>) -> Result<T> {
    let project = load_project(&selection.project)?;
    let (_, model) = project.find_model(&selection.model)?;
    f(model)
}

/// Layer, soil parameters and stresses at one depth, as JSON.
pub fn run_query(args: QueryArgs) -> Result<String> {
    with_model(&args.selection, |model| {
        let layer = model.layer_at(args.depth)?;
        let stress = model.vertical_stress_at(args.depth)?;
        let report = json!({
            "model": model.reference(),
            "depth_m": args.depth,
            "level_m": model.level_at_depth(args.depth),
            "layer": layer,
            "stress": stress,
        });
        Ok(serde_json::to_string_pretty(&report)?)
    })
}

pub fn run_profile(args: ProfileArgs) -> Result<String> {
    with_model(&args.selection, |model| {
        let step = args.step.unwrap_or_else(|| model.stress_step_m());
        let profile = model.effective_stress_profile_with_step(step)?;
        let samples: Vec<StressSample> = profile.iter().collect();

        match args.format {
            OutputFormat::Table => Ok(profile_table(&samples)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&samples)?),
            OutputFormat::Csv => to_csv(&samples),
            OutputFormat::Ags | OutputFormat::Svg => Err(CliError::Argument(format!(
                "{:?} output is only available for strip logs",
                args.format
            ))),
        }
    })
}

fn profile_table(samples: &[StressSample]) -> String {
    let mut table = format!(
        "{:>8} {:>10} {:>10} {:>10}\n",
        "z (m)", "σv (kPa)", "u (kPa)", "σ'v (kPa)"
    );
    for s in samples {
        let _ = writeln!(
            table,
            "{:>8.2} {:>10.1} {:>10.1} {:>10.1}",
            s.depth_m, s.total_kpa, s.pore_pressure_kpa, s.effective_kpa
        );
    }
    table
}

pub fn run_strip_log(args: StripLogArgs) -> Result<String> {
    with_model(&args.selection, |model| match args.format {
        OutputFormat::Csv => Ok(model.strip_log_csv(args.stresses)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&model.strip_log(args.stresses)?)?),
        OutputFormat::Ags => {
            let hole_id = args.hole_id.as_deref().unwrap_or(model.reference());
            Ok(model.to_ags_geol(hole_id)?.to_ags_string())
        }
        OutputFormat::Svg => {
            let options = StripLogRenderOptions {
                px_per_metre: args.px_per_metre,
                title: Some(args.title.clone().unwrap_or_else(|| model.reference().to_string())),
                ..Default::default()
            };
            Ok(model.strip_log_svg(&options)?)
        }
        OutputFormat::Table => {
            let mut table = format!("{}\n", model);
            for entry in model.strip_log(args.stresses)? {
                let _ = write!(
                    table,
                    "{:>7.2} - {:>7.2} m  {:<16} {:<9}",
                    entry.top_m,
                    entry.bottom_m,
                    entry.soil,
                    entry.behaviour.display_name()
                );
                if let Some(stress) = entry.mid_depth_stress {
                    let _ = write!(table, "  σ'v(mid) {:.1} kPa", stress.effective_kpa);
                }
                if entry.contains_water_table {
                    table.push_str("  water table");
                }
                table.push('\n');
            }
            Ok(table)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::project::init_for_test;
    use ground_core::{save_project, SoilParamsInput};
    use std::path::Path;
    use std::sync::Arc;

    fn project_with_model(path: &Path) {
        init_for_test(path);
        let mut project = load_project(path).unwrap();
        let clay = Arc::new(SoilParamsInput::cohesive("CLAY", 19.0).with_cu(50.0).build().unwrap());
        let sand = Arc::new(SoilParamsInput::granular("SAND", 20.0).with_phi_prime(32.0).build().unwrap());
        let mut model = GroundModel::new("BH1");
        model.add_layer(0.0, 2.0, clay).unwrap();
        model.add_layer(2.0, 5.0, sand).unwrap();
        model.set_groundwater_depth(Some(1.0)).unwrap();
        project.add_model(model);
        save_project(&project, path).unwrap();
    }

    fn selection(path: &Path) -> ModelSelection {
        ModelSelection {
            project: path.to_path_buf(),
            model: "BH1".to_string(),
        }
    }

    #[test]
    fn test_query_depth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.gmp");
        project_with_model(&path);

        let out = run_query(QueryArgs {
            selection: selection(&path),
            depth: 3.0,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["layer"]["params"]["reference"], "SAND");
        assert!((value["stress"]["total_kpa"].as_f64().unwrap() - 58.0).abs() < 1e-9);
        assert!((value["stress"]["pore_pressure_kpa"].as_f64().unwrap() - 20.0).abs() < 1e-9);

        let err = run_query(QueryArgs {
            selection: selection(&path),
            depth: 5.1,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Ground(ground_core::GroundError::OutOfRange { .. })));
    }

    #[test]
    fn test_profile_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.gmp");
        project_with_model(&path);

        let csv = run_profile(ProfileArgs {
            selection: selection(&path),
            step: Some(1.0),
            format: OutputFormat::Csv,
        })
        .unwrap();
        assert_eq!(csv.lines().count(), 7);
        assert_eq!(csv.lines().next().unwrap(), "depth_m,total_kpa,pore_pressure_kpa,effective_kpa");
        assert!(csv.lines().last().unwrap().starts_with("5.0,"));

        let err = run_profile(ProfileArgs {
            selection: selection(&path),
            step: Some(1e-300),
            format: OutputFormat::Csv,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Ground(ground_core::GroundError::InvalidParameter { .. })));
    }

    #[test]
    fn test_strip_log_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.gmp");
        project_with_model(&path);

        let args = |format| StripLogArgs {
            selection: selection(&path),
            stresses: true,
            format,
            hole_id: None,
            title: None,
            px_per_metre: None,
        };
        let ags = run_strip_log(args(OutputFormat::Ags)).unwrap();
        assert!(ags.contains("\"DATA\",\"BH1\",\"2.00\",\"5.00\""));

        let table = run_strip_log(args(OutputFormat::Table)).unwrap();
        assert!(table.contains("CLAY"));
        assert!(table.contains("water"));

        let svg = run_strip_log(args(OutputFormat::Svg)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">BH1<"));

        let err = run_profile(ProfileArgs {
            selection: selection(&path),
            step: None,
            format: OutputFormat::Svg,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn test_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.gmp");
        project_with_model(&path);
        let err = run_query(QueryArgs {
            selection: ModelSelection {
                project: path,
                model: "BH9".to_string(),
            },
            depth: 1.0,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Ground(ground_core::GroundError::NotFound { .. })));
    }
}
