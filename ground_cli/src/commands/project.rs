use super::{edit_project, read_input, user_id};
use crate::cli::{AddLayerArgs, AddSoilArgs, ImportAgsiArgs, InitArgs};
use crate::error::{CliError, Result};
use ground_core::agsi::soil_params_from_agsi;
use ground_core::file_io::{save_project, FileLock};
use ground_core::{GlobalSettings, GroundModel, LayerInput, Project, SoilParams, SoilParamsInput};
use tracing::{debug, info};

pub fn run_init(args: InitArgs, settings: GlobalSettings) -> Result<()> {
    if args.project.exists() && !args.force {
        return Err(CliError::Argument(format!(
            "'{}' already exists (use --force to overwrite)",
            args.project.display()
        )));
    }
    let mut project = Project::new(args.engineer, args.job_id, args.site);
    project.settings = settings;
    save_project(&project, &args.project)?;
    println!("Created project {}", args.project.display());
    Ok(())
}

pub fn run_add_soil(args: AddSoilArgs) -> Result<()> {
    let json = read_input(&args.input)?;
    let soils = parse_soils(&json).map_err(|source| CliError::Json {
        path: args.input.clone(),
        source,
    })?;

    let count = edit_project(&args.project, args.user.as_deref(), |project| {
        let mut count = 0;
        for input in soils {
            let params = SoilParams::new(input)?;
            debug!("Adding soil {}", params);
            project.add_soil(params);
            count += 1;
        }
        Ok(count)
    })?;
    println!("Added {} soil(s) to {}", count, args.project.display());
    Ok(())
}

/// One soil object or an array of them.
fn parse_soils(json: &str) -> std::result::Result<Vec<SoilParamsInput>, serde_json::Error> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<SoilParamsInput>),
        One(Box<SoilParamsInput>),
    }
    Ok(match serde_json::from_str(json)? {
        OneOrMany::Many(soils) => soils,
        OneOrMany::One(soil) => vec![*soil],
    })
}

pub fn run_add_layer(args: AddLayerArgs) -> Result<()> {
    let selection = args.selection;
    let index = edit_project(&selection.project, args.user.as_deref(), |project| {
        let soil = project.shared_soil(&args.soil)?;
        if project.find_model(&selection.model).is_err() {
            info!("Creating model {}", selection.model);
            project.new_model(selection.model.as_str())?;
        }
        let model = project.find_model_mut(&selection.model)?;

        let mut input = LayerInput::new(args.top, args.bottom, soil);
        if let Some(description) = args.description {
            input = input.with_description(description);
        }
        if let Some(code) = args.geol_code {
            input = input.with_geol_code(code);
        }
        let index = model.add_described_layer(input)?;
        if args.groundwater.is_some() {
            model.set_groundwater_depth(args.groundwater)?;
        }
        Ok(index)
    })?;
    println!(
        "Added layer {} ({}-{} m, {}) to {}",
        index + 1,
        args.top,
        args.bottom,
        args.soil,
        selection.model
    );
    Ok(())
}

pub fn run_import_agsi(args: ImportAgsiArgs, settings: &GlobalSettings) -> Result<()> {
    let json = read_input(&args.input)?;
    let soils = soil_params_from_agsi(&json)?;
    let model = if args.soils_only {
        None
    } else {
        Some(GroundModel::from_agsi(&json)?)
    };

    if !args.project.exists() {
        let _lock = FileLock::acquire(&args.project, user_id(args.user.as_deref()))?;
        let mut project = Project::default();
        project.settings = settings.clone();
        save_project(&project, &args.project)?;
        info!("Created project {}", args.project.display());
    }

    let (added, model_ref) = edit_project(&args.project, args.user.as_deref(), |project| {
        import_into(project, soils, model, args.replace)
    })?;
    println!("Imported {} soil(s) from {}", added, args.input.display());
    if let Some(reference) = model_ref {
        println!("Imported model {}", reference);
    }
    Ok(())
}

fn import_into(
    project: &mut Project,
    soils: Vec<SoilParams>,
    model: Option<GroundModel>,
    replace: bool,
) -> Result<(usize, Option<String>)> {
    for soil in &soils {
        if !replace && project.soil(soil.reference()).is_some_and(|existing| existing != soil) {
            return Err(CliError::Argument(format!(
                "Soil '{}' already exists with different parameters (use --replace)",
                soil.reference()
            )));
        }
    }
    let added = soils.len();
    for soil in soils {
        project.add_soil(soil);
    }

    let model_ref = match model {
        Some(model) if !model.is_empty() => {
            let reference = model.reference().to_string();
            if project.find_model(&reference).is_ok() {
                return Err(CliError::Argument(format!("Model '{}' already exists", reference)));
            }
            project.add_model(model);
            Some(reference)
        }
        _ => None,
    };
    Ok((added, model_ref))
}

/// Creates a project for tests.
#[cfg(test)]
pub(crate) fn init_for_test(path: &std::path::Path) {
    run_init(
        InitArgs {
            project: path.to_path_buf(),
            engineer: "Tester".to_string(),
            job_id: "T-1".to_string(),
            site: "Test Site".to_string(),
            force: false,
        },
        GlobalSettings::default(),
    )
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ModelSelection;
    use ground_core::load_project;
    use std::path::Path;

    const AGSI: &str = r#"{
        "agsiModel": [{
            "modelName": "Riverside",
            "agsiModelElement": [
                {
                    "elementName": "MADE GROUND",
                    "agsiGeometry": {"topElevation": 12.0, "bottomElevation": 11.0},
                    "agsiDataParameterValue": [{"codeID": "UnitWeight", "valueNumeric": 18.0}]
                },
                {
                    "elementName": "CLAY",
                    "agsiGeometry": {"topElevation": 11.0, "bottomElevation": 5.0},
                    "agsiDataParameterValue": [
                        {"codeID": "UnitWeight", "valueNumeric": 19.5},
                        {"codeID": "UndrainedShearStrength", "valueNumeric": 60.0}
                    ]
                }
            ]
        }]
    }"#;

    fn layer_args(project: &Path, top: f64, bottom: f64, soil: &str) -> AddLayerArgs {
        AddLayerArgs {
            selection: ModelSelection {
                project: project.to_path_buf(),
                model: "BH1".to_string(),
            },
            top,
            bottom,
            soil: soil.to_string(),
            description: None,
            geol_code: None,
            groundwater: None,
            user: Some("tester".to_string()),
        }
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.gmp");
        init_for_test(&path);
        let err = run_init(
            InitArgs {
                project: path,
                engineer: String::new(),
                job_id: String::new(),
                site: String::new(),
                force: false,
            },
            GlobalSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn test_add_soil_and_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.gmp");
        init_for_test(&path);

        let soils = dir.path().join("soils.json");
        std::fs::write(
            &soils,
            r#"[{"reference": "CLAY", "behaviour": "Cohesive", "unit_weight_kn_m3": 19.0, "cu_kpa": 50.0},
                {"reference": "SAND", "behaviour": "Granular", "unit_weight_kn_m3": 20.0, "phi_prime_deg": 32.0}]"#,
        )
        .unwrap();
        run_add_soil(AddSoilArgs {
            project: path.clone(),
            input: soils,
            user: None,
        })
        .unwrap();

        run_add_layer(layer_args(&path, 0.0, 2.0, "CLAY")).unwrap();
        run_add_layer(layer_args(&path, 2.0, 5.0, "SAND")).unwrap();
        assert!(run_add_layer(layer_args(&path, 4.0, 6.0, "SAND")).is_err());
        assert!(run_add_layer(layer_args(&path, 5.0, 6.0, "ROCK")).is_err());

        let project = load_project(&path).unwrap();
        let (_, model) = project.find_model("BH1").unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.parameter_at(4.0).unwrap().reference(), "SAND");
    }

    #[test]
    fn test_parse_single_soil() {
        let soils = parse_soils(r#"{"reference": "SAND", "unit_weight_kn_m3": 20.0}"#).unwrap();
        assert_eq!(soils.len(), 1);
        assert_eq!(soils[0].reference, "SAND");
    }

    #[test]
    fn test_import_agsi_creates_project() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.json");
        std::fs::write(&input, AGSI).unwrap();
        let path = dir.path().join("site.gmp");

        let args = |replace| ImportAgsiArgs {
            input: input.clone(),
            project: path.clone(),
            soils_only: false,
            replace,
            user: Some("tester".to_string()),
        };
        run_import_agsi(args(false), &GlobalSettings::default()).unwrap();

        let project = load_project(&path).unwrap();
        assert_eq!(project.soils.len(), 2);
        let (_, model) = project.find_model("Riverside").unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.ground_level_m(), 12.0);

        // Same model again is refused
        assert!(run_import_agsi(args(true), &GlobalSettings::default()).is_err());
    }
}
