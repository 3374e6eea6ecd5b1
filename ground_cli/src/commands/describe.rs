use super::{edit_project, read_input};
use crate::cli::{DescribeArgs, DescriptionInput, SuggestParamsArgs};
use crate::error::{CliError, Result};
use ground_core::soil::description::{
    generate_description, parse_soil_description, validate_soil_description, SoilDescription, ValidationOptions,
};
use ground_core::SoilParams;
use serde_json::{json, Value};
use tracing::{debug, info};

/// `--text`, or the non-blank lines of the input file.
fn read_descriptions(source: &DescriptionInput) -> Result<Vec<String>> {
    let descriptions: Vec<String> = match (&source.text, &source.input) {
        (Some(text), _) => vec![text.trim().to_string()],
        (None, Some(path)) => read_input(path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        (None, None) => {
            return Err(CliError::Argument(
                "Give a description with --text or an input file".to_string(),
            ))
        }
    };
    if descriptions.iter().all(String::is_empty) {
        return Err(CliError::Argument("No descriptions to read".to_string()));
    }
    Ok(descriptions)
}

/// Parsed description, validation result and canonical text for each input.
pub fn run_describe(args: DescribeArgs) -> Result<String> {
    let options = ValidationOptions {
        strict: args.strict,
        require_strength_parameters: args.require_strength,
        require_primary_type: args.require_primary,
        check_correlations: !args.no_correlations,
    };

    let reports: Vec<Value> = read_descriptions(&args.source)?
        .into_iter()
        .map(|text| {
            let description = parse_soil_description(&text);
            let validation = validate_soil_description(&description, options);
            debug!("'{}': {} error(s)", text, validation.errors.len());
            json!({
                "input": text,
                "generated": generate_description(&description),
                "description": description,
                "validation": validation,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&reports)?)
}

fn default_reference(description: &SoilDescription) -> String {
    description
        .rock_type
        .map(|r| r.term())
        .or_else(|| description.primary_soil_type.map(|t| t.term()))
        .unwrap_or("soil")
        .to_uppercase()
}

pub fn run_suggest_params(args: SuggestParamsArgs) -> Result<String> {
    let texts = read_descriptions(&args.source)?;
    let numbered = texts.len() > 1;

    let mut soils: Vec<SoilParams> = Vec::with_capacity(texts.len());
    let mut reports: Vec<Value> = Vec::with_capacity(texts.len());
    for (index, text) in texts.iter().enumerate() {
        let description = parse_soil_description(text);
        let base = args.reference.clone().unwrap_or_else(|| default_reference(&description));
        let reference = if numbered {
            format!("{}-{}", base, index + 1)
        } else {
            base
        };

        let params = description.suggest_params(reference)?;
        reports.push(json!({
            "input": text,
            "description": generate_description(&description),
            "suggested_params": params,
            "inferred_ranges": description.strength,
        }));
        soils.push(params);
    }

    if let Some(project) = &args.add_to {
        let count = soils.len();
        edit_project(project, args.user.as_deref(), |project| {
            for soil in soils {
                project.add_soil(soil);
            }
            Ok(())
        })?;
        info!("Added {} suggested soil(s) to {}", count, project.display());
    }
    Ok(serde_json::to_string_pretty(&reports)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::project::init_for_test;
    use ground_core::{load_project, SoilBehaviour};
    use std::path::PathBuf;

    fn text(description: &str) -> DescriptionInput {
        DescriptionInput {
            text: Some(description.to_string()),
            input: None,
        }
    }

    fn describe(source: DescriptionInput, strict: bool) -> Result<Value> {
        let out = run_describe(DescribeArgs {
            source,
            strict,
            require_strength: false,
            require_primary: false,
            no_correlations: false,
        })?;
        Ok(serde_json::from_str(&out).unwrap())
    }

    #[test]
    fn test_describe_text() {
        let report = describe(text("firm brown clay, moist"), false).unwrap();
        assert_eq!(report[0]["generated"], "Firm brown moist CLAY");
        assert_eq!(report[0]["description"]["consistency"], "firm");
        assert_eq!(report[0]["validation"]["is_valid"], true);

        let report = describe(text("Firm dense clay"), false).unwrap();
        assert_eq!(report[0]["validation"]["is_valid"], false);
        assert_eq!(report[0]["validation"]["errors"][0]["code"], "COHESIVE_WITH_DENSITY");

        let report = describe(text("brown CLAY"), true).unwrap();
        assert_eq!(report[0]["validation"]["errors"][0]["code"], "STRICT_WARNING");
    }

    #[test]
    fn test_describe_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.txt");
        std::fs::write(&path, "Stiff CLAY\n\n  \nDense SAND\n").unwrap();

        let report = describe(
            DescriptionInput {
                text: None,
                input: Some(path),
            },
            false,
        )
        .unwrap();
        assert_eq!(report.as_array().unwrap().len(), 2);
        assert_eq!(report[1]["input"], "Dense SAND");
    }

    #[test]
    fn test_describe_needs_input() {
        let none = DescriptionInput { text: None, input: None };
        assert!(matches!(describe(none, false), Err(CliError::Argument(_))));
        assert!(matches!(describe(text("   "), false), Err(CliError::Argument(_))));

        let missing = DescriptionInput {
            text: None,
            input: Some(PathBuf::from("/nonexistent/logs.txt")),
        };
        assert!(matches!(describe(missing, false), Err(CliError::Argument(_))));
    }

    #[test]
    fn test_suggest_params_adds_to_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.txt");
        std::fs::write(&path, "Stiff brown CLAY\nMedium dense SAND\n").unwrap();
        let project = dir.path().join("site.gmp");
        init_for_test(&project);

        let out = run_suggest_params(SuggestParamsArgs {
            source: DescriptionInput {
                text: None,
                input: Some(path),
            },
            reference: None,
            add_to: Some(project.clone()),
            user: Some("tester".to_string()),
        })
        .unwrap();
        let report: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report[0]["inferred_ranges"]["range"]["typical"], 75.0);

        let loaded = load_project(&project).unwrap();
        let clay = loaded.soil("CLAY-1").unwrap();
        assert_eq!(clay.cu_kpa(), Some(75.0));
        assert_eq!(loaded.soil("SAND-2").unwrap().behaviour(), SoilBehaviour::Granular);
    }

    #[test]
    fn test_suggest_params_without_type_fails() {
        let err = run_suggest_params(SuggestParamsArgs {
            source: text("brown, moist"),
            reference: Some("X".to_string()),
            add_to: None,
            user: None,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Ground(ground_core::GroundError::InvalidParameter { .. })));
    }
}
