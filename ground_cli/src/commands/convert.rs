use super::{emit, read_input};
use crate::cli::{ConvertArgs, ToAgsArgs};
use crate::error::Result;
use ground_core::ags::{convert_agsi_to_json_with, AgsErrorPolicy};
use ground_core::{convert_json_to_agsi, GlobalSettings};
use tracing::{info, warn};

/// AGS text to JSON. Returns the JSON when no output file is given.
pub fn run(args: ConvertArgs, settings: &GlobalSettings) -> Result<Option<String>> {
    let text = read_input(&args.input)?;

    let mut options = settings.conversion_options();
    if args.skip_bad_rows {
        options.error_policy = AgsErrorPolicy::SkipAndReport;
    }
    if args.compact {
        options.pretty = false;
    }

    let report = convert_agsi_to_json_with(&text, &options)?;
    for issue in &report.issues {
        warn!("Skipped row: {}", issue);
    }
    if !report.is_clean() {
        eprintln!("{} row(s) skipped in {}", report.issues.len(), args.input.display());
    }
    info!("Converted {}", args.input.display());

    emit(report.json, args.output.as_ref())
}

/// AGS JSON back to AGS4 text.
pub fn run_to_ags(args: ToAgsArgs) -> Result<Option<String>> {
    let json = read_input(&args.input)?;
    let ags = convert_json_to_agsi(&json)?;
    info!("Wrote AGS4 text from {}", args.input.display());
    emit(ags, args.output.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use ground_core::GroundError;
    use std::path::PathBuf;

    const GEOL: &str = "\"GROUP\",\"GEOL\"\r\n\
\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\",\"GEOL_BASE\",\"GEOL_GEOL\"\r\n\
\"UNIT\",\"\",\"m\",\"m\",\"\"\r\n\
\"TYPE\",\"ID\",\"2DP\",\"2DP\",\"PA\"\r\n\
\"DATA\",\"BH1\",\"0.00\",\"2.00\",\"CLAY\"\r\n\
\"DATA\",\"BH1\",\"2.00\"\r\n\
\"DATA\",\"BH1\",\"2.00\",\"5.00\",\"SAND\"\r\n";

    fn convert_args(input: PathBuf, skip_bad_rows: bool) -> ConvertArgs {
        ConvertArgs {
            input,
            output: None,
            skip_bad_rows,
            compact: true,
        }
    }

    #[test]
    fn test_convert_aborts_on_short_row() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("site.ags");
        std::fs::write(&input, GEOL).unwrap();

        let err = run(convert_args(input, false), &GlobalSettings::default()).unwrap_err();
        assert!(matches!(err, CliError::Ground(GroundError::MalformedGroup { .. })));
    }

    #[test]
    fn test_convert_skips_bad_rows_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("site.ags");
        std::fs::write(&input, GEOL).unwrap();

        let json = run(convert_args(input, true), &GlobalSettings::default()).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["GEOL"]["rows"].as_array().unwrap().len(), 2);

        let json_path = dir.path().join("site.json");
        std::fs::write(&json_path, &json).unwrap();
        let output = dir.path().join("out.ags");
        let written = run_to_ags(ToAgsArgs {
            input: json_path,
            output: Some(output.clone()),
        })
        .unwrap();
        assert!(written.is_none());
        let ags = std::fs::read_to_string(output).unwrap();
        assert!(ags.contains("\"DATA\",\"BH1\",\"2.00\",\"5.00\",\"SAND\""));
    }

    #[test]
    fn test_missing_input_is_argument_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(convert_args(dir.path().join("none.ags"), false), &GlobalSettings::default()).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }
}
