//! # AGS Data Interchange
//!
//! Reading and writing AGS 4 (and legacy AGS 3) ground investigation files,
//! and converting them to and from a JSON document keyed by group name.
//!
//! An AGS file is a sequence of groups. Each AGS 4 group is a `GROUP` line,
//! then `HEADING`, `UNIT` and `TYPE` lines, then any number of `DATA` rows,
//! terminated by a blank line or the next `GROUP`. Every field is quoted and
//! `""` escapes a quote.
//!
//! ## JSON shape
//!
//! ```json
//! {
//!   "GEOL": {
//!     "headings": ["LOCA_ID", "GEOL_TOP", "GEOL_BASE"],
//!     "units": ["", "m", "m"],
//!     "types": ["ID", "2DP", "2DP"],
//!     "rows": [{ "LOCA_ID": "BH1", "GEOL_TOP": 0.0, "GEOL_BASE": 1.5 }]
//!   }
//! }
//! ```
//!
//! Numeric columns (`nDP`, `nSF`, `nSCI`, `U`, `MC`) become JSON numbers,
//! empty fields become `null`, everything else stays a string.
//!
//! ## Example
//!
//! ```rust
//! use ground_core::ags::convert_agsi_to_json;
//!
//! let ags = "\"GROUP\",\"GEOL\"\n\
//!            \"HEADING\",\"LOCA_ID\",\"GEOL_TOP\"\n\
//!            \"UNIT\",\"\",\"m\"\n\
//!            \"TYPE\",\"ID\",\"2DP\"\n\
//!            \"DATA\",\"BH1\",\"1.50\"\n";
//! let json = convert_agsi_to_json(ags).unwrap();
//! assert!(json.contains("\"GEOL_TOP\": 1.5"));
//! ```

mod json;
mod lexer;
mod parser;
pub mod types;
mod writer;

use serde::{Deserialize, Serialize};

use crate::errors::{GroundError, GroundResult};

pub use parser::{parse_ags, parse_ags_with, ParsedAgs};
pub use types::{AgsDataType, AgsValue};

// ============================================================================
// Document model
// ============================================================================

/// AGS format edition a document was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgsEdition {
    Ags3,
    #[default]
    Ags4,
}

/// Column definition: name, unit and declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgsHeading {
    pub name: String,
    pub unit: String,
    pub data_type: AgsDataType,
}

impl AgsHeading {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, data_type: AgsDataType) -> Self {
        AgsHeading {
            name: name.into(),
            unit: unit.into(),
            data_type,
        }
    }
}

/// One AGS group with its typed rows.
///
/// Every row has exactly one value per heading.
#[derive(Debug, Clone, PartialEq)]
pub struct AgsGroup {
    name: String,
    headings: Vec<AgsHeading>,
    rows: Vec<Vec<AgsValue>>,
}

impl AgsGroup {
    pub fn new(name: impl Into<String>, headings: Vec<AgsHeading>) -> Self {
        AgsGroup {
            name: name.into(),
            headings,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headings(&self) -> &[AgsHeading] {
        &self.headings
    }

    pub fn rows(&self) -> &[Vec<AgsValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a heading by name
    pub fn column(&self, heading: &str) -> Option<usize> {
        self.headings.iter().position(|h| h.name == heading)
    }

    /// Value of `heading` in row `row`, if both exist
    pub fn value(&self, row: usize, heading: &str) -> Option<&AgsValue> {
        let column = self.column(heading)?;
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Append a row after checking its width and that numbers sit in
    /// numeric columns.
    pub fn push_row(&mut self, row: Vec<AgsValue>) -> GroundResult<()> {
        let line = self.rows.len() + 1;
        if row.len() != self.headings.len() {
            return Err(GroundError::malformed_group(
                &self.name,
                line,
                format!("row has {} values, expected {}", row.len(), self.headings.len()),
            ));
        }
        for (heading, value) in self.headings.iter().zip(&row) {
            if let AgsValue::Text(text) = value {
                if heading.data_type.is_numeric() {
                    return Err(GroundError::TypeMismatch {
                        group: self.name.clone(),
                        heading: heading.name.clone(),
                        line,
                        value: text.clone(),
                        data_type: heading.data_type.code(),
                    });
                }
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub(crate) fn push_row_unchecked(&mut self, row: Vec<AgsValue>) {
        self.rows.push(row);
    }

    pub(crate) fn last_row_mut(&mut self) -> Option<&mut Vec<AgsValue>> {
        self.rows.last_mut()
    }
}

/// A parsed AGS file: groups in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgsDocument {
    edition: AgsEdition,
    groups: Vec<AgsGroup>,
}

impl AgsDocument {
    pub fn new(edition: AgsEdition) -> Self {
        AgsDocument {
            edition,
            groups: Vec::new(),
        }
    }

    pub fn edition(&self) -> AgsEdition {
        self.edition
    }

    pub fn groups(&self) -> &[AgsGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&AgsGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Add a group; names must be unique within a document.
    pub fn push_group(&mut self, group: AgsGroup) -> GroundResult<()> {
        if self.group(&group.name).is_some() {
            return Err(GroundError::malformed_group(&group.name, 0, "duplicate group name"));
        }
        self.groups.push(group);
        Ok(())
    }

    /// Render as AGS 4 text.
    pub fn to_ags_string(&self) -> String {
        writer::write_document(self)
    }

    /// JSON object keyed by group name.
    pub fn to_json_value(&self) -> serde_json::Value {
        json::document_to_json(self)
    }

    pub fn to_json_string(&self, pretty: bool) -> GroundResult<String> {
        let value = self.to_json_value();
        let text = if pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        text.map_err(GroundError::serialization)
    }

    /// Rebuild a document from the JSON shape produced by [`to_json_value`].
    ///
    /// [`to_json_value`]: AgsDocument::to_json_value
    pub fn from_json_value(value: &serde_json::Value) -> GroundResult<Self> {
        json::document_from_json(value)
    }
}

// ============================================================================
// Conversion entry points
// ============================================================================

/// What to do with a bad data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgsErrorPolicy {
    /// Stop at the first error
    #[default]
    Abort,
    /// Drop the row, record the error and carry on. Header errors still abort.
    SkipAndReport,
}

/// Options for [`convert_agsi_to_json_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub error_policy: AgsErrorPolicy,
    pub pretty: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            error_policy: AgsErrorPolicy::Abort,
            pretty: true,
        }
    }
}

/// JSON text plus the rows skipped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub json: String,
    pub issues: Vec<GroundError>,
}

impl ConversionReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Convert AGS text to pretty-printed JSON, stopping at the first error.
pub fn convert_agsi_to_json(text: &str) -> GroundResult<String> {
    convert_agsi_to_json_with(text, &ConversionOptions::default()).map(|report| report.json)
}

/// Convert AGS text to JSON with an explicit error policy.
pub fn convert_agsi_to_json_with(text: &str, options: &ConversionOptions) -> GroundResult<ConversionReport> {
    let parsed = parse_ags_with(text, options.error_policy)?;
    let json = parsed.document.to_json_string(options.pretty)?;
    Ok(ConversionReport {
        json,
        issues: parsed.issues,
    })
}

/// Convert JSON (as produced by [`convert_agsi_to_json`]) back to AGS 4 text.
pub fn convert_json_to_agsi(json: &str) -> GroundResult<String> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(GroundError::serialization)?;
    let document = AgsDocument::from_json_value(&value)?;
    Ok(document.to_ags_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOL: &str = r#""GROUP","GEOL"
"HEADING","LOCA_ID","GEOL_TOP","GEOL_BASE","GEOL_DESC","GEOL_GEOL"
"UNIT","","m","m","",""
"TYPE","ID","2DP","2DP","X","PA"
"DATA","BH1","0.00","1.50","Firm brown CLAY","CLAY"
"DATA","BH1","1.50","4.00","Medium dense SAND","SAND"
"DATA","BH2","0.00","","Made ground, ""mixed""","MG"
"#;

    #[test]
    fn test_convert_to_json() {
        let json = convert_agsi_to_json(GEOL).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let geol = &value["GEOL"];
        assert_eq!(geol["headings"][1], "GEOL_TOP");
        assert_eq!(geol["units"][1], "m");
        assert_eq!(geol["types"][1], "2DP");
        assert_eq!(geol["rows"][1]["GEOL_BASE"], 4.0);
        assert_eq!(geol["rows"][2]["GEOL_BASE"], serde_json::Value::Null);
        assert_eq!(geol["rows"][2]["GEOL_DESC"], "Made ground, \"mixed\"");
    }

    #[test]
    fn test_round_trip_through_json() {
        let original = parse_ags(GEOL).unwrap();
        let json = original.to_json_string(false).unwrap();
        let ags = convert_json_to_agsi(&json).unwrap();
        let reparsed = parse_ags(&ags).unwrap();
        assert_eq!(reparsed, original);
        assert!(ags.contains("\"DATA\",\"BH1\",\"1.50\",\"4.00\""));
    }

    #[test]
    fn test_blank_text_survives_round_trip() {
        let text = "\"GROUP\",\"NOTE\"\n\"HEADING\",\"NOTE_ID\",\"NOTE_TEXT\"\n\
                    \"UNIT\",\"\",\"\"\n\"TYPE\",\"ID\",\"X\"\n\"DATA\",\"N1\",\"  \"\n";
        let json = convert_agsi_to_json(text).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["NOTE"]["rows"][0]["NOTE_TEXT"], "  ");

        let ags = convert_json_to_agsi(&json).unwrap();
        assert!(ags.contains("\"DATA\",\"N1\",\"  \""));
    }

    #[test]
    fn test_short_rows_abort() {
        let text = r#""GROUP","GEOL"
"HEADING","LOCA_ID","GEOL_TOP","GEOL_BASE","GEOL_DESC"
"UNIT","","m","m",""
"TYPE","ID","2DP","2DP","X"
"DATA","BH1","0.00","1.00","CLAY"
"DATA","BH1","1.00","2.00"
"DATA","BH1","2.00"
"#;
        let err = convert_agsi_to_json(text).unwrap_err();
        assert_eq!(err, GroundError::malformed_group("GEOL", 6, "DATA row has 3 fields, expected 4"));
    }

    #[test]
    fn test_all_rows_short_reports_first_data_line() {
        let text = r#""GROUP","GEOL"
"HEADING","LOCA_ID","GEOL_TOP","GEOL_BASE","GEOL_DESC"
"UNIT","","m","m",""
"TYPE","ID","2DP","2DP","X"
"DATA","BH1","0.00","1.00"
"DATA","BH1","1.00","2.00"
"DATA","BH1","2.00","3.00"
"#;
        let err = convert_agsi_to_json(text).unwrap_err();
        assert_eq!(err, GroundError::malformed_group("GEOL", 5, "DATA row has 3 fields, expected 4"));
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_skip_and_report() {
        let text = r#""GROUP","GEOL"
"HEADING","LOCA_ID","GEOL_TOP"
"UNIT","","m"
"TYPE","ID","2DP"
"DATA","BH1","0.00"
"DATA","BH1","deep"
"DATA","BH1"
"DATA","BH1","2.00"
"#;
        let options = ConversionOptions {
            error_policy: AgsErrorPolicy::SkipAndReport,
            pretty: false,
        };
        let report = convert_agsi_to_json_with(text, &options).unwrap();
        assert_eq!(report.issues.len(), 2);
        assert!(matches!(report.issues[0], GroundError::TypeMismatch { line: 6, .. }));
        assert!(matches!(report.issues[1], GroundError::MalformedGroup { line: 7, .. }));

        let value: serde_json::Value = serde_json::from_str(&report.json).unwrap();
        assert_eq!(value["GEOL"]["rows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_group_push_row_checks() {
        let mut group = AgsGroup::new(
            "GEOL",
            vec![
                AgsHeading::new("LOCA_ID", "", AgsDataType::Id),
                AgsHeading::new("GEOL_TOP", "m", AgsDataType::DecimalPlaces(2)),
            ],
        );
        assert!(group.push_row(vec!["BH1".into(), 1.0.into()]).is_ok());
        assert!(group.push_row(vec!["BH1".into()]).is_err());
        assert!(matches!(
            group.push_row(vec!["BH1".into(), "x".into()]),
            Err(GroundError::TypeMismatch { .. })
        ));
        assert_eq!(group.value(0, "GEOL_TOP"), Some(&AgsValue::Number(1.0)));
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let mut doc = AgsDocument::new(AgsEdition::Ags4);
        doc.push_group(AgsGroup::new("PROJ", vec![])).unwrap();
        assert!(doc.push_group(AgsGroup::new("PROJ", vec![])).is_err());
    }
}
