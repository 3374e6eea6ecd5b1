//! Line-driven AGS reader.
//!
//! The reader walks the file once, keeping one group open at a time:
//!
//! ```text
//! SeekGroup -> ReadHeading -> ReadUnits -> ReadTypes -> ReadData -> (SeekGroup | Done)
//! ```
//!
//! AGS 4 header lines must appear in exactly that order. AGS 3 groups
//! (`"**NAME"`) have `*`-prefixed headings, an optional `<UNITS>` line, no
//! TYPE line, unprefixed data rows and `<CONT>` continuation rows.

use tracing::{debug, trace, warn};

use super::lexer::split_fields;
use super::types::{AgsDataType, AgsValue};
use super::{AgsDocument, AgsEdition, AgsErrorPolicy, AgsGroup, AgsHeading};
use crate::errors::{GroundError, GroundResult};

/// A parsed document and the data rows dropped under
/// [`AgsErrorPolicy::SkipAndReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAgs {
    pub document: AgsDocument,
    pub issues: Vec<GroundError>,
}

/// Parse AGS text, failing on the first error.
pub fn parse_ags(text: &str) -> GroundResult<AgsDocument> {
    parse_ags_with(text, AgsErrorPolicy::Abort).map(|parsed| parsed.document)
}

/// Parse AGS text with an explicit policy for bad data rows.
///
/// # Errors
///
/// `MalformedGroup` for structural problems (always fatal for headers) and
/// `TypeMismatch` for fields that do not parse as their declared type.
pub fn parse_ags_with(text: &str, policy: AgsErrorPolicy) -> GroundResult<ParsedAgs> {
    let mut parser = Parser::new(policy);
    for (index, line) in text.lines().enumerate() {
        let line = if index == 0 { line.trim_start_matches('\u{feff}') } else { line };
        parser.feed(index + 1, line)?;
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekGroup,
    ReadHeading,
    ReadUnits,
    ReadTypes,
    ReadData,
    Done,
}

#[derive(Debug, Default)]
struct Header {
    name: String,
    edition: AgsEdition,
    headings: Vec<String>,
    units: Vec<String>,
    types: Vec<AgsDataType>,
}

struct Parser {
    policy: AgsErrorPolicy,
    state: State,
    header: Header,
    group: Option<AgsGroup>,
    document: Option<AgsDocument>,
    issues: Vec<GroundError>,
    last_line: usize,
}

impl Parser {
    fn new(policy: AgsErrorPolicy) -> Self {
        Parser {
            policy,
            state: State::SeekGroup,
            header: Header::default(),
            group: None,
            document: None,
            issues: Vec::new(),
            last_line: 0,
        }
    }

    fn feed(&mut self, line_no: usize, line: &str) -> GroundResult<()> {
        self.last_line = line_no;

        if line.trim().is_empty() {
            match self.state {
                State::ReadData => self.close_group(),
                State::ReadUnits if self.header.edition == AgsEdition::Ags3 => {
                    self.complete_header();
                    self.close_group()
                }
                _ => Ok(()),
            }?;
            return Ok(());
        }

        let fields = match split_fields(line) {
            Ok(fields) => fields,
            Err(reason) => {
                let err = GroundError::malformed_group(&self.header.name, line_no, reason);
                return if self.state == State::ReadData {
                    self.row_error(err)
                } else {
                    Err(err)
                };
            }
        };
        trace!(line = line_no, fields = fields.len(), state = ?self.state, "AGS line");

        match self.state {
            State::SeekGroup | State::ReadData => self.group_or_data(line_no, fields),
            State::ReadHeading => self.heading_line(line_no, fields),
            State::ReadUnits => self.unit_line(line_no, fields),
            State::ReadTypes => self.type_line(line_no, fields),
            State::Done => Ok(()),
        }
    }

    fn finish(mut self) -> GroundResult<ParsedAgs> {
        match self.state {
            State::SeekGroup | State::Done => {}
            State::ReadData => self.close_group()?,
            State::ReadUnits if self.header.edition == AgsEdition::Ags3 => {
                self.complete_header();
                self.close_group()?;
            }
            State::ReadHeading | State::ReadUnits | State::ReadTypes => {
                return Err(GroundError::malformed_group(
                    &self.header.name,
                    self.last_line,
                    "input ended before the group header was complete",
                ));
            }
        }
        self.state = State::Done;

        let document = self.document.unwrap_or_default();
        debug!(
            groups = document.groups().len(),
            skipped = self.issues.len(),
            "parsed AGS document"
        );
        Ok(ParsedAgs {
            document,
            issues: self.issues,
        })
    }

    // ------------------------------------------------------------------------
    // Group boundaries
    // ------------------------------------------------------------------------

    fn group_or_data(&mut self, line_no: usize, fields: Vec<String>) -> GroundResult<()> {
        let descriptor = fields[0].as_str();
        if descriptor == "GROUP" {
            self.close_group()?;
            let name = fields.get(1).map(|s| s.trim().to_string()).unwrap_or_default();
            return self.open_group(line_no, name, AgsEdition::Ags4);
        }
        if let Some(name) = descriptor.strip_prefix("**") {
            self.close_group()?;
            return self.open_group(line_no, name.trim().to_string(), AgsEdition::Ags3);
        }
        if self.state == State::ReadData {
            return self.data_line(line_no, fields);
        }
        Err(GroundError::malformed_group(
            "",
            line_no,
            format!("'{}' line outside a group", descriptor),
        ))
    }

    fn open_group(&mut self, line_no: usize, name: String, edition: AgsEdition) -> GroundResult<()> {
        if name.is_empty() {
            return Err(GroundError::malformed_group("", line_no, "GROUP line has no group name"));
        }
        let document = self.document.get_or_insert_with(|| AgsDocument::new(edition));
        if document.group(&name).is_some() {
            return Err(GroundError::malformed_group(name, line_no, "duplicate group"));
        }
        trace!(group = %name, line = line_no, "opening AGS group");
        self.header = Header {
            name,
            edition,
            ..Header::default()
        };
        self.state = State::ReadHeading;
        Ok(())
    }

    fn close_group(&mut self) -> GroundResult<()> {
        if let Some(group) = self.group.take() {
            debug!(group = group.name(), rows = group.row_count(), "closed AGS group");
            let document = self.document.get_or_insert_with(|| AgsDocument::new(self.header.edition));
            document.push_group(group)?;
        }
        self.state = State::SeekGroup;
        Ok(())
    }

    /// Turn the collected header into an open group ready for rows.
    fn complete_header(&mut self) {
        let width = self.header.headings.len();
        self.header.units.resize(width, String::new());
        self.header.types.resize(width, AgsDataType::Inferred);

        let headings = self
            .header
            .headings
            .iter()
            .zip(&self.header.units)
            .zip(&self.header.types)
            .map(|((name, unit), data_type)| AgsHeading::new(name.clone(), unit.clone(), data_type.clone()))
            .collect();
        self.group = Some(AgsGroup::new(self.header.name.clone(), headings));
        self.state = State::ReadData;
    }

    // ------------------------------------------------------------------------
    // Header lines
    // ------------------------------------------------------------------------

    fn heading_line(&mut self, line_no: usize, fields: Vec<String>) -> GroundResult<()> {
        let headings = match self.header.edition {
            AgsEdition::Ags4 => {
                if fields[0] != "HEADING" {
                    return Err(self.out_of_order(line_no, "HEADING", &fields[0]));
                }
                fields[1..].to_vec()
            }
            AgsEdition::Ags3 => {
                if !fields[0].starts_with('*') {
                    return Err(self.out_of_order(line_no, "*HEADING", &fields[0]));
                }
                ags3_headings(line_no, &self.header.name, fields)?
            }
        };
        if headings.is_empty() {
            return Err(GroundError::malformed_group(&self.header.name, line_no, "HEADING line has no headings"));
        }
        self.push_headings(line_no, headings)?;
        self.state = State::ReadUnits;
        Ok(())
    }

    fn unit_line(&mut self, line_no: usize, fields: Vec<String>) -> GroundResult<()> {
        let expected = self.header.headings.len();
        match self.header.edition {
            AgsEdition::Ags4 => {
                if fields[0] != "UNIT" {
                    return Err(self.out_of_order(line_no, "UNIT", &fields[0]));
                }
                self.check_width(line_no, "UNIT", fields.len() - 1, expected)?;
                self.header.units = fields[1..].to_vec();
                self.state = State::ReadTypes;
                Ok(())
            }
            AgsEdition::Ags3 => {
                let descriptor = fields[0].as_str();
                if descriptor.starts_with('*') && !descriptor.starts_with("**") {
                    let more = ags3_headings(line_no, &self.header.name, fields)?;
                    return self.push_headings(line_no, more);
                }
                if descriptor == "<UNITS>" {
                    let fields = trim_trailing_empty(fields, expected);
                    self.check_width(line_no, "<UNITS>", fields.len(), expected)?;
                    let mut units = fields;
                    units[0].clear();
                    self.header.units = units;
                    self.complete_header();
                    return Ok(());
                }
                // no <UNITS> line: this is already data
                self.complete_header();
                self.group_or_data(line_no, fields)
            }
        }
    }

    fn type_line(&mut self, line_no: usize, fields: Vec<String>) -> GroundResult<()> {
        if fields[0] != "TYPE" {
            return Err(self.out_of_order(line_no, "TYPE", &fields[0]));
        }
        self.check_width(line_no, "TYPE", fields.len() - 1, self.header.headings.len())?;
        self.header.types = fields[1..]
            .iter()
            .map(|code| code.parse().unwrap_or(AgsDataType::Inferred))
            .collect();
        self.complete_header();
        Ok(())
    }

    fn push_headings(&mut self, line_no: usize, headings: Vec<String>) -> GroundResult<()> {
        for heading in headings {
            if heading.is_empty() {
                return Err(GroundError::malformed_group(&self.header.name, line_no, "empty heading name"));
            }
            if self.header.headings.contains(&heading) {
                return Err(GroundError::malformed_group(
                    &self.header.name,
                    line_no,
                    format!("duplicate heading '{}'", heading),
                ));
            }
            self.header.headings.push(heading);
        }
        Ok(())
    }

    fn check_width(&self, line_no: usize, what: &str, found: usize, expected: usize) -> GroundResult<()> {
        if found != expected {
            return Err(GroundError::malformed_group(
                &self.header.name,
                line_no,
                format!("{} line has {} fields, expected {}", what, found, expected),
            ));
        }
        Ok(())
    }

    fn out_of_order(&self, line_no: usize, expected: &str, found: &str) -> GroundError {
        GroundError::malformed_group(
            &self.header.name,
            line_no,
            format!("expected {} line, found '{}'", expected, found),
        )
    }

    // ------------------------------------------------------------------------
    // Data rows
    // ------------------------------------------------------------------------

    fn data_line(&mut self, line_no: usize, fields: Vec<String>) -> GroundResult<()> {
        let expected = self.header.headings.len();
        let raw = match self.header.edition {
            AgsEdition::Ags4 => {
                if fields[0] != "DATA" {
                    return Err(GroundError::malformed_group(
                        &self.header.name,
                        line_no,
                        format!("unexpected '{}' line in data block", fields[0]),
                    ));
                }
                fields[1..].to_vec()
            }
            AgsEdition::Ags3 => {
                let fields = trim_trailing_empty(fields, expected);
                if fields[0] == "<CONT>" {
                    return self.continuation_line(line_no, fields);
                }
                fields
            }
        };

        if raw.len() != expected {
            let err = GroundError::malformed_group(
                &self.header.name,
                line_no,
                format!("DATA row has {} fields, expected {}", raw.len(), expected),
            );
            return self.row_error(err);
        }

        let mut row = Vec::with_capacity(expected);
        for (index, text) in raw.iter().enumerate() {
            match self.header.types[index].parse_value(text) {
                Some(value) => row.push(value),
                None => {
                    let err = self.type_mismatch(line_no, index, text);
                    return self.row_error(err);
                }
            }
        }

        if let Some(group) = self.group.as_mut() {
            group.push_row_unchecked(row);
        }
        Ok(())
    }

    /// AGS 3 `<CONT>` row: append non-empty fields to the previous row.
    fn continuation_line(&mut self, line_no: usize, fields: Vec<String>) -> GroundResult<()> {
        let expected = self.header.headings.len();
        if fields.len() != expected {
            let err = GroundError::malformed_group(
                &self.header.name,
                line_no,
                format!("<CONT> row has {} fields, expected {}", fields.len(), expected),
            );
            return self.row_error(err);
        }

        if self.group.as_ref().map_or(true, |g| g.row_count() == 0) {
            let err = GroundError::malformed_group(&self.header.name, line_no, "<CONT> row with no row to continue");
            return self.row_error(err);
        }

        let types = &self.header.types;
        if let Some(previous) = self.group.as_mut().and_then(|g| g.last_row_mut()) {
            for (index, text) in fields.iter().enumerate().skip(1) {
                if text.is_empty() {
                    continue;
                }
                let joined = format!("{}{}", types[index].format_value(&previous[index]), text);
                previous[index] = types[index].parse_value(&joined).unwrap_or(AgsValue::Text(joined));
            }
        }
        Ok(())
    }

    fn type_mismatch(&self, line_no: usize, column: usize, text: &str) -> GroundError {
        GroundError::TypeMismatch {
            group: self.header.name.clone(),
            heading: self.header.headings[column].clone(),
            line: line_no,
            value: text.to_string(),
            data_type: self.header.types[column].code(),
        }
    }

    fn row_error(&mut self, err: GroundError) -> GroundResult<()> {
        match self.policy {
            AgsErrorPolicy::Abort => Err(err),
            AgsErrorPolicy::SkipAndReport => {
                warn!(error = %err, "skipping AGS data row");
                self.issues.push(err);
                Ok(())
            }
        }
    }
}

/// Strip the `*` from AGS 3 heading fields, dropping the empty field left
/// by a trailing comma on wrapped heading lines.
fn ags3_headings(line_no: usize, group: &str, mut fields: Vec<String>) -> GroundResult<Vec<String>> {
    if fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
        .into_iter()
        .map(|field| match field.strip_prefix('*') {
            Some(name) if !name.starts_with('*') => Ok(name.trim().to_string()),
            _ => Err(GroundError::malformed_group(
                group,
                line_no,
                format!("'{}' is not an AGS3 heading", field),
            )),
        })
        .collect()
}

fn trim_trailing_empty(mut fields: Vec<String>, expected: usize) -> Vec<String> {
    if fields.len() == expected + 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_groups() {
        let text = "\"GROUP\",\"PROJ\"\n\
                    \"HEADING\",\"PROJ_ID\",\"PROJ_NAME\"\n\
                    \"UNIT\",\"\",\"\"\n\
                    \"TYPE\",\"ID\",\"X\"\n\
                    \"DATA\",\"P001\",\"Bypass\"\n\
                    \n\
                    \"GROUP\",\"LOCA\"\n\
                    \"HEADING\",\"LOCA_ID\",\"LOCA_FDEP\"\n\
                    \"UNIT\",\"\",\"m\"\n\
                    \"TYPE\",\"ID\",\"2DP\"\n\
                    \"DATA\",\"BH1\",\"15.00\"\n";
        let doc = parse_ags(text).unwrap();
        assert_eq!(doc.edition(), AgsEdition::Ags4);
        assert_eq!(doc.groups().len(), 2);
        assert_eq!(doc.groups()[0].name(), "PROJ");
        let loca = doc.group("LOCA").unwrap();
        assert_eq!(loca.headings()[1].unit, "m");
        assert_eq!(loca.value(0, "LOCA_FDEP"), Some(&AgsValue::Number(15.0)));
    }

    #[test]
    fn test_group_without_blank_separator() {
        let text = "\"GROUP\",\"A\"\n\"HEADING\",\"X\"\n\"UNIT\",\"\"\n\"TYPE\",\"X\"\n\
                    \"GROUP\",\"B\"\n\"HEADING\",\"Y\"\n\"UNIT\",\"\"\n\"TYPE\",\"X\"\n\"DATA\",\"y\"\n";
        let doc = parse_ags(text).unwrap();
        assert_eq!(doc.group("A").unwrap().row_count(), 0);
        assert_eq!(doc.group("B").unwrap().row_count(), 1);
    }

    #[test]
    fn test_crlf_and_bom() {
        let text = "\u{feff}\"GROUP\",\"A\"\r\n\"HEADING\",\"X\"\r\n\"UNIT\",\"\"\r\n\"TYPE\",\"X\"\r\n\"DATA\",\"a\"\r\n";
        let doc = parse_ags(text).unwrap();
        assert_eq!(doc.group("A").unwrap().value(0, "X"), Some(&AgsValue::Text("a".to_string())));
    }

    #[test]
    fn test_header_out_of_order() {
        let text = "\"GROUP\",\"A\"\n\"UNIT\",\"\"\n";
        let err = parse_ags(text).unwrap_err();
        assert_eq!(err, GroundError::malformed_group("A", 2, "expected HEADING line, found 'UNIT'"));

        let text = "\"GROUP\",\"A\"\n\"HEADING\",\"X\"\n\"TYPE\",\"X\"\n";
        assert!(matches!(parse_ags(text), Err(GroundError::MalformedGroup { line: 3, .. })));
    }

    #[test]
    fn test_truncated_header() {
        let text = "\"GROUP\",\"A\"\n\"HEADING\",\"X\",\"Y\"\n\"UNIT\",\"\",\"\"\n";
        let err = parse_ags(text).unwrap_err();
        assert!(matches!(err, GroundError::MalformedGroup { ref group, line: 3, .. } if group == "A"));
    }

    #[test]
    fn test_header_errors_abort_even_when_skipping() {
        let text = "\"GROUP\",\"A\"\n\"HEADING\",\"X\",\"Y\"\n\"UNIT\",\"\"\n";
        assert!(parse_ags_with(text, AgsErrorPolicy::SkipAndReport).is_err());
    }

    #[test]
    fn test_duplicate_group_and_heading() {
        let group = "\"GROUP\",\"A\"\n\"HEADING\",\"X\"\n\"UNIT\",\"\"\n\"TYPE\",\"X\"\n\n";
        let text = format!("{}{}", group, group);
        let err = parse_ags(&text).unwrap_err();
        assert_eq!(err, GroundError::malformed_group("A", 6, "duplicate group"));

        let text = "\"GROUP\",\"A\"\n\"HEADING\",\"X\",\"X\"\n";
        assert!(matches!(parse_ags(text), Err(GroundError::MalformedGroup { line: 2, .. })));
    }

    #[test]
    fn test_data_outside_group() {
        let text = "\"DATA\",\"x\"\n";
        assert!(matches!(parse_ags(text), Err(GroundError::MalformedGroup { line: 1, .. })));
    }

    #[test]
    fn test_unterminated_quote() {
        let text = "\"GROUP\",\"A\"\n\"HEADING\",\"X\"\n\"UNIT\",\"\"\n\"TYPE\",\"X\"\n\"DATA\",\"open\n";
        let err = parse_ags(text).unwrap_err();
        assert!(matches!(err, GroundError::MalformedGroup { line: 5, ref reason, .. } if reason.contains("unterminated")));
    }

    #[test]
    fn test_type_mismatch_reports_field() {
        let text = "\"GROUP\",\"LOCA\"\n\"HEADING\",\"LOCA_ID\",\"LOCA_FDEP\"\n\"UNIT\",\"\",\"m\"\n\
                    \"TYPE\",\"ID\",\"2DP\"\n\"DATA\",\"BH1\",\"ten\"\n";
        let err = parse_ags(text).unwrap_err();
        assert_eq!(
            err,
            GroundError::TypeMismatch {
                group: "LOCA".to_string(),
                heading: "LOCA_FDEP".to_string(),
                line: 5,
                value: "ten".to_string(),
                data_type: "2DP".to_string(),
            }
        );
    }

    #[test]
    fn test_ags3_group() {
        let text = "\"**GEOL\"\n\
                    \"*HOLE_ID\",\"*GEOL_TOP\",\n\
                    \"*GEOL_BASE\",\"*GEOL_DESC\"\n\
                    \"<UNITS>\",\"m\",\"m\",\"\"\n\
                    \"BH1\",\"0.00\",\"1.20\",\"Soft grey\"\n\
                    \"<CONT>\",\"\",\"\",\" CLAY\"\n\
                    \"BH1\",\"1.20\",\"3.00\",\"SAND\"\n";
        let doc = parse_ags(text).unwrap();
        assert_eq!(doc.edition(), AgsEdition::Ags3);
        let geol = doc.group("GEOL").unwrap();
        assert_eq!(geol.headings().len(), 4);
        assert_eq!(geol.headings()[0].unit, "");
        assert_eq!(geol.headings()[1].unit, "m");
        assert_eq!(geol.headings()[1].data_type, AgsDataType::Inferred);
        assert_eq!(geol.row_count(), 2);
        assert_eq!(geol.value(0, "GEOL_BASE"), Some(&AgsValue::Number(1.2)));
        assert_eq!(geol.value(0, "GEOL_DESC"), Some(&AgsValue::Text("Soft grey CLAY".to_string())));
    }

    #[test]
    fn test_ags3_without_units() {
        let text = "\"**HOLE\"\n\"*HOLE_ID\",\"*HOLE_TYPE\"\n\"BH1\",\"CP\"\n\n\"**GEOL\"\n\"*HOLE_ID\"\n";
        let doc = parse_ags(text).unwrap();
        assert_eq!(doc.group("HOLE").unwrap().row_count(), 1);
        assert_eq!(doc.group("GEOL").unwrap().row_count(), 0);
    }

    #[test]
    fn test_empty_input() {
        let doc = parse_ags("\n\n").unwrap();
        assert!(doc.is_empty());
    }
}
