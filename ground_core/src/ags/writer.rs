//! AGS 4 text output.

use super::lexer::join_fields;
use super::types::{AgsDataType, AgsValue};
use super::{AgsDocument, AgsGroup};

/// AGS 4 lines end in CR LF.
const LINE_END: &str = "\r\n";

pub(crate) fn write_document(document: &AgsDocument) -> String {
    document
        .groups()
        .iter()
        .map(write_group)
        .collect::<Vec<_>>()
        .join(LINE_END)
}

fn write_group(group: &AgsGroup) -> String {
    let types: Vec<AgsDataType> = (0..group.headings().len())
        .map(|column| resolved_type(group, column))
        .collect();

    let mut lines = Vec::with_capacity(group.row_count() + 4);
    lines.push(join_fields(["GROUP", group.name()]));
    lines.push(join_fields(
        std::iter::once("HEADING").chain(group.headings().iter().map(|h| h.name.as_str())),
    ));
    lines.push(join_fields(
        std::iter::once("UNIT").chain(group.headings().iter().map(|h| h.unit.as_str())),
    ));
    lines.push(join_fields(
        std::iter::once("TYPE".to_string()).chain(types.iter().map(|t| t.code())),
    ));
    for row in group.rows() {
        let values = row.iter().zip(&types).map(|(value, data_type)| data_type.format_value(value));
        lines.push(join_fields(std::iter::once("DATA".to_string()).chain(values)));
    }

    let mut text = lines.join(LINE_END);
    text.push_str(LINE_END);
    text
}

/// AGS 3 columns have no declared type; AGS 4 needs one. Columns holding
/// only numbers are written as `U`, anything else as `X`.
fn resolved_type(group: &AgsGroup, column: usize) -> AgsDataType {
    let declared = &group.headings()[column].data_type;
    if *declared != AgsDataType::Inferred {
        return declared.clone();
    }
    let all_numeric = group
        .rows()
        .iter()
        .all(|row| matches!(row[column], AgsValue::Number(_) | AgsValue::Null));
    let any_number = group.rows().iter().any(|row| matches!(row[column], AgsValue::Number(_)));
    if all_numeric && any_number {
        AgsDataType::Unformatted
    } else {
        AgsDataType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ags::{parse_ags, AgsEdition, AgsHeading};

    fn geol() -> AgsDocument {
        let mut group = AgsGroup::new(
            "GEOL",
            vec![
                AgsHeading::new("LOCA_ID", "", AgsDataType::Id),
                AgsHeading::new("GEOL_TOP", "m", AgsDataType::DecimalPlaces(2)),
                AgsHeading::new("GEOL_DESC", "", AgsDataType::Text),
            ],
        );
        group
            .push_row(vec!["BH1".into(), 0.0.into(), "Soft \"grey\" CLAY".into()])
            .unwrap();
        group.push_row(vec!["BH1".into(), 1.25.into(), AgsValue::Null]).unwrap();
        let mut doc = AgsDocument::new(AgsEdition::Ags4);
        doc.push_group(group).unwrap();
        doc
    }

    #[test]
    fn test_write_group_lines() {
        let text = geol().to_ags_string();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], r#""GROUP","GEOL""#);
        assert_eq!(lines[1], r#""HEADING","LOCA_ID","GEOL_TOP","GEOL_DESC""#);
        assert_eq!(lines[2], r#""UNIT","","m","""#);
        assert_eq!(lines[3], r#""TYPE","ID","2DP","X""#);
        assert_eq!(lines[4], r#""DATA","BH1","0.00","Soft ""grey"" CLAY""#);
        assert_eq!(lines[5], r#""DATA","BH1","1.25","""#);
    }

    #[test]
    fn test_written_text_parses_back() {
        let doc = geol();
        assert_eq!(parse_ags(&doc.to_ags_string()).unwrap(), doc);
    }

    #[test]
    fn test_ags3_columns_get_types() {
        let text = "\"**HOLE\"\n\"*HOLE_ID\",\"*HOLE_FDEP\"\n\"BH1\",\"12.5\"\n";
        let doc = parse_ags(text).unwrap();
        let written = doc.to_ags_string();
        assert!(written.contains(r#""TYPE","X","U""#));
        let reparsed = parse_ags(&written).unwrap();
        assert_eq!(reparsed.group("HOLE").unwrap().value(0, "HOLE_FDEP"), Some(&AgsValue::Number(12.5)));
    }
}
