//! AGS document <-> JSON object keyed by group name.

use serde_json::{Map, Value};

use super::types::{AgsDataType, AgsValue};
use super::{AgsDocument, AgsEdition, AgsGroup, AgsHeading};
use crate::errors::{GroundError, GroundResult};

pub(crate) fn document_to_json(document: &AgsDocument) -> Value {
    let mut root = Map::new();
    for group in document.groups() {
        root.insert(group.name().to_string(), group_to_json(group));
    }
    Value::Object(root)
}

fn group_to_json(group: &AgsGroup) -> Value {
    let headings = group.headings();
    let names: Vec<Value> = headings.iter().map(|h| Value::String(h.name.clone())).collect();
    let units: Vec<Value> = headings.iter().map(|h| Value::String(h.unit.clone())).collect();
    let types: Vec<Value> = headings.iter().map(|h| Value::String(h.data_type.code())).collect();

    let rows: Vec<Value> = group
        .rows()
        .iter()
        .map(|row| {
            let object: Map<String, Value> = headings
                .iter()
                .zip(row)
                .map(|(heading, value)| (heading.name.clone(), value_to_json(value)))
                .collect();
            Value::Object(object)
        })
        .collect();

    let mut object = Map::new();
    object.insert("headings".to_string(), Value::Array(names));
    object.insert("units".to_string(), Value::Array(units));
    object.insert("types".to_string(), Value::Array(types));
    object.insert("rows".to_string(), Value::Array(rows));
    Value::Object(object)
}

fn value_to_json(value: &AgsValue) -> Value {
    match value {
        AgsValue::Null => Value::Null,
        AgsValue::Number(v) => serde_json::Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        AgsValue::Text(s) => Value::String(s.clone()),
    }
}

pub(crate) fn document_from_json(value: &Value) -> GroundResult<AgsDocument> {
    let root = value
        .as_object()
        .ok_or_else(|| GroundError::serialization("AGS JSON must be an object keyed by group name"))?;

    let mut document = AgsDocument::new(AgsEdition::Ags4);
    for (name, group) in root {
        document.push_group(group_from_json(name, group)?)?;
    }
    Ok(document)
}

fn group_from_json(name: &str, value: &Value) -> GroundResult<AgsGroup> {
    let object = value
        .as_object()
        .ok_or_else(|| GroundError::serialization(format!("group '{}' must be an object", name)))?;

    let names = string_array(name, object, "headings")?;
    check_heading_names(name, &names)?;
    let width = names.len();
    let units = match object.get("units") {
        Some(_) => string_array(name, object, "units")?,
        None => vec![String::new(); width],
    };
    let types = match object.get("types") {
        Some(_) => string_array(name, object, "types")?,
        None => vec![String::new(); width],
    };
    if units.len() != width || types.len() != width {
        return Err(GroundError::malformed_group(
            name,
            0,
            format!(
                "{} headings but {} units and {} types",
                width,
                units.len(),
                types.len()
            ),
        ));
    }

    let headings: Vec<AgsHeading> = names
        .into_iter()
        .zip(units)
        .zip(types)
        .map(|((heading, unit), code)| {
            AgsHeading::new(heading, unit, code.parse().unwrap_or(AgsDataType::Inferred))
        })
        .collect();
    let mut group = AgsGroup::new(name, headings);

    let rows = match object.get("rows") {
        None | Some(Value::Null) => return Ok(group),
        Some(Value::Array(rows)) => rows,
        Some(_) => {
            return Err(GroundError::serialization(format!("group '{}': 'rows' must be an array", name)));
        }
    };

    for (index, row) in rows.iter().enumerate() {
        let fields = row.as_object().ok_or_else(|| {
            GroundError::serialization(format!("group '{}': row {} must be an object", name, index + 1))
        })?;
        if let Some(unknown) = fields.keys().find(|key| group.column(key).is_none()) {
            return Err(GroundError::malformed_group(
                name,
                index + 1,
                format!("row has unknown heading '{}'", unknown),
            ));
        }
        let values = group
            .headings()
            .iter()
            .map(|heading| value_from_json(name, index + 1, heading, fields.get(&heading.name)))
            .collect::<GroundResult<Vec<_>>>()?;
        group.push_row(values)?;
    }
    Ok(group)
}

/// Same rules as a HEADING line: at least one heading, no empty or
/// repeated names.
fn check_heading_names(group: &str, names: &[String]) -> GroundResult<()> {
    if names.is_empty() {
        return Err(GroundError::malformed_group(group, 0, "group has no headings"));
    }
    for (index, heading) in names.iter().enumerate() {
        if heading.is_empty() {
            return Err(GroundError::malformed_group(group, 0, "empty heading name"));
        }
        if names[..index].contains(heading) {
            return Err(GroundError::malformed_group(
                group,
                0,
                format!("duplicate heading '{}'", heading),
            ));
        }
    }
    Ok(())
}

fn string_array(group: &str, object: &Map<String, Value>, key: &str) -> GroundResult<Vec<String>> {
    let invalid = || GroundError::serialization(format!("group '{}': '{}' must be an array of strings", group, key));
    object
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Missing keys are null. Numbers in text columns are kept as their text
/// form; text in numeric columns must parse as a number.
fn value_from_json(group: &str, row: usize, heading: &AgsHeading, value: Option<&Value>) -> GroundResult<AgsValue> {
    let mismatch = |text: String| GroundError::TypeMismatch {
        group: group.to_string(),
        heading: heading.name.clone(),
        line: row,
        value: text,
        data_type: heading.data_type.code(),
    };

    match value {
        None | Some(Value::Null) => Ok(AgsValue::Null),
        Some(Value::Number(n)) => {
            let v = n.as_f64().ok_or_else(|| mismatch(n.to_string()))?;
            if heading.data_type.is_numeric() || heading.data_type == AgsDataType::Inferred {
                Ok(AgsValue::Number(v))
            } else {
                Ok(AgsValue::Text(n.to_string()))
            }
        }
        Some(Value::String(s)) => heading
            .data_type
            .parse_value(s)
            .ok_or_else(|| mismatch(s.clone())),
        Some(other) => Err(mismatch(other.to_string())),
    }
}
