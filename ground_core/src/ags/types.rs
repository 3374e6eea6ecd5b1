//! AGS data types (the `TYPE` line) and typed field values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared type of an AGS column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgsDataType {
    /// `nDP` - value with n decimal places
    DecimalPlaces(u8),
    /// `nSF` - value with n significant figures
    SignificantFigures(u8),
    /// `nSCI` - scientific notation with n decimal places
    Scientific(u8),
    /// `U` - unformatted number
    Unformatted,
    /// `MC` - moisture content
    MoistureContent,
    /// `ID` - unique identifier
    Id,
    /// `PA` - pick list text
    PickList,
    /// `PT` - pick list type
    PickListType,
    /// `PU` - pick list unit
    PickListUnit,
    /// `X` - text
    Text,
    /// `XN` - text or numeric
    TextNumeric,
    /// `T` - elapsed time
    ElapsedTime,
    /// `DT` - date/time
    DateTime,
    /// `YN` - yes/no
    YesNo,
    /// `RL` - record link
    RecordLink,
    /// `DMS` - degrees:minutes:seconds
    DegMinSec,
    /// AGS3 groups carry no TYPE line; numbers are recognised by shape
    Inferred,
    /// Unknown type code, read as text
    Other(String),
}

impl AgsDataType {
    /// Columns whose values are emitted as JSON numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AgsDataType::DecimalPlaces(_)
                | AgsDataType::SignificantFigures(_)
                | AgsDataType::Scientific(_)
                | AgsDataType::Unformatted
                | AgsDataType::MoistureContent
        )
    }

    /// The TYPE-line code
    pub fn code(&self) -> String {
        match self {
            AgsDataType::DecimalPlaces(n) => format!("{}DP", n),
            AgsDataType::SignificantFigures(n) => format!("{}SF", n),
            AgsDataType::Scientific(n) => format!("{}SCI", n),
            AgsDataType::Unformatted => "U".to_string(),
            AgsDataType::MoistureContent => "MC".to_string(),
            AgsDataType::Id => "ID".to_string(),
            AgsDataType::PickList => "PA".to_string(),
            AgsDataType::PickListType => "PT".to_string(),
            AgsDataType::PickListUnit => "PU".to_string(),
            AgsDataType::Text => "X".to_string(),
            AgsDataType::TextNumeric => "XN".to_string(),
            AgsDataType::ElapsedTime => "T".to_string(),
            AgsDataType::DateTime => "DT".to_string(),
            AgsDataType::YesNo => "YN".to_string(),
            AgsDataType::RecordLink => "RL".to_string(),
            AgsDataType::DegMinSec => "DMS".to_string(),
            AgsDataType::Inferred => String::new(),
            AgsDataType::Other(code) => code.clone(),
        }
    }

    /// Parse a raw field into a typed value.
    ///
    /// Empty fields are null for every type; blank fields are null only in
    /// numeric and yes/no columns, text columns keep them as written.
    /// Returns `None` when the text does not fit the type.
    pub fn parse_value(&self, raw: &str) -> Option<AgsValue> {
        if raw.is_empty() || (raw.trim().is_empty() && (self.is_numeric() || *self == AgsDataType::YesNo)) {
            return Some(AgsValue::Null);
        }
        match self {
            t if t.is_numeric() => parse_number(raw).map(AgsValue::Number),
            AgsDataType::YesNo => {
                let upper = raw.trim().to_ascii_uppercase();
                (upper == "Y" || upper == "N").then(|| AgsValue::Text(raw.to_string()))
            }
            AgsDataType::Inferred => Some(
                parse_number(raw)
                    .map(AgsValue::Number)
                    .unwrap_or_else(|| AgsValue::Text(raw.to_string())),
            ),
            _ => Some(AgsValue::Text(raw.to_string())),
        }
    }

    /// Render a value for an AGS file.
    ///
    /// Numbers use the declared format unless that would change the value,
    /// in which case the shortest exact form is written.
    pub fn format_value(&self, value: &AgsValue) -> String {
        match value {
            AgsValue::Null => String::new(),
            AgsValue::Text(s) => s.clone(),
            AgsValue::Number(v) => {
                let formatted = match self {
                    AgsDataType::DecimalPlaces(n) => format!("{:.*}", *n as usize, v),
                    AgsDataType::Scientific(n) => format!("{:.*E}", *n as usize, v),
                    AgsDataType::SignificantFigures(n) => format_significant(*v, *n),
                    _ => v.to_string(),
                };
                if parse_number(&formatted) == Some(*v) {
                    formatted
                } else {
                    v.to_string()
                }
            }
        }
    }
}

impl fmt::Display for AgsDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AgsDataType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let counted = |suffix: &str| -> Option<u8> {
            code.strip_suffix(suffix)
                .filter(|digits| !digits.is_empty())
                .and_then(|digits| digits.parse().ok())
        };

        let parsed = if let Some(n) = counted("SCI") {
            AgsDataType::Scientific(n)
        } else if let Some(n) = counted("DP") {
            AgsDataType::DecimalPlaces(n)
        } else if let Some(n) = counted("SF") {
            AgsDataType::SignificantFigures(n)
        } else {
            match code.as_str() {
                "" => AgsDataType::Inferred,
                "U" => AgsDataType::Unformatted,
                "MC" => AgsDataType::MoistureContent,
                "ID" => AgsDataType::Id,
                "PA" => AgsDataType::PickList,
                "PT" => AgsDataType::PickListType,
                "PU" => AgsDataType::PickListUnit,
                "X" => AgsDataType::Text,
                "XN" => AgsDataType::TextNumeric,
                "T" => AgsDataType::ElapsedTime,
                "DT" => AgsDataType::DateTime,
                "YN" => AgsDataType::YesNo,
                "RL" | "RECORD LINK" => AgsDataType::RecordLink,
                "DMS" => AgsDataType::DegMinSec,
                _ => AgsDataType::Other(s.trim().to_string()),
            }
        };
        Ok(parsed)
    }
}

impl Serialize for AgsDataType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for AgsDataType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(code.parse().unwrap_or(AgsDataType::Inferred))
    }
}

/// A typed AGS field.
///
/// Serialises untagged: `null`, a JSON number or a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgsValue {
    Null,
    Number(f64),
    Text(String),
}

impl AgsValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AgsValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AgsValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AgsValue::Null)
    }
}

impl From<f64> for AgsValue {
    fn from(v: f64) -> Self {
        AgsValue::Number(v)
    }
}

impl From<&str> for AgsValue {
    fn from(s: &str) -> Self {
        AgsValue::Text(s.to_string())
    }
}

impl From<Option<String>> for AgsValue {
    fn from(s: Option<String>) -> Self {
        s.map(AgsValue::Text).unwrap_or(AgsValue::Null)
    }
}

/// Finite numbers only; `f64::from_str` would otherwise accept "NaN" and "inf".
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_significant(v: f64, figures: u8) -> String {
    let figures = figures.max(1) as i32;
    if v == 0.0 {
        return format!("{:.*}", (figures - 1) as usize, 0.0);
    }
    let magnitude = v.abs().log10().floor() as i32;
    let decimals = figures - 1 - magnitude;
    if decimals >= 0 {
        format!("{:.*}", decimals as usize, v)
    } else {
        let scale = 10f64.powi(-decimals);
        format!("{}", (v / scale).round() * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes() {
        assert_eq!("2DP".parse::<AgsDataType>().unwrap(), AgsDataType::DecimalPlaces(2));
        assert_eq!("3sf".parse::<AgsDataType>().unwrap(), AgsDataType::SignificantFigures(3));
        assert_eq!("1SCI".parse::<AgsDataType>().unwrap(), AgsDataType::Scientific(1));
        assert_eq!("ID".parse::<AgsDataType>().unwrap(), AgsDataType::Id);
        assert_eq!("".parse::<AgsDataType>().unwrap(), AgsDataType::Inferred);
        assert_eq!("DP".parse::<AgsDataType>().unwrap(), AgsDataType::Other("DP".to_string()));
        assert_eq!(AgsDataType::DecimalPlaces(2).to_string(), "2DP");
    }

    #[test]
    fn test_parse_numeric() {
        let dp = AgsDataType::DecimalPlaces(2);
        assert_eq!(dp.parse_value("1.50"), Some(AgsValue::Number(1.5)));
        assert_eq!(dp.parse_value(""), Some(AgsValue::Null));
        assert_eq!(dp.parse_value("deep"), None);
        assert_eq!(dp.parse_value("NaN"), None);
        assert_eq!(dp.parse_value("inf"), None);
    }

    #[test]
    fn test_parse_text_and_yes_no() {
        assert_eq!(AgsDataType::Text.parse_value("12"), Some(AgsValue::Text("12".to_string())));
        assert_eq!(AgsDataType::YesNo.parse_value("y"), Some(AgsValue::Text("y".to_string())));
        assert_eq!(AgsDataType::YesNo.parse_value("maybe"), None);
        assert_eq!(AgsDataType::Inferred.parse_value("3.2"), Some(AgsValue::Number(3.2)));
        assert_eq!(AgsDataType::Inferred.parse_value("BH1"), Some(AgsValue::Text("BH1".to_string())));
    }

    #[test]
    fn test_blank_text_is_kept() {
        assert_eq!(AgsDataType::Text.parse_value("  "), Some(AgsValue::Text("  ".to_string())));
        assert_eq!(AgsDataType::Id.parse_value(" "), Some(AgsValue::Text(" ".to_string())));
        assert_eq!(AgsDataType::Text.parse_value(""), Some(AgsValue::Null));
        assert_eq!(AgsDataType::DecimalPlaces(2).parse_value("  "), Some(AgsValue::Null));
        assert_eq!(AgsDataType::YesNo.parse_value(" "), Some(AgsValue::Null));
    }

    #[test]
    fn test_format_per_type() {
        assert_eq!(AgsDataType::DecimalPlaces(2).format_value(&AgsValue::Number(1.5)), "1.50");
        assert_eq!(AgsDataType::Scientific(1).format_value(&AgsValue::Number(0.0012)), "1.2E-3");
        assert_eq!(AgsDataType::SignificantFigures(3).format_value(&AgsValue::Number(12.3)), "12.3");
        assert_eq!(AgsDataType::SignificantFigures(2).format_value(&AgsValue::Number(1200.0)), "1200");
        assert_eq!(AgsDataType::Unformatted.format_value(&AgsValue::Number(7.0)), "7");
        assert_eq!(AgsDataType::Text.format_value(&AgsValue::Null), "");
    }

    #[test]
    fn test_format_keeps_value_when_format_would_round() {
        // 1.555 does not fit 1DP; the exact value is written instead
        assert_eq!(AgsDataType::DecimalPlaces(1).format_value(&AgsValue::Number(1.555)), "1.555");
    }

    #[test]
    fn test_value_json() {
        let values = vec![AgsValue::Null, AgsValue::Number(2.5), AgsValue::Text("CLAY".to_string())];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,2.5,"CLAY"]"#);
        let back: Vec<AgsValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
