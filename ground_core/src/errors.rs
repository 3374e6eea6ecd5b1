//! # Error Types
//!
//! Structured error types for ground_core. Every variant names the offending
//! field, depth or input line so a caller (or a tool driving the library
//! through JSON) can fix the input and try again. Failures are deterministic
//! functions of the input; nothing here is retried.
//!
//! ## Example
//!
//! ```rust
//! use ground_core::errors::{GroundError, GroundResult};
//!
//! fn validate_unit_weight(unit_weight_kn_m3: f64) -> GroundResult<()> {
//!     if unit_weight_kn_m3 <= 0.0 {
//!         return Err(GroundError::invalid_parameter(
//!             "unit_weight_kn_m3",
//!             unit_weight_kn_m3.to_string(),
//!             "Unit weight must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for ground_core operations
pub type GroundResult<T> = Result<T, GroundError>;

/// Structured error type for ground model operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum GroundError {
    /// A soil parameter is out of its physical range or inconsistent
    #[error("Invalid parameter '{field}': {value} - {reason}")]
    InvalidParameter {
        field: String,
        value: String,
        reason: String,
    },

    /// A derived quantity needs a parameter the soil does not carry
    #[error("Soil '{reference}' has no value for '{field}'")]
    MissingParameter { reference: String, field: String },

    /// New layer interval overlaps an existing layer
    #[error("Layer {top_m}-{bottom_m} m overlaps existing layer {existing_top_m}-{existing_bottom_m} m")]
    Overlap {
        top_m: f64,
        bottom_m: f64,
        existing_top_m: f64,
        existing_bottom_m: f64,
    },

    /// New layer would leave an uncovered depth interval
    #[error("Layer {top_m}-{bottom_m} m leaves a gap from {gap_top_m} to {gap_bottom_m} m")]
    Gap {
        top_m: f64,
        bottom_m: f64,
        gap_top_m: f64,
        gap_bottom_m: f64,
    },

    /// Layer bottom is not below its top
    #[error("Layer bottom {bottom_m} m must be below top {top_m} m")]
    Order { top_m: f64, bottom_m: f64 },

    /// Query depth outside the covered interval
    #[error("Depth {depth_m} m is out of range: {reason}")]
    OutOfRange { depth_m: f64, reason: String },

    /// AGS group structure is broken (field counts, missing header lines, ...)
    #[error("Malformed group '{group}' at line {line}: {reason}")]
    MalformedGroup {
        group: String,
        line: usize,
        reason: String,
    },

    /// AGS field could not be parsed as its declared type
    #[error("Type mismatch in {group}.{heading} at line {line}: '{value}' is not a valid {data_type}")]
    TypeMismatch {
        group: String,
        heading: String,
        line: usize,
        value: String,
        data_type: String,
    },

    /// AGSi JSON is not shaped as expected
    #[error("Invalid AGSi document at '{path}': {reason}")]
    Agsi { path: String, reason: String },

    /// Named soil or model not found
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl GroundError {
    /// Create an InvalidParameter error
    pub fn invalid_parameter(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        GroundError::InvalidParameter {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingParameter error
    pub fn missing_parameter(reference: impl Into<String>, field: impl Into<String>) -> Self {
        GroundError::MissingParameter {
            reference: reference.into(),
            field: field.into(),
        }
    }

    /// Create an OutOfRange error
    pub fn out_of_range(depth_m: f64, reason: impl Into<String>) -> Self {
        GroundError::OutOfRange {
            depth_m,
            reason: reason.into(),
        }
    }

    /// Create a MalformedGroup error
    pub fn malformed_group(group: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        GroundError::MalformedGroup {
            group: group.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create an Agsi error
    pub fn agsi(path: impl Into<String>, reason: impl Into<String>) -> Self {
        GroundError::Agsi {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        GroundError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        GroundError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        GroundError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from any displayable error
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        GroundError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// True for errors raised while reading AGS text
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            GroundError::MalformedGroup { .. } | GroundError::TypeMismatch { .. }
        )
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GroundError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            GroundError::InvalidParameter { .. } => "INVALID_PARAMETER",
            GroundError::MissingParameter { .. } => "MISSING_PARAMETER",
            GroundError::Overlap { .. } => "OVERLAP",
            GroundError::Gap { .. } => "GAP",
            GroundError::Order { .. } => "ORDER",
            GroundError::OutOfRange { .. } => "OUT_OF_RANGE",
            GroundError::MalformedGroup { .. } => "MALFORMED_GROUP",
            GroundError::TypeMismatch { .. } => "TYPE_MISMATCH",
            GroundError::Agsi { .. } => "INVALID_AGSI",
            GroundError::NotFound { .. } => "NOT_FOUND",
            GroundError::FileError { .. } => "FILE_ERROR",
            GroundError::FileLocked { .. } => "FILE_LOCKED",
            GroundError::SerializationError { .. } => "SERIALIZATION_ERROR",
            GroundError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = GroundError::invalid_parameter("phi_prime_deg", "95", "Friction angle must be within 0-90 degrees");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidParameter\""));
        let roundtrip: GroundError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GroundError::missing_parameter("CLAY", "phi_prime_deg").error_code(), "MISSING_PARAMETER");
        assert_eq!(GroundError::out_of_range(5.1, "below model base").error_code(), "OUT_OF_RANGE");
        assert_eq!(GroundError::Order { top_m: 2.0, bottom_m: 1.0 }.error_code(), "ORDER");
    }

    #[test]
    fn test_messages_identify_location() {
        let err = GroundError::malformed_group("GEOL", 7, "expected 4 fields, found 3");
        assert_eq!(err.to_string(), "Malformed group 'GEOL' at line 7: expected 4 fields, found 3");
        assert!(err.is_parse_error());
        assert!(!err.is_recoverable());
    }
}
