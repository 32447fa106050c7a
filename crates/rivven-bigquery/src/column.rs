//! Column metadata reported by result cursors

use crate::types::{FieldSchema, FieldType};

/// Scalar type a caller should scan a column into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    /// `bool`
    Bool,
    /// `i64`
    Int64,
    /// `f64`
    Float64,
    /// `String`
    String,
    /// `Vec<u8>`
    Bytes,
    /// `DateTime<Utc>`
    Timestamp,
    /// No specific suggestion
    Any,
}

/// Full metadata of one result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// Column name
    pub name: String,
    /// SQL type name, e.g. `INT64`, `ARRAY<STRING>`, `STRUCT<INT64,STRING>`
    pub database_type_name: String,
    /// Maximum length, when declared
    pub length: Option<i64>,
    /// Precision and scale, when declared
    pub precision_scale: Option<(i64, i64)>,
    /// Suggested scan type
    pub scan_type: ScanType,
}

impl ColumnType {
    /// Derive column metadata from a field schema
    pub fn from_field(field: &FieldSchema) -> Self {
        Self {
            name: field.name.clone(),
            database_type_name: database_type_name(field),
            length: length(field),
            precision_scale: precision_scale(field),
            scan_type: scan_type(field),
        }
    }
}

/// SQL type name of a column
pub fn database_type_name(field: &FieldSchema) -> String {
    if field.repeated {
        format!("ARRAY<{}>", unit_type_name(field))
    } else {
        unit_type_name(field)
    }
}

fn unit_type_name(field: &FieldSchema) -> String {
    match &field.field_type {
        FieldType::Boolean => "BOOL".to_string(),
        FieldType::Integer => "INT64".to_string(),
        FieldType::Float => "FLOAT64".to_string(),
        FieldType::Range => match &field.range_element_type {
            Some(element) => format!("RANGE<{element}>"),
            None => "RANGE".to_string(),
        },
        FieldType::Record => {
            let nested: Vec<String> = field.fields.iter().map(database_type_name).collect();
            format!("STRUCT<{}>", nested.join(","))
        }
        other => other.as_str().to_string(),
    }
}

/// Declared maximum length, if any
pub fn length(field: &FieldSchema) -> Option<i64> {
    (field.max_length != 0).then_some(field.max_length)
}

/// Declared precision and scale, if either is set
pub fn precision_scale(field: &FieldSchema) -> Option<(i64, i64)> {
    (field.precision != 0 || field.scale != 0).then_some((field.precision, field.scale))
}

/// Suggested scan type, keyed off the field type tag.
///
/// Repeated columns are the exception: their cells are always converted to
/// canonical JSON bytes, so they report [`ScanType::Bytes`] whatever the
/// element type.
pub fn scan_type(field: &FieldSchema) -> ScanType {
    if field.repeated {
        return ScanType::Bytes;
    }
    match field.field_type {
        FieldType::Integer => ScanType::Int64,
        FieldType::Float => ScanType::Float64,
        FieldType::Boolean => ScanType::Bool,
        FieldType::Timestamp => ScanType::Timestamp,
        FieldType::String
        | FieldType::Date
        | FieldType::Time
        | FieldType::DateTime
        | FieldType::Numeric
        | FieldType::BigNumeric
        | FieldType::Geography
        | FieldType::Interval
        | FieldType::Range => ScanType::String,
        FieldType::Bytes | FieldType::Json | FieldType::Record => ScanType::Bytes,
        FieldType::Unknown(_) => ScanType::Any,
    }
}
