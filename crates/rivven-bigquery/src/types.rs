//! Value types for rivven-bigquery
//!
//! Three layers of values flow through the driver:
//! - [`FieldSchema`]: the schema of one result column, as reported by a completed job
//! - [`RawValue`]: a cell exactly as the warehouse delivers it (nested, repeated, rational)
//! - [`ScalarValue`]: the flat scalar handed to callers of the relational API

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_rational::BigRational;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Warehouse column type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// BOOL
    Boolean,
    /// INT64
    Integer,
    /// FLOAT64
    Float,
    /// STRING
    String,
    /// BYTES
    Bytes,
    /// TIMESTAMP (absolute point in time)
    Timestamp,
    /// DATE (civil date)
    Date,
    /// TIME (civil time of day)
    Time,
    /// DATETIME (civil date and time)
    DateTime,
    /// NUMERIC (38 digits, scale 9)
    Numeric,
    /// BIGNUMERIC (76 digits, scale 38)
    BigNumeric,
    /// GEOGRAPHY (WKT string)
    Geography,
    /// INTERVAL
    Interval,
    /// JSON
    Json,
    /// RANGE<T>
    Range,
    /// RECORD / STRUCT
    Record,
    /// A tag this driver does not understand. Kept verbatim so conversion can
    /// reject it with the original name.
    Unknown(String),
}

impl FieldType {
    /// Tag name as used by the jobs API
    pub fn as_str(&self) -> &str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::String => "STRING",
            Self::Bytes => "BYTES",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Numeric => "NUMERIC",
            Self::BigNumeric => "BIGNUMERIC",
            Self::Geography => "GEOGRAPHY",
            Self::Interval => "INTERVAL",
            Self::Json => "JSON",
            Self::Range => "RANGE",
            Self::Record => "RECORD",
            Self::Unknown(tag) => tag.as_str(),
        }
    }

    /// Whether the tag is one of the known warehouse types
    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.to_ascii_uppercase().as_str() {
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "INTEGER" | "INT64" => Self::Integer,
            "FLOAT" | "FLOAT64" => Self::Float,
            "STRING" => Self::String,
            "BYTES" => Self::Bytes,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DATETIME" => Self::DateTime,
            "NUMERIC" | "DECIMAL" => Self::Numeric,
            "BIGNUMERIC" | "BIGDECIMAL" => Self::BigNumeric,
            "GEOGRAPHY" => Self::Geography,
            "INTERVAL" => Self::Interval,
            "JSON" => Self::Json,
            "RANGE" => Self::Range,
            "RECORD" | "STRUCT" => Self::Record,
            _ => Self::Unknown(s.to_string()),
        };
        Ok(tag)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(tag.parse().unwrap_or_else(|never| match never {}))
    }
}

/// Schema of a single result column (or a nested record field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Field name
    pub name: String,
    /// Type tag
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// REPEATED mode: the cell holds a sequence of values of `field_type`
    #[serde(default)]
    pub repeated: bool,
    /// Nested fields (RECORD only), in declaration order
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    /// Element type of a RANGE column
    #[serde(default)]
    pub range_element_type: Option<FieldType>,
    /// Maximum length for STRING/BYTES (0 = unset)
    #[serde(default)]
    pub max_length: i64,
    /// Precision for NUMERIC/BIGNUMERIC (0 = unset)
    #[serde(default)]
    pub precision: i64,
    /// Scale for NUMERIC/BIGNUMERIC (0 = unset)
    #[serde(default)]
    pub scale: i64,
}

impl FieldSchema {
    /// Create a nullable, non-repeated field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            repeated: false,
            fields: Vec::new(),
            range_element_type: None,
            max_length: 0,
            precision: 0,
            scale: 0,
        }
    }

    /// Create a RECORD field with the given nested fields
    pub fn record(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            fields,
            ..Self::new(name, FieldType::Record)
        }
    }

    /// Mark the field as REPEATED
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Set the RANGE element type
    pub fn with_range_element(mut self, element: FieldType) -> Self {
        self.range_element_type = Some(element);
        self
    }

    /// Set the maximum length
    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set precision and scale
    pub fn with_precision_scale(mut self, precision: i64, scale: i64) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }
}

/// A cell as delivered by the warehouse
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int64(i64),
    /// 64-bit float
    Float64(f64),
    /// Text, and string-rendered compounds (GEOGRAPHY, INTERVAL, JSON, RANGE)
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Absolute timestamp
    Timestamp(DateTime<Utc>),
    /// Civil date
    Date(NaiveDate),
    /// Civil time
    Time(NaiveTime),
    /// Civil date and time
    DateTime(NaiveDateTime),
    /// Arbitrary-precision rational (NUMERIC, BIGNUMERIC)
    Rational(BigRational),
    /// Ordered sequence: elements of a repeated field, or the fields of a record
    Array(Vec<RawValue>),
}

impl RawValue {
    /// Check if value is NULL
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the runtime shape, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int64(_) => "int64",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Rational(_) => "rational",
            Self::Array(_) => "array",
        }
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<BigRational> for RawValue {
    fn from(v: BigRational) -> Self {
        Self::Rational(v)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Flat scalar value exposed to callers
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int64(i64),
    /// 64-bit float
    Float64(f64),
    /// Text (also DATE/TIME/DATETIME/NUMERIC renderings)
    String(String),
    /// Opaque bytes (BYTES, and canonical JSON for repeated/record cells)
    Bytes(Vec<u8>),
    /// Absolute timestamp
    Timestamp(DateTime<Utc>),
}

impl ScalarValue {
    /// Check if value is NULL
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(n) => Some(*n),
            Self::Int64(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get as byte slice
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b.as_slice()),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Get as timestamp
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        Self::Int64(i64::from(v))
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<Utc>> for ScalarValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Self::Null,
        }
    }
}

/// Result row as ordered column values
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<ScalarValue>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Arc<[String]>, values: Vec<ScalarValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Get column count
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if row is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get column names
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get all values
    #[inline]
    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }

    /// Get value by column index
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&ScalarValue> {
        self.values.get(idx)
    }

    /// Get value by column name (exact match; field names are case-sensitive in results)
    pub fn get_by_name(&self, name: &str) -> Option<&ScalarValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Consume the row and return its values
    pub fn into_values(self) -> Vec<ScalarValue> {
        self.values
    }
}
