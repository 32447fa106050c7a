//! Value conversion for rivven-bigquery
//!
//! Maps a `(FieldSchema, RawValue)` pair onto exactly one [`ScalarValue`]:
//! - primitive tags pass through when the runtime type matches
//! - DATE/TIME/DATETIME and NUMERIC/BIGNUMERIC render to canonical strings
//! - GEOGRAPHY/INTERVAL/JSON/RANGE are already strings and pass through
//! - repeated and RECORD cells are serialized to canonical JSON bytes
//!
//! Conversion is pure; a failure only affects the cell being converted.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Timelike};
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::{Error, Result};
use crate::numeric;
use crate::types::{FieldSchema, FieldType, RawValue, ScalarValue};

/// Intermediate result: either a scalar or a structure awaiting encoding
#[derive(Debug)]
enum Converted {
    Scalar(ScalarValue),
    List(Vec<Converted>),
    Record(Vec<(String, Converted)>),
}

impl Converted {
    const NULL: Self = Self::Scalar(ScalarValue::Null);
}

/// Convert one cell to the scalar value model
pub fn convert_value(field: &FieldSchema, value: RawValue) -> Result<ScalarValue> {
    match convert_field(field, value)? {
        Converted::Scalar(scalar) => Ok(scalar),
        nested => encode_canonical(nested).map(ScalarValue::Bytes),
    }
}

/// Convert every cell of a row against its schema
pub fn convert_row(schema: &[FieldSchema], values: Vec<RawValue>) -> Result<Vec<ScalarValue>> {
    if values.len() != schema.len() {
        return Err(Error::schema(format!(
            "row has {} values but schema has {} fields",
            values.len(),
            schema.len()
        )));
    }
    schema
        .iter()
        .zip(values)
        .map(|(field, value)| convert_value(field, value))
        .collect()
}

fn convert_field(field: &FieldSchema, value: RawValue) -> Result<Converted> {
    if field.repeated {
        convert_repeated(field, value)
    } else {
        convert_unit(field, value)
    }
}

fn convert_repeated(field: &FieldSchema, value: RawValue) -> Result<Converted> {
    match value {
        RawValue::Null => Ok(Converted::NULL),
        RawValue::Array(elements) => elements
            .into_iter()
            .map(|element| convert_unit(field, element))
            .collect::<Result<Vec<_>>>()
            .map(Converted::List),
        other => Err(Error::unexpected_type(field.field_type.clone(), "array", other)),
    }
}

fn convert_record(field: &FieldSchema, value: RawValue) -> Result<Converted> {
    match value {
        RawValue::Null => Ok(Converted::NULL),
        RawValue::Array(values) if values.len() == field.fields.len() => field
            .fields
            .iter()
            .zip(values)
            .map(|(nested, value)| Ok((nested.name.clone(), convert_field(nested, value)?)))
            .collect::<Result<Vec<_>>>()
            .map(Converted::Record),
        other => Err(Error::unexpected_type(field.field_type.clone(), "record", other)),
    }
}

/// Accept NULL or the one runtime shape `map` recognizes
fn expect_shape(
    field: &FieldSchema,
    value: RawValue,
    expected: &'static str,
    map: impl FnOnce(RawValue) -> std::result::Result<ScalarValue, RawValue>,
) -> Result<Converted> {
    if value.is_null() {
        return Ok(Converted::NULL);
    }
    map(value)
        .map(Converted::Scalar)
        .map_err(|actual| Error::unexpected_type(field.field_type.clone(), expected, actual))
}

fn convert_unit(field: &FieldSchema, value: RawValue) -> Result<Converted> {
    match &field.field_type {
        FieldType::Boolean => expect_shape(field, value, "bool", |v| match v {
            RawValue::Bool(b) => Ok(ScalarValue::Bool(b)),
            v => Err(v),
        }),
        FieldType::Integer => expect_shape(field, value, "int64", |v| match v {
            RawValue::Int64(n) => Ok(ScalarValue::Int64(n)),
            v => Err(v),
        }),
        FieldType::Float => expect_shape(field, value, "float64", |v| match v {
            RawValue::Float64(n) => Ok(ScalarValue::Float64(n)),
            v => Err(v),
        }),
        FieldType::Bytes => expect_shape(field, value, "bytes", |v| match v {
            RawValue::Bytes(b) => Ok(ScalarValue::Bytes(b)),
            v => Err(v),
        }),
        FieldType::Timestamp => expect_shape(field, value, "timestamp", |v| match v {
            RawValue::Timestamp(ts) => Ok(ScalarValue::Timestamp(ts)),
            v => Err(v),
        }),
        FieldType::String
        | FieldType::Geography
        | FieldType::Interval
        | FieldType::Json
        | FieldType::Range => expect_shape(field, value, "string", |v| match v {
            RawValue::String(s) => Ok(ScalarValue::String(s)),
            v => Err(v),
        }),
        FieldType::Date => expect_shape(field, value, "date", |v| match v {
            RawValue::Date(d) => Ok(ScalarValue::String(render_date(d))),
            v => Err(v),
        }),
        FieldType::Time => expect_shape(field, value, "time", |v| match v {
            RawValue::Time(t) => Ok(ScalarValue::String(render_time(t))),
            v => Err(v),
        }),
        FieldType::DateTime => expect_shape(field, value, "datetime", |v| match v {
            RawValue::DateTime(dt) => Ok(ScalarValue::String(render_datetime(dt))),
            v => Err(v),
        }),
        FieldType::Numeric => expect_shape(field, value, "rational", |v| match v {
            RawValue::Rational(r) => Ok(ScalarValue::String(numeric::numeric_string(&r))),
            v => Err(v),
        }),
        FieldType::BigNumeric => expect_shape(field, value, "rational", |v| match v {
            RawValue::Rational(r) => Ok(ScalarValue::String(numeric::bignumeric_string(&r))),
            v => Err(v),
        }),
        FieldType::Record => convert_record(field, value),
        FieldType::Unknown(_) => Err(Error::InvalidFieldType {
            field_type: field.field_type.clone(),
        }),
    }
}

/// `YYYY-MM-DD`
pub fn render_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `HH:MM:SS`, with nine fractional digits only when sub-second precision is present
pub fn render_time(time: NaiveTime) -> String {
    if time.nanosecond() == 0 {
        time.format("%H:%M:%S").to_string()
    } else {
        time.format("%H:%M:%S%.9f").to_string()
    }
}

/// `<date>T<time>`
pub fn render_datetime(datetime: NaiveDateTime) -> String {
    format!(
        "{}T{}",
        render_date(datetime.date()),
        render_time(datetime.time())
    )
}

fn encode_canonical(value: Converted) -> Result<Vec<u8>> {
    let json = to_json(value)?;
    serde_json::to_vec(&json).map_err(|e| Error::encoding(e.to_string()))
}

fn to_json(value: Converted) -> Result<JsonValue> {
    match value {
        Converted::Scalar(scalar) => scalar_to_json(scalar),
        Converted::List(items) => items
            .into_iter()
            .map(to_json)
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        Converted::Record(fields) => {
            let mut map = Map::with_capacity(fields.len());
            for (name, value) in fields {
                map.insert(name, to_json(value)?);
            }
            Ok(JsonValue::Object(map))
        }
    }
}

fn scalar_to_json(scalar: ScalarValue) -> Result<JsonValue> {
    Ok(match scalar {
        ScalarValue::Null => JsonValue::Null,
        ScalarValue::Bool(b) => JsonValue::Bool(b),
        ScalarValue::Int64(n) => JsonValue::Number(n.into()),
        ScalarValue::Float64(n) => match Number::from_f64(n) {
            Some(number) => JsonValue::Number(number),
            None => JsonValue::String(non_finite_name(n).to_string()),
        },
        ScalarValue::String(s) => JsonValue::String(s),
        ScalarValue::Bytes(b) => JsonValue::String(STANDARD.encode(b)),
        ScalarValue::Timestamp(ts) => {
            JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
    })
}

/// JSON has no literal for these; the warehouse writes them as strings
fn non_finite_name(n: f64) -> &'static str {
    if n.is_nan() {
        "NaN"
    } else if n.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn field(name: &str, field_type: FieldType) -> FieldSchema {
        FieldSchema::new(name, field_type)
    }

    fn decode(value: ScalarValue) -> JsonValue {
        match value {
            ScalarValue::Bytes(bytes) => serde_json::from_slice(&bytes).unwrap(),
            other => panic!("expected canonical bytes, got {other:?}"),
        }
    }

    #[test]
    fn test_matching_primitives_pass_through() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let cases = vec![
            (FieldType::Boolean, RawValue::Bool(true), ScalarValue::Bool(true)),
            (FieldType::Integer, RawValue::Int64(-4), ScalarValue::Int64(-4)),
            (FieldType::Float, RawValue::Float64(0.5), ScalarValue::Float64(0.5)),
            (FieldType::String, RawValue::from("hi"), ScalarValue::from("hi")),
            (
                FieldType::Bytes,
                RawValue::Bytes(vec![1, 2]),
                ScalarValue::Bytes(vec![1, 2]),
            ),
            (FieldType::Timestamp, RawValue::Timestamp(ts), ScalarValue::Timestamp(ts)),
            (FieldType::Json, RawValue::from("{\"a\":1}"), ScalarValue::from("{\"a\":1}")),
            (FieldType::Geography, RawValue::from("POINT(1 2)"), ScalarValue::from("POINT(1 2)")),
            (FieldType::Interval, RawValue::from("0-0 1 0:0:0"), ScalarValue::from("0-0 1 0:0:0")),
            (
                FieldType::Range,
                RawValue::from("[2024-01-01, UNBOUNDED)"),
                ScalarValue::from("[2024-01-01, UNBOUNDED)"),
            ),
        ];

        for (field_type, raw, expected) in cases {
            let f = field("c", field_type.clone());
            assert_eq!(convert_value(&f, raw).unwrap(), expected, "{field_type}");
        }
    }

    #[test]
    fn test_null_is_accepted_for_every_known_type() {
        for field_type in [
            FieldType::Boolean,
            FieldType::Integer,
            FieldType::Numeric,
            FieldType::Date,
            FieldType::Record,
            FieldType::Json,
        ] {
            let f = field("c", field_type);
            assert_eq!(convert_value(&f, RawValue::Null).unwrap(), ScalarValue::Null);
        }
        let repeated = field("c", FieldType::Integer).repeated();
        assert_eq!(convert_value(&repeated, RawValue::Null).unwrap(), ScalarValue::Null);
    }

    #[test]
    fn test_mismatch_carries_actual_value() {
        let f = field("c", FieldType::Integer);
        let err = convert_value(&f, RawValue::from("12")).unwrap_err();
        match err {
            Error::UnexpectedType {
                field_type,
                expected,
                actual,
            } => {
                assert_eq!(field_type, FieldType::Integer);
                assert_eq!(expected, "int64");
                assert_eq!(*actual, RawValue::from("12"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_requires_string() {
        let f = field("c", FieldType::Json);
        assert!(matches!(
            convert_value(&f, RawValue::Int64(1)),
            Err(Error::UnexpectedType { .. })
        ));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let f = field("c", FieldType::Unknown("VECTOR".into()));
        let err = convert_value(&f, RawValue::from("x")).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldType { .. }));
        assert!(err.to_string().contains("VECTOR"));
    }

    #[test]
    fn test_calendar_rendering() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let time = NaiveTime::from_hms_opt(7, 5, 3).unwrap();
        let precise = NaiveTime::from_hms_micro_opt(7, 5, 3, 250).unwrap();

        let d = convert_value(&field("d", FieldType::Date), RawValue::Date(date)).unwrap();
        assert_eq!(d.as_str(), Some("2024-02-29"));

        let t = convert_value(&field("t", FieldType::Time), RawValue::Time(time)).unwrap();
        assert_eq!(t.as_str(), Some("07:05:03"));

        let t = convert_value(&field("t", FieldType::Time), RawValue::Time(precise)).unwrap();
        assert_eq!(t.as_str(), Some("07:05:03.000250000"));

        let dt = convert_value(
            &field("dt", FieldType::DateTime),
            RawValue::DateTime(date.and_time(time)),
        )
        .unwrap();
        assert_eq!(dt.as_str(), Some("2024-02-29T07:05:03"));
    }

    #[test]
    fn test_calendar_rejects_string() {
        let f = field("d", FieldType::Date);
        assert!(matches!(
            convert_value(&f, RawValue::from("2024-02-29")),
            Err(Error::UnexpectedType { .. })
        ));
    }

    #[test]
    fn test_numeric_conversion() {
        let exact = BigRational::new(BigInt::from(25), BigInt::from(4));
        let inexact = BigRational::new(BigInt::from(1), BigInt::from(3));

        let numeric = field("n", FieldType::Numeric);
        assert_eq!(
            convert_value(&numeric, RawValue::Rational(exact.clone())).unwrap(),
            ScalarValue::from("6.25")
        );
        assert_eq!(
            convert_value(&numeric, RawValue::Rational(inexact.clone())).unwrap(),
            ScalarValue::from("0.333333333")
        );

        let big = field("b", FieldType::BigNumeric);
        assert_eq!(
            convert_value(&big, RawValue::Rational(exact)).unwrap(),
            ScalarValue::from("6.25")
        );
        let rendered = convert_value(&big, RawValue::Rational(inexact)).unwrap();
        assert_eq!(rendered.as_str().unwrap().len(), "0.".len() + 38);

        assert!(matches!(
            convert_value(&numeric, RawValue::Float64(6.25)),
            Err(Error::UnexpectedType { .. })
        ));
    }

    #[test]
    fn test_repeated_encodes_json_array() {
        let f = field("tags", FieldType::String).repeated();
        let value = convert_value(&f, RawValue::from(vec!["a", "b"])).unwrap();
        assert_eq!(decode(value), serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_repeated_rejects_scalar() {
        let f = field("tags", FieldType::String).repeated();
        let err = convert_value(&f, RawValue::from("a")).unwrap_err();
        assert!(matches!(err, Error::UnexpectedType { expected: "array", .. }));
    }

    #[test]
    fn test_repeated_element_error_propagates() {
        let f = field("ids", FieldType::Integer).repeated();
        let value = RawValue::Array(vec![RawValue::Int64(1), RawValue::from("2")]);
        assert!(matches!(
            convert_value(&f, value),
            Err(Error::UnexpectedType { expected: "int64", .. })
        ));
    }

    #[test]
    fn test_record_preserves_field_order() {
        let f = FieldSchema::record(
            "r",
            vec![
                field("zeta", FieldType::Integer),
                field("alpha", FieldType::String),
                field("when", FieldType::Date),
            ],
        );
        let value = RawValue::Array(vec![
            RawValue::Int64(1),
            RawValue::Null,
            RawValue::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()),
        ]);

        let bytes = match convert_value(&f, value).unwrap() {
            ScalarValue::Bytes(bytes) => bytes,
            other => panic!("expected bytes, got {other:?}"),
        };
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"zeta":1,"alpha":null,"when":"2020-01-02"}"#
        );
    }

    #[test]
    fn test_nested_repeated_records() {
        let f = FieldSchema::record(
            "points",
            vec![
                field("x", FieldType::Float),
                field("labels", FieldType::String).repeated(),
                field("raw", FieldType::Bytes),
            ],
        )
        .repeated();
        let value = RawValue::Array(vec![
            RawValue::Array(vec![
                RawValue::Float64(1.5),
                RawValue::from(vec!["a"]),
                RawValue::Bytes(b"hi".to_vec()),
            ]),
            RawValue::Null,
        ]);

        let json = decode(convert_value(&f, value).unwrap());
        assert_eq!(
            json,
            serde_json::json!([{"x": 1.5, "labels": ["a"], "raw": "aGk="}, null])
        );
    }

    #[test]
    fn test_record_arity_mismatch() {
        let f = FieldSchema::record("r", vec![field("a", FieldType::Integer)]);
        let value = RawValue::Array(vec![RawValue::Int64(1), RawValue::Int64(2)]);
        assert!(matches!(
            convert_value(&f, value),
            Err(Error::UnexpectedType { expected: "record", .. })
        ));
    }

    #[test]
    fn test_non_finite_float_in_nested_value() {
        let f = field("xs", FieldType::Float).repeated();
        let value = RawValue::Array(vec![
            RawValue::Float64(f64::NAN),
            RawValue::Float64(f64::INFINITY),
            RawValue::Float64(f64::NEG_INFINITY),
            RawValue::Float64(1.5),
        ]);
        assert_eq!(
            decode(convert_value(&f, value).unwrap()),
            serde_json::json!(["NaN", "Infinity", "-Infinity", 1.5])
        );

        let record = FieldSchema::record("r", vec![field("x", FieldType::Float)]);
        let value = RawValue::Array(vec![RawValue::Float64(f64::INFINITY)]);
        assert_eq!(
            decode(convert_value(&record, value).unwrap()),
            serde_json::json!({"x": "Infinity"})
        );

        let scalar = field("x", FieldType::Float);
        assert!(convert_value(&scalar, RawValue::Float64(f64::NAN)).is_ok());
    }

    #[test]
    fn test_convert_row_checks_width() {
        let schema = vec![field("a", FieldType::Integer), field("b", FieldType::Integer)];
        assert!(matches!(
            convert_row(&schema, vec![RawValue::Int64(1)]),
            Err(Error::Schema { .. })
        ));
        assert_eq!(
            convert_row(&schema, vec![RawValue::Int64(1), RawValue::Null]).unwrap(),
            vec![ScalarValue::Int64(1), ScalarValue::Null]
        );
    }
}
