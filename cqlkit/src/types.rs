use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single CQL value, either bound into a statement or read from a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Blob(Vec<u8>),
    Uuid(Uuid),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// Days since the Unix epoch.
    Date(i32),
    /// Nanoseconds since midnight.
    Time(i64),
    Varint(Varint),
    Decimal(Decimal),
    Duration(CqlDuration),
    Inet(IpAddr),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    Udt(UdtValue),
    Null,
}

/// Arbitrary-precision integer as signed big-endian two's complement bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Varint(pub Vec<u8>);

impl Varint {
    /// The value as an `i64`, or `None` when it does not fit.
    pub fn to_i64(&self) -> Option<i64> {
        let bytes = &self.0;
        let Some(&first) = bytes.first() else {
            return Some(0);
        };
        let fill = if first & 0x80 != 0 { 0xFF } else { 0x00 };
        let (head, tail) = bytes.split_at(bytes.len().saturating_sub(8));
        if head.iter().any(|&b| b != fill) {
            return None;
        }
        if !head.is_empty() && (tail[0] & 0x80 != 0) != (fill == 0xFF) {
            return None;
        }
        let mut buf = [fill; 8];
        buf[8 - tail.len()..].copy_from_slice(tail);
        Some(i64::from_be_bytes(buf))
    }
}

impl From<i64> for Varint {
    fn from(v: i64) -> Self {
        Varint(v.to_be_bytes().to_vec())
    }
}

/// `unscaled * 10^-scale`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decimal {
    pub unscaled: Varint,
    pub scale: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CqlDuration {
    pub months: i32,
    pub days: i32,
    pub nanoseconds: i64,
}

/// A user-defined type value with its fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdtValue {
    pub keyspace: String,
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

pub(crate) fn unix_epoch() -> NaiveDate {
    NaiveDate::default()
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::TinyInt(_) => "tinyint",
            Value::SmallInt(_) => "smallint",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Blob(_) => "blob",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Varint(_) => "varint",
            Value::Decimal(_) => "decimal",
            Value::Duration(_) => "duration",
            Value::Inet(_) => "inet",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Tuple(_) => "tuple",
            Value::Udt(_) => "udt",
            Value::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    String => Text,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    bool => Boolean,
    Vec<u8> => Blob,
    Uuid => Uuid,
    IpAddr => Inet,
    Varint => Varint,
    Decimal => Decimal,
    CqlDuration => Duration,
    UdtValue => Udt,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.timestamp_millis())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v.signed_duration_since(unix_epoch()).num_days() as i32)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v.num_seconds_from_midnight() as i64 * 1_000_000_000 + v.nanosecond() as i64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::BigInt(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Double(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (Value::Text(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// One result row: column values in select order plus their names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Row without column names, as produced by scripted results.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            columns: Vec::new(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }
}

/// Positional values bound to a statement.
///
/// Implemented for `()`, `Vec<Value>` and tuples of anything convertible
/// into [`Value`], so `session.query(text, (1_i32, "a"))` works without
/// spelling out each variant.
pub trait BindValues {
    fn into_values(self) -> Vec<Value>;
}

impl BindValues for () {
    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

impl BindValues for Vec<Value> {
    fn into_values(self) -> Vec<Value> {
        self
    }
}

impl BindValues for &[Value] {
    fn into_values(self) -> Vec<Value> {
        self.to_vec()
    }
}

macro_rules! impl_bind_values_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> BindValues for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_bind_values_for_tuple!(A);
impl_bind_values_for_tuple!(A, B);
impl_bind_values_for_tuple!(A, B, C);
impl_bind_values_for_tuple!(A, B, C, D);
impl_bind_values_for_tuple!(A, B, C, D, E);
impl_bind_values_for_tuple!(A, B, C, D, E, F);
impl_bind_values_for_tuple!(A, B, C, D, E, F, G);
impl_bind_values_for_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_to_value() {
        assert_eq!(Value::from(serde_json::json!(42)), Value::BigInt(42));
        assert_eq!(Value::from(serde_json::json!(1.5)), Value::Double(1.5));
        assert_eq!(Value::from(serde_json::json!("x")), Value::Text("x".to_string()));
        assert_eq!(Value::from(serde_json::json!(null)), Value::Null);
        assert_eq!(
            Value::from(serde_json::json!([1, true])),
            Value::List(vec![Value::BigInt(1), Value::Boolean(true)])
        );
    }

    #[test]
    fn test_tuple_bind_values() {
        let values = (1_i32, "a", Some(2_i64), None::<bool>).into_values();
        assert_eq!(
            values,
            vec![
                Value::Int(1),
                Value::Text("a".to_string()),
                Value::BigInt(2),
                Value::Null,
            ]
        );
        assert!(().into_values().is_empty());
    }

    #[test]
    fn test_row_lookup_by_name() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::Int(7), Value::from("seven")],
        );
        assert_eq!(row.get_by_name("name"), Some(&Value::Text("seven".to_string())));
        assert_eq!(row.get_by_name("missing"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_date_and_time_to_value() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 11).unwrap();
        assert_eq!(Value::from(date), Value::Date(10));
        let before = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert_eq!(Value::from(before), Value::Date(-1));

        let time = NaiveTime::from_hms_nano_opt(0, 0, 2, 5).unwrap();
        assert_eq!(Value::from(time), Value::Time(2_000_000_005));
    }

    #[test]
    fn test_varint_to_i64() {
        assert_eq!(Varint(vec![]).to_i64(), Some(0));
        assert_eq!(Varint(vec![0x01, 0x00]).to_i64(), Some(256));
        assert_eq!(Varint(vec![0xFF]).to_i64(), Some(-1));
        assert_eq!(Varint::from(i64::MIN).to_i64(), Some(i64::MIN));
        assert_eq!(Varint(vec![0x00, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).to_i64(), Some(i64::MAX));
        assert_eq!(Varint(vec![0x00, 0x80, 0, 0, 0, 0, 0, 0, 0]).to_i64(), None);
        assert_eq!(Varint(vec![0x01, 0, 0, 0, 0, 0, 0, 0, 0]).to_i64(), None);
    }

    #[test]
    fn test_datetime_to_timestamp() {
        let ts = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        assert_eq!(Value::from(ts), Value::Timestamp(1_700_000_000_123));
    }
}
