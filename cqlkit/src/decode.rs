use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::errors::CassError;
use crate::types::{unix_epoch, CqlDuration, Decimal, Row, UdtValue, Value, Varint};

/// Conversion from a single column value into a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, CassError>;
}

fn mismatch(wanted: &str, got: &Value) -> CassError {
    CassError::Decode(format!("cannot decode {} as {}", got.type_name(), wanted))
}

macro_rules! impl_from_value {
    ($ty:ty, $name:literal, $($variant:ident),+) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, CassError> {
                match value {
                    $(Value::$variant(v) => Ok(v.clone().into()),)+
                    other => Err(mismatch($name, other)),
                }
            }
        }
    };
}

impl_from_value!(String, "text", Text);
impl_from_value!(i8, "tinyint", TinyInt);
impl_from_value!(i16, "smallint", SmallInt, TinyInt);
impl_from_value!(i32, "int", Int, SmallInt, TinyInt);
impl_from_value!(i64, "bigint", BigInt, Int, SmallInt, TinyInt);
impl_from_value!(f32, "float", Float);
impl_from_value!(f64, "double", Double, Float);
impl_from_value!(bool, "boolean", Boolean);
impl_from_value!(Vec<u8>, "blob", Blob);
impl_from_value!(Uuid, "uuid", Uuid);
impl_from_value!(IpAddr, "inet", Inet);
impl_from_value!(Varint, "varint", Varint);
impl_from_value!(Decimal, "decimal", Decimal);
impl_from_value!(CqlDuration, "duration", Duration);
impl_from_value!(UdtValue, "udt", Udt);

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, CassError> {
        match value {
            Value::Date(days) => unix_epoch()
                .checked_add_signed(TimeDelta::days(*days as i64))
                .ok_or_else(|| CassError::Decode(format!("date {} out of range", days))),
            other => Err(mismatch("date", other)),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> Result<Self, CassError> {
        match value {
            Value::Time(nanos) => {
                let secs = nanos.div_euclid(1_000_000_000);
                let frac = nanos.rem_euclid(1_000_000_000);
                u32::try_from(secs)
                    .ok()
                    .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, frac as u32))
                    .ok_or_else(|| CassError::Decode(format!("time {} out of range", nanos)))
            }
            other => Err(mismatch("time", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, CassError> {
        match value {
            Value::Timestamp(ms) => DateTime::<Utc>::from_timestamp_millis(*ms)
                .ok_or_else(|| CassError::Decode(format!("timestamp {} out of range", ms))),
            other => Err(mismatch("timestamp", other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, CassError> {
        Ok(value.clone())
    }
}

macro_rules! impl_from_value_for_tuple {
    ($count:literal; $($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: &Value) -> Result<Self, CassError> {
                match value {
                    Value::Tuple(items) if items.len() == $count => {
                        Ok(($($name::from_value(&items[$idx])?,)+))
                    }
                    Value::Tuple(items) => Err(CassError::Decode(format!(
                        "tuple has {} fields, destination expects {}",
                        items.len(),
                        $count
                    ))),
                    other => Err(mismatch("tuple", other)),
                }
            }
        }
    };
}

impl_from_value_for_tuple!(1; A: 0);
impl_from_value_for_tuple!(2; A: 0, B: 1);
impl_from_value_for_tuple!(3; A: 0, B: 1, C: 2);
impl_from_value_for_tuple!(4; A: 0, B: 1, C: 2, D: 3);

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, CassError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Conversion from a whole row into the destination of a scan.
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self, CassError>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self, CassError> {
        Ok(row)
    }
}

impl FromRow for Vec<Value> {
    fn from_row(row: Row) -> Result<Self, CassError> {
        Ok(row.values)
    }
}

fn check_arity(row: &Row, expected: usize) -> Result<(), CassError> {
    if row.len() != expected {
        return Err(CassError::Decode(format!(
            "row has {} columns, destination expects {}",
            row.len(),
            expected
        )));
    }
    Ok(())
}

macro_rules! impl_from_row_for_tuple {
    ($count:literal; $($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(row: Row) -> Result<Self, CassError> {
                check_arity(&row, $count)?;
                Ok(($($name::from_value(&row.values[$idx])?,)+))
            }
        }
    };
}

impl_from_row_for_tuple!(1; A: 0);
impl_from_row_for_tuple!(2; A: 0, B: 1);
impl_from_row_for_tuple!(3; A: 0, B: 1, C: 2);
impl_from_row_for_tuple!(4; A: 0, B: 1, C: 2, D: 3);
impl_from_row_for_tuple!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
impl_from_row_for_tuple!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_from_row_for_tuple!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_from_row_for_tuple!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
