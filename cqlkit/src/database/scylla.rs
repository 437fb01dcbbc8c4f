use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scylla::frame::response::result::{ColumnType, CqlValue, Row as DriverRow};
use scylla::frame::value::{
    Counter, CqlDate, CqlDecimal, CqlDuration as DriverDuration, CqlTime, CqlTimestamp,
    CqlTimeuuid, CqlVarint,
};
use scylla::query::Query as DriverQuery;
use scylla::speculative_execution::SimpleSpeculativeExecutionPolicy;
use scylla::transport::execution_profile::ExecutionProfile;
use scylla::transport::session::PoolSize;
use scylla::{Session, SessionBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::{BufferedResultSet, Driver, ResultSet};
use crate::config::DatabaseConfig;
use crate::errors::CassError;
use crate::statement::Statement;
use crate::types::{CqlDuration, Decimal, Row, UdtValue, Value, Varint};

/// Driver backed by a `scylla::Session`, usable against ScyllaDB and
/// Cassandra 4.x alike.
pub struct ScyllaDriver {
    session: Arc<Session>,
    name: &'static str,
}

impl ScyllaDriver {
    /// Connect to the cluster described by `config`
    pub async fn connect(config: &DatabaseConfig, name: &'static str) -> Result<Self, CassError> {
        info!("Connecting to {} cluster: {:?}", name, config.hosts);

        let contact_points: Vec<String> = config
            .hosts
            .iter()
            .map(|h| format!("{}:{}", h, config.port))
            .collect();

        let pool_size = NonZeroUsize::new(config.pool_size as usize).unwrap_or(NonZeroUsize::MIN);

        let mut session_builder = SessionBuilder::new()
            .known_nodes(&contact_points)
            .pool_size(PoolSize::PerShard(pool_size))
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms));

        if !config.keyspace.is_empty() {
            session_builder = session_builder.use_keyspace(&config.keyspace, true);
        }

        // Add authentication if provided
        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            session_builder = session_builder.user(username, password);
        }

        let mut profile = ExecutionProfile::builder()
            .consistency(config.consistency.try_into()?)
            .request_timeout(Some(Duration::from_millis(config.request_timeout_ms)));

        if config.speculative_execution {
            info!("Speculative execution enabled (delay: {}ms)", config.speculative_delay_ms);
            let policy = SimpleSpeculativeExecutionPolicy {
                max_retry_count: 2,
                retry_interval: Duration::from_millis(config.speculative_delay_ms),
            };
            profile = profile.speculative_execution_policy(Some(Arc::new(policy)));
        }

        session_builder =
            session_builder.default_execution_profile_handle(profile.build().into_handle());

        let session = session_builder.build().await?;

        info!("Connected to {} keyspace: {:?}", name, config.keyspace);

        Ok(Self {
            session: Arc::new(session),
            name,
        })
    }

    /// Get the underlying Scylla session
    pub fn get_session(&self) -> &Session {
        &self.session
    }
}

fn to_driver_query(statement: &Statement) -> Result<DriverQuery, CassError> {
    let options = statement.options();
    let mut query = DriverQuery::new(statement.text());
    query.set_consistency(options.consistency.try_into()?);
    query.set_serial_consistency(options.serial_consistency.map(Into::into));
    query.set_timestamp(options.timestamp);
    query.set_request_timeout(options.request_timeout);
    query.set_is_idempotent(options.idempotent);
    Ok(query)
}

#[async_trait]
impl Driver for ScyllaDriver {
    async fn execute(&self, statement: &Statement) -> Result<Box<dyn ResultSet>, CassError> {
        let query = to_driver_query(statement)?;

        debug!(
            "Executing on {} at {}: {}",
            self.name,
            statement.consistency(),
            statement.text()
        );

        // The server type-checks bound values, so statements with values are
        // prepared first and each value is fitted to its column type.
        let result = if statement.values().is_empty() {
            self.session.query_unpaged(query, ()).await?
        } else {
            let prepared = self.session.prepare(query).await?;
            let types: Vec<ColumnType> = prepared
                .get_variable_col_specs()
                .iter()
                .map(|spec| spec.typ.clone())
                .collect();
            let values = bind_for_columns(statement.values(), &types)?;
            self.session.execute_unpaged(&prepared, values).await?
        };

        let columns: Vec<String> = result
            .col_specs()
            .iter()
            .map(|spec| spec.name.clone())
            .collect();

        let rows = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| row_from_driver(&columns, row))
            .collect();

        Ok(Box::new(BufferedResultSet::new(columns, rows)))
    }

    async fn health_check(&self) -> Result<(), CassError> {
        self.session
            .query_unpaged("SELECT now() FROM system.local", ())
            .await?;
        Ok(())
    }

    fn driver_name(&self) -> &str {
        self.name
    }
}

fn row_from_driver(columns: &[String], row: DriverRow) -> Result<Row, CassError> {
    let values = row
        .columns
        .into_iter()
        .map(|col| col.map(cql_to_value).unwrap_or(Ok(Value::Null)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Row::new(columns.to_vec(), values))
}

/// Convert a value read from the driver
fn cql_to_value(value: CqlValue) -> Result<Value, CassError> {
    let converted = match value {
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::Text(s),
        CqlValue::Boolean(b) => Value::Boolean(b),
        CqlValue::Blob(b) => Value::Blob(b),
        CqlValue::Counter(c) => Value::BigInt(c.0),
        CqlValue::Double(d) => Value::Double(d),
        CqlValue::Float(f) => Value::Float(f),
        CqlValue::Int(i) => Value::Int(i),
        CqlValue::BigInt(i) => Value::BigInt(i),
        CqlValue::SmallInt(i) => Value::SmallInt(i),
        CqlValue::TinyInt(i) => Value::TinyInt(i),
        CqlValue::Timestamp(ts) => Value::Timestamp(ts.0),
        CqlValue::Date(d) => Value::Date(date_from_driver(d)),
        CqlValue::Time(t) => Value::Time(t.0),
        CqlValue::Duration(d) => Value::Duration(CqlDuration {
            months: d.months,
            days: d.days,
            nanoseconds: d.nanoseconds,
        }),
        CqlValue::Varint(v) => Value::Varint(Varint(v.into_signed_bytes_be())),
        CqlValue::Decimal(d) => {
            let (unscaled, scale) = d.into_signed_be_bytes_and_exponent();
            Value::Decimal(Decimal {
                unscaled: Varint(unscaled),
                scale,
            })
        }
        CqlValue::Uuid(u) => Value::Uuid(u),
        CqlValue::Timeuuid(t) => Value::Uuid(t.into()),
        CqlValue::Inet(addr) => Value::Inet(addr),
        CqlValue::Empty => Value::Null,
        CqlValue::List(items) => Value::List(convert_all(items)?),
        CqlValue::Set(items) => Value::Set(convert_all(items)?),
        CqlValue::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok((cql_to_value(k)?, cql_to_value(v)?)))
                .collect::<Result<Vec<_>, CassError>>()?,
        ),
        CqlValue::Tuple(items) => Value::Tuple(
            items
                .into_iter()
                .map(optional_to_value)
                .collect::<Result<Vec<_>, CassError>>()?,
        ),
        CqlValue::UserDefinedType {
            keyspace,
            type_name,
            fields,
        } => Value::Udt(UdtValue {
            keyspace,
            type_name,
            fields: fields
                .into_iter()
                .map(|(name, v)| Ok((name, optional_to_value(v)?)))
                .collect::<Result<Vec<_>, CassError>>()?,
        }),
        #[allow(unreachable_patterns)]
        other => {
            return Err(CassError::Decode(format!(
                "unsupported column value: {:?}",
                other
            )))
        }
    };
    Ok(converted)
}

fn convert_all(items: Vec<CqlValue>) -> Result<Vec<Value>, CassError> {
    items.into_iter().map(cql_to_value).collect()
}

fn optional_to_value(value: Option<CqlValue>) -> Result<Value, CassError> {
    value.map(cql_to_value).unwrap_or(Ok(Value::Null))
}

// CQL dates count days from 2^31, which stands for the Unix epoch.
const DATE_EPOCH_OFFSET: i64 = 1 << 31;

fn date_from_driver(date: CqlDate) -> i32 {
    (date.0 as i64 - DATE_EPOCH_OFFSET) as i32
}

fn date_to_driver(days: i32) -> CqlDate {
    CqlDate((days as i64 + DATE_EPOCH_OFFSET) as u32)
}

/// Convert a bound value for the driver; `Null` is sent as a CQL null.
/// Null elements inside lists, sets and maps are dropped.
fn value_to_cql(value: &Value) -> Option<CqlValue> {
    let converted = match value {
        Value::Text(s) => CqlValue::Text(s.clone()),
        Value::TinyInt(i) => CqlValue::TinyInt(*i),
        Value::SmallInt(i) => CqlValue::SmallInt(*i),
        Value::Int(i) => CqlValue::Int(*i),
        Value::BigInt(i) => CqlValue::BigInt(*i),
        Value::Float(f) => CqlValue::Float(*f),
        Value::Double(d) => CqlValue::Double(*d),
        Value::Boolean(b) => CqlValue::Boolean(*b),
        Value::Blob(b) => CqlValue::Blob(b.clone()),
        Value::Uuid(u) => CqlValue::Uuid(*u),
        Value::Timestamp(ms) => CqlValue::Timestamp(CqlTimestamp(*ms)),
        Value::Date(days) => CqlValue::Date(date_to_driver(*days)),
        Value::Time(nanos) => CqlValue::Time(CqlTime(*nanos)),
        Value::Duration(d) => CqlValue::Duration(DriverDuration {
            months: d.months,
            days: d.days,
            nanoseconds: d.nanoseconds,
        }),
        Value::Varint(v) => CqlValue::Varint(CqlVarint::from_signed_bytes_be(v.0.clone())),
        Value::Decimal(d) => CqlValue::Decimal(CqlDecimal::from_signed_be_bytes_and_exponent(
            d.unscaled.0.clone(),
            d.scale,
        )),
        Value::Inet(addr) => CqlValue::Inet(*addr),
        Value::List(items) => CqlValue::List(items.iter().filter_map(value_to_cql).collect()),
        Value::Set(items) => CqlValue::Set(items.iter().filter_map(value_to_cql).collect()),
        Value::Map(entries) => CqlValue::Map(
            entries
                .iter()
                .filter_map(|(k, v)| Some((value_to_cql(k)?, value_to_cql(v)?)))
                .collect(),
        ),
        Value::Tuple(items) => CqlValue::Tuple(items.iter().map(value_to_cql).collect()),
        Value::Udt(udt) => CqlValue::UserDefinedType {
            keyspace: udt.keyspace.clone(),
            type_name: udt.type_name.clone(),
            fields: udt
                .fields
                .iter()
                .map(|(name, v)| (name.clone(), value_to_cql(v)))
                .collect(),
        },
        Value::Null => return None,
    };
    Some(converted)
}

/// Fit bound values to the column types of a prepared statement.
fn bind_for_columns(
    values: &[Value],
    types: &[ColumnType],
) -> Result<Vec<Option<CqlValue>>, CassError> {
    if values.len() != types.len() {
        return Err(CassError::Bind {
            expected: types.len(),
            supplied: values.len(),
        });
    }
    values
        .iter()
        .zip(types)
        .map(|(value, typ)| value_for_column(value, typ))
        .collect()
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::TinyInt(i) => Some(*i as i64),
        Value::SmallInt(i) => Some(*i as i64),
        Value::Int(i) => Some(*i as i64),
        Value::BigInt(i) => Some(*i),
        _ => None,
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T, CassError> {
    T::try_from(value)
        .map_err(|_| CassError::Encode(format!("value {} out of range for {}", value, column)))
}

fn parse_text<T: std::str::FromStr>(text: &str, column: &str) -> Result<T, CassError> {
    text.parse()
        .map_err(|_| CassError::Encode(format!("cannot encode {:?} as {}", text, column)))
}

fn integer_for_column(i: i64, typ: &ColumnType) -> Result<Option<CqlValue>, CassError> {
    let converted = match typ {
        ColumnType::TinyInt => CqlValue::TinyInt(narrow(i, "tinyint")?),
        ColumnType::SmallInt => CqlValue::SmallInt(narrow(i, "smallint")?),
        ColumnType::Int => CqlValue::Int(narrow(i, "int")?),
        ColumnType::BigInt => CqlValue::BigInt(i),
        ColumnType::Counter => CqlValue::Counter(Counter(i)),
        ColumnType::Varint => CqlValue::Varint(CqlVarint::from_signed_bytes_be(Varint::from(i).0)),
        ColumnType::Timestamp => CqlValue::Timestamp(CqlTimestamp(i)),
        ColumnType::Double => CqlValue::Double(i as f64),
        ColumnType::Float => CqlValue::Float(i as f32),
        _ => return Ok(None),
    };
    Ok(Some(converted))
}

/// Convert one bound value for a column of type `typ`. Integers are
/// narrowed with a range check, and text is parsed for uuid and inet
/// columns. Anything else converts as-is and is left to the driver's
/// type check.
fn value_for_column(value: &Value, typ: &ColumnType) -> Result<Option<CqlValue>, CassError> {
    if let Some(i) = as_integer(value) {
        if let Some(converted) = integer_for_column(i, typ)? {
            return Ok(Some(converted));
        }
    }

    let converted = match (typ, value) {
        (_, Value::Null) => return Ok(None),
        (ColumnType::Float, Value::Double(d)) => CqlValue::Float(*d as f32),
        (ColumnType::Double, Value::Float(f)) => CqlValue::Double(*f as f64),
        (ColumnType::Ascii, Value::Text(s)) => CqlValue::Ascii(s.clone()),
        (ColumnType::Uuid, Value::Text(s)) => CqlValue::Uuid(parse_text(s, "uuid")?),
        (ColumnType::Timeuuid, Value::Text(s)) => {
            CqlValue::Timeuuid(CqlTimeuuid::from(parse_text::<Uuid>(s, "timeuuid")?))
        }
        (ColumnType::Timeuuid, Value::Uuid(u)) => CqlValue::Timeuuid(CqlTimeuuid::from(*u)),
        (ColumnType::Inet, Value::Text(s)) => CqlValue::Inet(parse_text(s, "inet")?),
        (ColumnType::List(inner), Value::List(items) | Value::Set(items)) => {
            CqlValue::List(fit_elements(items, inner)?)
        }
        (ColumnType::Set(inner), Value::List(items) | Value::Set(items)) => {
            CqlValue::Set(fit_elements(items, inner)?)
        }
        (ColumnType::Map(key_type, value_type), Value::Map(entries)) => CqlValue::Map(
            entries
                .iter()
                .filter_map(|(k, v)| {
                    match (value_for_column(k, key_type), value_for_column(v, value_type)) {
                        (Ok(Some(k)), Ok(Some(v))) => Some(Ok((k, v))),
                        (Err(e), _) | (_, Err(e)) => Some(Err(e)),
                        _ => None,
                    }
                })
                .collect::<Result<Vec<_>, CassError>>()?,
        ),
        (_, v) => return Ok(value_to_cql(v)),
    };
    Ok(Some(converted))
}

fn fit_elements(items: &[Value], typ: &ColumnType) -> Result<Vec<CqlValue>, CassError> {
    items
        .iter()
        .filter_map(|item| value_for_column(item, typ).transpose())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::{Consistency, SerialConsistency};
    use crate::statement::QueryOptions;

    #[test]
    fn test_value_to_cql() {
        assert_eq!(value_to_cql(&Value::BigInt(42)), Some(CqlValue::BigInt(42)));
        assert_eq!(
            value_to_cql(&Value::Timestamp(1_000)),
            Some(CqlValue::Timestamp(CqlTimestamp(1_000)))
        );
        assert_eq!(value_to_cql(&Value::Null), None);
    }

    #[test]
    fn test_cql_to_value() {
        assert_eq!(
            cql_to_value(CqlValue::Ascii("a".to_string())).unwrap(),
            Value::Text("a".to_string())
        );
        assert_eq!(
            cql_to_value(CqlValue::List(vec![CqlValue::Int(1), CqlValue::Int(2)])).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(cql_to_value(CqlValue::Empty).unwrap(), Value::Null);
    }

    #[test]
    fn test_timeuuid_column_decodes_as_uuid() {
        let id = Uuid::parse_str("8e14e760-7fa8-11eb-bc66-000000000001").unwrap();
        let row = DriverRow {
            columns: vec![Some(CqlValue::Timeuuid(CqlTimeuuid::from(id)))],
        };
        let row = row_from_driver(&["now()".to_string()], row).unwrap();
        assert_eq!(row.values, vec![Value::Uuid(id)]);
    }

    #[test]
    fn test_date_and_time_columns() {
        assert_eq!(cql_to_value(CqlValue::Date(CqlDate(1 << 31))).unwrap(), Value::Date(0));
        assert_eq!(
            cql_to_value(CqlValue::Date(CqlDate((1 << 31) - 1))).unwrap(),
            Value::Date(-1)
        );
        assert_eq!(value_to_cql(&Value::Date(19_000)), Some(CqlValue::Date(CqlDate((1 << 31) + 19_000))));
        assert_eq!(
            cql_to_value(CqlValue::Time(CqlTime(3_600_000_000_000))).unwrap(),
            Value::Time(3_600_000_000_000)
        );
    }

    #[test]
    fn test_varint_and_decimal_columns() {
        let varint = CqlVarint::from_signed_bytes_be(vec![0x01, 0x00]);
        assert_eq!(
            cql_to_value(CqlValue::Varint(varint)).unwrap(),
            Value::Varint(Varint(vec![0x01, 0x00]))
        );

        let decimal = CqlDecimal::from_signed_be_bytes_and_exponent(vec![0x30, 0x39], 2);
        assert_eq!(
            cql_to_value(CqlValue::Decimal(decimal)).unwrap(),
            Value::Decimal(Decimal {
                unscaled: Varint(vec![0x30, 0x39]),
                scale: 2,
            })
        );
    }

    #[test]
    fn test_duration_column() {
        let duration = DriverDuration {
            months: 1,
            days: 2,
            nanoseconds: 3,
        };
        assert_eq!(
            cql_to_value(CqlValue::Duration(duration)).unwrap(),
            Value::Duration(CqlDuration {
                months: 1,
                days: 2,
                nanoseconds: 3,
            })
        );
    }

    #[test]
    fn test_tuple_and_udt_columns() {
        let tuple = CqlValue::Tuple(vec![Some(CqlValue::Int(1)), None]);
        assert_eq!(
            cql_to_value(tuple).unwrap(),
            Value::Tuple(vec![Value::Int(1), Value::Null])
        );

        let udt = CqlValue::UserDefinedType {
            keyspace: "ks".to_string(),
            type_name: "address".to_string(),
            fields: vec![
                ("city".to_string(), Some(CqlValue::Text("Oslo".to_string()))),
                ("zip".to_string(), None),
            ],
        };
        let expected = Value::Udt(UdtValue {
            keyspace: "ks".to_string(),
            type_name: "address".to_string(),
            fields: vec![
                ("city".to_string(), Value::Text("Oslo".to_string())),
                ("zip".to_string(), Value::Null),
            ],
        });
        assert_eq!(cql_to_value(udt.clone()).unwrap(), expected);
        assert_eq!(value_to_cql(&expected), Some(udt));
    }

    #[test]
    fn test_integers_narrowed_to_column_type() {
        let values = vec![Value::BigInt(5), Value::BigInt(-3), Value::BigInt(7), Value::Int(9)];
        let types = vec![
            ColumnType::Int,
            ColumnType::SmallInt,
            ColumnType::TinyInt,
            ColumnType::BigInt,
        ];
        assert_eq!(
            bind_for_columns(&values, &types).unwrap(),
            vec![
                Some(CqlValue::Int(5)),
                Some(CqlValue::SmallInt(-3)),
                Some(CqlValue::TinyInt(7)),
                Some(CqlValue::BigInt(9)),
            ]
        );
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        let err = bind_for_columns(&[Value::BigInt(70_000)], &[ColumnType::SmallInt]).unwrap_err();
        assert_eq!(
            err,
            CassError::Encode("value 70000 out of range for smallint".to_string())
        );
        assert!(bind_for_columns(&[Value::BigInt(i64::MAX)], &[ColumnType::Int]).is_err());
    }

    #[test]
    fn test_text_and_collections_fitted_to_column_type() {
        let id = "8e14e760-7fa8-11eb-bc66-000000000001";
        let values = vec![
            Value::Text(id.to_string()),
            Value::Text("10.0.0.1".to_string()),
            Value::List(vec![Value::BigInt(1), Value::BigInt(2)]),
            Value::Double(1.5),
            Value::Null,
        ];
        let types = vec![
            ColumnType::Timeuuid,
            ColumnType::Inet,
            ColumnType::Set(Box::new(ColumnType::Int)),
            ColumnType::Float,
            ColumnType::Int,
        ];
        let bound = bind_for_columns(&values, &types).unwrap();
        assert_eq!(
            bound[0],
            Some(CqlValue::Timeuuid(CqlTimeuuid::from(Uuid::parse_str(id).unwrap())))
        );
        assert_eq!(bound[1], Some(CqlValue::Inet("10.0.0.1".parse().unwrap())));
        assert_eq!(
            bound[2],
            Some(CqlValue::Set(vec![CqlValue::Int(1), CqlValue::Int(2)]))
        );
        assert_eq!(bound[3], Some(CqlValue::Float(1.5)));
        assert_eq!(bound[4], None);

        let err = bind_for_columns(&[Value::Text("nope".to_string())], &[ColumnType::Uuid]).unwrap_err();
        assert!(matches!(err, CassError::Encode(_)));
    }

    #[test]
    fn test_prepared_marker_count_mismatch() {
        let err = bind_for_columns(&[Value::Int(1)], &[ColumnType::Int, ColumnType::Int]).unwrap_err();
        assert_eq!(err, CassError::Bind { expected: 2, supplied: 1 });
    }

    #[test]
    fn test_row_nulls() {
        let row = DriverRow {
            columns: vec![Some(CqlValue::Int(3)), None],
        };
        let columns = vec!["a".to_string(), "b".to_string()];
        let row = row_from_driver(&columns, row).unwrap();
        assert_eq!(row.values, vec![Value::Int(3), Value::Null]);
        assert_eq!(row.get_by_name("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_driver_query_options() {
        let options = QueryOptions {
            consistency: Consistency::LOCAL_QUORUM,
            serial_consistency: Some(SerialConsistency::LocalSerial),
            timestamp: Some(12),
            request_timeout: None,
            idempotent: true,
        };
        let statement = Statement::new("SELECT a FROM t", options);
        let query = to_driver_query(&statement).unwrap();
        assert_eq!(
            query.get_consistency(),
            Some(scylla::statement::Consistency::LocalQuorum)
        );
        assert_eq!(query.get_timestamp(), Some(12));
        assert!(query.get_is_idempotent());
    }

    #[test]
    fn test_unknown_consistency_rejected_before_send() {
        let options = QueryOptions {
            consistency: Consistency::from_code(0xFF),
            ..Default::default()
        };
        let statement = Statement::new("SELECT a FROM t", options);
        assert_eq!(to_driver_query(&statement).err().unwrap(), CassError::Unsupported);
    }

    #[tokio::test]
    #[ignore] // Requires running ScyllaDB instance
    async fn test_scylla_health_check() {
        let driver = ScyllaDriver::connect(&DatabaseConfig::default(), "scylla")
            .await
            .unwrap();
        assert!(driver.health_check().await.is_ok());
    }
}
