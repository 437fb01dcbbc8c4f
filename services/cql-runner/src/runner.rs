use chrono::{NaiveDate, NaiveTime};
use cqlkit::types::Decimal;
use cqlkit::{CassError, Consistency, FromValue, Row, Session, Value};
use tracing::info;

/// Parse a command-line value as JSON, falling back to plain text.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::Text(raw.to_string()))
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::json;

    match value {
        Value::Text(s) => json!(s),
        Value::TinyInt(i) => json!(i),
        Value::SmallInt(i) => json!(i),
        Value::Int(i) => json!(i),
        Value::BigInt(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Double(d) => json!(d),
        Value::Boolean(b) => json!(b),
        Value::Blob(b) => json!(b.iter().map(|byte| format!("{:02x}", byte)).collect::<String>()),
        Value::Uuid(u) => json!(u.to_string()),
        Value::Timestamp(ms) => json!(ms),
        Value::Date(days) => NaiveDate::from_value(value)
            .map(|d| json!(d.to_string()))
            .unwrap_or_else(|_| json!(days)),
        Value::Time(nanos) => NaiveTime::from_value(value)
            .map(|t| json!(t.to_string()))
            .unwrap_or_else(|_| json!(nanos)),
        Value::Varint(v) => v.to_i64().map(|i| json!(i)).unwrap_or_else(|| json!(hex(&v.0))),
        Value::Decimal(d) => json!(decimal_string(d)),
        Value::Duration(d) => json!(format!("{}mo{}d{}ns", d.months, d.days, d.nanoseconds)),
        Value::Inet(addr) => json!(addr.to_string()),
        Value::List(items) | Value::Set(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (render_cell(k), value_to_json(v)))
                .collect(),
        ),
        Value::Tuple(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Udt(udt) => serde_json::Value::Object(
            udt.fields
                .iter()
                .map(|(name, v)| (name.clone(), value_to_json(v)))
                .collect(),
        ),
        Value::Null => serde_json::Value::Null,
    }
}

fn hex(bytes: &[u8]) -> String {
    let digits: String = bytes.iter().map(|byte| format!("{:02x}", byte)).collect();
    format!("0x{}", digits)
}

fn decimal_string(decimal: &Decimal) -> String {
    let Some(unscaled) = decimal.unscaled.to_i64() else {
        return format!("{}E{}", hex(&decimal.unscaled.0), -decimal.scale);
    };
    let sign = if unscaled < 0 { "-" } else { "" };
    let digits = unscaled.unsigned_abs().to_string();
    if decimal.scale <= 0 {
        let zeros = "0".repeat(decimal.scale.unsigned_abs() as usize);
        return format!("{}{}{}", sign, digits, zeros);
    }
    let scale = decimal.scale as usize;
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (whole, frac) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, whole, frac)
}

pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => match value_to_json(other) {
            serde_json::Value::String(s) => s,
            json => json.to_string(),
        },
    }
}

pub fn render_row(row: &Row, as_json: bool) -> String {
    if as_json {
        let object: serde_json::Map<String, serde_json::Value> = row
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let name = row.columns.get(i).cloned().unwrap_or_else(|| i.to_string());
                (name, value_to_json(v))
            })
            .collect();
        serde_json::Value::Object(object).to_string()
    } else {
        row.values
            .iter()
            .map(render_cell)
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// Run one statement and render every returned row.
pub async fn run_statement(
    session: &Session,
    statement: &str,
    values: Vec<Value>,
    consistency: Consistency,
    as_json: bool,
) -> Result<Vec<String>, CassError> {
    let mut iter = session
        .query(statement, values)
        .consistency(consistency)
        .iter()
        .await;

    let mut lines = Vec::new();
    if !as_json && !iter.columns().is_empty() {
        lines.push(iter.columns().join("\t"));
    }
    let mut count = 0;
    while let Some(row) = iter.scan::<Row>() {
        lines.push(render_row(&row, as_json));
        count += 1;
    }
    iter.close()?;

    info!("{} row(s) returned at {}", count, consistency);
    Ok(lines)
}
