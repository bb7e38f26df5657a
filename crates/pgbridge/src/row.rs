//! Decoding result rows into JSON objects.

use crate::error::{BridgeError, BridgeResult};
use crate::value::is_textual;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

/// A decoded row: column name to JSON value, in column order.
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

fn get<'a, T>(row: &'a Row, idx: usize, name: &str) -> BridgeResult<Option<T>>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| BridgeError::decode(name, e.to_string()))
}

fn to_json<T>(value: Option<T>, f: impl FnOnce(T) -> serde_json::Value) -> serde_json::Value {
    value.map(f).unwrap_or(serde_json::Value::Null)
}

fn float_to_json(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn decimal_to_json(d: Decimal) -> serde_json::Value {
    let text = d.normalize().to_string();
    match serde_json::Number::from_str(&text) {
        Ok(n) => serde_json::Value::Number(n),
        Err(_) => serde_json::Value::String(text),
    }
}

/// Decode one column of `row` by its Postgres type.
pub fn column_to_json(row: &Row, idx: usize) -> BridgeResult<serde_json::Value> {
    let Some(column) = row.columns().get(idx) else {
        return Err(BridgeError::decode(
            format!("#{idx}"),
            format!("column index out of range (row has {} columns)", row.len()),
        ));
    };
    let name = column.name();
    let ty = column.type_();

    let value = match *ty {
        Type::BOOL => to_json(get::<bool>(row, idx, name)?, serde_json::Value::Bool),
        Type::INT2 => to_json(get::<i16>(row, idx, name)?, serde_json::Value::from),
        Type::INT4 => to_json(get::<i32>(row, idx, name)?, serde_json::Value::from),
        Type::INT8 => to_json(get::<i64>(row, idx, name)?, serde_json::Value::from),
        Type::OID => to_json(get::<u32>(row, idx, name)?, serde_json::Value::from),
        Type::FLOAT4 => to_json(get::<f32>(row, idx, name)?, |f| float_to_json(f.into())),
        Type::FLOAT8 => to_json(get::<f64>(row, idx, name)?, float_to_json),
        Type::NUMERIC => to_json(get::<Decimal>(row, idx, name)?, decimal_to_json),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx, name)?
            .unwrap_or(serde_json::Value::Null),
        Type::UUID => to_json(get::<uuid::Uuid>(row, idx, name)?, |u| {
            serde_json::Value::String(u.to_string())
        }),
        Type::DATE => to_json(get::<NaiveDate>(row, idx, name)?, |d| {
            serde_json::Value::String(d.to_string())
        }),
        Type::TIME => to_json(get::<NaiveTime>(row, idx, name)?, |t| {
            serde_json::Value::String(t.to_string())
        }),
        Type::TIMESTAMP => to_json(get::<NaiveDateTime>(row, idx, name)?, |ts| {
            serde_json::Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        Type::TIMESTAMPTZ => to_json(get::<DateTime<Utc>>(row, idx, name)?, |ts| {
            serde_json::Value::String(ts.to_rfc3339())
        }),
        _ if is_textual(ty) => to_json(get::<String>(row, idx, name)?, serde_json::Value::String),
        _ => {
            return Err(BridgeError::decode(
                name,
                format!("unsupported column type '{ty}'"),
            ));
        }
    };
    Ok(value)
}

/// Decode a whole row into a JSON object keyed by column name.
pub fn row_to_json(row: &Row) -> BridgeResult<JsonRow> {
    let mut out = JsonRow::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), column_to_json(row, idx)?);
    }
    Ok(out)
}

/// Decode every row.
pub fn rows_to_json(rows: &[Row]) -> BridgeResult<Vec<JsonRow>> {
    rows.iter().map(row_to_json).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_become_numbers() {
        assert_eq!(
            decimal_to_json(Decimal::from_str("12.50").unwrap()),
            serde_json::json!(12.5)
        );
        assert_eq!(decimal_to_json(Decimal::from(7)), serde_json::json!(7));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(float_to_json(f64::NAN), serde_json::Value::Null);
        assert_eq!(float_to_json(1.25), serde_json::json!(1.25));
    }
}
