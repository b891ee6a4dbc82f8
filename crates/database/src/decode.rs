use crate::driver::Row;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgRow, PgValueRef};
use sqlx::{Column, Row as _, TypeInfo, Value, ValueRef};
use uuid::Uuid;

/// Converts a whole row into a column -> JSON map.
pub fn row_to_json(row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = row.try_get_raw(column.ordinal())?;
        out.insert(column.name().to_string(), to_json(value)?);
    }
    Ok(out)
}

/// Convert a PostgreSQL value to a JSON value.
///
/// NUMERIC is rendered as a string to keep its precision, timestamps as
/// RFC 3339 / ISO 8601 strings and BYTEA as base64.
pub fn to_json(value: PgValueRef<'_>) -> Result<JsonValue, sqlx::Error> {
    if value.is_null() {
        return Ok(JsonValue::Null);
    }

    let owned = ValueRef::to_owned(&value);
    let type_name = value.type_info().name().to_string();

    let result = match type_name.as_str() {
        "BOOL" => owned.try_decode::<bool>().map(JsonValue::Bool),
        "INT2" => owned.try_decode::<i16>().map(JsonValue::from),
        "INT4" => owned.try_decode::<i32>().map(JsonValue::from),
        "INT8" => owned.try_decode::<i64>().map(JsonValue::from),
        "OID" => owned.try_decode::<sqlx::postgres::types::Oid>().map(|oid| JsonValue::from(oid.0)),
        "FLOAT4" => owned.try_decode::<f32>().map(|v| JsonValue::from(f64::from(v))),
        "FLOAT8" => owned.try_decode::<f64>().map(JsonValue::from),
        "NUMERIC" => owned.try_decode::<Decimal>().map(|d| JsonValue::String(d.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            owned.try_decode::<String>().map(JsonValue::String)
        }
        "JSON" | "JSONB" => owned.try_decode::<JsonValue>(),
        "UUID" => owned.try_decode::<Uuid>().map(|u| JsonValue::String(u.to_string())),
        "DATE" => owned.try_decode::<NaiveDate>().map(|d| JsonValue::String(d.to_string())),
        "TIME" => owned.try_decode::<NaiveTime>().map(|t| JsonValue::String(t.to_string())),
        "TIMESTAMP" => owned
            .try_decode::<NaiveDateTime>()
            .map(|dt| JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => owned
            .try_decode::<DateTime<Utc>>()
            .map(|dt| JsonValue::String(dt.to_rfc3339())),
        "BYTEA" => owned
            .try_decode::<Vec<u8>>()
            .map(|bytes| JsonValue::String(base64_encode(&bytes))),
        // For unknown types, try to decode as text
        _ => owned
            .try_decode_unchecked::<String>()
            .map(JsonValue::String)
            .map_err(|_| {
                sqlx::Error::Decode(format!("Unsupported PostgreSQL type: {type_name}").into())
            }),
    };

    result.map_err(|e| match e {
        sqlx::Error::Decode(_) => e,
        other => sqlx::Error::Decode(format!("Failed to decode {type_name} value: {other}").into()),
    })
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Binds a JSON value as the next positional parameter.
///
/// Integers bind as INT8, other numbers as FLOAT8, strings as TEXT and
/// arrays/objects as JSONB. NULL is sent typed as TEXT, so statements may
/// need an explicit cast (`$1::int`) where PostgreSQL cannot coerce it.
pub fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    value: &JsonValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match value {
        JsonValue::Null => query.bind(None::<String>),
        JsonValue::Bool(b) => query.bind(*b),
        JsonValue::Number(number) => {
            if let Some(int_val) = number.as_i64() {
                query.bind(int_val)
            } else {
                query.bind(number.as_f64().unwrap_or_default())
            }
        }
        JsonValue::String(s) => query.bind(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => query.bind(sqlx::types::Json(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode() {
        assert_eq!(base64_encode(b"hello"), "aGVsbG8=");
        assert_eq!(base64_encode(&[0, 0, 0]), "AAAA");
        assert_eq!(base64_encode(&[]), "");
    }
}
