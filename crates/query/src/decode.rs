//! Shared helpers for turning database values into JSON.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use relaybot_core::error::QueryError;
use serde_json::{Number, Value};

/// A float as a JSON number; NaN and infinities become `null`.
pub(crate) fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// DECIMAL text as a JSON number when it parses, otherwise as the text.
pub(crate) fn decimal(text: String) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => float(f),
        _ => Value::String(text),
    }
}

/// Binary data as a base64 string.
pub(crate) fn bytes(data: Vec<u8>) -> Value {
    Value::String(STANDARD.encode(data))
}

pub(crate) fn decode_error(column: &str, e: sqlx::Error) -> QueryError {
    QueryError::Decode {
        column: column.to_string(),
        reason: e.to_string(),
    }
}

/// Classify a driver error as a connection or an execution failure.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> QueryError {
    match e {
        sqlx::Error::Database(db) => QueryError::Execution(db.message().to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => QueryError::Connection(e.to_string()),
        other => QueryError::Execution(other.to_string()),
    }
}
