//! Conversión de valores entre la forma del formulario y la forma canónica.

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use rx_domain::ValueKind;
use serde_json::{Number, Value};

use crate::config::EngineConfig;
use crate::constants::ISO_TIMESTAMP_PATTERN;

/// Representación textual de un valor JSON; `null` no tiene texto.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Reinterpreta una fecha de `from` a `to`; `None` si no encaja en `from`.
pub fn reformat_date(raw: &str, from: &str, to: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw, from).ok().map(|d| d.format(to).to_string())
}

/// Convierte un valor del formulario a su tipo canónico según la columna.
/// Lo que no se puede convertir se devuelve sin cambios.
pub fn to_canonical_value(kind: ValueKind, value: &Value, config: &EngineConfig) -> Value {
    let Value::String(raw) = value else {
        return value.clone();
    };
    let converted = match kind {
        ValueKind::String => return value.clone(),
        ValueKind::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
        ValueKind::Decimal => raw.trim()
                                 .parse::<f64>()
                                 .ok()
                                 .and_then(Number::from_f64)
                                 .map(Value::Number),
        ValueKind::Boolean => match raw.trim() {
            "Y" | "y" | "true" | "TRUE" | "True" => Some(Value::Bool(true)),
            "N" | "n" | "false" | "FALSE" | "False" => Some(Value::Bool(false)),
            _ => None,
        },
        ValueKind::Date => reformat_date(raw, &config.display_date_pattern, &config.default_date_pattern)
            .or_else(|| reformat_date(raw, &config.default_date_pattern, &config.default_date_pattern))
            .map(Value::String),
        ValueKind::DateTime => NaiveDateTime::parse_from_str(raw, &config.input_datetime_pattern)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, ISO_TIMESTAMP_PATTERN))
            .ok()
            .map(|dt| Value::String(dt.format(ISO_TIMESTAMP_PATTERN).to_string())),
    };
    match converted {
        Some(v) => v,
        None => {
            if !raw.is_empty() {
                warn!("value {raw:?} does not convert to {kind:?}, kept as text");
            }
            value.clone()
        }
    }
}
