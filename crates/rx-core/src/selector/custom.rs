//! Resolución por consulta declarativa propia del selector.
//!
//! La plantilla recibe los filtros adicionales en `@additional_filters@`,
//! el resultado completo se materializa (sin paginar) y se normaliza antes
//! de buscar la fila. Cualquier fallo de esta ruta (plantilla, filtro de
//! script, motor de consultas, candidato no encontrado) se registra y se
//! devuelve como `QueryExecution` con el mensaje original.

use log::{debug, error};
use rx_domain::{Payload, ResultShape};
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::constants::ISO_TIMESTAMP_PATTERN;
use crate::errors::UpsertError;
use crate::filter::{apply_additional_filters, flatten_payload, headless_filter_clause, script_filter_clause,
                    substitute_session_variables};
use crate::naming::NameTranslator;
use crate::ports::{FilterExpressionEvaluator, QueryEngine, QueryRow, QueryValue};
use crate::scope::RequestScope;
use crate::selector::outfields::extract_outfields;
use crate::selector::SelectorTarget;
use crate::values::as_text;

pub struct CustomQuerySelectorResolver<'a> {
    engine: &'a dyn QueryEngine,
    evaluator: Option<&'a dyn FilterExpressionEvaluator>,
    config: &'a EngineConfig,
}

impl<'a> CustomQuerySelectorResolver<'a> {
    pub fn new(engine: &'a dyn QueryEngine,
               evaluator: Option<&'a dyn FilterExpressionEvaluator>,
               config: &'a EngineConfig)
               -> Self {
        Self { engine, evaluator, config }
    }

    pub fn resolve(&self,
                   scope: &RequestScope,
                   target: &SelectorTarget<'_>,
                   translator: &NameTranslator,
                   payload: &mut Payload)
                   -> Result<Vec<String>, UpsertError> {
        self.resolve_row(scope, target, translator, payload).map_err(|e| {
            error!("selector {}: {e}", target.selector.id);
            match e {
                UpsertError::QueryExecution(message) => UpsertError::QueryExecution(message),
                other => UpsertError::QueryExecution(other.to_string()),
            }
        })
    }

    fn resolve_row(&self,
                   scope: &RequestScope,
                   target: &SelectorTarget<'_>,
                   translator: &NameTranslator,
                   payload: &mut Payload)
                   -> Result<Vec<String>, UpsertError> {
        let selector = target.selector;
        let text = self.build_query(scope, target, translator, payload)?;
        let value_key = selector.value_field()
                                .map(|f| f.result_key(ResultShape::ColumnAlias))
                                .ok_or_else(|| UpsertError::ReferenceNotFound(selector.id.clone()))?;

        debug!("selector {}: executing custom query", selector.id);
        let rows = self.engine
                       .query(scope, &text, self.config.custom_query_max_rows)
                       .map_err(|e| UpsertError::QueryExecution(e.to_string()))?;

        let found = rows.iter()
                        .map(|r| normalize_row(r, self.config))
                        .find(|row| row.get(&value_key).and_then(as_text).as_deref() == Some(target.record_id.as_str()));
        match found {
            Some(row) => Ok(extract_outfields(selector, ResultShape::ColumnAlias, &row, target.changed_input, payload)),
            None => {
                debug!("selector {}: record {} not in {} rows", selector.id, target.record_id, rows.len());
                Err(UpsertError::RecordNotFound { selector_id: selector.id.clone(),
                                                  record_id: target.record_id.clone() })
            }
        }
    }

    /// Texto final de la consulta: filtros adicionales insertados y
    /// variables de sesión sustituidas.
    pub fn build_query(&self,
                       scope: &RequestScope,
                       target: &SelectorTarget<'_>,
                       translator: &NameTranslator,
                       payload: &Payload)
                       -> Result<String, UpsertError> {
        let template = target.selector
                             .query
                             .as_deref()
                             .filter(|q| !q.trim().is_empty())
                             .ok_or_else(|| UpsertError::ReferenceNotFound(target.selector.id.clone()))?;
        let parameters = flatten_payload(payload);
        let headless = headless_filter_clause(target.field, target.changed_input, payload);
        let script = script_filter_clause(self.evaluator, scope, target.selector, &parameters)?;
        let query = apply_additional_filters(template, &format!("{headless}{script}"));
        Ok(substitute_session_variables(&query, translator, payload))
    }
}

/// Reduce un valor de consulta a JSON: entidades a su id, fechas a
/// `yyyy-MM-dd`, timestamps a ISO-8601 con milisegundos.
pub fn normalize_query_value(value: &QueryValue, config: &EngineConfig) -> Value {
    match value {
        QueryValue::Null => Value::Null,
        QueryValue::Text(s) => Value::String(s.clone()),
        QueryValue::Number(n) => Value::Number(n.clone()),
        QueryValue::Bool(b) => Value::Bool(*b),
        QueryValue::Date(d) => Value::String(d.format(&config.default_date_pattern).to_string()),
        QueryValue::Timestamp(ts) => Value::String(ts.format(ISO_TIMESTAMP_PATTERN).to_string()),
        QueryValue::Entity { id, .. } => id.clone().map(Value::String).unwrap_or(Value::Null),
    }
}

pub fn normalize_row(row: &QueryRow, config: &EngineConfig) -> Map<String, Value> {
    row.iter().map(|(k, v)| (k.clone(), normalize_query_value(v, config))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn query_values_are_normalized() {
        let cfg = EngineConfig::default();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap_or_default();
        let ts = date.and_hms_milli_opt(13, 5, 9, 250).unwrap_or_default();
        assert_eq!(normalize_query_value(&QueryValue::Date(date), &cfg), json!("2024-02-29"));
        assert_eq!(normalize_query_value(&QueryValue::Timestamp(ts), &cfg), json!("2024-02-29T13:05:09.250Z"));
        assert_eq!(normalize_query_value(&QueryValue::Entity { id: Some("U-1".into()), display: "Unit".into() }, &cfg),
                   json!("U-1"));
        assert_eq!(normalize_query_value(&QueryValue::Entity { id: None, display: "-".into() }, &cfg), Value::Null);
        assert_eq!(normalize_query_value(&QueryValue::Number(7.into()), &cfg), json!(7));
        assert_eq!(normalize_query_value(&QueryValue::Text("a".into()), &cfg), json!("a"));
    }
}
