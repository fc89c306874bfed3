//! Invocación en dos fases del inicializador de formularios.
//!
//! Fase 1 ("defaults"): sin campo cambiado y contenido vacío. Fase 2
//! ("single change"): con el campo cambiado y el payload de trabajo como
//! contenido, para disparar sus callouts. Las llamadas pueden tener efectos
//! secundarios, así que nunca se reintentan; un fallo en la fase 2 invalida
//! toda la operación.

use log::debug;
use rx_domain::Payload;
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::errors::UpsertError;
use crate::naming::NameTranslator;
use crate::ports::{FormInitParams, FormInitializer, FormMode};
use crate::scope::RequestScope;
use crate::values::reformat_date;

const CLASSIC_VALUE: &str = "classicValue";

/// Identidad del formulario simulado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayTarget {
    pub mode: FormMode,
    pub definition_id: String,
    pub parent_id: Option<String>,
    pub record_id: Option<String>,
}

pub struct ReplayInvoker<'a> {
    initializer: &'a dyn FormInitializer,
    translator: &'a NameTranslator,
    config: &'a EngineConfig,
}

impl<'a> ReplayInvoker<'a> {
    pub fn new(initializer: &'a dyn FormInitializer, translator: &'a NameTranslator, config: &'a EngineConfig) -> Self {
        Self { initializer, translator, config }
    }

    /// Fase 1. Devuelve los defaults en forma input.
    pub fn defaults(&self, scope: &RequestScope, target: &ReplayTarget) -> Result<Payload, UpsertError> {
        self.replay(scope, target, None, &Value::Object(Map::new()))
    }

    /// Fase 2. `changed_input` es el nombre de input del campo cambiado.
    pub fn single_change(&self,
                         scope: &RequestScope,
                         target: &ReplayTarget,
                         changed_input: &str,
                         working: &Payload)
                         -> Result<Payload, UpsertError> {
        self.replay(scope, target, Some(changed_input), &Value::Object(working.clone()))
    }

    pub fn replay(&self,
                  scope: &RequestScope,
                  target: &ReplayTarget,
                  changed_field: Option<&str>,
                  content: &Value)
                  -> Result<Payload, UpsertError> {
        let params = FormInitParams { mode: target.mode,
                                      definition_id: target.definition_id.clone(),
                                      parent_id: target.parent_id.clone(),
                                      record_id: target.record_id.clone(),
                                      changed_field: changed_field.map(str::to_string) };
        debug!("form initializer {} mode={} changed={:?}",
               target.definition_id,
               target.mode.as_str(),
               changed_field);
        let response = self.initializer
                           .execute(scope, &params, content)
                           .map_err(|e| UpsertError::FormInitialization(e.to_string()))?;
        let columns = column_values(&response)?;
        Ok(self.to_input_values(columns))
    }

    /// Columnas físicas → inputs. Sólo se conservan columnas conocidas y con
    /// nombre normalizado; los valores nulos o vacíos se ignoran.
    fn to_input_values(&self, columns: &Map<String, Value>) -> Payload {
        let mut out = Payload::new();
        for (db_name, descriptor) in columns {
            let Some(input) = self.translator.input_for_db(db_name) else {
                debug!("column {db_name} is not part of definition {}", self.translator.definition_id());
                continue;
            };
            if self.translator.is_unmapped_input(input) {
                continue;
            }
            match extract_value(descriptor, self.config) {
                Some(Value::String(s)) if s.is_empty() => {}
                Some(v) => {
                    out.insert(input.to_string(), v);
                }
                None => {}
            }
        }
        out
    }
}

/// Extrae `columnValues` o convierte el sobre de error en
/// `FormInitialization`.
fn column_values(response: &Value) -> Result<&Map<String, Value>, UpsertError> {
    if let Some(message) = response.pointer("/response/error/message") {
        let message = message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string());
        return Err(UpsertError::FormInitialization(message));
    }
    response.get("columnValues")
            .and_then(Value::as_object)
            .ok_or_else(|| UpsertError::FormInitialization("response has no columnValues".into()))
}

/// Valor de un descriptor de columna.
///
/// `value` numérico o booleano pasa tal cual; si es texto se intenta leer
/// como fecha del inicializador y se reescribe al patrón del formulario. Sin
/// `value` (o nulo) se usa `classicValue`. Sin ninguno, `None`.
pub fn extract_value(descriptor: &Value, config: &EngineConfig) -> Option<Value> {
    let Value::Object(item) = descriptor else {
        return (!descriptor.is_null()).then(|| descriptor.clone());
    };
    match item.get("value") {
        Some(Value::String(s)) => {
            let reformatted = reformat_date(s, &config.default_date_pattern, &config.display_date_pattern);
            Some(Value::String(reformatted.unwrap_or_else(|| s.clone())))
        }
        Some(Value::Null) | None => item.get(CLASSIC_VALUE).filter(|v| !v.is_null()).cloned(),
        Some(other) => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extraction_policy() {
        let cfg = EngineConfig::default();
        assert_eq!(extract_value(&json!({"value": 12.5}), &cfg), Some(json!(12.5)));
        assert_eq!(extract_value(&json!({"value": true}), &cfg), Some(json!(true)));
        assert_eq!(extract_value(&json!({"value": "2024-03-01"}), &cfg), Some(json!("01-03-2024")));
        assert_eq!(extract_value(&json!({"value": "CO"}), &cfg), Some(json!("CO")));
        assert_eq!(extract_value(&json!({"classicValue": "Y"}), &cfg), Some(json!("Y")));
        assert_eq!(extract_value(&json!({"value": null, "classicValue": "N"}), &cfg), Some(json!("N")));
        assert_eq!(extract_value(&json!({}), &cfg), None);
    }

    #[test]
    fn error_envelope_becomes_form_error() {
        let response = json!({"response": {"error": {"message": "callout failed"}}});
        assert_eq!(column_values(&response),
                   Err(UpsertError::FormInitialization("callout failed".into())));
        assert!(column_values(&json!({"other": 1})).is_err());
    }
}
