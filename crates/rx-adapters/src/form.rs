//! Inicializador de formularios guionizado.
//!
//! Sin campo cambiado responde los defaults de la definición; con campo
//! cambiado, las salidas del callout registrado para ese input (vacío si no
//! hay). Un fallo registrado se devuelve como sobre de error, igual que lo
//! haría el inicializador real.

use std::collections::HashMap;
use std::sync::Mutex;

use rx_core::{CollaboratorError, FormInitParams, FormInitializer, RequestScope};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::lock;

/// Clave de fallo para la fase de defaults.
pub const DEFAULTS_PHASE: &str = "";

/// Llamada recibida, con el contenido enviado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFormCall {
    pub params: FormInitParams,
    pub content: Value,
}

#[derive(Debug, Default)]
pub struct ScriptedFormInitializer {
    defaults: HashMap<String, Map<String, Value>>,
    callouts: HashMap<(String, String), Map<String, Value>>,
    failures: HashMap<(String, String), String>,
    calls: Mutex<Vec<RecordedFormCall>>,
}

impl ScriptedFormInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `columns`: columna física → descriptor (`{"value": ..}` /
    /// `{"classicValue": ..}`).
    pub fn with_defaults(mut self, definition_id: &str, columns: Map<String, Value>) -> Self {
        self.defaults.insert(definition_id.to_string(), columns);
        self
    }

    pub fn with_callout(mut self, definition_id: &str, changed_input: &str, columns: Map<String, Value>) -> Self {
        self.callouts.insert((definition_id.to_string(), changed_input.to_string()), columns);
        self
    }

    /// `changed_input` = `DEFAULTS_PHASE` para fallar en la fase 1.
    pub fn with_failure(mut self, definition_id: &str, changed_input: &str, message: &str) -> Self {
        self.failures.insert((definition_id.to_string(), changed_input.to_string()), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedFormCall> {
        lock(&self.calls).clone()
    }
}

impl FormInitializer for ScriptedFormInitializer {
    fn execute(&self, _scope: &RequestScope, params: &FormInitParams, content: &Value) -> Result<Value, CollaboratorError> {
        lock(&self.calls).push(RecordedFormCall { params: params.clone(),
                                                  content: content.clone() });
        let phase = params.changed_field.clone().unwrap_or_else(|| DEFAULTS_PHASE.to_string());
        let key = (params.definition_id.clone(), phase);
        if let Some(message) = self.failures.get(&key) {
            return Ok(json!({"response": {"error": {"message": message}}}));
        }
        let columns = match params.changed_field {
            None => self.defaults.get(&params.definition_id),
            Some(_) => self.callouts.get(&key),
        };
        Ok(json!({ "columnValues": columns.cloned().unwrap_or_default() }))
    }
}
