//! Copia de outfields de la fila elegida al payload anfitrión.

use log::{debug, warn};
use rx_domain::{Payload, ResultShape, SelectorDescriptor, SelectorField};
use serde_json::{Map, Value};

use crate::naming::input_name;

/// Clave destino: input del campo cambiado + sufijo si el outfield declara
/// uno, si no el input de la columna anfitriona del outfield.
pub fn target_key(field: &SelectorField, changed_input: &str) -> Option<String> {
    match field.suffix() {
        Some(suffix) => Some(format!("{changed_input}{suffix}")),
        None => field.column.as_deref().filter(|c| !c.is_empty()).map(input_name),
    }
}

/// Escribe en `payload` cada outfield presente en `row`. Devuelve las claves
/// escritas.
pub fn extract_outfields(selector: &SelectorDescriptor,
                         shape: ResultShape,
                         row: &Map<String, Value>,
                         changed_input: &str,
                         payload: &mut Payload)
                         -> Vec<String> {
    let mut written = Vec::new();
    for field in selector.outfields() {
        let Some(value) = row.get(&field.result_key(shape)) else {
            continue;
        };
        let Some(key) = target_key(field, changed_input) else {
            warn!("selector {}: outfield {} has neither suffix nor column, skipped", selector.id, field.name);
            continue;
        };
        debug!("selector {}: {key} <- {}", selector.id, field.name);
        payload.insert(key.clone(), value.clone());
        written.push(key);
    }
    written
}
