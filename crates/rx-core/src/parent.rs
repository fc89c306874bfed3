//! Resolución del registro padre de un payload hijo.

use rx_domain::{Payload, RecordDefinition};

use crate::values::as_text;

/// Devuelve el valor del primer campo link-to-parent (en orden de
/// declaración) presente en el payload normalizado. Se espera una única
/// referencia al padre por registro; no se valida unicidad.
pub fn resolve_parent_id(definition: &RecordDefinition, normalized: &Payload) -> Option<String> {
    definition.link_to_parent_fields()
              .filter_map(|f| f.column.normalized_name())
              .find_map(|prop| normalized.get(&prop).and_then(as_text))
}
