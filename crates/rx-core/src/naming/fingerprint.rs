//! Huella blake3 de la parte de una definición que fija las tablas de nombres.

use blake3::Hasher;
use rx_domain::RecordDefinition;

/// Cambia si se añade, quita o renombra un campo, o si cambia su tipo de valor.
pub fn fields_fingerprint(definition: &RecordDefinition) -> String {
    let mut h = Hasher::new();
    for f in &definition.fields {
        let kind = format!("{:?}", f.column.value_kind);
        let parts = [f.column.db_name.as_str(), f.column.property.as_deref().unwrap_or(""), kind.as_str()];
        for part in parts {
            // prefijo de longitud por parte
            h.update(&(part.len() as u64).to_le_bytes());
            h.update(part.as_bytes());
        }
    }
    h.finalize().to_hex().to_string()
}
