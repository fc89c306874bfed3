//! Fusión determinista de los valores derivados sobre el payload de trabajo.
//!
//! Dos semánticas: `merge_absent` sólo rellena claves que faltan (fase de
//! defaults) y `merge_overwrite` reemplaza siempre (fase de cambio). Ambas
//! respetan el orden de inserción de `Payload`.

use rx_domain::Payload;

/// Inserta las claves de `incoming` que no existen en `target`.
/// Devuelve las claves añadidas.
pub fn merge_absent(target: &mut Payload, incoming: &Payload) -> Vec<String> {
    let mut added = Vec::new();
    for (k, v) in incoming {
        if !target.contains_key(k) {
            target.insert(k.clone(), v.clone());
            added.push(k.clone());
        }
    }
    added
}

/// Las claves de `incoming` reemplazan a las de `target`.
/// Devuelve las claves escritas.
pub fn merge_overwrite(target: &mut Payload, incoming: &Payload) -> Vec<String> {
    let mut written = Vec::with_capacity(incoming.len());
    for (k, v) in incoming {
        target.insert(k.clone(), v.clone());
        written.push(k.clone());
    }
    written
}
