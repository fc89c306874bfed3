//! Traductor entre las tres convenciones de nombres de un campo.
//!
//! - nombre físico (`M_Product_ID`)
//! - nombre normalizado (`product`, rutas con `$`)
//! - nombre de input (`inpmProductId`)
//!
//! Se construye una vez por definición a partir de la lista ordenada de
//! campos. Los campos sin propiedad quedan como `Unmapped`: conservan su
//! nombre de input pero nunca participan en la conversión a forma
//! normalizada.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::warn;
use rx_domain::{Payload, RecordDefinition, ValueKind};

use crate::constants::INPUT_PREFIX;

/// Transformación de nombre de columna usada por el formulario: primer
/// carácter en minúscula, se eliminan los `_` y el carácter siguiente pasa a
/// mayúscula; el resto en minúscula.
pub fn transform_column_name(db_name: &str) -> String {
    let mut out = String::with_capacity(db_name.len());
    let mut after_underscore = false;
    for (i, c) in db_name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_lowercase());
        } else if c == '_' {
            after_underscore = true;
        } else if after_underscore {
            out.extend(c.to_uppercase());
            after_underscore = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Nombre de input de una columna física.
pub fn input_name(db_name: &str) -> String {
    format!("{INPUT_PREFIX}{}", transform_column_name(db_name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedName {
    Mapped(String),
    /// La columna no tiene propiedad asociada.
    Unmapped,
}

impl NormalizedName {
    pub fn as_mapped(&self) -> Option<&str> {
        match self {
            NormalizedName::Mapped(s) => Some(s),
            NormalizedName::Unmapped => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub db_name: String,
    pub input_name: String,
    pub normalized: NormalizedName,
    pub value_kind: ValueKind,
}

#[derive(Debug, Clone)]
pub struct NameTranslator {
    definition_id: String,
    fields: Vec<FieldNames>,
    db_to_input: IndexMap<String, String>,
    input_to_db: HashMap<String, String>,
    input_to_normalized: IndexMap<String, String>,
    normalized_to_input: IndexMap<String, String>,
    kinds: HashMap<String, ValueKind>,
}

impl NameTranslator {
    pub fn build(definition: &RecordDefinition) -> Self {
        let mut t = NameTranslator { definition_id: definition.id.clone(),
                                     fields: Vec::with_capacity(definition.fields.len()),
                                     db_to_input: IndexMap::new(),
                                     input_to_db: HashMap::new(),
                                     input_to_normalized: IndexMap::new(),
                                     normalized_to_input: IndexMap::new(),
                                     kinds: HashMap::new() };
        for field in &definition.fields {
            let col = &field.column;
            let inp = input_name(&col.db_name);
            if t.input_to_db.contains_key(&inp) {
                warn!("definition {}: column {} collides with input name {inp}, ignored",
                      definition.id, col.db_name);
                continue;
            }
            let normalized = match col.normalized_name() {
                Some(n) if !t.normalized_to_input.contains_key(&n) => {
                    t.input_to_normalized.insert(inp.clone(), n.clone());
                    t.normalized_to_input.insert(n.clone(), inp.clone());
                    NormalizedName::Mapped(n)
                }
                _ => NormalizedName::Unmapped,
            };
            t.db_to_input.insert(col.db_name.clone(), inp.clone());
            t.input_to_db.insert(inp.clone(), col.db_name.clone());
            t.kinds.insert(inp.clone(), col.value_kind);
            t.fields.push(FieldNames { db_name: col.db_name.clone(),
                                       input_name: inp,
                                       normalized,
                                       value_kind: col.value_kind });
        }
        t
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn fields(&self) -> &[FieldNames] {
        &self.fields
    }

    pub fn input_for_db(&self, db_name: &str) -> Option<&str> {
        self.db_to_input.get(db_name).map(String::as_str)
    }

    pub fn db_for_input(&self, input: &str) -> Option<&str> {
        self.input_to_db.get(input).map(String::as_str)
    }

    pub fn normalized_for_input(&self, input: &str) -> Option<&str> {
        self.input_to_normalized.get(input).map(String::as_str)
    }

    pub fn input_for_normalized(&self, normalized: &str) -> Option<&str> {
        self.normalized_to_input.get(normalized).map(String::as_str)
    }

    pub fn value_kind(&self, input: &str) -> Option<ValueKind> {
        self.kinds.get(input).copied()
    }

    /// Columnas conocidas pero sin nombre normalizado.
    pub fn is_unmapped_input(&self, input: &str) -> bool {
        self.input_to_db.contains_key(input) && !self.input_to_normalized.contains_key(input)
    }

    /// Pares (columna física, nombre de input) en orden de declaración.
    pub fn db_to_input(&self) -> impl Iterator<Item = (&str, &str)> {
        self.db_to_input.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Payload normalizado → forma input. Las claves desconocidas se conservan.
    pub fn to_input_payload(&self, normalized: &Payload) -> Payload {
        normalized.iter()
                  .map(|(k, v)| {
                      let key = self.input_for_normalized(k).unwrap_or(k).to_string();
                      (key, v.clone())
                  })
                  .collect()
    }

    /// Clave normalizada para una clave input con sufijo de outfield
    /// (`inpmProductId_UOM` → `product_UOM`). Se usa el input mapeado más largo.
    pub fn normalized_for_suffixed(&self, key: &str) -> Option<String> {
        self.input_to_normalized
            .iter()
            .filter(|(inp, _)| key.len() > inp.len() && key.starts_with(inp.as_str()) && key[inp.len()..].starts_with('_'))
            .max_by_key(|(inp, _)| inp.len())
            .map(|(inp, norm)| format!("{norm}{}", &key[inp.len()..]))
    }

    /// Payload en forma input → normalizado. Las claves de columnas sin
    /// propiedad se descartan; las desconocidas se conservan tal cual salvo
    /// las de outfields con sufijo, que se renombran a partir del campo.
    pub fn to_normalized_payload(&self, input: &Payload) -> Payload {
        let mut out = Payload::new();
        for (k, v) in input {
            if self.is_unmapped_input(k) {
                warn!("definition {}: dropping unmapped input {k}", self.definition_id);
                continue;
            }
            let key = match self.normalized_for_input(k) {
                Some(n) => n.to_string(),
                None if self.input_to_db.contains_key(k) => k.clone(),
                None => self.normalized_for_suffixed(k).unwrap_or_else(|| k.clone()),
            };
            out.insert(key, v.clone());
        }
        out
    }
}
