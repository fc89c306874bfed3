//! Cache de traductores por id de definición.
//!
//! Cada entrada guarda la huella de los campos con la que se construyó; si
//! la definición cambia, el traductor se reconstruye en la siguiente
//! petición en lugar de servirse obsoleto.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use rx_domain::RecordDefinition;

use crate::naming::fingerprint::fields_fingerprint;
use crate::naming::translator::NameTranslator;

#[derive(Debug)]
struct CachedTranslator {
    fingerprint: String,
    translator: Arc<NameTranslator>,
}

#[derive(Debug, Default)]
pub struct TranslatorCache {
    entries: DashMap<String, CachedTranslator>,
}

impl TranslatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, definition: &RecordDefinition) -> Arc<NameTranslator> {
        let fingerprint = fields_fingerprint(definition);
        if let Some(entry) = self.entries.get(&definition.id) {
            if entry.fingerprint == fingerprint {
                return Arc::clone(&entry.translator);
            }
        }
        debug!("building name translator for definition {}", definition.id);
        let translator = Arc::new(NameTranslator::build(definition));
        self.entries.insert(definition.id.clone(),
                            CachedTranslator { fingerprint,
                                               translator: Arc::clone(&translator) });
        translator
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
