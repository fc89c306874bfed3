//! Proveedor de definiciones en memoria.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rx_core::{CollaboratorError, MetadataProvider, PrivilegeScope, RequestScope};
use rx_domain::RecordDefinition;

use crate::lock;

#[derive(Debug, Default)]
pub struct InMemoryMetadataProvider {
    definitions: HashMap<String, Arc<RecordDefinition>>,
    calls: Mutex<Vec<(PrivilegeScope, String)>>,
}

impl InMemoryMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: RecordDefinition) {
        self.definitions.insert(definition.id.clone(), Arc::new(definition));
    }

    /// Peticiones recibidas: (privilegio, id).
    pub fn calls(&self) -> Vec<(PrivilegeScope, String)> {
        lock(&self.calls).clone()
    }
}

impl MetadataProvider for InMemoryMetadataProvider {
    fn get_definition(&self, scope: &RequestScope, id: &str) -> Result<Arc<RecordDefinition>, CollaboratorError> {
        lock(&self.calls).push((scope.privilege, id.to_string()));
        self.definitions
            .get(id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("definition {id}")))
    }
}
