//! Persistencia en memoria de payloads normalizados.

use std::collections::HashMap;
use std::sync::Mutex;

use rx_core::{CollaboratorError, Persistence, RequestScope};
use rx_domain::Payload;
use serde_json::Value;
use uuid::Uuid;

use crate::lock;

/// Operación recibida por la persistencia.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceCall {
    Create { definition_id: String, payload: Payload },
    Update { definition_id: String, id: String, payload: Payload },
    Read { definition_id: String, id: String },
}

#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    records: Mutex<HashMap<(String, String), Payload>>,
    calls: Mutex<Vec<PersistenceCall>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precarga un registro existente, tal cual.
    pub fn with_record(self, definition_id: &str, id: &str, payload: Payload) -> Self {
        lock(&self.records).insert((definition_id.to_string(), id.to_string()), payload);
        self
    }

    pub fn calls(&self) -> Vec<PersistenceCall> {
        lock(&self.calls).clone()
    }

    pub fn get(&self, definition_id: &str, id: &str) -> Option<Payload> {
        lock(&self.records).get(&(definition_id.to_string(), id.to_string())).cloned()
    }
}

impl Persistence for InMemoryPersistence {
    fn create(&self, _scope: &RequestScope, definition_id: &str, payload: &Payload) -> Result<Payload, CollaboratorError> {
        lock(&self.calls).push(PersistenceCall::Create { definition_id: definition_id.to_string(),
                                                         payload: payload.clone() });
        let id = payload.get("id")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| Uuid::new_v4().simple().to_string().to_uppercase());
        let mut saved = payload.clone();
        saved.insert("id".into(), Value::String(id.clone()));
        let mut records = lock(&self.records);
        let key = (definition_id.to_string(), id.clone());
        if records.contains_key(&key) {
            return Err(CollaboratorError::Rejected(format!("record {id} already exists")));
        }
        records.insert(key, saved.clone());
        Ok(saved)
    }

    fn update(&self, _scope: &RequestScope, definition_id: &str, id: &str, payload: &Payload)
              -> Result<Payload, CollaboratorError> {
        lock(&self.calls).push(PersistenceCall::Update { definition_id: definition_id.to_string(),
                                                         id: id.to_string(),
                                                         payload: payload.clone() });
        let mut records = lock(&self.records);
        let stored = records.get_mut(&(definition_id.to_string(), id.to_string()))
                            .ok_or_else(|| CollaboratorError::NotFound(format!("record {id}")))?;
        for (k, v) in payload {
            stored.insert(k.clone(), v.clone());
        }
        stored.insert("id".into(), Value::String(id.to_string()));
        Ok(stored.clone())
    }

    fn read(&self, _scope: &RequestScope, definition_id: &str, id: &str) -> Result<Payload, CollaboratorError> {
        lock(&self.calls).push(PersistenceCall::Read { definition_id: definition_id.to_string(),
                                                       id: id.to_string() });
        self.get(definition_id, id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("record {id}")))
    }
}
