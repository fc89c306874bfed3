//! Datasource genérico en memoria: filas por entidad, paginadas por ventana.
//! No interpreta la cláusula where; la guarda con la petición para que los
//! tests la inspeccionen.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use rx_core::{CollaboratorError, GenericSearch, RequestScope, SearchRequest};
use serde_json::{json, Value};

use crate::lock;

#[derive(Debug, Default)]
pub struct InMemorySearch {
    rows: HashMap<String, Vec<Value>>,
    failure: Option<String>,
    omit_total: bool,
    requests: Mutex<Vec<SearchRequest>>,
}

impl InMemorySearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, entity_name: &str, rows: Vec<Value>) -> Self {
        self.rows.insert(entity_name.to_string(), rows);
        self
    }

    /// Todas las peticiones fallan con `Unavailable`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Respuestas sin `totalRows`, como un datasource que no cuenta filas.
    pub fn without_total(mut self) -> Self {
        self.omit_total = true;
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        lock(&self.requests).clone()
    }
}

impl GenericSearch for InMemorySearch {
    fn fetch(&self, _scope: &RequestScope, request: &SearchRequest) -> Result<Value, CollaboratorError> {
        lock(&self.requests).push(request.clone());
        if let Some(message) = &self.failure {
            return Err(CollaboratorError::Unavailable(message.clone()));
        }
        let rows = self.rows.get(&request.entity_name).map(Vec::as_slice).unwrap_or_default();
        let start = request.start_row.min(rows.len());
        let end = request.end_row.min(rows.len()).max(start);
        debug!("search {}: rows {start}..{end} of {}", request.entity_name, rows.len());
        let mut response = json!({"data": rows[start..end].to_vec()});
        if !self.omit_total {
            response["totalRows"] = json!(rows.len());
        }
        Ok(json!({ "response": response }))
    }
}
