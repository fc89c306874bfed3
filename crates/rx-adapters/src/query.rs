//! Motor de consultas declarativas en memoria.
//!
//! Cada conjunto de filas se registra con un fragmento; la primera entrada
//! cuyo fragmento aparece en el texto de la consulta (sin distinguir
//! mayúsculas) es la respuesta.

use std::sync::Mutex;

use rx_core::{CollaboratorError, QueryEngine, QueryRow, RequestScope};

use crate::lock;

#[derive(Debug, Default)]
pub struct InMemoryQueryEngine {
    results: Vec<(String, Vec<QueryRow>)>,
    failure: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl InMemoryQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, fragment: &str, rows: Vec<QueryRow>) -> Self {
        self.results.push((fragment.to_lowercase(), rows));
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Textos de consulta recibidos, en orden.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

impl QueryEngine for InMemoryQueryEngine {
    fn query(&self, _scope: &RequestScope, text: &str, max_rows: usize) -> Result<Vec<QueryRow>, CollaboratorError> {
        lock(&self.queries).push(text.to_string());
        if let Some(message) = &self.failure {
            return Err(CollaboratorError::Rejected(message.clone()));
        }
        let lowered = text.to_lowercase();
        Ok(self.results
               .iter()
               .find(|(fragment, _)| lowered.contains(fragment.as_str()))
               .map(|(_, rows)| rows.iter().take(max_rows).cloned().collect())
               .unwrap_or_default())
    }
}
