//! Contratos de los colaboradores externos.
//!
//! El motor no persiste, no busca y no evalúa scripts por sí mismo: todo eso
//! lo hacen implementaciones de estos traits provistas por la plataforma
//! anfitriona (o las versiones en memoria de `rx-adapters`). Todas las
//! llamadas reciben el `RequestScope` de la petición.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use rx_domain::{Payload, RecordDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CollaboratorError;
use crate::scope::RequestScope;

/// Proveedor de definiciones (sólo lectura, cacheable por el llamador).
pub trait MetadataProvider: Send + Sync {
    fn get_definition(&self, scope: &RequestScope, id: &str) -> Result<Arc<RecordDefinition>, CollaboratorError>;
}

/// Modo en el que se simula la apertura del formulario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMode {
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "CHANGE")]
    Change,
}

impl FormMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormMode::New => "NEW",
            FormMode::Change => "CHANGE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInitParams {
    pub mode: FormMode,
    pub definition_id: String,
    pub parent_id: Option<String>,
    pub record_id: Option<String>,
    /// Nombre de input del campo cuyo callout se quiere disparar.
    pub changed_field: Option<String>,
}

/// Inicializador de formularios: ejecuta defaults y callouts.
///
/// La respuesta es `{"columnValues": {...}}` o
/// `{"response": {"error": {"message": ...}}}`. Las llamadas pueden tener
/// efectos secundarios, el motor nunca las reintenta.
pub trait FormInitializer: Send + Sync {
    fn execute(&self, scope: &RequestScope, params: &FormInitParams, content: &Value) -> Result<Value, CollaboratorError>;
}

/// Petición de una página al datasource genérico.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub entity_name: String,
    pub selector_id: String,
    pub where_clause: String,
    /// Proyección: propiedades separadas por coma.
    pub extra_properties: String,
    pub start_row: usize,
    pub end_row: usize,
    /// Payload aplanado a strings, visible para los filtros del datasource.
    pub parameters: BTreeMap<String, String>,
}

/// Datasource genérico paginado. Responde
/// `{"response": {"data": [...], "totalRows": n}}`.
pub trait GenericSearch: Send + Sync {
    fn fetch(&self, scope: &RequestScope, request: &SearchRequest) -> Result<Value, CollaboratorError>;
}

/// Valor tal como lo entrega el motor de consultas declarativas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryValue {
    Null,
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Entity { id: Option<String>, display: String },
}

/// Fila indexada por alias de columna.
pub type QueryRow = IndexMap<String, QueryValue>;

pub trait QueryEngine: Send + Sync {
    fn query(&self, scope: &RequestScope, text: &str, max_rows: usize) -> Result<Vec<QueryRow>, CollaboratorError>;
}

/// Persistencia de entidades, siempre en forma normalizada.
pub trait Persistence: Send + Sync {
    fn create(&self, scope: &RequestScope, definition_id: &str, payload: &Payload) -> Result<Payload, CollaboratorError>;
    fn update(&self, scope: &RequestScope, definition_id: &str, id: &str, payload: &Payload)
              -> Result<Payload, CollaboratorError>;
    fn read(&self, scope: &RequestScope, definition_id: &str, id: &str) -> Result<Payload, CollaboratorError>;
}

/// Motor de scripts que evalúa la expresión de filtro de un selector.
/// `Ok(None)` o una cadena vacía significan "sin filtro".
pub trait FilterExpressionEvaluator: Send + Sync {
    fn evaluate(&self, scope: &RequestScope, expression: &str, parameters: &BTreeMap<String, String>)
                -> Result<Option<String>, CollaboratorError>;
}
