//! Errores del motor de simulación de formularios.
//!
//! `UpsertError` es la taxonomía de negocio que ve el llamador: ninguna
//! variante es reintentable y todas llevan un mensaje legible. La clave de
//! `message_key` permite a la capa HTTP localizar el texto.
//!
//! `CollaboratorError` es lo que devuelven los colaboradores externos; el motor
//! lo traduce explícitamente en cada punto de llamada.

use thiserror::Error;

/// Fallo reportado por un colaborador externo (metadatos, búsqueda,
/// consulta, persistencia, script).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CollaboratorError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum UpsertError {
    #[error("record definition not found: {0}")]
    DefinitionNotFound(String),
    #[error("column not found for property {0}")]
    ColumnNotFound(String),
    #[error("reference has no selector for column {0}")]
    ReferenceNotFound(String),
    #[error("record {record_id} not found in selector {selector_id}")]
    RecordNotFound { selector_id: String, record_id: String },
    #[error("form initialization failed: {0}")]
    FormInitialization(String),
    #[error("Error executing selector query: {0}")]
    QueryExecution(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("filter expression failed: {0}")]
    Script(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("update requires a record id")]
    MissingRecordId,
    #[error("engine configuration error: {0}")]
    Configuration(String),
}

impl UpsertError {
    /// Clave estable para localizar el mensaje.
    pub fn message_key(&self) -> &'static str {
        match self {
            UpsertError::DefinitionNotFound(_) => "definition_not_found",
            UpsertError::ColumnNotFound(_) => "column_not_found",
            UpsertError::ReferenceNotFound(_) => "reference_not_found",
            UpsertError::RecordNotFound { .. } => "record_not_found",
            UpsertError::FormInitialization(_) => "form_initialization_error",
            UpsertError::QueryExecution(_) => "query_execution_error",
            UpsertError::Search(_) => "search_error",
            UpsertError::Persistence(_) => "persistence_error",
            UpsertError::Script(_) => "script_error",
            UpsertError::InvalidPayload(_) => "invalid_payload",
            UpsertError::MissingRecordId => "missing_record_id",
            UpsertError::Configuration(_) => "configuration_error",
        }
    }
}
