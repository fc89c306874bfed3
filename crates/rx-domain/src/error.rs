use thiserror::Error;

/// Errores al cargar o validar metadatos.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid definition: {0}")]
    ValidationError(String),

    #[error("metadata serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::SerializationError(e.to_string())
    }
}
