//! Tipos de entrada y salida del orquestador.

use rx_domain::Payload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::UpsertError;
use crate::ports::FormMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum UpsertMethod {
    Create,
    Update {
        #[serde(default)]
        record_id: Option<String>,
    },
}

impl UpsertMethod {
    pub fn update(record_id: impl Into<String>) -> Self {
        UpsertMethod::Update { record_id: Some(record_id.into()) }
    }

    /// Acepta `create`/`post` y `update`/`put` sin distinguir mayúsculas.
    pub fn parse(method: &str, record_id: Option<String>) -> Result<Self, UpsertError> {
        match method.to_ascii_lowercase().as_str() {
            "create" | "post" => Ok(UpsertMethod::Create),
            "update" | "put" => Ok(UpsertMethod::Update { record_id }),
            other => Err(UpsertError::InvalidPayload(format!("unknown method {other}"))),
        }
    }

    pub fn form_mode(&self) -> FormMode {
        match self {
            UpsertMethod::Create => FormMode::New,
            UpsertMethod::Update { .. } => FormMode::Change,
        }
    }

    /// Id del registro a actualizar; `MissingRecordId` si falta en un UPDATE.
    pub fn record_id(&self) -> Result<Option<&str>, UpsertError> {
        match self {
            UpsertMethod::Create => Ok(None),
            UpsertMethod::Update { record_id } => record_id.as_deref()
                                                           .filter(|id| !id.trim().is_empty())
                                                           .map(Some)
                                                           .ok_or(UpsertError::MissingRecordId),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertMethod::Create => "CREATE",
            UpsertMethod::Update { .. } => "UPDATE",
        }
    }
}

/// Petición de upsert en forma normalizada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub method: UpsertMethod,
    pub definition_id: String,
    pub payload: Payload,
    /// Campo cuyo callout se reproduce (nombre normalizado). Si falta se
    /// toma la primera clave no-padre del payload.
    #[serde(default)]
    pub changed_field: Option<String>,
}

impl UpsertRequest {
    pub fn new(method: UpsertMethod, definition_id: impl Into<String>, payload: Payload) -> Self {
        Self { method,
               definition_id: definition_id.into(),
               payload,
               changed_field: None }
    }

    pub fn with_changed_field(mut self, field: impl Into<String>) -> Self {
        self.changed_field = Some(field.into());
        self
    }
}

/// Resultado de resolver una petición sin persistirla.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub correlation_id: Uuid,
    pub definition_id: String,
    pub parent_id: Option<String>,
    pub record_id: Option<String>,
    /// Campo tratado como cambiado (normalizado), si hubo alguno.
    pub changed_field: Option<String>,
    /// Claves input escritas por el selector.
    pub resolved_keys: Vec<String>,
    /// Payload final en forma normalizada, con valores canónicos.
    pub payload: Payload,
}
