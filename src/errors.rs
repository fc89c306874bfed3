use rx_adapters::FixtureError;
use rx_core::UpsertError;
use thiserror::Error;

/// Errores de la aplicación (binario de demo y fachada).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en fixture: {0}")]
    Fixture(#[from] FixtureError),
    #[error("Error de upsert [{key}]: {0}", key = .0.message_key())]
    Upsert(#[from] UpsertError),
}
