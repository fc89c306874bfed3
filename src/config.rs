//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`)
//! con la sección del motor y la de logging.
use once_cell::sync::Lazy;
use rx_core::config::{init_dotenv, EngineConfig};
use std::env;

use crate::errors::AppError;

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Parámetros del motor de upsert (paginación, patrones de fecha).
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filtro por defecto si `RUST_LOG` no está definido (`RX_LOG`).
    pub level: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        let level = env::var("RX_LOG").ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| "info".into());
        AppConfig { engine: EngineConfig::from_env(),
                    logging: LoggingConfig { level } }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.engine.validate().map_err(AppError::Config)
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
