//! Configuración del motor desde variables de entorno.
//! Usa el prefijo `RX_` y valores por defecto de `constants`.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::constants::{DEFAULT_CUSTOM_QUERY_MAX_ROWS, DEFAULT_DATE_PATTERN, DEFAULT_PAGE_SIZE,
                       DISPLAY_DATETIME_PATTERN, DISPLAY_DATE_PATTERN};

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Tamaño de página del datasource genérico.
    pub page_size: usize,
    /// Máximo de filas de una consulta declarativa.
    pub custom_query_max_rows: usize,
    /// Patrón de las fechas devueltas por el inicializador.
    pub default_date_pattern: String,
    /// Patrón de fecha del formulario.
    pub display_date_pattern: String,
    /// Patrón de fecha-hora del formulario.
    pub input_datetime_pattern: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE,
               custom_query_max_rows: DEFAULT_CUSTOM_QUERY_MAX_ROWS,
               default_date_pattern: DEFAULT_DATE_PATTERN.to_string(),
               display_date_pattern: DISPLAY_DATE_PATTERN.to_string(),
               input_datetime_pattern: DISPLAY_DATETIME_PATTERN.to_string() }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let defaults = Self::default();
        let page_size = env::var("RX_PAGE_SIZE").ok()
                                                .and_then(|v| v.parse().ok())
                                                .unwrap_or(defaults.page_size);
        let custom_query_max_rows = env::var("RX_CUSTOM_QUERY_MAX_ROWS").ok()
                                                                       .and_then(|v| v.parse().ok())
                                                                       .unwrap_or(defaults.custom_query_max_rows);
        Self { page_size,
               custom_query_max_rows,
               default_date_pattern: env::var("RX_DATE_PATTERN").unwrap_or(defaults.default_date_pattern),
               display_date_pattern: env::var("RX_DISPLAY_DATE_PATTERN").unwrap_or(defaults.display_date_pattern),
               input_datetime_pattern: env::var("RX_DATETIME_PATTERN").unwrap_or(defaults.input_datetime_pattern) }
    }

    /// Rechaza configuraciones que harían que la paginación no avance.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("RX_PAGE_SIZE must be greater than zero".into());
        }
        if self.custom_query_max_rows == 0 {
            return Err("RX_CUSTOM_QUERY_MAX_ROWS must be greater than zero".into());
        }
        Ok(())
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
