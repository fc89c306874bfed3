//! Constantes del motor.
//!
//! Los valores por defecto de `EngineConfig` y los tokens que aparecen en las
//! plantillas de filtros definidas en los metadatos.

/// Prefijo de los nombres de input del formulario.
pub const INPUT_PREFIX: &str = "inp";

/// Filas pedidas por página al datasource genérico.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Límite de filas materializadas por una consulta declarativa.
pub const DEFAULT_CUSTOM_QUERY_MAX_ROWS: usize = 1000;

/// Token del campo cambiado en la cláusula headless.
pub const ID_TOKEN: &str = "@id@";

/// Marcador de filtros adicionales en la plantilla de consulta propia.
pub const ADDITIONAL_FILTERS_TOKEN: &str = "@additional_filters@";

/// Patrón de fecha que devuelve el inicializador de formularios.
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d";

/// Patrón de fecha con el que trabaja el formulario.
pub const DISPLAY_DATE_PATTERN: &str = "%d-%m-%Y";

/// Patrón de fecha-hora del formulario.
pub const DISPLAY_DATETIME_PATTERN: &str = "%d-%m-%Y %H:%M:%S";

/// Fecha-hora ISO-8601 con milisegundos, forma canónica de los timestamps.
pub const ISO_TIMESTAMP_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
