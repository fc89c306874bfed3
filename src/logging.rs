//! Inicialización del subscriber de logs para los binarios.
//!
//! Las librerías emiten por la fachada `log`; el subscriber de
//! `tracing-subscriber` las recoge a través de su puente `tracing-log`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// `RUST_LOG` tiene prioridad sobre el nivel configurado. Llamadas
/// repetidas no hacen nada.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
