//! rxbridge: API REST plana sobre formularios interactivos del ERP.
//!
//! Este crate es la fachada del workspace:
//! - `engine` (rx-core): motor headless de upsert.
//! - `domain` (rx-domain): metadatos de definiciones y selectores.
//! - `adapters` (rx-adapters): colaboradores en memoria y fixtures.
//! - `config`, `errors` y `logging` de la aplicación.

pub mod config;
pub mod errors;
pub mod logging;

pub use rx_adapters as adapters;
pub use rx_core as engine;
pub use rx_domain as domain;

use log::debug;
use rx_adapters::{Fixture, InMemoryStack};
use rx_core::Upserter;

use crate::config::CONFIG;
use crate::errors::AppError;

/// Arma el stack en memoria de un fixture con la configuración global.
pub fn in_memory_upserter(fixture: &Fixture) -> Result<(InMemoryStack, Upserter), AppError> {
    CONFIG.validate()?;
    let stack = InMemoryStack::from_fixture(fixture);
    debug!("in-memory stack ready (page size {})", CONFIG.engine.page_size);
    let upserter = stack.upserter(CONFIG.engine.clone())?;
    Ok((stack, upserter))
}
