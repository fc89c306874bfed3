//! rx-adapters: colaboradores en memoria para el motor headless.
//!
//! Cada adaptador implementa un trait de `rx_core::ports` y registra las
//! llamadas que recibe, de modo que los tests puedan contar páginas pedidas,
//! fases del inicializador o escrituras de persistencia. `fixture` arma el
//! conjunto completo a partir de un documento JSON.

pub mod evaluator;
pub mod fixture;
pub mod form;
pub mod metadata;
pub mod persistence;
pub mod query;
pub mod search;

use std::sync::{Mutex, MutexGuard};

pub use evaluator::TemplateExpressionEvaluator;
pub use fixture::{Fixture, FixtureError, InMemoryStack, QueryRowSet};
pub use form::{RecordedFormCall, ScriptedFormInitializer, DEFAULTS_PHASE};
pub use metadata::InMemoryMetadataProvider;
pub use persistence::{InMemoryPersistence, PersistenceCall};
pub use query::InMemoryQueryEngine;
pub use search::InMemorySearch;

// Un panic en otro hilo no invalida el registro de llamadas.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
