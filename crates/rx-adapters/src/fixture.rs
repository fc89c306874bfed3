//! Fixture JSON que describe un entorno completo en memoria.
//!
//! ```json
//! {
//!   "session": {"#AD_Client_ID": "C-1"},
//!   "definitions": [ ... RecordDefinition ... ],
//!   "defaults": {"<definition>": {"<DB_COLUMN>": {"value": ..}}},
//!   "callouts": {"<definition>": {"<inpName>": {"<DB_COLUMN>": {"value": ..}}}},
//!   "search_rows": {"<Entity>": [ {...}, ... ]},
//!   "query_rows": [ {"matches": "from Product", "rows": [ {"alias": {"type": "text", "value": ".."}} ]} ],
//!   "records": {"<definition>": {"<id>": { ... payload normalizado ... }}}
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use rx_core::{EngineConfig, QueryRow, RequestScope, UpsertError, Upserter};
use rx_domain::{DomainError, Payload, RecordDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::evaluator::TemplateExpressionEvaluator;
use crate::form::ScriptedFormInitializer;
use crate::metadata::InMemoryMetadataProvider;
use crate::persistence::InMemoryPersistence;
use crate::query::InMemoryQueryEngine;
use crate::search::InMemorySearch;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read fixture {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Definition(#[from] DomainError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRowSet {
    pub matches: String,
    #[serde(default)]
    pub rows: Vec<QueryRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub session: BTreeMap<String, String>,
    #[serde(default)]
    pub definitions: Vec<RecordDefinition>,
    #[serde(default)]
    pub defaults: HashMap<String, Map<String, Value>>,
    #[serde(default)]
    pub callouts: HashMap<String, HashMap<String, Map<String, Value>>>,
    #[serde(default)]
    pub search_rows: HashMap<String, Vec<Value>>,
    #[serde(default)]
    pub query_rows: Vec<QueryRowSet>,
    #[serde(default)]
    pub records: HashMap<String, HashMap<String, Payload>>,
}

impl Fixture {
    pub fn from_json_str(raw: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture = serde_json::from_str(raw)?;
        for definition in &fixture.definitions {
            definition.validate()?;
        }
        Ok(fixture)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io { path: path.display().to_string(),
                                                                                     source })?;
        Self::from_json_str(&raw)
    }

    pub fn scope(&self) -> RequestScope {
        RequestScope::new(self.session.clone())
    }
}

/// Todos los colaboradores en memoria, accesibles para inspeccionar sus
/// llamadas tras un upsert.
#[derive(Debug, Clone)]
pub struct InMemoryStack {
    pub metadata: Arc<InMemoryMetadataProvider>,
    pub form_initializer: Arc<ScriptedFormInitializer>,
    pub search: Arc<InMemorySearch>,
    pub query_engine: Arc<InMemoryQueryEngine>,
    pub persistence: Arc<InMemoryPersistence>,
    pub evaluator: Arc<TemplateExpressionEvaluator>,
}

impl InMemoryStack {
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut metadata = InMemoryMetadataProvider::new();
        for definition in &fixture.definitions {
            metadata.insert(definition.clone());
        }

        let mut form = ScriptedFormInitializer::new();
        for (definition_id, columns) in &fixture.defaults {
            form = form.with_defaults(definition_id, columns.clone());
        }
        for (definition_id, by_input) in &fixture.callouts {
            for (changed_input, columns) in by_input {
                form = form.with_callout(definition_id, changed_input, columns.clone());
            }
        }

        let search = fixture.search_rows
                            .iter()
                            .fold(InMemorySearch::new(), |s, (entity, rows)| s.with_rows(entity, rows.clone()));
        let query_engine = fixture.query_rows
                                  .iter()
                                  .fold(InMemoryQueryEngine::new(), |q, set| q.with_rows(&set.matches, set.rows.clone()));

        let mut persistence = InMemoryPersistence::new();
        for (definition_id, records) in &fixture.records {
            for (id, payload) in records {
                persistence = persistence.with_record(definition_id, id, payload.clone());
            }
        }

        Self { metadata: Arc::new(metadata),
               form_initializer: Arc::new(form),
               search: Arc::new(search),
               query_engine: Arc::new(query_engine),
               persistence: Arc::new(persistence),
               evaluator: Arc::new(TemplateExpressionEvaluator) }
    }

    pub fn upserter(&self, config: EngineConfig) -> Result<Upserter, UpsertError> {
        Upserter::builder().metadata(self.metadata.clone())
                           .form_initializer(self.form_initializer.clone())
                           .search(self.search.clone())
                           .query_engine(self.query_engine.clone())
                           .persistence(self.persistence.clone())
                           .filter_evaluator(self.evaluator.clone())
                           .config(config)
                           .build()
    }
}
