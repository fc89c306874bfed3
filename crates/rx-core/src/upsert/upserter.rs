//! Orquestador del upsert headless.
//!
//! Pasos, estrictamente secuenciales:
//! 1. traductor de nombres (cacheado por definición);
//! 2. id del padre y, en UPDATE, valores existentes bajo el payload entrante;
//! 3. fase 1 del inicializador (defaults) para las claves ausentes;
//! 4. elección del campo cambiado;
//! 5. fase 2 (callouts del campo cambiado), sobrescribiendo;
//! 6. selector del campo cambiado si es una referencia;
//! 7. vuelta a forma normalizada y llamada a persistencia.
//!
//! Cualquier error en 3–6 aborta sin llamar a persistencia.

use std::sync::Arc;

use log::{debug, info, warn};
use rx_domain::{Payload, RecordDefinition};
use serde_json::Value;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::{CollaboratorError, UpsertError};
use crate::naming::{NameTranslator, TranslatorCache};
use crate::parent::resolve_parent_id;
use crate::ports::{FilterExpressionEvaluator, FormInitializer, GenericSearch, MetadataProvider, Persistence,
                   QueryEngine};
use crate::replay::{merge_absent, merge_overwrite, ReplayInvoker, ReplayTarget};
use crate::scope::RequestScope;
use crate::selector::SelectorResolver;
use crate::upsert::request::{Resolution, UpsertMethod, UpsertRequest};
use crate::values::to_canonical_value;

pub struct Upserter {
    metadata: Arc<dyn MetadataProvider>,
    form_initializer: Arc<dyn FormInitializer>,
    search: Arc<dyn GenericSearch>,
    query_engine: Arc<dyn QueryEngine>,
    persistence: Arc<dyn Persistence>,
    filter_evaluator: Option<Arc<dyn FilterExpressionEvaluator>>,
    config: EngineConfig,
    translators: Arc<TranslatorCache>,
}

impl std::fmt::Debug for Upserter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upserter")
         .field("config", &self.config)
         .field("cached_translators", &self.translators.len())
         .finish()
    }
}

impl Upserter {
    pub fn builder() -> UpserterBuilder {
        UpserterBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn translators(&self) -> &TranslatorCache {
        &self.translators
    }

    /// Resuelve la petición (pasos 1–6 y normalización) sin persistir.
    pub fn resolve(&self, scope: &RequestScope, request: &UpsertRequest) -> Result<Resolution, UpsertError> {
        let correlation_id = Uuid::new_v4();
        let admin = scope.elevated();
        info!("[{correlation_id}] {} {}", request.method.as_str(), request.definition_id);

        let record_id = request.method.record_id()?.map(str::to_string);
        let definition = self.load_definition(&admin, &request.definition_id)?;
        let translator = self.translators.get_or_build(&definition);

        // 2. padre + registro existente
        let normalized = match &record_id {
            Some(id) => {
                let mut existing = self.persistence
                                       .read(scope, &definition.id, id)
                                       .map_err(|e| UpsertError::Persistence(format!("read {id}: {e}")))?;
                merge_overwrite(&mut existing, &request.payload);
                existing
            }
            None => request.payload.clone(),
        };
        let parent_id = resolve_parent_id(&definition, &normalized);
        debug!("[{correlation_id}] parent={parent_id:?} record={record_id:?}");
        let mut working = translator.to_input_payload(&normalized);

        // 3. defaults
        let target = ReplayTarget { mode: request.method.form_mode(),
                                    definition_id: definition.id.clone(),
                                    parent_id: parent_id.clone(),
                                    record_id: record_id.clone() };
        let invoker = ReplayInvoker::new(self.form_initializer.as_ref(), &translator, &self.config);
        let defaults = invoker.defaults(scope, &target)?;
        let added = merge_absent(&mut working, &defaults);
        debug!("[{correlation_id}] defaults added {added:?}");

        // 4. campo cambiado
        let changed_field = match &request.changed_field {
            Some(hint) => Some(hint.clone()),
            None => first_changed_field(&definition, &request.payload),
        };

        let mut resolved_keys = Vec::new();
        match &changed_field {
            Some(changed) => {
                let field = definition.field_by_normalized(changed)
                                      .ok_or_else(|| UpsertError::ColumnNotFound(changed.clone()))?;
                let changed_input = translator.input_for_normalized(changed)
                                              .ok_or_else(|| UpsertError::ColumnNotFound(changed.clone()))?
                                              .to_string();

                // 5. callouts del campo cambiado
                let derived = invoker.single_change(scope, &target, &changed_input, &working)?;
                let written = merge_overwrite(&mut working, &derived);
                debug!("[{correlation_id}] change {changed_input} wrote {written:?}");

                // 6. selector
                let resolver = SelectorResolver::new(self.search.as_ref(),
                                                     self.query_engine.as_ref(),
                                                     self.filter_evaluator.as_deref(),
                                                     &self.config);
                resolved_keys = resolver.resolve(&admin, field, &changed_input, &translator, &mut working)?;
            }
            None => info!("[{correlation_id}] no changed field, callouts and selectors skipped"),
        }

        // 7. forma normalizada
        let payload = self.canonicalize(&translator, &translator.to_normalized_payload(&working));
        Ok(Resolution { correlation_id,
                        definition_id: definition.id.clone(),
                        parent_id,
                        record_id,
                        changed_field,
                        resolved_keys,
                        payload })
    }

    /// Resuelve y persiste. Devuelve el registro guardado.
    pub fn upsert(&self, scope: &RequestScope, request: &UpsertRequest) -> Result<Payload, UpsertError> {
        let resolution = self.resolve(scope, request)?;
        let saved = match resolution.record_id.as_deref() {
            None => self.persistence.create(scope, &resolution.definition_id, &resolution.payload),
            Some(id) => self.persistence.update(scope, &resolution.definition_id, id, &resolution.payload),
        }.map_err(|e| UpsertError::Persistence(e.to_string()))?;
        info!("[{}] {} {} saved", resolution.correlation_id, request.method.as_str(), resolution.definition_id);
        Ok(saved)
    }

    /// Superficie JSON: cuerpo entrante como texto, registro guardado como texto.
    pub fn upsert_json(&self,
                       scope: &RequestScope,
                       method: UpsertMethod,
                       definition_id: &str,
                       inbound_json: &str)
                       -> Result<String, UpsertError> {
        let payload = match serde_json::from_str::<Value>(inbound_json) {
            Ok(Value::Object(map)) => map,
            Ok(other) => return Err(UpsertError::InvalidPayload(format!("expected a JSON object, got {other}"))),
            Err(e) => return Err(UpsertError::InvalidPayload(e.to_string())),
        };
        let saved = self.upsert(scope, &UpsertRequest::new(method, definition_id, payload))?;
        serde_json::to_string(&saved).map_err(|e| UpsertError::InvalidPayload(e.to_string()))
    }

    fn load_definition(&self, scope: &RequestScope, id: &str) -> Result<Arc<RecordDefinition>, UpsertError> {
        self.metadata.get_definition(scope, id).map_err(|e| match e {
                                                   CollaboratorError::NotFound(_) => {
                                                       UpsertError::DefinitionNotFound(id.to_string())
                                                   }
                                                   other => UpsertError::DefinitionNotFound(format!("{id} ({other})")),
                                               })
    }

    fn canonicalize(&self, translator: &NameTranslator, normalized: &Payload) -> Payload {
        normalized.iter()
                  .map(|(k, v)| {
                      let kind = translator.input_for_normalized(k).and_then(|i| translator.value_kind(i));
                      let value = match kind {
                          Some(kind) => to_canonical_value(kind, v, &self.config),
                          None => v.clone(),
                      };
                      (k.clone(), value)
                  })
                  .collect()
    }
}

/// Primera clave del payload entrante que no es propiedad del padre.
pub fn first_changed_field(definition: &RecordDefinition, inbound: &Payload) -> Option<String> {
    let parents = definition.parent_properties();
    let mut candidates = inbound.keys().filter(|k| !parents.contains(*k));
    let first = candidates.next().cloned();
    if first.is_some() && candidates.next().is_some() {
        warn!("definition {}: several fields changed, replaying only {first:?}", definition.id);
    }
    first
}

#[derive(Default)]
pub struct UpserterBuilder {
    metadata: Option<Arc<dyn MetadataProvider>>,
    form_initializer: Option<Arc<dyn FormInitializer>>,
    search: Option<Arc<dyn GenericSearch>>,
    query_engine: Option<Arc<dyn QueryEngine>>,
    persistence: Option<Arc<dyn Persistence>>,
    filter_evaluator: Option<Arc<dyn FilterExpressionEvaluator>>,
    config: Option<EngineConfig>,
    translators: Option<Arc<TranslatorCache>>,
}

impl UpserterBuilder {
    pub fn metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn form_initializer(mut self, initializer: Arc<dyn FormInitializer>) -> Self {
        self.form_initializer = Some(initializer);
        self
    }

    pub fn search(mut self, search: Arc<dyn GenericSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn query_engine(mut self, engine: Arc<dyn QueryEngine>) -> Self {
        self.query_engine = Some(engine);
        self
    }

    pub fn persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Opcional: sin evaluador, un selector con expresión de filtro falla.
    pub fn filter_evaluator(mut self, evaluator: Arc<dyn FilterExpressionEvaluator>) -> Self {
        self.filter_evaluator = Some(evaluator);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Comparte la cache de traductores entre varios `Upserter`.
    pub fn translator_cache(mut self, cache: Arc<TranslatorCache>) -> Self {
        self.translators = Some(cache);
        self
    }

    pub fn build(self) -> Result<Upserter, UpsertError> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(UpsertError::Configuration)?;
        Ok(Upserter { metadata: required(self.metadata, "metadata provider")?,
                      form_initializer: required(self.form_initializer, "form initializer")?,
                      search: required(self.search, "generic search")?,
                      query_engine: required(self.query_engine, "query engine")?,
                      persistence: required(self.persistence, "persistence")?,
                      filter_evaluator: self.filter_evaluator,
                      config,
                      translators: self.translators.unwrap_or_default() })
    }
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, UpsertError> {
    value.ok_or_else(|| UpsertError::Configuration(format!("{name} is required")))
}
