//! Resolución contra el datasource genérico, paginada.
//!
//! `INIT → BUILD_SCOPE → FETCH_PAGE → SCAN → {FOUND | NEXT_PAGE} → EXTRACT`.
//! `totalRows` se toma de la primera respuesta y acota el bucle; si una
//! respuesta no lo trae, se sigue mientras las páginas lleguen completas.
//! Todos los fallos se propagan al llamador.

use log::{debug, error};
use rx_domain::{Payload, ResultShape};
use serde_json::{Map, Value};

use crate::errors::UpsertError;
use crate::filter::{compose_where_clause, flatten_payload, headless_filter_clause, script_filter_clause,
                    substitute_session_variables};
use crate::naming::NameTranslator;
use crate::ports::{FilterExpressionEvaluator, GenericSearch, SearchRequest};
use crate::scope::RequestScope;
use crate::selector::outfields::extract_outfields;
use crate::selector::SelectorTarget;
use crate::values::as_text;

pub struct GenericSelectorResolver<'a> {
    search: &'a dyn GenericSearch,
    evaluator: Option<&'a dyn FilterExpressionEvaluator>,
    page_size: usize,
}

impl<'a> GenericSelectorResolver<'a> {
    pub fn new(search: &'a dyn GenericSearch,
               evaluator: Option<&'a dyn FilterExpressionEvaluator>,
               page_size: usize)
               -> Self {
        Self { search, evaluator, page_size: page_size.max(1) }
    }

    /// Busca la fila candidata y copia sus outfields. Devuelve las claves
    /// escritas en el payload.
    pub fn resolve(&self,
                   scope: &RequestScope,
                   target: &SelectorTarget<'_>,
                   translator: &NameTranslator,
                   payload: &mut Payload)
                   -> Result<Vec<String>, UpsertError> {
        let request = self.build_request(scope, target, translator, payload)?;
        let value_key = target.selector
                              .value_field()
                              .map(|f| f.result_key(ResultShape::PropertyPath))
                              .ok_or_else(|| UpsertError::ReferenceNotFound(target.selector.id.clone()))?;
        match self.find_row(scope, request, &value_key, &target.record_id)? {
            Some(row) => Ok(extract_outfields(target.selector, ResultShape::PropertyPath, &row, target.changed_input, payload)),
            None => {
                error!("selector {}: record {} not found", target.selector.id, target.record_id);
                Err(UpsertError::RecordNotFound { selector_id: target.selector.id.clone(),
                                                  record_id: target.record_id.clone() })
            }
        }
    }

    /// BUILD_SCOPE: cláusula base + headless + script, con variables de
    /// sesión sustituidas, y la proyección de propiedades extra.
    pub fn build_request(&self,
                         scope: &RequestScope,
                         target: &SelectorTarget<'_>,
                         translator: &NameTranslator,
                         payload: &Payload)
                         -> Result<SearchRequest, UpsertError> {
        let parameters = flatten_payload(payload);
        let headless = headless_filter_clause(target.field, target.changed_input, payload);
        let script = script_filter_clause(self.evaluator, scope, target.selector, &parameters)?;
        let clause = compose_where_clause(target.selector.where_clause.as_deref(), &format!("{headless}{script}"));
        Ok(SearchRequest { entity_name: target.selector.entity_name.clone(),
                           selector_id: target.selector.id.clone(),
                           where_clause: substitute_session_variables(&clause, translator, payload),
                           extra_properties: target.selector.extra_properties(),
                           start_row: 0,
                           end_row: self.page_size,
                           parameters })
    }

    fn find_row(&self,
                scope: &RequestScope,
                mut request: SearchRequest,
                value_key: &str,
                record_id: &str)
                -> Result<Option<Map<String, Value>>, UpsertError> {
        let mut total_rows: Option<usize> = None;
        loop {
            request.end_row = request.start_row + self.page_size;
            let response = self.search
                               .fetch(scope, &request)
                               .map_err(|e| UpsertError::Search(format!("selector {}: {e}", request.selector_id)))?;
            let body = response.get("response")
                               .ok_or_else(|| UpsertError::Search("search response has no 'response' object".into()))?;
            let data = body.get("data")
                           .and_then(Value::as_array)
                           .ok_or_else(|| UpsertError::Search("search response has no 'data' array".into()))?;
            if total_rows.is_none() {
                total_rows = body.get("totalRows").and_then(Value::as_u64).map(|n| n as usize);
            }
            debug!("selector {}: page {}..{} returned {} rows (total {:?})",
                   request.selector_id,
                   request.start_row,
                   request.end_row,
                   data.len(),
                   total_rows);

            let found = data.iter()
                            .filter_map(Value::as_object)
                            .find(|row| row.get(value_key).and_then(as_text).as_deref() == Some(record_id));
            if let Some(row) = found {
                return Ok(Some(row.clone()));
            }

            let exhausted = match total_rows {
                Some(total) => request.end_row >= total,
                None => data.len() < self.page_size,
            };
            if exhausted || data.is_empty() {
                return Ok(None);
            }
            request.start_row = request.end_row;
        }
    }
}
