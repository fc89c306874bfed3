//! Resolución de campos de referencia ("selectores").
//!
//! `SelectorResolver::resolve` decide la ruta según el tipo de referencia:
//! - `Search`: datasource genérico paginado;
//! - `CustomSelector` con consulta propia: consulta declarativa si tiene
//!   outfields, nada que resolver si no los tiene;
//! - `CustomSelector` sin consulta propia: datasource genérico;
//! - resto de referencias y primitivos: nada que resolver.

pub mod custom;
pub mod generic;
pub mod outfields;

use log::debug;
use rx_domain::{FieldDescriptor, Payload, ReferenceKind, SelectorDescriptor};

pub use custom::{normalize_query_value, normalize_row, CustomQuerySelectorResolver};
pub use generic::GenericSelectorResolver;
pub use outfields::{extract_outfields, target_key};

use crate::config::EngineConfig;
use crate::errors::UpsertError;
use crate::naming::NameTranslator;
use crate::ports::{FilterExpressionEvaluator, GenericSearch, QueryEngine};
use crate::scope::RequestScope;
use crate::values::as_text;

/// Campo cambiado a resolver y el identificador buscado.
#[derive(Debug, Clone)]
pub struct SelectorTarget<'a> {
    pub field: &'a FieldDescriptor,
    pub selector: &'a SelectorDescriptor,
    pub changed_input: &'a str,
    pub record_id: String,
}

/// Ruta elegida para un campo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorRoute {
    Generic,
    CustomQuery,
    None,
}

pub fn route_for(field: &FieldDescriptor) -> Result<SelectorRoute, UpsertError> {
    let column = &field.column;
    if !column.reference.owns_selector() {
        return Ok(SelectorRoute::None);
    }
    let selector = column.selector
                         .as_ref()
                         .ok_or_else(|| UpsertError::ReferenceNotFound(column.db_name.clone()))?;
    if column.reference != ReferenceKind::CustomSelector || !selector.custom_query {
        return Ok(SelectorRoute::Generic);
    }
    Ok(if selector.outfields().next().is_some() { SelectorRoute::CustomQuery } else { SelectorRoute::None })
}

pub struct SelectorResolver<'a> {
    search: &'a dyn GenericSearch,
    query: &'a dyn QueryEngine,
    evaluator: Option<&'a dyn FilterExpressionEvaluator>,
    config: &'a EngineConfig,
}

impl<'a> SelectorResolver<'a> {
    pub fn new(search: &'a dyn GenericSearch,
               query: &'a dyn QueryEngine,
               evaluator: Option<&'a dyn FilterExpressionEvaluator>,
               config: &'a EngineConfig)
               -> Self {
        Self { search, query, evaluator, config }
    }

    /// Resuelve el campo cambiado si es una referencia con selector.
    /// `scope` debe venir ya elevado. Devuelve las claves escritas.
    pub fn resolve(&self,
                   scope: &RequestScope,
                   field: &FieldDescriptor,
                   changed_input: &str,
                   translator: &NameTranslator,
                   payload: &mut Payload)
                   -> Result<Vec<String>, UpsertError> {
        let route = route_for(field)?;
        let Some(selector) = field.column.selector.as_ref().filter(|_| route != SelectorRoute::None) else {
            return Ok(Vec::new());
        };
        let Some(record_id) = payload.get(changed_input).and_then(as_text).filter(|v| !v.is_empty()) else {
            debug!("field {} has no value, selector {} skipped", field.name, selector.id);
            return Ok(Vec::new());
        };
        let target = SelectorTarget { field, selector, changed_input, record_id };
        debug!("resolving {} through selector {} ({route:?})", changed_input, selector.id);
        match route {
            SelectorRoute::Generic => GenericSelectorResolver::new(self.search, self.evaluator, self.config.page_size)
                .resolve(scope, &target, translator, payload),
            SelectorRoute::CustomQuery => CustomQuerySelectorResolver::new(self.query, self.evaluator, self.config)
                .resolve(scope, &target, translator, payload),
            SelectorRoute::None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rx_domain::{ColumnDescriptor, SelectorField, ValueKind};

    fn selector_field(name: &str, outfield: bool) -> SelectorField {
        SelectorField { name: name.into(),
                        property: None,
                        display_alias: Some(name.into()),
                        column: None,
                        suffix: None,
                        outfield,
                        sort_no: 0 }
    }

    fn field(reference: ReferenceKind, custom_query: bool, outfield: bool) -> FieldDescriptor {
        let selector = SelectorDescriptor { id: "SEL".into(),
                                            entity_name: "Warehouse".into(),
                                            where_clause: None,
                                            filter_expression: None,
                                            custom_query,
                                            query: custom_query.then(|| "select e.id as id from Warehouse e".into()),
                                            value_field: "id".into(),
                                            fields: vec![selector_field("id", false), selector_field("name", outfield)] };
        FieldDescriptor { id: "F".into(),
                          name: "Warehouse".into(),
                          column: ColumnDescriptor { db_name: "M_Warehouse_ID".into(),
                                                     property: Some("warehouse".into()),
                                                     link_to_parent: false,
                                                     referenced_entity: None,
                                                     reference,
                                                     value_kind: ValueKind::String,
                                                     selector: Some(selector) },
                          headless_filter: None }
    }

    #[test]
    fn custom_selector_routes() {
        assert_eq!(route_for(&field(ReferenceKind::CustomSelector, true, true)), Ok(SelectorRoute::CustomQuery));
        assert_eq!(route_for(&field(ReferenceKind::CustomSelector, true, false)), Ok(SelectorRoute::None));
        assert_eq!(route_for(&field(ReferenceKind::CustomSelector, false, true)), Ok(SelectorRoute::Generic));
        assert_eq!(route_for(&field(ReferenceKind::Search, false, false)), Ok(SelectorRoute::Generic));
        assert_eq!(route_for(&field(ReferenceKind::TableDir, false, true)), Ok(SelectorRoute::None));
    }

    #[test]
    fn selector_kind_without_selector_is_reference_not_found() {
        let mut f = field(ReferenceKind::Search, false, true);
        f.column.selector = None;
        assert_eq!(route_for(&f), Err(UpsertError::ReferenceNotFound("M_Warehouse_ID".into())));
    }
}
