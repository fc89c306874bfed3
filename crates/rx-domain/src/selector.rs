//! Selectores de referencia y sus campos ("outfields").

use serde::{Deserialize, Serialize};

use crate::definition::normalize_path;
use crate::error::DomainError;

/// Forma de las filas candidatas: el datasource genérico indexa por ruta de
/// propiedad, la consulta declarativa por alias de columna.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    PropertyPath,
    ColumnAlias,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorField {
    pub name: String,
    #[serde(default)]
    pub property: Option<String>,
    /// Alias en la consulta declarativa (selectores con consulta propia).
    #[serde(default)]
    pub display_alias: Option<String>,
    /// Columna del registro anfitrión donde se copia el valor.
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub outfield: bool,
    #[serde(default)]
    pub sort_no: i64,
}

impl SelectorField {
    /// Clave bajo la cual aparece este campo en una fila candidata.
    pub fn result_key(&self, shape: ResultShape) -> String {
        let preferred = match shape {
            ResultShape::PropertyPath => self.property.as_deref(),
            ResultShape::ColumnAlias => self.display_alias.as_deref(),
        };
        let raw = preferred.filter(|s| !s.is_empty()).unwrap_or(&self.name);
        normalize_path(raw)
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorDescriptor {
    pub id: String,
    /// Entidad sobre la que busca el selector.
    pub entity_name: String,
    /// Cláusula base del alcance del selector.
    #[serde(default)]
    pub where_clause: Option<String>,
    /// Expresión de script evaluada por petición.
    #[serde(default)]
    pub filter_expression: Option<String>,
    #[serde(default)]
    pub custom_query: bool,
    /// Plantilla declarativa con `@additional_filters@` (sólo si `custom_query`).
    #[serde(default)]
    pub query: Option<String>,
    /// Nombre del `SelectorField` cuyo valor identifica al candidato.
    pub value_field: String,
    #[serde(default)]
    pub fields: Vec<SelectorField>,
}

impl SelectorDescriptor {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.value_field().is_none() {
            return Err(DomainError::ValidationError(format!("selector {} has no value field {}",
                                                            self.id, self.value_field)));
        }
        if self.custom_query && self.query.as_deref().map_or(true, str::is_empty) {
            return Err(DomainError::ValidationError(format!("custom selector {} has no query", self.id)));
        }
        Ok(())
    }

    pub fn value_field(&self) -> Option<&SelectorField> {
        self.fields.iter().find(|f| f.name == self.value_field)
    }

    pub fn outfields(&self) -> impl Iterator<Item = &SelectorField> {
        self.fields.iter().filter(|f| f.outfield)
    }

    /// Proyección extra pedida al datasource: campo valor + outfields,
    /// ordenados por `sort_no`, rutas con `$`.
    pub fn extra_properties(&self) -> String {
        let mut selected: Vec<&SelectorField> = self.fields
                                                    .iter()
                                                    .filter(|f| f.name == self.value_field || f.outfield)
                                                    .collect();
        selected.sort_by_key(|f| f.sort_no);
        selected.iter()
                .map(|f| normalize_path(f.property.as_deref().unwrap_or(&f.name)))
                .collect::<Vec<_>>()
                .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sf(name: &str, prop: &str, sort_no: i64, outfield: bool) -> SelectorField {
        SelectorField { name: name.into(),
                        property: Some(prop.into()),
                        display_alias: None,
                        column: None,
                        suffix: None,
                        outfield,
                        sort_no }
    }

    #[test]
    fn extra_properties_are_sorted_and_normalized() {
        let sel = SelectorDescriptor { id: "s".into(),
                                       entity_name: "Product".into(),
                                       where_clause: None,
                                       filter_expression: None,
                                       custom_query: false,
                                       query: None,
                                       value_field: "id".into(),
                                       fields: vec![sf("uom", "uOM.id", 30, true),
                                                    sf("name", "name", 20, false),
                                                    sf("id", "id", 10, false),
                                                    sf("price", "priceList.price", 25, true)] };
        assert_eq!(sel.extra_properties(), "id,priceList$price,uOM$id");
        assert_eq!(sel.outfields().count(), 2);
    }

    #[test]
    fn result_key_falls_back_to_name() {
        let mut f = sf("uom", "uOM.id", 0, true);
        assert_eq!(f.result_key(ResultShape::PropertyPath), "uOM$id");
        assert_eq!(f.result_key(ResultShape::ColumnAlias), "uom");
        f.display_alias = Some("uomId".into());
        assert_eq!(f.result_key(ResultShape::ColumnAlias), "uomId");
    }

    #[test]
    fn custom_selector_requires_query() {
        let sel = SelectorDescriptor { id: "s".into(),
                                       entity_name: "Product".into(),
                                       where_clause: None,
                                       filter_expression: None,
                                       custom_query: true,
                                       query: None,
                                       value_field: "id".into(),
                                       fields: vec![sf("id", "id", 0, false)] };
        assert!(sel.validate().is_err());
    }
}
