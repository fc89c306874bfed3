//! Definición de registro (pestaña) y sus campos.
//!
//! Una `RecordDefinition` es la vista de sólo lectura que el proveedor de
//! metadatos entrega por petición. El orden de `fields` es significativo: la
//! resolución del padre y la construcción de las tablas de nombres lo
//! recorren en orden de declaración.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::selector::SelectorDescriptor;

/// Convierte una ruta de propiedad con puntos a su forma normalizada
/// (`businessPartner.name` → `businessPartner$name`).
pub fn normalize_path(path: &str) -> String {
    path.replace('.', "$")
}

/// Tipo de referencia de una columna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Valor primitivo, sin referencia a otra tabla.
    #[default]
    Primitive,
    Table,
    TableDir,
    /// Selector de búsqueda genérico (datasource paginado).
    Search,
    /// Selector definido con consulta propia.
    CustomSelector,
}

impl ReferenceKind {
    /// Sólo los selectores llevan un `SelectorDescriptor` asociado.
    pub fn owns_selector(&self) -> bool {
        matches!(self, ReferenceKind::Search | ReferenceKind::CustomSelector)
    }
}

/// Tipo lógico del valor almacenado en la columna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Nombre físico de la columna (`M_Product_ID`).
    pub db_name: String,
    /// Ruta de propiedad del modelo (`product`). `None` si la columna no se
    /// puede mapear a una propiedad.
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub link_to_parent: bool,
    /// Entidad a la que apunta la columna cuando es una referencia.
    #[serde(default)]
    pub referenced_entity: Option<String>,
    #[serde(default)]
    pub reference: ReferenceKind,
    #[serde(default)]
    pub value_kind: ValueKind,
    #[serde(default)]
    pub selector: Option<SelectorDescriptor>,
}

impl ColumnDescriptor {
    /// Nombre normalizado (`.` → `$`), o `None` para columnas sin propiedad.
    pub fn normalized_name(&self) -> Option<String> {
        self.property.as_deref().filter(|p| !p.is_empty()).map(normalize_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    pub column: ColumnDescriptor,
    /// Cláusula estática con el token `@id@`, propia del campo (no del selector).
    #[serde(default)]
    pub headless_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDefinition {
    pub id: String,
    pub name: String,
    pub entity_name: String,
    /// Entidad del registro padre cuando la definición es hija de otra.
    #[serde(default)]
    pub parent_entity: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDefinition {
    pub fn from_json_str(raw: &str) -> Result<Self, DomainError> {
        let def: RecordDefinition = serde_json::from_str(raw)?;
        def.validate()?;
        Ok(def)
    }

    /// Comprueba las invariantes de una definición: columnas y propiedades
    /// únicas, y selectores coherentes con el tipo de referencia.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut columns = HashSet::new();
        let mut properties = HashSet::new();
        for field in &self.fields {
            let col = &field.column;
            if !columns.insert(col.db_name.to_ascii_lowercase()) {
                return Err(DomainError::ValidationError(format!("duplicated column {} in {}", col.db_name, self.id)));
            }
            if let Some(norm) = col.normalized_name() {
                if !properties.insert(norm.clone()) {
                    return Err(DomainError::ValidationError(format!("duplicated property {norm} in {}", self.id)));
                }
            }
            if let Some(selector) = &col.selector {
                if !col.reference.owns_selector() {
                    return Err(DomainError::ValidationError(format!("column {} has a selector but reference {:?}",
                                                                    col.db_name, col.reference)));
                }
                selector.validate()?;
            }
        }
        Ok(())
    }

    /// Busca el campo cuyo nombre normalizado coincide con `normalized`.
    pub fn field_by_normalized(&self, normalized: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.column.normalized_name().as_deref() == Some(normalized))
    }

    pub fn field_by_column(&self, db_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.column.db_name.eq_ignore_ascii_case(db_name))
    }

    /// Campos enlazados al padre, en orden de declaración.
    pub fn link_to_parent_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.column.link_to_parent)
    }

    /// Propiedades que referencian realmente al registro padre: columnas
    /// link-to-parent cuya entidad referenciada es la entidad padre.
    pub fn parent_properties(&self) -> Vec<String> {
        let Some(parent) = self.parent_entity.as_deref() else {
            return Vec::new();
        };
        self.link_to_parent_fields()
            .filter(|f| f.column.referenced_entity.as_deref() == Some(parent))
            .filter_map(|f| f.column.normalized_name())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(db: &str, prop: Option<&str>) -> ColumnDescriptor {
        ColumnDescriptor { db_name: db.into(),
                           property: prop.map(String::from),
                           link_to_parent: false,
                           referenced_entity: None,
                           reference: ReferenceKind::Primitive,
                           value_kind: ValueKind::String,
                           selector: None }
    }

    fn field(id: &str, col: ColumnDescriptor) -> FieldDescriptor {
        FieldDescriptor { id: id.into(), name: id.into(), column: col, headless_filter: None }
    }

    #[test]
    fn normalized_name_replaces_dots() {
        let col = column("C_BPartner_ID", Some("businessPartner.name"));
        assert_eq!(col.normalized_name().as_deref(), Some("businessPartner$name"));
        assert_eq!(column("X", None).normalized_name(), None);
        assert_eq!(column("X", Some("")).normalized_name(), None);
    }

    #[test]
    fn duplicated_column_is_rejected() {
        let def = RecordDefinition { id: "d".into(),
                                     name: "d".into(),
                                     entity_name: "D".into(),
                                     parent_entity: None,
                                     fields: vec![field("1", column("A", Some("a"))), field("2", column("a", Some("b")))] };
        assert!(matches!(def.validate(), Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn parent_properties_require_matching_entity() {
        let mut order = column("C_Order_ID", Some("salesOrder"));
        order.link_to_parent = true;
        order.referenced_entity = Some("Order".into());
        let mut other = column("C_Other_ID", Some("other"));
        other.link_to_parent = true;
        other.referenced_entity = Some("Other".into());
        let mut def = RecordDefinition { id: "line".into(),
                                         name: "Lines".into(),
                                         entity_name: "OrderLine".into(),
                                         parent_entity: Some("Order".into()),
                                         fields: vec![field("1", other), field("2", order)] };
        assert_eq!(def.parent_properties(), vec!["salesOrder".to_string()]);
        assert_eq!(def.link_to_parent_fields().count(), 2);

        def.parent_entity = None;
        assert!(def.parent_properties().is_empty());
    }
}
