// rx-domain library entry point
//
// Modelo de metadatos de sólo lectura que describe una ventana/pestaña del
// ERP: campos ordenados, columnas físicas y selectores de referencia.
pub mod definition;
pub mod error;
pub mod selector;

pub use definition::{normalize_path, ColumnDescriptor, FieldDescriptor, RecordDefinition, ReferenceKind, ValueKind};
pub use error::DomainError;
pub use selector::{ResultShape, SelectorDescriptor, SelectorField};

/// Payload plano clave→valor. El orden de inserción se conserva
/// (`serde_json` con `preserve_order`), lo que hace determinista el orden de
/// iteración del cuerpo de la petición.
pub type Payload = serde_json::Map<String, serde_json::Value>;
