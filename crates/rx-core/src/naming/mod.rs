//! Traducción de nombres de campo (físico / normalizado / input) y su cache.

pub mod cache;
pub mod fingerprint;
pub mod translator;

pub use cache::TranslatorCache;
pub use fingerprint::fields_fingerprint;
pub use translator::{input_name, transform_column_name, FieldNames, NameTranslator, NormalizedName};
