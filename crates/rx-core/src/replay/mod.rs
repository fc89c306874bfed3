//! Reproducción de reglas de negocio (defaults y callouts) del formulario.

pub mod invoker;
pub mod merge;

pub use invoker::{extract_value, ReplayInvoker, ReplayTarget};
pub use merge::{merge_absent, merge_overwrite};
