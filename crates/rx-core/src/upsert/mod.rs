//! Pipeline de creación/actualización.

pub mod request;
pub mod upserter;

pub use request::{Resolution, UpsertMethod, UpsertRequest};
pub use upserter::{first_changed_field, Upserter, UpserterBuilder};
