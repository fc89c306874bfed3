//! rx-core: motor headless de simulación de formularios y resolución de referencias.
pub mod config;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod naming;
pub mod parent;
pub mod ports;
pub mod replay;
pub mod scope;
pub mod selector;
pub mod upsert;
pub mod values;

pub use config::EngineConfig;
pub use errors::{CollaboratorError, UpsertError};
pub use naming::{input_name, NameTranslator, TranslatorCache};
pub use parent::resolve_parent_id;
pub use ports::{FilterExpressionEvaluator, FormInitParams, FormInitializer, FormMode, GenericSearch, MetadataProvider,
                Persistence, QueryEngine, QueryRow, QueryValue, SearchRequest};
pub use scope::{PrivilegeScope, RequestScope};
pub use upsert::{Resolution, UpsertMethod, UpsertRequest, Upserter, UpserterBuilder};
