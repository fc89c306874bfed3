//! Alcance de privilegios y sesión de una petición.
//!
//! Cada llamada a un colaborador recibe el `RequestScope` explícitamente; no
//! hay estado global de "modo administrador". Los pasos que necesitan leer
//! metadatos o candidatos sin filtrar por rol derivan un alcance elevado con
//! `elevated()`, que sólo vive mientras dura ese paso.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeScope {
    /// Permisos del usuario autenticado.
    #[default]
    User,
    Administrator,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestScope {
    pub privilege: PrivilegeScope,
    /// Variables de sesión (`#AD_Client_ID`, usuario, rol, organización...).
    #[serde(default)]
    pub session: BTreeMap<String, String>,
}

impl RequestScope {
    pub fn new(session: BTreeMap<String, String>) -> Self {
        Self { privilege: PrivilegeScope::User, session }
    }

    /// Copia del alcance con privilegios de administrador.
    pub fn elevated(&self) -> Self {
        Self { privilege: PrivilegeScope::Administrator,
               session: self.session.clone() }
    }

    pub fn is_elevated(&self) -> bool {
        self.privilege == PrivilegeScope::Administrator
    }

    pub fn with_session_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }
}
