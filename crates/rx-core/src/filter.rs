//! Construcción de fragmentos de filtro dinámicos.
//!
//! Tres mecanismos independientes, siempre compuestos en este orden:
//! 1. cláusula headless del campo (`@id@` → valor del campo cambiado);
//! 2. expresión de script del selector, evaluada por petición;
//! 3. sustitución de variables de sesión `@COLUMNA@` con valores del payload.
//!
//! Los valores se insertan entre comillas simples; las comillas internas se
//! duplican.

use std::collections::BTreeMap;

use log::debug;
use regex::{NoExpand, RegexBuilder};
use rx_domain::{FieldDescriptor, Payload, SelectorDescriptor};

use crate::constants::{ADDITIONAL_FILTERS_TOKEN, ID_TOKEN};
use crate::errors::UpsertError;
use crate::naming::NameTranslator;
use crate::ports::FilterExpressionEvaluator;
use crate::scope::RequestScope;
use crate::values::as_text;

/// Reemplaza todas las apariciones de `token` sin distinguir mayúsculas.
pub fn replace_token_ci(template: &str, token: &str, replacement: &str) -> String {
    match RegexBuilder::new(&regex::escape(token)).case_insensitive(true).build() {
        Ok(re) => re.replace_all(template, NoExpand(replacement)).into_owned(),
        Err(_) => template.to_string(),
    }
}

pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Aplana el payload a strings para el datasource y el motor de scripts.
pub fn flatten_payload(payload: &Payload) -> BTreeMap<String, String> {
    payload.iter()
           .map(|(k, v)| (k.clone(), as_text(v).unwrap_or_default()))
           .collect()
}

/// Cláusula headless del campo, ya sustituida y precedida de `" AND "`.
/// Cadena vacía si el campo no la define.
pub fn headless_filter_clause(field: &FieldDescriptor, changed_input: &str, payload: &Payload) -> String {
    let Some(clause) = field.headless_filter.as_deref().filter(|c| !c.trim().is_empty()) else {
        return String::new();
    };
    let value = payload.get(changed_input).and_then(as_text).unwrap_or_default();
    format!(" AND {}", replace_token_ci(clause, ID_TOKEN, &quote(&value)))
}

/// Contribución de la expresión de script del selector, precedida de
/// `" AND "` si produce algo.
pub fn script_filter_clause(evaluator: Option<&dyn FilterExpressionEvaluator>,
                            scope: &RequestScope,
                            selector: &SelectorDescriptor,
                            parameters: &BTreeMap<String, String>)
                            -> Result<String, UpsertError> {
    let Some(expression) = selector.filter_expression.as_deref().filter(|e| !e.trim().is_empty()) else {
        return Ok(String::new());
    };
    let evaluator = evaluator.ok_or_else(|| {
                                 UpsertError::Script(format!("selector {} has a filter expression but no evaluator is configured",
                                                             selector.id))
                             })?;
    let result = evaluator.evaluate(scope, expression, parameters)
                          .map_err(|e| UpsertError::Script(format!("selector {}: {e}", selector.id)))?;
    match result {
        Some(s) if !s.trim().is_empty() => Ok(format!(" AND {s}")),
        _ => Ok(String::new()),
    }
}

/// Sustituye `@COLUMNA@` por el valor del payload para cada columna cuyo
/// input está presente. Los tokens sin valor quedan intactos.
pub fn substitute_session_variables(fragment: &str, translator: &NameTranslator, payload: &Payload) -> String {
    let mut result = fragment.to_string();
    for (db_name, input) in translator.db_to_input() {
        if let Some(value) = payload.get(input) {
            let value = as_text(value).unwrap_or_default();
            result = replace_token_ci(&result, &format!("@{db_name}@"), &quote(&value));
        }
    }
    result
}

/// Inserta los filtros adicionales en la plantilla de una consulta propia.
///
/// Sin filtros, `and @additional_filters@` desaparece completo y cualquier
/// marcador restante pasa a ser `1 = 1`. Con filtros, el `AND` inicial de la
/// contribución se omite: el conector ya lo pone la plantilla.
pub fn apply_additional_filters(template: &str, additional: &str) -> String {
    if additional.trim().is_empty() {
        let stripped = match RegexBuilder::new(&format!(r"\s*\band\s+{}", regex::escape(ADDITIONAL_FILTERS_TOKEN)))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re.replace_all(template, "").into_owned(),
            Err(_) => template.to_string(),
        };
        return replace_token_ci(&stripped, ADDITIONAL_FILTERS_TOKEN, "1 = 1");
    }
    let body = strip_leading_and(additional);
    debug!("additional filters: {body}");
    replace_token_ci(template, ADDITIONAL_FILTERS_TOKEN, body)
}

/// Quita un `AND` inicial (y los espacios) de una contribución.
pub fn strip_leading_and(fragment: &str) -> &str {
    let trimmed = fragment.trim_start();
    match trimmed.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("and ") => trimmed[4..].trim_start(),
        _ => trimmed,
    }
}

/// Une la cláusula base del selector con las contribuciones dinámicas.
pub fn compose_where_clause(base: Option<&str>, contributions: &str) -> String {
    match base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(b) => format!("{b}{contributions}"),
        None => strip_leading_and(contributions).to_string(),
    }
}
