//! Evaluador de expresiones de filtro por plantilla.
//!
//! No ejecuta scripts: sustituye `@clave@` por los parámetros de la petición
//! y `@#variable@` por las variables de sesión. Una expresión que queda vacía
//! equivale a "sin filtro"; un token `@nombre@` sin valor es un error del
//! script.

use std::collections::BTreeMap;

use regex::Regex;
use rx_core::filter::{quote, replace_token_ci};
use rx_core::{CollaboratorError, FilterExpressionEvaluator, RequestScope};

const TOKEN_PATTERN: &str = r"@([A-Za-z0-9_#]+)@";

#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateExpressionEvaluator;

impl FilterExpressionEvaluator for TemplateExpressionEvaluator {
    fn evaluate(&self, scope: &RequestScope, expression: &str, parameters: &BTreeMap<String, String>)
                -> Result<Option<String>, CollaboratorError> {
        let tokens = Regex::new(TOKEN_PATTERN).map_err(|e| CollaboratorError::Rejected(e.to_string()))?;
        let is_known = |name: &str| parameters.keys().chain(scope.session.keys()).any(|k| k.eq_ignore_ascii_case(name));
        // tokens de la expresión original; los valores sustituidos pueden contener '@'
        if let Some(missing) = tokens.captures_iter(expression)
                                     .filter_map(|c| c.get(1))
                                     .find(|name| !is_known(name.as_str()))
        {
            return Err(CollaboratorError::Rejected(format!("unresolved token @{}@ in expression: {expression}",
                                                           missing.as_str())));
        }

        let mut out = expression.to_string();
        for (k, v) in parameters.iter().chain(scope.session.iter()) {
            out = replace_token_ci(&out, &format!("@{k}@"), &quote(v));
        }
        let out = out.trim();
        Ok((!out.is_empty()).then(|| out.to_string()))
    }
}
