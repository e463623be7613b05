//! Template resolution for node configuration strings.
//!
//! Configuration fields may reference the execution context with
//! `{{path.to.value}}` placeholders. The `json` helper serializes the
//! referenced value instead of stringifying it: `{{json order}}` against
//! `{order: {"id": 1}}` substitutes `{"id":1}`.
//!
//! Resolution is best-effort: a missing path substitutes the empty string.
//! Callers that require a value must validate the resolved output (the HTTP
//! executor JSON-parses the resolved body) rather than rely on the resolver
//! failing. A string without placeholders is returned unchanged.

use crate::context::ExecutionContext;
use serde_json::Value as JsonValue;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const JSON_HELPER: &str = "json ";

/// Resolves all `{{...}}` placeholders in `template` against `context`.
#[must_use]
pub fn resolve(template: &str, context: &ExecutionContext) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let Some(end) = rest[start + OPEN.len()..].find(CLOSE) else {
            // Unterminated placeholder: keep the remainder verbatim.
            break;
        };

        result.push_str(&rest[..start]);
        let expression = rest[start + OPEN.len()..start + OPEN.len() + end].trim();
        result.push_str(&evaluate(expression, context));
        rest = &rest[start + OPEN.len() + end + CLOSE.len()..];
    }

    result.push_str(rest);
    result
}

/// Evaluates a single placeholder expression.
fn evaluate(expression: &str, context: &ExecutionContext) -> String {
    if let Some(path) = expression.strip_prefix(JSON_HELPER) {
        return match context.lookup(path.trim()) {
            Some(value) => serde_json::to_string(value).unwrap_or_default(),
            None => String::new(),
        };
    }

    match context.lookup(expression) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
