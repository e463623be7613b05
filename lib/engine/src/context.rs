//! Execution context: the key/value state accumulated as nodes execute.
//!
//! A context has snapshot semantics. Executors receive the context built by
//! their dependencies and return a new context; callers never observe
//! in-place mutation. Values are JSON, which keeps template resolution and
//! round-tripping through the status channel well-defined.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Key/value state threaded through a workflow run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    values: Map<String, JsonValue>,
}

impl ExecutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from a JSON object's fields.
    #[must_use]
    pub fn from_object(values: Map<String, JsonValue>) -> Self {
        Self { values }
    }

    /// Returns the value bound to `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    /// Resolves a dotted path (e.g. `response.data.id`) into the context.
    ///
    /// Returns `None` if any segment is missing or a non-object is indexed.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&JsonValue> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;

        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        Some(current)
    }

    /// Returns a new context equal to this one plus one additional binding.
    ///
    /// An existing binding with the same name is replaced.
    #[must_use]
    pub fn with_value(&self, name: impl Into<String>, value: JsonValue) -> Self {
        let mut values = self.values.clone();
        values.insert(name.into(), value);
        Self { values }
    }

    /// Returns a new context merging `later` over this one.
    ///
    /// On key collision the later context wins, which is what makes fan-in
    /// merging deterministic when applied in edge declaration order.
    #[must_use]
    pub fn merged_with(&self, later: &ExecutionContext) -> Self {
        let mut values = self.values.clone();
        for (name, value) in &later.values {
            values.insert(name.clone(), value.clone());
        }
        Self { values }
    }

    /// Consumes the context, returning its values as a JSON object.
    #[must_use]
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.values)
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the context has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
