//! Items as delivered by the data layer
use serde_json::Value;

use crate::errors::InjectError;

/// String values that check a checkbox
const TRUTHY_VALUES: [&str; 5] = ["true", "on", "yes", "1", "checked"];

/// One record: key/value pairs in payload order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    fields: Vec<(String, String)>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets a field. An existing key keeps its position.
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.fields.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, existing)) => value.clone_into(existing),
            None => self.fields.push((key.to_owned(), value.to_owned())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds an item from a JSON object. Scalars become their text, null becomes empty and
    /// nested arrays or objects are kept as compact JSON.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err(format!("expected an object, got {}", kind_of(value)));
        };

        let mut item = Item::new();
        for (key, value) in map {
            item.insert(key, &value_text(value));
        }
        Ok(item)
    }

    /// Decodes a payload holding either an array of objects or a single object. The slot name is
    /// only used to report failures.
    pub fn parse_list(slot: &str, payload: &str) -> Result<Vec<Self>, InjectError> {
        let failure = |reason: String| InjectError::DataInjectionFailure {
            slot: slot.to_owned(),
            reason,
        };

        let value: Value = serde_json::from_str(payload).map_err(|err| failure(format!("invalid json: {err}")))?;
        match &value {
            Value::Array(values) => values
                .iter()
                .enumerate()
                .map(|(idx, value)| Item::from_value(value).map_err(|reason| failure(format!("item {idx}: {reason}"))))
                .collect(),
            Value::Object(_) => Item::from_value(&value).map(|item| vec![item]).map_err(failure),
            other => Err(failure(format!("expected an array or an object, got {}", kind_of(other)))),
        }
    }
}

/// Whether a value checks a checkbox
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    TRUTHY_VALUES.iter().any(|truthy| value.eq_ignore_ascii_case(truthy))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
