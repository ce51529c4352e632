//! Player settings documents (crosshair, viewmodel, launch options, ...).
//!
//! Settings are stored as one JSON object per player and updated with
//! JSON merge patches (RFC 7386).

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Player settings must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Apply `patch` to `target` in place.
///
/// Objects merge key by key, `null` removes a key, anything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(target_map) = target else {
        return;
    };

    for (key, value) in patch_map {
        if value.is_null() {
            target_map.remove(key);
        } else {
            merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
        }
    }
}

/// A player's settings document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSettings {
    document: Map<String, Value>,
}

impl PlayerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        match value {
            Value::Object(document) => Ok(Self { document }),
            Value::Null => Ok(Self::new()),
            other => Err(SettingsError::NotAnObject(kind(&other))),
        }
    }

    /// Merge `patch` into the document. The patch must be an object, since
    /// anything else would replace the whole document.
    pub fn apply(&mut self, patch: &Value) -> Result<(), SettingsError> {
        if !patch.is_object() {
            return Err(SettingsError::NotAnObject(kind(patch)));
        }
        let mut merged = Value::Object(std::mem::take(&mut self.document));
        merge_patch(&mut merged, patch);
        if let Value::Object(document) = merged {
            self.document = document;
        }
        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.document.get(name)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.document.clone())
    }
}
