use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Derives a record's identity within its topic.
///
/// Must be pure: the same logical record yields the same key whether it
/// arrives in a snapshot or a delta. Records whose key is absent or empty are
/// dropped by the synchronizer.
#[derive(Clone)]
pub struct KeyFn(Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>);

impl KeyFn {
    pub fn new(f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Keys records by one top-level field, e.g. `datapoint_identifier`.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |record| record.get(&name).and_then(key_from_value))
    }

    /// Tries each field in turn and keys by the first usable one.
    pub fn first_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |record| {
            names
                .iter()
                .find_map(|name| record.get(name).and_then(key_from_value))
        })
    }

    /// Applies the key function, treating an empty string as no key.
    pub fn key_of(&self, record: &Value) -> Option<String> {
        (self.0)(record).filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for KeyFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyFn(..)")
    }
}

/// Strings and numbers make keys; everything else does not.
pub fn key_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
