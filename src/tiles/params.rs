//! Filter parameters sent with tile requests.
//!
//! Values are JSON scalars or arrays. On the query string an array becomes one
//! `key=value` pair per element, in array order; in a POST body the
//! parameters are sent as the JSON object itself.

use url::form_urlencoded;

use crate::{MapError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, serde_json::Value)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from a JSON object; anything else is a configuration error.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(Self {
                entries: map.into_iter().collect(),
            }),
            serde_json::Value::Null => Ok(Self::new()),
            other => Err(MapError::Configuration(format!(
                "query parameters must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a parameter, keeping its original position when it already exists
    pub fn set(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Overlays `other`; its values win for keys present in both.
    pub fn merge(&mut self, other: QueryParams) {
        for (key, value) in other.entries {
            self.set(&key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened `(key, value)` pairs as they go on the wire. Nulls are
    /// dropped; arrays repeat the key per element.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                serde_json::Value::Array(items) => {
                    pairs.extend(
                        items
                            .iter()
                            .filter_map(scalar_to_string)
                            .map(|item| (key.clone(), item)),
                    );
                }
                scalar => {
                    if let Some(item) = scalar_to_string(scalar) {
                        pairs.push((key.clone(), item));
                    }
                }
            }
        }
        pairs
    }

    /// `application/x-www-form-urlencoded` query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }

    /// The parameters as a JSON object, for POST bodies
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.entries.iter().cloned().collect())
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
