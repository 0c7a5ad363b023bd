//! The parameter map sent to Formstack as a query string or form body.
//!
//! Keys keep insertion order so encoded requests are deterministic. Nested
//! JSON values are flattened into bracketed keys (`field_7[first]=Jane`,
//! `options[]=Red`), the convention the API expects for composite fields.

use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert `key` only when `value` is non-empty.
    pub fn insert_non_empty(&mut self, key: impl Into<String>, value: &str) {
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    /// Insert `key = 1` when `flag` is set; omit it otherwise.
    pub fn insert_flag(&mut self, key: impl Into<String>, flag: bool) {
        if flag {
            self.insert(key, 1);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Drop every entry whose value is the empty string.
    pub fn clean(mut self) -> Self {
        self.entries
            .retain(|(_, v)| !matches!(v, Value::String(s) if s.is_empty()));
        self
    }

    /// Flatten into `(key, value)` string pairs ready for form encoding.
    /// `null` values are skipped.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in &self.entries {
            flatten(key, value, &mut out);
        }
        out
    }

    /// `application/x-www-form-urlencoded` rendering of `to_pairs`.
    pub fn encode(&self) -> Result<String, ApiError> {
        serde_urlencoded::to_string(self.to_pairs())
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix.to_string(), if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((prefix.to_string(), n.to_string())),
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Array(items) => {
            let key = format!("{prefix}[]");
            for item in items {
                flatten(&key, item, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                flatten(&format!("{prefix}[{k}]"), v, out);
            }
        }
    }
}
