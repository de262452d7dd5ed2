//! Normalized JSON values.
//!
//! Worker replies use camelCase keys (`fromId`, `isInfo`, ...). Every reply is
//! converted once into a `NormalizedValue` whose object keys are snake_case at
//! every depth, so callers address fields uniformly regardless of the wire's
//! naming. Leaf values are never touched.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BotError, Result};

#[allow(clippy::expect_used)]
fn literal(pattern: &str) -> Regex {
    Regex::new(pattern).expect("literal pattern")
}

static BEFORE_WORD: LazyLock<Regex> = LazyLock::new(|| literal(r"(.)([A-Z][a-z]+)"));
static DOUBLE_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| literal(r"__([A-Z])"));
static LOWER_UPPER: LazyLock<Regex> = LazyLock::new(|| literal(r"([a-z0-9])([A-Z])"));

/// Convert a camelCase (or PascalCase) key to snake_case.
///
/// Already snake_case keys are returned unchanged.
pub fn snake_case(key: &str) -> String {
    let s = BEFORE_WORD.replace_all(key, "${1}_${2}");
    let s = DOUBLE_UNDERSCORE.replace_all(&s, "_${1}");
    let s = LOWER_UPPER.replace_all(&s, "${1}_${2}");
    s.to_lowercase()
}

/// Recursively snake_case every object key.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (snake_case(&k), normalize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// A JSON value whose object keys are snake_case at every depth.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct NormalizedValue(Value);

impl NormalizedValue {
    /// Normalize `value`. Normalizing twice is a no-op.
    pub fn new(value: Value) -> Self {
        Self(normalize(value))
    }

    /// Look up an object field. The key is normalized too, so `fromId` and
    /// `from_id` address the same field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let map = self.0.as_object()?;
        map.get(key).or_else(|| map.get(&snake_case(key)))
    }

    /// Walk nested objects by field name.
    pub fn path(&self, keys: &[&str]) -> Option<&Value> {
        let mut cur = &self.0;
        for key in keys {
            let map = cur.as_object()?;
            cur = map.get(*key).or_else(|| map.get(&snake_case(key)))?;
        }
        Some(cur)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Deserialize into a typed value (field names are snake_case).
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.0.clone())
            .map_err(|e| BotError::Decode(format!("unexpected result shape: {e}")))
    }
}

impl From<Value> for NormalizedValue {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl From<NormalizedValue> for Value {
    fn from(value: NormalizedValue) -> Self {
        value.0
    }
}
