//! Parameter Store: typed key/value view over a parsed vendor header.
//!
//! Vendor parsers fill a [`ParameterMap`] (or implement [`ParameterStore`]
//! on their own record type) and the readers query it through the typed
//! accessors.  All accessors are read-only; a key that is absent yields
//! [`NmrDataError::MissingParameter`] from the `get`-style calls and `None`
//! from the `optional`-style calls.

use crate::error::{NmrDataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ─── Values ─────────────────────────────────────────────────────────────────

/// One typed header value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    NumberList(Vec<f64>),
    TextList(Vec<String>),
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl Value {
    /// Scalar as `f64`; a list yields its first element.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(s) => parse_number(s),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::NumberList(v) => v.first().copied(),
            Value::TextList(v) => v.first().and_then(|s| parse_number(s)),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|v| v.round() as i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(v) => Some(*v != 0.0),
            Value::Text(s) => parse_bool(s),
            Value::NumberList(v) => v.first().map(|x| *x != 0.0),
            Value::TextList(v) => v.first().and_then(|s| parse_bool(s)),
        }
    }

    /// Scalar as text; a list yields its first element (empty for an empty list).
    pub fn as_string(&self) -> String {
        match self {
            Value::Number(v) => format_number(*v),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::NumberList(v) => v.first().map(|x| format_number(*x)).unwrap_or_default(),
            Value::TextList(v) => v.first().cloned().unwrap_or_default(),
        }
    }

    /// All elements as numbers; a scalar yields a one-element list.
    pub fn as_f64_list(&self) -> Option<Vec<f64>> {
        match self {
            Value::NumberList(v) => Some(v.clone()),
            Value::TextList(v) => v.iter().map(|s| parse_number(s)).collect(),
            other => other.as_f64().map(|x| vec![x]),
        }
    }

    pub fn as_string_list(&self) -> Vec<String> {
        match self {
            Value::NumberList(v) => v.iter().map(|x| format_number(*x)).collect(),
            Value::TextList(v) => v.clone(),
            other => vec![other.as_string()],
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::NumberList(_) | Value::TextList(_))
    }
}

/// Integral values print without a trailing `.0`.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::NumberList(_) | Value::TextList(_) => {
                write!(f, "{}", self.as_string_list().join(","))
            }
            other => write!(f, "{}", other.as_string()),
        }
    }
}

/// A `(name, value)` pair for display listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPar {
    pub name: String,
    pub value: String,
}

impl VendorPar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ─── Store trait ────────────────────────────────────────────────────────────

/// Read-only typed access to header records.
pub trait ParameterStore {
    /// The value stored under `key`, if any.
    fn optional(&self, key: &str) -> Option<&Value>;

    /// Every record in document order.
    fn entries(&self) -> Vec<(&str, &Value)>;

    fn contains(&self, key: &str) -> bool {
        self.optional(key).is_some()
    }

    fn get(&self, key: &str) -> Result<&Value> {
        self.optional(key).ok_or_else(|| NmrDataError::missing(key))
    }

    fn string_value(&self, key: &str) -> Result<String> {
        Ok(self.get(key)?.as_string())
    }

    fn double_value(&self, key: &str) -> Result<f64> {
        self.get(key)?.as_f64().ok_or_else(|| NmrDataError::ParameterType {
            key: key.to_string(),
            expected: "number",
        })
    }

    fn int_value(&self, key: &str) -> Result<i64> {
        self.get(key)?.as_i64().ok_or_else(|| NmrDataError::ParameterType {
            key: key.to_string(),
            expected: "integer",
        })
    }

    fn bool_value(&self, key: &str) -> Result<bool> {
        self.get(key)?.as_bool().ok_or_else(|| NmrDataError::ParameterType {
            key: key.to_string(),
            expected: "boolean",
        })
    }

    fn double_list(&self, key: &str) -> Result<Vec<f64>> {
        self.get(key)?
            .as_f64_list()
            .ok_or_else(|| NmrDataError::ParameterType {
                key: key.to_string(),
                expected: "number list",
            })
    }

    fn int_list(&self, key: &str) -> Result<Vec<i64>> {
        Ok(self
            .double_list(key)?
            .into_iter()
            .map(|v| v.round() as i64)
            .collect())
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.get(key)?.as_string_list())
    }

    fn optional_double(&self, key: &str) -> Option<f64> {
        self.optional(key).and_then(Value::as_f64)
    }

    fn optional_string(&self, key: &str) -> Option<String> {
        self.optional(key).map(Value::as_string)
    }

    /// Display listing of every record.
    fn pars(&self) -> Vec<VendorPar> {
        self.entries()
            .into_iter()
            .map(|(k, v)| VendorPar::new(k, v.to_string()))
            .collect()
    }
}

// ─── Ordered map ────────────────────────────────────────────────────────────

/// Insertion-ordered record set with O(1) lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced record keeps its position.
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }

    /// Insert only when the key is not yet present (first occurrence wins).
    pub fn put_if_absent(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.index.contains_key(&key) {
            return false;
        }
        self.put(key, value);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl ParameterStore for ParameterMap {
    fn optional(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    fn entries(&self) -> Vec<(&str, &Value)> {
        self.iter().collect()
    }
}

impl FromIterator<(String, Value)> for ParameterMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut map = ParameterMap::new();
        for (k, v) in iter {
            map.put(k, v);
        }
        map
    }
}
