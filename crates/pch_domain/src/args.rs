use crate::error::ConstructError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single keyword argument value offered to a converter constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ArgValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "str",
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Ordered keyword arguments for one construction attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstructArgs(IndexMap<String, ArgValue>);

impl ConstructArgs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_null(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), ArgValue::Null);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fails with a shape mismatch when any key is outside `allowed`.
    pub fn expect_only(&self, converter: &str, allowed: &[&str]) -> Result<(), ConstructError> {
        match self.keys().find(|k| !allowed.contains(k)) {
            Some(unexpected) => Err(ConstructError::ShapeMismatch(format!(
                "{}() got an unexpected keyword argument '{}'",
                converter, unexpected
            ))),
            None => Ok(()),
        }
    }

    /// Fails with a shape mismatch when `key` is absent.
    pub fn require(&self, converter: &str, key: &str) -> Result<&ArgValue, ConstructError> {
        self.get(key).ok_or_else(|| {
            ConstructError::ShapeMismatch(format!(
                "{}() missing 1 required keyword-only argument: '{}'",
                converter, key
            ))
        })
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>, ConstructError> {
        match self.get(key) {
            None | Some(ArgValue::Null) => Ok(None),
            Some(ArgValue::Str(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(type_mismatch(key, "str", other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, ConstructError> {
        match self.get(key) {
            None | Some(ArgValue::Null) => Ok(None),
            Some(ArgValue::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(type_mismatch(key, "int", other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConstructError> {
        match self.get(key) {
            None | Some(ArgValue::Null) => Ok(None),
            Some(ArgValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(type_mismatch(key, "bool", other)),
        }
    }
}

fn type_mismatch(key: &str, expected: &str, got: &ArgValue) -> ConstructError {
    ConstructError::ShapeMismatch(format!(
        "argument '{}' must be {}, not {}",
        key,
        expected,
        got.type_name()
    ))
}

impl fmt::Display for ConstructArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {}", k, v)?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<ArgValue>> FromIterator<(K, V)> for ConstructArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
