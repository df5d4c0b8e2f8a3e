//! # Placeholder Types and Captured Values
//!
//! Type system for `{name:type}` placeholders in path templates.
//!
//! Each [`ParamType`] knows two things: the regex character class its
//! placeholder matches, and how to decode the captured text. Decoded values
//! are collected per request into [`CapturedVars`].

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Supported placeholder types
///
/// `Word` is the default: it is used for `{name}` and for any type name
/// that is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// `str` - any run of non-separator characters
    Str,
    /// `word` - alphanumeric/underscore run
    #[default]
    Word,
    /// `int` - optional sign followed by digits, decoded to `i64`
    Int,
    /// `float` - optional sign followed by fractional digits, decoded to `f64`
    Float,
    /// `any` - any characters, greedy, separators included
    Any,
}

impl ParamType {
    /// Look up a type specifier (`"int"` in `{id:int}`)
    ///
    /// Returns `None` for names outside the fixed set.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "str" => Some(Self::Str),
            "word" => Some(Self::Word),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// Resolve a type specifier, degrading unknown names to `Word`
    #[must_use]
    pub fn from_specifier(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Regex fragment matched by a placeholder of this type
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Str => r"[^/]+",
            Self::Word => r"\w+",
            Self::Int => r"[+-]?\d+",
            Self::Float => r"[+-]?\d*\.\d+",
            Self::Any => r".+",
        }
    }

    /// Get the type name for error messages
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Word => "word",
            Self::Int => "int",
            Self::Float => "float",
            Self::Any => "any",
        }
    }

    /// Decode captured text for placeholder `name`
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` when the text does not fit the numeric type,
    /// e.g. an integer that overflows `i64`.
    pub fn decode(self, name: &str, raw: &str) -> Result<ParamValue> {
        let fail = || Error::Decode {
            name: name.to_string(),
            value: raw.to_string(),
            expected: self,
        };
        match self {
            Self::Str | Self::Word | Self::Any => Ok(ParamValue::Str(raw.to_string())),
            Self::Int => raw.parse::<i64>().map(ParamValue::Int).map_err(|_| fail()),
            Self::Float => raw
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| fail()),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Decoded placeholder value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Text value (`str`, `word`, `any`)
    Str(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
}

impl ParamValue {
    /// Get as i64 if Int variant
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if Float variant
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if Str variant
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Typed captures of one matched request
///
/// Read-only once built. Lookups of names the route did not declare fail
/// with `Error::AttributeNotFound`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CapturedVars {
    values: HashMap<String, ParamValue>,
}

impl CapturedVars {
    /// Create an empty capture set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a captured value by placeholder name
    ///
    /// # Errors
    ///
    /// Returns `Error::AttributeNotFound` if the route has no such placeholder.
    pub fn get(&self, name: &str) -> Result<&ParamValue> {
        self.values.get(name).ok_or_else(|| Error::AttributeNotFound {
            name: name.to_string(),
        })
    }

    /// Get a captured integer
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` for unknown names, `AttributeTypeMismatch` if the
    /// placeholder was not declared `int`.
    pub fn int(&self, name: &str) -> Result<i64> {
        self.get(name)?.as_int().ok_or_else(|| mismatch(name, "int"))
    }

    /// Get a captured float
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` for unknown names, `AttributeTypeMismatch` if the
    /// placeholder was not declared `float`.
    pub fn float(&self, name: &str) -> Result<f64> {
        self.get(name)?
            .as_float()
            .ok_or_else(|| mismatch(name, "float"))
    }

    /// Get a captured string
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` for unknown names, `AttributeTypeMismatch` for
    /// numeric placeholders.
    pub fn str(&self, name: &str) -> Result<&str> {
        self.get(name)?.as_str().ok_or_else(|| mismatch(name, "str"))
    }

    /// Check if a placeholder was captured
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of captured placeholders
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, ParamValue)> for CapturedVars {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn mismatch(name: &str, expected: &'static str) -> Error {
    Error::AttributeTypeMismatch {
        name: name.to_string(),
        expected,
    }
}
