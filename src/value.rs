use std::fmt;

use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::errors::{Error, Result};

/// A value produced or consumed by the evaluator.
///
/// `Value` is the exchange type between host code and scripts: host data is
/// encoded into it before a run (see the `From` impls below) and results are
/// decoded out of it with the strict `as_*` accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Fixnum(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Array(Vec<Value>),
    /// Insertion-ordered key/value pairs. Keys may be any value.
    Hash(Vec<(Value, Value)>),
}

/// Discriminant of a [`Value`], used in diagnostics and conversion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Nil,
    Bool,
    Fixnum,
    Float,
    Str,
    Symbol,
    Array,
    Hash,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Nil => "nil",
            ValueType::Bool => "bool",
            ValueType::Fixnum => "fixnum",
            ValueType::Float => "float",
            ValueType::Str => "string",
            ValueType::Symbol => "symbol",
            ValueType::Array => "array",
            ValueType::Hash => "hash",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Bool(_) => ValueType::Bool,
            Value::Fixnum(_) => ValueType::Fixnum,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Symbol(_) => ValueType::Symbol,
            Value::Array(_) => ValueType::Array,
            Value::Hash(_) => ValueType::Hash,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_fixnum(&self) -> bool {
        matches!(self, Value::Fixnum(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_hash(&self) -> bool {
        matches!(self, Value::Hash(_))
    }

    /// Only `nil` and `false` are falsey.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    fn type_error(&self, expected: ValueType) -> Error {
        Error::InvalidType {
            expected,
            actual: self.value_type(),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.type_error(ValueType::Bool)),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Fixnum(n) => Ok(*n),
            _ => Err(self.type_error(ValueType::Fixnum)),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            _ => Err(self.type_error(ValueType::Float)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(self.type_error(ValueType::Str)),
        }
    }

    pub fn as_symbol(&self) -> Result<&str> {
        match self {
            Value::Symbol(s) => Ok(s),
            _ => Err(self.type_error(ValueType::Symbol)),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(self.type_error(ValueType::Array)),
        }
    }

    pub fn as_hash(&self) -> Result<&[(Value, Value)]> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(self.type_error(ValueType::Hash)),
        }
    }

    /// Numeric view used by arithmetic promotion. `None` for non-numbers.
    pub(crate) fn as_number(&self) -> Option<f64> {
        match self {
            Value::Fixnum(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Reparseable literal form: strings quoted and escaped, `nil` spelled
    /// out, arrays and hashes bracketed.
    pub fn inspect(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Fixnum(n) => n.to_string(),
            Value::Float(f) => fmt_float(*f),
            Value::Str(s) => format!("\"{}\"", escape_str(s)),
            Value::Symbol(s) => format!(":{s}"),
            Value::Array(items) => {
                format!("[{}]", items.iter().map(Value::inspect).join(", "))
            }
            Value::Hash(pairs) => format!(
                "{{{}}}",
                pairs
                    .iter()
                    .map(|(k, v)| format!("{} => {}", k.inspect(), v.inspect()))
                    .join(", ")
            ),
        }
    }

    /// Converts to a `serde_json::Value`. Symbols become strings, non-string
    /// hash keys are rendered through their literal form, and non-finite
    /// floats collapse to JSON null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Fixnum(n) => serde_json::Value::Number((*n).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) | Value::Symbol(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Hash(pairs) => {
                let mut map = serde_json::Map::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let key = match k {
                        Value::Str(s) => s.clone(),
                        other => other.inspect(),
                    };
                    map.insert(key, v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Builds a value from a `serde_json::Value`. Integers that fit an i64
    /// stay fixnums; everything else numeric becomes a float.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Fixnum(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Hash(
                map.iter()
                    .map(|(k, v)| (Value::Str(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// The "puts" form: strings print raw, nil prints nothing, floats always
/// carry a decimal point, containers print their literal form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Fixnum(n) => write!(f, "{n}"),
            Value::Float(x) => f.write_str(&fmt_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::Symbol(s) => f.write_str(s),
            Value::Array(_) | Value::Hash(_) => f.write_str(&self.inspect()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn fmt_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Fixnum(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Fixnum(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Fixnum(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}
