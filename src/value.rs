//! Parameter values and Python-level types.
//!
//! Notebook parameters are Python literals; [`ParamValue`] models the subset
//! a parameter cell may contain and [`PyType`] the types the engine resolves
//! parameters to.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parameter default or argument value.
///
/// Serializes through its JSON form ([`ParamValue::to_json`]).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
    Mapping(Vec<(ParamValue, ParamValue)>),
}

impl ParamValue {
    /// Python type of this value; `None` for null.
    pub fn py_type(&self) -> Option<PyType> {
        match self {
            ParamValue::Null => None,
            ParamValue::Bool(_) => Some(PyType::Bool),
            ParamValue::Int(_) => Some(PyType::Int),
            ParamValue::Float(_) => Some(PyType::Float),
            ParamValue::Str(_) => Some(PyType::Str),
            ParamValue::List(_) => Some(PyType::List),
            ParamValue::Mapping(_) => Some(PyType::Dict),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Numeric value of ints and floats. Booleans are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert from JSON. Integral JSON numbers become `Int`; object keys
    /// become `Str` keys.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ParamValue::Str(s),
            Value::Array(items) => {
                ParamValue::List(items.into_iter().map(ParamValue::from_json).collect())
            }
            Value::Object(map) => ParamValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (ParamValue::Str(k), ParamValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. Non-string mapping keys are rendered with their
    /// Python repr; non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            ParamValue::Null => Value::Null,
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            ParamValue::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            ParamValue::Str(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(ParamValue::from_json)
    }
}

impl std::fmt::Display for ParamValue {
    /// Python repr.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Null => write!(f, "None"),
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write_float(f, *v),
            ParamValue::Str(s) => write_str(f, s),
            ParamValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ParamValue::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Floats as Python prints them: scientific notation from 1e16 up and
/// below 1e-4, a trailing `.0` on integral values.
fn write_float(f: &mut std::fmt::Formatter<'_>, v: f64) -> std::fmt::Result {
    if v.is_nan() {
        return f.write_str("nan");
    }
    if v.is_infinite() {
        return f.write_str(if v > 0.0 { "inf" } else { "-inf" });
    }
    let magnitude = v.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let sci = format!("{v:e}");
        let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let (sign, digits) = match exp.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exp),
        };
        return write!(f, "{mantissa}e{sign}{digits:0>2}");
    }
    if v.fract() == 0.0 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

/// Strings as Python prints them: single quotes unless the text contains a
/// single quote and no double quote.
fn write_str(f: &mut std::fmt::Formatter<'_>, s: &str) -> std::fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

/// Python-level parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PyType {
    Bool,
    Int,
    Float,
    Str,
    List,
    Dict,
}

impl PyType {
    /// Parse a bare Python type name (`float`, `Dict`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(PyType::Bool),
            "int" => Some(PyType::Int),
            "float" => Some(PyType::Float),
            "str" => Some(PyType::Str),
            "list" | "List" | "tuple" | "Tuple" => Some(PyType::List),
            "dict" | "Dict" => Some(PyType::Dict),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PyType::Bool => "bool",
            PyType::Int => "int",
            PyType::Float => "float",
            PyType::Str => "str",
            PyType::List => "list",
            PyType::Dict => "dict",
        }
    }
}

impl std::fmt::Display for PyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PyType::from_name(s.trim()).ok_or_else(|| format!("unknown python type: {s}"))
    }
}
