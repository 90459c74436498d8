//! Attribute values and value comparison

use crate::error::{Result, RigError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of elements in a flattened 4x4 matrix
pub const MATRIX_LEN: usize = 16;

/// A snapshot of a single attribute's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    #[serde(rename = "bool")]
    Bool(bool),
    #[serde(rename = "int")]
    Int(i64),
    #[serde(rename = "float")]
    Float(f64),
    #[serde(rename = "str")]
    String(String),
    #[serde(rename = "vec")]
    Vector(Vec<f64>),
    /// Row-major 4x4 matrix
    #[serde(rename = "mat")]
    Matrix([f64; MATRIX_LEN]),
}

impl AttrValue {
    /// Rebuild a value from a flattened numeric sequence.
    ///
    /// Sixteen elements reconstruct a 4x4 matrix; any other length is a vector.
    pub fn from_flat(values: Vec<f64>) -> Self {
        match <[f64; MATRIX_LEN]>::try_from(values.as_slice()) {
            Ok(matrix) => AttrValue::Matrix(matrix),
            Err(_) => AttrValue::Vector(values),
        }
    }

    /// Identity matrix, the rest value of most transform matrices
    pub fn identity_matrix() -> Self {
        let mut m = [0.0; MATRIX_LEN];
        for i in 0..4 {
            m[i * 5] = 1.0;
        }
        AttrValue::Matrix(m)
    }

    /// Short name of the semantic type
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::String(_) => "string",
            AttrValue::Vector(_) => "vector",
            AttrValue::Matrix(_) => "matrix",
        }
    }

    /// Numeric view of scalar values (bools count as 0/1)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Element view of vector and matrix values
    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            AttrValue::Vector(v) => Some(v.as_slice()),
            AttrValue::Matrix(m) => Some(m.as_slice()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert a TOML value from a scene snapshot.
    ///
    /// Arrays are flattened (so `[[..4], [..4], [..4], [..4]]` is a matrix too).
    pub fn from_toml(value: &toml::Value) -> Result<Self> {
        match value {
            toml::Value::Boolean(b) => Ok(AttrValue::Bool(*b)),
            toml::Value::Integer(i) => Ok(AttrValue::Int(*i)),
            toml::Value::Float(f) => Ok(AttrValue::Float(*f)),
            toml::Value::String(s) => Ok(AttrValue::String(s.clone())),
            toml::Value::Array(items) => {
                let mut flat = Vec::with_capacity(items.len());
                flatten_numbers(items, &mut flat)?;
                Ok(AttrValue::from_flat(flat))
            }
            other => Err(RigError::TypeMismatch {
                expected: "bool, number, string or numeric array".to_string(),
                got: other.type_str().to_string(),
            }),
        }
    }

    /// Convert to a TOML value for snapshot output
    pub fn to_toml(&self) -> toml::Value {
        match self {
            AttrValue::Bool(b) => toml::Value::Boolean(*b),
            AttrValue::Int(i) => toml::Value::Integer(*i),
            AttrValue::Float(f) => toml::Value::Float(*f),
            AttrValue::String(s) => toml::Value::String(s.clone()),
            AttrValue::Vector(v) => {
                toml::Value::Array(v.iter().map(|f| toml::Value::Float(*f)).collect())
            }
            AttrValue::Matrix(m) => {
                toml::Value::Array(m.iter().map(|f| toml::Value::Float(*f)).collect())
            }
        }
    }
}

fn flatten_numbers(items: &[toml::Value], out: &mut Vec<f64>) -> Result<()> {
    for item in items {
        match item {
            toml::Value::Integer(i) => out.push(*i as f64),
            toml::Value::Float(f) => out.push(*f),
            toml::Value::Array(inner) => flatten_numbers(inner, out)?,
            other => {
                return Err(RigError::TypeMismatch {
                    expected: "number".to_string(),
                    got: other.type_str().to_string(),
                })
            }
        }
    }
    Ok(())
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::String(s) => write!(f, "\"{}\"", s),
            AttrValue::Vector(v) => write!(f, "{:?}", v),
            AttrValue::Matrix(m) => {
                write!(f, "[")?;
                for (row, chunk) in m.chunks(4).enumerate() {
                    if row > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", chunk)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

/// Compares expected and live values according to their semantic type.
///
/// Tolerances of `0.0` mean exact equality, which is the default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueComparer {
    #[serde(default)]
    pub float_tolerance: f64,
    #[serde(default)]
    pub matrix_tolerance: f64,
}

impl ValueComparer {
    pub const EXACT: Self = Self {
        float_tolerance: 0.0,
        matrix_tolerance: 0.0,
    };

    pub fn new(float_tolerance: f64, matrix_tolerance: f64) -> Self {
        Self {
            float_tolerance,
            matrix_tolerance,
        }
    }

    /// Check whether `actual` satisfies `expected`
    pub fn matches(&self, expected: &AttrValue, actual: &AttrValue) -> bool {
        use AttrValue::*;
        match (expected, actual) {
            (String(a), String(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Matrix(a), Matrix(b)) => elements_match(a, b, self.matrix_tolerance),
            (Matrix(a), Vector(b)) | (Vector(b), Matrix(a)) => {
                elements_match(a, b, self.matrix_tolerance)
            }
            (Vector(a), Vector(b)) => elements_match(a, b, self.float_tolerance),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => within(x, y, self.float_tolerance),
                _ => false,
            },
        }
    }
}

fn elements_match(a: &[f64], b: &[f64], tolerance: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| within(*x, *y, tolerance))
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    if tolerance == 0.0 {
        a == b
    } else {
        (a - b).abs() <= tolerance
    }
}
