//! Task Values
//!
//! Tasks of every type live in one arena, so their results are stored
//! type-erased as [`Value`]. The [`Data`] trait converts between a Rust type
//! and its `Value` form; typed handles ([`ValueTask<V>`](super::ValueTask))
//! use it to hand callers back the type they put in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A computed or literal task result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Array(Vec<Value>),
}

impl Value {
    /// Name of the variant, used in type mismatch errors and exports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A Rust type that can be stored as a task result.
pub trait Data: Sized + Send + Sync + 'static {
    /// Human-readable type name for error messages.
    const TYPE_NAME: &'static str;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch<T: Data>(found: &Value) -> Error {
    Error::TypeMismatch {
        expected: T::TYPE_NAME,
        found: found.type_name(),
    }
}

impl Data for f64 {
    const TYPE_NAME: &'static str = "number";

    fn into_value(self) -> Value {
        Value::Number(self)
    }

    /// Integers widen to numbers; everything else is a mismatch.
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl Data for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn into_value(self) -> Value {
        Value::Integer(self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(*i),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl Data for bool {
    const TYPE_NAME: &'static str = "bool";

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl Data for String {
    const TYPE_NAME: &'static str = "text";

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl<T: Data> Data for Vec<T> {
    const TYPE_NAME: &'static str = "array";

    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(Data::into_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(other)),
        }
    }
}
