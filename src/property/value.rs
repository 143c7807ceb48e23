//! The tagged property-value variant (§3, §9 "Polymorphic property values").
//!
//! The schema pins the kind per property; this variant exists only at the
//! API boundary (peered contract, JSON parsing) and is never stored inline
//! in the columnar arenas themselves.

use serde_json::Value as Json;

use crate::property::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Boolean,
    I64,
    F64,
    String,
    ListBoolean,
    ListI64,
    ListF64,
    ListString,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::I64 => "i64",
            Kind::F64 => "f64",
            Kind::String => "string",
            Kind::ListBoolean => "list-of-boolean",
            Kind::ListI64 => "list-of-i64",
            Kind::ListF64 => "list-of-f64",
            Kind::ListString => "list-of-string",
        }
    }
}

/// A property value at the API boundary. Storage uses kind-specific columns;
/// this is only how values travel in and out.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    I64(i64),
    F64(f64),
    String(String),
    ListBoolean(Vec<bool>),
    ListI64(Vec<i64>),
    ListF64(Vec<f64>),
    ListString(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Boolean(_) => Kind::Boolean,
            Value::I64(_) => Kind::I64,
            Value::F64(_) => Kind::F64,
            Value::String(_) => Kind::String,
            Value::ListBoolean(_) => Kind::ListBoolean,
            Value::ListI64(_) => Kind::ListI64,
            Value::ListF64(_) => Kind::ListF64,
            Value::ListString(_) => Kind::ListString,
        }
    }

    /// The sentinel value used for an absent cell of this kind (§3).
    pub fn sentinel(kind: Kind) -> Value {
        match kind {
            Kind::Boolean => Value::Boolean(false),
            Kind::I64 => Value::I64(0),
            Kind::F64 => Value::F64(0.0),
            Kind::String => Value::String(String::new()),
            Kind::ListBoolean => Value::ListBoolean(Vec::new()),
            Kind::ListI64 => Value::ListI64(Vec::new()),
            Kind::ListF64 => Value::ListF64(Vec::new()),
            Kind::ListString => Value::ListString(Vec::new()),
        }
    }

    pub fn from_json(kind: Kind, json: &Json) -> Result<Value, Error> {
        let mismatch = || Error::KindMismatch {
            expected: kind.name(),
        };
        Ok(match kind {
            Kind::Boolean => Value::Boolean(json.as_bool().ok_or_else(mismatch)?),
            Kind::I64 => Value::I64(json.as_i64().ok_or_else(mismatch)?),
            Kind::F64 => Value::F64(json.as_f64().ok_or_else(mismatch)?),
            Kind::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
            Kind::ListBoolean => Value::ListBoolean(
                json.as_array()
                    .ok_or_else(mismatch)?
                    .iter()
                    .map(|v| v.as_bool().ok_or_else(mismatch))
                    .collect::<Result<_, _>>()?,
            ),
            Kind::ListI64 => Value::ListI64(
                json.as_array()
                    .ok_or_else(mismatch)?
                    .iter()
                    .map(|v| v.as_i64().ok_or_else(mismatch))
                    .collect::<Result<_, _>>()?,
            ),
            Kind::ListF64 => Value::ListF64(
                json.as_array()
                    .ok_or_else(mismatch)?
                    .iter()
                    .map(|v| v.as_f64().ok_or_else(mismatch))
                    .collect::<Result<_, _>>()?,
            ),
            Kind::ListString => Value::ListString(
                json.as_array()
                    .ok_or_else(mismatch)?
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).ok_or_else(mismatch))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Boolean(v) => Json::from(*v),
            Value::I64(v) => Json::from(*v),
            Value::F64(v) => Json::from(*v),
            Value::String(v) => Json::from(v.clone()),
            Value::ListBoolean(v) => Json::from(v.clone()),
            Value::ListI64(v) => Json::from(v.clone()),
            Value::ListF64(v) => Json::from(v.clone()),
            Value::ListString(v) => Json::from(v.clone()),
        }
    }
}
