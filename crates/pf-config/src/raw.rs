//! Loose document shapes accepted from YAML and JSON.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawValue {
    List(Vec<Scalar>),
    Single(Scalar),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub(crate) fn into_string(self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

impl RawValue {
    pub(crate) fn into_strings(self) -> Vec<String> {
        match self {
            RawValue::List(items) => items.into_iter().map(Scalar::into_string).collect(),
            RawValue::Single(item) => vec![item.into_string()],
        }
    }
}
