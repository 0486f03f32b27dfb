use std::convert::Infallible;

use async_graphql_value::{ConstValue, Name, Value, Variables};
use indexmap::IndexMap;

pub(crate) const TYPENAME: &str = "__typename";

/// One entry of the `representations` argument of `_entities`.
#[derive(Clone, Debug, PartialEq)]
pub enum Representation {
    /// Already decoded, as it arrives through variables.
    Decoded(IndexMap<Name, ConstValue>),
    /// An object literal written in the query itself, which may still reference variables.
    Literal(Value),
}

impl Representation {
    pub fn from_json(value: serde_json::Value) -> Self {
        match ConstValue::from_json(value) {
            Ok(value) => Representation::from(value),
            Err(_) => Representation::Literal(Value::Null),
        }
    }

    /// Flattens the representation into its fields. `None` when it is not an object.
    pub(crate) fn normalize(self, variables: &Variables) -> Option<IndexMap<Name, ConstValue>> {
        let value = match self {
            Representation::Decoded(fields) => return Some(fields),
            Representation::Literal(value) => value
                .into_const_with(|name| Ok::<_, Infallible>(variables.get(&name).cloned().unwrap_or(ConstValue::Null)))
                .unwrap_or(ConstValue::Null),
        };

        match value {
            ConstValue::Object(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<IndexMap<Name, ConstValue>> for Representation {
    fn from(fields: IndexMap<Name, ConstValue>) -> Self {
        Representation::Decoded(fields)
    }
}

impl From<ConstValue> for Representation {
    fn from(value: ConstValue) -> Self {
        match value {
            ConstValue::Object(fields) => Representation::Decoded(fields),
            value => Representation::Literal(value.into_value()),
        }
    }
}

pub(crate) fn typename(fields: &IndexMap<Name, ConstValue>) -> Option<&str> {
    match fields.get(TYPENAME) {
        Some(ConstValue::String(typename)) => Some(typename.as_str()),
        _ => None,
    }
}
