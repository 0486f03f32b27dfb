use async_graphql_value::ConstValue;
use indexmap::IndexMap;

/// An instance of an object type: its typename and its attribute values keyed by attribute name.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityObject {
    typename: String,
    attributes: IndexMap<String, ConstValue>,
}

impl EntityObject {
    pub fn new(typename: impl Into<String>) -> Self {
        EntityObject {
            typename: typename.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn from_attributes(typename: impl Into<String>, attributes: IndexMap<String, ConstValue>) -> Self {
        EntityObject {
            typename: typename.into(),
            attributes,
        }
    }

    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<ConstValue>) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<ConstValue>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    pub fn typename(&self) -> &str {
        &self.typename
    }

    pub fn get(&self, attribute: &str) -> Option<&ConstValue> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &IndexMap<String, ConstValue> {
        &self.attributes
    }
}
