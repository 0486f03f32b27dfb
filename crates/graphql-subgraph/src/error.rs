use std::sync::Arc;

use async_graphql_parser::Pos;
use serde::Serialize;

/// Errors raised while a subgraph schema is being put together.
///
/// These are fatal: `SchemaBuilder` never hands out a `Schema` once one of them was returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Type \"{0}\" does not exist")]
    UnknownType(String),
    #[error("Type \"{0}\" is not an object type")]
    NotAnObject(String),
    #[error("Field \"{field}\" does not exist on type \"{ty}\"")]
    UnknownKeyField { ty: String, field: String },
    #[error("Compound primary keys are not supported.")]
    CompoundKey,
    #[error("Field \"{field}\" does not exist on type \"{ty}\"")]
    UnknownField { ty: String, field: String },
    #[error("Can't chain `{directive}()` method calls on one field.")]
    DecorationAlreadyApplied { directive: &'static str },
    #[error("Root query type \"{0}\" is not an object type")]
    InvalidQueryType(String),
}

/// Errors raised while resolving `_entities`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    #[error("Invalid global id type: {expected} != {found}")]
    InvalidReference { expected: String, found: String },
    #[error("Malformed global id: {0}")]
    MalformedGlobalId(String),
    #[error("{0}")]
    Resolver(Arc<str>),
    #[error("Entity resolution was cancelled")]
    Cancelled,
}

impl EntityError {
    pub fn resolver(message: impl AsRef<str>) -> Self {
        EntityError::Resolver(Arc::from(message.as_ref()))
    }
}

/// A segment of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Field(value.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Location {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// An error as it appears in the `errors` list of a GraphQL response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ServerError {
    pub fn new(message: impl Into<String>, pos: Option<Pos>) -> Self {
        ServerError {
            message: message.into(),
            locations: pos.map(Location::from).into_iter().collect(),
            path: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}
